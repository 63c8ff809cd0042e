use axum::{Json, Router, extract::State, http::HeaderMap, routing::post};
use heritage_portal::{
    WebhookPurger,
    purge::{CachePurger, RecordingPurger},
};
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tokio::{net::TcpListener, sync::mpsc};

type Delivery = (Option<String>, Value);

/// Serves a revalidation endpoint that forwards every request it receives.
async fn spawn_webhook() -> (String, mpsc::UnboundedReceiver<Delivery>) {
    let (tx, rx) = mpsc::unbounded_channel::<Delivery>();

    async fn revalidate(
        State(tx): State<mpsc::UnboundedSender<Delivery>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> StatusCode {
        let auth = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let _ = tx.send((auth, body));
        StatusCode::OK
    }

    let router = Router::new()
        .route("/revalidate", post(revalidate))
        .with_state(tx);
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://127.0.0.1:{}/revalidate", port), rx)
}

fn paths(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|path| path.to_string()).collect()
}

#[tokio::test]
async fn test_webhook_receives_paths_and_token() {
    let (url, mut rx) = spawn_webhook().await;
    let purger = WebhookPurger::new(&url, Some("revalidate-secret"));

    let status = purger.send(&paths(&["/blogs", "/blogs/4"])).await.unwrap();
    assert_eq!(status, StatusCode::OK);

    let (auth, body) = rx.recv().await.unwrap();
    assert_eq!(auth.as_deref(), Some("Bearer revalidate-secret"));
    assert_eq!(body, json!({ "paths": ["/blogs", "/blogs/4"] }));
}

#[tokio::test]
async fn test_purge_is_delivered_in_the_background() {
    let (url, mut rx) = spawn_webhook().await;
    let purger = WebhookPurger::new(&url, None);

    purger.purge(&paths(&["/forms"]));

    let (auth, body) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("purge never arrived")
        .unwrap();
    assert!(auth.is_none());
    assert_eq!(body["paths"], json!(["/forms"]));
}

#[tokio::test]
async fn test_hung_webhook_is_abandoned_after_timeout() {
    // Accepts connections and never answers.
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let purger = WebhookPurger::with_timeout(
        &format!("http://127.0.0.1:{}/revalidate", port),
        None,
        Duration::from_millis(200),
    );

    let started = Instant::now();
    let err = purger.send(&paths(&["/"])).await.unwrap_err();
    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_unreachable_webhook_never_reaches_the_caller() {
    // Nothing listens on the port once the listener is dropped.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let purger = WebhookPurger::new(&format!("http://127.0.0.1:{}/revalidate", port), None);
    purger.purge(&paths(&["/events"]));
    assert!(purger.send(&paths(&["/events"])).await.is_err());
}

#[test]
fn test_recording_purger_keeps_order() {
    let purger = RecordingPurger::new();
    purger.purge(&paths(&["/", "/events"]));
    purger.purge(&paths(&["/forms"]));

    assert_eq!(purger.purged(), paths(&["/", "/events", "/forms"]));
}
