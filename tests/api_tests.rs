mod common;

use common::{TestApp, spawn_app, spawn_app_without_store};
use heritage_portal::data::DATA_STATUS_HEADER;
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn create(app: &TestApp, path: &str, payload: Value) -> Value {
    let response = app
        .client
        .post(app.url(path))
        .bearer_auth(app.admin_token())
        .json(&payload)
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::CREATED, "POST {path}");
    response.json().await.unwrap()
}

async fn get_json(app: &TestApp, path: &str) -> (StatusCode, Value) {
    let response = app.client.get(app.url(path)).send().await.expect("req fail");
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

// --- Events ---

#[tokio::test]
async fn test_event_lifecycle() {
    let app = spawn_app().await;

    let body = create(
        &app,
        "/api/events",
        json!({
            "title": "Diwali Talk",
            "description": "Stories behind the festival of lights",
            "date": "2025-11-01",
            "category": "Festival"
        }),
    )
    .await;
    assert_eq!(body["message"], "Event created successfully");
    let event = &body["event"];
    assert_eq!(event["title"], "Diwali Talk");
    assert_eq!(event["category"], "Festival");
    assert_eq!(event["date"], "2025-11-01T00:00:00Z");
    let id = event["id"].as_i64().unwrap();

    let (status, fetched) = get_json(&app, &format!("/api/events/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&fetched, event);

    // Partial update keeps the fields that were left out.
    let response = app
        .client
        .put(app.url(&format!("/api/events/{id}")))
        .bearer_auth(app.admin_token())
        .json(&json!({ "title": "Diwali Evening Talk" }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Event updated successfully");
    assert_eq!(body["event"]["title"], "Diwali Evening Talk");
    assert_eq!(body["event"]["description"], "Stories behind the festival of lights");

    let delete = || {
        app.client
            .delete(app.url(&format!("/api/events/{id}")))
            .bearer_auth(app.admin_token())
            .send()
    };
    let response = delete().await.expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Event deleted successfully");

    let response = delete().await.expect("req fail");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Event not found");
}

#[tokio::test]
async fn test_create_event_requires_title_description_and_date() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/events"))
        .bearer_auth(app.admin_token())
        .json(&json!({ "title": "Diwali Talk", "description": "No date given" }))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Title, description, and date are required");
    assert!(app.purger.purged().is_empty());
}

#[tokio::test]
async fn test_create_event_rejects_unparseable_date() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/events"))
        .bearer_auth(app.admin_token())
        .json(&json!({ "title": "T", "description": "D", "date": "next friday" }))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid date");
}

#[tokio::test]
async fn test_malformed_json_body_is_400() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/blogs"))
        .bearer_auth(app.admin_token())
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{ not json")
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Request body must be valid JSON");
}

#[tokio::test]
async fn test_events_listed_by_date_newest_first() {
    let app = spawn_app().await;

    for (title, date) in [
        ("Pongal Harvest Fair", "2025-01-14"),
        ("Holi Colours", "2025-03-14"),
        ("Onam Feast", "2025-09-05"),
    ] {
        create(
            &app,
            "/api/events",
            json!({ "title": title, "description": "d", "date": date }),
        )
        .await;
    }

    let (status, events) = get_json(&app, "/api/events").await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Onam Feast", "Holi Colours", "Pongal Harvest Fair"]);
}

#[tokio::test]
async fn test_upcoming_events_skip_the_past_and_cap_at_three() {
    let app = spawn_app().await;

    for (title, date) in [
        ("Long Ago", "2001-01-01"),
        ("Future A", "2098-01-01"),
        ("Future B", "2098-06-01"),
        ("Future C", "2099-01-01"),
        ("Future D", "2099-06-01"),
    ] {
        create(
            &app,
            "/api/events",
            json!({ "title": title, "description": "d", "date": date }),
        )
        .await;
    }

    let (status, events) = get_json(&app, "/api/events/upcoming").await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Future A", "Future B", "Future C"]);
}

// --- Blogs ---

#[tokio::test]
async fn test_blog_lookup_errors() {
    let app = spawn_app().await;

    let (status, body) = get_json(&app, "/api/blogs/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Blog not found");

    let (status, body) = get_json(&app, "/api/blogs/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid ID");
}

#[tokio::test]
async fn test_blog_create_and_update() {
    let app = spawn_app().await;

    let body = create(
        &app,
        "/api/blogs",
        json!({ "title": "Monsoon Notes", "author": "Asha", "content": "Rain ragas." }),
    )
    .await;
    assert_eq!(body["message"], "Blog created successfully");
    let id = body["blog"]["id"].as_i64().unwrap();

    let response = app
        .client
        .put(app.url(&format!("/api/blogs/{id}")))
        .bearer_auth(app.admin_token())
        .json(&json!({ "content": "Rain ragas, revisited." }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Blog updated successfully");
    assert_eq!(body["blog"]["content"], "Rain ragas, revisited.");
    assert_eq!(body["blog"]["author"], "Asha");

    let response = app
        .client
        .put(app.url("/api/blogs/4242"))
        .bearer_auth(app.admin_token())
        .json(&json!({ "title": "Nope" }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blog_requires_title_author_and_content() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/blogs"))
        .bearer_auth(app.admin_token())
        .json(&json!({ "title": "Monsoon Notes", "author": "" }))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Title, author, and content are required");
}

// --- Gallery ---

#[tokio::test]
async fn test_gallery_albums_by_event_name() {
    let app = spawn_app().await;

    for (event_name, image_url) in [
        ("Diwali 2024", "https://cdn.example.org/d1.jpg"),
        ("Diwali 2024", "https://cdn.example.org/d2.jpg"),
        ("Holi 2025", "https://cdn.example.org/h1.jpg"),
    ] {
        let body = create(
            &app,
            "/api/gallery",
            json!({ "eventName": event_name, "imageUrl": image_url }),
        )
        .await;
        assert_eq!(body["message"], "Image added successfully");
    }

    let (status, album) = get_json(&app, "/api/gallery/events/Diwali%202024").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(album.as_array().unwrap().len(), 2);

    let (status, album) = get_json(&app, "/api/gallery/events/Navratri").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(album, json!([]));

    let (_, all) = get_json(&app, "/api/gallery").await;
    assert_eq!(all.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_gallery_requires_event_name_and_image_url() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/gallery"))
        .bearer_auth(app.admin_token())
        .json(&json!({ "eventName": "Holi 2025" }))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Event name and image URL are required");
}

#[tokio::test]
async fn test_gallery_delete_missing_image_is_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .delete(app.url("/api/gallery/77"))
        .bearer_auth(app.admin_token())
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Image not found");
}

// --- Forms ---

#[tokio::test]
async fn test_form_status_defaults_to_open() {
    let app = spawn_app().await;

    let body = create(
        &app,
        "/api/forms",
        json!({ "title": "Volunteer sign-up", "googleFormLink": "https://forms.gle/abc" }),
    )
    .await;
    assert_eq!(body["message"], "Form created successfully");
    assert_eq!(body["form"]["status"], "open");

    let id = body["form"]["id"].as_i64().unwrap();
    let response = app
        .client
        .put(app.url(&format!("/api/forms/{id}")))
        .bearer_auth(app.admin_token())
        .json(&json!({ "status": "closed" }))
        .send()
        .await
        .expect("req fail");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["form"]["status"], "closed");
    assert_eq!(body["form"]["title"], "Volunteer sign-up");
}

#[tokio::test]
async fn test_form_requires_title_and_link() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/forms"))
        .bearer_auth(app.admin_token())
        .json(&json!({ "title": "Volunteer sign-up" }))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Title and Google Form link are required");
}

// --- Degraded Datastore ---

#[tokio::test]
async fn test_reads_without_store_serve_empty_fallbacks() {
    let app = spawn_app_without_store().await;

    for path in ["/api/events", "/api/events/upcoming", "/api/blogs", "/api/gallery", "/api/forms"] {
        let response = app.client.get(app.url(path)).send().await.expect("req fail");
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert_eq!(response.headers()[DATA_STATUS_HEADER], "unavailable");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!([]));
    }

    let response = app.client.get(app.url("/api/events/1")).send().await.expect("req fail");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[DATA_STATUS_HEADER], "unavailable");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Event not found");
}

#[tokio::test]
async fn test_writes_without_store_are_503() {
    let app = spawn_app_without_store().await;

    // The store check comes first, even for payloads that would not validate.
    for (method, path) in [
        (reqwest::Method::POST, "/api/events"),
        (reqwest::Method::POST, "/api/blogs"),
        (reqwest::Method::PUT, "/api/gallery/1"),
        (reqwest::Method::DELETE, "/api/forms/1"),
    ] {
        let response = app
            .client
            .request(method, app.url(path))
            .bearer_auth(app.admin_token())
            .json(&json!({}))
            .send()
            .await
            .expect("req fail");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{path}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Database not configured");
    }
    assert!(app.purger.purged().is_empty());
}

#[tokio::test]
async fn test_failing_store_degrades_reads_and_fails_writes() {
    let app = spawn_app().await;
    create(
        &app,
        "/api/events",
        json!({ "title": "Onam Feast", "description": "d", "date": "2025-09-05" }),
    )
    .await;
    let purges_before = app.purger.purged().len();

    app.repo.as_ref().unwrap().set_unavailable(true);

    let response = app.client.get(app.url("/api/events")).send().await.expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[DATA_STATUS_HEADER], "unavailable");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!([]));

    let response = app
        .client
        .post(app.url("/api/events"))
        .bearer_auth(app.admin_token())
        .json(&json!({ "title": "Holi", "description": "d", "date": "2025-03-14" }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Failed to create event");

    let response = app
        .client
        .delete(app.url("/api/gallery/1"))
        .bearer_auth(app.admin_token())
        .send()
        .await
        .expect("req fail");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Failed to delete image");

    assert_eq!(app.purger.purged().len(), purges_before);

    // Recovery needs no restart.
    app.repo.as_ref().unwrap().set_unavailable(false);
    let response = app.client.get(app.url("/api/events")).send().await.expect("req fail");
    assert!(response.headers().get(DATA_STATUS_HEADER).is_none());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_single_reads_on_failing_store_are_marked_unavailable() {
    let app = spawn_app().await;
    let body = create(
        &app,
        "/api/blogs",
        json!({ "title": "Monsoon Notes", "author": "Asha", "content": "Rain ragas." }),
    )
    .await;
    let id = body["blog"]["id"].as_i64().unwrap();

    app.repo.as_ref().unwrap().set_unavailable(true);

    for path in [
        format!("/api/blogs/{id}"),
        "/api/events/1".to_string(),
        "/api/gallery/1".to_string(),
        "/api/forms/1".to_string(),
    ] {
        let response = app.client.get(app.url(&path)).send().await.expect("req fail");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        assert_eq!(response.headers()[DATA_STATUS_HEADER], "unavailable", "{path}");
    }

    // A record that is genuinely absent from a healthy store carries no marker.
    app.repo.as_ref().unwrap().set_unavailable(false);
    let response = app.client.get(app.url("/api/blogs/999")).send().await.expect("req fail");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(DATA_STATUS_HEADER).is_none());
}

#[tokio::test]
async fn test_live_reads_carry_no_status_header() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/api/blogs")).send().await.expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(DATA_STATUS_HEADER).is_none());
}
