#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Calendar events over HTTP.

use salvo::http::StatusCode;
use serde_json::json;

use crate::helpers::*;

fn event(title: &str, date: &str) -> serde_json::Value {
    json!({
        "title": title,
        "description": "Bring a chair",
        "event_date": date,
        "event_time": "18:30",
        "location": "Hadley Way park",
    })
}

#[test_log::test(tokio::test)]
async fn events_are_listed_from_a_date() {
    let app = TestApp::new().await;
    let token = app.resident("neighbor@example.com").await;

    let created = TestRequest::post("/api/events")
        .bearer(&token)
        .json(&event("Block party", "2031-06-20"))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED)
        .assert_header_contains("x-revalidate", "/calendar")
        .json();
    assert_eq!(created["category"], "Social");

    TestRequest::post("/api/events")
        .bearer(&token)
        .json(&event("Old meeting", "2020-01-01"))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED);

    let upcoming = TestRequest::get("/api/events?from=2030-01-01")
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    let titles: Vec<&str> = upcoming
        .as_array()
        .expect("events")
        .iter()
        .filter_map(|e| e["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Block party"]);

    TestRequest::get("/api/events?from=June")
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn malformed_event_is_rejected() {
    let app = TestApp::new().await;
    let token = app.resident("neighbor@example.com").await;

    TestRequest::post("/api/events")
        .bearer(&token)
        .json(&event("Block party", "20/06/2031"))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let mut bad_category = event("Block party", "2031-06-20");
    bad_category["category"] = json!("Carnival");
    TestRequest::post("/api/events")
        .bearer(&token)
        .json(&bad_category)
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

/// ## Summary
/// The creator edits and deletes an event; other residents cannot.
#[test_log::test(tokio::test)]
async fn only_creator_or_admin_edits_events() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let owner = app.resident("owner@example.com").await;
    let neighbor = app.resident("neighbor@example.com").await;

    let id = TestRequest::post("/api/events")
        .bearer(&owner)
        .json(&event("Block party", "2031-06-20"))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED)
        .json()["id"]
        .as_str()
        .expect("id")
        .to_string();

    let mut edit = event("Block party (moved)", "2031-06-21");
    edit["category"] = json!("Meeting");

    TestRequest::put(&format!("/api/events/{id}"))
        .bearer(&neighbor)
        .json(&edit)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let updated = TestRequest::put(&format!("/api/events/{id}"))
        .bearer(&owner)
        .json(&edit)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(updated["title"], "Block party (moved)");
    assert_eq!(updated["category"], "Meeting");

    TestRequest::delete(&format!("/api/events/{id}"))
        .bearer(&neighbor)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    TestRequest::delete(&format!("/api/events/{id}"))
        .bearer(&admin)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    TestRequest::delete(&format!("/api/events/{id}"))
        .bearer(&owner)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error("Event not found");
}
