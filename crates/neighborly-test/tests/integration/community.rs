#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Community board postings, giveaway claims and comments.

use salvo::http::StatusCode;
use serde_json::json;

use crate::helpers::*;

async fn post_giveaway(app: &TestApp, token: &str) -> String {
    TestRequest::post("/api/community/giveaways")
        .bearer(token)
        .json(&json!({ "title": "Free couch", "description": "Pick up by Friday" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED)
        .assert_header_contains("x-revalidate", "/community")
        .json()["id"]
        .as_str()
        .expect("giveaway id")
        .to_string()
}

#[test_log::test(tokio::test)]
async fn board_lists_every_kind_of_posting() {
    let app = TestApp::new().await;
    let token = app.resident("neighbor@example.com").await;

    post_giveaway(&app, &token).await;

    let drive = TestRequest::post("/api/community/charitable")
        .bearer(&token)
        .json(&json!({ "title": "Coat drive", "description": "Winter coats" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(drive["item_type"], "drive");

    let request = TestRequest::post("/api/community/help-requests")
        .bearer(&token)
        .json(&json!({
            "title": "Ladder needed",
            "description": "Gutters",
            "request_type": "advice",
        }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(request["request_type"], "advice");

    TestRequest::post("/api/community/help-requests")
        .bearer(&token)
        .json(&json!({ "title": "Ladder", "description": "x", "request_type": "favor" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let board = TestRequest::get("/api/community")
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(board["charitable_items"].as_array().expect("items").len(), 1);
    assert_eq!(board["giveaways"][0]["status"], "available");
    assert_eq!(board["help_requests"][0]["title"], "Ladder needed");
}

/// ## Summary
/// A giveaway is claimed once, never by the neighbor who posted it.
#[test_log::test(tokio::test)]
async fn giveaway_is_claimed_once() {
    let app = TestApp::new().await;
    let owner = app.resident("owner@example.com").await;
    let first = app.resident("first@example.com").await;
    let second = app.resident("second@example.com").await;
    let id = post_giveaway(&app, &owner).await;

    TestRequest::post(&format!("/api/community/giveaways/{id}/claim"))
        .bearer(&owner)
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error("You cannot claim your own giveaway");

    let claimed = TestRequest::post(&format!("/api/community/giveaways/{id}/claim"))
        .bearer(&first)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(claimed["status"], "claimed");

    TestRequest::post(&format!("/api/community/giveaways/{id}/claim"))
        .bearer(&second)
        .send(&app.service)
        .await
        .assert_status(StatusCode::CONFLICT)
        .assert_error("This giveaway has already been claimed");
}

#[test_log::test(tokio::test)]
async fn comments_attach_to_existing_postings() {
    let app = TestApp::new().await;
    let owner = app.resident("owner@example.com").await;
    let neighbor = app.resident("neighbor@example.com").await;
    let id = post_giveaway(&app, &owner).await;

    TestRequest::post("/api/community/comments")
        .bearer(&neighbor)
        .json(&json!({ "item_type": "giveaway", "item_id": id, "content": "Still there?" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED);

    TestRequest::post("/api/community/comments")
        .bearer(&neighbor)
        .json(&json!({
            "item_type": "help_request",
            "item_id": id,
            "content": "Wrong table",
        }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let comments = TestRequest::get(&format!(
        "/api/community/comments?item_type=giveaway&item_id={id}"
    ))
    .bearer(&owner)
    .send(&app.service)
    .await
    .assert_status(StatusCode::OK)
    .json();
    assert_eq!(comments[0]["content"], "Still there?");

    TestRequest::get("/api/community/comments?item_type=giveaway")
        .bearer(&owner)
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

/// ## Summary
/// Postings are deleted by their creator or an administrator, and their
/// comments go with them.
#[test_log::test(tokio::test)]
async fn posting_delete_rights() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let owner = app.resident("owner@example.com").await;
    let neighbor = app.resident("neighbor@example.com").await;
    let id = post_giveaway(&app, &owner).await;

    TestRequest::post("/api/community/comments")
        .bearer(&neighbor)
        .json(&json!({ "item_type": "giveaway", "item_id": id, "content": "Mine?" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED);

    TestRequest::delete(&format!("/api/community/giveaways/{id}"))
        .bearer(&neighbor)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .assert_error("Only admins or item creator can delete this");

    TestRequest::delete(&format!("/api/community/giveaways/{id}"))
        .bearer(&admin)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT)
        .assert_header_contains("x-revalidate", "/community");

    let comments = TestRequest::get(&format!(
        "/api/community/comments?item_type=giveaway&item_id={id}"
    ))
    .bearer(&owner)
    .send(&app.service)
    .await
    .json();
    assert!(comments.as_array().expect("comments").is_empty());

    TestRequest::delete(&format!("/api/community/giveaways/{id}"))
        .bearer(&owner)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error("Giveaway not found");
}
