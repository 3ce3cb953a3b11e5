#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Club membership, posting and deletion rights.

use salvo::http::StatusCode;
use serde_json::json;

use crate::helpers::*;

async fn create_club(app: &TestApp, token: &str, name: &str) -> String {
    TestRequest::post("/api/clubs")
        .bearer(token)
        .json(&json!({ "name": name, "description": "Saturday mornings" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED)
        .assert_header_contains("x-revalidate", "/clubs")
        .json()["id"]
        .as_str()
        .expect("club id")
        .to_string()
}

/// ## Summary
/// Only members post; joining unlocks posting and the club page is
/// reported stale.
#[test_log::test(tokio::test)]
async fn members_only_posting() {
    let app = TestApp::new().await;
    let owner = app.resident("owner@example.com").await;
    let neighbor = app.resident("neighbor@example.com").await;
    let club_id = create_club(&app, &owner, "Garden Club").await;

    let post = json!({ "title": "Seed swap", "description": "Bring extras", "post_type": "announcement" });

    TestRequest::post(&format!("/api/clubs/{club_id}/posts"))
        .bearer(&neighbor)
        .json(&post)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .assert_error("You must be a member of this club to post");

    TestRequest::post(&format!("/api/clubs/{club_id}/join"))
        .bearer(&neighbor)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT)
        .assert_header_contains("x-revalidate", &format!("/clubs/{club_id}"));

    TestRequest::post(&format!("/api/clubs/{club_id}/join"))
        .bearer(&neighbor)
        .send(&app.service)
        .await
        .assert_status(StatusCode::CONFLICT);

    let created = TestRequest::post(&format!("/api/clubs/{club_id}/posts"))
        .bearer(&neighbor)
        .json(&post)
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED)
        .assert_header_contains("x-revalidate", &format!("/clubs/{club_id}"))
        .json();
    assert_eq!(created["post_type"], "announcement");
    let post_id = created["id"].as_str().expect("post id").to_string();

    TestRequest::post(&format!("/api/club-posts/{post_id}/comments"))
        .bearer(&owner)
        .json(&json!({ "content": "Count me in" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .assert_error("You must be a member of this club to comment");

    TestRequest::post(&format!("/api/club-posts/{post_id}/comments"))
        .bearer(&neighbor)
        .json(&json!({ "content": "Count me in" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED);

    let detail = TestRequest::get(&format!("/api/clubs/{club_id}"))
        .bearer(&neighbor)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(detail["name"], "Garden Club");
    assert_eq!(detail["is_member"], true);
    assert_eq!(detail["members"].as_array().expect("members").len(), 1);
    assert_eq!(detail["posts"][0]["title"], "Seed swap");
    assert_eq!(detail["posts"][0]["comments"][0]["content"], "Count me in");
}

#[test_log::test(tokio::test)]
async fn leaving_requires_membership() {
    let app = TestApp::new().await;
    let owner = app.resident("owner@example.com").await;
    let neighbor = app.resident("neighbor@example.com").await;
    let club_id = create_club(&app, &owner, "Book Club").await;

    TestRequest::post(&format!("/api/clubs/{club_id}/leave"))
        .bearer(&neighbor)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .assert_error("You are not a member of this club");

    TestRequest::post(&format!("/api/clubs/{club_id}/join"))
        .bearer(&neighbor)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let listing = TestRequest::get("/api/clubs")
        .bearer(&neighbor)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(listing[0]["joined"], true);

    TestRequest::post(&format!("/api/clubs/{club_id}/leave"))
        .bearer(&neighbor)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

/// ## Summary
/// A neighbor who did not create the club cannot delete it; the creator
/// and administrators can.
#[test_log::test(tokio::test)]
async fn only_creator_or_admin_deletes() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let owner = app.resident("owner@example.com").await;
    let neighbor = app.resident("neighbor@example.com").await;
    let first = create_club(&app, &owner, "Chess Club").await;
    let second = create_club(&app, &owner, "Walking Club").await;

    TestRequest::delete(&format!("/api/clubs/{first}"))
        .bearer(&neighbor)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .assert_error("Only club creator or admin can delete this club");

    TestRequest::get(&format!("/api/clubs/{first}"))
        .bearer(&neighbor)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);

    TestRequest::delete(&format!("/api/clubs/{first}"))
        .bearer(&owner)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    TestRequest::delete(&format!("/api/clubs/{second}"))
        .bearer(&admin)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT)
        .assert_header_contains("x-revalidate", "/admin");

    let audit = TestRequest::get("/api/admin/audit-log")
        .bearer(&admin)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    let club_deletes: Vec<&serde_json::Value> = audit
        .as_array()
        .expect("entries")
        .iter()
        .filter(|e| e["resource_type"] == "club" && e["action"] == "delete")
        .collect();
    assert_eq!(club_deletes.len(), 1);
    assert_eq!(club_deletes[0]["resource_id"], second.as_str());
}

#[test_log::test(tokio::test)]
async fn invalid_club_name_is_rejected() {
    let app = TestApp::new().await;
    let owner = app.resident("owner@example.com").await;

    TestRequest::post("/api/clubs")
        .bearer(&owner)
        .json(&json!({ "name": "<script>", "description": "x" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    TestRequest::post("/api/clubs")
        .bearer(&owner)
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error("Invalid request body");
}
