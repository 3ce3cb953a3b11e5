#![allow(clippy::expect_used, clippy::unwrap_used)]
//! The residence claim flow over HTTP.

use salvo::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::helpers::*;

fn claim(token: &str, residence_id: Uuid) -> TestRequest {
    TestRequest::post("/api/profile/claim")
        .bearer(token)
        .json(&json!({ "residence_id": residence_id }))
}

/// ## Summary
/// A whitelisted resident claims a free residence; the directory and the
/// profile reflect it and both views are reported stale.
#[test_log::test(tokio::test)]
async fn resident_claims_a_free_residence() {
    let app = TestApp::new().await;
    let home = app.seed_residence("12", "Okafor").await;
    let token = app.resident("neighbor@example.com").await;

    let claimed = TestRequest::post("/api/profile/claim")
        .bearer(&token)
        .json(&json!({
            "residence_id": home.id,
            "email": "Family@Example.com",
            "notes": "  Two dogs  ",
        }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .assert_header_contains("x-revalidate", "/directory")
        .assert_header_contains("x-revalidate", "/profile")
        .json();
    assert_eq!(claimed["is_claimed"], true);
    assert_eq!(claimed["additional_details"]["email"], "family@example.com");
    assert_eq!(claimed["additional_details"]["notes"], "Two dogs");

    let profile = TestRequest::get("/api/profile")
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(profile["user"]["residence_id"], json!(home.id));
    assert_eq!(profile["residence"]["id"], json!(home.id));

    let directory = TestRequest::get("/api/directory?street=Fanok%20Rd")
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(directory[0]["is_claimed"], true);
}

#[test_log::test(tokio::test)]
async fn resident_cannot_claim_twice() {
    let app = TestApp::new().await;
    let first = app.seed_residence("12", "Okafor").await;
    let second = app.seed_residence("14", "Lindqvist").await;
    let token = app.resident("neighbor@example.com").await;

    claim(&token, first.id)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);

    claim(&token, second.id)
        .send(&app.service)
        .await
        .assert_status(StatusCode::CONFLICT)
        .assert_error("You have already claimed a residence");

    let directory = TestRequest::get("/api/directory?search=lindqvist")
        .bearer(&token)
        .send(&app.service)
        .await
        .json();
    assert_eq!(directory[0]["is_claimed"], false);
}

/// ## Summary
/// The first claim wins; a second resident gets a conflict and the
/// response does not advertise stale views.
#[test_log::test(tokio::test)]
async fn taken_residence_is_a_conflict() {
    let app = TestApp::new().await;
    let home = app.seed_residence("12", "Okafor").await;
    let first = app.resident("first@example.com").await;
    let second = app.resident("second@example.com").await;

    claim(&first, home.id)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);

    claim(&second, home.id)
        .send(&app.service)
        .await
        .assert_status(StatusCode::CONFLICT)
        .assert_error("This residence has already been claimed")
        .assert_no_header("x-revalidate");

    let profile = TestRequest::get("/api/profile")
        .bearer(&second)
        .send(&app.service)
        .await
        .json();
    assert!(profile["user"]["residence_id"].is_null());
}

#[test_log::test(tokio::test)]
async fn bound_entry_only_admits_its_residence() {
    let app = TestApp::new().await;
    let bound = app.seed_residence("12", "Okafor").await;
    let other = app.seed_residence("14", "Lindqvist").await;
    app.whitelist("neighbor@example.com", Some(bound.id)).await;
    let token = app.sign_in("neighbor@example.com").await;

    claim(&token, other.id)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .assert_error("You are not authorized to claim this residence");

    claim(&token, bound.id)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);
}

#[test_log::test(tokio::test)]
async fn unknown_residence_is_not_found() {
    let app = TestApp::new().await;
    let token = app.resident("neighbor@example.com").await;

    claim(&token, Uuid::now_v7())
        .send(&app.service)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn claim_requires_a_session() {
    let app = TestApp::new().await;
    let home = app.seed_residence("12", "Okafor").await;

    TestRequest::post("/api/profile/claim")
        .json(&json!({ "residence_id": home.id }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

/// ## Summary
/// Only an administrator releases a residence, after which another
/// resident may claim it.
#[test_log::test(tokio::test)]
async fn admin_release_allows_reassignment() {
    let app = TestApp::new().await;
    let home = app.seed_residence("12", "Okafor").await;
    let admin = app.admin().await;
    let first = app.resident("first@example.com").await;
    let second = app.resident("second@example.com").await;

    claim(&first, home.id)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);

    TestRequest::post(&format!("/api/residences/{}/release", home.id))
        .bearer(&first)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let released = TestRequest::post(&format!("/api/residences/{}/release", home.id))
        .bearer(&admin)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .assert_header_contains("x-revalidate", "/admin")
        .json();
    assert_eq!(released["is_claimed"], false);

    let profile = TestRequest::get("/api/profile")
        .bearer(&first)
        .send(&app.service)
        .await
        .json();
    assert!(profile["user"]["residence_id"].is_null());

    claim(&second, home.id)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);
}

#[test_log::test(tokio::test)]
async fn admin_manages_residences() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let resident = app.resident("neighbor@example.com").await;

    let body = json!({ "street_name": "Herms Pl", "address": "7", "last_name": "Moreau" });

    TestRequest::post("/api/residences")
        .bearer(&resident)
        .json(&body)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let created = TestRequest::post("/api/residences")
        .bearer(&admin)
        .json(&body)
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    let id = created["id"].as_str().expect("id").to_string();

    TestRequest::post("/api/residences")
        .bearer(&admin)
        .json(&json!({ "street_name": "Main St", "address": "1", "last_name": "Nobody" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let updated = TestRequest::put(&format!("/api/residences/{id}"))
        .bearer(&admin)
        .json(&json!({ "phone_number": "555-0100" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(updated["phone_number"], "555-0100");

    TestRequest::delete(&format!("/api/residences/{id}"))
        .bearer(&admin)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT)
        .assert_header_contains("x-revalidate", "/directory");

    TestRequest::delete(&format!("/api/residences/{id}"))
        .bearer(&admin)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
