#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Allow-list administration, the dashboard and the audit log.

use salvo::http::StatusCode;
use serde_json::json;

use crate::helpers::*;

#[test_log::test(tokio::test)]
async fn residents_are_kept_out_of_admin_pages() {
    let app = TestApp::new().await;
    let token = app.resident("neighbor@example.com").await;

    for path in ["/api/admin/dashboard", "/api/admin/audit-log", "/api/allowed-emails"] {
        TestRequest::get(path)
            .bearer(&token)
            .send(&app.service)
            .await
            .assert_status(StatusCode::FORBIDDEN)
            .assert_error("Admin access required");
    }

    TestRequest::post("/api/allowed-emails")
        .bearer(&token)
        .json(&json!({ "email": "friend@example.com" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

/// ## Summary
/// An administrator whitelists an address; the new neighbor can then sign
/// in.
#[test_log::test(tokio::test)]
async fn admin_whitelists_a_new_neighbor() {
    let app = TestApp::new().await;
    let admin = app.admin().await;

    let entry = TestRequest::post("/api/allowed-emails")
        .bearer(&admin)
        .json(&json!({ "email": "  New@Example.com " }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED)
        .assert_header_contains("x-revalidate", "/admin")
        .json();
    assert_eq!(entry["email"], "new@example.com");

    TestRequest::post("/api/allowed-emails")
        .bearer(&admin)
        .json(&json!({ "email": "new@example.com" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CONFLICT);

    TestRequest::post("/api/allowed-emails")
        .bearer(&admin)
        .json(&json!({ "email": "nope" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let token = app.sign_in("new@example.com").await;
    assert!(!token.is_empty());
}

#[test_log::test(tokio::test)]
async fn bulk_paste_reports_each_outcome() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.whitelist("a@example.com", None).await;

    let outcome = TestRequest::post("/api/allowed-emails/bulk")
        .bearer(&admin)
        .json(&json!({ "emails": "a@example.com\nb@example.com; c@example.com, broken@nodot" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(outcome["inserted"], 2);
    assert_eq!(outcome["skipped"], 1);
    assert_eq!(outcome["invalid"], json!(["broken@nodot"]));

    let entries = TestRequest::get("/api/allowed-emails")
        .bearer(&admin)
        .send(&app.service)
        .await
        .json();
    // a, b, c and the seeded bootstrap admin
    assert_eq!(entries.as_array().expect("entries").len(), 4);
}

#[test_log::test(tokio::test)]
async fn dashboard_counts_and_recent_rows() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let home = app.seed_residence("12", "Okafor").await;
    app.seed_residence("14", "Lindqvist").await;
    let token = app.resident("neighbor@example.com").await;

    TestRequest::post("/api/profile/claim")
        .bearer(&token)
        .json(&json!({ "residence_id": home.id }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);

    TestRequest::post("/api/clubs")
        .bearer(&token)
        .json(&json!({ "name": "Garden Club", "description": "Plants" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED);

    let dashboard = TestRequest::get("/api/admin/dashboard")
        .bearer(&admin)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    let counts = &dashboard["counts"];
    assert_eq!(counts["residences"], 2);
    assert_eq!(counts["claimed_residences"], 1);
    assert_eq!(counts["users"], 2);
    assert_eq!(counts["clubs"], 1);
    assert_eq!(counts["events"], 0);
    assert_eq!(dashboard["recent_residences"].as_array().expect("rows").len(), 2);
    assert_eq!(dashboard["allowed_emails"][0]["email"], "neighbor@example.com");
}

/// ## Summary
/// Claims and administrator writes land in the audit log, newest first,
/// and the limit is honored.
#[test_log::test(tokio::test)]
async fn audit_log_records_sensitive_writes() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    let home = app.seed_residence("12", "Okafor").await;
    let token = app.resident("neighbor@example.com").await;

    TestRequest::post("/api/allowed-emails")
        .bearer(&admin)
        .json(&json!({ "email": "later@example.com" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED);

    TestRequest::post("/api/profile/claim")
        .bearer(&token)
        .json(&json!({ "residence_id": home.id }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);

    let log = TestRequest::get("/api/admin/audit-log")
        .bearer(&admin)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    let entries = log.as_array().expect("entries");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["action"], "claim");
    assert_eq!(entries[0]["resource_type"], "residence");
    assert_eq!(entries[0]["new_values"]["is_claimed"], true);
    assert_eq!(entries[1]["action"], "create");
    assert_eq!(entries[1]["resource_type"], "allowed_email");

    let limited = TestRequest::get("/api/admin/audit-log?limit=1")
        .bearer(&admin)
        .send(&app.service)
        .await
        .json();
    assert_eq!(limited.as_array().expect("entries").len(), 1);
}
