#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Sign-in, sessions and the whitelist gate.

use salvo::http::StatusCode;
use serde_json::json;

use crate::helpers::*;

/// ## Summary
/// A whitelisted email receives a code and exchanges it for a session.
#[test_log::test(tokio::test)]
async fn whitelisted_email_signs_in() {
    let app = TestApp::new().await;
    app.whitelist("neighbor@example.com", None).await;

    TestRequest::post("/api/auth/code")
        .json(&json!({ "email": "Neighbor@Example.com" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::ACCEPTED);

    let code = app
        .sender
        .last_code("neighbor@example.com")
        .expect("code sent to normalized address");

    let response = TestRequest::post("/api/auth/verify")
        .json(&json!({ "email": "neighbor@example.com", "code": code }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .assert_header_contains("set-cookie", "session=");

    let body = response.json();
    assert_eq!(body["user"]["email"], "neighbor@example.com");
    assert_eq!(body["user"]["is_admin"], false);
    let token = body["token"].as_str().expect("token").to_string();

    let whoami = TestRequest::get("/api/app/whoami")
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(whoami["email"], "neighbor@example.com");
}

/// ## Summary
/// An email that is not on the allow list never receives a code.
#[test_log::test(tokio::test)]
async fn unlisted_email_is_rejected() {
    let app = TestApp::new().await;

    TestRequest::post("/api/auth/code")
        .json(&json!({ "email": "stranger@example.com" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN)
        .assert_error(
            "This email is not authorized. Please contact an administrator to request access.",
        );

    assert!(app.sender.last_code("stranger@example.com").is_none());
}

#[test_log::test(tokio::test)]
async fn malformed_email_is_a_bad_request() {
    let app = TestApp::new().await;

    TestRequest::post("/api/auth/code")
        .json(&json!({ "email": "not-an-email" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

/// ## Summary
/// Codes are single use and a wrong code is unauthorized.
#[test_log::test(tokio::test)]
async fn login_code_cannot_be_reused() {
    let app = TestApp::new().await;
    app.whitelist("neighbor@example.com", None).await;

    TestRequest::post("/api/auth/code")
        .json(&json!({ "email": "neighbor@example.com" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::ACCEPTED);
    let code = app.sender.last_code("neighbor@example.com").expect("code");

    TestRequest::post("/api/auth/verify")
        .json(&json!({ "email": "neighbor@example.com", "code": "000000x" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    TestRequest::post("/api/auth/verify")
        .json(&json!({ "email": "neighbor@example.com", "code": code }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);

    TestRequest::post("/api/auth/verify")
        .json(&json!({ "email": "neighbor@example.com", "code": code }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

/// ## Summary
/// Removing an email between requesting and using a code blocks sign-in.
#[test_log::test(tokio::test)]
async fn whitelist_is_checked_again_at_verify() {
    let app = TestApp::new().await;
    let admin = app.admin().await;
    app.whitelist("neighbor@example.com", None).await;

    TestRequest::post("/api/auth/code")
        .json(&json!({ "email": "neighbor@example.com" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::ACCEPTED);
    let code = app.sender.last_code("neighbor@example.com").expect("code");

    let entries = TestRequest::get("/api/allowed-emails")
        .bearer(&admin)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    let id = entries
        .as_array()
        .expect("list")
        .iter()
        .find(|e| e["email"] == "neighbor@example.com")
        .and_then(|e| e["id"].as_str())
        .expect("entry id")
        .to_string();

    TestRequest::delete(&format!("/api/allowed-emails/{id}"))
        .bearer(&admin)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    TestRequest::post("/api/auth/verify")
        .json(&json!({ "email": "neighbor@example.com", "code": code }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[test_log::test(tokio::test)]
async fn session_cookie_authenticates() {
    let app = TestApp::new().await;
    let token = app.resident("neighbor@example.com").await;

    let profile = TestRequest::get("/api/profile")
        .header("Cookie", &format!("session={token}"))
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(profile["user"]["email"], "neighbor@example.com");
    assert!(profile["residence"].is_null());
}

/// ## Summary
/// Signing out revokes the token; later requests are public.
#[test_log::test(tokio::test)]
async fn sign_out_revokes_the_session() {
    let app = TestApp::new().await;
    let token = app.resident("neighbor@example.com").await;

    TestRequest::post("/api/auth/sign-out")
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    TestRequest::get("/api/profile")
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let whoami = TestRequest::get("/api/app/whoami")
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(whoami["status"], "public");
}

#[test_log::test(tokio::test)]
async fn public_requests_to_member_pages_are_unauthorized() {
    let app = TestApp::new().await;

    for path in ["/api/directory", "/api/clubs", "/api/community", "/api/events"] {
        TestRequest::get(path)
            .send(&app.service)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    TestRequest::get("/api/app/healthcheck")
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);
}

/// ## Summary
/// Bootstrap admins reach the allow list through start-up seeding and come
/// out of sign-in as administrators.
#[test_log::test(tokio::test)]
async fn seeded_bootstrap_admin_signs_in_as_admin() {
    let app = TestApp::new().await;
    assert!(app.is_whitelisted(ADMIN_EMAIL).await);
    let token = app.admin().await;

    let whoami = TestRequest::get("/api/app/whoami")
        .bearer(&token)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(whoami["email"], ADMIN_EMAIL);
    assert_eq!(whoami["is_admin"], true);
}

/// ## Summary
/// Being named in configuration does not clear an email whose allow-list
/// entry was removed.
#[test_log::test(tokio::test)]
async fn bootstrap_admin_without_entry_is_rejected() {
    let app = TestApp::new().await;
    app.unlist(ADMIN_EMAIL).await;

    TestRequest::post("/api/auth/code")
        .json(&json!({ "email": ADMIN_EMAIL }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    assert!(app.sender.last_code(ADMIN_EMAIL).is_none());
}

/// ## Summary
/// Enough wrong codes discard the outstanding one, so the right code no
/// longer works and a new one has to be requested.
#[test_log::test(tokio::test)]
async fn repeated_wrong_codes_lock_out_the_code() {
    let app = TestApp::new().await;
    app.whitelist("neighbor@example.com", None).await;

    TestRequest::post("/api/auth/code")
        .json(&json!({ "email": "neighbor@example.com" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::ACCEPTED);
    let code = app.sender.last_code("neighbor@example.com").expect("code");

    for guess in ["000000", "111111", "222222", "333333", "444444"] {
        let guess = if guess == code { "555555" } else { guess };
        TestRequest::post("/api/auth/verify")
            .json(&json!({ "email": "neighbor@example.com", "code": guess }))
            .send(&app.service)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    TestRequest::post("/api/auth/verify")
        .json(&json!({ "email": "neighbor@example.com", "code": code }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let token = app.sign_in("neighbor@example.com").await;
    assert!(!token.is_empty());
}
