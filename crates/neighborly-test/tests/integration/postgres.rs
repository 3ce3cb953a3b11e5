#![allow(clippy::expect_used, clippy::unwrap_used)]
//! The `PostgreSQL` store: transactions, constraints, cascades and the
//! migrations themselves.
//!
//! Every test here needs `TEST_DATABASE_URL` pointing at a server the tests
//! may create databases on. Without it they return early.

use chrono::{Duration, Utc};
use salvo::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use neighborly_test::component::db::enums::Street;
use neighborly_test::component::model::login::LoginCode;
use neighborly_test::component::model::residence::NewResidence;
use neighborly_test::component::model::user::NewUser;
use neighborly_test::component::store::ClaimOutcome;
use neighborly_test::component::store::prelude::*;

use crate::helpers::*;

fn claim(token: &str, residence_id: Uuid) -> TestRequest {
    TestRequest::post("/api/profile/claim")
        .bearer(token)
        .json(&json!({ "residence_id": residence_id }))
}

/// ## Summary
/// Two residents racing for the same residence: the row locks let exactly
/// one of them through.
#[test_log::test(tokio::test)]
async fn concurrent_claims_have_one_winner() {
    let Some(db) = TestDb::create().await else {
        return;
    };
    let store = db.store.clone();

    let residence = store
        .create_residence(NewResidence::new(
            Street::HermsPl,
            "3".to_string(),
            "Abara".to_string(),
            None,
        ))
        .await
        .expect("residence");
    let a = store
        .create_user(NewUser::new("a@example.com".into(), false))
        .await
        .expect("user a");
    let b = store
        .create_user(NewUser::new("b@example.com".into(), false))
        .await
        .expect("user b");

    let (first, second) = tokio::join!(
        store.claim_residence(a.id, residence.id, json!({})),
        store.claim_residence(b.id, residence.id, json!({})),
    );
    let outcomes = [first.expect("claim a"), second.expect("claim b")];

    let winners = outcomes
        .iter()
        .filter(|o| matches!(o, ClaimOutcome::Claimed { .. }))
        .count();
    let losers = outcomes
        .iter()
        .filter(|o| matches!(o, ClaimOutcome::ResidenceTaken))
        .count();
    assert_eq!((winners, losers), (1, 1));

    let linked = [
        store.user_by_id(a.id).await.expect("load").expect("a"),
        store.user_by_id(b.id).await.expect("load").expect("b"),
    ]
    .iter()
    .filter(|u| u.residence_id == Some(residence.id))
    .count();
    assert_eq!(linked, 1);

    db.cleanup().await;
}

#[test_log::test(tokio::test)]
async fn release_then_reclaim_at_store_level() {
    let Some(db) = TestDb::create().await else {
        return;
    };
    let store = db.store.clone();

    let residence = store
        .create_residence(NewResidence::new(
            Street::SymorDr,
            "8".to_string(),
            "Moreau".to_string(),
            None,
        ))
        .await
        .expect("residence");
    let a = store
        .create_user(NewUser::new("a@example.com".into(), false))
        .await
        .expect("user a");
    let b = store
        .create_user(NewUser::new("b@example.com".into(), false))
        .await
        .expect("user b");

    let outcome = store
        .claim_residence(a.id, residence.id, json!({ "notes": "corner lot" }))
        .await
        .expect("claim");
    assert!(matches!(outcome, ClaimOutcome::Claimed { .. }));

    let again = store
        .claim_residence(a.id, residence.id, json!({}))
        .await
        .expect("claim again");
    assert_eq!(
        again,
        ClaimOutcome::IdentityAlreadyLinked {
            residence_id: residence.id
        }
    );

    let released = store
        .release_residence(residence.id)
        .await
        .expect("release")
        .expect("residence exists");
    assert_eq!(released.released_user_ids, vec![a.id]);
    assert!(!released.after.is_claimed);
    assert_eq!(released.after.additional_details["notes"], "corner lot");

    let outcome = store
        .claim_residence(b.id, residence.id, json!({}))
        .await
        .expect("reclaim");
    assert!(matches!(outcome, ClaimOutcome::Claimed { ref user, .. } if user.id == b.id));

    db.cleanup().await;
}

/// ## Summary
/// Codes are redeemed once, wrong guesses are counted, and the code is gone
/// after the last allowed miss.
#[test_log::test(tokio::test)]
async fn login_codes_are_single_use_and_limited() {
    let Some(db) = TestDb::create().await else {
        return;
    };
    let store = db.store.clone();
    let now = Utc::now();
    let code = |hash: &str| LoginCode {
        email: "a@example.com".into(),
        code_hash: hash.into(),
        expires_at: now + Duration::minutes(10),
        created_at: now,
        attempts: 0,
    };

    store.put_login_code(code("right")).await.expect("put");
    assert!(
        store
            .consume_login_code("a@example.com", "wrong", now, 3)
            .await
            .expect("consume")
            .is_none()
    );
    let redeemed = store
        .consume_login_code("a@example.com", "right", now, 3)
        .await
        .expect("consume")
        .expect("redeemed");
    assert_eq!(redeemed.attempts, 1);
    assert!(
        store
            .consume_login_code("a@example.com", "right", now, 3)
            .await
            .expect("consume")
            .is_none()
    );

    store.put_login_code(code("right")).await.expect("put");
    for guess in ["x", "y", "z"] {
        assert!(
            store
                .consume_login_code("a@example.com", guess, now, 3)
                .await
                .expect("consume")
                .is_none()
        );
    }
    assert!(
        store
            .consume_login_code("a@example.com", "right", now, 3)
            .await
            .expect("consume")
            .is_none()
    );

    // A new request resets the counter.
    store.put_login_code(code("right")).await.expect("put");
    store
        .consume_login_code("a@example.com", "x", now, 3)
        .await
        .expect("consume");
    store.put_login_code(code("fresh")).await.expect("replace");
    let fresh = store
        .consume_login_code("a@example.com", "fresh", now, 3)
        .await
        .expect("consume")
        .expect("redeemed");
    assert_eq!(fresh.attempts, 0);

    store.put_login_code(code("late")).await.expect("put");
    assert!(
        store
            .consume_login_code("a@example.com", "late", now + Duration::minutes(11), 3)
            .await
            .expect("consume")
            .is_none()
    );

    db.cleanup().await;
}

/// ## Summary
/// The whole claim flow over HTTP with `PostgreSQL` underneath: a second
/// claim by the same resident, a claim on a taken residence, then an
/// administrator release and a reclaim.
#[test_log::test(tokio::test)]
async fn claim_flow_over_postgres() {
    let Some((app, db)) = TestApp::on_postgres().await else {
        return;
    };
    let home = app.seed_residence("12", "Okafor").await;
    let other = app.seed_residence("14", "Lindqvist").await;
    let admin = app.admin().await;
    let first = app.resident("first@example.com").await;
    let second = app.resident("second@example.com").await;

    claim(&first, home.id)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);
    claim(&first, other.id)
        .send(&app.service)
        .await
        .assert_status(StatusCode::CONFLICT)
        .assert_error("You have already claimed a residence");
    claim(&second, home.id)
        .send(&app.service)
        .await
        .assert_status(StatusCode::CONFLICT)
        .assert_error("This residence has already been claimed");

    TestRequest::post(&format!("/api/residences/{}/release", home.id))
        .bearer(&admin)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);
    claim(&second, home.id)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);

    let audit = TestRequest::get("/api/admin/audit-log")
        .bearer(&admin)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK)
        .json();
    let claims = audit
        .as_array()
        .expect("entries")
        .iter()
        .filter(|e| e["action"] == "claim")
        .count();
    assert_eq!(claims, 2);

    db.cleanup().await;
}

#[test_log::test(tokio::test)]
async fn sign_in_codes_over_postgres() {
    let Some((app, db)) = TestApp::on_postgres().await else {
        return;
    };
    app.whitelist("neighbor@example.com", None).await;

    TestRequest::post("/api/auth/code")
        .json(&json!({ "email": "neighbor@example.com" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::ACCEPTED);
    let code = app.sender.last_code("neighbor@example.com").expect("code");

    let verify = || {
        TestRequest::post("/api/auth/verify")
            .json(&json!({ "email": "neighbor@example.com", "code": code }))
    };
    verify()
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);
    verify()
        .send(&app.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    TestRequest::post("/api/auth/code")
        .json(&json!({ "email": "stranger@example.com" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    db.cleanup().await;
}

/// ## Summary
/// Deleting a club takes its members, posts and comments with it, and
/// deleting a giveaway takes its comments.
#[test_log::test(tokio::test)]
async fn deletes_cascade_over_postgres() {
    let Some((app, db)) = TestApp::on_postgres().await else {
        return;
    };
    let owner = app.resident("owner@example.com").await;

    let club_id = TestRequest::post("/api/clubs")
        .bearer(&owner)
        .json(&json!({ "name": "Garden Club", "description": "Plants" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED)
        .json()["id"]
        .as_str()
        .expect("club id")
        .to_string();
    TestRequest::post(&format!("/api/clubs/{club_id}/join"))
        .bearer(&owner)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let post_id = TestRequest::post(&format!("/api/clubs/{club_id}/posts"))
        .bearer(&owner)
        .json(&json!({ "title": "Seed swap", "description": "Bring extras", "post_type": "announcement" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED)
        .json()["id"]
        .as_str()
        .expect("post id")
        .to_string();
    TestRequest::post(&format!("/api/club-posts/{post_id}/comments"))
        .bearer(&owner)
        .json(&json!({ "content": "See you there" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED);

    TestRequest::delete(&format!("/api/clubs/{club_id}"))
        .bearer(&owner)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let club_id: Uuid = club_id.parse().expect("uuid");
    let post_id: Uuid = post_id.parse().expect("uuid");
    assert!(app.store.club_by_id(club_id).await.expect("load").is_none());
    assert!(app.store.club_post_by_id(post_id).await.expect("load").is_none());
    assert!(app.store.club_members(club_id).await.expect("load").is_empty());
    assert!(
        app.store
            .club_post_comments(&[post_id])
            .await
            .expect("load")
            .is_empty()
    );

    let giveaway_id = TestRequest::post("/api/community/giveaways")
        .bearer(&owner)
        .json(&json!({ "title": "Free couch", "description": "Pick up by Friday" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED)
        .json()["id"]
        .as_str()
        .expect("giveaway id")
        .to_string();
    TestRequest::post("/api/community/comments")
        .bearer(&owner)
        .json(&json!({ "item_type": "giveaway", "item_id": giveaway_id, "content": "Still here" }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::CREATED);
    TestRequest::delete(&format!("/api/community/giveaways/{giveaway_id}"))
        .bearer(&owner)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let comments = TestRequest::get(&format!(
        "/api/community/comments?item_type=giveaway&item_id={giveaway_id}"
    ))
    .bearer(&owner)
    .send(&app.service)
    .await
    .json();
    assert!(comments.as_array().expect("comments").is_empty());

    db.cleanup().await;
}
