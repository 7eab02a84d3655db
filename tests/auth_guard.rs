//! End-to-end tests for the authorization guard pipeline.

use std::sync::atomic::Ordering;

mod common;

#[tokio::test]
async fn test_unauthenticated_mutation_is_401_and_handler_never_runs() {
    let gw = common::start_gateway().await;
    let res = common::client()
        .post(format!("{}/api/jobs", gw.base))
        .header("origin", "http://localhost:3000")
        .json(&serde_json::json!({"title": "Backend Engineer"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 401);
    assert!(res.headers().contains_key("x-ratelimit-remaining"));
    assert!(res.headers().contains_key("x-request-id"));
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(gw.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_role_mismatch_is_403_with_one_security_event() {
    let gw = common::start_gateway().await;
    let res = common::client()
        .post(format!("{}/api/jobs", gw.base))
        .header("origin", "http://localhost:3000")
        .header("cookie", format!("{}=tok-seeker", common::COOKIE))
        .json(&serde_json::json!({"title": "x"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 403);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Forbidden");
    // Never hints at which role would have worked.
    assert!(!body["message"].as_str().unwrap().contains("employer"));
    assert_eq!(gw.hits.load(Ordering::SeqCst), 0);

    let events = gw.state.events.captured();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, "role_mismatch");
    assert_eq!(events[0].details["actual"], "jobseeker");
    assert_eq!(events[0].details["required"][0], "employer");
}

#[tokio::test]
async fn test_employer_can_create_job() {
    let gw = common::start_gateway().await;
    let res = common::client()
        .post(format!("{}/api/jobs", gw.base))
        .header("origin", "http://localhost:3000")
        .header("cookie", format!("{}=tok-emp", common::COOKIE))
        .json(&serde_json::json!({"title": "x"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 201);
    assert!(res.headers().contains_key("x-ratelimit-remaining"));
    assert_eq!(gw.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_foreign_origin_is_403_before_auth() {
    let gw = common::start_gateway().await;
    let res = common::client()
        .post(format!("{}/api/jobs", gw.base))
        .header("origin", "https://evil.example.net")
        .header("cookie", format!("{}=tok-emp", common::COOKIE))
        .json(&serde_json::json!({"title": "x"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 403);
    assert_eq!(gw.hits.load(Ordering::SeqCst), 0);
    let events = gw.state.events.captured();
    assert_eq!(events[0].event, "origin_rejected");
}

#[tokio::test]
async fn test_admin_surface_requires_bootstrap_token() {
    let gw = common::start_gateway().await;
    let client = common::client();

    let denied = client
        .get(format!("{}/internal/status", gw.base))
        .header("authorization", "Bearer wrong-token")
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), 401);

    let ok = client
        .get(format!("{}/internal/status", gw.base))
        .header("authorization", format!("Bearer {}", common::ADMIN_TOKEN))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);
    let body: serde_json::Value = ok.json().await.unwrap();
    assert_eq!(body["status"], "operational");
}

#[tokio::test]
async fn test_admin_rate_limit_buckets_by_source_address() {
    let gw = common::start_gateway().await;

    // Exhaust the admin policy (30/min) from one loopback address with bad
    // tokens.
    let attacker = common::client_from("127.0.0.2");
    for _ in 0..30 {
        let res = attacker
            .get(format!("{}/internal/status", gw.base))
            .header("authorization", "Bearer wrong-token")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 401);
    }
    let exhausted = attacker
        .get(format!("{}/internal/status", gw.base))
        .header("authorization", "Bearer wrong-token")
        .send()
        .await
        .unwrap();
    assert_eq!(exhausted.status(), 429);

    // A different source address has its own bucket: a legitimate admin is
    // unaffected by the exhausted one.
    let admin = common::client_from("127.0.0.1");
    let res = admin
        .get(format!("{}/internal/status", gw.base))
        .header("authorization", format!("Bearer {}", common::ADMIN_TOKEN))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_health_is_open() {
    let gw = common::start_gateway().await;
    let res = common::client()
        .get(format!("{}/health", gw.base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}
