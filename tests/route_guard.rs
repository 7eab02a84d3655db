//! Edge session/route guard behavior: redirects and role partitioning.

mod common;

fn location(res: &reqwest::Response) -> &str {
    res.headers().get("location").unwrap().to_str().unwrap()
}

#[tokio::test]
async fn test_admin_page_without_session_redirects_to_login() {
    let gw = common::start_gateway().await;
    let res = common::client()
        .get(format!("{}/admin/reports", gw.base))
        .send()
        .await
        .unwrap();

    assert!(res.status().is_redirection());
    assert_eq!(location(&res), "/login?redirectTo=%2Fadmin%2Freports");
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_admin_page_with_jobseeker_session_redirects_home() {
    let gw = common::start_gateway().await;
    let res = common::client()
        .get(format!("{}/admin/reports", gw.base))
        .header("cookie", format!("{}=tok-seeker", common::COOKIE))
        .send()
        .await
        .unwrap();

    assert!(res.status().is_redirection());
    assert_eq!(location(&res), "/");
}

#[tokio::test]
async fn test_admin_page_with_admin_session_renders() {
    let gw = common::start_gateway().await;
    let res = common::client()
        .get(format!("{}/admin/reports", gw.base))
        .header("cookie", format!("{}=tok-admin", common::COOKIE))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "reports");
}

#[tokio::test]
async fn test_dashboard_needs_any_session() {
    let gw = common::start_gateway().await;
    let client = common::client();

    let anonymous = client
        .get(format!("{}/dashboard", gw.base))
        .send()
        .await
        .unwrap();
    assert!(anonymous.status().is_redirection());
    assert_eq!(location(&anonymous), "/login?redirectTo=%2Fdashboard");

    let seeker = client
        .get(format!("{}/dashboard", gw.base))
        .header("cookie", format!("{}=tok-seeker", common::COOKIE))
        .send()
        .await
        .unwrap();
    assert_eq!(seeker.status(), 200);
}

#[tokio::test]
async fn test_unprotected_paths_bypass_the_rule_table() {
    let gw = common::start_gateway().await;
    let res = common::client()
        .get(format!("{}/health", gw.base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}
