use crate::common::http_session;
use easypay_panel::config::HttpConfig;
use easypay_panel::http::{CookieBundle, HttpSession};
use easypay_panel::PanelError;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_get_sends_query_and_cookies() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage/dingdan/index.html"))
        .and(query_param("page", "2"))
        .and(query_param("status", "1"))
        .and(header("cookie", "a=1; b=2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("ok")
                .insert_header("cache-control", "private"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cookies = CookieBundle::new().with("a", "1").with("b", "2");
    let query = vec![
        ("page".to_string(), "2".to_string()),
        ("status".to_string(), "1".to_string()),
    ];

    let response = http_session()
        .get(
            &format!("{}/manage/dingdan/index.html", server.uri()),
            &query,
            &cookies,
        )
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.header("Cache-Control"), Some("private"));
    assert_eq!(response.text(), "ok");
}

#[tokio::test]
async fn test_redirect_hop_cookies_are_carried_forward() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/end")
                .insert_header("set-cookie", "hop=1; path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/end"))
        .and(header("cookie", "hop=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("landed"))
        .expect(1)
        .mount(&server)
        .await;

    let session = http_session();
    let start = format!("{}/start", server.uri());
    let response = session
        .get(&start, &[], &CookieBundle::new())
        .await
        .unwrap();

    assert_eq!(response.text(), "landed");
    assert_eq!(response.url.path(), "/end");
    // Set by an intermediate hop: kept in the jar, not on the final response
    assert_eq!(response.cookie("hop"), None);
    assert_eq!(session.stored_cookie(&start, "hop").as_deref(), Some("1"));
}

#[tokio::test]
async fn test_post_redirect_switches_to_get() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Manage/Index/login/7.html"))
        .and(body_string_contains("username=admin"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/manage/main/index.html")
                .insert_header("set-cookie", "fx_admin_user_CODE=C0DE; path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/manage/main/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
        .expect(1)
        .mount(&server)
        .await;

    let session = http_session();
    let response = session
        .post_form(
            &format!("{}/Manage/Index/login/7.html", server.uri()),
            &[("username", "admin"), ("password", "pw"), ("yzm", "ab12")],
            &CookieBundle::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.text(), "welcome");
    assert_eq!(
        session
            .stored_cookie(response.url.as_str(), "fx_admin_user_CODE")
            .as_deref(),
        Some("C0DE")
    );
}

#[tokio::test]
async fn test_temporary_redirect_keeps_post() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(307).insert_header("location", "/new"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/new"))
        .and(body_string_contains("yzm=ab12"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
        .expect(1)
        .mount(&server)
        .await;

    let response = http_session()
        .post_form(
            &format!("{}/old", server.uri()),
            &[("yzm", "ab12")],
            &CookieBundle::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.text(), "moved");
}

#[tokio::test]
async fn test_redirect_loop_detected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/b"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/a"))
        .mount(&server)
        .await;

    let result = http_session()
        .get(&format!("{}/a", server.uri()), &[], &CookieBundle::new())
        .await;

    match result {
        Err(PanelError::RedirectLoop { url }) => assert!(url.ends_with("/a")),
        other => panic!("expected redirect loop, got {:?}", other.map(|r| r.status)),
    }
}

#[tokio::test]
async fn test_redirect_limit_enforced() {
    let server = MockServer::start().await;

    for (from, to) in [("/r1", "/r2"), ("/r2", "/r3"), ("/r3", "/r4")] {
        Mock::given(method("GET"))
            .and(path(from))
            .respond_with(ResponseTemplate::new(302).insert_header("location", to))
            .mount(&server)
            .await;
    }

    let session = HttpSession::new(&HttpConfig {
        max_redirects: 1,
        ..HttpConfig::default()
    })
    .unwrap();

    let result = session
        .get(&format!("{}/r1", server.uri()), &[], &CookieBundle::new())
        .await;

    match result {
        Err(e @ PanelError::RedirectLimit { .. }) => assert!(e.is_transport()),
        other => panic!("expected redirect limit, got {:?}", other.map(|r| r.status)),
    }
}

#[tokio::test]
async fn test_redirect_without_location_is_final() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage.php"))
        .respond_with(
            ResponseTemplate::new(302)
                .set_body_string("no location")
                .insert_header("set-cookie", "PHPSESSID=s1; path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = http_session()
        .get(
            &format!("{}/manage.php", server.uri()),
            &[],
            &CookieBundle::new(),
        )
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 302);
    assert_eq!(response.cookie("PHPSESSID"), Some("s1"));
}
