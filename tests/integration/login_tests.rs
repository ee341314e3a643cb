use crate::common::*;
use easypay_panel::config::HttpConfig;
use easypay_panel::store::{
    FileSessionStore, MemorySessionStore, PersistedSession, SessionStore, StoreError,
};
use easypay_panel::{Credentials, PanelClient, PanelError, QueryIdentity};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> Credentials {
    Credentials::new("operator", "s3cret!")
}

fn identity() -> QueryIdentity {
    QueryIdentity::new(PROBE_KEY, PROBE_VALUE)
}

fn scratch_entries(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path())
        .expect("Failed to read scratch dir")
        .count()
}

#[tokio::test]
async fn test_successful_login_persists_session() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("/Manage/Index/login/{}.html", FORM_ID)))
        .and(header("cookie", login_cookie_header().as_str()))
        .and(body_string_contains("username=operator"))
        .and(body_string_contains("yzm=ab12"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"status":1,"info":"ok"}"#)
                .insert_header("set-cookie", "fx_admin_user_CODE=XYZ; path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session_dir = TempDir::new().unwrap();
    let scratch_dir = TempDir::new().unwrap();
    let store = Arc::new(FileSessionStore::new(session_dir.path()));
    let solver = RecordingSolver::new("ab12");
    let client = client(&server, store.clone(), solver.clone(), scratch_dir.path());

    let envelope = client.login(&credentials(), &identity()).await;

    assert_eq!(
        serde_json::to_value(&envelope).unwrap(),
        json!({
            "result": true,
            "message": "success",
            "data": [{"fx_admin_user_CODE": "XYZ", "PHPSESSID": SESSION_ID}]
        })
    );

    // The persisted files hold exactly what the panel handed out
    assert_eq!(
        std::fs::read_to_string(store.user_code_path()).unwrap(),
        "XYZ"
    );
    assert_eq!(
        std::fs::read_to_string(store.session_id_path()).unwrap(),
        SESSION_ID
    );

    // The solver saw the verify image, and the scratch file is gone
    assert_eq!(solver.calls(), 1);
    assert_eq!(*solver.last_image.lock().unwrap(), CAPTCHA_PNG.to_vec());
    assert_eq!(scratch_entries(&scratch_dir), 0);
}

#[tokio::test]
async fn test_probe_without_session_cookie_fails_without_writing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::with_session(PersistedSession::new(
        "OLD", "old-sess",
    )));
    let scratch_dir = TempDir::new().unwrap();
    let solver = RecordingSolver::new("ab12");
    let client = client(&server, store.clone(), solver.clone(), scratch_dir.path());

    let envelope = client.login(&credentials(), &identity()).await;
    assert!(!envelope.result);
    assert_eq!(envelope.message, "failed");
    assert!(envelope.data.is_empty());

    // Nothing was touched
    assert_eq!(store.load().unwrap(), PersistedSession::new("OLD", "old-sess"));
    assert_eq!(solver.calls(), 0);
}

#[tokio::test]
async fn test_wrong_length_captcha_aborts_before_post() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let scratch_dir = TempDir::new().unwrap();
    let solver = RecordingSolver::new("ab1");
    let client = client(&server, store.clone(), solver.clone(), scratch_dir.path());

    let result = client.try_login(&credentials(), &identity()).await;
    assert!(matches!(result, Err(PanelError::ValidationFailed(_))));

    assert_eq!(solver.calls(), 1);
    assert!(matches!(store.load(), Err(StoreError::Missing(_))));
    assert_eq!(scratch_entries(&scratch_dir), 0);
}

#[tokio::test]
async fn test_login_without_user_code_cookie_fails() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("/Manage/Index/login/{}.html", FORM_ID)))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"status":0,"info":"验证码错误"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let scratch_dir = TempDir::new().unwrap();
    let client = client(
        &server,
        store.clone(),
        RecordingSolver::new("ab12"),
        scratch_dir.path(),
    );

    let envelope = client.login(&credentials(), &identity()).await;
    assert!(!envelope.result);
    assert_eq!(envelope.message, "failed");
    assert!(matches!(store.load(), Err(StoreError::Missing(_))));
}

#[tokio::test]
async fn test_login_page_without_post_form_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><p>closed for maintenance</p></body></html>")
                .insert_header("set-cookie", "PHPSESSID=sess-1; path=/"),
        )
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Manage/Index/verify.html"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let scratch_dir = TempDir::new().unwrap();
    let client = client(
        &server,
        Arc::new(MemorySessionStore::new()),
        RecordingSolver::new("ab12"),
        scratch_dir.path(),
    );

    let result = client.try_login(&credentials(), &identity()).await;
    assert!(matches!(result, Err(PanelError::MissingField { .. })));
}

#[tokio::test]
async fn test_login_form_action_without_id_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<form method="post" action="/Manage/Index/login.html"></form>"#)
                .insert_header("set-cookie", "PHPSESSID=sess-1; path=/"),
        )
        .mount(&server)
        .await;

    let scratch_dir = TempDir::new().unwrap();
    let client = client(
        &server,
        Arc::new(MemorySessionStore::new()),
        RecordingSolver::new("ab12"),
        scratch_dir.path(),
    );

    let result = client.try_login(&credentials(), &identity()).await;
    assert!(matches!(result, Err(PanelError::PatternMismatch { .. })));
}

#[tokio::test]
async fn test_unreachable_panel_reports_transport_error() {
    // Nothing listens on port 9 of the loopback address
    let http = HttpConfig {
        timeout_secs: 1,
        ..HttpConfig::default()
    };
    let scratch_dir = TempDir::new().unwrap();
    let client = PanelClient::new(
        "http://127.0.0.1:9",
        http,
        Arc::new(MemorySessionStore::new()),
        RecordingSolver::new("ab12"),
    )
    .with_scratch_dir(scratch_dir.path());

    let envelope = client.login(&credentials(), &identity()).await;
    assert!(!envelope.result);
    assert!(
        envelope.message.starts_with("failed, error: "),
        "unexpected message: {}",
        envelope.message
    );
}

#[tokio::test]
async fn test_slow_probe_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manage.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .insert_header("set-cookie", "PHPSESSID=sess-1; path=/"),
        )
        .mount(&server)
        .await;

    let http = HttpConfig {
        timeout_secs: 1,
        ..HttpConfig::default()
    };
    let scratch_dir = TempDir::new().unwrap();
    let client = PanelClient::new(
        server.uri(),
        http,
        Arc::new(MemorySessionStore::new()),
        RecordingSolver::new("ab12"),
    )
    .with_scratch_dir(scratch_dir.path());

    let result = client.try_login(&credentials(), &identity()).await;
    match result {
        Err(e) => assert!(e.is_transport(), "expected transport error, got {}", e),
        Ok(_) => panic!("login should time out"),
    }
}

/// Mounts probe and reprobe, with the reprobe also setting `reprobe_cookie`
async fn mount_probes_setting(server: &MockServer, reprobe_cookie: &str) {
    Mock::given(method("GET"))
        .and(path("/manage.php"))
        .and(header("cookie", login_cookie_header().as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(login_page())
                .insert_header("set-cookie", reprobe_cookie),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/manage.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", format!("PHPSESSID={}; path=/", SESSION_ID).as_str()),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_cookies_set_during_login_are_sent_on_later_requests() {
    let server = MockServer::start().await;
    mount_probes_setting(&server, "vtoken=abc; path=/").await;

    let with_token = format!("{}; vtoken=abc", login_cookie_header());

    Mock::given(method("GET"))
        .and(path("/Manage/Index/verify.html"))
        .and(header("cookie", with_token.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(CAPTCHA_PNG.to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/Manage/Index/login/{}.html", FORM_ID)))
        .and(header("cookie", with_token.as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "fx_admin_user_CODE=XYZ; path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let scratch_dir = TempDir::new().unwrap();
    let store = Arc::new(MemorySessionStore::new());
    let client = client(
        &server,
        store.clone(),
        RecordingSolver::new("ab12"),
        scratch_dir.path(),
    );

    let session = client.try_login(&credentials(), &identity()).await.unwrap();
    assert_eq!(session, PersistedSession::new("XYZ", SESSION_ID));
    assert_eq!(store.load().unwrap(), session);
}

#[tokio::test]
async fn test_cookie_deleted_by_panel_is_not_sent_again() {
    let server = MockServer::start().await;
    mount_probes_setting(&server, "vtoken=abc; path=/").await;

    Mock::given(method("GET"))
        .and(path("/Manage/Index/verify.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(CAPTCHA_PNG.to_vec())
                .insert_header("set-cookie", "vtoken=; Max-Age=0; path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Only the bundle itself remains once the token is deleted
    Mock::given(method("POST"))
        .and(path(format!("/Manage/Index/login/{}.html", FORM_ID)))
        .and(header("cookie", login_cookie_header().as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "fx_admin_user_CODE=XYZ; path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let scratch_dir = TempDir::new().unwrap();
    let client = client(
        &server,
        Arc::new(MemorySessionStore::new()),
        RecordingSolver::new("ab12"),
        scratch_dir.path(),
    );

    let envelope = client.login(&credentials(), &identity()).await;
    assert!(envelope.is_success(), "login failed: {}", envelope.message);
}

#[tokio::test]
async fn test_user_code_set_before_redirect_is_found() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("/Manage/Index/login/{}.html", FORM_ID)))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/manage/main/index.html")
                .insert_header("set-cookie", "fx_admin_user_CODE=XYZ; path=/"),
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

    let scratch_dir = TempDir::new().unwrap();
    let client = client(
        &server,
        Arc::new(MemorySessionStore::new()),
        RecordingSolver::new("ab12"),
        scratch_dir.path(),
    );

    let session = client.try_login(&credentials(), &identity()).await.unwrap();
    assert_eq!(session.user_code, "XYZ");
}

#[tokio::test]
async fn test_each_login_starts_with_an_empty_jar() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("/Manage/Index/login/{}.html", FORM_ID)))
        .and(header("cookie", login_cookie_header().as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "fx_admin_user_CODE=XYZ; path=/"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let scratch_dir = TempDir::new().unwrap();
    let client = client(
        &server,
        Arc::new(MemorySessionStore::new()),
        RecordingSolver::new("ab12"),
        scratch_dir.path(),
    );

    // The second handshake would carry fx_admin_user_CODE if the jar were shared
    assert!(client.login(&credentials(), &identity()).await.is_success());
    assert!(client.login(&credentials(), &identity()).await.is_success());
}
