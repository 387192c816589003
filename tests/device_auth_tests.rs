use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use caddey_chat::auth::{AccessToken, AuthError, DeviceAuthClient, Sleeper};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLIENT_ID: &str = "caddey-cli";
const DEVICE_CODE: &str = "dev-123";
const USER_CODE: &str = "ABCD-EFGH";

#[derive(Default)]
struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

fn secs(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_secs).collect()
}

fn device_body(interval: Option<u64>) -> serde_json::Value {
    let mut body = json!({
        "device_code": DEVICE_CODE,
        "user_code": USER_CODE,
        "verification_uri": "https://auth.example/device",
        "verification_uri_complete": format!("https://auth.example/device?user_code={USER_CODE}"),
        "expires_in": 600
    });
    if let Some(interval) = interval {
        body["interval"] = json!(interval);
    }
    body
}

fn oauth_error(code: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({ "error": code }))
}

fn token_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": "tok-xyz",
        "token_type": "Bearer",
        "expires_in": 300
    }))
}

async fn mount_device(server: &MockServer, interval: Option<u64>) {
    Mock::given(method("POST"))
        .and(path("/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_body(interval)))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_token(server: &MockServer, response: ResponseTemplate, times: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(response)
        .up_to_n_times(times)
        .expect(times)
        .mount(server)
        .await;
}

fn client(server: &MockServer, sleeper: Arc<RecordingSleeper>) -> DeviceAuthClient {
    DeviceAuthClient::new(CLIENT_ID)
        .unwrap()
        .with_device_code_url(format!("{}/device", server.uri()))
        .with_token_url(format!("{}/token", server.uri()))
        .with_sleeper(sleeper)
}

#[tokio::test]
async fn pending_twice_then_success_sleeps_before_every_poll() {
    let server = MockServer::start().await;
    mount_device(&server, Some(5)).await;
    mount_token(&server, oauth_error("authorization_pending"), 2).await;
    mount_token(&server, token_ok(), 1).await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let token = client(&server, sleeper.clone())
        .authenticate(|_| {})
        .await
        .expect("login should succeed");

    assert_eq!(token, AccessToken::new("tok-xyz"));
    assert_eq!(sleeper.sleeps(), secs(&[5, 5, 5]));
}

#[tokio::test]
async fn slow_down_adds_five_seconds() {
    let server = MockServer::start().await;
    mount_device(&server, Some(5)).await;
    mount_token(&server, oauth_error("slow_down"), 1).await;
    mount_token(&server, token_ok(), 1).await;

    let sleeper = Arc::new(RecordingSleeper::default());
    client(&server, sleeper.clone())
        .authenticate(|_| {})
        .await
        .expect("login should succeed");

    assert_eq!(sleeper.sleeps(), secs(&[5, 10]));
}

#[tokio::test]
async fn slow_down_is_cumulative_and_sticky() {
    let server = MockServer::start().await;
    mount_device(&server, Some(5)).await;
    mount_token(&server, oauth_error("slow_down"), 2).await;
    mount_token(&server, oauth_error("authorization_pending"), 1).await;
    mount_token(&server, token_ok(), 1).await;

    let sleeper = Arc::new(RecordingSleeper::default());
    client(&server, sleeper.clone())
        .authenticate(|_| {})
        .await
        .expect("login should succeed");

    assert_eq!(sleeper.sleeps(), secs(&[5, 10, 15, 15]));
}

#[tokio::test]
async fn missing_interval_defaults_to_five_seconds() {
    let server = MockServer::start().await;
    mount_device(&server, None).await;
    mount_token(&server, token_ok(), 1).await;

    let sleeper = Arc::new(RecordingSleeper::default());
    client(&server, sleeper.clone())
        .authenticate(|_| {})
        .await
        .unwrap();

    assert_eq!(sleeper.sleeps(), secs(&[5]));
}

#[tokio::test]
async fn server_interval_is_honoured() {
    let server = MockServer::start().await;
    mount_device(&server, Some(2)).await;
    mount_token(&server, oauth_error("authorization_pending"), 1).await;
    mount_token(&server, token_ok(), 1).await;

    let sleeper = Arc::new(RecordingSleeper::default());
    client(&server, sleeper.clone())
        .authenticate(|_| {})
        .await
        .unwrap();

    assert_eq!(sleeper.sleeps(), secs(&[2, 2]));
}

#[tokio::test]
async fn denial_is_terminal_and_named() {
    for code in ["access_denied", "expired_token"] {
        let server = MockServer::start().await;
        mount_device(&server, Some(5)).await;
        mount_token(&server, oauth_error(code), 1).await;

        let sleeper = Arc::new(RecordingSleeper::default());
        let err = client(&server, sleeper.clone())
            .authenticate(|_| {})
            .await
            .expect_err("denial should end polling");

        assert!(matches!(err, AuthError::Denied { code: ref c } if c == code));
        assert_eq!(sleeper.sleeps().len(), 1);
    }
}

#[tokio::test]
async fn unexpected_status_is_a_transport_failure() {
    let server = MockServer::start().await;
    mount_device(&server, Some(5)).await;
    mount_token(
        &server,
        ResponseTemplate::new(500).set_body_string("internal error"),
        1,
    )
    .await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let err = client(&server, sleeper)
        .authenticate(|_| {})
        .await
        .expect_err("500 should end polling");

    assert!(matches!(
        err,
        AuthError::Transport { status: 500, ref body } if body == "internal error"
    ));
}

#[tokio::test]
async fn device_endpoint_failure_never_polls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid_client"}"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_ok())
        .expect(0)
        .mount(&server)
        .await;

    let presented = Arc::new(Mutex::new(false));
    let flag = presented.clone();
    let sleeper = Arc::new(RecordingSleeper::default());
    let err = client(&server, sleeper.clone())
        .authenticate(move |_| *flag.lock().unwrap() = true)
        .await
        .expect_err("setup failure");

    assert!(matches!(
        err,
        AuthError::Setup { status: 401, ref body } if body.contains("invalid_client")
    ));
    assert!(!*presented.lock().unwrap());
    assert!(sleeper.sleeps().is_empty());
}

#[tokio::test]
async fn max_wait_stops_polling() {
    let server = MockServer::start().await;
    mount_device(&server, Some(5)).await;
    mount_token(&server, oauth_error("authorization_pending"), 2).await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let err = client(&server, sleeper.clone())
        .with_max_wait(Some(Duration::from_secs(12)))
        .authenticate(|_| {})
        .await
        .expect_err("should time out");

    assert!(matches!(err, AuthError::TimedOut { waited_secs: 10 }));
    assert_eq!(sleeper.sleeps(), secs(&[5, 5]));
}

#[tokio::test]
async fn requests_are_form_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains(format!("client_id={CLIENT_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_body(Some(5))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Adevice_code",
        ))
        .and(body_string_contains(format!("device_code={DEVICE_CODE}")))
        .and(body_string_contains(format!("client_id={CLIENT_ID}")))
        .respond_with(token_ok())
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::default());
    client(&server, sleeper).authenticate(|_| {}).await.unwrap();
}

#[tokio::test]
async fn session_is_presented_before_first_poll() {
    let server = MockServer::start().await;
    mount_device(&server, Some(5)).await;
    mount_token(&server, token_ok(), 1).await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let seen = Arc::new(Mutex::new(None));
    let seen_in_presenter = seen.clone();
    let sleeper_in_presenter = sleeper.clone();

    client(&server, sleeper.clone())
        .authenticate(move |session| {
            let sleeps_so_far = sleeper_in_presenter.sleeps().len();
            *seen_in_presenter.lock().unwrap() = Some((
                session.user_code.clone(),
                session.verification_uri_complete.clone(),
                sleeps_so_far,
            ));
        })
        .await
        .unwrap();

    let (user_code, complete, sleeps_so_far) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(user_code, USER_CODE);
    assert!(complete.ends_with(USER_CODE));
    assert_eq!(sleeps_so_far, 0);
}

#[tokio::test]
async fn no_request_after_success() {
    let server = MockServer::start().await;
    mount_device(&server, Some(1)).await;
    mount_token(&server, token_ok(), 1).await;

    let sleeper = Arc::new(RecordingSleeper::default());
    client(&server, sleeper).authenticate(|_| {}).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let token_requests = requests
        .iter()
        .filter(|request| request.url.path() == "/token")
        .count();
    assert_eq!(token_requests, 1);
}

#[tokio::test]
async fn http_client_can_be_injected() {
    let server = MockServer::start().await;
    mount_device(&server, Some(5)).await;
    mount_token(&server, token_ok(), 1).await;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let sleeper = Arc::new(RecordingSleeper::default());
    let token = client(&server, sleeper)
        .with_http_client(http)
        .authenticate(|_| {})
        .await
        .unwrap();
    assert_eq!(token.secret(), "tok-xyz");
}

#[tokio::test]
async fn slow_down_then_pending_keeps_the_longer_interval() {
    let server = MockServer::start().await;
    mount_device(&server, Some(5)).await;
    mount_token(&server, oauth_error("slow_down"), 1).await;
    mount_token(&server, oauth_error("authorization_pending"), 1).await;
    mount_token(&server, token_ok(), 1).await;

    let sleeper = Arc::new(RecordingSleeper::default());
    client(&server, sleeper.clone())
        .authenticate(|_| {})
        .await
        .unwrap();

    assert_eq!(sleeper.sleeps(), secs(&[5, 10, 10]));
}

#[tokio::test]
async fn blank_client_id_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = DeviceAuthClient::new("  ")
        .err()
        .expect("blank client id should be rejected");
    assert!(matches!(err, AuthError::Configuration(_)));
}

#[tokio::test]
async fn unreachable_token_endpoint_is_a_network_failure() {
    let server = MockServer::start().await;
    mount_device(&server, Some(5)).await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let err = client(&server, sleeper.clone())
        .with_token_url("http://127.0.0.1:1/token")
        .authenticate(|_| {})
        .await
        .expect_err("refused connection should end polling");

    assert!(matches!(err, AuthError::Network(ref message) if message.contains("127.0.0.1:1")));
    assert_eq!(sleeper.sleeps(), secs(&[5]));
}

#[tokio::test]
async fn token_request_timeout_is_a_network_failure() {
    let server = MockServer::start().await;
    mount_device(&server, Some(5)).await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_ok().set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let sleeper = Arc::new(RecordingSleeper::default());
    let err = client(&server, sleeper.clone())
        .with_http_client(http)
        .authenticate(|_| {})
        .await
        .expect_err("slow token endpoint should time out");

    assert!(matches!(err, AuthError::Network(_)));
    assert_eq!(sleeper.sleeps(), secs(&[5]));
}
