use std::sync::Arc;

use anndaan_auth::{
    AppError, AuthApi, FlowConfig, FlowState, LoginFlow, LoginForm, LoginMethod, LoginOutcome,
    MemorySessionStore, Role, SessionStore,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn flow_with(
    server: &MockServer,
    store: Arc<MemorySessionStore>,
    config: FlowConfig,
) -> LoginFlow {
    let api = Arc::new(AuthApi::new(&server.uri()).unwrap());
    LoginFlow::new(api, store, config)
}

#[tokio::test]
async fn malformed_email_blocks_submission_without_network() {
    let server = MockServer::start().await;
    let store = MemorySessionStore::shared();
    let mut flow = flow_with(&server, store.clone(), FlowConfig::default());

    let form = LoginForm {
        email: "not-an-email".to_string(),
        password: "secret".to_string(),
        ..Default::default()
    };
    let result = flow.submit(form).await;

    assert!(matches!(result, Err(AppError::ValidationError(_))));
    assert_eq!(flow.errors().get("email"), Some("Email is invalid"));
    assert_eq!(flow.state(), &FlowState::Failed);
    assert!(store.load().await.unwrap().is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_phone_blocks_submission_without_network() {
    let server = MockServer::start().await;
    let store = MemorySessionStore::shared();
    let config = FlowConfig {
        login_method: LoginMethod::Phone,
        ..Default::default()
    };
    let mut flow = flow_with(&server, store, config);

    let form = LoginForm {
        phone: "12345".to_string(),
        password: "secret".to_string(),
        ..Default::default()
    };
    let result = flow.submit(form).await;

    assert!(matches!(result, Err(AppError::ValidationError(_))));
    assert_eq!(
        flow.errors().get("phone"),
        Some("Phone number must be 10 digits")
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn demo_login_bypasses_network_entirely() {
    let server = MockServer::start().await;
    let store = MemorySessionStore::shared();
    let config = FlowConfig {
        demo_bypass: true,
        ..Default::default()
    };
    let mut flow = flow_with(&server, store.clone(), config);

    let form = LoginForm {
        email: "tasty@bites.com".to_string(),
        password: "tasty123".to_string(),
        ..Default::default()
    };
    let outcome = flow.submit(form).await.unwrap();

    let LoginOutcome::Authenticated { session, redirect } = outcome else {
        panic!("expected direct authentication");
    };
    assert_eq!(session.role, Role::Restaurant);
    assert_eq!(redirect, "/restaurant/dashboard");
    assert!(session.token.starts_with("demo-"));

    // Session persisted, zero HTTP calls observed
    assert_eq!(store.load().await.unwrap().unwrap(), session);
    assert!(server.received_requests().await.unwrap().is_empty());
    assert_eq!(flow.state(), &FlowState::Authenticated);
}

#[tokio::test]
async fn demo_bypass_disabled_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = MemorySessionStore::shared();
    let mut flow = flow_with(&server, store, FlowConfig::default());

    let form = LoginForm {
        email: "tasty@bites.com".to_string(),
        password: "tasty123".to_string(),
        ..Default::default()
    };
    let result = flow.submit(form).await;

    // Without the bypass the demo pair goes to the API like anyone else
    let err = result.unwrap_err();
    assert_eq!(err.user_message(), "Invalid credentials");
}

#[tokio::test]
async fn login_passes_through_api_token_and_role() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({
            "email": "owner@place.com",
            "password": "secret1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "jwt-token",
            "username": "owner@place.com",
            "role": "ROLE_RESTAURANT"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemorySessionStore::shared();
    let mut flow = flow_with(&server, store.clone(), FlowConfig::default());

    let form = LoginForm {
        email: "owner@place.com".to_string(),
        password: "secret1".to_string(),
        ..Default::default()
    };
    let outcome = flow.submit(form).await.unwrap();

    let LoginOutcome::Authenticated { session, redirect } = outcome else {
        panic!("expected authentication");
    };
    assert_eq!(session.token, "jwt-token");
    assert_eq!(session.username, "owner@place.com");
    assert_eq!(session.role, Role::Restaurant);
    assert_eq!(redirect, "/restaurant/dashboard");
}

#[tokio::test]
async fn non_restaurant_role_redirects_home() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "jwt-token",
            "username": "vol@place.com",
            "role": "ROLE_VOLUNTEER"
        })))
        .mount(&server)
        .await;

    let store = MemorySessionStore::shared();
    let mut flow = flow_with(&server, store, FlowConfig::default());

    let form = LoginForm {
        email: "vol@place.com".to_string(),
        password: "secret1".to_string(),
        ..Default::default()
    };
    let LoginOutcome::Authenticated { session, redirect } = flow.submit(form).await.unwrap()
    else {
        panic!("expected authentication");
    };
    assert_eq!(session.role, Role::Other);
    assert_eq!(redirect, "/");
}

#[tokio::test]
async fn otp_method_requests_code_for_email_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/send-otp"))
        .and(body_json(json!({ "email": "a@b.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemorySessionStore::shared();
    let config = FlowConfig {
        login_method: LoginMethod::Otp,
        ..Default::default()
    };
    let mut flow = flow_with(&server, store, config);

    let form = LoginForm {
        email: "a@b.com".to_string(),
        ..Default::default()
    };
    let outcome = flow.submit(form).await.unwrap();

    assert!(matches!(outcome, LoginOutcome::OtpSent));
    assert_eq!(flow.state(), &FlowState::OtpRequested);
    assert!(flow.pending_challenge().is_some());
}

#[tokio::test]
async fn otp_login_completes_after_verification() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/send-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/verify-otp"))
        .and(body_json(json!({ "email": "a@b.com", "otp": "123456" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "jwt-token",
            "username": "a@b.com",
            "role": "ROLE_RESTAURANT"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemorySessionStore::shared();
    let config = FlowConfig {
        login_method: LoginMethod::Otp,
        ..Default::default()
    };
    let mut flow = flow_with(&server, store.clone(), config);

    let form = LoginForm {
        email: "a@b.com".to_string(),
        ..Default::default()
    };
    flow.submit(form).await.unwrap();

    let outcome = flow.submit_otp("123456").await.unwrap();
    let LoginOutcome::Authenticated { session, .. } = outcome else {
        panic!("expected authentication after OTP");
    };
    assert_eq!(session.token, "jwt-token");
    assert!(store.load().await.unwrap().is_some());
}

#[tokio::test]
async fn invalid_otp_keeps_challenge_for_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/send-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/verify-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let store = MemorySessionStore::shared();
    let config = FlowConfig {
        login_method: LoginMethod::Otp,
        ..Default::default()
    };
    let mut flow = flow_with(&server, store, config);

    let form = LoginForm {
        email: "a@b.com".to_string(),
        ..Default::default()
    };
    flow.submit(form).await.unwrap();

    let err = flow.submit_otp("999999").await.unwrap_err();
    assert!(matches!(
        err,
        AppError::AuthError(anndaan_auth::error::AuthError::InvalidOtp)
    ));
    // The challenge survives a bad code, so the same step can be retried
    assert!(flow.pending_challenge().is_some());
}

#[tokio::test]
async fn switching_method_discards_challenge_and_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/send-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let store = MemorySessionStore::shared();
    let config = FlowConfig {
        login_method: LoginMethod::Otp,
        ..Default::default()
    };
    let mut flow = flow_with(&server, store, config);

    let form = LoginForm {
        email: "a@b.com".to_string(),
        ..Default::default()
    };
    flow.submit(form).await.unwrap();
    assert!(flow.pending_challenge().is_some());

    flow.select_method(LoginMethod::Email);
    assert!(flow.pending_challenge().is_none());
    assert!(flow.errors().is_empty());
    assert_eq!(flow.state(), &FlowState::Idle);
    assert_eq!(flow.method(), LoginMethod::Email);
}

#[tokio::test]
async fn submit_otp_without_challenge_is_rejected() {
    let server = MockServer::start().await;
    let store = MemorySessionStore::shared();
    let mut flow = flow_with(&server, store, FlowConfig::default());

    let err = flow.submit_otp("123456").await.unwrap_err();
    assert!(matches!(
        err,
        AppError::AuthError(anndaan_auth::error::AuthError::NoPendingOtp)
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn forgot_password_verification_hands_off_identifier() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/send-otp"))
        .and(body_json(json!({ "email": "a@b.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/verify-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    // The forgot-password path never touches the login endpoint
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = MemorySessionStore::shared();
    let mut flow = flow_with(&server, store.clone(), FlowConfig::default());
    flow.begin_forgot_password();

    let form = LoginForm {
        email: "a@b.com".to_string(),
        ..Default::default()
    };
    let outcome = flow.submit(form).await.unwrap();
    assert!(matches!(outcome, LoginOutcome::OtpSent));

    let outcome = flow.submit_otp("123456").await.unwrap();
    let LoginOutcome::ResetVerified { identifier } = outcome else {
        panic!("expected reset hand-off");
    };
    assert_eq!(identifier.value(), "a@b.com");
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn require_otp_gates_password_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/send-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/verify-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({
            "email": "a@b.com",
            "password": "secret1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "jwt-token",
            "username": "a@b.com",
            "role": "ROLE_RESTAURANT"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemorySessionStore::shared();
    let config = FlowConfig {
        require_otp: true,
        ..Default::default()
    };
    let mut flow = flow_with(&server, store, config);

    let form = LoginForm {
        email: "a@b.com".to_string(),
        password: "secret1".to_string(),
        ..Default::default()
    };
    let outcome = flow.submit(form).await.unwrap();
    assert!(matches!(outcome, LoginOutcome::OtpSent));

    let outcome = flow.submit_otp("123456").await.unwrap();
    assert!(matches!(outcome, LoginOutcome::Authenticated { .. }));
}
