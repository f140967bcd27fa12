mod common;

use authgate::client::{
    bootstrap, logout, submit_login, AuthClient, ClientError, FileTokenStore, LoginForm, Session,
    TokenStore,
};
use time::OffsetDateTime;

use common::test_app;

async fn spawn_server() -> String {
    let app = test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.router).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn signup_login_and_session_bootstrap_against_live_server() {
    let base = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(dir.path().join("session.json"));
    let client = AuthClient::new(&base);

    // Fresh start: nothing stored, so the home check sends us to login.
    assert_eq!(bootstrap(&store, OffsetDateTime::now_utc()), Session::LoggedOut);

    let form = LoginForm::new("Ada", "ada@example.com", "Lovelace1");
    let outcome = submit_login(&client, &store, &form).await.expect("signup");
    assert!(outcome.is_signup());

    match bootstrap(&store, OffsetDateTime::now_utc()) {
        Session::Active(user) => {
            assert_eq!(user.name, "Ada");
            assert_eq!(user.email, "ada@example.com");
            assert_eq!(user.id, outcome.response().user.id);
        }
        Session::LoggedOut => panic!("expected an active session"),
    }

    let token = store.get().unwrap().expect("token stored");
    let me = client.me(&token).await.expect("me");
    assert_eq!(me.id, outcome.response().user.id);

    logout(&store).unwrap();
    assert_eq!(bootstrap(&store, OffsetDateTime::now_utc()), Session::LoggedOut);

    let again = submit_login(&client, &store, &form).await.expect("login");
    assert!(!again.is_signup());
    assert_eq!(again.response().user.id, outcome.response().user.id);
}

#[tokio::test]
async fn wrong_password_surfaces_server_message_and_stores_nothing() {
    let base = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(dir.path().join("session.json"));
    let client = AuthClient::new(&base);

    submit_login(&client, &store, &LoginForm::new("Ada", "ada@example.com", "Lovelace1"))
        .await
        .expect("signup");
    logout(&store).unwrap();

    let err = submit_login(&client, &store, &LoginForm::new("Ada", "ada@example.com", "Babbage42"))
        .await
        .unwrap_err();
    match err {
        ClientError::Server { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect password");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.get().unwrap(), None);
}
