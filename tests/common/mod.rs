#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use authgate::{
    app::build_app,
    auth::{
        jwt::JwtKeys,
        memory::MemoryUserStore,
        repo::UserStore,
        repo_types::{NewUser, StoreError, User},
    },
    config::{AppConfig, JwtConfig, StoreKind},
    state::AppState,
};
use axum::Router;
use uuid::Uuid;

pub fn test_config() -> AppConfig {
    AppConfig {
        store: StoreKind::Memory,
        database_url: None,
        jwt: JwtConfig {
            secret: "integration-secret".into(),
            issuer: "authgate-test".into(),
            audience: "authgate-test-users".into(),
            ttl_minutes: 60,
        },
        host: "127.0.0.1".into(),
        port: 0,
    }
}

pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUserStore>,
    pub keys: JwtKeys,
}

pub fn test_app() -> TestApp {
    let users = Arc::new(MemoryUserStore::new());
    TestApp {
        router: app_with_store(users.clone()),
        users,
        keys: JwtKeys::new(&test_config().jwt),
    }
}

pub fn app_with_store(users: Arc<dyn UserStore>) -> Router {
    build_app(AppState::from_parts(users, Arc::new(test_config())))
}

/// Misses on the first email lookup, as if another request inserted the row
/// between this request's lookup and its insert. Everything else goes to the
/// wrapped store, so the insert then fails with `EmailTaken`.
pub struct LateSignupStore {
    pub inner: Arc<MemoryUserStore>,
    missed: AtomicBool,
}

impl LateSignupStore {
    pub fn new(inner: Arc<MemoryUserStore>) -> Self {
        Self {
            inner,
            missed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl UserStore for LateSignupStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        if !self.missed.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_by_email(email).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        self.inner.create(new_user).await
    }
}
