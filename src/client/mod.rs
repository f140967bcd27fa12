//! Client side of the login flow: local form checks, the HTTP call, token
//! persistence, and the startup session check.

pub mod api;
pub mod form;
pub mod session;
pub mod token_store;

use tracing::info;

pub use api::{AuthClient, AuthOutcome, ClientError};
pub use form::{FormError, LoginForm};
pub use session::{bootstrap, logout, Session, SessionUser};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

/// Validates the form, calls the auth endpoint, and stores the returned token.
/// Nothing is sent when validation fails; nothing is stored when the call fails.
pub async fn submit_login(
    client: &AuthClient,
    store: &dyn TokenStore,
    form: &LoginForm,
) -> Result<AuthOutcome, ClientError> {
    form.validate()?;
    let outcome = client.authenticate(form).await?;
    store
        .set(&outcome.response().token)
        .map_err(ClientError::Storage)?;
    info!(
        user_id = %outcome.response().user.id,
        signup = outcome.is_signup(),
        "token stored"
    );
    Ok(outcome)
}
