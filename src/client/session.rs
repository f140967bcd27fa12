use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use super::token_store::TokenStore;

/// Identity claims read from a stored token. Display only; never trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct UnverifiedClaims {
    id: Uuid,
    name: String,
    email: String,
    // NumericDate allows fractional seconds.
    exp: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Active(SessionUser),
    /// No usable token; the caller should send the user to login.
    LoggedOut,
}

/// Decodes the payload of `token` without checking its signature. Returns the
/// user claims and `exp` in (possibly fractional) Unix seconds.
pub fn decode_unverified(token: &str) -> anyhow::Result<(SessionUser, f64)> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let claims = decode::<UnverifiedClaims>(token, &DecodingKey::from_secret(&[]), &validation)?.claims;
    let user = SessionUser {
        id: claims.id,
        name: claims.name,
        email: claims.email,
    };
    Ok((user, claims.exp))
}

/// Decides from the stored token whether a session is usable at `now`.
/// Expired or malformed tokens are removed from the store.
pub fn bootstrap(store: &dyn TokenStore, now: OffsetDateTime) -> Session {
    let token = match store.get() {
        Ok(Some(token)) => token,
        Ok(None) => return Session::LoggedOut,
        Err(e) => {
            warn!(error = %e, "could not read stored token");
            clear(store);
            return Session::LoggedOut;
        }
    };

    let now_secs = now.unix_timestamp_nanos() as f64 / 1e9;
    match decode_unverified(&token) {
        Ok((user, exp)) if exp >= now_secs => {
            debug!(user_id = %user.id, "session restored");
            Session::Active(user)
        }
        Ok((user, _)) => {
            debug!(user_id = %user.id, "stored token expired");
            clear(store);
            Session::LoggedOut
        }
        Err(e) => {
            warn!(error = %e, "stored token is malformed");
            clear(store);
            Session::LoggedOut
        }
    }
}

pub fn logout(store: &dyn TokenStore) -> anyhow::Result<()> {
    store.remove()
}

fn clear(store: &dyn TokenStore) {
    if let Err(e) = store.remove() {
        warn!(error = %e, "could not clear stored token");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{jwt::JwtKeys, repo_types::User};
    use crate::client::token_store::MemoryTokenStore;
    use crate::config::JwtConfig;
    use time::Duration;

    fn keys() -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: "session-test".into(),
            issuer: "authgate".into(),
            audience: "authgate-users".into(),
            ttl_minutes: 60,
        })
    }

    fn user() -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$fake".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn live_token_yields_active_session() {
        let user = user();
        let token = keys().sign(&user).unwrap();
        let store = MemoryTokenStore::with_token(token);

        let session = bootstrap(&store, OffsetDateTime::now_utc());
        assert_eq!(
            session,
            Session::Active(SessionUser {
                id: user.id,
                name: "Ada".into(),
                email: "ada@example.com".into(),
            })
        );
        assert!(store.get().unwrap().is_some());
    }

    #[test]
    fn expired_token_is_cleared() {
        let issued = OffsetDateTime::now_utc() - Duration::hours(2);
        let token = keys().sign_at(&user(), issued).unwrap();
        let store = MemoryTokenStore::with_token(token);

        assert_eq!(bootstrap(&store, OffsetDateTime::now_utc()), Session::LoggedOut);
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn expiry_is_judged_against_the_given_clock() {
        let token = keys().sign(&user()).unwrap();
        let store = MemoryTokenStore::with_token(token);
        let later = OffsetDateTime::now_utc() + Duration::hours(3);

        assert_eq!(bootstrap(&store, later), Session::LoggedOut);
    }

    #[test]
    fn malformed_token_is_cleared_without_panicking() {
        for garbage in ["", "not-a-jwt", "a.b.c", "eyJhbGciOiJIUzI1NiJ9.e30.sig"] {
            let store = MemoryTokenStore::with_token(garbage);
            assert_eq!(bootstrap(&store, OffsetDateTime::now_utc()), Session::LoggedOut);
            assert_eq!(store.get().unwrap(), None, "{garbage:?} should be cleared");
        }
    }

    #[test]
    fn missing_token_is_logged_out() {
        let store = MemoryTokenStore::new();
        assert_eq!(bootstrap(&store, OffsetDateTime::now_utc()), Session::LoggedOut);
    }

    #[test]
    fn decode_ignores_signature() {
        let foreign = JwtKeys::new(&JwtConfig {
            secret: "someone-else".into(),
            issuer: "elsewhere".into(),
            audience: "others".into(),
            ttl_minutes: 5,
        });
        let user = user();
        let (decoded, _) = decode_unverified(&foreign.sign(&user).unwrap()).unwrap();
        assert_eq!(decoded.id, user.id);
    }

    #[test]
    fn fractional_expiry_is_compared_to_the_sub_second_clock() {
        use jsonwebtoken::{encode, EncodingKey, Header};
        use time::macros::datetime;

        let issued = datetime!(2024-03-01 12:00:00 UTC);
        let claims = serde_json::json!({
            "id": Uuid::new_v4(),
            "name": "Ada",
            "email": "ada@example.com",
            "iat": issued.unix_timestamp(),
            "exp": issued.unix_timestamp() as f64 + 0.5,
        });
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"any")).unwrap();

        let (_, exp) = decode_unverified(&token).unwrap();
        assert_eq!(exp, issued.unix_timestamp() as f64 + 0.5);

        let store = MemoryTokenStore::with_token(token.clone());
        assert!(matches!(bootstrap(&store, issued), Session::Active(_)));
        assert!(matches!(
            bootstrap(&store, issued + Duration::milliseconds(250)),
            Session::Active(_)
        ));

        assert_eq!(bootstrap(&store, issued + Duration::milliseconds(750)), Session::LoggedOut);
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn logout_clears_token() {
        let store = MemoryTokenStore::with_token("tok");
        logout(&store).unwrap();
        assert_eq!(store.get().unwrap(), None);
    }
}
