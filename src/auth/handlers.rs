use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthRequest, AuthResponse, PublicUser},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::{NewUser, StoreError, User},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth", post(authenticate))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Logs in an existing user or signs up a new one.
///
/// 200 when the email was known and the password matched, 201 when a new
/// user row was created.
#[instrument(skip_all)]
pub async fn authenticate(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(mut payload) = payload.map_err(|e| {
        warn!(error = %e, "unreadable auth body");
        ApiError::Internal(e.into())
    })?;
    payload.email = payload.email.trim().to_lowercase();

    let (status, user) = match state.users.find_by_email(&payload.email).await? {
        Some(user) => {
            check_password(&payload.password, &user)?;
            info!(user_id = %user.id, "user logged in");
            (StatusCode::OK, user)
        }
        None => {
            let password_hash = hash_password(&payload.password)?;
            let new_user = NewUser {
                name: payload.name,
                email: payload.email.clone(),
                password_hash,
            };
            match state.users.create(new_user).await {
                Ok(user) => {
                    info!(user_id = %user.id, "user signed up");
                    (StatusCode::CREATED, user)
                }
                Err(StoreError::EmailTaken) => {
                    // A concurrent request created this email first; treat as a login.
                    warn!("signup raced with another request");
                    let user = state
                        .users
                        .find_by_email(&payload.email)
                        .await?
                        .ok_or_else(|| anyhow::anyhow!("user missing after unique violation"))?;
                    check_password(&payload.password, &user)?;
                    (StatusCode::OK, user)
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    let token = JwtKeys::from_ref(&state).sign(&user)?;
    Ok((
        status,
        Json(AuthResponse {
            user: PublicUser::from(&user),
            token,
        }),
    ))
}

fn check_password(plain: &str, user: &User) -> Result<(), ApiError> {
    if verify_password(plain, &user.password_hash)? {
        Ok(())
    } else {
        warn!(user_id = %user.id, "login invalid password");
        Err(ApiError::IncorrectPassword)
    }
}

#[instrument(skip_all)]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .users
        .find_by_id(claims.id)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %claims.id, "token for unknown user");
            ApiError::Unauthorized("User not found")
        })?;
    Ok(Json(PublicUser::from(&user)))
}
