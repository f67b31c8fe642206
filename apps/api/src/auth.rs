use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use classgate_core::{AppError, UserIdentity};
use subtle::ConstantTimeEq;
use tower_sessions::Session;

use crate::dto::{BootstrapSessionRequest, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

#[cfg(test)]
mod tests;

pub const SESSION_USER_KEY: &str = "user_identity";

/// Issues a session for an identity vouched for by the gateway token.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapSessionRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let Some(expected_token) = state.bootstrap_token.as_deref() else {
        return Err(AppError::Unauthorized("session bootstrap is disabled".to_owned()).into());
    };
    if !token_matches(&payload.token, expected_token) {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let subject = payload.subject.trim().to_owned();
    if subject.is_empty() {
        return Err(AppError::Validation("subject must not be empty".to_owned()).into());
    }

    let display_name = payload
        .display_name
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| subject.clone());
    let identity = UserIdentity::new(
        subject,
        display_name,
        payload.email,
        payload.is_administrator,
    );

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    tracing::info!(
        subject = identity.subject(),
        is_administrator = identity.is_administrator(),
        "session issued"
    );

    Ok(Json(UserIdentityResponse::from(identity)))
}

pub async fn me_handler(session: Session) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = session_identity(&session)
        .await?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    Ok(Json(UserIdentityResponse::from(identity)))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    let subject = session_identity(&session)
        .await?
        .map(|identity| identity.subject().to_owned());

    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    if let Some(subject) = subject {
        tracing::info!(subject = %subject, "session ended");
    }

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn session_identity(session: &Session) -> Result<Option<UserIdentity>, AppError> {
    session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))
}

fn token_matches(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}
