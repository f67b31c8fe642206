use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use classgate_application::{CreateGrantInput, UpdateValidityInput};
use classgate_core::UserIdentity;
use classgate_domain::{AccessRole, GrantId};
use serde::Deserialize;

use crate::dto::{CreateGrantRequest, GrantResponse, UpdateGrantValidityRequest};
use crate::error::ApiResult;
use crate::state::AppState;

use super::parse_instant;

#[derive(Debug, Deserialize)]
pub struct GrantListQuery {
    pub subject: Option<String>,
    pub code: Option<String>,
    pub active_only: Option<bool>,
}

pub async fn list_grants_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<GrantListQuery>,
) -> ApiResult<Json<Vec<GrantResponse>>> {
    let grants = match query.code.filter(|code| !code.trim().is_empty()) {
        Some(code) => {
            state
                .grant_admin_service
                .list_grants_for_code(
                    &user,
                    &code,
                    query.active_only.unwrap_or(true),
                    Utc::now(),
                )
                .await?
        }
        None => {
            let subject = query
                .subject
                .filter(|subject| !subject.trim().is_empty())
                .unwrap_or_else(|| user.subject().to_owned());
            state
                .grant_admin_service
                .list_grants_for_subject(&user, &subject)
                .await?
                .into_iter()
                .filter(|grant| !query.active_only.unwrap_or(false) || grant.is_active())
                .collect()
        }
    };

    Ok(Json(grants.into_iter().map(GrantResponse::from).collect()))
}

pub async fn create_grant_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateGrantRequest>,
) -> ApiResult<(StatusCode, Json<GrantResponse>)> {
    let input = CreateGrantInput {
        subject: payload.subject,
        code: payload.code,
        role: AccessRole::from_transport(&payload.role)?,
        include_children: payload.include_children,
        valid_from: payload.valid_from.as_deref().map(parse_instant).transpose()?,
        valid_until: payload.valid_until.as_deref().map(parse_instant).transpose()?,
    };

    let grant = state
        .grant_admin_service
        .create_grant(&user, input, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(GrantResponse::from(grant))))
}

pub async fn deactivate_grant_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(grant_id): Path<String>,
) -> ApiResult<StatusCode> {
    let grant_id = GrantId::parse(&grant_id)?;
    state
        .grant_admin_service
        .deactivate_grant(&user, grant_id, Utc::now())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_grant_validity_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(grant_id): Path<String>,
    Json(payload): Json<UpdateGrantValidityRequest>,
) -> ApiResult<Json<GrantResponse>> {
    let grant_id = GrantId::parse(&grant_id)?;
    let input = UpdateValidityInput {
        valid_from: parse_instant(&payload.valid_from)?,
        valid_until: payload.valid_until.as_deref().map(parse_instant).transpose()?,
    };

    let grant = state
        .grant_admin_service
        .update_validity_window(&user, grant_id, input, Utc::now())
        .await?;

    Ok(Json(GrantResponse::from(grant)))
}
