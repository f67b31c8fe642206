use axum::Json;
use axum::extract::{Extension, Query, State};
use classgate_core::UserIdentity;
use classgate_domain::ClassificationCode;
use serde::Deserialize;

use crate::dto::{AccessCheckResponse, AllowedCodesResponse, EffectiveRoleResponse, timestamp};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{instant_or_now, role_or_viewer, target_subject};

#[derive(Debug, Deserialize)]
pub struct AccessCheckQuery {
    pub code: String,
    pub min_role: Option<String>,
    pub at: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AllowedCodesQuery {
    pub min_role: Option<String>,
    pub at: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EffectiveRoleQuery {
    pub code: String,
    pub at: Option<String>,
    pub subject: Option<String>,
}

pub async fn check_access_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<AccessCheckQuery>,
) -> ApiResult<Json<AccessCheckResponse>> {
    let subject = target_subject(&user, query.subject)?;
    let code = ClassificationCode::new(query.code)?;
    let min_role = role_or_viewer(query.min_role.as_deref())?;
    let at = instant_or_now(query.at.as_deref())?;

    let allowed = state
        .access_resolver
        .has_access(&subject, &code, min_role, at)
        .await?;

    Ok(Json(AccessCheckResponse {
        subject,
        code: code.as_str().to_owned(),
        min_role: min_role.as_str().to_owned(),
        at: timestamp(at),
        allowed,
    }))
}

pub async fn allowed_codes_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<AllowedCodesQuery>,
) -> ApiResult<Json<AllowedCodesResponse>> {
    let subject = target_subject(&user, query.subject)?;
    let min_role = role_or_viewer(query.min_role.as_deref())?;
    let at = instant_or_now(query.at.as_deref())?;

    let codes = state
        .access_resolver
        .allowed_codes(&subject, min_role, at)
        .await?
        .into_iter()
        .map(String::from)
        .collect();

    Ok(Json(AllowedCodesResponse {
        subject,
        min_role: min_role.as_str().to_owned(),
        at: timestamp(at),
        codes,
    }))
}

pub async fn effective_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<EffectiveRoleQuery>,
) -> ApiResult<Json<EffectiveRoleResponse>> {
    let subject = target_subject(&user, query.subject)?;
    let code = ClassificationCode::new(query.code)?;
    let at = instant_or_now(query.at.as_deref())?;

    let role = state
        .access_resolver
        .effective_role(&subject, &code, at)
        .await?;

    Ok(Json(EffectiveRoleResponse {
        subject,
        code: code.as_str().to_owned(),
        at: timestamp(at),
        role: role.map(|role| role.as_str().to_owned()),
    }))
}
