use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use classgate_application::SubmitPermissionRequestInput;
use classgate_core::UserIdentity;
use classgate_domain::{AccessRole, PermissionRequestId, PermissionRequestStatus};
use serde::Deserialize;

use crate::dto::{
    ApprovePermissionRequestResponse, DecidePermissionRequestRequest, GrantResponse,
    PermissionRequestResponse, SubmitPermissionRequestRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PermissionRequestListQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub async fn list_permission_requests_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<PermissionRequestListQuery>,
) -> ApiResult<Json<Vec<PermissionRequestResponse>>> {
    let status = query
        .status
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .map(str::parse::<PermissionRequestStatus>)
        .transpose()?;

    let requests = state
        .permission_request_service
        .list_requests(
            &user,
            status,
            query.limit.unwrap_or(50),
            query.offset.unwrap_or(0),
        )
        .await?
        .into_iter()
        .map(PermissionRequestResponse::from)
        .collect();

    Ok(Json(requests))
}

pub async fn submit_permission_request_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<SubmitPermissionRequestRequest>,
) -> ApiResult<(StatusCode, Json<PermissionRequestResponse>)> {
    let request = state
        .permission_request_service
        .submit_request(
            &user,
            SubmitPermissionRequestInput {
                code: payload.code,
                role: AccessRole::from_transport(&payload.role)?,
                include_children: payload.include_children,
                reason: payload.reason,
            },
            Utc::now(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PermissionRequestResponse::from(request)),
    ))
}

pub async fn approve_permission_request_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(request_id): Path<String>,
    payload: Option<Json<DecidePermissionRequestRequest>>,
) -> ApiResult<Json<ApprovePermissionRequestResponse>> {
    let request_id = PermissionRequestId::parse(&request_id)?;
    let payload = payload.map(|Json(body)| body).unwrap_or_default();

    let (request, grant) = state
        .permission_request_service
        .approve_request(&user, request_id, payload.note, Utc::now())
        .await?;

    Ok(Json(ApprovePermissionRequestResponse {
        request: PermissionRequestResponse::from(request),
        grant: GrantResponse::from(grant),
    }))
}

pub async fn reject_permission_request_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(request_id): Path<String>,
    payload: Option<Json<DecidePermissionRequestRequest>>,
) -> ApiResult<Json<PermissionRequestResponse>> {
    let request_id = PermissionRequestId::parse(&request_id)?;
    let payload = payload.map(|Json(body)| body).unwrap_or_default();

    let request = state
        .permission_request_service
        .reject_request(&user, request_id, payload.note, Utc::now())
        .await?;

    Ok(Json(PermissionRequestResponse::from(request)))
}
