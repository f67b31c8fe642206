use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use chrono::Utc;
use classgate_core::UserIdentity;
use classgate_domain::ClassificationCode;
use serde::Deserialize;

use crate::dto::{
    CatalogEntryResponse, ClassificationNodeResponse, DescendantCodesResponse,
    ImportClassificationTreeRequest, ImportClassificationTreeResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

use super::role_or_viewer;

#[derive(Debug, Deserialize)]
pub struct NodeListQuery {
    pub parent: Option<String>,
    pub min_role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DescendantsQuery {
    pub include_self: Option<bool>,
}

pub async fn list_nodes_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<NodeListQuery>,
) -> ApiResult<Json<Vec<CatalogEntryResponse>>> {
    let parent = query
        .parent
        .filter(|value| !value.trim().is_empty())
        .map(ClassificationCode::new)
        .transpose()?;
    let min_role = role_or_viewer(query.min_role.as_deref())?;

    let entries = state
        .catalog_service
        .accessible_children(&user, parent.as_ref(), min_role, Utc::now())
        .await?
        .into_iter()
        .map(CatalogEntryResponse::from)
        .collect();

    Ok(Json(entries))
}

pub async fn get_node_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<ClassificationNodeResponse>> {
    let node = state.catalog_service.find_node(&code).await?;
    Ok(Json(ClassificationNodeResponse::from(node)))
}

pub async fn descendant_codes_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<DescendantsQuery>,
) -> ApiResult<Json<DescendantCodesResponse>> {
    let code = ClassificationCode::new(code)?;
    let include_self = query.include_self.unwrap_or(false);

    let codes = state
        .access_resolver
        .descendant_codes(&code, include_self)
        .await?
        .into_iter()
        .map(String::from)
        .collect();

    Ok(Json(DescendantCodesResponse {
        code: code.as_str().to_owned(),
        include_self,
        codes,
    }))
}

pub async fn import_tree_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<ImportClassificationTreeRequest>,
) -> ApiResult<Json<ImportClassificationTreeResponse>> {
    let nodes = payload.into_nodes()?;
    let written = state.catalog_service.import_tree(&user, nodes).await?;

    Ok(Json(ImportClassificationTreeResponse { written }))
}
