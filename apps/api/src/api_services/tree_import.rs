use std::path::Path;

use chrono::Utc;
use classgate_core::{AppError, UserIdentity};
use classgate_domain::ClassificationNode;
use serde::Deserialize;

use crate::dto::{ClassificationNodeInput, ImportClassificationTreeRequest};
use crate::state::AppState;

#[cfg(test)]
mod tests;

const IMPORT_SUBJECT: &str = "system:tree-import";

/// Accepted layouts of a tree file: a bare node array or `{ "nodes": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TreeDocument {
    Nodes(Vec<ClassificationNodeInput>),
    Wrapped(ImportClassificationTreeRequest),
}

/// Loads a JSON tree file and merges it into the stored tree.
pub async fn import_tree_file(state: &AppState, path: &Path) -> Result<usize, AppError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|error| {
        AppError::Validation(format!("failed to read '{}': {error}", path.display()))
    })?;
    let nodes = parse_tree_document(&raw)?;

    let importer = UserIdentity::new(IMPORT_SUBJECT, "Tree import", None, true);
    let started_at = Utc::now();
    let written = state.catalog_service.import_tree(&importer, nodes).await?;

    tracing::info!(
        path = %path.display(),
        written,
        elapsed_ms = (Utc::now() - started_at).num_milliseconds(),
        "classification tree imported"
    );

    Ok(written)
}

fn parse_tree_document(raw: &str) -> Result<Vec<ClassificationNode>, AppError> {
    let document: TreeDocument = serde_json::from_str(raw)
        .map_err(|error| AppError::Validation(format!("invalid tree file: {error}")))?;

    let request = match document {
        TreeDocument::Nodes(nodes) => ImportClassificationTreeRequest { nodes },
        TreeDocument::Wrapped(request) => request,
    };

    request.into_nodes()
}
