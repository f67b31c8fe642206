use async_trait::async_trait;

use std::collections::HashSet;

use classgate_core::{AppError, AppResult};
use classgate_domain::{
    ClassificationCode, ClassificationNode, GrantId, PermissionGrant, ValidityWindow,
};

/// Repository port for permission grants.
#[async_trait]
pub trait PermissionGrantRepository: Send + Sync {
    /// Lists every grant recorded for a subject, active or not.
    async fn list_grants_for_subject(&self, subject: &str) -> AppResult<Vec<PermissionGrant>>;

    /// Lists grants issued directly on a code.
    async fn list_grants_for_code(
        &self,
        code: &ClassificationCode,
        active_only: bool,
    ) -> AppResult<Vec<PermissionGrant>>;

    /// Finds one grant by identifier.
    async fn find_grant(&self, grant_id: GrantId) -> AppResult<Option<PermissionGrant>>;

    /// Finds the active grant for a subject and code, if any.
    async fn find_active_grant(
        &self,
        subject: &str,
        code: &ClassificationCode,
    ) -> AppResult<Option<PermissionGrant>>;

    /// Persists a new grant.
    async fn create_grant(&self, grant: PermissionGrant) -> AppResult<PermissionGrant>;

    /// Marks an active grant inactive.
    async fn deactivate_grant(&self, grant_id: GrantId, deactivated_by: &str) -> AppResult<()>;

    /// Replaces the validity window of an active grant.
    async fn update_validity_window(
        &self,
        grant_id: GrantId,
        validity: ValidityWindow,
    ) -> AppResult<PermissionGrant>;
}

/// Repository port for the classification tree.
#[async_trait]
pub trait ClassificationTreeRepository: Send + Sync {
    /// Finds a node by code.
    async fn find_node(&self, code: &ClassificationCode) -> AppResult<Option<ClassificationNode>>;

    /// Returns the parent code, or `None` for top-level and unknown codes.
    async fn find_parent(
        &self,
        code: &ClassificationCode,
    ) -> AppResult<Option<ClassificationCode>>;

    /// Returns the ancestor chain of a code, nearest parent first.
    ///
    /// The default walks `find_parent` and reports a parent cycle as a
    /// malformed tree.
    async fn ancestor_codes(&self, code: &ClassificationCode) -> AppResult<Vec<ClassificationCode>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([code.clone()]);
        let mut current = self.find_parent(code).await?;

        while let Some(parent) = current {
            if !seen.insert(parent.clone()) {
                return Err(AppError::MalformedTree(format!(
                    "parent cycle detected above '{code}' at '{parent}'"
                )));
            }
            current = self.find_parent(&parent).await?;
            chain.push(parent);
        }

        Ok(chain)
    }

    /// Lists direct children of a code ordered by code.
    async fn list_children(
        &self,
        code: &ClassificationCode,
    ) -> AppResult<Vec<ClassificationNode>>;

    /// Lists top-level nodes ordered by code.
    async fn list_roots(&self) -> AppResult<Vec<ClassificationNode>>;

    /// Lists every node.
    async fn list_nodes(&self) -> AppResult<Vec<ClassificationNode>>;

    /// Inserts or replaces nodes and returns the number written.
    async fn save_nodes(&self, nodes: Vec<ClassificationNode>) -> AppResult<usize>;
}
