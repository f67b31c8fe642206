use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use classgate_core::{AppError, AppResult, UserIdentity};
use classgate_domain::{
    AccessRole, AuditAction, ClassificationCode, ClassificationNode, ClassificationTreeIndex,
};

use crate::{
    AuditEvent, AuditRepository, ClassificationAccessResolver, ClassificationTreeRepository,
};


/// A node as seen by one actor while browsing the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// The classification node.
    pub node: ClassificationNode,
    /// Whether the actor holds the requested role on the node itself.
    ///
    /// `false` means the node is shown only because an accessible code lies below it.
    pub accessible: bool,
}

/// Application service for browsing and seeding the classification tree.
#[derive(Clone)]
pub struct ClassificationCatalogService {
    resolver: ClassificationAccessResolver,
    tree_repository: Arc<dyn ClassificationTreeRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl ClassificationCatalogService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        resolver: ClassificationAccessResolver,
        tree_repository: Arc<dyn ClassificationTreeRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            resolver,
            tree_repository,
            audit_repository,
        }
    }

    /// Finds one node by its transport code.
    pub async fn find_node(&self, code: &str) -> AppResult<ClassificationNode> {
        let code = ClassificationCode::new(code)?;
        self.tree_repository
            .find_node(&code)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("classification code '{code}' does not exist"))
            })
    }

    /// Lists children of `parent`, or the roots, that lead the actor to accessible codes.
    pub async fn accessible_children(
        &self,
        actor: &UserIdentity,
        parent: Option<&ClassificationCode>,
        min_role: AccessRole,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<CatalogEntry>> {
        let children = match parent {
            Some(parent) => self.tree_repository.list_children(parent).await?,
            None => self.tree_repository.list_roots().await?,
        };

        if actor.is_administrator() {
            return Ok(children
                .into_iter()
                .map(|node| CatalogEntry {
                    node,
                    accessible: true,
                })
                .collect());
        }

        let allowed = self
            .resolver
            .allowed_codes(actor.subject(), min_role, now)
            .await?;
        let navigable = self.ancestor_closure(&allowed).await?;

        Ok(children
            .into_iter()
            .filter_map(|node| {
                if allowed.contains(node.code()) {
                    Some(CatalogEntry {
                        node,
                        accessible: true,
                    })
                } else if navigable.contains(node.code()) {
                    Some(CatalogEntry {
                        node,
                        accessible: false,
                    })
                } else {
                    None
                }
            })
            .collect())
    }

    /// Merges `nodes` into the stored tree and returns the number of nodes written.
    ///
    /// The merged tree must remain a forest: codes are unique within the
    /// import, every parent exists, and no parent chain loops.
    pub async fn import_tree(
        &self,
        actor: &UserIdentity,
        nodes: Vec<ClassificationNode>,
    ) -> AppResult<usize> {
        if !actor.is_administrator() {
            return Err(AppError::Forbidden(format!(
                "subject '{}' may not import the classification tree",
                actor.subject()
            )));
        }

        if nodes.is_empty() {
            return Err(AppError::Validation(
                "classification import contains no nodes".to_owned(),
            ));
        }

        let mut seen = HashSet::new();
        for node in &nodes {
            if !seen.insert(node.code().clone()) {
                return Err(AppError::Validation(format!(
                    "classification code '{}' appears more than once in the import",
                    node.code()
                )));
            }
        }

        let mut merged: HashMap<ClassificationCode, ClassificationNode> = self
            .tree_repository
            .list_nodes()
            .await?
            .into_iter()
            .map(|node| (node.code().clone(), node))
            .collect();
        for node in &nodes {
            merged.insert(node.code().clone(), node.clone());
        }
        let index =
            ClassificationTreeIndex::build(merged.into_values()).map_err(import_error)?;

        let written = self.tree_repository.save_nodes(nodes).await?;

        self.audit_repository
            .append_event(AuditEvent {
                subject: actor.subject().to_owned(),
                action: AuditAction::ClassificationTreeImported,
                resource_type: "classification_tree".to_owned(),
                resource_id: "classification_nodes".to_owned(),
                detail: Some(format!(
                    "imported {written} nodes, tree now holds {} nodes",
                    index.len()
                )),
            })
            .await?;

        Ok(written)
    }

    async fn ancestor_closure(
        &self,
        codes: &BTreeSet<ClassificationCode>,
    ) -> AppResult<HashSet<ClassificationCode>> {
        let mut ancestors = HashSet::new();

        for code in codes {
            let mut current = self.tree_repository.find_parent(code).await?;
            while let Some(parent) = current {
                if !ancestors.insert(parent.clone()) {
                    break;
                }
                current = self.tree_repository.find_parent(&parent).await?;
            }
        }

        Ok(ancestors)
    }
}

fn import_error(error: AppError) -> AppError {
    match error {
        AppError::MalformedTree(message) => AppError::Validation(format!(
            "import would break the classification tree: {message}"
        )),
        other => other,
    }
}
