use std::collections::BTreeMap;

use async_trait::async_trait;
use classgate_application::ClassificationTreeRepository;
use classgate_core::AppResult;
use classgate_domain::{ClassificationCode, ClassificationNode};
use tokio::sync::RwLock;

/// In-memory classification tree repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryClassificationTreeRepository {
    nodes: RwLock<BTreeMap<ClassificationCode, ClassificationNode>>,
}

impl InMemoryClassificationTreeRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository seeded with `nodes`.
    #[must_use]
    pub fn with_nodes(nodes: impl IntoIterator<Item = ClassificationNode>) -> Self {
        Self {
            nodes: RwLock::new(
                nodes
                    .into_iter()
                    .map(|node| (node.code().clone(), node))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl ClassificationTreeRepository for InMemoryClassificationTreeRepository {
    async fn find_node(&self, code: &ClassificationCode) -> AppResult<Option<ClassificationNode>> {
        Ok(self.nodes.read().await.get(code).cloned())
    }

    async fn find_parent(
        &self,
        code: &ClassificationCode,
    ) -> AppResult<Option<ClassificationCode>> {
        Ok(self
            .nodes
            .read()
            .await
            .get(code)
            .and_then(|node| node.parent_code().cloned()))
    }

    async fn list_children(
        &self,
        code: &ClassificationCode,
    ) -> AppResult<Vec<ClassificationNode>> {
        Ok(self
            .nodes
            .read()
            .await
            .values()
            .filter(|node| node.parent_code() == Some(code))
            .cloned()
            .collect())
    }

    async fn list_roots(&self) -> AppResult<Vec<ClassificationNode>> {
        Ok(self
            .nodes
            .read()
            .await
            .values()
            .filter(|node| node.is_root())
            .cloned()
            .collect())
    }

    async fn list_nodes(&self) -> AppResult<Vec<ClassificationNode>> {
        Ok(self.nodes.read().await.values().cloned().collect())
    }

    async fn save_nodes(&self, nodes: Vec<ClassificationNode>) -> AppResult<usize> {
        let written = nodes.len();
        let mut stored = self.nodes.write().await;
        for node in nodes {
            stored.insert(node.code().clone(), node);
        }

        Ok(written)
    }
}
