use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use classgate_application::ClassificationTreeRepository;
use classgate_core::AppResult;
use classgate_domain::{ClassificationCode, ClassificationNode, ClassificationTreeIndex};
use tokio::sync::RwLock;

#[cfg(test)]
mod tests;

struct TreeSnapshot {
    index: Arc<ClassificationTreeIndex>,
    expires_at: Instant,
}

/// Read-through cache that serves tree lookups from a validated in-memory index.
///
/// The whole tree is loaded on first use and kept until the TTL elapses or a
/// write goes through this decorator. A zero TTL disables caching.
pub struct CachedClassificationTreeRepository {
    inner: Arc<dyn ClassificationTreeRepository>,
    ttl: Duration,
    snapshot: RwLock<Option<TreeSnapshot>>,
}

impl CachedClassificationTreeRepository {
    /// Wraps `inner` with a snapshot cache living for `ttl`.
    #[must_use]
    pub fn new(inner: Arc<dyn ClassificationTreeRepository>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            snapshot: RwLock::new(None),
        }
    }

    /// Drops the cached snapshot so the next read reloads the tree.
    pub async fn invalidate(&self) {
        self.snapshot.write().await.take();
    }

    async fn index(&self) -> AppResult<Arc<ClassificationTreeIndex>> {
        {
            let snapshot = self.snapshot.read().await;
            if let Some(snapshot) = snapshot.as_ref()
                && snapshot.expires_at > Instant::now()
            {
                return Ok(snapshot.index.clone());
            }
        }

        let mut snapshot = self.snapshot.write().await;
        if let Some(current) = snapshot.as_ref()
            && current.expires_at > Instant::now()
        {
            return Ok(current.index.clone());
        }

        let index = Arc::new(ClassificationTreeIndex::build(
            self.inner.list_nodes().await?,
        )?);
        let now = Instant::now();
        *snapshot = Some(TreeSnapshot {
            index: index.clone(),
            expires_at: now.checked_add(self.ttl).unwrap_or(now),
        });
        tracing::debug!(nodes = index.len(), "classification tree snapshot loaded");

        Ok(index)
    }

    fn caching(&self) -> bool {
        !self.ttl.is_zero()
    }
}

#[async_trait]
impl ClassificationTreeRepository for CachedClassificationTreeRepository {
    async fn find_node(&self, code: &ClassificationCode) -> AppResult<Option<ClassificationNode>> {
        if !self.caching() {
            return self.inner.find_node(code).await;
        }

        Ok(self.index().await?.node(code).cloned())
    }

    async fn find_parent(
        &self,
        code: &ClassificationCode,
    ) -> AppResult<Option<ClassificationCode>> {
        if !self.caching() {
            return self.inner.find_parent(code).await;
        }

        Ok(self.index().await?.parent_of(code).cloned())
    }

    async fn ancestor_codes(&self, code: &ClassificationCode) -> AppResult<Vec<ClassificationCode>> {
        if !self.caching() {
            return self.inner.ancestor_codes(code).await;
        }

        Ok(self
            .index()
            .await?
            .ancestors(code)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn list_children(
        &self,
        code: &ClassificationCode,
    ) -> AppResult<Vec<ClassificationNode>> {
        if !self.caching() {
            return self.inner.list_children(code).await;
        }

        let index = self.index().await?;
        Ok(index
            .children_of(code)
            .iter()
            .filter_map(|child| index.node(child).cloned())
            .collect())
    }

    async fn list_roots(&self) -> AppResult<Vec<ClassificationNode>> {
        if !self.caching() {
            return self.inner.list_roots().await;
        }

        let index = self.index().await?;
        Ok(index
            .roots()
            .iter()
            .filter_map(|root| index.node(root).cloned())
            .collect())
    }

    async fn list_nodes(&self) -> AppResult<Vec<ClassificationNode>> {
        if !self.caching() {
            return self.inner.list_nodes().await;
        }

        Ok(self.index().await?.nodes().cloned().collect())
    }

    async fn save_nodes(&self, nodes: Vec<ClassificationNode>) -> AppResult<usize> {
        let written = self.inner.save_nodes(nodes).await;
        self.invalidate().await;
        written
    }
}
