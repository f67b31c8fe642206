use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use classgate_application::ClassificationTreeRepository;
use classgate_core::{AppError, AppResult};
use classgate_domain::{ClassificationCode, ClassificationNode};

use super::CachedClassificationTreeRepository;
use crate::InMemoryClassificationTreeRepository;

struct CountingRepository {
    inner: InMemoryClassificationTreeRepository,
    loads: AtomicUsize,
}

impl CountingRepository {
    fn with_nodes(nodes: Vec<ClassificationNode>) -> Self {
        Self {
            inner: InMemoryClassificationTreeRepository::with_nodes(nodes),
            loads: AtomicUsize::new(0),
        }
    }

    fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassificationTreeRepository for CountingRepository {
    async fn find_node(&self, code: &ClassificationCode) -> AppResult<Option<ClassificationNode>> {
        self.inner.find_node(code).await
    }

    async fn find_parent(
        &self,
        code: &ClassificationCode,
    ) -> AppResult<Option<ClassificationCode>> {
        self.inner.find_parent(code).await
    }

    async fn list_children(
        &self,
        code: &ClassificationCode,
    ) -> AppResult<Vec<ClassificationNode>> {
        self.inner.list_children(code).await
    }

    async fn list_roots(&self) -> AppResult<Vec<ClassificationNode>> {
        self.inner.list_roots().await
    }

    async fn list_nodes(&self) -> AppResult<Vec<ClassificationNode>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.list_nodes().await
    }

    async fn save_nodes(&self, nodes: Vec<ClassificationNode>) -> AppResult<usize> {
        self.inner.save_nodes(nodes).await
    }
}

fn node(code: &str, parent: Option<&str>) -> ClassificationNode {
    match ClassificationNode::new(code, parent.map(str::to_owned), &code[..1], None) {
        Ok(node) => node,
        Err(error) => panic!("invalid test node: {error}"),
    }
}

fn code(value: &str) -> ClassificationCode {
    match ClassificationCode::new(value) {
        Ok(code) => code,
        Err(error) => panic!("invalid test code: {error}"),
    }
}

fn sample() -> Vec<ClassificationNode> {
    vec![
        node("H", None),
        node("H01M", Some("H")),
        node("H01M4", Some("H01M")),
        node("H01M10", Some("H01M")),
        node("G", None),
    ]
}

#[tokio::test]
async fn reads_are_served_from_one_snapshot() {
    let inner = Arc::new(CountingRepository::with_nodes(sample()));
    let cache = CachedClassificationTreeRepository::new(inner.clone(), Duration::from_secs(60));

    let children = cache.list_children(&code("H01M")).await;
    assert!(children.is_ok_and(|children| {
        children
            .iter()
            .map(|node| node.code().as_str())
            .collect::<Vec<_>>()
            == vec!["H01M10", "H01M4"]
    }));
    assert!(
        cache
            .find_parent(&code("H01M4"))
            .await
            .is_ok_and(|parent| parent == Some(code("H01M")))
    );
    assert!(
        cache
            .list_roots()
            .await
            .is_ok_and(|roots| roots.len() == 2)
    );

    assert_eq!(inner.loads(), 1);
}

#[tokio::test]
async fn ancestor_chain_comes_from_the_snapshot() {
    let inner = Arc::new(CountingRepository::with_nodes(sample()));
    let cache = CachedClassificationTreeRepository::new(inner.clone(), Duration::from_secs(60));

    assert!(
        cache
            .ancestor_codes(&code("H01M10"))
            .await
            .is_ok_and(|chain| chain == vec![code("H01M"), code("H01"), code("H")])
    );
    assert!(
        cache
            .ancestor_codes(&code("G"))
            .await
            .is_ok_and(|chain| chain.is_empty())
    );
    assert_eq!(inner.loads(), 1);
}

#[tokio::test]
async fn uncached_ancestor_chain_walks_parents() {
    let inner = Arc::new(CountingRepository::with_nodes(sample()));
    let cache = CachedClassificationTreeRepository::new(inner.clone(), Duration::ZERO);

    assert!(
        cache
            .ancestor_codes(&code("H01M4"))
            .await
            .is_ok_and(|chain| chain == vec![code("H01M"), code("H01"), code("H")])
    );
    assert_eq!(inner.loads(), 0);
}

#[tokio::test]
async fn writes_invalidate_the_snapshot() {
    let inner = Arc::new(CountingRepository::with_nodes(sample()));
    let cache = CachedClassificationTreeRepository::new(inner.clone(), Duration::from_secs(60));

    assert!(
        cache
            .find_node(&code("H01M9"))
            .await
            .is_ok_and(|node| node.is_none())
    );
    assert!(cache.save_nodes(vec![node("H01M9", Some("H01M"))]).await.is_ok());
    assert!(
        cache
            .find_node(&code("H01M9"))
            .await
            .is_ok_and(|node| node.is_some())
    );

    assert_eq!(inner.loads(), 2);
}

#[tokio::test]
async fn expired_snapshot_is_reloaded() {
    let inner = Arc::new(CountingRepository::with_nodes(sample()));
    let cache = CachedClassificationTreeRepository::new(inner.clone(), Duration::from_millis(10));

    assert!(cache.list_nodes().await.is_ok());
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(cache.list_nodes().await.is_ok());

    assert_eq!(inner.loads(), 2);
}

#[tokio::test]
async fn zero_ttl_reads_through() {
    let inner = Arc::new(CountingRepository::with_nodes(sample()));
    let cache = CachedClassificationTreeRepository::new(inner.clone(), Duration::ZERO);

    assert!(cache.find_node(&code("G")).await.is_ok_and(|node| node.is_some()));
    assert!(cache.list_children(&code("H")).await.is_ok());
    assert_eq!(inner.loads(), 0);
}

#[tokio::test]
async fn cyclic_store_is_reported_as_malformed() {
    let inner = Arc::new(CountingRepository::with_nodes(vec![
        node("X", Some("Y")),
        node("Y", Some("X")),
    ]));
    let cache = CachedClassificationTreeRepository::new(inner, Duration::from_secs(60));

    assert!(matches!(
        cache.list_children(&code("X")).await,
        Err(AppError::MalformedTree(_))
    ));
}
