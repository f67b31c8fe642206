use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use classgate_application::ClassificationTreeRepository;
use classgate_core::{AppError, AppResult};
use classgate_domain::{ClassificationCode, ClassificationNode};

use crate::postgres_error::store_error;


const UPSERT_CHUNK_SIZE: usize = 1_000;

/// PostgreSQL-backed repository for the classification tree.
#[derive(Clone)]
pub struct PostgresClassificationTreeRepository {
    pool: PgPool,
}

impl PostgresClassificationTreeRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct NodeRow {
    code: String,
    parent_code: Option<String>,
    section: String,
    title: Option<String>,
}

impl NodeRow {
    fn into_node(self) -> AppResult<ClassificationNode> {
        let code = self.code.clone();
        ClassificationNode::new(self.code, self.parent_code, self.section, self.title).map_err(
            |error| {
                AppError::Internal(format!(
                    "failed to decode classification node '{code}': {error}"
                ))
            },
        )
    }
}

fn decode_rows(rows: Vec<NodeRow>) -> AppResult<Vec<ClassificationNode>> {
    rows.into_iter().map(NodeRow::into_node).collect()
}

#[async_trait]
impl ClassificationTreeRepository for PostgresClassificationTreeRepository {
    async fn find_node(&self, code: &ClassificationCode) -> AppResult<Option<ClassificationNode>> {
        let row = sqlx::query_as::<_, NodeRow>(
            r#"
            SELECT code, parent_code, section, title
            FROM classification_nodes
            WHERE code = $1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error(&format!("find classification node '{code}'"), error))?;

        row.map(NodeRow::into_node).transpose()
    }

    async fn find_parent(
        &self,
        code: &ClassificationCode,
    ) -> AppResult<Option<ClassificationCode>> {
        let parent = sqlx::query_scalar::<_, Option<String>>(
            r#"
            SELECT parent_code
            FROM classification_nodes
            WHERE code = $1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error(&format!("find parent of '{code}'"), error))?
        .flatten();

        parent
            .map(|value| {
                ClassificationCode::new(value).map_err(|error| {
                    AppError::Internal(format!("failed to decode parent of '{code}': {error}"))
                })
            })
            .transpose()
    }

    async fn list_children(
        &self,
        code: &ClassificationCode,
    ) -> AppResult<Vec<ClassificationNode>> {
        let rows = sqlx::query_as::<_, NodeRow>(
            r#"
            SELECT code, parent_code, section, title
            FROM classification_nodes
            WHERE parent_code = $1
            ORDER BY code
            "#,
        )
        .bind(code.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error(&format!("list children of '{code}'"), error))?;

        decode_rows(rows)
    }

    async fn list_roots(&self) -> AppResult<Vec<ClassificationNode>> {
        let rows = sqlx::query_as::<_, NodeRow>(
            r#"
            SELECT code, parent_code, section, title
            FROM classification_nodes
            WHERE parent_code IS NULL
            ORDER BY code
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("list classification roots", error))?;

        decode_rows(rows)
    }

    async fn list_nodes(&self) -> AppResult<Vec<ClassificationNode>> {
        let rows = sqlx::query_as::<_, NodeRow>(
            r#"
            SELECT code, parent_code, section, title
            FROM classification_nodes
            ORDER BY code
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("list classification nodes", error))?;

        decode_rows(rows)
    }

    async fn save_nodes(&self, nodes: Vec<ClassificationNode>) -> AppResult<usize> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| store_error("begin classification import", error))?;

        let mut written = 0;
        for chunk in nodes.chunks(UPSERT_CHUNK_SIZE) {
            let codes: Vec<&str> = chunk.iter().map(|node| node.code().as_str()).collect();
            let parents: Vec<Option<&str>> = chunk
                .iter()
                .map(|node| node.parent_code().map(ClassificationCode::as_str))
                .collect();
            let sections: Vec<&str> = chunk.iter().map(|node| node.section().as_str()).collect();
            let titles: Vec<Option<&str>> = chunk.iter().map(ClassificationNode::title).collect();

            // Parent references are checked at commit, so chunk order is free.
            let result = sqlx::query(
                r#"
                INSERT INTO classification_nodes (code, parent_code, section, title)
                SELECT * FROM UNNEST($1::TEXT[], $2::TEXT[], $3::TEXT[], $4::TEXT[])
                ON CONFLICT (code) DO UPDATE
                SET parent_code = EXCLUDED.parent_code,
                    section = EXCLUDED.section,
                    title = EXCLUDED.title,
                    updated_at = now()
                "#,
            )
            .bind(codes)
            .bind(parents)
            .bind(sections)
            .bind(titles)
            .execute(&mut *transaction)
            .await
            .map_err(|error| store_error("upsert classification nodes", error))?;

            written += usize::try_from(result.rows_affected()).unwrap_or(chunk.len());
        }

        transaction
            .commit()
            .await
            .map_err(|error| store_error("commit classification import", error))?;

        tracing::info!(written, "classification nodes upserted");
        Ok(written)
    }
}
