use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use classgate_application::PermissionGrantRepository;
use classgate_core::{AppError, AppResult};
use classgate_domain::{AccessRole, ClassificationCode, GrantId, PermissionGrant, ValidityWindow};

use crate::postgres_error::{is_unique_violation, store_error};

mod lifecycle;


const GRANT_COLUMNS: &str = r#"
    id AS grant_id,
    subject,
    code,
    role,
    include_children,
    valid_from,
    valid_until,
    is_active,
    granted_by
"#;

/// PostgreSQL-backed repository for classification permission grants.
#[derive(Clone)]
pub struct PostgresPermissionGrantRepository {
    pool: PgPool,
}

impl PostgresPermissionGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    grant_id: uuid::Uuid,
    subject: String,
    code: String,
    role: String,
    include_children: bool,
    valid_from: DateTime<Utc>,
    valid_until: Option<DateTime<Utc>>,
    is_active: bool,
    granted_by: Option<String>,
}

impl GrantRow {
    fn into_grant(self) -> AppResult<PermissionGrant> {
        let decode = |detail: String| {
            AppError::Internal(format!(
                "failed to decode grant '{}': {detail}",
                self.grant_id
            ))
        };

        let code = ClassificationCode::new(self.code.as_str())
            .map_err(|error| decode(error.to_string()))?;
        let role =
            AccessRole::from_str(self.role.as_str()).map_err(|error| decode(error.to_string()))?;
        let validity = ValidityWindow::new(self.valid_from, self.valid_until)
            .map_err(|error| decode(error.to_string()))?;

        Ok(PermissionGrant::new(
            GrantId::from_uuid(self.grant_id),
            self.subject.as_str(),
            code,
            role,
            self.include_children,
            validity,
        )
        .map_err(|error| decode(error.to_string()))?
        .with_active(self.is_active)
        .with_granted_by(self.granted_by.clone()))
    }
}

fn decode_rows(rows: Vec<GrantRow>) -> AppResult<Vec<PermissionGrant>> {
    rows.into_iter().map(GrantRow::into_grant).collect()
}

#[async_trait]
impl PermissionGrantRepository for PostgresPermissionGrantRepository {
    async fn list_grants_for_subject(&self, subject: &str) -> AppResult<Vec<PermissionGrant>> {
        let rows = sqlx::query_as::<_, GrantRow>(&format!(
            r#"
            SELECT {GRANT_COLUMNS}
            FROM classification_permission_grants
            WHERE subject = $1
            ORDER BY created_at, id
            "#
        ))
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error(&format!("list grants for subject '{subject}'"), error))?;

        decode_rows(rows)
    }

    async fn list_grants_for_code(
        &self,
        code: &ClassificationCode,
        active_only: bool,
    ) -> AppResult<Vec<PermissionGrant>> {
        let rows = sqlx::query_as::<_, GrantRow>(&format!(
            r#"
            SELECT {GRANT_COLUMNS}
            FROM classification_permission_grants
            WHERE code = $1
              AND (is_active OR NOT $2)
            ORDER BY created_at, id
            "#
        ))
        .bind(code.as_str())
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error(&format!("list grants for code '{code}'"), error))?;

        decode_rows(rows)
    }

    async fn find_grant(&self, grant_id: GrantId) -> AppResult<Option<PermissionGrant>> {
        let row = sqlx::query_as::<_, GrantRow>(&format!(
            r#"
            SELECT {GRANT_COLUMNS}
            FROM classification_permission_grants
            WHERE id = $1
            "#
        ))
        .bind(grant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error(&format!("find grant '{grant_id}'"), error))?;

        row.map(GrantRow::into_grant).transpose()
    }

    async fn find_active_grant(
        &self,
        subject: &str,
        code: &ClassificationCode,
    ) -> AppResult<Option<PermissionGrant>> {
        let row = sqlx::query_as::<_, GrantRow>(&format!(
            r#"
            SELECT {GRANT_COLUMNS}
            FROM classification_permission_grants
            WHERE subject = $1
              AND code = $2
              AND is_active
            "#
        ))
        .bind(subject)
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                &format!("find active grant of '{subject}' on '{code}'"),
                error,
            )
        })?;

        row.map(GrantRow::into_grant).transpose()
    }

    async fn create_grant(&self, grant: PermissionGrant) -> AppResult<PermissionGrant> {
        self.create_grant_impl(grant).await
    }

    async fn deactivate_grant(&self, grant_id: GrantId, deactivated_by: &str) -> AppResult<()> {
        self.deactivate_grant_impl(grant_id, deactivated_by).await
    }

    async fn update_validity_window(
        &self,
        grant_id: GrantId,
        validity: ValidityWindow,
    ) -> AppResult<PermissionGrant> {
        self.update_validity_window_impl(grant_id, validity).await
    }
}
