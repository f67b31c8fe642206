use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use classgate_application::{PermissionRequestQuery, PermissionRequestRepository};
use classgate_core::{AppError, AppResult};
use classgate_domain::{
    AccessRole, ClassificationCode, PermissionRequest, PermissionRequestId,
    PermissionRequestStatus,
};

use crate::postgres_error::{is_unique_violation, store_error};

#[cfg(test)]
mod tests;

/// PostgreSQL-backed repository for access requests.
#[derive(Clone)]
pub struct PostgresPermissionRequestRepository {
    pool: PgPool,
}

impl PostgresPermissionRequestRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RequestRow {
    request_id: uuid::Uuid,
    subject: String,
    code: String,
    role: String,
    include_children: bool,
    reason: Option<String>,
    status: String,
    decided_by: Option<String>,
    decision_note: Option<String>,
    requested_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for PermissionRequest {
    type Error = AppError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let request_id = row.request_id;
        let decode = |error: AppError| {
            AppError::Internal(format!(
                "failed to decode permission request '{request_id}': {error}"
            ))
        };

        let code = ClassificationCode::new(row.code).map_err(decode)?;
        let role = AccessRole::from_str(row.role.as_str()).map_err(decode)?;
        let status = PermissionRequestStatus::from_str(row.status.as_str()).map_err(decode)?;

        Ok(PermissionRequest::new(
            PermissionRequestId::from_uuid(request_id),
            row.subject,
            code,
            role,
            row.include_children,
            row.reason,
            row.requested_at,
        )
        .map_err(decode)?
        .with_decision(status, row.decided_by, row.decision_note))
    }
}

#[async_trait]
impl PermissionRequestRepository for PostgresPermissionRequestRepository {
    async fn create_request(&self, request: PermissionRequest) -> AppResult<PermissionRequest> {
        sqlx::query(
            r#"
            INSERT INTO classification_permission_requests (
                id,
                subject,
                code,
                role,
                include_children,
                reason,
                status,
                requested_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(request.request_id().as_uuid())
        .bind(request.subject())
        .bind(request.code().as_str())
        .bind(request.role().as_str())
        .bind(request.include_children())
        .bind(request.reason())
        .bind(request.status().as_str())
        .bind(request.requested_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                return AppError::Conflict(format!(
                    "a pending request for '{}' already exists",
                    request.code()
                ));
            }
            store_error("create permission request", error)
        })?;

        Ok(request)
    }

    async fn find_request(
        &self,
        request_id: PermissionRequestId,
    ) -> AppResult<Option<PermissionRequest>> {
        let row = sqlx::query_as::<_, RequestRow>(
            r#"
            SELECT
                id AS request_id,
                subject,
                code,
                role,
                include_children,
                reason,
                status,
                decided_by,
                decision_note,
                requested_at
            FROM classification_permission_requests
            WHERE id = $1
            "#,
        )
        .bind(request_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error(&format!("find permission request '{request_id}'"), error))?;

        row.map(PermissionRequest::try_from).transpose()
    }

    async fn find_pending_request(
        &self,
        subject: &str,
        code: &ClassificationCode,
    ) -> AppResult<Option<PermissionRequest>> {
        let row = sqlx::query_as::<_, RequestRow>(
            r#"
            SELECT
                id AS request_id,
                subject,
                code,
                role,
                include_children,
                reason,
                status,
                decided_by,
                decision_note,
                requested_at
            FROM classification_permission_requests
            WHERE subject = $1
              AND code = $2
              AND status = 'PENDING'
            "#,
        )
        .bind(subject)
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error("find pending permission request", error))?;

        row.map(PermissionRequest::try_from).transpose()
    }

    async fn list_requests(
        &self,
        query: PermissionRequestQuery,
    ) -> AppResult<Vec<PermissionRequest>> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, RequestRow>(
            r#"
            SELECT
                id AS request_id,
                subject,
                code,
                role,
                include_children,
                reason,
                status,
                decided_by,
                decision_note,
                requested_at
            FROM classification_permission_requests
            WHERE ($1::TEXT IS NULL OR subject = $1)
              AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY requested_at DESC, id
            LIMIT $3
            OFFSET $4
            "#,
        )
        .bind(query.subject.as_deref())
        .bind(query.status.map(|status| status.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("list permission requests", error))?;

        rows.into_iter().map(PermissionRequest::try_from).collect()
    }

    async fn save_decision(&self, request: &PermissionRequest) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE classification_permission_requests
            SET status = $2,
                decided_by = $3,
                decision_note = $4,
                decided_at = now()
            WHERE id = $1
              AND status = 'PENDING'
            "#,
        )
        .bind(request.request_id().as_uuid())
        .bind(request.status().as_str())
        .bind(request.decided_by())
        .bind(request.decision_note())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                &format!("store decision for permission request '{}'", request.request_id()),
                error,
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "permission request '{}' was already decided",
                request.request_id()
            )));
        }

        tracing::info!(
            request_id = %request.request_id(),
            status = request.status().as_str(),
            "permission request decided"
        );
        Ok(())
    }
}
