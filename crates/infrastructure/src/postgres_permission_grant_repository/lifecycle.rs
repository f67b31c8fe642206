use super::*;

impl PostgresPermissionGrantRepository {
    pub(super) async fn create_grant_impl(
        &self,
        grant: PermissionGrant,
    ) -> AppResult<PermissionGrant> {
        let row = sqlx::query_as::<_, GrantRow>(&format!(
            r#"
            INSERT INTO classification_permission_grants (
                id,
                subject,
                code,
                role,
                include_children,
                valid_from,
                valid_until,
                is_active,
                granted_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {GRANT_COLUMNS}
            "#
        ))
        .bind(grant.grant_id().as_uuid())
        .bind(grant.subject())
        .bind(grant.code().as_str())
        .bind(grant.role().as_str())
        .bind(grant.include_children())
        .bind(grant.validity().valid_from())
        .bind(grant.validity().valid_until())
        .bind(grant.is_active())
        .bind(grant.granted_by())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                return AppError::Conflict(format!(
                    "subject '{}' already holds an active grant on '{}'",
                    grant.subject(),
                    grant.code()
                ));
            }
            store_error("create grant", error)
        })?;

        tracing::info!(
            grant_id = %grant.grant_id(),
            subject = grant.subject(),
            code = %grant.code(),
            role = %grant.role(),
            "classification grant created"
        );

        row.into_grant()
    }

    pub(super) async fn deactivate_grant_impl(
        &self,
        grant_id: GrantId,
        deactivated_by: &str,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE classification_permission_grants
            SET is_active = FALSE,
                deactivated_by = $2,
                deactivated_at = now()
            WHERE id = $1
              AND is_active
            "#,
        )
        .bind(grant_id.as_uuid())
        .bind(deactivated_by)
        .execute(&self.pool)
        .await
        .map_err(|error| store_error(&format!("deactivate grant '{grant_id}'"), error))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "grant '{grant_id}' was not found or is already inactive"
            )));
        }

        tracing::info!(grant_id = %grant_id, deactivated_by, "classification grant deactivated");
        Ok(())
    }

    pub(super) async fn update_validity_window_impl(
        &self,
        grant_id: GrantId,
        validity: ValidityWindow,
    ) -> AppResult<PermissionGrant> {
        let row = sqlx::query_as::<_, GrantRow>(&format!(
            r#"
            UPDATE classification_permission_grants
            SET valid_from = $2,
                valid_until = $3
            WHERE id = $1
              AND is_active
            RETURNING {GRANT_COLUMNS}
            "#
        ))
        .bind(grant_id.as_uuid())
        .bind(validity.valid_from())
        .bind(validity.valid_until())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error(&format!("update validity of grant '{grant_id}'"), error))?;

        row.map(GrantRow::into_grant).transpose()?.ok_or_else(|| {
            AppError::NotFound(format!(
                "grant '{grant_id}' was not found or is already inactive"
            ))
        })
    }
}
