use classgate_core::AppError;

/// Maps a driver error to an application error.
///
/// Connectivity failures surface as `Unavailable`, everything else as `Internal`.
pub(crate) fn store_error(context: &str, error: sqlx::Error) -> AppError {
    match error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => {
            tracing::warn!(error = %error, "postgres store unavailable while trying to {context}");
            AppError::Unavailable(format!("failed to {context}: {error}"))
        }
        other => AppError::Internal(format!("failed to {context}: {other}")),
    }
}

/// Returns whether the error is a unique constraint violation.
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(database_error) if database_error.code().as_deref() == Some("23505")
    )
}
