use chrono::Utc;
use classgate_application::{PermissionRequestQuery, PermissionRequestRepository};
use classgate_core::AppError;
use classgate_domain::{
    AccessRole, ClassificationCode, PermissionRequest, PermissionRequestId,
    PermissionRequestStatus,
};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresPermissionRequestRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres request tests: {error}");
    }

    Some(pool)
}

async fn ensure_node(pool: &PgPool, code: &str) -> ClassificationCode {
    let insert = sqlx::query(
        r#"
            INSERT INTO classification_nodes (code, section)
            VALUES ($1, 'R')
            ON CONFLICT (code) DO NOTHING
            "#,
    )
    .bind(code)
    .execute(pool)
    .await;
    assert!(insert.is_ok());

    match ClassificationCode::new(code) {
        Ok(code) => code,
        Err(error) => panic!("invalid test code: {error}"),
    }
}

fn pending(subject: &str, code: &ClassificationCode) -> PermissionRequest {
    match PermissionRequest::new(
        PermissionRequestId::new(),
        subject,
        code.clone(),
        AccessRole::Viewer,
        true,
        Some("audit review".to_owned()),
        Utc::now(),
    ) {
        Ok(request) => request,
        Err(error) => panic!("invalid test request: {error}"),
    }
}

#[tokio::test]
async fn only_one_pending_request_per_subject_and_code() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let code = ensure_node(&pool, "R-REQUESTS").await;
    let repository = PostgresPermissionRequestRepository::new(pool);
    let subject = format!("requester-{}", uuid::Uuid::new_v4());

    assert!(repository.create_request(pending(&subject, &code)).await.is_ok());
    let duplicate = repository.create_request(pending(&subject, &code)).await;

    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn decision_is_stored_once() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let code = ensure_node(&pool, "R-REQUESTS").await;
    let repository = PostgresPermissionRequestRepository::new(pool);
    let subject = format!("requester-{}", uuid::Uuid::new_v4());
    let Ok(mut request) = repository.create_request(pending(&subject, &code)).await else {
        panic!("request should be stored");
    };

    assert!(
        request
            .decide(PermissionRequestStatus::Rejected, "root", Some("no".to_owned()))
            .is_ok()
    );
    assert!(repository.save_decision(&request).await.is_ok());
    assert!(matches!(
        repository.save_decision(&request).await,
        Err(AppError::Conflict(_))
    ));

    let stored = repository.find_request(request.request_id()).await;
    assert!(stored.is_ok_and(|stored| stored.is_some_and(|stored| {
        stored.status() == PermissionRequestStatus::Rejected
            && stored.decided_by() == Some("root")
            && stored.decision_note() == Some("no")
    })));
    assert!(
        repository
            .find_pending_request(&subject, &code)
            .await
            .is_ok_and(|pending| pending.is_none())
    );
}

#[tokio::test]
async fn listing_filters_by_subject_and_status() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let code = ensure_node(&pool, "R-REQUESTS").await;
    let other_code = ensure_node(&pool, "R-OTHER").await;
    let repository = PostgresPermissionRequestRepository::new(pool);
    let subject = format!("requester-{}", uuid::Uuid::new_v4());

    assert!(repository.create_request(pending(&subject, &code)).await.is_ok());
    assert!(
        repository
            .create_request(pending(&subject, &other_code))
            .await
            .is_ok()
    );

    let listed = repository
        .list_requests(PermissionRequestQuery {
            subject: Some(subject.clone()),
            status: Some(PermissionRequestStatus::Pending),
            limit: 10,
            offset: 0,
        })
        .await;
    assert!(listed.is_ok_and(|requests| requests.len() == 2));

    let approved = repository
        .list_requests(PermissionRequestQuery {
            subject: Some(subject),
            status: Some(PermissionRequestStatus::Approved),
            limit: 10,
            offset: 0,
        })
        .await;
    assert!(approved.is_ok_and(|requests| requests.is_empty()));
}
