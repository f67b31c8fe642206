use std::sync::Arc;

use classgate_application::{
    AuditRepository, ClassificationAccessResolver, ClassificationCatalogService,
    ClassificationTreeRepository, GrantAdminService, PermissionGrantRepository,
    PermissionRequestRepository, PermissionRequestService,
};
use classgate_infrastructure::{
    CachedClassificationTreeRepository, PostgresAuditRepository,
    PostgresClassificationTreeRepository, PostgresPermissionGrantRepository,
    PostgresPermissionRequestRepository,
};
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> AppState {
    let tree_repository: Arc<dyn ClassificationTreeRepository> =
        Arc::new(CachedClassificationTreeRepository::new(
            Arc::new(PostgresClassificationTreeRepository::new(pool.clone())),
            config.tree_cache_ttl,
        ));
    let grant_repository: Arc<dyn PermissionGrantRepository> =
        Arc::new(PostgresPermissionGrantRepository::new(pool.clone()));
    let request_repository: Arc<dyn PermissionRequestRepository> =
        Arc::new(PostgresPermissionRequestRepository::new(pool.clone()));
    let audit_repository: Arc<dyn AuditRepository> =
        Arc::new(PostgresAuditRepository::new(pool));

    let access_resolver =
        ClassificationAccessResolver::new(grant_repository.clone(), tree_repository.clone());
    let grant_admin_service = GrantAdminService::new(
        access_resolver.clone(),
        grant_repository.clone(),
        tree_repository.clone(),
        audit_repository.clone(),
    );

    AppState {
        catalog_service: ClassificationCatalogService::new(
            access_resolver.clone(),
            tree_repository.clone(),
            audit_repository.clone(),
        ),
        permission_request_service: PermissionRequestService::new(
            access_resolver.clone(),
            grant_admin_service.clone(),
            grant_repository.clone(),
            request_repository,
            tree_repository,
            audit_repository,
        ),
        access_resolver,
        grant_admin_service,
        frontend_url: config.frontend_url.clone(),
        bootstrap_token: config.bootstrap_token.clone(),
    }
}
