use classgate_application::{
    ClassificationAccessResolver, ClassificationCatalogService, GrantAdminService,
    PermissionRequestService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub access_resolver: ClassificationAccessResolver,
    pub catalog_service: ClassificationCatalogService,
    pub grant_admin_service: GrantAdminService,
    pub permission_request_service: PermissionRequestService,
    pub frontend_url: String,
    pub bootstrap_token: Option<String>,
}
