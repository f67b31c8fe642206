use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use classgate_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route("/api/access/check", get(handlers::access::check_access_handler))
        .route(
            "/api/access/effective-role",
            get(handlers::access::effective_role_handler),
        )
        .route(
            "/api/access/allowed-codes",
            get(handlers::access::allowed_codes_handler),
        )
        .route(
            "/api/classification/nodes",
            get(handlers::classification::list_nodes_handler),
        )
        .route(
            "/api/classification/nodes/{code}",
            get(handlers::classification::get_node_handler),
        )
        .route(
            "/api/classification/nodes/{code}/descendants",
            get(handlers::classification::descendant_codes_handler),
        )
        .route(
            "/api/classification/import",
            post(handlers::classification::import_tree_handler),
        )
        .route(
            "/api/grants",
            get(handlers::grants::list_grants_handler).post(handlers::grants::create_grant_handler),
        )
        .route(
            "/api/grants/{grant_id}/deactivate",
            post(handlers::grants::deactivate_grant_handler),
        )
        .route(
            "/api/grants/{grant_id}/validity",
            put(handlers::grants::update_grant_validity_handler),
        )
        .route(
            "/api/permission-requests",
            get(handlers::permission_requests::list_permission_requests_handler)
                .post(handlers::permission_requests::submit_permission_request_handler),
        )
        .route(
            "/api/permission-requests/{request_id}/approve",
            post(handlers::permission_requests::approve_permission_request_handler),
        )
        .route(
            "/api/permission-requests/{request_id}/reject",
            post(handlers::permission_requests::reject_permission_request_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = cors::build_cors_layer(frontend_url)?;

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/me", get(auth::me_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
