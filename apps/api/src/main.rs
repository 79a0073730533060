//! Tessera API composition root.

#![forbid(unsafe_code)]

mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use sqlx::postgres::PgPoolOptions;
use tessera_application::{GroupAdminService, PermissionService, TenantAccessService};
use tessera_core::{AppError, OrganizationId};
use tessera_domain::EntityKind;
use tessera_infrastructure::{
    PostgresAuditRepository, PostgresEntityDirectory, PostgresPermissionRepository,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::middleware::EntityGuard;
use crate::state::AppState;

// Entity kinds served through the guarded context routes.
const GUARDED_ENTITY_KINDS: &[EntityKind] = &[
    EntityKind::Risk,
    EntityKind::Control,
    EntityKind::Evidence,
    EntityKind::Policy,
    EntityKind::Vendor,
    EntityKind::Asset,
    EntityKind::Audit,
    EntityKind::User,
    EntityKind::Workspace,
    EntityKind::Integration,
    EntityKind::Framework,
    EntityKind::Report,
];

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let provisioning_token = required_env("AUTH_PROVISIONING_TOKEN")?;
    let session_secret = required_env("SESSION_SECRET")?;

    if session_secret.len() < 32 {
        return Err(AppError::Validation(
            "SESSION_SECRET must be at least 32 characters".to_owned(),
        ));
    }

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);

    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .unwrap_or_else(|_| "false".to_owned())
        .eq_ignore_ascii_case("true");
    let default_organization_id = env::var("DEFAULT_ORGANIZATION_ID")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(|value| {
            uuid::Uuid::parse_str(value.as_str())
                .map(OrganizationId::from_uuid)
                .map_err(|error| {
                    AppError::Validation(format!("invalid DEFAULT_ORGANIZATION_ID: {error}"))
                })
        })
        .transpose()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let session_store = PostgresStore::new(pool.clone())
        .with_table_name("tower_sessions")
        .map_err(|error| {
            AppError::Validation(format!("invalid session table name configuration: {error}"))
        })?;
    session_store.migrate().await.map_err(|error| {
        AppError::Internal(format!("failed to initialize session store: {error}"))
    })?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30)));

    let permission_repository = Arc::new(PostgresPermissionRepository::new(pool.clone()));
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));
    let entity_directory = Arc::new(PostgresEntityDirectory::new(pool.clone()));

    let permission_service = PermissionService::new(permission_repository.clone());
    let group_admin_service = GroupAdminService::new(
        permission_service.clone(),
        permission_repository.clone(),
        permission_repository.clone(),
        permission_repository,
        audit_repository,
    );
    let tenant_access_service = TenantAccessService::new(entity_directory);

    let app_state = AppState {
        permission_service,
        group_admin_service,
        tenant_access_service,
        frontend_url: frontend_url.clone(),
        provisioning_token,
        default_organization_id,
    };

    let mut context_routes = Router::new();
    for kind in GUARDED_ENTITY_KINDS {
        let path = format!("/api/context/{}/{{entity_id}}", kind.as_str());
        context_routes = context_routes.merge(
            Router::new()
                .route(
                    path.as_str(),
                    get(handlers::permissions::entity_context_handler),
                )
                .route_layer(from_fn_with_state(
                    app_state.clone(),
                    middleware::verify_entity_ownership,
                ))
                .layer(axum::Extension(EntityGuard {
                    kind: *kind,
                    parameter: "entity_id",
                })),
        );
    }

    let protected_routes = Router::new()
        .route(
            "/api/permissions/available",
            get(handlers::permissions::available_permissions_handler),
        )
        .route(
            "/api/permissions/me",
            get(handlers::permissions::my_permissions_handler),
        )
        .route(
            "/api/permissions/check",
            get(handlers::permissions::check_permission_handler),
        )
        .route(
            "/api/permissions/groups",
            get(handlers::permissions::list_groups_handler)
                .post(handlers::permissions::create_group_handler),
        )
        .route(
            "/api/permissions/groups/{group_id}",
            put(handlers::permissions::update_group_handler)
                .delete(handlers::permissions::delete_group_handler),
        )
        .route(
            "/api/permissions/groups/{group_id}/members",
            get(handlers::permissions::list_group_members_handler)
                .post(handlers::permissions::add_group_member_handler),
        )
        .route(
            "/api/permissions/groups/{group_id}/members/{user_id}",
            axum::routing::delete(handlers::permissions::remove_group_member_handler),
        )
        .route(
            "/api/permissions/users/{user_id}/overrides",
            get(handlers::permissions::get_user_overrides_handler)
                .put(handlers::permissions::set_user_overrides_handler),
        )
        .route(
            "/api/permissions/users/{user_id}",
            get(handlers::permissions::user_permission_summary_handler),
        )
        .merge(context_routes)
        .route("/auth/me", get(auth::me_handler))
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/session", post(auth::session_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route(
            "/api/permissions/seed",
            post(handlers::permissions::seed_default_groups_handler),
        )
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "tessera-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
