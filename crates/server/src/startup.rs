use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use configs::AppConfig;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};
use service::auth::{repo::SeaOrmAuthRepository, repository::AuthRepository, service::AuthConfig, AuthService};
use service::entry::{export::XlsxEncoder, repo::SeaOrmEntryRepository, EntryService};

/// Single configured origin, cookies allowed.
pub fn build_cors(origin: &str) -> Result<CorsLayer, StartupError> {
    let origin = origin
        .parse::<HeaderValue>()
        .map_err(|e| StartupError::InvalidConfig(format!("server.cors_origin: {e}")))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::HEAD, Method::PUT, Method::PATCH, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

/// Wire SeaORM repositories into the services shared by every handler.
pub fn build_state(db: DatabaseConnection, auth: &configs::AuthConfig) -> ServerState {
    let users: Arc<dyn AuthRepository> = Arc::new(SeaOrmAuthRepository::new(db.clone()));
    let auth_cfg = AuthConfig {
        jwt_secret: Some(auth.jwt_secret.clone()),
        token_ttl_hours: auth.token_ttl_hours,
        allow_admin_signup: auth.allow_admin_signup,
    };
    ServerState {
        auth: Arc::new(AuthService::new(users.clone(), auth_cfg)),
        entries: Arc::new(EntryService::new(
            Arc::new(SeaOrmEntryRepository::new(db)),
            users,
            Arc::new(XlsxEncoder),
        )),
    }
}

/// Connect, migrate and serve `cfg` until `shutdown` resolves.
///
/// `cfg` is expected to be normalized already (see [`AppConfig::load_or_env`]).
pub async fn run<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let db = models::db::connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;
    info!("migrations applied");

    let state = build_state(db, &cfg.auth);
    let cors = build_cors(&cfg.server.cors_origin)?;
    let app: Router = routes::build_router(state, cors, cfg.server.body_limit_bytes);

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, cors_origin = %cfg.server.cors_origin, "listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("http server drained");
    Ok(())
}
