use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use next_career_backend::{
    config::{get_config, init_config, LogFormat},
    database::{
        pool::{create_pool, run_migrations},
        postgres::PgStore,
    },
    middleware::cors::cors_layer,
    routes, AppState,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();
    init_tracing(config.log_format);

    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;
    info!("database ready");

    let store = Arc::new(PgStore::new(pool));
    let app_state = AppState::new(
        store,
        &config.jwt_secret,
        Duration::from_secs(config.role_cache_ttl_secs),
    );

    let app = routes::router(app_state, config.api_rps, config.public_rps)
        .layer(cors_layer(config.cors_allowed_origin.as_deref()))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
