use balloon_gate_access::AuthorizationGate;
use balloon_gate_server::{
    auth::{AppState, SessionStore, init_login_provider},
    config::{ServerConfig, load_allow_list_or_empty},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => {
            tracing::info!("Loaded configuration");
            config
        }
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration; continuing with defaults");
            ServerConfig::default()
        }
    };

    for warning in config.warnings() {
        tracing::warn!("{}", warning);
    }

    let allow_list = load_allow_list_or_empty(&config.access.allow_list_path);
    let gate = AuthorizationGate::new(allow_list);

    let login_provider = init_login_provider(config.provider, &config.oidc).await;

    let store = SessionStore::new();

    // Spawn periodic session cleanup task
    let cleanup_store = store.clone();
    let cleanup_interval = config.session.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            let count = cleanup_store.delete_expired().await;
            if count > 0 {
                tracing::debug!(deleted_sessions = count, "Periodic session cleanup");
            }
        }
    });

    let app_state = Arc::new(AppState::new(
        store,
        gate,
        login_provider,
        config.session,
    ));
    let app = balloon_gate_server::router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("server error");
}

