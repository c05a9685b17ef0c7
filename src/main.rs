use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use agritrace::config::AppConfig;
use agritrace::identity::{HostedIdentity, IdentityProvider};
use agritrace::store::{RestStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;
    let http = reqwest::Client::new();

    // Two handles, two blast radii: identity calls carry only the public
    // anon key, record-store calls carry the privileged service-role key.
    let identity: Arc<dyn IdentityProvider> = Arc::new(HostedIdentity::new(
        http.clone(),
        config.service_url.clone(),
        config.anon_key,
    ));
    let store: Arc<dyn Store> = Arc::new(RestStore::new(
        http,
        config.service_url.clone(),
        config.service_role_key,
    ));

    let app = agritrace::app(identity, store).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!(bind = %config.bind, service_url = %config.service_url, "agritrace listening");
    axum::serve(listener, app).await?;

    Ok(())
}
