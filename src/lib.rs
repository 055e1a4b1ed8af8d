pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

pub use api::handlers;
pub use api::routes;

pub use error::{AutoSkuError, AutoSkuResult};
pub use logic::{AutoSkuContext, AutoSkuManager, AutoSkuService, GeneratorRegistry, SettingsForm, SiteInfo};
pub use model::*;
pub use seed::*;
pub use store::{MemoryStore, PostgresStore, Store};

use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Service context with the built-in entity types and the configured site.
pub fn build_context<S: Store>(store: Arc<S>, config: &crate::config::AppConfig) -> AutoSkuContext<S> {
    AutoSkuContext::new(store, EntityTypeManager::new(seed::default_entity_types()))
        .with_site(config.site())
        .with_max_conflict_retries(config.autosku.max_conflict_retries)
}

/// Router with the fixed API plus one settings route per auto SKU link template.
pub fn build_app<S: Store + 'static>(context: AutoSkuContext<S>) -> axum::Router {
    let admin_routes = logic::auto_sku_routes(&context.entity_types);
    api::routes::create_router::<S>(&admin_routes)
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(context))
}

pub async fn serve_app(app: axum::Router, config: &crate::config::AppConfig) -> anyhow::Result<()> {
    let bind_address = config.server_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    log::info!("Auto SKU service running on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_with<S: Store + 'static>(store: Arc<S>, config: &crate::config::AppConfig) -> anyhow::Result<()> {
    if config.autosku.load_seed_data {
        seed::load_seed_data(store.as_ref()).await?;
    }
    serve_app(build_app(build_context(store, config)), config).await
}

/// Serves on PostgreSQL when a database URL is configured, otherwise on the
/// in-memory store.
pub async fn run_with_config(config: &crate::config::AppConfig) -> anyhow::Result<()> {
    match config.database_url() {
        Some(database_url) => {
            log::info!("Connecting to PostgreSQL...");
            let store = PostgresStore::new(&database_url, config.max_connections()).await?;
            store.migrate().await?;
            serve_with(Arc::new(store), config).await
        }
        None => {
            log::warn!("No database configured, using the in-memory store");
            serve_with(Arc::new(MemoryStore::new()), config).await
        }
    }
}
