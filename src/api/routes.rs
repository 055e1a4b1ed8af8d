use axum::{
    routing::{get, post},
    Extension, Router,
};

use crate::api::handlers::{self, AppState};
use crate::logic::routing::axum_path;
use crate::model::AdminRoute;
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>(admin_routes: &[AdminRoute]) -> Router<AppState<S>> {
    let mut router = Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Registered generators and derived admin metadata
        .route("/generators", get(handlers::list_generators::<S>))
        .route("/permissions", get(handlers::list_permissions::<S>))
        .route("/local-tasks", get(handlers::list_local_tasks::<S>))
        // Variation types (bundles)
        .route(
            "/variation-types",
            get(handlers::list_variation_types::<S>).post(handlers::upsert_variation_type::<S>),
        )
        .route("/variation-types/:type_id", get(handlers::get_variation_type::<S>))
        // Variations, saved through the auto SKU hook
        .route("/variations", post(handlers::create_variation::<S>))
        .route(
            "/variations/:id",
            get(handlers::get_variation::<S>)
                .put(handlers::update_variation::<S>)
                .delete(handlers::delete_variation::<S>),
        );

    // One settings form route per entity type exposing an auto-sku link template
    for route in admin_routes {
        let path = axum_path(&route.path);
        log::info!("Registering {} at {}", route.name, path);
        router = router.route(
            &path,
            get(handlers::get_settings_form::<S>)
                .post(handlers::submit_settings_form::<S>)
                .layer(Extension(route.clone())),
        );
    }

    router
}
