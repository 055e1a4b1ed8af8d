use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::AutoSkuError;
use crate::logic::{
    auto_sku_local_tasks, auto_sku_permissions, AutoSkuContext, AutoSkuService, GeneratorDefinition, SettingsForm,
};
use crate::model::{
    AdminRoute, AutoSkuSettings, EntityId, FormErrors, FormView, LocalTask, Permission, ProductVariation,
    SettingsSubmission, UserContext, VariationType, PRODUCT_VARIATION,
};
use crate::store::traits::{Store, VariationStore, VariationTypeStore};

pub type AppState<S> = Arc<AutoSkuContext<S>>;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FormErrors>,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
            field_errors: None,
        }
    }

    pub fn with_field_errors(message: &str, field_errors: FormErrors) -> Self {
        Self {
            error: message.to_string(),
            field_errors: Some(field_errors),
        }
    }
}

/// Maps domain errors to HTTP status codes.
pub fn error_response(error: AutoSkuError) -> ApiError {
    let status = match &error {
        AutoSkuError::EntityTypeNotFound(_)
        | AutoSkuError::BundleNotFound(_)
        | AutoSkuError::VariationNotFound(_) => StatusCode::NOT_FOUND,
        AutoSkuError::DuplicateSku(_) => StatusCode::CONFLICT,
        AutoSkuError::SkuRequired | AutoSkuError::InvalidConfiguration(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AutoSkuError::MissingSkuField { .. }
        | AutoSkuError::UnknownGenerator(_)
        | AutoSkuError::Expression(_)
        | AutoSkuError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        log::error!("Request failed: {:#}", error);
    }

    let body = match error {
        AutoSkuError::InvalidConfiguration(errors) => {
            ErrorResponse::with_field_errors("Invalid auto SKU configuration", errors)
        }
        AutoSkuError::SkuRequired => {
            let mut errors = FormErrors::new();
            errors.insert("sku".to_string(), AutoSkuError::SkuRequired.to_string());
            ErrorResponse::with_field_errors("SKU field is required", errors)
        }
        other => ErrorResponse::new(&other.to_string()),
    };
    (status, Json(body))
}

fn storage_error(error: anyhow::Error) -> ApiError {
    error_response(AutoSkuError::Storage(error))
}

fn require_permission(user: &UserContext, permission: &str) -> Result<(), ApiError> {
    if user.has_permission(permission) {
        return Ok(());
    }
    log::warn!("User '{}' lacks permission '{}'", user.display_name(), permission);
    Err((
        StatusCode::FORBIDDEN,
        Json(ErrorResponse::new(&format!("Missing permission '{}'", permission))),
    ))
}

pub async fn list_generators<S: Store>(
    State(context): State<AppState<S>>,
) -> Json<ListResponse<GeneratorDefinition>> {
    Json(context.generators.definitions().into())
}

pub async fn list_permissions<S: Store>(State(context): State<AppState<S>>) -> Json<ListResponse<Permission>> {
    Json(auto_sku_permissions(&context.entity_types).into())
}

pub async fn list_local_tasks<S: Store>(State(context): State<AppState<S>>) -> Json<ListResponse<LocalTask>> {
    Json(auto_sku_local_tasks(&context.entity_types).into())
}

pub async fn list_variation_types<S: Store>(
    State(context): State<AppState<S>>,
) -> Result<Json<ListResponse<VariationType>>, ApiError> {
    match context.store.list_variation_types().await {
        Ok(types) => Ok(Json(types.into())),
        Err(e) => Err(storage_error(e)),
    }
}

pub async fn get_variation_type<S: Store>(
    State(context): State<AppState<S>>,
    Path(type_id): Path<String>,
) -> Result<Json<VariationType>, ApiError> {
    match context.store.get_variation_type(&type_id).await {
        Ok(Some(variation_type)) => Ok(Json(variation_type)),
        Ok(None) => Err(error_response(AutoSkuError::BundleNotFound(type_id))),
        Err(e) => Err(storage_error(e)),
    }
}

pub async fn upsert_variation_type<S: Store>(
    State(context): State<AppState<S>>,
    RequestJson(variation_type): RequestJson<VariationType>,
) -> Result<Json<VariationType>, ApiError> {
    if variation_type.id.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::new("Variation type id must not be empty")),
        ));
    }

    context
        .store
        .upsert_variation_type(variation_type.clone())
        .await
        .map_err(storage_error)?;
    log::info!("Saved variation type '{}'", variation_type.id);
    Ok(Json(variation_type))
}

pub async fn get_variation<S: Store>(
    State(context): State<AppState<S>>,
    Path(id): Path<EntityId>,
) -> Result<Json<ProductVariation>, ApiError> {
    match context.store.get_variation(PRODUCT_VARIATION, id).await {
        Ok(Some(variation)) => Ok(Json(variation)),
        Ok(None) => Err(error_response(AutoSkuError::VariationNotFound(id))),
        Err(e) => Err(storage_error(e)),
    }
}

pub async fn create_variation<S: Store>(
    State(context): State<AppState<S>>,
    user: UserContext,
    RequestJson(mut variation): RequestJson<ProductVariation>,
) -> Result<(StatusCode, Json<ProductVariation>), ApiError> {
    variation.id = None;
    variation.entity_type = PRODUCT_VARIATION.to_string();
    variation.created_at = None;
    variation.updated_at = None;

    let saved = AutoSkuService::new(context.as_ref())
        .save_variation(variation, Some(&user))
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn update_variation<S: Store>(
    State(context): State<AppState<S>>,
    Path(id): Path<EntityId>,
    user: UserContext,
    RequestJson(mut variation): RequestJson<ProductVariation>,
) -> Result<Json<ProductVariation>, ApiError> {
    let existing = match context.store.get_variation(PRODUCT_VARIATION, id).await {
        Ok(Some(existing)) => existing,
        Ok(None) => return Err(error_response(AutoSkuError::VariationNotFound(id))),
        Err(e) => return Err(storage_error(e)),
    };

    variation.id = Some(id);
    variation.entity_type = PRODUCT_VARIATION.to_string();
    variation.created_at = existing.created_at;

    let saved = AutoSkuService::new(context.as_ref())
        .save_variation(variation, Some(&user))
        .await
        .map_err(error_response)?;
    Ok(Json(saved))
}

pub async fn delete_variation<S: Store>(
    State(context): State<AppState<S>>,
    Path(id): Path<EntityId>,
) -> Result<StatusCode, ApiError> {
    match context.store.delete_variation(PRODUCT_VARIATION, id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(error_response(AutoSkuError::VariationNotFound(id))),
        Err(e) => Err(storage_error(e)),
    }
}

/// `GET` on an entity type's `auto-sku` link template.
pub async fn get_settings_form<S: Store>(
    State(context): State<AppState<S>>,
    Extension(route): Extension<AdminRoute>,
    Path(bundle): Path<String>,
    user: UserContext,
) -> Result<Json<FormView>, ApiError> {
    require_permission(&user, &route.permission)?;

    let view = SettingsForm::new(context.as_ref())
        .build(&route.entity_type_id, &bundle)
        .await
        .map_err(error_response)?;
    Ok(Json(view))
}

/// `POST` on an entity type's `auto-sku` link template.
pub async fn submit_settings_form<S: Store>(
    State(context): State<AppState<S>>,
    Extension(route): Extension<AdminRoute>,
    Path(bundle): Path<String>,
    user: UserContext,
    RequestJson(submission): RequestJson<SettingsSubmission>,
) -> Result<Json<AutoSkuSettings>, ApiError> {
    require_permission(&user, &route.permission)?;

    let settings = SettingsForm::new(context.as_ref())
        .submit(&route.entity_type_id, &bundle, submission)
        .await
        .map_err(error_response)?;
    Ok(Json(settings))
}
