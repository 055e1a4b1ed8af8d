use anyhow::{Context, Result};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;

use crate::model::{EntityId, ProductReference, ProductVariation, VariationType};
use crate::store::traits::{SaveOutcome, SettingsStore, Store, VariationStore, VariationTypeStore};

/// Postgres error code for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

const MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS product_variation_types (
    id TEXT PRIMARY KEY,
    label TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS product_variations (
    id BIGSERIAL PRIMARY KEY,
    entity_type TEXT NOT NULL,
    bundle TEXT NOT NULL,
    sku TEXT,
    title TEXT NOT NULL DEFAULT '',
    product JSONB,
    attributes JSONB NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX IF NOT EXISTS product_variations_sku_unique
    ON product_variations (entity_type, sku)
    WHERE sku IS NOT NULL AND sku <> '';

CREATE TABLE IF NOT EXISTS autosku_bundle_settings (
    settings_key TEXT PRIMARY KEY,
    data JSONB NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const VARIATION_COLUMNS: &str =
    "id, entity_type, bundle, sku, title, product, attributes, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the tables and the SKU unique index if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        for statement in MIGRATION.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to run migration statement: {}", statement))?;
        }
        log::info!("Database schema is up to date");
        Ok(())
    }
}

fn variation_from_row(row: &PgRow) -> Result<ProductVariation> {
    let product: Option<Json<ProductReference>> = row.try_get("product")?;
    let attributes: Json<BTreeMap<String, serde_json::Value>> = row.try_get("attributes")?;

    Ok(ProductVariation {
        id: Some(row.try_get("id")?),
        entity_type: row.try_get("entity_type")?,
        bundle: row.try_get("bundle")?,
        sku: row.try_get("sku")?,
        title: row.try_get("title")?,
        product: product.map(|p| p.0),
        attributes: attributes.0,
        created_at: Some(row.try_get("created_at")?),
        updated_at: Some(row.try_get("updated_at")?),
    })
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

#[async_trait::async_trait]
impl VariationStore for PostgresStore {
    async fn get_variation(&self, entity_type: &str, id: EntityId) -> Result<Option<ProductVariation>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM product_variations WHERE entity_type = $1 AND id = $2",
            VARIATION_COLUMNS
        ))
        .bind(entity_type)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch product variation")?;

        row.as_ref().map(variation_from_row).transpose()
    }

    async fn find_by_sku(&self, entity_type: &str, sku: &str) -> Result<Vec<ProductVariation>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM product_variations WHERE entity_type = $1 AND sku = $2 ORDER BY id",
            VARIATION_COLUMNS
        ))
        .bind(entity_type)
        .bind(sku)
        .fetch_all(&self.pool)
        .await
        .context("Failed to look up product variations by SKU")?;

        rows.iter().map(variation_from_row).collect()
    }

    async fn save_variation(&self, variation: ProductVariation) -> Result<SaveOutcome> {
        let sku = variation.sku.clone().filter(|sku| !sku.trim().is_empty());
        let product = variation.product.as_ref().map(Json);

        let result = match variation.id {
            None => {
                sqlx::query(&format!(
                    r#"
                    INSERT INTO product_variations (entity_type, bundle, sku, title, product, attributes)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING {}
                    "#,
                    VARIATION_COLUMNS
                ))
                .bind(&variation.entity_type)
                .bind(&variation.bundle)
                .bind(&sku)
                .bind(&variation.title)
                .bind(product)
                .bind(Json(&variation.attributes))
                .fetch_optional(&self.pool)
                .await
            }
            Some(id) => {
                sqlx::query(&format!(
                    r#"
                    UPDATE product_variations SET
                        bundle = $3,
                        sku = $4,
                        title = $5,
                        product = $6,
                        attributes = $7,
                        updated_at = NOW()
                    WHERE entity_type = $1 AND id = $2
                    RETURNING {}
                    "#,
                    VARIATION_COLUMNS
                ))
                .bind(&variation.entity_type)
                .bind(id)
                .bind(&variation.bundle)
                .bind(&sku)
                .bind(&variation.title)
                .bind(product)
                .bind(Json(&variation.attributes))
                .fetch_optional(&self.pool)
                .await
            }
        };

        match result {
            Ok(Some(row)) => Ok(SaveOutcome::Saved(variation_from_row(&row)?)),
            Ok(None) => Err(anyhow::anyhow!(
                "Product variation {} does not exist",
                variation.id.unwrap_or_default()
            )),
            Err(e) if is_unique_violation(&e) => Ok(SaveOutcome::SkuConflict(sku.unwrap_or_default())),
            Err(e) => Err(e).context("Failed to save product variation"),
        }
    }

    async fn delete_variation(&self, entity_type: &str, id: EntityId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM product_variations WHERE entity_type = $1 AND id = $2")
            .bind(entity_type)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete product variation")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl VariationTypeStore for PostgresStore {
    async fn get_variation_type(&self, id: &str) -> Result<Option<VariationType>> {
        let row = sqlx::query("SELECT id, label FROM product_variation_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch variation type")?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(VariationType {
            id: row.try_get("id")?,
            label: row.try_get("label")?,
        }))
    }

    async fn list_variation_types(&self) -> Result<Vec<VariationType>> {
        let rows = sqlx::query("SELECT id, label FROM product_variation_types ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list variation types")?;

        rows.into_iter()
            .map(|row| {
                Ok(VariationType {
                    id: row.try_get("id")?,
                    label: row.try_get("label")?,
                })
            })
            .collect()
    }

    async fn upsert_variation_type(&self, variation_type: VariationType) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO product_variation_types (id, label)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET label = EXCLUDED.label
            "#,
        )
        .bind(&variation_type.id)
        .bind(&variation_type.label)
        .execute(&self.pool)
        .await
        .context("Failed to upsert variation type")?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl SettingsStore for PostgresStore {
    async fn get_bundle_settings(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let row = sqlx::query("SELECT data FROM autosku_bundle_settings WHERE settings_key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch bundle settings")?;

        row.map(|row| row.try_get::<Json<serde_json::Value>, _>("data").map(|data| data.0))
            .transpose()
            .context("Failed to decode bundle settings")
    }

    async fn set_bundle_settings(&self, key: &str, settings: serde_json::Value) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO autosku_bundle_settings (settings_key, data)
            VALUES ($1, $2)
            ON CONFLICT (settings_key) DO UPDATE SET
                data = EXCLUDED.data,
                updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(Json(settings))
        .execute(&self.pool)
        .await
        .context("Failed to store bundle settings")?;

        Ok(())
    }
}

impl Store for PostgresStore {}
