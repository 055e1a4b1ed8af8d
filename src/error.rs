use thiserror::Error;

use crate::logic::expression::ExpressionError;
use crate::model::{EntityId, FormErrors};

#[derive(Debug, Error)]
pub enum AutoSkuError {
    #[error("Entity type '{entity_type}' has no SKU field")]
    MissingSkuField { entity_type: String },

    #[error("The \"{0}\" SKU generator plugin does not exist")]
    UnknownGenerator(String),

    #[error("Invalid auto SKU configuration")]
    InvalidConfiguration(FormErrors),

    #[error("Entity type '{0}' not found")]
    EntityTypeNotFound(String),

    #[error("Variation type '{0}' not found")]
    BundleNotFound(String),

    #[error("Product variation {0} not found")]
    VariationNotFound(EntityId),

    #[error("SKU field is required")]
    SkuRequired,

    #[error("The SKU '{0}' is already in use")]
    DuplicateSku(String),

    #[error("SKU pattern evaluation failed: {0}")]
    Expression(#[from] ExpressionError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type AutoSkuResult<T> = Result<T, AutoSkuError>;
