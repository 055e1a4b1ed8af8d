pub mod common;
pub mod entity_type;
pub mod form;
pub mod routing;
pub mod settings;
pub mod user_context;
pub mod variation;

pub use common::*;
pub use entity_type::*;
pub use form::*;
pub use routing::*;
pub use settings::*;
pub use user_context::*;
pub use variation::*;
