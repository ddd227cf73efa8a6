pub mod config;
pub mod error;
pub mod types;

pub use config::{CategoryMode, Config, SinkKind};
pub use error::RecipeScoutError;
pub use types::*;
