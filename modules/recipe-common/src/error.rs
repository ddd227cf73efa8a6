use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecipeScoutError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
