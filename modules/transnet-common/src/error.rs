use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransnetError {
    /// The root account could not be resolved. Nothing downstream can
    /// run, so this aborts the whole pipeline.
    #[error("Root account unresolvable: {0}")]
    RootUnresolvable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Remote source error: {0}")]
    Source(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
