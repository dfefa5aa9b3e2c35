use thiserror::Error;

/// All errors that can occur in barnode-core.
#[derive(Debug, Error)]
pub enum BarnodeError {
    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    #[error("Missing item not found: {0}")]
    MissingItemNotFound(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("No backup snapshot available")]
    BackupNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Process exit codes used by the barnode binary.
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    ConfirmRequired = 8,
}

pub type Result<T> = std::result::Result<T, BarnodeError>;
