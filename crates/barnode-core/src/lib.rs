pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod storage;

pub use config::{AppConfig, BackupConfig, CoreConfig};
pub use error::{BarnodeError, ExitCode, Result};
pub use import::{ImportPlan, plan_text_import};
pub use models::*;
pub use storage::{Database, RestoreStats};
