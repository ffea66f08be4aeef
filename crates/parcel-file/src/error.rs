//! 文件操作错误定义

use parcel_core::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Traverse has no courses to export")]
    NothingToExport,
}
