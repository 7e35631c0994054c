use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("unknown column '{name}' (available: {available})")]
    UnknownColumn { name: String, available: String },
}
