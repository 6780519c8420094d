//! Error types for Dominator Core

use thiserror::Error;

/// Errors raised while inspecting runtime values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("No value at path '{0}'")]
    FieldNotFound(String),

    #[error("Cannot iterate over {found}: expected an array or null")]
    NotIterable { found: &'static str },
}

pub type Result<T> = std::result::Result<T, CoreError>;
