//! Configuration error types
//!
//! Every variant is raised before the first bar is processed.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value}")]
    NonPositiveLength { name: &'static str, value: usize },

    #[error("invalid {bound} date: {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}")]
    InvalidDate {
        bound: &'static str,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    },

    #[error("order quantity must be positive, got {0}")]
    NonPositiveQuantity(f64),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
