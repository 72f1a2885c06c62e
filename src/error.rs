use std::{error::Error, fmt::Display};

#[derive(Debug)]
pub enum AppError {
    PersistenceError(String),
    ConfigError(String),
    ServerError(String),
}

pub type Result<T> = core::result::Result<T, AppError>;
impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
impl Error for AppError {}
impl From<mongodb::error::Error> for AppError {
    fn from(value: mongodb::error::Error) -> Self {
        Self::PersistenceError(value.to_string())
    }
}
impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::ServerError(value.to_string())
    }
}
