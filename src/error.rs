//! Error types for the viewer

use thiserror::Error;
use wasm_bindgen::JsValue;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JavaScript error: {0}")]
    Js(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid body '{name}': {reason}")]
    InvalidBody { name: String, reason: String },

    #[error("Missing element: {0}")]
    MissingElement(&'static str),
}

impl AppError {
    pub fn invalid_body(name: &str, reason: impl Into<String>) -> Self {
        AppError::InvalidBody {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<JsValue> for AppError {
    fn from(value: JsValue) -> Self {
        AppError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<AppError> for JsValue {
    fn from(err: AppError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for AppError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
