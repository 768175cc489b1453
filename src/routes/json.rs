use axum::extract::FromRequest;

use crate::error::AppError;

/// `Json` extractor whose rejections are reported as `AppError::Validation` (400)
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
