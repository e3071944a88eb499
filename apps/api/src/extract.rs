//! Request extractors whose rejections speak the API error format.

use axum::extract::{FromRequest, Request};
use axum::Json;

use crate::error::ApiError;

/// `Json<T>` that rejects with [`ApiError`], so a malformed body comes back
/// as a 400 `VALIDATION_ERROR` like any other invalid input.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}
