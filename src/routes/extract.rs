// ABOUTME: Request extractors that report malformed bodies and queries as AppError
// ABOUTME: Replaces axum's plain-text rejections with the JSON error envelope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::{
    async_trait,
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::errors::AppError;

/// JSON body whose rejection is a 400 `INVALID_INPUT`
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

/// Query string whose rejection is a 400 `INVALID_INPUT`
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

fn rejection_error(message: &str, reason: String) -> AppError {
    AppError::invalid_input(message).with_details(json!({ "reason": reason }))
}

fn json_rejection(rejection: &JsonRejection) -> AppError {
    rejection_error("Invalid JSON body", rejection.body_text())
}

fn query_rejection(rejection: &QueryRejection) -> AppError {
    rejection_error("Invalid query parameters", rejection.body_text())
}

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| json_rejection(&rejection))?;
        Ok(Self(value))
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| query_rejection(&rejection))?;
        Ok(Self(value))
    }
}

/// Parse a JSON payload read as raw bytes, with the same error shape as [`ApiJson`]
///
/// # Errors
///
/// Returns `INVALID_INPUT` when the bytes are not a valid `T`
pub fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(bytes)
        .map_err(|e| rejection_error("Invalid JSON body", e.to_string()))
}
