// ABOUTME: HTTP middleware for request ids and cross-origin access
// ABOUTME: Tower layers applied around the axum router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod cors;
pub mod request_id;

// CORS configuration
pub use cors::setup_cors;

// Request id generation and propagation
pub use request_id::{propagate_request_id, set_request_id, REQUEST_ID_HEADER};
