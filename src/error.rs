// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Domain failures raised by validation and owner-scoped lookups.
///
/// Commands return `anyhow::Result`; these convert into it with `?` and can be
/// recovered with `downcast_ref::<AppError>()` where the kind matters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },
    #[error("{kind} {id} belongs to another user")]
    Forbidden { kind: &'static str, id: i64 },
    #[error("User '{0}' not found")]
    UnknownUser(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}
