// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for the migration engine.

/// Migration engine error type.
///
/// Fatal-to-run conditions (missing legacy user, missing team reference,
/// team or user write failures) surface as `MigrationResult { success: false }`
/// at the orchestrator; this type covers the store-level causes underneath.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    #[error("Document store error: {0}")]
    Store(String),

    #[error("Blob store error: {0}")]
    Blob(String),

    /// Fatal-to-run migration failure with a caller-facing message.
    #[error("{0}")]
    Migration(&'static str),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, MigrateError>;
