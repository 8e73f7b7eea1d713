// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Teamplan-Migrator: cross-project data migration engine
//!
//! Moves a coach's entire data graph (user record, team record, team-owned
//! subcollections, and binary attachments) from the legacy backend project
//! into the new one, remapping document identities and references along the
//! way. Safe to re-run: partially migrated teams are patched, never
//! duplicated.

pub mod config;
pub mod error;
pub mod migrate;
pub mod model;
pub mod store;
pub mod time_utils;

pub use migrate::orchestrator::{MigrationEngine, MigrationResult};
pub use migrate::remigrate::{ProgressEvent, RemigrationDriver, RemigrationSummary};
