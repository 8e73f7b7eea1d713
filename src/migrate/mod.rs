// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The migration engine.
//!
//! Layered leaf-first: the identity map and reference resolver are pure,
//! the coach resolver / subcollection copier / blob migrator move one slice
//! of a team each, and the orchestrator sequences a whole user migration.

pub mod blobs;
pub mod coach;
pub mod identity;
pub mod orchestrator;
pub mod refs;
pub mod remigrate;
pub mod subcollections;

pub use identity::IdentityMap;
pub use orchestrator::{MigrationEngine, MigrationResult};
