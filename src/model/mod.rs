// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data model shared across the migration engine.

pub mod reference;

pub use reference::Reference;
