// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Teamplan-Migrator operational CLI
//!
//! Runs a single user's migration (or a re-migration of selected
//! subcollections) between the legacy and new backend projects.
//!
//! Usage:
//!   teamplan-migrator <legacy-uid> <new-uid>
//!   teamplan-migrator <legacy-uid> <new-uid> <collection,collection,...>

use std::sync::Arc;
use teamplan_migrator::{
    config::Config,
    store::{FirestoreStore, GcsBlobStore},
    MigrationEngine, RemigrationDriver,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (legacy_uid, new_uid, subcollections) = match args.as_slice() {
        [legacy, new] => (legacy.clone(), new.clone(), None),
        [legacy, new, cols] => (
            legacy.clone(),
            new.clone(),
            Some(
                cols.split(',')
                    .map(str::to_string)
                    .collect::<Vec<String>>(),
            ),
        ),
        _ => {
            eprintln!("usage: teamplan-migrator <legacy-uid> <new-uid> [collections]");
            std::process::exit(2);
        }
    };

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        legacy_project = %config.legacy_project_id,
        new_project = %config.new_project_id,
        "Starting Teamplan-Migrator"
    );

    // Connect both document stores
    let legacy_docs = Arc::new(FirestoreStore::new(&config.legacy_project_id).await?);
    let target_docs = Arc::new(FirestoreStore::new(&config.new_project_id).await?);

    if let Some(subcollections) = subcollections {
        let driver = RemigrationDriver::new(legacy_docs, target_docs);
        let summary = driver
            .remigrate(&legacy_uid, &new_uid, &subcollections, |progress| {
                tracing::info!(
                    step = progress.step,
                    current = progress.current,
                    total = progress.total,
                    item = %progress.item_name,
                    "Re-migration progress"
                );
            })
            .await?;
        tracing::info!(
            subcollections = ?summary.subcollections_copied,
            documents = summary.documents_copied,
            "Re-migration finished"
        );
        return Ok(());
    }

    // Full migrations also move attachments, so connect both buckets
    let legacy_blobs = Arc::new(GcsBlobStore::new(&config.legacy_bucket).await?);
    let target_blobs = Arc::new(GcsBlobStore::new(&config.new_bucket).await?);

    let engine = MigrationEngine::new(legacy_docs, target_docs, legacy_blobs, target_blobs);
    let result = engine.migrate_user(&legacy_uid, &new_uid).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("teamplan_migrator=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
