//! Shared types, error model, and configuration for vaultflat.
//!
//! This crate is the foundation depended on by all other vaultflat crates.
//! It provides:
//! - [`VaultflatError`] — the unified error type
//! - Domain types ([`Document`], [`FlattenSummary`], [`SkippedFile`])
//! - Configuration ([`AppConfig`], [`FlattenOptions`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, FlattenOptions, config_dir, config_file_path, init_config,
    load_config, load_config_from, validate_assets_dir,
};
pub use error::{FailureKind, Result, VaultflatError};
pub use types::{Document, FlattenSummary, SkippedFile};
