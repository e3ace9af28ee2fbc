//! Core library for Questlines.
//!
//! This crate provides the questline models and the aggregate repository
//! backed by SQLite, independent of any transport layer.
//!
//! # Usage
//!
//! ```no_run
//! use questlines_core::db::Database;
//! use questlines_core::models::*;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let created = db.create_questline(&QuestlineInput {
//!     id: None,
//!     name: "Intro".into(),
//!     quests: vec![],
//!     dependencies: vec![],
//! })?;
//! let summaries = db.list_questline_infos()?;
//! assert!(summaries.iter().any(|info| info.id == created.id));
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod db;
pub mod error;
pub mod models;

// Re-export commonly used types at crate root
pub use db::Database;
pub use error::StoreError;
