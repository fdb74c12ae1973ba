//! erp-conform core library.
//!
//! Validates an ERP microservice project tree against the layered module
//! standard and produces a deterministic report.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `scan`: Read-only tree scanner.
//! - `parse`: Readers for sources, model declarations and migrations.
//! - `build`: Structural model builder.
//! - `rules`: Rule registry and the parallel rule engine.
//! - `parity`: Schema/migration parity and migration naming.
//! - `report`: Deduplication, ordering and module completion.
//! - `lint`: The validation pipeline.
//! - `output`: Text/JSON renderers.
//! - `models`: Data models shared across stages.
//! - `error`: Fatal and per-rule error types.
//! - `utils`: Supporting helpers.
pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod lint;
pub mod models;
pub mod output;
pub mod parity;
pub mod parse;
pub mod report;
pub mod rules;
pub mod scan;
pub mod utils;
