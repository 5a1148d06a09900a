// src/core/mod.rs

// Scan engine: target handling, auditor execution, resource-aware scheduling
// and scoring. Nothing in here knows about the terminal UI.

/// Worker-count policy derived from host resource snapshots.
pub mod advisor;

/// Scores findings and folds task outcomes into a `RunReport`.
pub mod aggregator;

/// Runs all targets under an adaptive concurrency bound.
pub mod coordinator;

pub mod error;

/// Lookup tables for protocols and known vulnerabilities.
pub mod knowledge_base;

/// Data structures shared by the engine, the UI and the JSON export.
pub mod models;

/// Host CPU and memory sampling.
pub mod monitor;

/// Parses the auditor's JSON findings files.
pub mod parser;

/// Runs the external auditor for one target.
pub mod runner;

/// Target input parsing, normalization and validation.
pub mod targets;
