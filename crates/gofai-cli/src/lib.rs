//! GOFAI developer CLI
//!
//! Loads projects, references and selectors from JSON or YAML files and
//! runs them through the resolver. The `gofai` binary is a thin clap layer
//! over [`commands`].

#![warn(missing_docs)]

pub mod commands;
pub mod input;

pub use commands::Report;
