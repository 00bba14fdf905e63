//! # Floe Core
//!
//! Shared types for the floe configuration and bootstrap framework.
//!
//! This crate provides:
//! - [`ConfigTree`]: a nested mapping/sequence store with dotted-path
//!   get/set/merge
//! - [`CsvLine`]: a comma-separated-line scalar for schema models
//! - [`aws::Arn`]: an AWS ARN parser usable as a schema field type

pub mod aws;
pub mod tree;
pub mod types;

pub use tree::ConfigTree;
pub use types::CsvLine;
