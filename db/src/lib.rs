//! # Database Configuration
//!
//! Typed database config schemas and the registry that turns raw config
//! sub-trees into connection clients.
//!
//! A database section is a mapping with a `type` discriminator. The
//! registry dispatches on that discriminator to a registered schema,
//! validates the section against it and hands back a [`DatabaseConfig`]
//! that can initialize its client. Registration is explicit; nothing is
//! picked up as an import side effect.

pub mod redis;
pub mod registry;
pub mod sql;

pub use redis::{RedisDbConfig, RedisNode};
pub use registry::{DatabaseConfig, DbClient, DbConfigRegistry};
pub use sql::{SqlDbConfig, SqlEngine};
