//! # Lifespan Context
//!
//! Named resources initialized from config at application startup and torn
//! down at shutdown.
//!
//! Fields are declared up front, each bound to a config sub-tree by key.
//! [`LifespanContext::configure`] runs every initializer exactly once;
//! [`LifespanContext::terminate`] tears everything down, continuing past
//! individual failures and aggregating them.

pub mod lifespan;

pub use lifespan::{ContextField, ContextResource, LifespanContext};
