//! Core types shared across ontogov facilities
//!
//! This crate provides the small set of types used by both the error facility
//! and the logging facility of `ontogov-core`:
//!
//! - **Correlation types**: RequestId, TraceId, RequestContext
//! - **Schema constants**: Canonical structured-logging field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{RequestContext, RequestId, TraceId};
