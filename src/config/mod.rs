//! Configuration
//!
//! Run configuration, shared type definitions, and error types.

pub mod types;
