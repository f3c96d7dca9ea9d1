//! Controller module for podset-operator.
//!
//! Contains the reconciliation loop, the pure scaling and status logic it
//! drives, error handling, and the shared context.

pub mod context;
pub mod error;
pub mod reconciler;
pub mod scale;
pub mod status;
