//! Test helpers shared across the workspace crates.
//!
//! - [`workspace`] creates throwaway directories holding configuration
//!   documents, manifests and legacy environment files.
//! - [`figment`] wraps `figment::Jail` for tests that layer settings over
//!   environment variables.

pub mod figment;
pub mod workspace;
