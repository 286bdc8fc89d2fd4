//! Extension for mapping foreign errors into [`ZccResult`] concisely.
//!
//! Replaces repetitive `.map_err(|e| Arc::new(ZccError::from(e)))` chains.
//!
//! # Examples
//!
//! ```
//! use zcc_core::{ZccResult, ZccResultExt};
//!
//! fn encode() -> ZccResult<serde_json::Value> {
//!     serde_json::to_value(8080).into_zcc()
//! }
//! # assert!(encode().is_ok());
//! ```

use crate::{ZccError, ZccResult};
use std::sync::Arc;

/// Generic extension for `Result<T, E>` where `E: Into<ZccError>`.
pub trait ZccResultExt<T, E> {
    /// Convert `Result<T, E>` into `ZccResult<T>`.
    ///
    /// # Errors
    ///
    /// Propagates the original error after conversion into `Arc<ZccError>`.
    fn into_zcc(self) -> ZccResult<T>;
}

impl<T, E> ZccResultExt<T, E> for Result<T, E>
where
    E: Into<ZccError>,
{
    fn into_zcc(self) -> ZccResult<T> {
        self.map_err(|e| Arc::new(e.into()))
    }
}
