//! # docket-core
//!
//! Shared foundation for the docket matter-analysis backend: identity
//! newtypes, the domain model, the error taxonomy, configuration, the
//! namespace guard (C1), and the external-interface traits every other
//! crate programs against instead of a concrete backend.

pub mod config;
pub mod errors;
pub mod guard;
pub mod ids;
pub mod models;
pub mod traits;

pub use config::DocketConfig;
pub use errors::{DocketError, DocketResult, ErrorKind};
pub use guard::NamespaceGuard;
