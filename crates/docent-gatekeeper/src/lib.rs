//! Docent Gatekeeper
//!
//! Checks every query descriptor against the schema contract before it can
//! reach a data store.
//!
//! The Contract Guard rejects:
//! - Collections outside the contract
//! - Field names the contract does not declare (fields created by earlier
//!   pipeline stages are tracked and allowed)
//! - Write stages (`$out`, `$merge`)
//! - Cross-collection stages that leave the contract
//!
//! # Examples
//!
//! ```
//! use docent_domain::{QueryDescriptor, SchemaContract};
//! use docent_gatekeeper::{ContractGuard, ContractViolation, GuardConfig};
//!
//! let guard = ContractGuard::new(SchemaContract::standard(), GuardConfig::default());
//!
//! assert!(guard.check(&QueryDescriptor::new("teams")).is_ok());
//! assert!(matches!(
//!     guard.check(&QueryDescriptor::new("users")),
//!     Err(ContractViolation::UnknownCollection { .. })
//! ));
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod validator;

pub use config::GuardConfig;
pub use error::{ContractViolation, GatekeeperError};
pub use validator::{ContractGuard, GuardReport, GuardStatus};
