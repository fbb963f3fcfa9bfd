//! `tollgate-core`: shared primitives for the credential kernel.
//!
//! This crate contains **pure** building blocks (no I/O, no crypto).

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AuthError, AuthResult};
pub use id::PrincipalId;
