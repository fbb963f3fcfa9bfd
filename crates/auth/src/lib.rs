//! `tollgate-auth`: credential and access-control kernel.
//!
//! Password verification, signed token issuance/verification, and the
//! role/capability decision. Decoupled from HTTP and from any concrete
//! storage engine: persistence sits behind [`CredentialStore`].

pub mod authenticate;
pub mod authorize;
pub mod claims;
pub mod config;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod registrar;
pub mod roles;
pub mod store;
pub mod token;

pub use authenticate::{AuthnError, Authenticator};
pub use authorize::{AuthzError, Authorizer, bearer_token};
pub use claims::{Claims, TokenValidationError, validate_claims};
pub use config::{AuthConfig, ConfigError, HashParams};
pub use password::{HashError, PasswordHasher};
pub use permissions::{Action, Capability, Decision, PermissionTable, Scope};
pub use principal::{NewPrincipal, Principal, PrincipalPatch, PrincipalProfile};
pub use registrar::Registrar;
pub use roles::Role;
pub use store::{CredentialStore, InMemoryCredentialStore, StoreError};
pub use token::{TokenError, TokenService};

pub use tollgate_core::{AuthError, AuthResult, Clock, ManualClock, PrincipalId, SystemClock};
