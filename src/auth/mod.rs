//! The access-control core: credential verification, token lifecycle and
//! the embed authorization decision. Everything here is deliberately free of
//! HTTP concerns so each contract is testable on its own.

pub mod authorize;
pub mod credentials;
pub mod tokens;

pub use authorize::{Deny, authorize};
pub use credentials::CredentialError;
pub use tokens::{SessionClaims, TokenError, TokenService};
