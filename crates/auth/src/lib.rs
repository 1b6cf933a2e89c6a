//! `stocktrail-auth` — authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: token
//! verification produces claims, claims produce a [`Principal`], and the
//! write policy is a pure check against an item's owner.

pub mod claims;
pub mod jwt;
pub mod policy;
pub mod principal;

pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use jwt::{Hs256JwtValidator, JwtValidator, TokenError};
pub use policy::{authorize_owner, AuthzError};
pub use principal::Principal;
