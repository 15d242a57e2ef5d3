//! # haven-auth
//!
//! Authentication and authorization for the Haven platform.
//!
//! ## Modules
//!
//! - `rbac`: the role catalog and per-assignment permission resolution
//! - `token`: JWT access tokens and rotated opaque refresh tokens
//! - `password`: Argon2id hashing and password policy enforcement
//! - `principal`: the authenticated caller handed to every handler
//! - `gate`: per-request principal assembly from a bearer token
//! - `access`: requirement-based authorization decisions

pub mod access;
pub mod gate;
pub mod password;
pub mod principal;
pub mod rbac;
pub mod token;

pub use access::{AccessRequirement, AccessResolver, ResourceRule};
pub use gate::{AuthenticationGate, GateOptions};
pub use password::{PasswordHasher, PasswordPolicy};
pub use principal::{Membership, Principal};
pub use rbac::{PermissionResolver, RoleCatalog};
pub use token::{AccessClaims, DeviceInfo, JwtCodec, TokenPair, TokenService};
