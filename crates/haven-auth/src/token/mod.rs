//! Access token encoding and the refresh token lifecycle.

pub mod claims;
pub mod codec;
pub mod service;

pub use claims::AccessClaims;
pub use codec::JwtCodec;
pub use service::{DeviceInfo, TokenPair, TokenService, opaque_token, token_digest};
