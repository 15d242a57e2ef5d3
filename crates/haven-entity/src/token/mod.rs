//! Persisted token entities: refresh tokens and password reset tokens.

pub mod refresh;
pub mod reset;

pub use refresh::RefreshTokenRecord;
pub use reset::PasswordResetToken;
