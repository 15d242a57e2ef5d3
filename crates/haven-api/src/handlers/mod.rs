//! Request handlers, one module per route family.

pub mod auth;
pub mod health;
pub mod invitation;
pub mod member;
