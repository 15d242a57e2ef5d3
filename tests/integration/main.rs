//! End-to-end tests driving the full router over the in-memory stack.

mod helpers;

mod auth_flow_test;
mod invitation_flow_test;
mod membership_test;
