//! State module for tracking operation progress
//!
//! # Components
//!
//! - `LoginStep`: labels the steps of the login handshake (used in errors and logs)
//! - `FetchState`: the report fetch state machine

mod fetch_state;
mod login_step;

// Re-export main types
pub use fetch_state::FetchState;
pub use login_step::LoginStep;
