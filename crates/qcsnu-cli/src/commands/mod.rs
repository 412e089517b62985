//! CLI command implementations.

pub mod auth;
pub mod backends;
pub mod cancel;
pub mod common;
pub mod result;
pub mod run;
pub mod status;
pub mod submit;
pub mod version;
pub mod wait;
