//! HTTP handlers for all API routes.

pub mod adjusted;
pub mod ranker;
pub mod system;
