pub mod api;
pub mod auth;
pub mod config;
pub mod core;
pub mod infrastructure;

pub use crate::core::errors::ReconcilioError;
pub use crate::core::services::ReconcilioService;

#[cfg(test)]
mod tests;
