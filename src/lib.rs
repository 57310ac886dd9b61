//! PIX charge creation and payment-status reconciliation in front of the
//! Versell gateway.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod payments;
pub mod services;
