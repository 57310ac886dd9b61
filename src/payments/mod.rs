//! Outbound PIX provider integration

pub mod amount;
pub mod error;
pub mod provider;
pub mod providers;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;
pub mod utils;

pub use error::{PaymentError, PaymentResult};
pub use provider::PixGateway;
pub use providers::VersellProvider;
