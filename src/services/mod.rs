//! Services module for business logic and integrations

pub mod payment_initiation;
pub mod status_query;
pub mod status_repository;
pub mod webhook_processor;

pub use payment_initiation::{ChargeRequest, ChargeResponse, PaymentInitiationService};
pub use status_query::{PolledStatus, StatusQueryService};
pub use status_repository::{MappingIntegrity, StatusRepository};
pub use webhook_processor::{WebhookOutcome, WebhookProcessor};
