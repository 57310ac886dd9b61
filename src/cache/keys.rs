//! Type-safe store key builders

use std::fmt;

pub const VERSION: &str = "v1";

pub mod versell {
    use super::*;

    pub const NAMESPACE: &str = "versell";

    /// Key of the status table, addressed by request number.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct StatusKey {
        pub request_number: String,
    }

    impl StatusKey {
        pub fn new(request_number: impl Into<String>) -> Self {
            Self {
                request_number: request_number.into(),
            }
        }
    }

    impl fmt::Display for StatusKey {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "{}:{}:status:{}",
                VERSION, NAMESPACE, self.request_number
            )
        }
    }

    /// Key of the transaction-id index, addressed by provider transaction id.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct TransactionMapKey {
        pub id_transaction: String,
    }

    impl TransactionMapKey {
        pub fn new(id_transaction: impl Into<String>) -> Self {
            Self {
                id_transaction: id_transaction.into(),
            }
        }
    }

    impl fmt::Display for TransactionMapKey {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}:{}:map:{}", VERSION, NAMESPACE, self.id_transaction)
        }
    }
}

pub mod health {
    /// Probe key written by readiness checks
    pub const PROBE: &str = "v1:health:probe";
}
