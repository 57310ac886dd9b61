//! Gateway double for unit tests

use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::provider::PixGateway;
use crate::payments::types::{
    ChargePayload, QrCodeResponse, WalletTransactionQuery, WalletTransactionResponse,
};
use async_trait::async_trait;

/// Answers every charge with `id_transaction` and every lookup with nothing.
pub struct StubGateway {
    pub configured: bool,
    pub id_transaction: Option<String>,
}

impl StubGateway {
    pub fn new() -> Self {
        Self {
            configured: true,
            id_transaction: Some("T1".to_string()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }
}

#[async_trait]
impl PixGateway for StubGateway {
    async fn request_qrcode(&self, _payload: &ChargePayload) -> PaymentResult<QrCodeResponse> {
        self.ensure_configured()?;
        Ok(QrCodeResponse {
            id_transaction: self.id_transaction.clone(),
            payment_code: Some("000201".to_string()),
            ..Default::default()
        })
    }

    async fn wallet_transaction(
        &self,
        _query: &WalletTransactionQuery,
    ) -> PaymentResult<WalletTransactionResponse> {
        self.ensure_configured()?;
        Ok(WalletTransactionResponse::default())
    }

    fn ensure_configured(&self) -> PaymentResult<()> {
        if self.configured {
            Ok(())
        } else {
            Err(PaymentError::ConfigurationError {
                message: "Missing environment variable: VSPI/VSPS".to_string(),
            })
        }
    }

    fn name(&self) -> &'static str {
        "Versell"
    }
}
