use crate::payments::error::PaymentResult;
use crate::payments::types::{
    ChargePayload, QrCodeResponse, WalletTransactionQuery, WalletTransactionResponse,
};
use async_trait::async_trait;

/// Outbound side of a PIX provider.
#[async_trait]
pub trait PixGateway: Send + Sync {
    /// Create a charge and return its scannable code.
    async fn request_qrcode(&self, payload: &ChargePayload) -> PaymentResult<QrCodeResponse>;

    /// Look a transaction up by any of the identifiers set on `query`.
    async fn wallet_transaction(
        &self,
        query: &WalletTransactionQuery,
    ) -> PaymentResult<WalletTransactionResponse>;

    /// Fails with a configuration error when credentials are absent.
    fn ensure_configured(&self) -> PaymentResult<()>;

    fn name(&self) -> &'static str;
}
