use crate::config::{VersellConfig, VersellCredentials};
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::provider::PixGateway;
use crate::payments::types::{
    ChargePayload, QrCodeResponse, WalletTransactionQuery, WalletTransactionResponse,
};
use crate::payments::utils::PaymentHttpClient;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

const PROVIDER_NAME: &str = "Versell";

pub struct VersellProvider {
    config: VersellConfig,
    http: PaymentHttpClient,
}

impl VersellProvider {
    pub fn new(config: VersellConfig) -> PaymentResult<Self> {
        let http =
            PaymentHttpClient::new(PROVIDER_NAME, Duration::from_secs(config.timeout_secs))?;
        Ok(Self { config, http })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    fn credentials(&self) -> PaymentResult<VersellCredentials> {
        self.config
            .credentials()
            .map_err(|e| PaymentError::ConfigurationError {
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl PixGateway for VersellProvider {
    async fn request_qrcode(&self, payload: &ChargePayload) -> PaymentResult<QrCodeResponse> {
        let credentials = self.credentials()?;

        debug!(
            request_number = %payload.request_number,
            amount = %payload.amount,
            callback_url = ?payload.callback_url,
            "requesting PIX charge"
        );

        let response: QrCodeResponse = self
            .http
            .post_json(
                &self.endpoint("request-qrcode"),
                payload,
                &[
                    ("vspi", credentials.vspi.as_str()),
                    ("vsps", credentials.vsps.as_str()),
                ],
            )
            .await?;

        info!(
            request_number = %payload.request_number,
            id_transaction = ?response.id_transaction,
            "PIX charge created"
        );

        Ok(response)
    }

    async fn wallet_transaction(
        &self,
        query: &WalletTransactionQuery,
    ) -> PaymentResult<WalletTransactionResponse> {
        let credentials = self.credentials()?;

        self.http
            .post_json(
                &self.endpoint("walletTransaction"),
                query,
                &[
                    ("vspi", credentials.vspi.as_str()),
                    ("vsps", credentials.vsps.as_str()),
                ],
            )
            .await
    }

    fn ensure_configured(&self) -> PaymentResult<()> {
        self.credentials().map(|_| ())
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
