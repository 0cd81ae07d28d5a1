//! Razorpay REST client behind the [`PaymentGateway`] seam.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::orders::{
    GatewayError, GatewayOrder, GatewayOrderRequest, GatewayPayment, PaymentGateway, is_gateway_id,
};

use super::PaymentSettings;

#[derive(Debug, Clone)]
pub struct RazorpayClient {
    client: Client,
    base_url: Url,
    key_id: String,
    key_secret: String,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

impl RazorpayClient {
    pub fn new(settings: &PaymentSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("Could not build the payment gateway HTTP client.")?;

        // One trailing slash so joined paths land under the base path.
        let normalised = format!("{}/", settings.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .with_context(|| format!("Invalid payment gateway base URL '{}'.", settings.base_url))?;

        Ok(Self {
            client,
            base_url,
            key_id: settings.key_id.clone(),
            key_secret: settings.key_secret.clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, GatewayError> {
        self.base_url
            .join(path)
            .map_err(|err| GatewayError::InvalidResponse(format!("bad request path {path}: {err}")))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = request
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(|err| GatewayError::Unavailable(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| GatewayError::Unavailable(err.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorEnvelope>(&body)
                .map(|envelope| format!("{}: {}", envelope.error.code, envelope.error.description))
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|err| GatewayError::InvalidResponse(err.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder, GatewayError> {
        let url = self.url("v1/orders")?;
        debug!("Razorpay: creating order for receipt {}", request.receipt);
        self.send(self.client.post(url).json(request)).await
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        if !is_gateway_id(payment_id) {
            return Err(GatewayError::InvalidId(payment_id.to_owned()));
        }
        let mut url = self.url("v1/payments")?;
        url.path_segments_mut()
            .map_err(|()| GatewayError::InvalidResponse("base URL cannot take a path".to_owned()))?
            .push(payment_id);
        self.send(self.client.get(url)).await
    }
}

//-------------------------- Tests -------------------------------
