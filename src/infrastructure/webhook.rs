use crate::domain::notification::Notification;
use crate::domain::ports::DeliveryClient;
use crate::error::{Result, SimError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Delivers notifications as JSON `POST` requests.
///
/// Every call is bounded by the client-wide timeout. Any non-2xx answer counts as a
/// failed delivery; the response body is ignored.
#[derive(Clone)]
pub struct HttpDeliveryClient {
    client: Client,
}

impl HttpDeliveryClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DeliveryClient for HttpDeliveryClient {
    async fn deliver(&self, callback_uri: &str, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .post(callback_uri)
            .json(notification)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SimError::Delivery {
                uri: callback_uri.to_string(),
                reason: format!("callback answered {status}"),
            });
        }
        Ok(())
    }
}
