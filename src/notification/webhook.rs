//! Shared HTTP plumbing for the webhook-style channels.

use super::DeliveryError;
use crate::core::Channel;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, warn};

/// POSTs `payload` as JSON to `url`.
pub(crate) async fn post_json(
    client: &Client,
    channel: Channel,
    url: &str,
    payload: &Value,
) -> Result<(), DeliveryError> {
    let response = client.post(url).json(payload).send().await.map_err(|e| {
        warn!(%channel, error = %e, "HTTP request failed");
        DeliveryError::from(e)
    })?;
    check_response(channel, response).await
}

/// Turns a non-2xx response into [`DeliveryError::Status`], logging the body.
pub(crate) async fn check_response(channel: Channel, response: Response) -> Result<(), DeliveryError> {
    let status = response.status();
    if status.is_success() {
        debug!(%channel, status = %status, "Channel accepted notification");
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    warn!(
        %channel,
        status = %status,
        body = %body,
        "Channel rejected notification"
    );
    Err(DeliveryError::Status { status, body })
}
