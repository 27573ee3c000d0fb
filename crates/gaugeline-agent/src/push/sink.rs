//! Push transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use gaugeline_core::error::{GaugelineError, Result};

use crate::config::PushConfig;
use crate::push::encode::EncodedPayload;

/// Fixed client identifier sent with every push.
pub const USER_AGENT: &str = concat!("gaugeline/", env!("CARGO_PKG_VERSION"));

/// Response bodies are echoed into errors, capped at this many bytes.
const MAX_ERROR_BODY: usize = 512;

/// Destination of encoded payloads.
#[async_trait]
pub trait PushSink: Send + Sync {
    async fn send(&self, payload: &EncodedPayload) -> Result<()>;
}

/// HTTP POST with basic auth and a bounded timeout.
pub struct HttpSink {
    client: reqwest::Client,
    url: String,
    user: String,
    api_key: String,
}

impl HttpSink {
    pub fn new(url: String, user: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GaugelineError::Internal(format!("http client build failed: {e}")))?;
        Ok(Self {
            client,
            url,
            user,
            api_key,
        })
    }

    pub fn from_config(cfg: &PushConfig) -> Result<Self> {
        let url = cfg
            .url
            .clone()
            .ok_or_else(|| GaugelineError::Config("push.url is not set".into()))?;
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| GaugelineError::Config("push.api_key is not set".into()))?;
        Self::new(url, cfg.user.clone(), api_key, cfg.timeout())
    }
}

#[async_trait]
impl PushSink for HttpSink {
    async fn send(&self, payload: &EncodedPayload) -> Result<()> {
        let mut req = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, payload.content_type)
            .basic_auth(&self.user, Some(&self.api_key))
            .body(payload.body.clone());
        for (name, value) in &payload.headers {
            req = req.header(*name, *value);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| GaugelineError::Transmit(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = resp.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(GaugelineError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
