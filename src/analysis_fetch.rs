use std::time::Duration;

use anyhow::{Context, Result, bail};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::analysis::{AnalysisSource, RichResponse};
use crate::feed::opt_env;

const DEFAULT_TIMEOUT_SECS: u64 = 20;

static CLIENT: OnceCell<Client> = OnceCell::new();

fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        let timeout = opt_env("PANEL_HTTP_TIMEOUT_SECS")
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .context("failed to build http client")
    })
}

// Adapter from the internal analysis endpoints to the cache's source
// contract. A non-success rich status is data (status + no payload),
// not a transport error, so the cache can drive the fallback itself.
pub struct EndpointSource {
    base_url: String,
}

impl EndpointSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    pub fn from_env() -> Option<Self> {
        opt_env("PANEL_ANALYSIS_BASE_URL").map(Self::new)
    }
}

impl AnalysisSource for EndpointSource {
    fn fetch_rich(&self, match_id: &str) -> Result<RichResponse> {
        let client = http_client()?;
        let url = format!("{}/api/analysis/{match_id}", self.base_url);
        let resp = client.get(&url).send().context("analysis request failed")?;
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            return Ok(RichResponse {
                status,
                payload: None,
            });
        }
        let payload = resp.json::<Value>().context("invalid analysis json")?;
        Ok(RichResponse {
            status,
            payload: Some(payload),
        })
    }

    fn fetch_light(&self, match_id: &str) -> Result<Value> {
        let client = http_client()?;
        let url = format!("{}/api/preview/{match_id}", self.base_url);
        let resp = client.get(&url).send().context("preview request failed")?;
        let status = resp.status();
        if !status.is_success() {
            bail!("preview endpoint returned http {status}");
        }
        resp.json::<Value>().context("invalid preview json")
    }
}
