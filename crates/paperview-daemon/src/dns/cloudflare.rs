//! Cloudflare DNS records API (v4).

use std::net::IpAddr;
use std::time::Duration;

use paperview_core::config::DnsCredentials;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dns::{DnsError, DnsRecordApi};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct RecordEnvelope {
    result: Option<RecordContent>,
}

#[derive(Debug, Deserialize)]
struct RecordContent {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct RecordUpdate<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    content: String,
    ttl: u32,
    comment: String,
    proxied: bool,
}

/// One A record, addressed by zone and record id.
pub struct CloudflareClient {
    client: Client,
    api_base: String,
    credentials: DnsCredentials,
    ttl: u32,
}

impl CloudflareClient {
    pub fn new(
        api_base: impl Into<String>,
        credentials: DnsCredentials,
        ttl: u32,
    ) -> Result<Self, DnsError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DnsError::ClientBuildFailed {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            api_base: api_base.into(),
            credentials,
            ttl,
        })
    }

    pub fn domain(&self) -> &str {
        &self.credentials.domain
    }

    fn record_url(&self) -> String {
        format!(
            "{}/zones/{}/dns_records/{}",
            self.api_base.trim_end_matches('/'),
            self.credentials.zone_id,
            self.credentials.record_id
        )
    }
}

async fn check_status(response: Response) -> Result<Response, DnsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(DnsError::Status {
        status: status.as_u16(),
        message,
    })
}

fn update_comment() -> String {
    format!(
        "Updated by paperview on {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

impl DnsRecordApi for CloudflareClient {
    async fn current_address(&self) -> Result<IpAddr, DnsError> {
        let response = self
            .client
            .get(self.record_url())
            .bearer_auth(&self.credentials.api_token)
            .send()
            .await?;
        let envelope: RecordEnvelope = check_status(response).await?.json().await?;

        let content = envelope
            .result
            .and_then(|record| record.content)
            .ok_or(DnsError::MissingContent)?;
        debug!(event = "daemon.dns.record_read", content = %content);
        content
            .parse()
            .map_err(|_| DnsError::InvalidAddress { value: content })
    }

    async fn update_address(&self, ip: IpAddr) -> Result<(), DnsError> {
        let body = RecordUpdate {
            record_type: "A",
            name: &self.credentials.domain,
            content: ip.to_string(),
            ttl: self.ttl,
            comment: update_comment(),
            proxied: false,
        };
        let response = self
            .client
            .put(self.record_url())
            .bearer_auth(&self.credentials.api_token)
            .json(&body)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
