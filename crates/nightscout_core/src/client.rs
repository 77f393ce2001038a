//! Cliente HTTP da API `entries` do Nightscout.

use crate::config::AppConfig;
use crate::error::{FetchError, StartupError};
use crate::protocol::parse_entries;
use crate::types::{Entry, Unit};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::debug;

/// Fonte de leituras, mais recente primeiro.
pub trait EntrySource {
    fn fetch_entries(&self, count: usize) -> Result<Vec<Entry>, FetchError>;
}

/// Cliente síncrono: cada chamada bloqueia até resposta, erro ou timeout.
pub struct NightscoutClient {
    http: Client,
    entries_url: String,
    unit: Unit,
}

impl NightscoutClient {
    pub fn new(config: &AppConfig) -> Result<Self, StartupError> {
        let ns = &config.nightscout;

        let mut headers = HeaderMap::new();
        let secret = HeaderValue::from_str(&ns.api_secret_hash())
            .map_err(|e| StartupError::InvalidConfig(format!("API-Secret: {e}")))?;
        headers.insert("API-Secret", secret);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(ns.request_timeout_secs))
            .build()
            .map_err(StartupError::HttpClient)?;

        Ok(Self {
            http,
            entries_url: entries_url(&ns.base_url),
            unit: config.display.unit,
        })
    }

    pub fn entries_url(&self) -> &str {
        &self.entries_url
    }
}

impl EntrySource for NightscoutClient {
    fn fetch_entries(&self, count: usize) -> Result<Vec<Entry>, FetchError> {
        let response = self
            .http
            .get(&self.entries_url)
            .query(&[("count", count)])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.text()?;
        let entries = parse_entries(&body, self.unit);
        debug!("{} leituras recebidas (pedidas {count})", entries.len());

        if entries.is_empty() {
            return Err(FetchError::NoEntries);
        }
        Ok(entries)
    }
}

/// `<base>/entries`, tolerando base com ou sem barra final.
fn entries_url(base_url: &str) -> String {
    format!("{}/entries", base_url.trim().trim_end_matches('/'))
}
