use crate::error::BridgeError;
use crate::{ActionDispatch, DispatchOutcome, DispatchRequest, LedgerBridge};
use async_trait::async_trait;
use core_types::{AuditEvent, Quote};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;

/// A concrete implementation of the capability traits against the ledger
/// bridge's local HTTP surface.
///
/// Every endpoint answers with the bridge's uniform envelope:
/// `{"ok": bool, ..., "error": "..."}`. A transport problem surfaces as
/// `BridgeError::Request`; an `ok = false` envelope becomes `BridgeError::Api`
/// on the read endpoints and a plain rejected outcome on dispatch.
#[derive(Clone)]
pub struct LedgerClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChangesEnvelope {
    ok: bool,
    #[serde(default)]
    entries: Vec<AuditEvent>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SymbolsEnvelope {
    ok: bool,
    #[serde(default)]
    symbols: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    ok: bool,
    #[serde(default)]
    quote: Option<Quote>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthEnvelope {
    ok: bool,
}

impl LedgerClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Lightweight liveness probe; the host polls this to decide whether the
    /// bridge is running at all.
    pub async fn health(&self) -> Result<bool, BridgeError> {
        let envelope: HealthEnvelope = self.get("/health", &[]).await?;
        Ok(envelope.ok)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BridgeError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            // The bridge still ships its envelope on error statuses; prefer
            // its message over the bare status code.
            let message = serde_json::from_str::<DispatchOutcome>(&text)
                .ok()
                .and_then(|o| o.error)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(BridgeError::Api(message));
        }
        serde_json::from_str::<T>(&text).map_err(|e| BridgeError::Deserialization(e.to_string()))
    }
}

#[async_trait]
impl ActionDispatch for LedgerClient {
    async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchOutcome, BridgeError> {
        let url = format!("{}/dispatch", self.base_url);
        tracing::debug!(action = %request.action_id, request_id = %request.request_id, "Dispatching action.");
        let response = self.client.post(&url).json(&request).send().await?;
        let text = response.text().await?;
        serde_json::from_str::<DispatchOutcome>(&text)
            .map_err(|e| BridgeError::Deserialization(e.to_string()))
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[async_trait]
impl LedgerBridge for LedgerClient {
    async fn list_changes(&self, limit: u64) -> Result<Vec<AuditEvent>, BridgeError> {
        let envelope: ChangesEnvelope = self
            .get("/changes", &[("limit", limit.to_string())])
            .await?;
        if !envelope.ok {
            return Err(BridgeError::Api(
                envelope.error.unwrap_or_else(|| "changes unavailable".to_string()),
            ));
        }
        Ok(envelope.entries)
    }

    async fn list_symbols(&self, query: &str, limit: u64) -> Result<Vec<String>, BridgeError> {
        let envelope: SymbolsEnvelope = self
            .get(
                "/symbols",
                &[
                    ("query", query.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        if !envelope.ok {
            return Err(BridgeError::Api(
                envelope.error.unwrap_or_else(|| "symbols unavailable".to_string()),
            ));
        }
        Ok(envelope.symbols)
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, BridgeError> {
        let envelope: QuoteEnvelope = self
            .get("/quote", &[("symbol", symbol.to_string())])
            .await?;
        match envelope.quote {
            Some(quote) if envelope.ok => Ok(quote.with_derived_fields()),
            _ => Err(BridgeError::Api(
                envelope.error.unwrap_or_else(|| "quote unavailable".to_string()),
            )),
        }
    }
}
