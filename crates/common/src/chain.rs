//! HTTP client for the chain gateway fronting the KindnessChain contract.
//! The gateway decodes contract state to JSON and handles signing and
//! broadcast for `giveHelp`; this client never touches ABI bytes itself.

use crate::types::{Address, HelpRecord, Score, SubmissionStatus};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct ChainGatewayClient {
    http: reqwest::Client,
    gateway_url: String,
    contract_address: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PendingTx {
    #[serde(rename = "txHash")]
    pub tx_hash: String,
}

#[derive(Debug, Serialize)]
struct GiveHelpBody<'a> {
    recipient: &'a Address,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReputationResponse {
    /// The gateway serializes the contract's unsigned big integer as a
    /// string; parse it into `Decimal` so large reputations keep full
    /// precision.
    #[serde(with = "rust_decimal::serde::str")]
    reputation: Score,
}

#[derive(Debug, Deserialize)]
struct TxStatusResponse {
    status: String,
    reason: Option<String>,
}

impl ChainGatewayClient {
    pub fn new(
        gateway_url: &str,
        contract_address: Address,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            contract_address,
        })
    }

    pub fn contract_address(&self) -> &Address {
        &self.contract_address
    }

    pub fn records_url(&self) -> String {
        format!(
            "{}/contracts/{}/records",
            self.gateway_url, self.contract_address
        )
    }

    pub fn reputation_url(&self, helper: &Address) -> String {
        format!(
            "{}/contracts/{}/reputation/{}",
            self.gateway_url, self.contract_address, helper
        )
    }

    pub fn help_url(&self) -> String {
        format!(
            "{}/contracts/{}/help",
            self.gateway_url, self.contract_address
        )
    }

    pub fn transaction_url(&self, tx_hash: &str) -> String {
        format!("{}/transactions/{}", self.gateway_url, tx_hash)
    }

    /// Full record list in on-chain insertion order.
    pub async fn fetch_all_records(&self) -> Result<Vec<HelpRecord>> {
        let body = self.get_text(&self.records_url()).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Cumulative reputation for one helper. The contract returns 0 for an
    /// address that never helped; the gateway passes that through.
    pub async fn fetch_reputation(&self, helper: &Address) -> Result<Score> {
        let body = self.get_text(&self.reputation_url(helper)).await?;
        let parsed: ReputationResponse = serde_json::from_str(&body)?;
        Ok(parsed.reputation)
    }

    /// Submit `giveHelp(recipient, message)` for signing and broadcast.
    /// Returns the transaction hash to poll for confirmation.
    pub async fn give_help(&self, recipient: &Address, message: &str) -> Result<PendingTx> {
        metrics::counter!("gateway_requests_total").increment(1);
        let response = self
            .http
            .post(self.help_url())
            .json(&GiveHelpBody { recipient, message })
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("gateway rejected giveHelp ({status}): {body}"));
        }
        Ok(response.json().await?)
    }

    pub async fn transaction_status(&self, tx_hash: &str) -> Result<SubmissionStatus> {
        let body = self.get_text(&self.transaction_url(tx_hash)).await?;
        let parsed: TxStatusResponse = serde_json::from_str(&body)?;
        parse_tx_status(&parsed.status, parsed.reason)
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        metrics::counter!("gateway_requests_total").increment(1);
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("gateway error ({status}): {body}"));
        }
        Ok(response.text().await?)
    }
}

fn parse_tx_status(status: &str, reason: Option<String>) -> Result<SubmissionStatus> {
    match status {
        "pending_signature" => Ok(SubmissionStatus::PendingSignature),
        "confirming" => Ok(SubmissionStatus::Confirming),
        "confirmed" => Ok(SubmissionStatus::Confirmed),
        "failed" => Ok(SubmissionStatus::Failed {
            reason: reason.unwrap_or_else(|| "transaction failed".to_string()),
        }),
        other => Err(anyhow!("unknown transaction status: {other}")),
    }
}
