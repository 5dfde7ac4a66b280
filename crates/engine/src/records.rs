//! Record sources: where a pipeline run gets its sequence of help records.

use anyhow::Result;
use common::chain::ChainGatewayClient;
use common::types::{Address, HelpRecord};
use std::future::Future;
use std::sync::Arc;

pub trait RecordSource {
    fn fetch_records(&self) -> impl Future<Output = Result<Vec<HelpRecord>>> + Send;
}

/// Chain-backed source: the contract's full record list via the gateway,
/// in on-chain insertion order.
pub struct ChainRecordSource {
    client: Arc<ChainGatewayClient>,
}

impl ChainRecordSource {
    pub fn new(client: Arc<ChainGatewayClient>) -> Self {
        Self { client }
    }
}

impl RecordSource for ChainRecordSource {
    async fn fetch_records(&self) -> Result<Vec<HelpRecord>> {
        self.client.fetch_all_records().await
    }
}

/// Fixed four-record sample set. Lets the dashboard and the model resolver
/// run without a chain; also the demo dataset.
pub struct SampleRecordSource;

const SAMPLE_ALICE: &str = "0x1231a7f52c9e84b06dd3f18a40c5be97620d84e5";
const SAMPLE_BOB: &str = "0x4560c3d9e17fb82a45c896e01db32f7a8c94d1b6";
const SAMPLE_CAROL: &str = "0x789f4e21ab6d093c57e8120fd4a6b98c3175ce04";
const SAMPLE_DAVE: &str = "0xabc83b60f2d47e19c05a3d784eb921f60c48a7d3";
const SAMPLE_ERIN: &str = "0xdef1906cc24a85b3f7e06d912ac840b57391fe82";

fn sample_record(helper: &str, recipient: &str, message: &str) -> HelpRecord {
    HelpRecord {
        helper: helper.parse().expect("sample helper address is valid"),
        recipient: recipient.parse().expect("sample recipient address is valid"),
        message: message.to_string(),
        timestamp: None,
    }
}

pub fn sample_records() -> Vec<HelpRecord> {
    vec![
        sample_record(
            SAMPLE_ALICE,
            SAMPLE_BOB,
            "Provided guidance on smart contract deployment.",
        ),
        sample_record(
            SAMPLE_CAROL,
            SAMPLE_DAVE,
            "Assisted with debugging a critical bug.",
        ),
        sample_record(
            SAMPLE_ALICE,
            SAMPLE_ERIN,
            "Shared helpful resources for learning Solidity.",
        ),
        sample_record(
            SAMPLE_BOB,
            SAMPLE_CAROL,
            "Explained gas optimization techniques.",
        ),
    ]
}

impl RecordSource for SampleRecordSource {
    async fn fetch_records(&self) -> Result<Vec<HelpRecord>> {
        Ok(sample_records())
    }
}

/// Deployment-selected source; see `[records] source` in config.
pub enum Source {
    Chain(ChainRecordSource),
    Sample(SampleRecordSource),
}

impl RecordSource for Source {
    async fn fetch_records(&self) -> Result<Vec<HelpRecord>> {
        match self {
            Self::Chain(s) => s.fetch_records().await,
            Self::Sample(s) => s.fetch_records().await,
        }
    }
}

/// Distinct helper addresses in first-seen order. `Address` is already
/// case-normalized, so this is exact-equality dedup.
pub fn distinct_helpers(records: &[HelpRecord]) -> Vec<Address> {
    let mut seen = Vec::new();
    for record in records {
        if !seen.contains(&record.helper) {
            seen.push(record.helper.clone());
        }
    }
    seen
}
