//! Score resolvers: map the distinct helpers of a record sequence to
//! reputation scores. Two variants share one output contract so the ranker
//! is interchangeable; the variant is fixed per deployment in config.

use crate::records::distinct_helpers;
use anyhow::Result;
use common::chain::ChainGatewayClient;
use common::model::{ModelError, ScoringModelClient};
use common::types::{Address, HelpRecord, LeaderboardEntry, Score};
use futures_util::future::join_all;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The score source did not answer. Rendered as "no data yet", never as
    /// a user-facing error.
    #[error("score source unavailable: {0}")]
    Unavailable(anyhow::Error),
    /// The score source answered with something that fails validation. Must
    /// never be coerced into default scores.
    #[error("scoring response failed validation: {0}")]
    InvalidResponse(String),
}

pub trait ScoreResolver {
    fn resolve(
        &self,
        records: &[HelpRecord],
    ) -> impl Future<Output = Result<Vec<LeaderboardEntry>, ResolveError>> + Send;
}

// ---------------------------------------------------------------------------
// Variant A: one on-chain reputation lookup per distinct helper.
// ---------------------------------------------------------------------------

pub trait ReputationLookup {
    fn reputation(&self, helper: &Address) -> impl Future<Output = Result<Score>> + Send;
}

impl ReputationLookup for Arc<ChainGatewayClient> {
    async fn reputation(&self, helper: &Address) -> Result<Score> {
        self.fetch_reputation(helper).await
    }
}

pub struct ChainResolver<L> {
    lookup: L,
}

impl<L: ReputationLookup + Sync> ChainResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }
}

impl<L: ReputationLookup + Sync> ScoreResolver for ChainResolver<L> {
    /// One independent lookup per helper, issued concurrently and joined.
    /// The contract returns 0 for an address it has never seen, so a missing
    /// score is data, not an error; a transport failure fails the whole run.
    async fn resolve(&self, records: &[HelpRecord]) -> Result<Vec<LeaderboardEntry>, ResolveError> {
        let helpers = distinct_helpers(records);
        let lookups = helpers.iter().map(|helper| self.lookup.reputation(helper));
        let results = join_all(lookups).await;

        let mut entries = Vec::with_capacity(helpers.len());
        for (address, result) in helpers.into_iter().zip(results) {
            let score = result.map_err(ResolveError::Unavailable)?;
            entries.push(LeaderboardEntry { address, score });
        }
        Ok(entries)
    }
}

// ---------------------------------------------------------------------------
// Variant B: one batched semantic scoring call over all records.
// ---------------------------------------------------------------------------

pub trait ScoringModel {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, ModelError>> + Send;
}

impl ScoringModel for ScoringModelClient {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        ScoringModelClient::complete(self, prompt).await
    }
}

pub struct ModelResolver<M> {
    model: M,
}

impl<M: ScoringModel + Sync> ModelResolver<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

impl<M: ScoringModel + Sync> ScoreResolver for ModelResolver<M> {
    async fn resolve(&self, records: &[HelpRecord]) -> Result<Vec<LeaderboardEntry>, ResolveError> {
        let helpers = distinct_helpers(records);
        if helpers.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = build_prompt(records);
        let text = self.model.complete(&prompt).await.map_err(|e| match e {
            ModelError::EmptyResponse => ResolveError::InvalidResponse(e.to_string()),
            other => ResolveError::Unavailable(other.into()),
        })?;
        parse_scored_leaderboard(&text, &helpers)
    }
}

/// Serialize the full (non-deduplicated) record sequence into the scoring
/// prompt. The helpfulness heuristic itself belongs to the model; our
/// contract is only the JSON shape demanded below.
fn build_prompt(records: &[HelpRecord]) -> String {
    let mut prompt = String::from(
        "You are evaluating the reputation of helpers based on their on-chain \
         acts of kindness.\n\n\
         Given the following help records, analyze the messages to determine \
         the helpfulness and impact of each helper's contribution. Consider \
         the clarity, usefulness, and positivity of each message.\n\n\
         Help Records:\n",
    );
    for record in records {
        prompt.push_str(&format!(
            "- Helper: {}, Recipient: {}, Message: {}\n",
            record.helper, record.recipient, record.message
        ));
    }
    prompt.push_str(
        "\nReturn ONLY a JSON array of leaderboard entries, one per distinct \
         helper, each of the form {\"address\": \"0x...\", \"reputationScore\": \
         <number>}. The reputation score must be a number between 0 and 100, \
         where 100 is the highest reputation.\n",
    );
    prompt
}

#[derive(Debug, Deserialize)]
struct ScoredEntry {
    address: Address,
    #[serde(rename = "reputationScore")]
    reputation_score: Decimal,
}

/// Strip markdown code fences models sometimes wrap JSON in.
fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Validate the model payload against the scoring schema and align it with
/// the distinct helper set:
/// - a score outside [0, 100] or a non-numeric score is a validation failure;
/// - an address outside the helper set is a validation failure (the ranking
///   must not contain synthetic entries);
/// - a helper the model omitted scores 0, with a warning (no helper is
///   silently dropped).
/// Output preserves helper first-seen order so tie-breaks stay stable.
fn parse_scored_leaderboard(
    text: &str,
    helpers: &[Address],
) -> Result<Vec<LeaderboardEntry>, ResolveError> {
    let scored: Vec<ScoredEntry> = serde_json::from_str(strip_code_blocks(text))
        .map_err(|e| ResolveError::InvalidResponse(format!("not a valid score array: {e}")))?;

    let mut scores: HashMap<Address, Score> = HashMap::with_capacity(scored.len());
    for entry in scored {
        if entry.reputation_score < Decimal::ZERO || entry.reputation_score > Decimal::ONE_HUNDRED {
            return Err(ResolveError::InvalidResponse(format!(
                "score {} for {} is outside [0, 100]",
                entry.reputation_score, entry.address
            )));
        }
        if !helpers.contains(&entry.address) {
            return Err(ResolveError::InvalidResponse(format!(
                "address {} is not a helper in the scored records",
                entry.address
            )));
        }
        scores.insert(entry.address, entry.reputation_score);
    }

    Ok(helpers
        .iter()
        .map(|helper| {
            let score = scores.get(helper).copied().unwrap_or_else(|| {
                warn!(helper = %helper, "model omitted helper from leaderboard, scoring 0");
                Decimal::ZERO
            });
            LeaderboardEntry {
                address: helper.clone(),
                score,
            }
        })
        .collect())
}

/// Deployment-selected resolver; see `[scoring] resolver` in config.
pub enum Resolver {
    Chain(ChainResolver<Arc<ChainGatewayClient>>),
    Model(ModelResolver<ScoringModelClient>),
}

impl ScoreResolver for Resolver {
    async fn resolve(&self, records: &[HelpRecord]) -> Result<Vec<LeaderboardEntry>, ResolveError> {
        match self {
            Self::Chain(r) => r.resolve(records).await,
            Self::Model(r) => r.resolve(records).await,
        }
    }
}
