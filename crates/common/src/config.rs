use anyhow::Result;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub general: General,
    pub chain: Chain,
    pub records: Records,
    pub scoring: Scoring,
    pub model: Model,
    pub observability: Observability,
    pub web: Option<Web>,
}

#[derive(Debug, Deserialize)]
pub struct General {
    pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Chain {
    pub gateway_url: String,
    pub contract_address: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
}

/// Where help records come from: the contract's full list, or the built-in
/// sample set (useful for demos and for exercising the model resolver
/// without a chain).
#[derive(Debug, Deserialize)]
pub struct Records {
    pub source: RecordSourceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSourceKind {
    Chain,
    Sample,
}

/// Deployment-time resolver selection. One variant per deployment; the
/// pipeline never branches per call.
#[derive(Debug, Deserialize)]
pub struct Scoring {
    pub resolver: ResolverKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    Chain,
    Model,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Model {
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct Observability {
    pub prometheus_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Web {
    pub port: u16,
    pub host: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let content = std::fs::read_to_string("config/default.toml")?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}
