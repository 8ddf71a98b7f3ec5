//! Canonical agent identifier.
//!
//! Format: `erc8004:<chainId>:<registryAddrLowercase>:<tokenId>`. Parsing is
//! total — a malformed string never panics, it returns `AgentIdParseError`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentId {
    chain_id: u64,
    registry_addr: String,
    token_id: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentIdParseError {
    #[error("expected 4 ':'-separated segments, found {0}")]
    WrongSegmentCount(usize),
    #[error("expected scheme 'erc8004', found '{0}'")]
    WrongScheme(String),
    #[error("chain id '{0}' is not a valid u64")]
    InvalidChainId(String),
    #[error("registry address must not be empty")]
    EmptyRegistryAddr,
    #[error("token id must not be empty")]
    EmptyTokenId,
}

impl AgentId {
    pub fn new(chain_id: u64, registry_addr: impl Into<String>, token_id: impl Into<String>) -> Self {
        Self {
            chain_id,
            registry_addr: registry_addr.into().to_lowercase(),
            token_id: token_id.into(),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn registry_addr(&self) -> &str {
        &self.registry_addr
    }

    pub fn token_id(&self) -> &str {
        &self.token_id
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "erc8004:{}:{}:{}", self.chain_id, self.registry_addr, self.token_id)
    }
}

impl FromStr for AgentId {
    type Err = AgentIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.splitn(4, ':').collect();
        if parts.len() != 4 {
            return Err(AgentIdParseError::WrongSegmentCount(parts.len()));
        }
        if parts[0] != "erc8004" {
            return Err(AgentIdParseError::WrongScheme(parts[0].to_string()));
        }
        let chain_id = parts[1]
            .parse::<u64>()
            .map_err(|_| AgentIdParseError::InvalidChainId(parts[1].to_string()))?;
        if parts[2].is_empty() {
            return Err(AgentIdParseError::EmptyRegistryAddr);
        }
        if parts[3].is_empty() {
            return Err(AgentIdParseError::EmptyTokenId);
        }
        Ok(Self {
            chain_id,
            registry_addr: parts[2].to_lowercase(),
            token_id: parts[3].to_string(),
        })
    }
}

impl TryFrom<String> for AgentId {
    type Error = AgentIdParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AgentId> for String {
    fn from(id: AgentId) -> Self {
        id.to_string()
    }
}
