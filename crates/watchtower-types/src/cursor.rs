//! Per-`(chainId, registryAddr)` ingestion cursor.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub chain_id: u64,
    pub registry_addr: String,
    pub last_block: u64,
}

impl Cursor {
    pub fn floor(chain_id: u64, registry_addr: impl Into<String>) -> Self {
        Self {
            chain_id,
            registry_addr: registry_addr.into().to_lowercase(),
            last_block: 0,
        }
    }
}
