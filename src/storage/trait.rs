use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Acknowledgement returned by a successful insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub rows_affected: u64,
}

impl Ack {
    pub fn single() -> Self {
        Self { rows_affected: 1 }
    }
}

/// Remote store that only ever receives inserts
#[async_trait]
pub trait AppendOnlyStore: Send + Sync {
    /// Append `record` (a JSON object) to `table`
    async fn insert(&self, table: &str, record: serde_json::Value) -> Result<Ack>;

    /// Short name for traces
    fn name(&self) -> &str;
}
