use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Account info returned by both login endpoints.
/// The `dni` is the key for every card listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub dni: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
