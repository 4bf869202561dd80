use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Card summary from the card list. The card number keys all detail
/// lookups; the PAN is the masked number shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "cardNumber")]
    pub card_number: String,
    pub pan: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-card detail. The balance is kept as a raw JSON number so it prints
/// exactly as the server sent it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDetail {
    #[serde(rename = "cardBalance")]
    pub card_balance: Number,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
