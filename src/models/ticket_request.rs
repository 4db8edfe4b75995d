use serde::Deserialize;
use serde_json::Value;

/// Form payload submitted from the Teams app when a case is created.
/// Every field is optional on the wire; the payload builder renders missing
/// text as empty strings.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct TicketRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Person who clicked "Create case", usually an email address
    #[serde(default)]
    pub manager: Option<String>,
    /// Original sender of the selected messages
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
}

/// A single Teams message the agent selected.
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct Message {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
}

impl TicketRequest {
    pub fn message_count(&self) -> usize {
        self.messages.as_ref().map_or(0, Vec::len)
    }
}

/// Parses the inbound body, reporting the offending path on failure
/// (e.g. `messages[2].sender: invalid type: integer`).
pub fn parse_ticket_request(payload: Value) -> Result<TicketRequest, String> {
    serde_path_to_error::deserialize(payload).map_err(|e| e.to_string())
}
