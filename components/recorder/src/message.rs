use chrono::{DateTime, Utc};

pub(crate) type MessageId = String;

/// One delivered chat message, as the host hands it over: csv columns
/// `id`, `received`, `text`.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct InboundMessage {
    #[serde(rename = "id")]
    pub(crate) message_id: MessageId,
    #[serde(rename = "received")]
    pub(crate) received_at: DateTime<Utc>,
    pub(crate) text: String,
}
