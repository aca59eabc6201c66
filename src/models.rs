use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// What the client asked for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestRecord {
    pub client: String,
    pub method: String,
    pub path: String,
    pub received_at: DateTime<Utc>,
}

// What the client got back
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseRecord {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub completed_at: DateTime<Utc>,
}

// Persistence job - one finished exchange waiting for the sink
#[derive(Debug, Clone)]
pub struct PersistJob {
    pub request: RequestRecord,
    pub response: ResponseRecord,
}
