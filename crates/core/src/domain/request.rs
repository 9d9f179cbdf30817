use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::states::RequestState;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub id: RequestId,
    pub title: String,
    pub requester_id: String,
    pub status: RequestState,
    /// Canonical condition text naming who may act next.
    #[serde(default)]
    pub next_condition: String,
    pub created_at: DateTime<Utc>,
}

/// One applied edge, as handed to the request store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub request_id: RequestId,
    pub from: RequestState,
    pub to: RequestState,
    pub actor_id: String,
    pub note: Option<String>,
    pub next_condition: String,
    pub recorded_at: DateTime<Utc>,
}
