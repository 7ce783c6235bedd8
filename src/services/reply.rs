use serde::{Deserialize, Serialize};

use crate::models::SessionParams;

/// What a state-machine transition produced: the text to say, the full
/// parameter bag to echo back, and an optional page handoff.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub text: String,
    pub params: SessionParams,
    pub target_page: Option<String>,
}

impl TurnOutcome {
    pub fn new(text: impl Into<String>, params: SessionParams) -> Self {
        Self {
            text: text.into(),
            params,
            target_page: None,
        }
    }
}

// Wire shapes for the dialogue platform's fulfillment reply. This module
// is the only place the envelope is assembled, so format changes never
// reach the state machine.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookReply {
    #[serde(rename = "fulfillmentResponse")]
    pub fulfillment_response: FulfillmentResponse,
    #[serde(rename = "sessionInfo")]
    pub session_info: SessionInfo,
    #[serde(rename = "targetPage", skip_serializing_if = "Option::is_none")]
    pub target_page: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentResponse {
    pub messages: Vec<ReplyMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyMessage {
    pub text: ReplyText,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyText {
    pub text: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub parameters: SessionParams,
}

pub fn to_wire(outcome: TurnOutcome) -> WebhookReply {
    WebhookReply {
        fulfillment_response: FulfillmentResponse {
            messages: vec![ReplyMessage {
                text: ReplyText {
                    text: vec![outcome.text],
                },
            }],
        },
        session_info: SessionInfo {
            parameters: outcome.params,
        },
        target_page: outcome.target_page,
    }
}
