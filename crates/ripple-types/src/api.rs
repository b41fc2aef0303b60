use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct DirectConversationRequest {
    pub participant_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupConversationRequest {
    pub participant_ids: Vec<Uuid>,
    pub group_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationCreatedResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageSentResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleReactionRequest {
    pub emoji: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleReactionResponse {
    pub added: bool,
}
