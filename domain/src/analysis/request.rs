//! Analysis request value object

use crate::core::error::AnalysisError;
use crate::core::ids::ConversationId;
use serde::{Deserialize, Serialize};

/// A symptom analysis request (Value Object)
///
/// Submitted once per user message. Fields are private so a request can
/// only exist in validated form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    symptom_text: String,
    conversation_id: ConversationId,
}

impl AnalysisRequest {
    /// Create a request, rejecting empty symptom text or conversation id.
    pub fn new(
        symptom_text: impl Into<String>,
        conversation_id: impl Into<ConversationId>,
    ) -> Result<Self, AnalysisError> {
        let symptom_text = symptom_text.into();
        let conversation_id = conversation_id.into();

        if symptom_text.trim().is_empty() {
            return Err(AnalysisError::InvalidRequest(
                "symptom text cannot be empty".to_string(),
            ));
        }
        if conversation_id.is_empty() {
            return Err(AnalysisError::InvalidRequest(
                "conversation id cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            symptom_text,
            conversation_id,
        })
    }

    pub fn symptom_text(&self) -> &str {
        &self.symptom_text
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }
}
