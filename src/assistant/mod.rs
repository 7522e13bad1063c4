//! AI helper used by the front-end for item descriptions and support chat.
//!
//! Failures here never reach the order engine; handlers turn them into a
//! degraded-mode reply.

pub mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_ITEM_PROMPT: &str = "Briefly describe this item for a delivery service. What is it, and are there any special handling instructions a delivery person should know?";
pub const CHAT_SYSTEM_INSTRUCTION: &str = "You are Smarty, a helpful and friendly chatbot for the Smart Porter delivery service. Your tone should be cheerful and professional. Keep your answers concise.";

pub const DISABLED_NOTICE: &str = "AI features are disabled. API key is missing.";
pub const DESCRIBE_FALLBACK: &str = "Error analyzing image. Please try again.";
pub const CHAT_FALLBACK: &str = "I'm having a little trouble thinking right now. Please try again later.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: Speaker,
    pub text: String,
}

/// Every error is `ExternalServiceUnavailable` carrying the notice to show.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn describe_item(
        &self,
        image_base64: &str,
        mime_type: &str,
        prompt: &str,
    ) -> Result<String, AppError>;

    async fn chat(&self, message: &str, history: &[ChatTurn]) -> Result<String, AppError>;
}
