use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::{debug, warn};

use post_cockpit::assist::{
    coerce_ai_batch, coerce_ai_value, draft_system_prompt, draft_user_prompt, AiDraftText,
};
use post_cockpit::config::LlmConfig;
use post_cockpit::{Platform, SourceContext, Tone};

/// OpenAI-compatible chat client. The key is optional so local servers such as
/// Ollama work without one.
#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
    model: String,
    temperature: f64,
}

impl LlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, String> {
        let api_key = env::var("LLM_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| format!("failed to build http client: {}", err))?;
        Ok(Self {
            client,
            api_key,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn chat(&self, system: &str, user: &str) -> Result<String, String> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
        };

        let mut builder = self.client.post(url).json(&request);
        if let Some(key) = self.api_key.as_ref() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", key));
        }
        debug!(model = %self.model, "calling chat completion");
        let response = builder
            .send()
            .await
            .map_err(|err| format!("LLM request failed: {}", err))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let detail = error_body.trim();
            if detail.is_empty() {
                return Err(format!("LLM API error: {}", status));
            }
            return Err(format!("LLM API error: {} {}", status, detail));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| format!("LLM response parse failed: {}", err))?;

        let content = body
            .choices
            .first()
            .ok_or_else(|| "LLM response missing choices".to_string())?
            .message
            .content
            .trim()
            .to_string();
        if content.is_empty() {
            return Err("LLM returned empty text".to_string());
        }
        Ok(content)
    }

    /// Asks for `count` drafts and returns them coerced but not yet resolved.
    pub async fn draft_texts(
        &self,
        context: &SourceContext,
        platform: Platform,
        tone: Tone,
        count: usize,
        max_chars: usize,
    ) -> Result<Vec<AiDraftText>, String> {
        let user = draft_user_prompt(context, platform, tone, count, max_chars);
        let raw = self.chat(&draft_system_prompt(), &user).await?;
        let mut texts = coerce_ai_batch(&raw);
        if texts.len() > count {
            warn!(returned = texts.len(), count, "model returned extra drafts");
            texts.truncate(count);
        }
        Ok(texts)
    }
}

/// Last-chance repair for model output that was not usable as-is: digs the
/// outermost JSON object out of surrounding prose.
pub fn repair_ai_value(raw: &Value) -> Option<String> {
    let text = raw.as_str()?;
    let json = extract_json(text)?;
    let value: Value = serde_json::from_str(&json).ok()?;
    coerce_ai_value(value).ready()
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

fn extract_json(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }
    Some(text[start..=end].to_string())
}
