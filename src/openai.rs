use crate::config::Config;
use crate::validator::TranslationValidator;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Per-request transport timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// One string to translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationRequest<'a> {
    pub text: &'a str,
    pub source_language: &'a str,
    pub target_language: &'a str,
    /// Developer comment from the catalog, if any
    pub context: Option<&'a str>,
}

/// Something that can translate a single string.
///
/// The batch translator only talks to this trait, so tests can swap the
/// remote model for a scripted implementation.
pub trait Translate {
    fn translate(&self, request: TranslationRequest<'_>) -> impl Future<Output = Result<String>> + Send;
}

/// OpenAI Chat Completion request
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Check if a model is a reasoning model that doesn't support temperature
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

const SYSTEM_PROMPT: &str = r#"You are a professional translator for software user interfaces.

You receive one UI string wrapped in tags:
- <source_language>: language code of the text
- <target_language>: language code to translate into
- <context>: optional note from the developer describing where the string appears
- <text>: the string to translate

## Rules
- Reply with the translated text only. No tags, quotes, notes or explanations.
- Keep printf-style placeholders exactly as written, e.g. %@, %d, %lld, %1$@, %.2f, %%.
- Keep acronyms of two or more letters exactly as written (e.g. URL, API, PDF).
- Keep line breaks, leading and trailing whitespace, and punctuation style.
- Use the context only to pick the right meaning, never translate it.
- Match the tone and length of the original as closely as the target language allows."#;

/// Build the user message embedding the four request fields as tagged segments
fn build_user_prompt(request: &TranslationRequest<'_>) -> String {
    let mut prompt = format!(
        "<source_language>{}</source_language>\n<target_language>{}</target_language>\n",
        request.source_language, request.target_language
    );
    if let Some(context) = request.context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("<context>{}</context>\n", context));
    }
    prompt.push_str(&format!("<text>{}</text>", request.text));
    prompt
}

/// Translation client for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            url: config.chat_completions_url(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
        })
    }

    async fn complete(&self, request: &TranslationRequest<'_>) -> Result<String> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: build_user_prompt(request),
                },
            ],
            // Reasoning models don't support temperature
            temperature: if is_reasoning_model(&self.model) {
                None
            } else {
                Some(0.3)
            },
        };

        let response = self
            .http
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send translation request to OpenAI API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("OpenAI API error during translation ({}): {}", status, body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI translation response")?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .context("OpenAI translation response contained no choices")
    }
}

impl Translate for OpenAiClient {
    fn translate(&self, request: TranslationRequest<'_>) -> impl Future<Output = Result<String>> + Send {
        async move {
            let translated = self.complete(&request).await?;

            let validation = TranslationValidator::validate(request.text, &translated);
            if !validation.is_clean() {
                warn!(
                    "Translation validation warnings for {:?} ({}): {:?}",
                    request.text, request.target_language, validation.warnings
                );
            }

            Ok(translated)
        }
    }
}
