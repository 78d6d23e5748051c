//! Structured extraction from uploaded will text.
//!
//! The model is asked for a JSON object but is not trusted to produce one. Parsing is
//! tolerant of code fences and surrounding prose, and any failure degrades to an empty
//! [`WillExtraction`] so intake can continue by hand.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::LlmConfig;
use crate::lenient::{lenient_flag, lenient_string, lenient_struct, lenient_text, lenient_vec};

/// Longest will text forwarded to the model, in characters.
pub const MAX_WILL_CHARS: usize = 48_000;

const SYSTEM_PROMPT: &str = "You read British Columbia wills and return only a JSON object with \
the keys testatorName, willDate (YYYY-MM-DD), executors (array of {name, relationship, \
isAlternate}), beneficiaries (array of {name, relationship, share}), flags ({hasCodicil, \
handwrittenChanges, minorBeneficiaries, foreignAssets, businessInterests, testamentaryTrust}) \
and issues (array of strings). Use null or empty arrays for anything the text does not state.";

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM endpoint is not configured")]
    NotConfigured,
    #[error("LLM request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("LLM endpoint returned {status}")]
    Status { status: StatusCode, body: String },
    #[error("LLM response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("LLM response contained no message content")]
    EmptyResponse,
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Returns the assistant message text for a single system + user exchange.
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

/// Any endpoint speaking the `/chat/completions` dialect.
#[derive(Clone)]
pub struct OpenAiCompatibleChat {
    http: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatibleChat {
    pub fn new(
        api_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_url = config.api_url.clone().ok_or(LlmError::NotConfigured)?;
        Ok(Self::new(api_url, config.api_key.clone(), config.model.clone()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatCompletion for OpenAiCompatibleChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.0,
        };

        let mut request = self
            .http
            .post(format!("{}/chat/completions", self.api_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header(header::AUTHORIZATION, format!("Bearer {key}"));
        }

        let response = request.send().await.map_err(LlmError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let parsed: ChatResponse = response.json().await.map_err(LlmError::Decode)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractedExecutor {
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub relationship: Option<String>,
    #[serde(deserialize_with = "lenient_flag")]
    pub is_alternate: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractedBeneficiary {
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub relationship: Option<String>,
    /// Numeric shares from the model are kept as their decimal text.
    #[serde(deserialize_with = "lenient_string")]
    pub share: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WillFlags {
    #[serde(deserialize_with = "lenient_flag")]
    pub has_codicil: bool,
    #[serde(deserialize_with = "lenient_flag")]
    pub handwritten_changes: bool,
    #[serde(deserialize_with = "lenient_flag")]
    pub minor_beneficiaries: bool,
    #[serde(deserialize_with = "lenient_flag")]
    pub foreign_assets: bool,
    #[serde(deserialize_with = "lenient_flag")]
    pub business_interests: bool,
    #[serde(deserialize_with = "lenient_flag")]
    pub testamentary_trust: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WillExtraction {
    #[serde(deserialize_with = "lenient_string")]
    pub testator_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub will_date: Option<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub executors: Vec<ExtractedExecutor>,
    #[serde(deserialize_with = "lenient_vec")]
    pub beneficiaries: Vec<ExtractedBeneficiary>,
    #[serde(deserialize_with = "lenient_struct")]
    pub flags: WillFlags,
    #[serde(deserialize_with = "lenient_vec")]
    pub issues: Vec<String>,
}

impl WillExtraction {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Why a model reply could not be used. Carries nothing callers need beyond the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyFallback {
    pub reason: String,
}

impl EmptyFallback {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn into_extraction(self) -> WillExtraction {
        WillExtraction::default()
    }
}

/// Pulls the first JSON object out of a model reply.
pub fn parse_will_extraction(text: &str) -> Result<WillExtraction, EmptyFallback> {
    let unfenced = strip_code_fence(text.trim());
    let start = unfenced
        .find('{')
        .ok_or_else(|| EmptyFallback::new("reply contains no JSON object"))?;
    let end = unfenced
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| EmptyFallback::new("reply contains no complete JSON object"))?;

    serde_json::from_str(&unfenced[start..=end])
        .map_err(|err| EmptyFallback::new(format!("reply is not valid extraction JSON: {err}")))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after_open = &text[open + 3..];
    let body = match after_open.find('\n') {
        Some(newline) => &after_open[newline + 1..],
        None => after_open,
    };
    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}

/// Result handed back to intake. `fallback_reason` is set when the extraction is empty
/// because the model could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionOutcome {
    pub extraction: WillExtraction,
    pub fallback_reason: Option<String>,
}

#[derive(Clone)]
pub struct WillExtractor {
    chat: Arc<dyn ChatCompletion>,
}

impl WillExtractor {
    pub fn new(chat: Arc<dyn ChatCompletion>) -> Self {
        Self { chat }
    }

    /// Always yields a usable extraction; model or parse failures are logged and emptied.
    pub async fn extract(&self, will_text: &str) -> ExtractionOutcome {
        let excerpt = truncate_chars(will_text, MAX_WILL_CHARS);
        let reply = match self.chat.complete(SYSTEM_PROMPT, excerpt).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "will extraction request failed");
                return ExtractionOutcome {
                    extraction: WillExtraction::default(),
                    fallback_reason: Some("extraction service unavailable".to_string()),
                };
            }
        };

        match parse_will_extraction(&reply) {
            Ok(extraction) => {
                info!(
                    executors = extraction.executors.len(),
                    beneficiaries = extraction.beneficiaries.len(),
                    issues = extraction.issues.len(),
                    "will extraction parsed"
                );
                ExtractionOutcome {
                    extraction,
                    fallback_reason: None,
                }
            }
            Err(fallback) => {
                warn!(reason = %fallback.reason, "will extraction reply unusable");
                ExtractionOutcome {
                    fallback_reason: Some(fallback.reason.clone()),
                    extraction: fallback.into_extraction(),
                }
            }
        }
    }
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const REPLY: &str = r#"{
        "testatorName": "Walter Grange",
        "willDate": "2016-09-12",
        "executors": [{ "name": "Ada Grange", "relationship": "daughter" }],
        "beneficiaries": [{ "name": "Ada Grange", "share": "residue" }],
        "flags": { "hasCodicil": true },
        "issues": ["page 3 initials missing"]
    }"#;

    #[test]
    fn parses_plain_json() {
        let extraction = parse_will_extraction(REPLY).expect("parses");
        assert_eq!(extraction.testator_name.as_deref(), Some("Walter Grange"));
        assert!(extraction.flags.has_codicil);
        assert!(!extraction.executors[0].is_alternate);
    }

    #[test]
    fn tolerates_fences_and_prose() {
        let wrapped =
            format!("Here is the data you asked for:\n```json\n{REPLY}\n```\nLet me know!");
        let extraction = parse_will_extraction(&wrapped).expect("parses");
        assert_eq!(extraction.issues, vec!["page 3 initials missing".to_string()]);
    }

    #[test]
    fn unusable_replies_fall_back_to_empty() {
        let fallback = parse_will_extraction("I could not read the will.").expect_err("no json");
        assert!(fallback.reason.contains("no JSON object"));
        assert!(fallback.into_extraction().is_empty());

        assert!(parse_will_extraction("{ \"executors\": [ }").is_err());
    }

    #[test]
    fn explicit_nulls_keep_the_rest_of_the_reply() {
        let reply = r#"{
            "testatorName": "Ann Lee",
            "willDate": null,
            "executors": null,
            "beneficiaries": [{ "name": "Sam Lee", "relationship": null, "share": 50 }],
            "flags": { "hasCodicil": null, "foreignAssets": true },
            "issues": null
        }"#;

        let extraction = parse_will_extraction(reply).expect("parses");
        assert_eq!(extraction.testator_name.as_deref(), Some("Ann Lee"));
        assert!(extraction.will_date.is_none());
        assert!(extraction.executors.is_empty());
        assert_eq!(extraction.beneficiaries[0].share.as_deref(), Some("50"));
        assert!(!extraction.flags.has_codicil);
        assert!(extraction.flags.foreign_assets);
        assert!(extraction.issues.is_empty());

        let flags_null = parse_will_extraction(r#"{"testatorName":"Ann Lee","flags":null}"#)
            .expect("parses");
        assert_eq!(flags_null.flags, WillFlags::default());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    struct CannedChat(Result<&'static str, ()>);

    #[async_trait]
    impl ChatCompletion for CannedChat {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            self.0
                .map(str::to_string)
                .map_err(|()| LlmError::EmptyResponse)
        }
    }

    #[tokio::test]
    async fn extractor_always_returns_a_value() {
        let failing = WillExtractor::new(Arc::new(CannedChat(Err(()))));
        let outcome = failing.extract("LAST WILL AND TESTAMENT").await;
        assert!(outcome.extraction.is_empty());
        assert!(outcome.fallback_reason.is_some());

        let garbled = WillExtractor::new(Arc::new(CannedChat(Ok("```json\n{ not json\n```"))));
        assert!(garbled.extract("text").await.extraction.is_empty());

        let working = WillExtractor::new(Arc::new(CannedChat(Ok(REPLY))));
        let outcome = working.extract("text").await;
        assert_eq!(outcome.fallback_reason, None);
        assert_eq!(outcome.extraction.executors.len(), 1);
    }

    #[tokio::test]
    async fn openai_compatible_chat_reads_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": REPLY } }]
            })))
            .mount(&server)
            .await;

        let chat = OpenAiCompatibleChat::new(format!("{}/v1", server.uri()), None, "test-model");
        let reply = chat.complete("system", "user").await.expect("completion");
        assert!(reply.contains("Walter Grange"));
    }

    #[tokio::test]
    async fn openai_compatible_chat_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream overloaded"))
            .mount(&server)
            .await;

        let chat = OpenAiCompatibleChat::new(server.uri(), Some("sk-test".to_string()), "m");
        assert!(matches!(
            chat.complete("system", "user").await,
            Err(LlmError::Status { status, .. }) if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
    }
}
