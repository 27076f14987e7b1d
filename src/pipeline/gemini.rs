//! Client for the Gemini `generateContent` REST endpoint.
//!
//! Both pipeline calls go through the same endpoint: transcription sends a
//! text part plus an inline audio part, extraction sends a single text
//! part. Replies come back as candidate parts that are concatenated into
//! one string before normalization.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::prompt::TRANSCRIPTION_PROMPT;
use super::types::GenerativeClient;
use super::PipelineError;
use crate::config::GeminiSettings;

// ═══════════════════════════════════════════════════════════════════════════
// Wire types
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

/// Concatenated text of the first candidate, if any.
fn reply_text(response: GenerateContentResponse) -> Option<String> {
    let candidate = response.candidates.into_iter().next()?;
    let content = candidate.content?;
    let text: String = content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Client
// ═══════════════════════════════════════════════════════════════════════════

pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            client,
            timeout_secs: settings.timeout_secs,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    async fn request_text(&self, parts: Vec<Part>) -> Result<String, PipelineError> {
        let body = GenerateContentRequest {
            contents: vec![Content { parts }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PipelineError::ApiStatus {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        reply_text(parsed).ok_or(PipelineError::EmptyReply)
    }

    fn classify(&self, err: reqwest::Error) -> PipelineError {
        if err.is_connect() {
            PipelineError::ApiUnreachable {
                url: self.base_url.clone(),
            }
        } else if err.is_timeout() {
            PipelineError::ApiTimeout {
                seconds: self.timeout_secs,
            }
        } else {
            PipelineError::Request(err)
        }
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, PipelineError> {
        let parts = vec![
            Part::Text {
                text: TRANSCRIPTION_PROMPT.to_string(),
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.to_string(),
                    data: BASE64.encode(audio),
                },
            },
        ];
        self.request_text(parts).await
    }

    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        let parts = vec![Part::Text {
            text: prompt.to_string(),
        }];
        self.request_text(parts).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Test double
// ═══════════════════════════════════════════════════════════════════════════

/// Scripted stand-in for the real API.
pub struct MockGenerativeClient {
    transcript: String,
    reply: String,
    fail_url: Option<String>,
    /// Prompts passed to `generate`, in call order.
    pub prompts: Mutex<Vec<String>>,
    /// `(byte_len, mime_type)` of each `transcribe` call.
    pub transcriptions: Mutex<Vec<(usize, String)>>,
}

impl MockGenerativeClient {
    /// Client that transcribes to `transcript` and extracts to `reply`.
    pub fn scripted(transcript: &str, reply: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            reply: reply.to_string(),
            fail_url: None,
            prompts: Mutex::new(Vec::new()),
            transcriptions: Mutex::new(Vec::new()),
        }
    }

    /// Client whose every call fails as if the API were down.
    pub fn unreachable(url: &str) -> Self {
        Self {
            transcript: String::new(),
            reply: String::new(),
            fail_url: Some(url.to_string()),
            prompts: Mutex::new(Vec::new()),
            transcriptions: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl GenerativeClient for MockGenerativeClient {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, PipelineError> {
        if let Some(url) = &self.fail_url {
            return Err(PipelineError::ApiUnreachable { url: url.clone() });
        }
        self.transcriptions
            .lock()
            .unwrap()
            .push((audio.len(), mime_type.to_string()));
        Ok(self.transcript.clone())
    }

    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        if let Some(url) = &self.fail_url {
            return Err(PipelineError::ApiUnreachable { url: url.clone() });
        }
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> GeminiSettings {
        GeminiSettings {
            api_key: "test-key".to_string(),
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/".to_string(),
            timeout_secs: 300,
        }
    }

    #[test]
    fn endpoint_trims_trailing_slash_from_base_url() {
        let client = GeminiClient::new(&settings());
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn transcription_request_serializes_text_then_inline_audio() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: TRANSCRIPTION_PROMPT.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "audio/mp3".to_string(),
                            data: BASE64.encode(b"RIFF"),
                        },
                    },
                ],
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], TRANSCRIPTION_PROMPT);
        assert_eq!(parts[1]["inline_data"]["mime_type"], "audio/mp3");
        assert_eq!(parts[1]["inline_data"]["data"], "UklGRg==");
    }

    #[test]
    fn reply_text_concatenates_candidate_parts() {
        let raw = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{"text": "first "}, {"text": "second"}],
                    "role": "model"
                },
                "finishReason": "STOP"
            }]
        });
        let response: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(reply_text(response).as_deref(), Some("first second"));
    }

    #[test]
    fn reply_without_candidates_is_empty() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(reply_text(response).is_none());
    }

    #[tokio::test]
    async fn mock_records_prompts_and_audio_metadata() {
        let mock = MockGenerativeClient::scripted("a transcript", "{}");
        mock.transcribe(b"bytes", "audio/mp3").await.unwrap();
        mock.generate("extract this").await.unwrap();

        assert_eq!(
            mock.transcriptions.lock().unwrap().as_slice(),
            &[(5, "audio/mp3".to_string())]
        );
        assert_eq!(mock.prompts.lock().unwrap().as_slice(), &["extract this"]);
    }
}
