//! OpenAI-backed service implementations.
//!
//! One HTTP client serves three seams: Whisper batch transcription for
//! `SpeechToText`, a text-model completion for `DialogueModel`, and the
//! audio-modality chat endpoint for `PersonaVoice`. The base URL is
//! injectable so provider tests run against a local mock server.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde_json::{Value, json};
use tracing::debug;

use super::{
    ChatRole, ChatTurn, DialogueModel, ServiceError, SpeechToText, SpokenReply, PersonaVoice,
};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const TRANSCRIPTION_MODEL: &str = "whisper-1";
const TEXT_MODEL: &str = "gpt-4o";
const VOICE_MODEL: &str = "gpt-4o-audio-preview";
const AUDIO_FORMAT: &str = "mp3";

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, OPENAI_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    fn chat_messages(turns: &[ChatTurn]) -> Vec<Value> {
        turns
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    ChatRole::System => "system",
                    ChatRole::User => "user",
                    ChatRole::Assistant => "assistant",
                };
                json!({ "role": role, "content": turn.content })
            })
            .collect()
    }

    async fn chat_completion(&self, payload: Value) -> Result<Value, ServiceError> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Provider(format!(
                "chat completion failed with status {status}: {body}"
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl SpeechToText for OpenAiClient {
    async fn transcribe(&self, wav: Bytes) -> Result<String, ServiceError> {
        debug!(bytes = wav.len(), "transcribing utterance");

        let file = reqwest::multipart::Part::bytes(wav.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("model", TRANSCRIPTION_MODEL)
            .text("language", "en")
            .text("response_format", "text");

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Provider(format!(
                "transcription failed with status {status}"
            )));
        }

        Ok(response.text().await?.trim().to_string())
    }
}

#[async_trait]
impl DialogueModel for OpenAiClient {
    async fn decide(&self, system: &str, user: &str) -> Result<String, ServiceError> {
        let body = self
            .chat_completion(json!({
                "model": TEXT_MODEL,
                "temperature": 0,
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": user },
                ],
            }))
            .await?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ServiceError::InvalidResponse("missing completion content".into()))
    }
}

#[async_trait]
impl PersonaVoice for OpenAiClient {
    async fn speak(&self, voice: &str, turns: &[ChatTurn]) -> Result<SpokenReply, ServiceError> {
        let body = self
            .chat_completion(json!({
                "model": VOICE_MODEL,
                "modalities": ["text", "audio"],
                "audio": { "voice": voice, "format": AUDIO_FORMAT },
                "messages": Self::chat_messages(turns),
            }))
            .await?;

        let message = &body["choices"][0]["message"];

        // Audio-modality responses carry the transcript alongside the data;
        // plain responses fall back to the content field.
        let audio = &message["audio"];
        let text = audio["transcript"]
            .as_str()
            .or_else(|| message["content"].as_str())
            .unwrap_or_default()
            .to_string();
        if text.is_empty() {
            return Err(ServiceError::InvalidResponse(
                "voice completion had neither transcript nor content".into(),
            ));
        }

        let audio_bytes = match audio["data"].as_str() {
            Some(data) => Some(Bytes::from(BASE64.decode(data).map_err(|e| {
                ServiceError::InvalidResponse(format!("invalid base64 audio payload: {e}"))
            })?)),
            None => None,
        };

        Ok(SpokenReply { text, audio: audio_bytes })
    }

    async fn speak_text(&self, turns: &[ChatTurn]) -> Result<String, ServiceError> {
        let body = self
            .chat_completion(json!({
                "model": TEXT_MODEL,
                "messages": Self::chat_messages(turns),
            }))
            .await?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ServiceError::InvalidResponse("missing completion content".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiClient {
        OpenAiClient::with_base_url("test-key".into(), server.uri())
    }

    #[tokio::test]
    async fn test_transcribe_trims_response_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello world\n"))
            .mount(&server)
            .await;

        let transcript = client_for(&server)
            .transcribe(Bytes::from_static(b"RIFFdata"))
            .await
            .unwrap();
        assert_eq!(transcript, "hello world");
    }

    #[tokio::test]
    async fn test_transcribe_surfaces_provider_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .transcribe(Bytes::from_static(b"RIFFdata"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Provider(_)));
    }

    #[tokio::test]
    async fn test_decide_returns_completion_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "{\"next\":\"FINISH\"}" } }]
            })))
            .mount(&server)
            .await;

        let raw = client_for(&server).decide("system", "user").await.unwrap();
        assert_eq!(raw, "{\"next\":\"FINISH\"}");
    }

    #[tokio::test]
    async fn test_speak_decodes_audio_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "audio": {
                    "transcript": "a sharp point",
                    "data": BASE64.encode(b"mp3-bytes"),
                }}}]
            })))
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .speak("onyx", &[ChatTurn::user("hi")])
            .await
            .unwrap();
        assert_eq!(reply.text, "a sharp point");
        assert_eq!(reply.audio.unwrap().as_ref(), b"mp3-bytes");
    }

    #[tokio::test]
    async fn test_speak_accepts_text_only_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "text only" } }]
            })))
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .speak("shimmer", &[ChatTurn::user("hi")])
            .await
            .unwrap();
        assert_eq!(reply.text, "text only");
        assert!(reply.audio.is_none());
    }
}
