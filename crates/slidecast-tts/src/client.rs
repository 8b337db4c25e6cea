//! ElevenLabs-compatible speech synthesis client.
//!
//! One request per call and no internal retry: moving on to another
//! credential is the rotator's job.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use slidecast_models::VoiceSettings;

use crate::credential::Credential;
use crate::error::{TtsError, TtsResult};

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "xi-api-key";

/// Backend configuration.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub base_url: String,
    /// Voice used for every row of a run
    pub voice_id: Option<String>,
    pub model_id: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            voice_id: None,
            model_id: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl TtsConfig {
    /// Load from `ELEVENLABS_*` and `TTS_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            base_url: non_empty("ELEVENLABS_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            voice_id: non_empty("ELEVENLABS_VOICE_ID"),
            model_id: non_empty("ELEVENLABS_MODEL_ID"),
            timeout: Duration::from_secs(
                std::env::var("TTS_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }

    pub fn with_voice_id(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Turns one text into audio bytes using one credential.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        credential: &Credential,
        settings: &VoiceSettings,
    ) -> TtsResult<Vec<u8>>;
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_id: Option<&'a str>,
    voice_settings: VoiceSettingsBody,
}

#[derive(Debug, Serialize)]
struct VoiceSettingsBody {
    stability: f32,
    similarity_boost: f32,
    speed: f32,
}

impl From<&VoiceSettings> for VoiceSettingsBody {
    fn from(settings: &VoiceSettings) -> Self {
        Self {
            stability: settings.stability(),
            similarity_boost: settings.similarity(),
            speed: settings.speed(),
        }
    }
}

/// Character usage of one account.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Subscription {
    pub character_limit: u64,
    pub character_count: u64,
}

impl Subscription {
    pub fn remaining(&self) -> u64 {
        self.character_limit.saturating_sub(self.character_count)
    }
}

/// HTTP client for the ElevenLabs REST API.
#[derive(Clone)]
pub struct ElevenLabsClient {
    http: Client,
    base_url: String,
    voice_id: Option<String>,
    model_id: Option<String>,
}

impl ElevenLabsClient {
    /// Build a client.
    ///
    /// A voice id is only needed for synthesis; subscription queries work
    /// without one.
    pub fn new(config: &TtsConfig) -> TtsResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("slidecast/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            voice_id: config.voice_id.clone(),
            model_id: config.model_id.clone(),
        })
    }

    pub fn voice_id(&self) -> Option<&str> {
        self.voice_id.as_deref()
    }

    /// Fetch character usage for `credential`.
    pub async fn subscription(&self, credential: &Credential) -> TtsResult<Subscription> {
        let url = format!("{}/v1/user/subscription", self.base_url);

        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, credential.expose())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::from_http_status(status.as_u16(), body));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn post_synthesis(
        &self,
        url: &str,
        credential: &Credential,
        request: &SynthesisRequest<'_>,
    ) -> TtsResult<Vec<u8>> {
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, credential.expose())
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::from_http_status(status.as_u16(), body));
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(TtsError::invalid_response("Empty audio body"));
        }
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(
        &self,
        text: &str,
        credential: &Credential,
        settings: &VoiceSettings,
    ) -> TtsResult<Vec<u8>> {
        let voice_id = self
            .voice_id
            .as_deref()
            .ok_or_else(|| TtsError::config("ELEVENLABS_VOICE_ID not set"))?;
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, voice_id);
        let request = SynthesisRequest {
            text,
            model_id: self.model_id.as_deref(),
            voice_settings: settings.into(),
        };

        debug!(credential = %credential, chars = text.chars().count(), "Requesting speech");

        let result = self.post_synthesis(&url, credential, &request).await;

        let outcome = if result.is_ok() { "success" } else { "failure" };
        metrics::counter!("slidecast_tts_requests_total", "outcome" => outcome).increment(1);

        result
    }
}
