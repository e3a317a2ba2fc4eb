//! Azure Cognitive Services neural TTS over REST.
//!
//! Synthesis posts an SSML document to the region's `cognitiveservices/v1`
//! endpoint and receives one MP3 segment per request. The voice list comes
//! from the region's `voices/list` endpoint as JSON.

use super::{SpeechService, SynthesisOptions, VoiceInfo};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the subscription key.
pub const KEY_ENV_VAR: &str = "AZURE_SPEECH_KEY";

/// Environment variable holding the service region.
pub const REGION_ENV_VAR: &str = "AZURE_SPEECH_REGION";

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "eastus";

/// MP3 output, matching what the sink concatenates.
const OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";

/// Delay before the first retry; doubles per attempt.
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Speech service errors.
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Subscription key not found. Set the AZURE_SPEECH_KEY environment variable.")]
    MissingKey,

    #[error("Speech service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl SpeechError {
    /// Whether a retry can plausibly succeed.
    fn is_retryable(&self) -> bool {
        match self {
            SpeechError::MissingKey => false,
            SpeechError::Http { status, .. } => *status == 429 || *status >= 500,
            SpeechError::Network(_) => true,
        }
    }
}

/// REST client for the Azure neural speech endpoints.
pub struct AzureSpeech {
    client: reqwest::Client,
    region: String,
    key: String,
}

impl AzureSpeech {
    /// Create a client for the given region and subscription key.
    pub fn new(region: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            region: region.into(),
            key: key.into(),
        })
    }

    /// Create a client from `AZURE_SPEECH_KEY`, using `AZURE_SPEECH_REGION`
    /// when no region is passed.
    pub fn from_env(region: Option<&str>) -> Result<Self> {
        let key = std::env::var(KEY_ENV_VAR).map_err(|_| SpeechError::MissingKey)?;
        let region = match region {
            Some(r) => r.to_string(),
            None => std::env::var(REGION_ENV_VAR).unwrap_or_else(|_| DEFAULT_REGION.to_string()),
        };
        Self::new(region, key)
    }

    fn synthesis_url(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.region
        )
    }

    fn voices_url(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/voices/list",
            self.region
        )
    }
}

#[async_trait]
impl SpeechService for AzureSpeech {
    async fn synthesize(&self, text: &str, options: &SynthesisOptions) -> Result<Vec<u8>> {
        let ssml = build_ssml(text, options);
        log::debug!(
            "Synthesizing {} chars with voice {} (region {})",
            text.chars().count(),
            options.voice,
            self.region
        );

        let response = self
            .client
            .post(self.synthesis_url())
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .header("User-Agent", "narrate")
            .body(ssml)
            .send()
            .await
            .map_err(SpeechError::from)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SpeechError::Http {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let audio = response.bytes().await.map_err(SpeechError::from)?;
        log::debug!("Received {} bytes of audio", audio.len());
        Ok(audio.to_vec())
    }

    async fn synthesize_with_retry(
        &self,
        text: &str,
        options: &SynthesisOptions,
        max_retries: u32,
    ) -> Result<Vec<u8>> {
        let mut delay = INITIAL_RETRY_DELAY;

        for attempt in 1..=max_retries {
            match self.synthesize(text, options).await {
                Ok(audio) => return Ok(audio),
                Err(e) => {
                    let retryable = e
                        .downcast_ref::<SpeechError>()
                        .map(SpeechError::is_retryable)
                        .unwrap_or(false);

                    if !retryable || attempt == max_retries {
                        return Err(e);
                    }

                    log::warn!(
                        "Synthesis failed (attempt {}/{}): {}. Retrying in {:?}...",
                        attempt,
                        max_retries,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY);
                }
            }
        }

        anyhow::bail!("All {} synthesis attempts failed", max_retries)
    }

    async fn list_voices(&self) -> Result<Vec<VoiceInfo>> {
        let response = self
            .client
            .get(self.voices_url())
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .send()
            .await
            .map_err(SpeechError::from)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SpeechError::Http {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let voices = response.json().await.map_err(SpeechError::from)?;
        Ok(voices)
    }
}

/// Wrap a text chunk in the SSML envelope the service expects.
fn build_ssml(text: &str, options: &SynthesisOptions) -> String {
    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='en-US'>\
         <voice name='{}'><prosody rate='{}' pitch='{}'>{}</prosody></voice></speak>",
        options.voice,
        options.rate,
        options.pitch,
        escape_xml(text)
    )
}

/// Escape text for use as SSML character data.
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_ssml_contains_voice_and_prosody() {
        let options = SynthesisOptions::new()
            .with_voice("en-US-GuyNeural")
            .with_rate("+10%")
            .with_pitch("-2Hz");
        let ssml = build_ssml("Hello world.", &options);
        assert!(ssml.contains("<voice name='en-US-GuyNeural'>"));
        assert!(ssml.contains("rate='+10%'"));
        assert!(ssml.contains("pitch='-2Hz'"));
        assert!(ssml.contains("Hello world."));
    }

    #[test]
    fn test_build_ssml_escapes_text() {
        let options = SynthesisOptions::default();
        let ssml = build_ssml("Tom & Jerry <3 \"cheese\"", &options);
        assert!(ssml.contains("Tom &amp; Jerry &lt;3 &quot;cheese&quot;"));
        assert!(!ssml.contains("<3"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b > c"), "a &lt; b &gt; c");
        assert_eq!(escape_xml("it's"), "it&apos;s");
        assert_eq!(escape_xml("plain"), "plain");
    }

    #[test]
    fn test_retryable_statuses() {
        let rate_limited = SpeechError::Http {
            status: 429,
            message: String::new(),
        };
        let server_error = SpeechError::Http {
            status: 503,
            message: String::new(),
        };
        let bad_request = SpeechError::Http {
            status: 400,
            message: String::new(),
        };
        assert!(rate_limited.is_retryable());
        assert!(server_error.is_retryable());
        assert!(!bad_request.is_retryable());
        assert!(!SpeechError::MissingKey.is_retryable());
    }

    #[test]
    fn test_urls_include_region() {
        let service = AzureSpeech::new("westeurope", "key").unwrap();
        assert_eq!(
            service.synthesis_url(),
            "https://westeurope.tts.speech.microsoft.com/cognitiveservices/v1"
        );
        assert_eq!(
            service.voices_url(),
            "https://westeurope.tts.speech.microsoft.com/cognitiveservices/voices/list"
        );
    }
}
