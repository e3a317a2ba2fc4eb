//! Speech service trait and synthesis types.

pub mod azure;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// Voice used when neither the command line nor the config names one.
pub const DEFAULT_VOICE: &str = "en-US-JennyNeural";

/// Fallback voice when the preferred default is unavailable.
const FALLBACK_VOICE: &str = "en-US-GuyNeural";

/// Voice selection and prosody for a synthesis request.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// Service voice short name, e.g. "en-US-JennyNeural"
    pub voice: String,
    /// Rate adjustment as a signed percentage, e.g. "+10%"
    pub rate: String,
    /// Pitch adjustment as a signed Hz offset, e.g. "-2Hz"
    pub pitch: String,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            rate: "+0%".to_string(),
            pitch: "+0Hz".to_string(),
        }
    }
}

impl SynthesisOptions {
    /// Create new synthesis options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the voice short name.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Set the rate adjustment.
    pub fn with_rate(mut self, rate: impl Into<String>) -> Self {
        self.rate = rate.into();
        self
    }

    /// Set the pitch adjustment.
    pub fn with_pitch(mut self, pitch: impl Into<String>) -> Self {
        self.pitch = pitch.into();
        self
    }
}

/// A voice as reported by the service's voice list endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VoiceInfo {
    pub short_name: String,
    pub gender: String,
    pub locale: String,
    #[serde(default)]
    pub display_name: String,
}

/// Speech service trait - synthesis backends implement this.
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Synthesize one chunk of text, returning encoded audio bytes.
    async fn synthesize(&self, text: &str, options: &SynthesisOptions) -> Result<Vec<u8>>;

    /// Synthesize with retry on transient failures.
    async fn synthesize_with_retry(
        &self,
        text: &str,
        options: &SynthesisOptions,
        max_retries: u32,
    ) -> Result<Vec<u8>>;

    /// Fetch the voices the service offers.
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>>;
}

/// Create a speech service client.
///
/// # Arguments
/// * `region` - Service region, or None to read it from the environment
pub fn create_service(region: Option<&str>) -> Result<Box<dyn SpeechService>> {
    Ok(Box::new(azure::AzureSpeech::from_env(region)?))
}

/// Pick a sensible default from the service's voice list.
pub fn default_voice(voices: &[VoiceInfo]) -> &str {
    for preferred in [DEFAULT_VOICE, FALLBACK_VOICE] {
        if voices.iter().any(|v| v.short_name == preferred) {
            return preferred;
        }
    }
    voices
        .first()
        .map(|v| v.short_name.as_str())
        .unwrap_or(DEFAULT_VOICE)
}

/// Check a rate adjustment string like "+10%" or "-5%".
pub fn is_valid_rate(value: &str) -> bool {
    valid_adjustment(value, "%")
}

/// Check a pitch adjustment string like "+2Hz" or "-4Hz".
pub fn is_valid_pitch(value: &str) -> bool {
    valid_adjustment(value, "Hz")
}

fn valid_adjustment(value: &str, suffix: &str) -> bool {
    let Some(body) = value.strip_suffix(suffix) else {
        return false;
    };
    let Some(magnitude) = body.strip_prefix(['+', '-']) else {
        return false;
    };
    !magnitude.is_empty() && magnitude.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(short_name: &str) -> VoiceInfo {
        VoiceInfo {
            short_name: short_name.to_string(),
            gender: "Female".to_string(),
            locale: "en-US".to_string(),
            display_name: String::new(),
        }
    }

    #[test]
    fn test_options_default() {
        let opts = SynthesisOptions::default();
        assert_eq!(opts.voice, "en-US-JennyNeural");
        assert_eq!(opts.rate, "+0%");
        assert_eq!(opts.pitch, "+0Hz");
    }

    #[test]
    fn test_options_builder() {
        let opts = SynthesisOptions::new()
            .with_voice("en-GB-SoniaNeural")
            .with_rate("+10%")
            .with_pitch("-2Hz");
        assert_eq!(opts.voice, "en-GB-SoniaNeural");
        assert_eq!(opts.rate, "+10%");
        assert_eq!(opts.pitch, "-2Hz");
    }

    #[test]
    fn test_default_voice_prefers_jenny() {
        let voices = vec![voice("en-US-GuyNeural"), voice("en-US-JennyNeural")];
        assert_eq!(default_voice(&voices), "en-US-JennyNeural");
    }

    #[test]
    fn test_default_voice_falls_back_to_guy() {
        let voices = vec![voice("de-DE-KatjaNeural"), voice("en-US-GuyNeural")];
        assert_eq!(default_voice(&voices), "en-US-GuyNeural");
    }

    #[test]
    fn test_default_voice_first_listed() {
        let voices = vec![voice("de-DE-KatjaNeural"), voice("fr-FR-DeniseNeural")];
        assert_eq!(default_voice(&voices), "de-DE-KatjaNeural");
    }

    #[test]
    fn test_default_voice_empty_list() {
        assert_eq!(default_voice(&[]), DEFAULT_VOICE);
    }

    #[test]
    fn test_valid_rate() {
        assert!(is_valid_rate("+0%"));
        assert!(is_valid_rate("-25%"));
        assert!(is_valid_rate("+10%"));
        assert!(!is_valid_rate("10%"));
        assert!(!is_valid_rate("+10"));
        assert!(!is_valid_rate("+%"));
        assert!(!is_valid_rate("fast"));
    }

    #[test]
    fn test_valid_pitch() {
        assert!(is_valid_pitch("+0Hz"));
        assert!(is_valid_pitch("-6Hz"));
        assert!(!is_valid_pitch("+2hz"));
        assert!(!is_valid_pitch("2Hz"));
        assert!(!is_valid_pitch("+2%"));
    }

    #[test]
    fn test_voice_info_from_service_json() {
        let json = r#"[
            {
                "Name": "Microsoft Server Speech Text to Speech Voice (en-US, JennyNeural)",
                "DisplayName": "Jenny",
                "ShortName": "en-US-JennyNeural",
                "Gender": "Female",
                "Locale": "en-US",
                "SampleRateHertz": "24000",
                "VoiceType": "Neural",
                "Status": "GA"
            }
        ]"#;
        let voices: Vec<VoiceInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].short_name, "en-US-JennyNeural");
        assert_eq!(voices[0].gender, "Female");
        assert_eq!(voices[0].locale, "en-US");
        assert_eq!(voices[0].display_name, "Jenny");
    }
}
