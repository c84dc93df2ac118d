//! Server configuration, read from the environment at startup.

use thiserror::Error;

use crate::core::vad::VadConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{0}")]
    Invalid(String),
}

/// Top-level server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Absent in tests; providers backed by real HTTP require it.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    /// Voice-activity thresholds advertised to clients.
    pub vad: VadConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            vad: VadConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary lookup, so tests never touch process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = lookup("TALKDOC_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("TALKDOC_PORT") {
            config.port = parse("TALKDOC_PORT", &port)?;
        }
        config.openai_api_key = lookup("OPENAI_API_KEY");
        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            config.openai_base_url = base_url;
        }

        let mut vad = VadConfig::default();
        if let Some(v) = lookup("TALKDOC_SPEECH_THRESHOLD") {
            vad = vad.with_speech_threshold(parse("TALKDOC_SPEECH_THRESHOLD", &v)?);
        }
        if let Some(v) = lookup("TALKDOC_BARGE_IN_THRESHOLD") {
            vad = vad.with_barge_in_threshold(parse("TALKDOC_BARGE_IN_THRESHOLD", &v)?);
        }
        if let Some(v) = lookup("TALKDOC_SILENCE_MS") {
            vad = vad.with_silence_duration_ms(parse("TALKDOC_SILENCE_MS", &v)?);
        }
        if let Some(v) = lookup("TALKDOC_MIN_SPEECH_MS") {
            vad = vad.with_min_speech_duration_ms(parse("TALKDOC_MIN_SPEECH_MS", &v)?);
        }
        if let Some(v) = lookup("TALKDOC_SAMPLE_RATE") {
            vad.sample_rate = parse("TALKDOC_SAMPLE_RATE", &v)?;
        }
        config.vad = vad;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let vad = &self.vad;
        if !(vad.speech_threshold > 0.0 && vad.speech_threshold <= 1.0) {
            return Err(ConfigError::Invalid(
                "speech threshold must be in (0, 1]".to_string(),
            ));
        }
        if !(vad.barge_in_threshold > 0.0 && vad.barge_in_threshold <= 1.0) {
            return Err(ConfigError::Invalid(
                "barge-in threshold must be in (0, 1]".to_string(),
            ));
        }
        if vad.barge_in_threshold < vad.speech_threshold {
            return Err(ConfigError::Invalid(
                "barge-in threshold must not be below the speech threshold".to_string(),
            ));
        }
        if vad.min_speech_duration_ms >= vad.silence_duration_ms {
            return Err(ConfigError::Invalid(
                "minimum speech duration must be shorter than the silence window".to_string(),
            ));
        }
        Ok(())
    }

    /// Bind address in `host:port` form.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.address(), "0.0.0.0:3000");
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.vad.speech_threshold, 0.12);
        assert_eq!(config.vad.barge_in_threshold, 0.2);
    }

    #[test]
    fn test_env_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("TALKDOC_HOST", "127.0.0.1"),
            ("TALKDOC_PORT", "8080"),
            ("OPENAI_API_KEY", "sk-test"),
            ("TALKDOC_SPEECH_THRESHOLD", "0.2"),
            ("TALKDOC_BARGE_IN_THRESHOLD", "0.35"),
            ("TALKDOC_SILENCE_MS", "1200"),
        ]))
        .unwrap();
        assert_eq!(config.address(), "127.0.0.1:8080");
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.vad.speech_threshold, 0.2);
        assert_eq!(config.vad.barge_in_threshold, 0.35);
        assert_eq!(config.vad.silence_duration_ms, 1200);
    }

    #[test]
    fn test_unparsable_port_rejected() {
        let result = ServerConfig::from_lookup(lookup(&[("TALKDOC_PORT", "not-a-port")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: "TALKDOC_PORT", .. })
        ));
    }

    #[test]
    fn test_barge_in_below_speech_threshold_rejected() {
        let result = ServerConfig::from_lookup(lookup(&[
            ("TALKDOC_SPEECH_THRESHOLD", "0.3"),
            ("TALKDOC_BARGE_IN_THRESHOLD", "0.1"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_min_speech_must_fit_in_silence_window() {
        let result = ServerConfig::from_lookup(lookup(&[("TALKDOC_MIN_SPEECH_MS", "900")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let result =
            ServerConfig::from_lookup(lookup(&[("TALKDOC_SPEECH_THRESHOLD", "1.5")]));
        assert!(result.is_err());
    }
}
