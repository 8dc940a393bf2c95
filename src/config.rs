use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub capture: CaptureConfig,
    pub storage: StorageConfig,
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    /// WAV file fed to the development capture backend.
    pub source_path: String,
    /// Optional override of the audio container preference order.
    pub audio_mime_preferences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub root_path: String,
    /// Base URL temporary-access links are minted under.
    pub public_base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptionConfig {
    /// Transcription relay endpoint.
    pub endpoint: String,
    pub api_key: Option<String>,
    /// High-accuracy tier requested first; the provider falls back itself.
    pub primary_model: String,
    pub fallback_model: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
