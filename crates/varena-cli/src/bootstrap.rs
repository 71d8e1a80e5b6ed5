//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter. All concrete implementations are instantiated here:
//! - HTTP generation client with model probe (via varena-llm)
//! - HTTP or no-op speech gateway (via varena-voice / varena-core)
//! - Filesystem summary archive
//! - The core engine facade (via varena-core)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use varena_core::ports::{NoopSpeech, SpeechGateway};
use varena_core::services::ArenaCore;
use varena_llm::{GenerationConfig, HttpGeneration};
use varena_voice::{HttpSpeech, SpeechConfig};

use crate::archive::FsSummaryArchive;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Root directory for sessions and audio output.
    pub data_dir: PathBuf,
    /// Whether to wire the speech back-end.
    pub voice_enabled: bool,
}

impl CliConfig {
    /// Resolve the data directory: explicit flag, then `VARENA_DATA_DIR`
    /// (handled by the parser), then the platform data dir.
    pub fn resolve(data_dir: Option<String>, no_voice: bool) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .context("no platform data directory available")?
                .join("varena"),
        };
        Ok(Self {
            data_dir,
            voice_enabled: !no_voice,
        })
    }

    #[must_use]
    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }

    #[must_use]
    pub fn audio_dir(&self) -> PathBuf {
        self.data_dir.join("audio")
    }
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    /// The core engine facade.
    pub app: ArenaCore,
    /// Resolved bootstrap configuration.
    pub config: CliConfig,
}

/// Wire up the engine.
///
/// Probes the generation back-ends before returning: a CLI session without
/// a working model has nothing to offer, so probe failure is fatal here.
pub async fn bootstrap(config: CliConfig) -> Result<CliContext> {
    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .with_context(|| format!("could not create data dir {}", config.data_dir.display()))?;

    let generation = HttpGeneration::new(GenerationConfig::from_env())
        .context("could not build generation client")?;
    generation
        .probe()
        .await
        .context("no generation backend answered the health probe")?;
    let generation = Arc::new(generation);

    let speech: Arc<dyn SpeechGateway> = if config.voice_enabled {
        Arc::new(HttpSpeech::new(SpeechConfig::from_env()).context("could not build speech client")?)
    } else {
        info!("voice disabled, replies will be text only");
        Arc::new(NoopSpeech)
    };

    let archive = Arc::new(FsSummaryArchive::new(config.sessions_dir()));
    let app = ArenaCore::new(generation, speech, archive, config.audio_dir());

    Ok(CliContext { app, config })
}
