use crate::profile::{available_cpus, ModelProfile, ProfileSettings};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Model
    pub profile: ModelProfile,
    pub settings: ProfileSettings,

    // Requests
    pub default_target_lang: String,

    // Languages
    pub language_table_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let profile = ModelProfile::from_name(
            &std::env::var("MODEL_PROFILE").unwrap_or_else(|_| "nllb-1.3b".to_string()),
        )?;
        let mut settings = profile.settings(available_cpus());

        // Overrides of the profile defaults
        if let Some(capacity) = parse_env::<usize>("MAX_CONCURRENT_TRANSLATIONS")? {
            if capacity == 0 {
                bail!("MAX_CONCURRENT_TRANSLATIONS must be at least 1");
            }
            settings.gate_capacity = capacity;
        }
        if let Some(beam_size) = parse_env::<usize>("BEAM_SIZE")? {
            if beam_size == 0 {
                bail!("BEAM_SIZE must be at least 1");
            }
            settings.beam_size = beam_size;
        }
        if let Some(num_hypotheses) = parse_env::<usize>("NUM_HYPOTHESES")? {
            settings.num_hypotheses = num_hypotheses;
        }
        if settings.num_hypotheses == 0 || settings.num_hypotheses > settings.beam_size {
            bail!(
                "NUM_HYPOTHESES must be between 1 and the beam size ({}), got {}",
                settings.beam_size,
                settings.num_hypotheses
            );
        }

        Ok(Self {
            // Server
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("PORT")?.unwrap_or(8000),

            // Model
            profile,
            settings,

            // Requests
            default_target_lang: std::env::var("DEFAULT_TARGET_LANG")
                .unwrap_or_else(|_| "spa_Latn".to_string()),

            // Languages
            language_table_path: std::env::var("LANGUAGE_TABLE_PATH").ok().map(PathBuf::from),
        })
    }

    /// Address the server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read and parse an optional environment variable.
///
/// Unset means `None`; a value that does not parse is an error.
fn parse_env<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} has an invalid value: '{}'", name, value)),
        Err(_) => Ok(None),
    }
}
