use anyhow::{Context, Result};
use nllb_gateway::backend::dev::dev_backend;
use nllb_gateway::config::Config;
use nllb_gateway::language::LanguageTable;
use nllb_gateway::pipeline::TranslationPipeline;
use nllb_gateway::server::{self, AppState};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nllb_gateway=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    let settings = config.settings.clone();
    info!(
        "Starting translation gateway with profile {} ({}, {}, beam {}, {} concurrent)",
        config.profile,
        settings.model_name,
        settings.compute_type.as_str(),
        settings.beam_size,
        settings.gate_capacity
    );

    let mut languages = LanguageTable::from_entries(settings.languages);
    if let Some(path) = &config.language_table_path {
        languages = languages.with_overrides_file(path)?;
        info!("Loaded language table overrides from {}", path.display());
    }
    info!("{} source languages mapped", languages.len());

    let backend = dev_backend(&languages);
    warn!(
        "No model runtime linked; serving with the {} backend",
        backend.engine_name
    );

    let pipeline = TranslationPipeline::new(backend, languages, settings);
    let address = config.bind_address();
    let state = AppState::new(pipeline, config);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", address);

    server::serve(listener, state).await?;

    info!("Server stopped");
    Ok(())
}
