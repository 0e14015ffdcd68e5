use super::AppState;
use crate::metrics::MetricsReport;
use crate::profile::available_cpus;
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ResourceUsage {
    /// Resident set size, e.g. "512.34 MB", or "unavailable"
    pub memory: String,
    pub cpu_threads_total: usize,
    /// Permits currently held on the gate
    pub active_tasks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub engine: String,
    pub device: String,
    pub resource_usage: ResourceUsage,
    pub metrics: MetricsReport,
}

/// Read-only snapshot of the service; never touches the gate.
pub(super) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let pipeline = &state.pipeline;
    let settings = pipeline.settings();
    let backend = pipeline.backend();

    Json(HealthResponse {
        status: "online",
        model: format!("{} ({})", settings.model_name, state.config.profile),
        engine: format!(
            "{} [{}, intra_threads={}, inter_threads={}, beam={}]",
            backend.engine_name,
            settings.compute_type.as_str(),
            settings.intra_threads,
            settings.inter_threads,
            settings.beam_size
        ),
        device: backend.engine.device().to_string(),
        resource_usage: ResourceUsage {
            memory: process_memory().unwrap_or_else(|| "unavailable".to_string()),
            cpu_threads_total: available_cpus(),
            active_tasks: pipeline.gate().active(),
        },
        metrics: pipeline.metrics().report(),
    })
}

/// Resident memory of this process, formatted in megabytes.
///
/// Only available where `/proc/self/status` exists.
pub fn process_memory() -> Option<String> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let kb = parse_vm_rss_kb(&status)?;
    Some(format!("{:.2} MB", kb as f64 / 1024.0))
}

fn parse_vm_rss_kb(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}
