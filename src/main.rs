//! Area Registry
//!
//! Loads the configured area list, checks it against the registry's
//! invariants (unique names, no overlapping volumes) and reports what a
//! server starting on this file would protect.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use area_registry::area::{AreaRegistry, FileStore, RegistrySettings};
use area_registry::config::AreaConfig;
use area_registry::VERSION;

#[tokio::main]
async fn main() -> Result<()> {
    let log_handle = init_logging();

    info!("Area registry v{}", VERSION);

    let config = AreaConfig::load().await?;
    if let Some(handle) = &log_handle {
        handle.reload(EnvFilter::new(config.log_directives()))?;
    }
    info!(
        "Configuration loaded from: {}",
        config.config_path.display()
    );
    if config.debug {
        info!(config = ?config, "Debug mode enabled");
    }

    let store = Arc::new(FileStore::new(&config.data_path));
    info!("Reading area list from: {}", store.path().display());
    let registry = AreaRegistry::new(RegistrySettings::from(&config), store);
    let report = registry.load()?;

    for region in registry.regions() {
        info!(
            name = %region.name(),
            volume = %region.volume(),
            access = ?region.access(),
            group_id = region.group_id(),
            "Protected area"
        );
    }

    if report.skipped() > 0 {
        warn!(
            malformed = report.malformed,
            duplicates = report.duplicates,
            overlapping = report.overlapping,
            "Area list has entries that will be ignored"
        );
    }

    info!(
        regions = report.loaded,
        area_limit = registry.settings().protected_area_limit,
        "Area list check complete"
    );
    Ok(())
}

/// Initialize the logging/tracing system
///
/// `RUST_LOG` wins when set. Otherwise logging starts at `info` and the
/// returned handle lets the config's `debug` flag adjust it once loaded.
fn init_logging() -> Option<reload::Handle<EnvFilter, Registry>> {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new("info"), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true),
        )
        .init();

    (!from_env).then_some(handle)
}
