use std::sync::Arc;

use resource_server::config::{self, AppState};
use resource_server::{logger, server, RequestStaticResourceConsumer, StaticResourceRegistry};
use tokio::sync::Notify;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Tokio runtime sized by `server.workers`, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    // Static roots are registered once, before any connection is accepted
    let mut registry =
        StaticResourceRegistry::new().with_welcome_file(&cfg.static_files.welcome_file);
    registry.configure_from(&cfg.static_files)?;
    if registry.is_empty() {
        logger::log_warning("No static resource roots configured, static serving disabled");
    }
    let static_resources = RequestStaticResourceConsumer::new(Arc::new(registry));

    let listener = server::create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg);

    let state = Arc::new(AppState::new(cfg, static_resources));
    let shutdown = Arc::new(Notify::new());
    server::signal::start_signal_handler(Arc::clone(&shutdown));

    server::run(listener, state, shutdown).await?;
    Ok(())
}
