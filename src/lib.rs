pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use tokio::signal;

use anyhow::Context;
use cli::{Cli, Commands};
pub use config::Config;
use db::Store;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    init_tracing(&config)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,
        Commands::Users => cmd_list_users(&config).await,
        Commands::Promote { username, revoke } => cmd_promote(&config, &username, !revoke).await,
        Commands::CheckConfig => {
            config.validate()?;
            println!("{config:#?}");
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "muster")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!("Loki logging initialized at {}", config.observability.loki_url);
    } else {
        registry.init();
    }

    Ok(())
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    // Refuse to start without a signing secret
    config.validate()?;

    info!("Muster v{} starting...", env!("CARGO_PKG_VERSION"));

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    if config.auth.registration_code.is_none() {
        info!("No registration code configured; registration is closed");
    }

    if !config.server.enabled {
        info!("HTTP server disabled in config, nothing to do");
        return Ok(());
    }

    let port = config.server.port;
    let api_state = api::create_app_state_from_config(config, prometheus_handle).await?;
    let app = api::router(api_state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web Server running at http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Store> {
    Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
}

async fn cmd_list_users(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let users = store.list_users().await?;

    if users.is_empty() {
        println!("No users registered.");
        return Ok(());
    }

    println!("{:<6} {:<24} {:<6} {}", "ID", "USERNAME", "ADMIN", "CREATED");
    for user in users {
        println!(
            "{:<6} {:<24} {:<6} {}",
            user.id, user.username, user.admin, user.created_at
        );
    }

    Ok(())
}

async fn cmd_promote(config: &Config, username: &str, admin: bool) -> anyhow::Result<()> {
    let store = open_store(config).await?;

    if !store.set_user_admin(username, admin).await? {
        anyhow::bail!("User not found: {username}");
    }

    if admin {
        println!("{username} is now an admin");
    } else {
        println!("{username} is no longer an admin");
    }
    Ok(())
}
