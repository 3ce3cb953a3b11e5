use std::sync::Arc;
use std::time::Duration;

use salvo::conn::TcpListener;
use salvo::logging::Logger;
use salvo::{Listener, Router};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload};

use neighborly_app::app::api::routes;
use neighborly_app::config::ConfigHandler;
use neighborly_app::service_handler::ServiceContextHandler;
use neighborly_core::config::load_config;
use neighborly_db::db::connection::create_pool;
use neighborly_db::db::migrate::run_migrations;
use neighborly_db::store::PgStore;
use neighborly_service::auth::Authorizer;
use neighborly_service::auth::casbin::init_casbin;
use neighborly_service::auth::delivery::LogCodeSender;
use neighborly_service::auth::login::purge_expired;
use neighborly_service::context::ServiceContext;
use neighborly_service::whitelist::seed_bootstrap_admins;

const PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(filter_layer).with(
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true),
    );
    tracing::subscriber::set_global_default(subscriber)?;
    // diesel_migrations and casbin log through the `log` facade.
    tracing_log::LogTracer::init()?;

    tracing::info!("Starting Neighborly server");

    let config = load_config()?;

    tracing::info!(
        server = ?config.server,
        logging = ?config.logging,
        bootstrap_admins = config.auth.bootstrap_admins.len(),
        "Configuration loaded"
    );

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    run_migrations(&config.database.url).await?;

    let pool = create_pool(
        &config.database.url,
        u32::from(config.database.max_connections),
    )
    .await?;

    tracing::info!("Database connection pool created.");

    let enforcer = init_casbin().await?;

    let context = ServiceContext::new(
        Arc::new(PgStore::new(pool)),
        Authorizer::new(Arc::new(enforcer)),
        config.auth.clone(),
        Arc::new(LogCodeSender {
            log_codes: config.auth.log_login_codes,
        }),
    );

    seed_bootstrap_admins(&context).await?;

    let purge_context = context.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match purge_expired(&purge_context).await {
                Ok(removed) => tracing::debug!(removed, "Purged expired login codes and sessions"),
                Err(e) => tracing::warn!(error = %e, "Failed to purge expired credentials"),
            }
        }
    });

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(Logger::new())
        .hoop(ConfigHandler {
            settings: config.clone(),
        })
        .hoop(ServiceContextHandler { context })
        .push(routes());

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}
