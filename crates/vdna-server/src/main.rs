mod api;
mod cycle;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    cycle::CycleRunner,
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = vdna_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = vdna_db::PoolConfig::from_app_config(&config);
    let pool = vdna_db::connect_pool(&config.database_url, pool_config).await?;
    vdna_db::run_migrations(&pool).await?;

    let settings = vdna_core::load_pipeline_settings(config.pipeline_config_path.as_deref())?;
    let notifier: Arc<dyn vdna_pipeline::RunNotifier> =
        Arc::from(vdna_pipeline::notifier_from_config(config.notify.as_ref())?);
    let runner = CycleRunner::new(pool.clone(), settings, notifier);

    let _scheduler =
        scheduler::build_scheduler(runner.clone(), config.cycle_cron.as_deref()).await?;

    let auth = AuthState::from_env(matches!(config.env, vdna_core::Environment::Development))?;
    let app = build_app(
        AppState {
            pool,
            cycle: runner,
        },
        auth,
        default_rate_limit_state(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "vdna-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
