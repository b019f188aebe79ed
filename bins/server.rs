use std::process::ExitCode;

use configs::{AppConfig, ServerConfig};
use tracing::{error, info, warn};
use uuid::Uuid;

const SERVICE: &str = "leadbook";

fn build_runtime(server: &ServerConfig) -> std::io::Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = server.worker_threads {
        builder.worker_threads(w);
    }
    builder.build()
}

/// Resolves on Ctrl+C; axum then stops accepting and drains in-flight requests.
async fn shutdown_signal(instance: Uuid) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(service = SERVICE, event = "signal_error", error = %e, "ctrl_c listener failed; shutting down");
        return;
    }
    info!(service = SERVICE, event = "shutdown_signal", %instance, "received Ctrl+C, draining");
}

fn main() -> ExitCode {
    // .env 先于日志初始化加载，RUST_LOG / LOG_FORMAT 才能生效
    dotenvy::dotenv().ok();
    common::utils::logging::init_logging_from_env();

    let instance = Uuid::new_v4();
    std::panic::set_hook(Box::new(move |info| {
        error!(service = SERVICE, event = "panic", %instance, panic = %info, "unhandled panic");
    }));

    // 配置只在这里加载一次，之后整体交给 server::run
    let cfg = match AppConfig::load_or_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = SERVICE, event = "config_invalid", error = %e, "refusing to start");
            return ExitCode::FAILURE;
        }
    };

    let rt = match build_runtime(&cfg.server) {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = SERVICE, event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = SERVICE,
        event = "start",
        %instance,
        pid = std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
        host = %cfg.server.host,
        port = cfg.server.port,
        threads = cfg.server.worker_threads.unwrap_or_default(),
        admin_signup = cfg.auth.allow_admin_signup,
        "leadbook starting"
    );

    match rt.block_on(server::run(cfg, shutdown_signal(instance))) {
        Ok(()) => {
            info!(service = SERVICE, event = "stop", %instance, "stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = SERVICE, event = "run_failed", %instance, error = %e, "server exited with error");
            ExitCode::FAILURE
        }
    }
}
