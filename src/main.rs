mod capacity;
mod data;
mod error;
mod server;
mod solver;
mod summary;

use log::error;

const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let bind = std::env::var("MATCHMAKER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());

    if let Err(e) = server::run_server(&bind).await {
        error!("Server on {} stopped: {}", bind, e);
        std::process::exit(1);
    }
}
