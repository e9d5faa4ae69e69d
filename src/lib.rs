// Biblioteca raíz del crate `sga_bridge`.
// Adaptador hacia el SGA legado (páginas PHP que devuelven tablas HTML) y la API
// HTTP que lo expone al frontend.
pub mod carreras;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod server_handlers;
pub mod sga;

pub use config::SgaConfig;
pub use error::{ConfigError, ErrorKind, SgaFailure};
pub use server::run_server;
pub use sga::SgaClient;

/// Inicializa `tracing` con el filtro de `RUST_LOG` (por defecto `info`).
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
