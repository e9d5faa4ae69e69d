// --- SGA Bridge - Archivo principal ---

use sga_bridge::{init_tracing, run_server, SgaConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let config = SgaConfig::from_env()?;
    println!("=== SGA Bridge (API) ===");
    println!("Iniciando servidor en http://{}", config.bind);
    run_server(config).await?;
    Ok(())
}
