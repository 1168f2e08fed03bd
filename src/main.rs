use greenapi_gateway::{GatewayConfig, GatewayError, GatewayServer};
use log::{error, info};

#[tokio::main]
async fn main() {
    greenapi_gateway::init_logger();

    if let Err(err) = run().await {
        error!("{}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), GatewayError> {
    let config = GatewayConfig::load(None)?;

    let server = GatewayServer::new(
        &config.server.listen_address(),
        &config.green_api.base_url,
    )?;
    info!("server starting on http://{}", server.addr());
    info!("GREEN-API endpoint: {}", server.base_url());

    server.run().await
}
