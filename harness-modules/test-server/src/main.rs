use log::info;
use onvif_harness::config::{ActualEnvVarQuery, Config};
use onvif_harness::executor::ProcessScriptExecutor;
use onvif_harness::server::run_dispatch_server;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    env_logger::try_init()?;
    info!("main - onvif test dispatch server started");
    let config = Config::from_env(&ActualEnvVarQuery {})?;
    let executor = Arc::new(ProcessScriptExecutor::new(config.script_timeout));
    run_dispatch_server(config, executor).await;
    info!("main - onvif test dispatch server ended");
    Ok(())
}
