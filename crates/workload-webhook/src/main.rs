use anyhow::{anyhow, Result};
use tokio::runtime::Runtime;
use tracing::info;

use workload_webhook::{cli, config::Config, tracing::setup_tracing, WorkloadWebhook};

fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    // Starting from rustls 0.22, each application must set its default crypto provider.
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Cannot install the rustls crypto provider"))?;

    let runtime = Runtime::new()?;
    runtime.block_on(async {
        setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;
        info!(
            service = workload_webhook::config::SERVICE_NAME,
            version = env!("CARGO_PKG_VERSION"),
            "starting"
        );

        let webhook = WorkloadWebhook::new_from_config(config)?;
        webhook.run().await
    })
}
