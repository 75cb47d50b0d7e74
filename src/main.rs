use clap::Parser;
use kprobe_counter::configuration::Configuration;
use kprobe_counter::daemon::{OfflineClient, SocketClient};
use kprobe_counter::probe::ProbeWorker;
use kprobe_counter::Args;
use log::{error, info};
use tokio::signal;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::init();

    let mut builder = Configuration::builder();
    if let Some(path) = &args.config {
        builder = builder.from_config_file(path)?;
    }
    let Configuration { params, settings } = builder.from_cli(&args).build()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("received ctrl-c, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    // The orchestrated path never talks to the daemon, and in that
    // deployment its socket is typically not even mounted.
    let result = if params.crd_flag {
        ProbeWorker::new(params, settings, OfflineClient)
            .run(shutdown_rx)
            .await
    } else {
        let client = SocketClient::connect(&settings.socket_path).await?;
        ProbeWorker::new(params, settings, client)
            .run(shutdown_rx)
            .await
    };

    if let Err(e) = result {
        error!("kprobe worker failed: {e}");
        std::process::exit(1);
    }
    Ok(())
}
