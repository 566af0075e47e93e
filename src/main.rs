use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use solum_bridge::{
    cli::CliArgs,
    config::Config,
    console,
    control::Commander,
    dispatch::{ConsoleUi, Dispatcher},
    event_channel,
    logging,
    sdk::ProbeControl,
    session::Session,
    sim::SimProbe,
};

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    logging::setup_logging(cli_args.debug, cli_args.log_file.as_deref())?;
    logging::log_app_start(env!("CARGO_PKG_VERSION"));

    let config = Config::load(&cli_args)?;
    logging::log_app_config(&config);

    // Queue boundary between the module's callback threads and the single
    // consumer thread.
    let (bridge, events) = event_channel(config.queue.capacity);

    let sdk: Arc<dyn ProbeControl> = Arc::new(SimProbe::new(bridge));
    sdk.init(&config.probe.store_dir, config.probe.width, config.probe.height)
        .context("failed to initialize probe module")?;

    let session = Arc::new(Session::new());
    let commander = Commander::new(sdk.clone(), session.clone());

    // Consumer thread: all state mutation and rendering happens here.
    let dispatcher_commander = commander.clone();
    let dispatcher_session = session.clone();
    let workflow = config.workflow_pair();
    let consumer = thread::spawn(move || {
        let ui = ConsoleUi::new(dispatcher_session.clone());
        let mut dispatcher =
            Dispatcher::new(dispatcher_commander, ui, dispatcher_session, workflow);
        dispatcher.run(&events);
    });

    // Connect right away when the address was provided up front.
    if !config.probe.address.is_empty() && config.probe.port != 0 {
        if let Err(err) = commander.connect(&config.probe.address, config.probe.port) {
            error!("{err}");
        } else if let Some(cert) = &config.workflow.certificate {
            if let Err(err) = commander.load_certificate(cert) {
                error!("{err}");
            }
        }
    }

    console::run(&commander);

    // Shutdown order matters: disconnect, quiesce callbacks, let the
    // consumer drain to channel close, then release the module handle.
    let _ = commander.disconnect();
    sdk.quiesce();
    consumer
        .join()
        .map_err(|_| anyhow::anyhow!("dispatcher thread panicked"))?;
    drop(commander);
    drop(sdk);

    info!("session closed");
    Ok(())
}
