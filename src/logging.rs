use anyhow::Result;
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use log::{info, LevelFilter};
use std::io;

pub fn setup_logging(verbosity: u8, log_file: Option<&str>) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    let mut base_config = fern::Dispatch::new();

    base_config = match verbosity {
        0 => base_config.level(LevelFilter::Info),
        1 => base_config.level(LevelFilter::Debug),
        _ => base_config.level(LevelFilter::Trace),
    };

    let stdout_config = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                Local::now().format("[%H:%M:%S]"),
                record.target(),
                colors.color(record.level()),
                message
            ))
        })
        .chain(io::stdout());

    base_config = base_config.chain(stdout_config);

    if let Some(log_file) = log_file {
        // File logs carry the full date so sessions can be told apart.
        let file_config = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{}[{}][{}] {}",
                    Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                    record.target(),
                    record.level(),
                    message
                ))
            })
            .chain(fern::log_file(log_file)?);
        base_config = base_config.chain(file_config);
    }

    base_config.apply()?;
    Ok(())
}

pub fn log_app_start(version: &str) {
    info!("starting solum bridge v{version}");
}

pub fn log_app_config(config: &crate::config::Config) {
    info!("session configured with:");
    info!("  probe:");
    if config.probe.address.is_empty() {
        info!("    address: (connect from console)");
    } else {
        info!("    address: {}:{}", config.probe.address, config.probe.port);
    }
    info!(
        "    output: {}x{}",
        config.probe.width, config.probe.height
    );
    info!("    store dir: {}", config.probe.store_dir.display());
    info!("  workflow:");
    match config.workflow_pair() {
        Some((probe, application)) => info!("    auto-load: {application} on {probe}"),
        None => info!("    auto-load: (none)"),
    }
    if let Some(cert) = &config.workflow.certificate {
        info!("    certificate: {}", cert.display());
    }
    info!("  queue:");
    if config.queue.capacity == 0 {
        info!("    capacity: unbounded");
    } else {
        info!("    capacity: {}", config.queue.capacity);
    }
}
