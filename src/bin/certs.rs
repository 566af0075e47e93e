//! Retrieves issued probe certificates through the cloud REST API and
//! prints one `serial,certificate` pair per authenticated probe. A single
//! best-effort request; any failure is terminal for the run.

use anyhow::Result;
use clap::Parser;

use solum_bridge::cloud::{self, DEFAULT_URL};
use solum_bridge::error::AppError;
use solum_bridge::logging;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CertArgs {
    /// Oem api key issued for the cloud account.
    #[arg(long, short = 't')]
    token: String,

    /// Certificate listing endpoint.
    #[arg(long, default_value = DEFAULT_URL)]
    url: String,

    /// Increase log verbosity.
    #[arg(long, short = 'd', action = clap::ArgAction::Count)]
    debug: u8,
}

fn main() -> Result<()> {
    let args = CertArgs::parse();
    logging::setup_logging(args.debug, None)?;

    match cloud::fetch_certificates(&args.url, &args.token) {
        Ok(probes) => {
            for probe in probes {
                println!("{},{}", probe.serial, probe.certificate);
            }
            Ok(())
        }
        Err(AppError::Http { status, body }) => {
            println!("error making request: {status} {body}");
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}
