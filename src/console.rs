//! Interactive console driving the command issuer.
//!
//! One command per line, mirroring the probe workflow: connect, load a
//! certificate, load an application, run. Commands issue synchronous SDK
//! calls and may block; confirmations arrive through the dispatcher.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use log::error;

use crate::control::Commander;
use crate::sdk::{Param, Platform};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Connect { address: String, port: u16 },
    Disconnect,
    ToggleImaging,
    FirmwareVersion(Platform),
    ListProbes,
    ListApplications { probe: String },
    LoadCertificate(PathBuf),
    LoadApplication { probe: String, application: String },
    GetParam(Param),
    SetParam { param: Param, value: f64 },
    ToggleStreamPrint,
    Help,
    Quit,
}

/// Parses one console line. `Ok(None)` means an empty line.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut tokens = line.split_whitespace();
    let verb = match tokens.next() {
        Some(verb) => verb,
        None => return Ok(None),
    };
    let args: Vec<&str> = tokens.collect();

    let command = match verb {
        "c" | "connect" => {
            if args.len() != 2 {
                return Err("format: c {ip address} {port}".into());
            }
            let port: u16 = args[1]
                .parse()
                .map_err(|_| format!("invalid port '{}'", args[1]))?;
            Command::Connect {
                address: args[0].to_owned(),
                port,
            }
        }
        "d" | "disconnect" => Command::Disconnect,
        "r" | "run" => Command::ToggleImaging,
        "f" | "firmware" => {
            let platform = match args.first() {
                Some(p) => p.parse::<Platform>()?,
                None => Platform::Hd3,
            };
            Command::FirmwareVersion(platform)
        }
        "p" | "probes" => Command::ListProbes,
        "a" | "applications" => {
            let probe = args.first().ok_or("format: a {probe}")?;
            Command::ListApplications {
                probe: (*probe).to_owned(),
            }
        }
        "t" | "cert" => {
            let path = args.first().ok_or("format: t {certificate file}")?;
            Command::LoadCertificate(PathBuf::from(*path))
        }
        "l" | "load" => {
            if args.len() != 2 {
                return Err("format: l {probe} {application}".into());
            }
            Command::LoadApplication {
                probe: args[0].to_owned(),
                application: args[1].to_owned(),
            }
        }
        "g" | "get" => {
            let param = args.first().ok_or("format: g {parameter}")?.parse()?;
            Command::GetParam(param)
        }
        "v" | "set" => {
            if args.len() != 2 {
                return Err("format: v {parameter} {value [float/true/false]}".into());
            }
            let param: Param = args[0].parse()?;
            let value = match args[1] {
                "true" => 1.0,
                "false" => 0.0,
                raw => raw
                    .parse::<f64>()
                    .map_err(|_| format!("invalid value '{raw}'"))?,
            };
            Command::SetParam { param, value }
        }
        "#" => Command::ToggleStreamPrint,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" => Command::Quit,
        other => return Err(format!("unknown command '{other}', try 'h'")),
    };
    Ok(Some(command))
}

const HELP: &str = "\
commands:
  c {ip} {port}      connect to probe
  d                  disconnect
  t {file}           send certificate for validation
  l {probe} {app}    load application
  r                  run/stop imaging
  f [v1|hd|hd3]      firmware version
  p                  list probes
  a {probe}          list applications
  g {param}          get parameter value
  v {param} {value}  set parameter value
  #                  toggle imaging stream printout
  q                  quit";

/// Reads commands from stdin until quit or end of input.
pub fn run(commander: &Commander) {
    let stdin = io::stdin();
    prompt();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        match parse_command(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => execute(commander, command),
            Ok(None) => {}
            Err(message) => println!("{message}"),
        }
        prompt();
    }
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

fn execute(commander: &Commander, command: Command) {
    let result = match command {
        Command::Connect { address, port } => commander
            .connect(&address, port)
            .map(|_| println!("trying to connect")),
        Command::Disconnect => commander.disconnect(),
        Command::ToggleImaging => commander.toggle_imaging(),
        Command::FirmwareVersion(platform) => commander
            .firmware_version(platform)
            .map(|version| println!("firmware version: {version}")),
        Command::ListProbes => commander
            .probes()
            .map(|probes| println!("probes: {}", probes.join(", "))),
        Command::ListApplications { probe } => commander
            .applications(&probe)
            .map(|apps| println!("applications for {probe}: {}", apps.join(", "))),
        Command::LoadCertificate(path) => commander.load_certificate(&path),
        Command::LoadApplication { probe, application } => commander
            .load_application(&probe, &application)
            .map(|_| println!("trying to load application: {application}")),
        Command::GetParam(param) => commander
            .get_param(param)
            .map(|value| println!("{param}: {value}")),
        Command::SetParam { param, value } => commander.set_param(param, value),
        Command::ToggleStreamPrint => {
            let on = commander.session().toggle_stream_print();
            println!("imaging stream printout {}", if on { "on" } else { "off" });
            Ok(())
        }
        Command::Help => {
            println!("{HELP}");
            Ok(())
        }
        Command::Quit => unreachable!("quit handled by the loop"),
    };

    if let Err(err) = result {
        error!("{err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_connect_with_arguments() {
        assert_eq!(
            parse_command("c 192.168.1.1 5828").unwrap(),
            Some(Command::Connect {
                address: "192.168.1.1".to_owned(),
                port: 5828,
            })
        );
        assert!(parse_command("c 192.168.1.1").is_err());
        assert!(parse_command("c 192.168.1.1 notaport").is_err());
    }

    #[test]
    fn parses_parameter_commands() {
        assert_eq!(
            parse_command("v gain 60").unwrap(),
            Some(Command::SetParam {
                param: Param::Gain,
                value: 60.0,
            })
        );
        assert_eq!(
            parse_command("v imu true").unwrap(),
            Some(Command::SetParam {
                param: Param::ImuStreaming,
                value: 1.0,
            })
        );
        assert_eq!(
            parse_command("g depth").unwrap(),
            Some(Command::GetParam(Param::ImageDepth))
        );
        assert!(parse_command("v gain sixty").is_err());
        assert!(parse_command("g brightness").is_err());
    }

    #[test]
    fn parses_workflow_commands() {
        assert_eq!(
            parse_command("l C3 abdomen").unwrap(),
            Some(Command::LoadApplication {
                probe: "C3".to_owned(),
                application: "abdomen".to_owned(),
            })
        );
        assert_eq!(
            parse_command("t /tmp/probe.pem").unwrap(),
            Some(Command::LoadCertificate(PathBuf::from("/tmp/probe.pem")))
        );
        assert_eq!(
            parse_command("f hd3").unwrap(),
            Some(Command::FirmwareVersion(Platform::Hd3))
        );
        assert_eq!(
            parse_command("f").unwrap(),
            Some(Command::FirmwareVersion(Platform::Hd3))
        );
    }

    #[test]
    fn empty_and_unknown_lines() {
        assert_eq!(parse_command("   ").unwrap(), None);
        assert!(parse_command("xyzzy").is_err());
        assert_eq!(parse_command("q").unwrap(), Some(Command::Quit));
        assert_eq!(parse_command("#").unwrap(), Some(Command::ToggleStreamPrint));
    }
}
