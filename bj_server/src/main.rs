//! LAN blackjack server.
//!
//! Broadcasts offers on the discovery port and plays any number of
//! concurrent sessions until the process is stopped.

mod config;

use anyhow::{Context, Error};
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;

const HELP: &str = "\
Run a LAN blackjack server

USAGE:
  bj_server [OPTIONS]

OPTIONS:
  --name           NAME    Name advertised in offers     [default: env BJ_SERVER_NAME or NoSocketsJustCards]
  --bind           IP      Address to bind sockets to    [default: env BJ_BIND_IP or 0.0.0.0]
  --port           PORT    TCP port, 0 for any free port [default: env BJ_TCP_PORT or 0]
  --discovery-port PORT    UDP port offers are sent to   [default: env BJ_DISCOVERY_PORT or 13122]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  BJ_OFFER_INTERVAL_MS        Time between offer broadcasts
  BJ_HANDSHAKE_TIMEOUT_SECS   How long to wait for a client's request
  BJ_READ_TIMEOUT_SECS        How long to wait for each decision
  RUST_LOG                    Log level (default: info)
  (Values are also read from a .env file)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = config::Overrides {
        server_name: pargs.opt_value_from_str("--name")?,
        bind_ip: pargs.opt_value_from_str("--bind")?,
        tcp_port: pargs.opt_value_from_str("--port")?,
        discovery_port: pargs.opt_value_from_str("--discovery-port")?,
    };
    let config = config::from_env(overrides).context("Invalid server configuration")?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_target(false)
        .init();
    info!(
        "Starting blackjack server {:?} on {}, offers to {}",
        config.server_name, config.bind_ip, config.broadcast_addr
    );

    blackjack::server::run(&config)
        .await
        .context("Server failed to start")?;

    info!("Shutting down server...");
    Ok(())
}
