use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "wsrelay", author, version, about, long_about = None)]
pub struct Cli {
    /// Default log level when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the relay server
    Server {
        /// Listen address (host:port); overrides the configured host and port.
        #[arg(long)]
        addr: Option<String>,

        /// Configuration file, without or with extension (default: config/default).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Send one message through a running relay and print what comes back
    Client {
        #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
        url: String,

        #[arg(long, default_value = "hello")]
        message: String,

        /// Seconds to wait for the relayed message.
        #[arg(long, default_value_t = 5)]
        wait_secs: u64,
    },
}
