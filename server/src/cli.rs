use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(about = "Tailwind API CLI.")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Http {
        #[arg(env = "TAILWIND_API_ADDRESS", default_value = "0.0.0.0:4000")]
        address: std::net::SocketAddr,
    },
}
