use clap::Parser;
use cli::{Cli, Command};

mod airports;
mod cli;
mod config;
mod fx;
mod server;
mod weather;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Cli::parse();

    match args.cmd {
        Command::Http { address } => server::run(address).await,
    }
}
