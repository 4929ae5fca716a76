use std::{io, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use common::log::{info, init_logging};
use compounder::{
    compounder::Compounder,
    config::{load_env_file, signer_from_env, ConfigError, Settings},
    reporter::Reporter,
};
use grape::client::GrapeClient;

#[derive(Parser)]
#[command(name = "compounder")]
#[command(about = "Compounds grape node rewards once they cover the configured node count")]
struct Cli {
    /// Env file to read settings from, instead of ./.env
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll rewards and compound forever (default)
    Run,
    /// Validate the configuration and print the derived values
    CheckConfig,
    /// Print the wallet address derived from PRIVATE_KEY
    ShowWallet,
}

fn load_env(env_file: Option<PathBuf>) {
    if let Err(e) = load_env_file(env_file.as_deref()) {
        eprintln!("Failed to read env file: {}", e);
        std::process::exit(1);
    }
}

fn load_settings() -> Settings {
    match Settings::from_env() {
        Ok(settings) => settings,
        Err(errors) => exit_with(&errors),
    }
}

fn exit_with(errors: &[ConfigError]) -> ! {
    for error in errors {
        eprintln!("{}", error);
    }
    std::process::exit(1);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    load_env(cli.env_file);
    init_logging();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let settings = load_settings();
            let grape = GrapeClient::new(settings.signer.clone(), settings.rpc_url.clone(), settings.contract);
            info!("Compounding for {} on {} via {}", grape.wallet(), grape.contract_address(), settings.rpc_url);

            let mut compounder = Compounder::new(grape, settings, Reporter::new(io::stdout()));
            compounder.run().await;
        }
        Commands::CheckConfig => {
            let settings = load_settings();
            println!("Wallet: {}", settings.wallet);
            println!("Contract: {}", settings.contract);
            println!("RPC URL: {}", settings.rpc_url);
            println!("Compound at: {} grapes", settings.threshold());
            println!("Interval: {:?}", settings.interval());
        }
        Commands::ShowWallet => {
            match signer_from_env() {
                Ok(signer) => println!("{}", signer.address()),
                Err(errors) => exit_with(&errors),
            }
        }
    }

    Ok(())
}
