use anyhow::Error;
use args::{Args, SubCommands};
use clap::{CommandFactory, Parser};

mod args;
mod clients;
mod commands;
mod config;
mod graphql;
mod handler;
mod models;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "llmgql=info".to_string())
        )
        .init();
    let args = Args::parse();
    match args.subcmd {
        Some(SubCommands::Start(_)) => {
            commands::start::run().await?;
        }
        Some(SubCommands::Config(config_cmd)) => {
            commands::config::run(&config_cmd)?;
        }
        Some(SubCommands::Schema) => {
            commands::schema::run();
        }
        None => {
            Args::command().print_help()?;
        }
    };
    Ok(())
}
