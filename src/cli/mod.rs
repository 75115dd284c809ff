pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "cohort-data-services")]
#[command(about = "Cohort data services: HTTP data access for cohort-management entities")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP data services")]
    Serve(commands::serve::ServeArgs),

    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Compile a predicate expression and show the generated SQL")]
    Predicate(commands::predicate::PredicateArgs),

    #[command(about = "Issue a signed bearer token")]
    Token(commands::token::TokenArgs),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Serve(args) => commands::serve::handle(args).await,
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::Predicate(args) => commands::predicate::handle(args, output_format),
        Commands::Token(args) => commands::token::handle(args, output_format),
    }
}
