pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "devtrack")]
#[command(about = "DevTrack CLI - bootstrap and maintenance for the DevTrack API database")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create the first admin account and print its password")]
    CreateAdmin(commands::admin::CreateAdminArgs),

    #[command(about = "Apply pending database migrations")]
    Migrate,
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
        Commands::CreateAdmin(args) => commands::admin::create_admin(args, output_format).await,
        Commands::Migrate => commands::migrate::handle(output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create_admin() {
        let cli = Cli::try_parse_from([
            "devtrack",
            "--json",
            "create-admin",
            "--email",
            "root@acme.io",
        ])
        .unwrap();

        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        match cli.command {
            Commands::CreateAdmin(args) => {
                assert_eq!(args.email, "root@acme.io");
                assert_eq!(args.password, None);
            }
            Commands::Migrate => panic!("expected create-admin"),
        }
    }

    #[test]
    fn create_admin_requires_email() {
        assert!(Cli::try_parse_from(["devtrack", "create-admin"]).is_err());
    }
}
