use clap::{Parser, Subcommand};

/// Key Vault web app: shows a Redis key read through a managed identity
#[derive(Parser)]
#[command(name = "keyvault-webapp", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to bind (overrides KEYVAULT_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}
