use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mebelbot")]
#[command(author, version, about = "Furniture-store website with a Telegram support bot", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot and the website together
    Run {
        /// Use webhook mode instead of long polling
        #[arg(long)]
        webhook: bool,
    },

    /// Run only the website (no Telegram bot token required for pages,
    /// but contact fan-out still needs one)
    Serve,

    /// Write a small demo catalog into the products file
    SeedProducts {
        /// Overwrite an existing products file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
