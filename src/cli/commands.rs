use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `chatguard` - generator/guardian arbitration pipeline for conversational APIs.
#[derive(Parser, Debug)]
#[command(name = "chatguard")]
#[command(version)]
#[command(about = "Answer queries through a generator and a guardian, with an audit trail.", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.chatguard/config.toml, created if missing)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Host to bind to (default: gateway.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, 0 for a random free port (default: gateway.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one query through the pipeline and print the verdict as JSON
    Ask {
        /// The user message
        message: String,

        /// Language hint
        #[arg(long, default_value = "en")]
        lang: String,
    },

    /// Print the most recent audit records, one JSON object per line
    Audit {
        /// Number of records
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}
