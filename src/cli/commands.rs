use axon_console::axon::AnalysisMode;
use clap::{Parser, Subcommand};

/// `axon` - run AI debates and analyses against an AXON backend.
#[derive(Parser, Debug)]
#[command(name = "axon")]
#[command(version)]
#[command(about = "Console for the AXON analysis backend.", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show backend health (cached for the configured TTL)
    Health,

    /// Show the active configuration and backend status
    Status,

    /// Run a one-off analysis
    Analyze {
        /// Prompt to analyze
        prompt: String,

        /// Project id (defaults to debate.project_id)
        #[arg(long)]
        project: Option<String>,

        /// Analysis framework: ikr, kipling, general
        #[arg(long, default_value = "general")]
        mode: AnalysisMode,

        /// Response language (defaults to axon.language)
        #[arg(long)]
        language: Option<String>,
    },

    /// Create, drive and inspect debates
    Debate {
        #[command(subcommand)]
        debate_command: DebateCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum DebateCommands {
    /// Create a debate in setup state
    New {
        #[arg(long)]
        title: String,

        #[arg(long)]
        topic: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Participant as `Name` or `Name: stance`; repeat for each seat
        #[arg(long = "participant", short = 'p', required = true)]
        participants: Vec<String>,

        /// Number of rounds (defaults to debate.default_rounds)
        #[arg(long)]
        rounds: Option<u32>,
    },

    /// Start a debate
    Start { id: String },

    /// Generate the next turn
    Turn { id: String },

    /// Generate turns until the debate completes
    Run { id: String },

    /// Pause an active debate
    Pause { id: String },

    /// Resume a paused debate
    Resume { id: String },

    /// Stop a debate for good
    Stop { id: String },

    /// Print a debate; share links open read-only
    Show {
        /// Debate id or share link (`...#session=<id>`)
        target: String,
    },

    /// Print the share link for a debate
    Share {
        id: String,

        /// Base URL of the dashboard
        #[arg(long, default_value = "http://localhost:5173/")]
        base: String,
    },

    /// List stored debates
    List,

    /// Delete a debate and its log
    Delete { id: String },
}
