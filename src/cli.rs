//! CLI interface for the skill matcher

use crate::config::EmbeddingProvider;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skill-matcher")]
#[command(about = "Semantic matching of required skills against resume skills")]
#[command(long_about = "Embed required and resume skill lists, compare them by cosine similarity, and report which requirements are matched or missing")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match required skills against resume skills
    Match {
        /// Required skills: comma-separated list or path to a .txt/.md/.json list
        #[arg(short, long)]
        required: String,

        /// Resume skills: comma-separated list or path to a .txt/.md/.json list
        #[arg(short = 's', long)]
        resume: String,

        /// Similarity threshold in [0, 1] (defaults to matching.threshold)
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Embedding provider override
        #[arg(short, long, value_enum)]
        provider: Option<ProviderArg>,

        /// Embedding model override (local model id/path or remote model name)
        #[arg(short, long)]
        model: Option<String>,

        /// Canonicalize labels (case, punctuation, aliases) before matching
        #[arg(short, long)]
        normalize: bool,

        /// Show per-skill scores and closest resume skill
        #[arg(short, long)]
        detailed: bool,

        /// Output format: console, json
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Local embedding model management
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ProviderArg {
    Local,
    Remote,
}

impl From<ProviderArg> for EmbeddingProvider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Local => EmbeddingProvider::Local,
            ProviderArg::Remote => EmbeddingProvider::Remote,
        }
    }
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List known embedding models
    List,

    /// Download a model
    Download {
        /// Model id, repo id, or name
        model: String,

        /// Re-download even if the model exists
        #[arg(short, long)]
        force: bool,
    },

    /// Remove a downloaded model
    Remove {
        /// Model id to remove
        model: String,
    },

    /// Show model information
    Info {
        /// Model id, repo id, or name
        model: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file location
    Path,

    /// Reset configuration to defaults
    Reset,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "matching.threshold")
        key: String,

        /// Configuration value
        value: String,
    },
}
