use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "near-duper")]
#[command(about = "Finds near-duplicate office documents and decides which copy to keep", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Score a JSON batch of document pairs; results are written to stdout
    Compare {
        /// JSON request file; stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Show scanner groups with the copy that would be kept
    Groups(GroupArgs),
    /// Delete redundant copies after confirmation
    Clean {
        #[command(flatten)]
        groups: GroupArgs,
        /// Delete only the listed SIMILAR group (1-based, as shown by `groups`)
        #[arg(long, value_name = "N")]
        reviewed: Option<usize>,
    },
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct GroupArgs {
    /// Scanner output; stdin when omitted
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// Directory whose copies are preferred; falls back to `scan_root` in the configuration
    #[arg(short, long)]
    pub scan_root: Option<PathBuf>,
    /// Extra documents to cluster into SIMILAR groups
    #[arg(long, num_args = 1..)]
    pub cluster: Vec<PathBuf>,
}
