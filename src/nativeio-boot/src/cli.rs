use clap::*;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(name = "nativeio-boot")]
pub struct CliOptions {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// JSON file with the bridge configuration
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Keep the fileset in this directory, overriding the configured backend
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Open a file, write to it, read it back, close it, list the fileset
    /// and delete the file again
    Demo {
        #[arg(default_value = "test_file")]
        name: String,
    },
    /// List every file in the fileset
    Ls,
    /// Print a file's contents to stdout
    Cat { name: String },
    /// Delete a file
    Rm { name: String },
}

impl CliOptions {
    /// Log filter for the `-v` count.  `RUST_LOG` still wins when set.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
