use clap::Parser;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(name = "mailbox-archiver")]
#[clap(author, version, about)]
pub struct Args {
    /// Path to the mail store, holding one directory per account.
    pub store: PathBuf,
    /// Settings file with the [Settings] section.
    #[clap(short, long, default_value = "settings.ini")]
    pub settings: PathBuf,
    /// Directory to export emails into, defaults to Emails in the current
    /// directory.
    #[clap(short, long)]
    pub output: Option<PathBuf>,
    /// Log file, rewritten on every run.
    #[clap(long, default_value = "email-archiver.log")]
    pub log_file: PathBuf,
    /// Number of folder levels to visit, overriding MaxFolderDepth.
    #[clap(long)]
    pub max_depth: Option<usize>,
    /// Suppress any progress output if set.
    #[clap(short, long)]
    pub quiet: bool,
    /// The directory we export into, resolved from `output`.
    #[clap(skip)]
    pub output_dir: PathBuf,
}

impl Args {
    pub fn parse_args() -> Self {
        let mut result: Self = Self::parse();
        result.output_dir = match result.output.clone() {
            Some(output) => output,
            None => env::current_dir().unwrap_or_default().join("Emails"),
        };
        result
    }
}
