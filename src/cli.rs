use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "esia-qa",
    version,
    about = "Consistency and completeness checks for extracted ESIA facts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Analyze(AnalyzeArgs),
    Extract(ExtractArgs),
    CheckConfig(CheckConfigArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(long, default_value = "input")]
    pub input_dir: PathBuf,

    #[arg(long, default_value = "facts.jsonl")]
    pub facts_file: PathBuf,

    #[arg(long, default_value = "document_metadata.json")]
    pub metadata_file: PathBuf,

    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub document_name: Option<String>,

    #[arg(long, default_value_t = false)]
    pub skip_sqlite: bool,

    #[arg(long, default_value_t = false)]
    pub skip_markdown: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long)]
    pub text: String,

    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckConfigArgs {
    #[arg(long)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,
}
