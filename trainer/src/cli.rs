use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};
use yolo_codebase::assets::WeightVariant;

/// Fetches the YOLOv7 pretrained weights and launches the yolov7-custom training job.
/// Paths and the release URL come from the environment (WORK_DIR, RELEASE_URL, PYTHON,
/// TRAIN_SCRIPT, DATA_PATH, CFG_PATH, HYP_PATH).
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct AppArgs {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Launch training, then download every weight file (the default)
    Run(RunArgs),
    /// Only download weight files
    Fetch(FetchArgs),
    /// Only launch training
    Launch(LaunchArgs),
    /// Score detections of a finished run
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Download the weights before launching, instead of after
    #[arg(long, default_value_t = false)]
    pub fetch_first: bool,
    /// Keep weight files that already exist instead of downloading them again
    #[arg(long, default_value_t = false)]
    pub skip_existing: bool,
    /// Print what would run without downloading or launching anything
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Variants to download (base, x, w6, e6, d6, e6e). All of them when omitted
    #[arg(long = "variant")]
    pub variants: Vec<WeightVariant>,
    #[arg(long, default_value_t = false)]
    pub skip_existing: bool,
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LaunchArgs {
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// JSON file with the detections and labels of every image
    pub input: PathBuf,
    /// Directory to write metrics.json and curves.json into
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}
