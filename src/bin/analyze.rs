use anyhow::Context;
use formwatch::core::analyzer::analyze_detections;
use formwatch::core::config::AnalyzerConfig;
use formwatch::core::report_writer;
use formwatch::models::pose::KeypointSet;
use std::path::PathBuf;
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;

/// Replay a landmark dump through the analyzer and write its reports.
///
/// The dump is a JSON array with one entry per frame: a keypoint set
/// (`{"points": [{"id": 25, "x": ..., "y": ...}, ...]}`) or `null` for
/// frames where detection found no pose.
#[derive(StructOpt)]
struct Opt {
    /// Path to the landmark dump JSON.
    #[structopt(required = true)]
    landmarks: PathBuf,

    /// Video identifier recorded in the summary report.
    #[structopt(short, long, default_value = "video")]
    video_id: String,

    /// Directory the CSV and JSON reports are written to.
    #[structopt(short, long, default_value = "report")]
    out_dir: PathBuf,

    /// Optional analyzer configuration file.
    #[structopt(short, long)]
    config: Option<PathBuf>,

    #[structopt(short, long, default_value = "info", env = "RUST_LOG")]
    log_level: tracing_subscriber::filter::EnvFilter,
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::from_args();

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(opt.log_level),
    )?;

    let config = match &opt.config {
        Some(path) => AnalyzerConfig::load_from(path)
            .with_context(|| format!("failed loading config from {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };

    let contents = std::fs::read_to_string(&opt.landmarks)
        .with_context(|| format!("failed reading {}", opt.landmarks.display()))?;
    let detections: Vec<Option<KeypointSet>> =
        serde_json::from_str(&contents).context("failed parsing landmark dump")?;

    info!(frames = detections.len(), video_id = %opt.video_id, "loaded landmark dump");

    let report = analyze_detections(opt.video_id, config, detections);
    report_writer::write_reports(&report, &opt.out_dir)
        .context("failed writing reports")?;

    println!("{}", report_writer::summary_json(&report)?);

    Ok(())
}
