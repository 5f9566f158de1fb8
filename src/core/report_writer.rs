// Report output - per-frame CSV and summary JSON

use crate::models::exercise::{FrameRecord, SessionReport, SessionSummary};
use crate::models::pose::AnalysisResult;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

pub const FRAME_CSV_NAME: &str = "result.csv";
pub const SUMMARY_JSON_NAME: &str = "summary.json";

const FRAME_CSV_HEADER: &str = "frame_index,exercise,rep_id,is_form_ok,knee_angle,elbow_angle";

/// Summary document shape handed to the reporting layer
///
/// Deliberately excludes run metadata (timestamps, truncation) so that
/// identical sessions produce byte-identical summary files.
#[derive(Debug, Serialize)]
struct SummaryDocument<'a> {
    video_id: &'a str,
    summary: &'a SessionSummary,
}

/// Render the per-frame records as CSV
pub fn frame_csv(frames: &[FrameRecord]) -> String {
    let mut out = String::from(FRAME_CSV_HEADER);
    out.push('\n');

    for record in frames {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{}",
            record.frame_index,
            record.exercise.as_str(),
            record.rep_id,
            record.is_form_ok,
            format_angle(record.angles.knee),
            format_angle(record.angles.elbow),
        );
    }

    out
}

fn format_angle(angle: Option<f32>) -> String {
    angle.map(|a| format!("{:.2}", a)).unwrap_or_default()
}

/// Render the summary JSON document
pub fn summary_json(report: &SessionReport) -> AnalysisResult<String> {
    let document = SummaryDocument {
        video_id: &report.video_id,
        summary: &report.summary,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Write `result.csv` and `summary.json` under the output directory
pub fn write_reports(report: &SessionReport, output_dir: &Path) -> AnalysisResult<()> {
    std::fs::create_dir_all(output_dir)?;

    std::fs::write(output_dir.join(FRAME_CSV_NAME), frame_csv(&report.frame_data))?;
    std::fs::write(output_dir.join(SUMMARY_JSON_NAME), summary_json(report)?)?;

    info!(
        video_id = %report.video_id,
        dir = %output_dir.display(),
        frames = report.frame_data.len(),
        "reports written"
    );

    Ok(())
}
