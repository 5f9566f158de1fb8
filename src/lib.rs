pub mod core;
pub mod models;
pub mod platform;

pub use crate::core::analyzer::{analyze_detections, AnalysisSession};
pub use crate::core::config::AnalyzerConfig;
pub use crate::core::service::AnalysisService;
pub use crate::models::exercise::SessionReport;
pub use crate::models::pose::{AnalysisError, AnalysisResult};
