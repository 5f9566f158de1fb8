// Concurrent analysis sessions over a landmark detector

use crate::core::analyzer::{AnalysisSession, FrameUpdate};
use crate::core::config::AnalyzerConfig;
use crate::models::exercise::SessionReport;
use crate::models::pose::{AnalysisError, AnalysisResult, KeypointSet, VideoFrame};
use crate::platform::pose::PoseLandmarker;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

// ==============================================================================
// Frame Sources
// ==============================================================================

/// Ordered supplier of one video's decoded frames
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame in order, or None at end of stream
    async fn next_frame(&mut self) -> AnalysisResult<Option<VideoFrame>>;
}

/// In-memory frame sequence
pub struct VecFrameSource {
    frames: std::vec::IntoIter<VideoFrame>,
}

impl VecFrameSource {
    pub fn new(frames: Vec<VideoFrame>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

#[async_trait]
impl FrameSource for VecFrameSource {
    async fn next_frame(&mut self) -> AnalysisResult<Option<VideoFrame>> {
        Ok(self.frames.next())
    }
}

// ==============================================================================
// Analysis Service
// ==============================================================================

struct SessionEntry {
    session: AnalysisSession,
    next_frame_index: usize,
}

/// Session registry driving the per-frame pipeline
///
/// Every session owns its own smoothing baseline and counter state, so
/// concurrent videos never interfere. Frames of one session must be
/// submitted in order; the service assigns frame indices as they arrive.
pub struct AnalysisService {
    detector: Arc<dyn PoseLandmarker>,
    config: AnalyzerConfig,
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl AnalysisService {
    pub fn new(detector: Arc<dyn PoseLandmarker>, config: AnalyzerConfig) -> AnalysisResult<Self> {
        config.validate()?;

        Ok(Self {
            detector,
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Open a session for a video and return its id
    pub async fn start_session(&self, video_id: &str) -> String {
        let session_id = Uuid::new_v4().to_string();
        let session = AnalysisSession::new(video_id, self.config.clone());

        self.sessions.write().await.insert(
            session_id.clone(),
            SessionEntry {
                session,
                next_frame_index: 0,
            },
        );

        info!(%session_id, video_id, "started analysis session");
        session_id
    }

    /// Detect landmarks on a frame and advance the session
    ///
    /// Detection runs on the blocking pool, outside the session lock; the
    /// caller awaits each frame, which keeps submission order intact.
    pub async fn process_frame(
        &self,
        session_id: &str,
        frame: VideoFrame,
    ) -> AnalysisResult<Option<FrameUpdate>> {
        let detector = self.detector.clone();
        let detection = tokio::task::spawn_blocking(move || detector.detect(&frame))
            .await
            .map_err(|e| AnalysisError::Detector(format!("detector task failed: {}", e)))??;

        self.process_keypoints(session_id, detection).await
    }

    /// Advance the session with an already-detected keypoint set
    pub async fn process_keypoints(
        &self,
        session_id: &str,
        detection: Option<KeypointSet>,
    ) -> AnalysisResult<Option<FrameUpdate>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(session_id)
            .ok_or_else(|| AnalysisError::SessionNotFound(session_id.to_string()))?;

        let frame_index = entry.next_frame_index;
        entry.next_frame_index += 1;

        let update = entry.session.process_frame(frame_index, detection);
        if let Some(update) = &update {
            for rep in &update.reps {
                info!(
                    %session_id,
                    exercise = rep.exercise.as_str(),
                    rep_index = rep.rep_index,
                    form_ok = rep.form_ok,
                    "rep completed"
                );
            }
        }

        Ok(update)
    }

    /// Close a session and produce its report
    pub async fn finish_session(&self, session_id: &str) -> AnalysisResult<SessionReport> {
        let entry = self
            .sessions
            .write()
            .await
            .remove(session_id)
            .ok_or_else(|| AnalysisError::SessionNotFound(session_id.to_string()))?;

        Ok(entry.session.finish())
    }

    /// Drive a whole frame source through one session
    pub async fn analyze_video(
        &self,
        video_id: &str,
        mut source: impl FrameSource,
    ) -> AnalysisResult<SessionReport> {
        let session_id = self.start_session(video_id).await;

        let mut submitted = 0usize;
        while let Some(frame) = source.next_frame().await? {
            self.process_frame(&session_id, frame).await?;
            submitted += 1;
        }
        debug!(%session_id, submitted, "frame source drained");

        self.finish_session(&session_id).await
    }
}
