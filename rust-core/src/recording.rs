//! Recorded frame streams and session summaries.
//!
//! Recordings are JSON lines, one frame per line:
//!
//! ```text
//! {"timestamp_ms":0,"top_left":18.2,"top_right":17.9,"bottom_left":19.0,"bottom_right":18.4}
//! {"timestamp_ms":18,"top_left":18.1,"top_right":18.0,"bottom_left":19.2,"bottom_right":18.3,"total_kg":73.6}
//! ```
//!
//! `total_kg` is optional; without it the total is the sum of the corners.
//! Blank lines and lines starting with `#` are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RecordingError;
use crate::types::{Action, ActionEvent, CornerWeights, Edge, SensorFrame, TickOutput};

/// One line of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub timestamp_ms: u64,
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_left: f32,
    pub bottom_right: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_kg: Option<f32>,
}

impl From<FrameRecord> for SensorFrame {
    fn from(r: FrameRecord) -> Self {
        let corners = CornerWeights::new(r.top_left, r.top_right, r.bottom_left, r.bottom_right);
        match r.total_kg {
            Some(total) => SensorFrame::with_total(r.timestamp_ms, corners, total),
            None => SensorFrame::from_corners(r.timestamp_ms, corners),
        }
    }
}

impl From<&SensorFrame> for FrameRecord {
    fn from(f: &SensorFrame) -> Self {
        Self {
            timestamp_ms: f.timestamp_ms,
            top_left: f.corners.top_left,
            top_right: f.corners.top_right,
            bottom_left: f.corners.bottom_left,
            bottom_right: f.corners.bottom_right,
            total_kg: Some(f.total_kg),
        }
    }
}

/// Parse a whole recording.
pub fn read_frames<R: BufRead>(reader: R) -> Result<Vec<SensorFrame>, RecordingError> {
    let mut frames = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record: FrameRecord = serde_json::from_str(trimmed).map_err(|source| RecordingError::Parse {
            line: index + 1,
            source,
        })?;
        frames.push(record.into());
    }
    Ok(frames)
}

/// Open and parse a recording file.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<SensorFrame>, RecordingError> {
    let path = path.as_ref();
    let frames = read_frames(BufReader::new(File::open(path)?))?;
    log::info!("loaded {} frames from {}", frames.len(), path.display());
    Ok(frames)
}

/// Write frames as JSON lines.
pub fn write_frames<W: Write>(mut writer: W, frames: &[SensorFrame]) -> Result<(), RecordingError> {
    for frame in frames {
        let line = serde_json::to_string(&FrameRecord::from(frame)).map_err(std::io::Error::from)?;
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}

/// Per-action start/stop counts over a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionCounts {
    pub starts: u32,
    pub stops: u32,
}

/// Aggregate statistics of a replayed or live session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub ticks: u64,
    pub first_ms: Option<u64>,
    pub last_ms: Option<u64>,
    /// Ticks where the platform was occupied.
    pub in_use_ticks: u64,
    /// Ticks with a non-zero horizontal turn.
    pub turning_ticks: u64,
    pub left: ActionCounts,
    pub right: ActionCounts,
    pub forward: ActionCounts,
    pub backward: ActionCounts,
    pub modifier: ActionCounts,
    pub jump: ActionCounts,
}

impl SessionSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration_ms(&self) -> u64 {
        match (self.first_ms, self.last_ms) {
            (Some(first), Some(last)) => last.saturating_sub(first),
            _ => 0,
        }
    }

    pub fn add_tick(&mut self, output: &TickOutput) {
        let t = output.calibrated.timestamp_ms;
        self.ticks += 1;
        self.first_ms.get_or_insert(t);
        self.last_ms = Some(t);
        if output.calibrated.in_use {
            self.in_use_ticks += 1;
        }
        if output.turn.map(|turn| turn.horizontal != 0).unwrap_or(false) {
            self.turning_ticks += 1;
        }
        for event in &output.events {
            self.add_event(event);
        }
    }

    pub fn add_event(&mut self, event: &ActionEvent) {
        let counts = self.counts_mut(event.action);
        match event.edge {
            Edge::Start => counts.starts += 1,
            Edge::Stop => counts.stops += 1,
        }
    }

    pub fn counts(&self, action: Action) -> ActionCounts {
        match action {
            Action::Left => self.left,
            Action::Right => self.right,
            Action::Forward => self.forward,
            Action::Backward => self.backward,
            Action::Modifier => self.modifier,
            Action::Jump => self.jump,
        }
    }

    fn counts_mut(&mut self, action: Action) -> &mut ActionCounts {
        match action {
            Action::Left => &mut self.left,
            Action::Right => &mut self.right,
            Action::Forward => &mut self.forward,
            Action::Backward => &mut self.backward,
            Action::Modifier => &mut self.modifier,
            Action::Jump => &mut self.jump,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ============================================================================
// TESTS
// ============================================================================
