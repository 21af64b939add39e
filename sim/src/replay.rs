//! Replay: serialize/deserialize report logs for offline analysis.

use fusion_core::ReportFrame;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// One report frame stamped with the engine clock at which it is delivered.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimedFrame {
    pub now_ms: u64,
    pub frame: ReportFrame,
}

/// A full recorded report stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportLog {
    pub scenario_name: String,
    pub seed: u64,
    /// All frames in chronological order
    pub frames: Vec<TimedFrame>,
}

/// Save a report log to a JSON file.
pub fn save_log(log: &ReportLog, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, log)?;
    Ok(())
}

/// Load a report log from a JSON file.
pub fn load_log(path: &Path) -> anyhow::Result<ReportLog> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let log: ReportLog = serde_json::from_reader(reader)?;
    Ok(log)
}
