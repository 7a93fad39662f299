use std::path::Path;

use super::Timeline;
use crate::error::TimelineError;

/// Serializes a timeline to pretty-printed JSON; `createdAt` is RFC 3339.
pub fn export_timeline(timeline: &Timeline) -> Result<String, TimelineError> {
    Ok(serde_json::to_string_pretty(timeline)?)
}

pub fn import_timeline(json: &str) -> Result<Timeline, TimelineError> {
    Ok(serde_json::from_str(json)?)
}

pub fn save_timeline(timeline: &Timeline, path: &Path) -> Result<(), TimelineError> {
    std::fs::write(path, export_timeline(timeline)?)?;
    log::info!("Saved timeline '{}' to {}", timeline.name, path.display());
    Ok(())
}

pub fn load_timeline(path: &Path) -> Result<Timeline, TimelineError> {
    let json = std::fs::read_to_string(path)?;
    import_timeline(&json)
}
