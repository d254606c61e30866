use std::path::Path;

use crate::error::{Error, Result};

use super::model::Track;

/// Tag attached to every track loaded from the local filesystem at runtime.
pub const LOCAL_TAG: &str = "local";

/// Build a track for a user-selected file.
///
/// The title is the file name (extension included) and the url is the
/// absolute path, which the rodio backend opens directly.
pub fn local_track(path: &Path) -> Result<Track> {
    let meta = std::fs::metadata(path)?;
    if !meta.is_file() {
        return Err(Error::Unsupported(path.display().to_string()));
    }

    let title = path
        .file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::Unsupported(path.display().to_string()))?;

    let absolute = std::fs::canonicalize(path)?;

    Ok(Track::new(
        absolute.display().to_string(),
        title,
        [LOCAL_TAG],
    ))
}
