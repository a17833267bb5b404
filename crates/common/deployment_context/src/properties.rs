use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use crate::error::ResolutionError;

/// Load a deployment properties file into an explicit key-value map.
///
/// The caller receives the mapping and decides what to do with it; nothing
/// is injected into ambient process state.
///
/// Format: one `key=value` pair per line; blank lines and lines starting
/// with `#` or `!` are ignored; whitespace around keys and values is
/// trimmed; when a key appears several times the last occurrence wins.
pub fn load_properties(path: &Path) -> Result<HashMap<String, String>, ResolutionError> {
    let content = std::fs::read_to_string(path)?;
    let properties = parse_properties(&content, path)?;
    info!("Loaded {} deployment properties from {path:?}", properties.len());
    Ok(properties)
}

fn parse_properties(
    content: &str,
    path: &Path,
) -> Result<HashMap<String, String>, ResolutionError> {
    let mut properties = HashMap::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| ResolutionError::MalformedProperty {
                path: path.to_path_buf(),
                line: index + 1,
            })?;
        properties.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(properties)
}
