//! AVD config.ini
//!
//! `config.ini` is a flat list of `key=value` lines with no sections,
//! comments or escaping. It is always rewritten as a whole.

use std::io;
use std::path::Path;
use indexmap::IndexMap;
use tracing::debug;

/// Parsed config.ini. Iteration order is insertion order, which is also the
/// write order; re-inserting an existing key keeps its position but takes the
/// new value.
pub type ConfigFile = IndexMap<String, String>;

/// Parse `key=value` text. Lines without `=` or with an empty key are skipped.
pub fn parse_str(content: &str) -> ConfigFile {
    content
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Render entries as `key=value\r\n` lines
pub fn to_string(values: &ConfigFile) -> String {
    values
        .iter()
        .map(|(key, value)| format!("{}={}\r\n", key, value))
        .collect()
}

/// Read a config file. A missing file is a `NotFound` error.
pub async fn parse(path: &Path) -> io::Result<ConfigFile> {
    let content = tokio::fs::read_to_string(path).await?;
    let values = parse_str(&content);
    debug!("Read {} entries from {:?}", values.len(), path);
    Ok(values)
}

/// Read a config file, treating a missing file as empty
pub async fn parse_or_empty(path: &Path) -> io::Result<ConfigFile> {
    match parse(path).await {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ConfigFile::new()),
        other => other,
    }
}

/// Overwrite `path` with exactly `values`
pub async fn write(path: &Path, values: &ConfigFile) -> io::Result<()> {
    tokio::fs::write(path, to_string(values)).await?;
    debug!("Wrote {} entries to {:?}", values.len(), path);
    Ok(())
}

/// Set one entry, keeping every other entry as it was
pub async fn set_value(path: &Path, key: &str, value: &str) -> io::Result<()> {
    debug!("Setting {}={} in {:?}", key, value, path);
    let mut values = parse(path).await?;
    values.insert(key.to_string(), value.to_string());
    write(path, &values).await
}

/// Merge `sources` over `base` in order; later sources win on collisions
pub fn merge<'a>(base: ConfigFile, sources: impl IntoIterator<Item = &'a ConfigFile>) -> ConfigFile {
    sources.into_iter().fold(base, |mut acc, source| {
        acc.extend(source.iter().map(|(k, v)| (k.clone(), v.clone())));
        acc
    })
}
