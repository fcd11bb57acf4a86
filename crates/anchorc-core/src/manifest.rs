//! Package manifest reader: `<dir>/anchor` is line-oriented
//! key/value pairs separated by whitespace, not JSON or YAML — `serde`
//! would be the wrong tool for this literal a format, so it's hand-parsed.

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read manifest at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: unknown manifest key '{key}'")]
    UnknownKey { path: String, line: usize, key: String },
    #[error("{path}: missing required key 'name'")]
    MissingName { path: String },
    #[error("{path}: missing required key 'entry'")]
    MissingEntry { path: String },
    #[error("{path}:{line}: malformed line (expected 'key value')")]
    Malformed { path: String, line: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub name: String,
    pub entry: String,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Manifest, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Manifest::parse(&text, &path.display().to_string())
    }

    pub fn parse(text: &str, display_path: &str) -> Result<Manifest, ManifestError> {
        let mut name = None;
        let mut entry = None;

        for (idx, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.splitn(2, char::is_whitespace);
            let key = parts.next().unwrap_or("").trim();
            let value = parts.next().unwrap_or("").trim();
            if key.is_empty() || value.is_empty() {
                return Err(ManifestError::Malformed {
                    path: display_path.to_string(),
                    line: idx + 1,
                });
            }
            match key {
                "name" => name = Some(value.to_string()),
                "entry" => entry = Some(value.to_string()),
                other => {
                    return Err(ManifestError::UnknownKey {
                        path: display_path.to_string(),
                        line: idx + 1,
                        key: other.to_string(),
                    });
                }
            }
        }

        let name = name.ok_or_else(|| ManifestError::MissingName { path: display_path.to_string() })?;
        let entry = entry.ok_or_else(|| ManifestError::MissingEntry { path: display_path.to_string() })?;
        Ok(Manifest { name, entry })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_manifest() {
        let m = Manifest::parse("name demo\nentry main\n", "anchor").unwrap();
        assert_eq!(m.name, "demo");
        assert_eq!(m.entry, "main");
    }

    #[test]
    fn blank_lines_are_permitted() {
        let m = Manifest::parse("name demo\n\n\nentry pkg.main\n", "anchor").unwrap();
        assert_eq!(m.entry, "pkg.main");
    }

    #[test]
    fn unknown_key_is_an_error() {
        let err = Manifest::parse("name demo\nentry main\nbogus value\n", "anchor").unwrap_err();
        assert!(matches!(err, ManifestError::UnknownKey { .. }));
    }

    #[test]
    fn missing_required_key_is_an_error() {
        let err = Manifest::parse("name demo\n", "anchor").unwrap_err();
        assert!(matches!(err, ManifestError::MissingEntry { .. }));
    }
}
