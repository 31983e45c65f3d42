//! Lexicon file loading
//!
//! Replaces the built-in keyword table with one read from disk. `.json`
//! files are parsed as JSON, anything else as TOML.

use dispatch_domain::Lexicon;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LexiconLoadError {
    #[error("Cannot read lexicon {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid lexicon {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Lexicon {path} has no keyword entries")]
    Empty { path: PathBuf },
}

/// Read and parse a lexicon file.
pub fn load_lexicon(path: &Path) -> Result<Lexicon, LexiconLoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LexiconLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let parsed: Result<Lexicon, String> = if is_json {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        toml::from_str(&content).map_err(|e| e.to_string())
    };
    let lexicon = parsed.map_err(|message| LexiconLoadError::Parse {
        path: path.to_path_buf(),
        message,
    })?;

    if lexicon.entries.is_empty() {
        return Err(LexiconLoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    info!(
        "Loaded lexicon {} from {} ({} entries, {} overrides)",
        lexicon.version,
        path.display(),
        lexicon.entries.len(),
        lexicon.overrides.len()
    );
    Ok(lexicon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_domain::AgentType;

    #[test]
    fn test_load_toml_lexicon() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.toml");
        std::fs::write(
            &path,
            r#"
version = "custom-1"
overrides = []
high_complexity_qualifiers = ["exhaustive"]
low_complexity_qualifiers = []

[[entries]]
agent = "automation"
phrase = "cron"
base_weight = 4
"#,
        )
        .unwrap();

        let lexicon = load_lexicon(&path).unwrap();
        assert_eq!(lexicon.version, "custom-1");
        assert_eq!(lexicon.entries[0].agent, AgentType::Automation);
        assert!(lexicon.deferrals.is_empty());
    }

    #[test]
    fn test_builtin_lexicon_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.json");
        std::fs::write(&path, serde_json::to_string(&Lexicon::default()).unwrap()).unwrap();

        assert_eq!(load_lexicon(&path).unwrap(), Lexicon::default());
    }

    #[test]
    fn test_empty_lexicon_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.toml");
        std::fs::write(
            &path,
            "version = \"x\"\nentries = []\noverrides = []\nhigh_complexity_qualifiers = []\nlow_complexity_qualifiers = []\n",
        )
        .unwrap();

        assert!(matches!(
            load_lexicon(&path),
            Err(LexiconLoadError::Empty { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_lexicon(Path::new("/nonexistent/lexicon.toml")).unwrap_err();
        assert!(matches!(err, LexiconLoadError::Io { .. }));
    }
}
