//! Seed datasets for the in-memory store.

use std::io;
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use serde::{Deserialize, Serialize};

use crate::domain::{MemberTier, Post, Profile, Subscription, User};

/// Records grouped by kind, as stored in a JSON seed file.
///
/// Every list is optional in the file and defaults to empty.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Dataset {
    pub member_types: Vec<MemberTier>,
    pub users: Vec<User>,
    pub profiles: Vec<Profile>,
    pub posts: Vec<Post>,
    pub subscriptions: Vec<Subscription>,
}

/// Errors raised while loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse dataset {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("dataset contains duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: String },
}

impl Dataset {
    /// Read a dataset from a JSON file through `cap_std`.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let contents = read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| DatasetError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn read_to_string(path: &Path) -> io::Result<String> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path has no file name: {}", path.display()),
        )
    })?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
    directory.read_to_string(Path::new(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MemberTierId;
    use rstest::rstest;

    fn bundled_seed() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("fixtures")
            .join("seed.json")
    }

    #[rstest]
    fn bundled_seed_parses() {
        let dataset = Dataset::load(&bundled_seed()).expect("seed loads");
        assert_eq!(dataset.member_types.len(), MemberTierId::ALL.len());
        assert!(!dataset.users.is_empty());
        assert!(!dataset.subscriptions.is_empty());
    }

    #[rstest]
    fn missing_files_report_their_path() {
        let path = std::env::temp_dir().join("feedgraph-missing-seed.json");
        let err = Dataset::load(&path).expect_err("file is absent");
        assert!(matches!(err, DatasetError::Read { .. }));
        assert!(err.to_string().contains("feedgraph-missing-seed.json"));
    }

    #[rstest]
    fn unknown_sections_are_rejected() {
        let result = serde_json::from_str::<Dataset>(r#"{"comments": []}"#);
        assert!(result.is_err());
    }

    #[rstest]
    fn omitted_sections_default_to_empty() {
        let dataset: Dataset = serde_json::from_str(r#"{"users": []}"#).expect("parse");
        assert_eq!(dataset, Dataset::default());
    }
}
