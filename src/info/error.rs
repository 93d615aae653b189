//! Error types
//!
//! Parsing itself never fails: text the grammar cannot read becomes a fallback message.
//! The errors here cover directory lookups (recoverable, usually swallowed at the point of
//! bulk resolution) and loading directory snapshots from disk.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// A directory has no entry for a reference on the requested date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no teacher matches {reference:?}{}", on_date(.date))]
    TeacherNotFound {
        reference: String,
        date: Option<NaiveDate>,
    },
}

fn on_date(date: &Option<NaiveDate>) -> String {
    match date {
        Some(date) => format!(" on {date}"),
        None => String::new(),
    }
}

/// Failure to read a directory snapshot (teachers, classes, forms, rooms).
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not decode {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_error_mentions_date_when_known() {
        let err = LookupError::TeacherNotFound {
            reference: "Frau Muster".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 6, 5),
        };
        assert_eq!(err.to_string(), "no teacher matches \"Frau Muster\" on 2023-06-05");

        let err = LookupError::TeacherNotFound {
            reference: "MUS".to_string(),
            date: None,
        };
        assert_eq!(err.to_string(), "no teacher matches \"MUS\"");
    }
}
