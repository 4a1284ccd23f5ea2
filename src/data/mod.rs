//! Core data models for the acronym resolver
//!
//! This module contains the record type produced by the XML parser and the
//! cache, and the typed result returned by every resolution operation.

pub mod parser;
pub mod remote;

pub use parser::{parse, ParseError};
pub use remote::{AcronymSource, RemoteClient};

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One expansion of an acronym
///
/// An acronym may have several expansions; each one is a separate record
/// sharing the same `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcronymRecord {
    /// The acronym itself, e.g. "FAQ"
    pub name: String,
    /// What the acronym stands for
    pub expansion: String,
    /// Optional free-form comment from the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Dewey classification code, if the server sent one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification_code: Option<String>,
    /// When the expansion was added on the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl AcronymRecord {
    /// Creates a record with only the required fields set
    pub fn new(name: impl Into<String>, expansion: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expansion: expansion.into(),
            comment: None,
            classification_code: None,
            added_at: None,
        }
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    pub fn with_classification_code(mut self, code: Option<String>) -> Self {
        self.classification_code = code;
        self
    }

    pub fn with_added_at(mut self, added_at: Option<DateTime<Utc>>) -> Self {
        self.added_at = added_at;
        self
    }
}

impl fmt::Display for AcronymRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.expansion)
    }
}

/// Why a resolution succeeded or failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusKind {
    /// Records are present (possibly empty)
    Ok,
    /// No connection could be opened to the server
    NetworkUnreachable,
    /// Connected, but no usable response was received
    CommunicationFailure {
        /// Status observed before the failure; `None` if none was read
        http_status: Option<u16>,
    },
    /// The server answered with something that is not well-formed XML
    ParseFailure,
    /// The cache database could not be read or written
    StorageFailure,
    /// The acronym was empty after sanitization
    InvalidInput,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::Ok => write!(f, "ok"),
            StatusKind::NetworkUnreachable => {
                write!(f, "Cannot connect to the acronym server. Check your network connection.")
            }
            StatusKind::CommunicationFailure {
                http_status: Some(status),
            } => write!(f, "The acronym server did not answer properly (HTTP {}).", status),
            StatusKind::CommunicationFailure { http_status: None } => {
                write!(f, "The acronym server did not answer properly.")
            }
            StatusKind::ParseFailure => {
                write!(f, "The acronym server sent a response that could not be read.")
            }
            StatusKind::StorageFailure => write!(f, "The local acronym cache is unavailable."),
            StatusKind::InvalidInput => write!(
                f,
                "Invalid acronym: use only letters, digits, '.', '_' and '-'."
            ),
        }
    }
}

/// Outcome of a resolve, list or clear operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    /// Present (possibly empty) on success, absent on failure
    pub records: Option<Vec<AcronymRecord>>,
    /// What happened
    pub status: StatusKind,
    /// HTTP status returned by the server, when the network was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Whether the records came from a cache entry older than the TTL
    pub is_stale: bool,
}

impl ResolutionResult {
    /// Successful result holding `records`
    pub fn success(records: Vec<AcronymRecord>) -> Self {
        Self {
            records: Some(records),
            status: StatusKind::Ok,
            http_status: None,
            is_stale: false,
        }
    }

    /// Failed result with no records
    pub fn failure(status: StatusKind) -> Self {
        let http_status = match status {
            StatusKind::CommunicationFailure { http_status } => http_status,
            _ => None,
        };
        Self {
            records: None,
            status,
            http_status,
            is_stale: false,
        }
    }

    pub fn with_http_status(mut self, http_status: u16) -> Self {
        self.http_status = Some(http_status);
        self
    }

    pub fn with_stale(mut self, is_stale: bool) -> Self {
        self.is_stale = is_stale;
        self
    }

    /// True when records are present
    pub fn is_success(&self) -> bool {
        self.records.is_some()
    }

    /// The records, or an empty slice on failure
    pub fn records(&self) -> &[AcronymRecord] {
        self.records.as_deref().unwrap_or(&[])
    }
}
