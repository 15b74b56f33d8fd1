//! # Gateway Vocabulary
//!
//! HTTP verbs, stage logging levels, and the per-method option set. These
//! are the closed enumerations of the gateway domain; every variant carries
//! the exact wire spelling a backend expects.

use serde::{Deserialize, Serialize};

/// HTTP verb attached to a method integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpVerb {
    /// Wire spelling of the verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stage execution-log verbosity.
///
/// The fixed tier table uses `Info` for dev and `Error` for prod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoggingLevel {
    Off,
    Error,
    Info,
}

impl LoggingLevel {
    /// Wire spelling of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Error => "ERROR",
            Self::Info => "INFO",
        }
    }
}

impl std::fmt::Display for LoggingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Uniform option set applied to every method integration.
///
/// The composer applies one option set across the whole method list; per
/// the front-end contract every call must present a credential key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodOptions {
    /// Whether callers must present an API key.
    pub api_key_required: bool,
}

impl MethodOptions {
    /// The option set the front end applies: credential key mandatory.
    pub fn credential_required() -> Self {
        Self {
            api_key_required: true,
        }
    }
}
