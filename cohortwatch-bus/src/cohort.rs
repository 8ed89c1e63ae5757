//! Cohort names and the topic naming convention.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest cohort name accepted. Iggy caps names at 255 bytes and the
/// default prefix and suffix take the rest.
pub const MAX_COHORT_LEN: usize = 200;

/// A validated cohort identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CohortName(String);

impl CohortName {
    /// Validate and wrap a cohort name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let reason = if name.trim().is_empty() {
            Some("must not be empty")
        } else if name.len() > MAX_COHORT_LEN {
            Some("is too long")
        } else if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            Some("must not contain whitespace or control characters")
        } else if name.contains('/') {
            Some("must not contain '/'")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::InvalidCohort { name, reason }),
            None => Ok(Self(name)),
        }
    }

    /// Borrow the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CohortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CohortName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CohortName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CohortName> for String {
    fn from(value: CohortName) -> Self {
        value.0
    }
}

impl std::str::FromStr for CohortName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Fixed prefix/suffix convention mapping a cohort to its topic.
///
/// The defaults match the Open Metadata repository services deployment, so
/// producers already writing to `<prefix><cohort><suffix>` are picked up
/// without changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicNaming {
    /// Text placed before the cohort name.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Text placed after the cohort name.
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

fn default_prefix() -> String {
    "open-metadata.repository-services.cohort.".to_string()
}

fn default_suffix() -> String {
    ".OMRSTopic".to_string()
}

impl Default for TopicNaming {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            suffix: default_suffix(),
        }
    }
}

impl TopicNaming {
    /// Topic name carrying the events of `cohort`.
    #[must_use]
    pub fn topic_for(&self, cohort: &CohortName) -> String {
        format!("{}{}{}", self.prefix, cohort, self.suffix)
    }
}
