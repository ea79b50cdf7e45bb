//! Project status values and their progress steps

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an audit project
///
/// Normal progression is `Queued -> Crawling -> Analyzing -> Compiling ->
/// GeneratingReport -> Completed`. `Failed` and `Error` are terminal and
/// reachable from any non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Queued,
    Crawling,
    Analyzing,
    Compiling,
    GeneratingReport,
    Completed,
    /// The crawl could not run or produced nothing
    Failed,
    /// A fault after crawling (scoring, report) ended the run
    Error,
}

impl ProjectStatus {
    /// Progress step shown as `Step n/5`; `None` for failure states, which
    /// keep whatever step the project had reached.
    #[must_use]
    pub const fn step(self) -> Option<u8> {
        match self {
            Self::Queued => Some(0),
            Self::Crawling => Some(1),
            Self::Analyzing => Some(2),
            Self::Compiling => Some(3),
            Self::GeneratingReport => Some(4),
            Self::Completed => Some(5),
            Self::Failed | Self::Error => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Error)
    }

    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Error)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Crawling => "crawling",
            Self::Analyzing => "analyzing",
            Self::Compiling => "compiling",
            Self::GeneratingReport => "generating_report",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "crawling" => Ok(Self::Crawling),
            "analyzing" => Ok(Self::Analyzing),
            "compiling" => Ok(Self::Compiling),
            "generating_report" => Ok(Self::GeneratingReport),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown project status: {other}")),
        }
    }
}

/// One status write: status, progress step and human-readable label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: ProjectStatus,
    pub step: u8,
    pub message: String,
}
