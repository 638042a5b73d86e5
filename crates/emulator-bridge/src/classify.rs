//! Creation Failure Classification
//!
//! `avdmanager` reports several distinct problems with the same text. Which
//! stream the text lands on tells them apart.

use avdkit_core::AvdError;

/// Output stream of a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Known failure classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The system image package is not installed
    InvalidTarget,
    /// The package exists for several ABIs and none was chosen
    AmbiguousAbi,
}

/// A classification rule: text on a stream means a failure kind
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub stream: Stream,
    pub needle: &'static str,
    pub kind: FailureKind,
}

const PACKAGE_PATH_INVALID: &str = "Error: Package path is not valid";

/// Rules in evaluation order
pub static RULES: &[Rule] = &[
    Rule {
        stream: Stream::Stderr,
        needle: PACKAGE_PATH_INVALID,
        kind: FailureKind::InvalidTarget,
    },
    Rule {
        stream: Stream::Stdout,
        needle: PACKAGE_PATH_INVALID,
        kind: FailureKind::AmbiguousAbi,
    },
];

/// First rule matching the captured output
pub fn classify(stdout: &str, stderr: &str) -> Option<FailureKind> {
    RULES
        .iter()
        .find(|rule| {
            let text = match rule.stream {
                Stream::Stdout => stdout,
                Stream::Stderr => stderr,
            };
            text.contains(rule.needle)
        })
        .map(|rule| rule.kind)
}

impl FailureKind {
    /// Error naming the package, carrying the stream that matched
    pub fn into_error(self, package: &str, stdout: &str, stderr: &str) -> AvdError {
        let package = package.to_string();
        match self {
            FailureKind::InvalidTarget => AvdError::InvalidTarget {
                package,
                output: stderr.to_string(),
            },
            FailureKind::AmbiguousAbi => AvdError::AmbiguousAbi {
                package,
                output: stdout.to_string(),
            },
        }
    }
}
