//! Progress reporting for fetch-verify runs.

use crate::artefact::download::FetchOutcome;
use camino::Utf8Path;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; ignore write failures.
    }
}

/// Describe how a target path was populated.
#[must_use]
pub fn fetch_message(outcome: FetchOutcome, target: &Utf8Path) -> String {
    match outcome {
        FetchOutcome::AlreadyPresent => format!("Using cached {target}; re-verifying checksum..."),
        FetchOutcome::Downloaded => format!("Downloaded {target}; verifying checksum..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_stderr_line_appends_newline() {
        let mut sink = Vec::new();
        write_stderr_line(&mut sink, "checking");
        assert_eq!(sink, b"checking\n");
    }

    #[test]
    fn cached_message_mentions_reverification() {
        let msg = fetch_message(FetchOutcome::AlreadyPresent, Utf8Path::new("data/a.zip"));
        assert!(msg.contains("data/a.zip"));
        assert!(msg.contains("re-verifying"));
    }
}
