//! Digest comparison and the policy applied to files that fail it.
//!
//! Comparison never errors: a mismatch is a normal, reportable outcome.
//! Deciding what a mismatch means is left to the orchestrator.

use serde::Deserialize;
use std::fmt;

/// Whether a computed digest matched the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationStatus {
    /// The digests are equal.
    Match,
    /// The digests differ.
    Mismatch,
}

/// The outcome of a single digest comparison.
///
/// # Examples
///
/// ```
/// use stackyard_fetcher::artefact::verification::{verify_digest, VerificationStatus};
///
/// let result = verify_digest("ABCDEF", "abcdef");
/// assert_eq!(result.status(), VerificationStatus::Match);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    status: VerificationStatus,
    found: String,
    expected: String,
}

impl Verification {
    /// The comparison result.
    #[must_use]
    pub const fn status(&self) -> VerificationStatus {
        self.status
    }

    /// Return true when the digests matched.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.status == VerificationStatus::Match
    }

    /// The digest computed from the file.
    #[must_use]
    pub fn found(&self) -> &str {
        &self.found
    }

    /// The digest the caller expected.
    #[must_use]
    pub fn expected(&self) -> &str {
        &self.expected
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            VerificationStatus::Match => write!(f, "digest {} matches", self.found),
            VerificationStatus::Mismatch => write!(
                f,
                "digest mismatch: found={}, expected={}",
                self.found, self.expected
            ),
        }
    }
}

/// Compare two hex digests, ignoring ASCII case and surrounding whitespace.
#[must_use]
pub fn verify_digest(found: &str, expected: &str) -> Verification {
    let status = if found.trim().eq_ignore_ascii_case(expected.trim()) {
        VerificationStatus::Match
    } else {
        VerificationStatus::Mismatch
    };
    Verification {
        status,
        found: found.to_owned(),
        expected: expected.to_owned(),
    }
}

/// What to do with a file whose digest does not match.
///
/// Either way the file is removed from the target path, so a later run
/// cannot mistake it for a trusted cached copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchAction {
    /// Remove the file.
    #[default]
    Delete,
    /// Move the file to `<target>.untrusted` for inspection.
    Quarantine,
}

impl fmt::Display for MismatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => write!(f, "delete untrusted file"),
            Self::Quarantine => write!(f, "quarantine untrusted file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const HELLO: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
    const HELLO_UPPER: &str = "2CF24DBA5FB0A30E26E83B2AC5B9E29E1B161E5C1FA7425E73043362938B9824";
    const HELLO_MIXED: &str = "2Cf24dBa5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
    const HELLO_PADDED: &str = " 2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824\n";
    const ONE_CHAR_OFF: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9825";

    #[rstest]
    #[case::identical(HELLO, HELLO)]
    #[case::upper_expected(HELLO, HELLO_UPPER)]
    #[case::mixed_case(HELLO_MIXED, HELLO)]
    #[case::padded(HELLO, HELLO_PADDED)]
    fn equal_digests_match(#[case] found: &str, #[case] expected: &str) {
        let result = verify_digest(found, expected);
        assert_eq!(result.status(), VerificationStatus::Match);
        assert!(result.is_match());
    }

    #[rstest]
    #[case::short("deadbeef")]
    #[case::empty("")]
    #[case::one_char_off(ONE_CHAR_OFF)]
    fn different_digests_mismatch(#[case] expected: &str) {
        let result = verify_digest(HELLO, expected);
        assert_eq!(result.status(), VerificationStatus::Mismatch);
        assert_eq!(result.found(), HELLO);
        assert_eq!(result.expected(), expected);
    }

    #[test]
    fn mismatch_display_reports_both_digests() {
        let result = verify_digest(HELLO, "deadbeef");
        let text = result.to_string();
        assert!(text.contains("deadbeef"));
        assert!(text.contains(HELLO));
    }

    #[test]
    fn default_mismatch_action_deletes() {
        assert_eq!(MismatchAction::default(), MismatchAction::Delete);
    }
}
