//! Pattern matching engine for suspicion scoring.

use crate::core::config::ScoringMode;
use crate::detection::signature::{builtin_signatures, Signature};

/// An immutable ordered signature collection plus its scoring strategy.
///
/// Constructed once at process start; scoring walks every signature
/// independently, so ordering never affects the total.
pub struct PatternSet {
    signatures: Vec<Signature>,
    mode: ScoringMode,
}

impl PatternSet {
    /// Create a pattern set from an explicit signature list.
    pub fn new(signatures: Vec<Signature>, mode: ScoringMode) -> Self {
        Self { signatures, mode }
    }

    /// Create a pattern set with the built-in web-shell inventory.
    pub fn builtin(mode: ScoringMode) -> Self {
        Self::new(builtin_signatures(), mode)
    }

    /// Number of signatures in the set.
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// The active scoring mode.
    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    /// Compute the suspicion score for decoded file content.
    ///
    /// PerFile counts each matching signature once; PerLine counts one per
    /// (signature, line) pair with no cap and no deduplication.
    pub fn score(&self, content: &str) -> u32 {
        match self.mode {
            ScoringMode::PerFile => self
                .signatures
                .iter()
                .filter(|sig| sig.matches(content))
                .count() as u32,
            ScoringMode::PerLine => content
                .lines()
                .map(|line| {
                    self.signatures
                        .iter()
                        .filter(|sig| sig.matches(line))
                        .count() as u32
                })
                .sum(),
        }
    }

    /// Names of the signatures matching anywhere in the content.
    ///
    /// Used for diagnostics on flagged files; independent of scoring mode.
    pub fn matched_names(&self, content: &str) -> Vec<&str> {
        self.signatures
            .iter()
            .filter(|sig| sig.matches(content))
            .map(|sig| sig.name.as_str())
            .collect()
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::builtin(ScoringMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_set(mode: ScoringMode) -> PatternSet {
        PatternSet::new(
            vec![
                Signature::substring("eval_call", "eval("),
                Signature::substring("get_superglobal", "$_GET"),
                Signature::pattern("b374k_shell", r"(?i)b374k"),
            ],
            mode,
        )
    }

    #[test]
    fn test_additive_scoring() {
        let set = test_set(ScoringMode::PerLine);
        // Two distinct signatures present: score at least 2.
        let score = set.score("eval($_GET['x']);");
        assert!(score >= 2, "expected >= 2, got {}", score);
    }

    #[test]
    fn test_per_line_counts_each_line() {
        let set = test_set(ScoringMode::PerLine);
        let content = "eval($a);\neval($b);\neval($c);\n";
        assert_eq!(set.score(content), 3);
    }

    #[test]
    fn test_per_file_counts_each_signature_once() {
        let set = test_set(ScoringMode::PerFile);
        let content = "eval($a);\neval($b);\neval($c);\n";
        assert_eq!(set.score(content), 1);

        // Three signatures present, each counted once.
        let content = "eval($_GET['x']); // b374k\neval($_GET['y']);\n";
        assert_eq!(set.score(content), 3);
    }

    #[test]
    fn test_per_line_not_capped_per_line() {
        let set = test_set(ScoringMode::PerLine);
        // One line matching two signatures contributes 2.
        assert_eq!(set.score("eval($_GET['x']);"), 2);
    }

    #[test]
    fn test_clean_content_scores_zero() {
        let set = PatternSet::builtin(ScoringMode::PerLine);
        let content = "<?php\necho 'hello world';\n$total = 1 + 2;\n";
        assert_eq!(set.score(content), 0);
    }

    #[test]
    fn test_empty_content() {
        let set = PatternSet::builtin(ScoringMode::PerLine);
        assert_eq!(set.score(""), 0);
    }

    #[test]
    fn test_matched_names() {
        let set = test_set(ScoringMode::PerLine);
        let names = set.matched_names("eval($_GET['x']); /* B374K */");
        assert_eq!(names, vec!["eval_call", "get_superglobal", "b374k_shell"]);
    }

    #[test]
    fn test_builtin_flags_webshell_sample() {
        let set = PatternSet::builtin(ScoringMode::PerLine);
        let shell = concat!(
            "<?php\n",
            "error_reporting(0);\n",
            "ignore_user_abort(true);\n",
            "eval(base64_decode($_POST['payload']));\n",
        );
        assert!(set.score(shell) >= 5);
    }
}
