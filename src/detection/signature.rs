//! Suspicion signatures and the built-in web-shell inventory.

use regex::Regex;

/// How a signature matches content.
#[derive(Debug, Clone)]
enum Matcher {
    /// Case-sensitive literal substring.
    Substring(String),
    /// Compiled regular expression; built-in patterns embed `(?i)`.
    Pattern(Regex),
}

/// A single suspicion signature.
#[derive(Debug, Clone)]
pub struct Signature {
    /// Short name used in diagnostics
    pub name: String,
    matcher: Matcher,
}

impl Signature {
    /// Create a literal substring signature (case-sensitive).
    pub fn substring(name: impl Into<String>, literal: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            matcher: Matcher::Substring(literal.into()),
        }
    }

    /// Create a regex signature from a known-valid expression.
    pub fn pattern(name: impl Into<String>, expr: &str) -> Self {
        Self {
            name: name.into(),
            matcher: Matcher::Pattern(Regex::new(expr).unwrap()),
        }
    }

    /// Check whether this signature matches anywhere in `text`.
    pub fn matches(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Substring(s) => text.contains(s.as_str()),
            Matcher::Pattern(re) => re.is_match(text),
        }
    }
}

/// The fixed signature inventory for web-shell and backdoor content.
///
/// Substrings match the literal call sites attackers rarely bother to
/// disguise; regexes cover the spacing and casing variants they do.
pub fn builtin_signatures() -> Vec<Signature> {
    vec![
        // Dangerous call sites
        Signature::substring("eval_call", "eval("),
        Signature::substring("system_call", "system("),
        Signature::substring("exec_call", "exec("),
        Signature::substring("shell_exec", "shell_exec"),
        Signature::substring("passthru", "passthru"),
        Signature::substring("assert_call", "assert("),
        Signature::substring("create_function", "create_function"),
        Signature::substring("base64_decode", "base64_decode"),
        Signature::substring("gzinflate", "gzinflate"),
        Signature::substring("str_rot13", "str_rot13"),
        // Superglobal / user-input access
        Signature::substring("get_superglobal", "$_GET"),
        Signature::substring("post_superglobal", "$_POST"),
        Signature::substring("request_superglobal", "$_REQUEST"),
        Signature::substring("server_superglobal", "$_SERVER"),
        Signature::substring("files_superglobal", "$_FILES"),
        Signature::substring("cookie_superglobal", "$_COOKIE"),
        Signature::substring("globals_array", "$GLOBALS"),
        Signature::pattern(
            "input_eval_chain",
            r#"(?i)(eval|assert)\s*\(\s*\$_(GET|POST|REQUEST|COOKIE)"#,
        ),
        // Obfuscation / anti-forensics markers
        Signature::pattern("error_reporting_off", r"(?i)error_reporting\s*\(\s*0\s*\)"),
        Signature::substring("ignore_user_abort", "ignore_user_abort"),
        Signature::substring("set_time_limit", "set_time_limit"),
        // Outbound network / process primitives
        Signature::substring("curl_exec", "curl_exec"),
        Signature::substring("fsockopen", "fsockopen"),
        Signature::substring("proc_open", "proc_open"),
        // Filesystem / stream tampering
        Signature::substring("file_put_contents", "file_put_contents"),
        Signature::substring("php_input_stream", "php://input"),
        Signature::substring("phar_stream", "phar://"),
        Signature::substring("data_stream", "data://"),
        // Known backdoor families
        Signature::pattern("c99_shell", r"(?i)(c99shell|c99_buff_prepare|c99sh_)"),
        Signature::pattern("r57_shell", r"(?i)(r57shell|r57_|r57genpass)"),
        Signature::pattern("b374k_shell", r"(?i)b374k"),
        Signature::pattern("wso_shell", r"(?i)(wso_version|FilesMan)"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_is_case_sensitive() {
        let sig = Signature::substring("eval_call", "eval(");
        assert!(sig.matches("<?php eval($code); ?>"));
        assert!(!sig.matches("<?php EVAL($code); ?>"));
    }

    #[test]
    fn test_pattern_is_case_insensitive() {
        let sig = Signature::pattern("b374k_shell", r"(?i)b374k");
        assert!(sig.matches("/* B374K mini shell */"));
        assert!(sig.matches("b374k"));
    }

    #[test]
    fn test_builtin_inventory_compiles() {
        let sigs = builtin_signatures();
        assert!(sigs.len() >= 30);
    }

    #[test]
    fn test_builtin_covers_known_families() {
        let sigs = builtin_signatures();
        let hits = |text: &str| {
            sigs.iter()
                .filter(|s| s.matches(text))
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
        };

        assert!(hits("echo c99shell_version;").contains(&"c99_shell"));
        assert!(hits("$x = 'FilesMan';").contains(&"wso_shell"));
        assert!(hits("error_reporting ( 0 );").contains(&"error_reporting_off"));
        assert!(hits("eval ($_POST['cmd']);").contains(&"input_eval_chain"));
        assert!(hits("include 'phar://evil.phar/x';").contains(&"phar_stream"));
    }
}
