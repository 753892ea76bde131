//! Credential redaction for text that may end up in findings or logs.
//!
//! Provider adapters carry tokens and passwords; their error text can echo
//! request headers or URLs with embedded credentials.

use std::sync::OnceLock;

use regex::Regex;

/// Replacement text for redacted secrets.
pub const REDACTED: &str = "[REDACTED]";

struct RedactionRule {
    pattern: Regex,
    replacement: &'static str,
}

fn rules() -> &'static [RedactionRule] {
    static RULES: OnceLock<Vec<RedactionRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"(?i)\b(bearer|token|basic)\s+[a-zA-Z0-9\-._~+/]+=*", "$1 [REDACTED]"),
            (
                r"(?i)\b(access_token|github_access_token|password|jenkins_password)=\S+",
                "$1=[REDACTED]",
            ),
            (r"(?i)(https?://)[^/\s:@]+:[^/\s@]+@", "${1}[REDACTED]@"),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(pattern)
                .ok()
                .map(|pattern| RedactionRule { pattern, replacement })
        })
        .collect()
    })
}

/// Redact credential-shaped substrings and any explicitly known secrets.
pub fn redact(text: &str, secrets: &[&str]) -> String {
    let mut out = text.to_string();
    for secret in secrets.iter().filter(|s| !s.is_empty()) {
        out = out.replace(secret, REDACTED);
    }
    for rule in rules() {
        out = rule.pattern.replace_all(&out, rule.replacement).into_owned();
    }
    out
}
