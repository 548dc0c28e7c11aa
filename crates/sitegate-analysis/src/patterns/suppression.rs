//! Inline suppression: `sitegate-ignore` comments.

/// Directive that suppresses matches on its own line and the line below.
pub const DIRECTIVE: &str = "sitegate-ignore";

/// Checks whether a match is suppressed by a `sitegate-ignore` comment.
///
/// Supports:
/// - `<!-- sitegate-ignore -->` suppresses all rules
/// - `// sitegate-ignore security/debug-mode` suppresses one rule
/// - `/* sitegate-ignore security/dom-injection, security/diagnostic-output */`
pub struct SuppressionChecker<'a> {
    lines: Vec<&'a str>,
}

impl<'a> SuppressionChecker<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().collect(),
        }
    }

    /// Whether `rule_id` is suppressed at 1-based `line`.
    pub fn is_suppressed(&self, line: u32, rule_id: &str) -> bool {
        if line == 0 {
            return false;
        }
        let idx = (line - 1) as usize;
        if self
            .lines
            .get(idx)
            .is_some_and(|l| line_suppresses(l, rule_id))
        {
            return true;
        }
        idx > 0
            && self
                .lines
                .get(idx - 1)
                .is_some_and(|l| line_suppresses(l, rule_id))
    }
}

fn line_suppresses(line: &str, rule_id: &str) -> bool {
    let Some(pos) = line.find(DIRECTIVE) else {
        return false;
    };
    let before = &line[..pos];
    let is_comment = before.contains("<!--")
        || before.contains("//")
        || before.contains("/*")
        || before.contains('#');
    if !is_comment {
        return false;
    }

    let after = line[pos + DIRECTIVE.len()..].trim_start();
    let after = after
        .split("-->")
        .next()
        .unwrap_or_default()
        .split("*/")
        .next()
        .unwrap_or_default()
        .trim();
    if after.is_empty() {
        return true;
    }
    let short = rule_id.rsplit('/').next().unwrap_or(rule_id);
    after
        .split(',')
        .map(str::trim)
        .any(|r| r == rule_id || r == short)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_directive_suppresses_everything() {
        let checker = SuppressionChecker::new("<!-- sitegate-ignore -->\n<script>eval(x)</script>");
        assert!(checker.is_suppressed(2, "security/dom-injection"));
        assert!(checker.is_suppressed(1, "security/debug-mode"));
        assert!(!SuppressionChecker::new("a\nb\nc").is_suppressed(3, "x"));
    }

    #[test]
    fn rule_list_is_respected() {
        let src = "x = 1; // sitegate-ignore security/dom-injection, diagnostic-output\ny";
        let checker = SuppressionChecker::new(src);
        assert!(checker.is_suppressed(1, "security/dom-injection"));
        assert!(checker.is_suppressed(2, "security/diagnostic-output"));
        assert!(!checker.is_suppressed(1, "security/debug-mode"));
    }

    #[test]
    fn directive_outside_comment_is_ignored() {
        let checker = SuppressionChecker::new("<p>sitegate-ignore</p>");
        assert!(!checker.is_suppressed(1, "security/dom-injection"));
    }

    #[test]
    fn two_lines_below_is_not_suppressed() {
        let checker = SuppressionChecker::new("/* sitegate-ignore */\n\neval(a)");
        assert!(!checker.is_suppressed(3, "security/dom-injection"));
    }
}
