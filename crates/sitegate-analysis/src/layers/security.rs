//! Security Posture Layer: request-data echo, debug flags, leaked errors,
//! DOM injection sinks, diagnostic output, and missing response headers.

use sitegate_core::errors::LayerError;
use sitegate_core::types::{Finding, LayerId, Location, Severity};

use super::{DiagnosticLayer, FindingSink, LayerContext};
use crate::fetcher::Page;
use crate::markup::LineIndex;
use crate::patterns::{PatternDef, PatternTable, SuppressionChecker};

pub const MISSING_HEADER_RULE: &str = "security/missing-header";

pub const SECURITY_PATTERNS: &[PatternDef] = &[
    // Unsanitized request data
    PatternDef {
        id: "security/unsanitized-input",
        category: "injection",
        pattern: r#"(?i)(?:\becho\b|\bprint\b|<\?=)\s*\(?\s*\$_(?:GET|POST|REQUEST|COOKIE)\b"#,
        severity: Severity::Critical,
        message: "Request parameter echoed into the page without escaping",
    },
    PatternDef {
        id: "security/unsanitized-input",
        category: "injection",
        pattern: r#"(?i)(?:\becho\b|\bprint\b|<\?=)\s*\(?\s*\$_SERVER\s*\[\s*['"](?:PHP_SELF|REQUEST_URI|QUERY_STRING)['"]"#,
        severity: Severity::Critical,
        message: "Request URI echoed into the page without escaping",
    },
    // Debug configuration
    PatternDef {
        id: "security/debug-mode",
        category: "configuration",
        pattern: r#"(?i)define\s*\(\s*['"]WP_DEBUG(?:_DISPLAY)?['"]\s*,\s*true\s*\)"#,
        severity: Severity::High,
        message: "WordPress debug mode is enabled",
    },
    PatternDef {
        id: "security/debug-mode",
        category: "configuration",
        pattern: r#"(?i)\bdisplay_errors['"]?\s*[=,]\s*['"]?(?:on|1|true)\b"#,
        severity: Severity::High,
        message: "PHP display_errors is enabled",
    },
    PatternDef {
        id: "security/debug-mode",
        category: "configuration",
        pattern: r"(?im)^\s*APP_DEBUG\s*=\s*true\b",
        severity: Severity::High,
        message: "APP_DEBUG is enabled",
    },
    PatternDef {
        id: "security/debug-mode",
        category: "configuration",
        pattern: r"(?m)^\s*DEBUG\s*=\s*True\b",
        severity: Severity::High,
        message: "Django DEBUG is enabled",
    },
    // Leaked errors
    PatternDef {
        id: "security/error-output",
        category: "disclosure",
        pattern: r"(?i)<b>\s*(?:warning|notice|fatal error|parse error|deprecated)\s*</b>\s*:",
        severity: Severity::High,
        message: "PHP error message rendered in the page",
    },
    PatternDef {
        id: "security/error-output",
        category: "disclosure",
        pattern: r"\b(?:Fatal error|Parse error|Warning|Notice|Deprecated): .{0,200}? in /[^\s<]+ on line \d+",
        severity: Severity::High,
        message: "PHP error with server path rendered in the page",
    },
    PatternDef {
        id: "security/error-output",
        category: "disclosure",
        pattern: r"Traceback \(most recent call last\)|Stack trace:\s*(?:<br\s*/?>)?\s*#0",
        severity: Severity::High,
        message: "Stack trace rendered in the page",
    },
    // DOM injection sinks
    PatternDef {
        id: "security/dom-injection",
        category: "dom",
        pattern: r"\.(?:inner|outer)HTML\s*=[^=]",
        severity: Severity::Medium,
        message: "Markup assigned through innerHTML/outerHTML",
    },
    PatternDef {
        id: "security/dom-injection",
        category: "dom",
        pattern: r"\bdocument\.write(?:ln)?\s*\(",
        severity: Severity::Medium,
        message: "document.write call",
    },
    PatternDef {
        id: "security/dom-injection",
        category: "dom",
        pattern: r"\.insertAdjacentHTML\s*\(",
        severity: Severity::Medium,
        message: "insertAdjacentHTML call",
    },
    PatternDef {
        id: "security/dom-injection",
        category: "dom",
        pattern: r"\beval\s*\(",
        severity: Severity::Medium,
        message: "eval call",
    },
    // Diagnostic output
    PatternDef {
        id: "security/diagnostic-output",
        category: "hygiene",
        pattern: r"\bconsole\.(?:log|debug|trace|dir|info)\s*\(",
        severity: Severity::Low,
        message: "Console diagnostic output left in page script",
    },
    PatternDef {
        id: "security/diagnostic-output",
        category: "hygiene",
        pattern: r"\b(?:var_dump|print_r|debug_zval_dump)\s*\(",
        severity: Severity::Low,
        message: "PHP debug dump left in page",
    },
];

struct HeaderRule {
    header: &'static str,
    message: &'static str,
    applies: fn(&Page) -> bool,
    satisfied: fn(&Page) -> bool,
}

fn always(_: &Page) -> bool {
    true
}

fn is_https(page: &Page) -> bool {
    page.url.to_ascii_lowercase().starts_with("https://")
}

fn has_header(page: &Page, name: &str) -> bool {
    page.header(name).is_some_and(|v| !v.trim().is_empty())
}

fn has_csp(page: &Page) -> bool {
    has_header(page, "content-security-policy")
}

fn has_nosniff(page: &Page) -> bool {
    has_header(page, "x-content-type-options")
}

fn has_frame_protection(page: &Page) -> bool {
    has_header(page, "x-frame-options")
        || page
            .header("content-security-policy")
            .is_some_and(|csp| csp.to_ascii_lowercase().contains("frame-ancestors"))
}

fn has_referrer_policy(page: &Page) -> bool {
    has_header(page, "referrer-policy")
}

fn has_hsts(page: &Page) -> bool {
    has_header(page, "strict-transport-security")
}

const HEADER_RULES: &[HeaderRule] = &[
    HeaderRule {
        header: "content-security-policy",
        message: "Content-Security-Policy header is missing",
        applies: always,
        satisfied: has_csp,
    },
    HeaderRule {
        header: "x-content-type-options",
        message: "X-Content-Type-Options header is missing",
        applies: always,
        satisfied: has_nosniff,
    },
    HeaderRule {
        header: "x-frame-options",
        message: "X-Frame-Options header is missing and CSP sets no frame-ancestors",
        applies: always,
        satisfied: has_frame_protection,
    },
    HeaderRule {
        header: "referrer-policy",
        message: "Referrer-Policy header is missing",
        applies: always,
        satisfied: has_referrer_policy,
    },
    HeaderRule {
        header: "strict-transport-security",
        message: "Strict-Transport-Security header is missing on HTTPS",
        applies: is_https,
        satisfied: has_hsts,
    },
];

/// Pattern-table scan of raw page source plus response header checks.
pub struct SecurityLayer;

impl SecurityLayer {
    fn scan_pages(
        &self,
        ctx: &LayerContext<'_>,
        table: &PatternTable,
        sink: &FindingSink,
    ) -> Result<(), LayerError> {
        for page in ctx.pages() {
            ctx.check_cancelled()?;
            let index = LineIndex::new(&page.raw_html);
            let suppressions = SuppressionChecker::new(&page.raw_html);
            for m in table.scan(&page.raw_html) {
                let (line, column) = index.line_col(m.start);
                if suppressions.is_suppressed(line, m.pattern.id) {
                    tracing::debug!(page = %page.url, line, rule = m.pattern.id, "suppressed");
                    continue;
                }
                sink.emit(
                    Finding::new(
                        LayerId::Security,
                        m.pattern.severity,
                        m.pattern.id,
                        Location::at(&page.url, line, column),
                        m.pattern.message,
                    )
                    .with_evidence(m.text),
                );
            }
        }
        Ok(())
    }

    fn check_headers(&self, ctx: &LayerContext<'_>, sink: &FindingSink) {
        let http_pages: Vec<&Page> = ctx.pages().iter().filter(|p| p.is_http()).collect();
        if http_pages.is_empty() {
            return;
        }
        for rule in HEADER_RULES {
            let applicable: Vec<&Page> = http_pages
                .iter()
                .copied()
                .filter(|p| (rule.applies)(p))
                .collect();
            let lacking: Vec<&Page> = applicable
                .iter()
                .copied()
                .filter(|p| !(rule.satisfied)(p))
                .collect();
            let Some(first) = lacking.first() else {
                continue;
            };
            sink.emit(
                Finding::new(
                    LayerId::Security,
                    Severity::Medium,
                    MISSING_HEADER_RULE,
                    Location::page(&first.url),
                    rule.message,
                )
                .with_evidence(format!(
                    "{} missing on {} of {} pages",
                    rule.header,
                    lacking.len(),
                    applicable.len()
                )),
            );
        }
    }
}

impl DiagnosticLayer for SecurityLayer {
    fn id(&self) -> LayerId {
        LayerId::Security
    }

    fn run(&self, ctx: &LayerContext<'_>, sink: &FindingSink) -> Result<(), LayerError> {
        let settings = &ctx.config.settings.security;
        for rule in &settings.disabled_rules {
            let known = rule == MISSING_HEADER_RULE || SECURITY_PATTERNS.iter().any(|d| d.id == rule);
            if !known {
                tracing::warn!(rule = %rule, "security.disabled_rules names an unknown rule");
            }
        }

        let table =
            PatternTable::compile_filtered(SECURITY_PATTERNS, |d| settings.is_rule_enabled(d.id))?;
        self.scan_pages(ctx, &table, sink)?;

        if settings.is_rule_enabled(MISSING_HEADER_RULE) {
            ctx.check_cancelled()?;
            self.check_headers(ctx, sink);
        }
        Ok(())
    }
}
