//! Link Integrity Layer: breadth-first link check with a bounded probe pool.
//!
//! Level 0 is the snapshot's pages. Every anchor is resolved, deduplicated
//! across pages, and probed on a `rayon` pool of `workers` threads. Internal
//! HTML targets found beyond the snapshot become the next level, up to
//! `links.max_depth`. Results are emitted in discovery order.

use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use sitegate_core::errors::LayerError;
use sitegate_core::probe_span;
use sitegate_core::traits::Cancellable;
use sitegate_core::types::{Finding, LayerId, Location, Severity};

use super::{DiagnosticLayer, FindingSink, LayerContext};
use crate::fetcher::{resolve_href, LinkProbe, ProbeOutcome, ProbeResult, ProbeTarget, ResolvedLink};
use crate::markup::{anchors, LineIndex};

pub const BROKEN_INTERNAL_RULE: &str = "links/broken-internal";
pub const BROKEN_EXTERNAL_RULE: &str = "links/broken-external";

/// A deduplicated link target.
struct TargetRecord {
    target: Option<ProbeTarget>,
    display: String,
    internal: bool,
    href: String,
    first_seen: Location,
    references: usize,
    outcome: Option<ProbeOutcome>,
}

/// A page whose links are followed at the current level.
struct FrontierPage {
    url: String,
    html: String,
}

pub struct LinkIntegrityLayer {
    probe: Arc<dyn LinkProbe>,
}

impl LinkIntegrityLayer {
    pub fn new(probe: Arc<dyn LinkProbe>) -> Self {
        Self { probe }
    }

    fn finding(record: &TargetRecord) -> Option<Finding> {
        let outcome = record.outcome.as_ref()?;
        if !outcome.is_broken() {
            return None;
        }
        let (severity, rule, kind) = if record.internal {
            (Severity::High, BROKEN_INTERNAL_RULE, "internal")
        } else {
            (Severity::Low, BROKEN_EXTERNAL_RULE, "external")
        };
        let mut message = format!("Broken {kind} link to {}: {outcome}", record.display);
        if record.references > 1 {
            message.push_str(&format!(" (linked {} times)", record.references));
        }
        Some(
            Finding::new(
                LayerId::LinkIntegrity,
                severity,
                rule,
                record.first_seen.clone(),
                message,
            )
            .with_evidence(&record.href),
        )
    }
}

impl DiagnosticLayer for LinkIntegrityLayer {
    fn id(&self) -> LayerId {
        LayerId::LinkIntegrity
    }

    fn run(&self, ctx: &LayerContext<'_>, sink: &FindingSink) -> Result<(), LayerError> {
        let settings = &ctx.config.settings.links;
        let check_external = settings.effective_check_external();
        let max_depth = settings.effective_max_depth();
        let site = ctx.site;

        for missing in &site.unreachable {
            sink.emit(
                Finding::new(
                    LayerId::LinkIntegrity,
                    Severity::High,
                    BROKEN_INTERNAL_RULE,
                    Location::page(&missing.url),
                    format!("Page listed in sitemap could not be loaded: {}", missing.reason),
                )
                .with_evidence(&missing.url),
            );
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(ctx.config.workers.max(1))
            .thread_name(|i| format!("sitegate-probe-{i}"))
            .build()
            .map_err(|e| LayerError::Failed(format!("probe pool: {e}")))?;

        // Snapshot pages are known to resolve.
        let known: FxHashSet<&str> = site.pages.iter().map(|p| p.url.as_str()).collect();
        let mut records: Vec<TargetRecord> = Vec::new();
        let mut by_key: FxHashMap<String, usize> = FxHashMap::default();
        let mut frontier: Vec<FrontierPage> = Vec::new();

        for depth in 0..=max_depth {
            ctx.check_cancelled()?;
            let level_start = records.len();

            let sources: Vec<(&str, &str)> = if depth == 0 {
                site.pages
                    .iter()
                    .map(|p| (p.url.as_str(), p.raw_html.as_str()))
                    .collect()
            } else {
                frontier
                    .iter()
                    .map(|p| (p.url.as_str(), p.html.as_str()))
                    .collect()
            };

            for (page_url, html) in sources {
                let index = LineIndex::new(html);
                for anchor in anchors(html) {
                    let resolved =
                        resolve_href(&site.root, page_url, &anchor.href, site.base_url.as_ref());
                    let (target, internal, invalid) = match resolved {
                        ResolvedLink::Skipped => continue,
                        ResolvedLink::Internal(target) => (Some(target), true, None),
                        ResolvedLink::External(url) => (Some(ProbeTarget::Url(url)), false, None),
                        ResolvedLink::Invalid { reason, .. } => (None, true, Some(reason)),
                    };
                    let display = match &target {
                        Some(t) => t.key().to_string(),
                        None => anchor.href.clone(),
                    };
                    if known.contains(display.as_str()) {
                        continue;
                    }
                    if let Some(&idx) = by_key.get(&display) {
                        records[idx].references += 1;
                        continue;
                    }
                    by_key.insert(display.clone(), records.len());
                    let outcome = match invalid {
                        Some(reason) => Some(ProbeOutcome::Failed { reason }),
                        None if !internal && !check_external => Some(ProbeOutcome::Skipped),
                        None => None,
                    };
                    records.push(TargetRecord {
                        target,
                        display,
                        internal,
                        href: anchor.href,
                        first_seen: index.location(page_url, anchor.offset),
                        references: 1,
                        outcome,
                    });
                }
            }

            let want_body = depth < max_depth;
            let jobs: Vec<(usize, ProbeTarget, bool)> = records[level_start..]
                .iter()
                .enumerate()
                .filter(|(_, r)| r.outcome.is_none())
                .filter_map(|(i, r)| {
                    r.target
                        .clone()
                        .map(|t| (level_start + i, t, want_body && r.internal))
                })
                .collect();

            let results: Vec<(usize, ProbeResult)> = {
                let _span = probe_span!(depth, jobs.len()).entered();
                let probe = &self.probe;
                let cancel = ctx.cancel;
                pool.install(|| {
                    jobs.par_iter()
                        .map(|(idx, target, body)| {
                            let result = if cancel.is_cancelled() {
                                ProbeResult::outcome(ProbeOutcome::Skipped)
                            } else {
                                probe.probe(target, *body)
                            };
                            (*idx, result)
                        })
                        .collect()
                })
            };

            let mut next: Vec<FrontierPage> = Vec::new();
            for (idx, result) in results {
                if let Some(html) = result.body {
                    next.push(FrontierPage {
                        url: records[idx].display.clone(),
                        html,
                    });
                }
                records[idx].outcome = Some(result.outcome);
            }

            for record in &records[level_start..] {
                if let Some(finding) = Self::finding(record) {
                    sink.emit(finding);
                }
            }
            tracing::debug!(depth, targets = records.len() - level_start, "link level checked");

            ctx.check_cancelled()?;
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use sitegate_core::config::{RunConfiguration, SiteGateConfig};
    use sitegate_core::traits::CancellationToken;
    use sitegate_core::types::RunMode;

    use super::*;
    use crate::fetcher::{Discovery, Page, SiteRoot, SiteSnapshot, UnreachablePage};
    use crate::layers::run_layer;

    /// Answers from a fixed table; unknown keys are missing.
    #[derive(Default)]
    struct TableProbe {
        answers: HashMap<String, (ProbeOutcome, Option<String>)>,
        calls: Mutex<Vec<String>>,
    }

    impl TableProbe {
        fn with(mut self, key: &str, outcome: ProbeOutcome, body: Option<&str>) -> Self {
            self.answers
                .insert(key.to_string(), (outcome, body.map(str::to_string)));
            self
        }
    }

    impl LinkProbe for TableProbe {
        fn probe(&self, target: &ProbeTarget, want_body: bool) -> ProbeResult {
            self.calls.lock().unwrap().push(target.key().to_string());
            match self.answers.get(target.key()) {
                Some((outcome, body)) => ProbeResult {
                    outcome: outcome.clone(),
                    body: if want_body { body.clone() } else { None },
                },
                None => ProbeResult::outcome(ProbeOutcome::Missing),
            }
        }
    }

    fn site(pages: Vec<Page>) -> SiteSnapshot {
        SiteSnapshot::new(
            SiteRoot::Local {
                dir: "/srv/site".into(),
                entry: None,
            },
            pages,
            Discovery::Walk,
        )
    }

    fn config(toml: &str) -> RunConfiguration {
        RunConfiguration::new(
            "/srv/site",
            RunMode::Normal,
            SiteGateConfig::from_toml(toml).unwrap(),
        )
        .unwrap()
    }

    fn run(probe: TableProbe, site: &SiteSnapshot, config: &RunConfiguration) -> (Vec<Finding>, Vec<String>) {
        let probe = Arc::new(probe);
        let layer = LinkIntegrityLayer::new(probe.clone());
        let cancel = CancellationToken::new();
        let ctx = LayerContext {
            site,
            config,
            facts: None,
            cancel: &cancel,
        };
        let findings = run_layer(&layer, &ctx).unwrap();
        let calls = probe.calls.lock().unwrap().clone();
        (findings, calls)
    }

    #[test]
    fn broken_internal_link_reported_once() {
        let site = site(vec![
            Page::local("/index.html", "<a href=\"missing.html\">x</a>\n<a href=\"about.html\">a</a>"),
            Page::local("/about.html", "<p><a href=\"/missing.html#top\">again</a></p>"),
        ]);
        let (findings, calls) = run(TableProbe::default(), &site, &config(""));

        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.rule_id(), BROKEN_INTERNAL_RULE);
        assert_eq!(f.severity(), Severity::High);
        assert_eq!(f.location().page, "/index.html");
        assert_eq!(f.location().line, Some(1));
        assert!(f.message().contains("/missing.html"));
        assert!(f.message().contains("linked 2 times"));
        // known pages are never probed
        assert_eq!(calls, ["/missing.html"]);
    }

    #[test]
    fn external_links_are_low_and_optional() {
        let site = site(vec![Page::local(
            "/index.html",
            "<a href=\"https://gone.example/\">x</a><a href=\"mailto:a@b.c\">m</a>",
        )]);
        let probe = TableProbe::default().with(
            "https://gone.example/",
            ProbeOutcome::HttpError { status: 404 },
            None,
        );
        let (findings, _) = run(probe, &site, &config(""));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id(), BROKEN_EXTERNAL_RULE);
        assert_eq!(findings[0].severity(), Severity::Low);

        let (findings, calls) = run(
            TableProbe::default(),
            &site,
            &config("[links]\ncheck_external = false"),
        );
        assert!(findings.is_empty());
        assert!(calls.is_empty());
    }

    #[test]
    fn follows_discovered_pages_to_max_depth() {
        let site = site(vec![Page::local("/index.html", "<a href=\"a.html\">a</a>")]);
        let probe = TableProbe::default()
            .with(
                "/a.html",
                ProbeOutcome::Reachable { status: 200 },
                Some("<a href=\"b.html\">b</a>"),
            )
            .with(
                "/b.html",
                ProbeOutcome::Reachable { status: 200 },
                Some("<a href=\"c.html\">c</a>"),
            );

        let (findings, calls) = run(probe, &site, &config("[links]\nmax_depth = 1"));
        assert!(findings.is_empty());
        assert_eq!(calls, ["/a.html", "/b.html"]);
    }

    #[test]
    fn escaping_links_and_unreachable_sitemap_pages() {
        let mut site = site(vec![Page::local("/index.html", "<a href=\"../../etc/passwd\">x</a>")]);
        site.unreachable.push(UnreachablePage {
            url: "/old.html".into(),
            reason: "file not found".into(),
        });
        let (findings, calls) = run(TableProbe::default(), &site, &config(""));
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].location().page, "/old.html");
        assert!(findings[1].message().contains("outside the site root"));
        assert!(calls.is_empty());
    }
}
