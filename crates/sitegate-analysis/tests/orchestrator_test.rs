//! Orchestrator behavior: ordering, isolation, timeouts and exit statuses.

mod common;

use std::thread;
use std::time::Duration;

use common::{page, serve, write_tree, Route};
use sitegate_analysis::fetcher::{ContentSource, Discovery, Page, SiteRoot, SiteSnapshot};
use sitegate_analysis::layers::{
    ContentQualityLayer, DiagnosticLayer, FindingSink, LayerContext, SecurityLayer,
    StructuralLayer,
};
use sitegate_analysis::orchestrator::{LAYER_ERROR_RULE, TIMEOUT_RULE};
use sitegate_analysis::{Orchestrator, RunResult, RunState};
use sitegate_core::config::{RunConfiguration, RunFlags, SiteGateConfig};
use sitegate_core::errors::{FetchError, LayerError, SiteGateError};
use sitegate_core::traits::{Cancellable, CancellationToken};
use sitegate_core::types::{Finding, LayerId, Location, RunMode, Severity};

/// Serves a fixed set of in-memory pages.
struct MemorySource(Vec<(&'static str, String)>);

impl ContentSource for MemorySource {
    fn load(&self, root: &SiteRoot, _cancel: &CancellationToken) -> Result<SiteSnapshot, FetchError> {
        let pages = self
            .0
            .iter()
            .map(|(url, html)| Page::local(*url, html.as_str()))
            .collect();
        Ok(SiteSnapshot::new(root.clone(), pages, Discovery::Walk))
    }
}

/// Emits findings of fixed severities after an optional delay.
struct ScriptedLayer {
    id: LayerId,
    severities: Vec<Severity>,
    delay: Duration,
}

impl ScriptedLayer {
    fn new(id: LayerId, severities: Vec<Severity>) -> Self {
        Self {
            id,
            severities,
            delay: Duration::ZERO,
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl DiagnosticLayer for ScriptedLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn run(&self, _ctx: &LayerContext<'_>, sink: &FindingSink) -> Result<(), LayerError> {
        thread::sleep(self.delay);
        for (i, severity) in self.severities.iter().enumerate() {
            sink.emit(Finding::new(
                self.id,
                *severity,
                "test/scripted",
                Location::page(format!("/p{i}.html")),
                format!("scripted finding {i}"),
            ));
        }
        Ok(())
    }
}

struct PanickingLayer(LayerId);

impl DiagnosticLayer for PanickingLayer {
    fn id(&self) -> LayerId {
        self.0
    }

    fn run(&self, _ctx: &LayerContext<'_>, sink: &FindingSink) -> Result<(), LayerError> {
        sink.emit(Finding::new(
            self.0,
            Severity::Low,
            "test/before-panic",
            Location::page("/index.html"),
            "emitted before the panic",
        ));
        panic!("layer blew up");
    }
}

/// Emits one finding, then works until cancelled.
struct StallingLayer(LayerId);

impl DiagnosticLayer for StallingLayer {
    fn id(&self) -> LayerId {
        self.0
    }

    fn run(&self, ctx: &LayerContext<'_>, sink: &FindingSink) -> Result<(), LayerError> {
        sink.emit(Finding::new(
            self.0,
            Severity::Low,
            "test/partial",
            Location::page("/index.html"),
            "partial result",
        ));
        while !ctx.cancel.is_cancelled() {
            thread::sleep(Duration::from_millis(10));
        }
        Err(LayerError::Cancelled)
    }
}

fn config(mode: RunMode, toml: &str) -> RunConfiguration {
    RunConfiguration::new("memory-site", mode, SiteGateConfig::from_toml(toml).unwrap()).unwrap()
}

fn memory_pages() -> MemorySource {
    MemorySource(vec![
        ("/index.html", page("Home", "<p>Hello [NAME]</p>\n<div>")),
        ("/about.html", page("About", "<p>lorem ipsum dolor</p>")),
    ])
}

fn run(config: RunConfiguration, layers: Vec<Box<dyn DiagnosticLayer>>) -> RunResult {
    Orchestrator::new(config)
        .with_source(Box::new(memory_pages()))
        .with_layers(layers)
        .run()
        .unwrap()
}

fn static_layers() -> Vec<Box<dyn DiagnosticLayer>> {
    vec![
        Box::new(SecurityLayer),
        Box::new(StructuralLayer),
        Box::new(ContentQualityLayer),
    ]
}

#[test]
fn findings_are_ordered_by_layer_sequence_not_completion() {
    let layers: Vec<Box<dyn DiagnosticLayer>> = vec![
        Box::new(ScriptedLayer::new(LayerId::ContentQuality, vec![Severity::Low; 2])),
        Box::new(
            ScriptedLayer::new(LayerId::Security, vec![Severity::Medium; 3])
                .delayed(Duration::from_millis(150)),
        ),
        Box::new(ScriptedLayer::new(LayerId::Structural, vec![Severity::Low])),
    ];
    let result = run(config(RunMode::Normal, ""), layers);

    let order: Vec<LayerId> = result.findings.iter().map(|f| f.layer()).collect();
    assert_eq!(
        order,
        [
            LayerId::Security,
            LayerId::Security,
            LayerId::Security,
            LayerId::Structural,
            LayerId::ContentQuality,
            LayerId::ContentQuality,
        ]
    );
    let pages: Vec<&str> = result
        .findings_for(LayerId::Security)
        .map(|f| f.location().page.as_str())
        .collect();
    assert_eq!(pages, ["/p0.html", "/p1.html", "/p2.html"]);
    assert_eq!(
        result.layers_run,
        [LayerId::Security, LayerId::Structural, LayerId::ContentQuality]
    );
}

#[test]
fn identical_input_gives_identical_result() {
    let first = run(config(RunMode::Normal, ""), static_layers());
    let second = run(config(RunMode::Normal, ""), static_layers());
    assert_eq!(first.findings, second.findings);
    assert_eq!(first.counts, second.counts);
    assert_eq!(first.exit_code(), second.exit_code());
    assert_eq!(first.exit_code(), 2);
}

#[test]
fn a_panicking_layer_does_not_disturb_the_others() {
    let healthy = run(config(RunMode::Normal, ""), static_layers());

    let layers: Vec<Box<dyn DiagnosticLayer>> = vec![
        Box::new(SecurityLayer),
        Box::new(PanickingLayer(LayerId::Structural)),
        Box::new(ContentQualityLayer),
    ];
    let broken = run(config(RunMode::Normal, ""), layers);

    for layer in [LayerId::Security, LayerId::ContentQuality] {
        assert_eq!(healthy.counts_for(layer), broken.counts_for(layer));
    }
    let structural: Vec<&Finding> = broken.findings_for(LayerId::Structural).collect();
    assert_eq!(structural.len(), 2);
    assert_eq!(structural[0].rule_id(), "test/before-panic");
    assert_eq!(structural[1].rule_id(), LAYER_ERROR_RULE);
    assert_eq!(structural[1].severity(), Severity::Medium);
    assert!(structural[1].message().contains("layer blew up"));
    assert!(!broken.timed_out);
}

#[test]
fn run_budget_cancels_slow_layers_and_keeps_partial_findings() {
    let layers: Vec<Box<dyn DiagnosticLayer>> = vec![
        Box::new(ScriptedLayer::new(LayerId::Security, vec![Severity::High])),
        Box::new(StallingLayer(LayerId::LinkIntegrity)),
    ];
    let result = run(config(RunMode::Normal, "[run]\ntimeout_secs = 1"), layers);

    assert!(result.timed_out);
    assert_eq!(result.counts_for(LayerId::Security).high, 1);
    let links: Vec<&Finding> = result.findings_for(LayerId::LinkIntegrity).collect();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].rule_id(), "test/partial");
    assert_eq!(links[1].rule_id(), TIMEOUT_RULE);
    assert_eq!(links[1].severity(), Severity::Medium);
}

#[test]
fn pre_deploy_blocks_on_warnings_normal_does_not() {
    let warnings = || -> Vec<Box<dyn DiagnosticLayer>> {
        vec![Box::new(ScriptedLayer::new(
            LayerId::ContentQuality,
            vec![Severity::Medium, Severity::Low, Severity::Low, Severity::Medium, Severity::Low, Severity::Low],
        ))]
    };
    let normal = run(config(RunMode::Normal, ""), warnings());
    assert_eq!(normal.counts.warnings(), 6);
    assert_eq!(normal.exit_code(), 0);

    let strict = run(config(RunMode::pre_deploy(), ""), warnings());
    assert_eq!(strict.exit_code(), 1);
}

#[test]
fn critical_only_mode_ignores_high_findings() {
    let layers: Vec<Box<dyn DiagnosticLayer>> = vec![Box::new(ScriptedLayer::new(
        LayerId::Security,
        vec![Severity::High, Severity::High],
    ))];
    let result = run(config(RunMode::CriticalOnly, ""), layers);
    assert_eq!(result.exit_code(), 0);
}

#[test]
fn layer_subset_and_skip_flags() {
    let settings = SiteGateConfig::from_toml("[run]\nlayers = [\"security\", \"links\", \"facts\"]").unwrap();
    let config = RunConfiguration::from_flags(
        RunFlags {
            target: Some("memory-site".into()),
            no_links: true,
            no_facts: true,
            ..Default::default()
        },
        settings,
    )
    .unwrap();
    let layers: Vec<Box<dyn DiagnosticLayer>> = vec![
        Box::new(ScriptedLayer::new(LayerId::Security, vec![Severity::Low])),
        Box::new(ScriptedLayer::new(LayerId::Structural, vec![Severity::Low])),
        Box::new(ScriptedLayer::new(LayerId::LinkIntegrity, vec![Severity::High])),
        Box::new(ScriptedLayer::new(LayerId::FactConsistency, vec![Severity::Critical])),
    ];
    let result = run(config, layers);
    assert_eq!(result.layers_run, [LayerId::Security]);
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.exit_code(), 0);
}

#[test]
fn state_machine_advances_once() {
    let mut orchestrator = Orchestrator::new(config(RunMode::Normal, ""))
        .with_source(Box::new(memory_pages()))
        .with_layers(static_layers());
    assert_eq!(orchestrator.state(), RunState::Pending);
    orchestrator.run().unwrap();
    assert_eq!(orchestrator.state(), RunState::Aggregating);
    assert!(orchestrator.mark_reported());
    assert_eq!(orchestrator.state(), RunState::Reported);
    assert!(!orchestrator.mark_reported());

    let err = orchestrator.run().unwrap_err();
    assert_eq!(err.exit_status().code(), 3);
}

#[test]
fn fatal_errors_map_to_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path(), &[("index.html", &page("Home", "<p>ok</p>"))]);
    let target = dir.path().to_str().unwrap().to_string();

    let missing_site = RunConfiguration::new(
        dir.path().join("nope").to_str().unwrap(),
        RunMode::Normal,
        SiteGateConfig::default(),
    )
    .unwrap();
    let err = Orchestrator::new(missing_site).run().unwrap_err();
    assert!(matches!(err, SiteGateError::Fetch(_)));
    assert_eq!(err.exit_status().code(), 4);

    let mut settings = SiteGateConfig::default();
    settings.facts.sheet = Some(dir.path().join("facts.txt"));
    let missing_sheet = RunConfiguration::new(target.as_str(), RunMode::Normal, settings).unwrap();
    let err = Orchestrator::new(missing_sheet).run().unwrap_err();
    assert_eq!(err.exit_status().code(), 5);

    let required = SiteGateConfig::from_toml("[facts]\nrequired = true").unwrap();
    let unconfigured = RunConfiguration::new(target.as_str(), RunMode::Normal, required).unwrap();
    let err = Orchestrator::new(unconfigured).run().unwrap_err();
    assert_eq!(err.exit_status().code(), 5);

    let bad_scheme =
        RunConfiguration::new("ftp://example.org/", RunMode::Normal, SiteGateConfig::default())
            .unwrap();
    let err = Orchestrator::new(bad_scheme).run().unwrap_err();
    assert_eq!(err.exit_status().code(), 3);
}

#[test]
fn end_to_end_on_a_local_tree() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[
            (
                "index.html",
                &page(
                    "Home",
                    "<p>Our wellness centers: $3 saved per $1 spent.</p>\n<a href=\"missing.html\">more</a>",
                ),
            ),
            ("facts.txt", "wellness_roi = 1.80\n"),
        ],
    );
    let settings =
        SiteGateConfig::from_toml("[links]\ncheck_external = false").unwrap();
    let mut config =
        RunConfiguration::new(dir.path().to_str().unwrap(), RunMode::Normal, settings).unwrap();
    config.fact_sheet = Some(dir.path().join("facts.txt"));

    let result = Orchestrator::new(config.clone()).run().unwrap();
    assert_eq!(result.pages_scanned, 1);
    assert_eq!(result.counts_for(LayerId::FactConsistency).critical, 1);
    assert_eq!(result.findings_with(Severity::Critical).count(), 1);
    assert_eq!(result.counts_for(LayerId::LinkIntegrity).high, 1);
    assert_eq!(result.exit_code(), 1);

    config.skip_links = true;
    config.skip_facts = true;
    let skipped = Orchestrator::new(config).run().unwrap();
    assert_eq!(skipped.findings_for(LayerId::LinkIntegrity).count(), 0);
    assert_eq!(skipped.findings_for(LayerId::FactConsistency).count(), 0);
    assert_eq!(skipped.exit_code(), 0);
}

#[test]
fn served_site_is_checked_for_missing_headers() {
    let base = serve(vec![
        (
            "/",
            Route::html(page("Home", "<a href=\"/a.html\">a</a>"))
                .with_header("Content-Security-Policy", "default-src 'self'")
                .with_header("X-Content-Type-Options", "nosniff")
                .with_header("X-Frame-Options", "SAMEORIGIN")
                .with_header("Referrer-Policy", "same-origin"),
        ),
        ("/a.html", Route::html(page("A", "<a href=\"/\">home</a>"))),
    ]);
    let settings = SiteGateConfig::from_toml("[links]\ncheck_external = false").unwrap();
    let config = RunConfiguration::new(base.as_str(), RunMode::Normal, settings).unwrap();

    let result = Orchestrator::new(config)
        .with_layers(vec![Box::new(SecurityLayer)])
        .run()
        .unwrap();
    assert_eq!(result.pages_scanned, 2);

    let bare = base.join("/a.html").unwrap();
    let missing: Vec<&Finding> = result
        .findings_for(LayerId::Security)
        .filter(|f| f.rule_id() == "security/missing-header")
        .collect();
    assert_eq!(missing.len(), 4, "{missing:?}");
    for finding in &missing {
        assert_eq!(finding.severity(), Severity::Medium);
        assert_eq!(finding.location().page, bare.as_str());
        let evidence = finding.evidence().unwrap_or_default();
        assert!(evidence.ends_with("missing on 1 of 2 pages"), "{evidence}");
        assert!(!evidence.starts_with("strict-transport-security"));
    }
}
