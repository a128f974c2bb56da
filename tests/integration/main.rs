//! Integration tests for the ripple engine
//!
//! These tests drive the full pipeline the way the extractor and API layer
//! do: batch ingestion into the tracker, boundary registration, then impact,
//! path, and cascade queries against the shared engine.

use std::sync::Arc;

use ripple_analysis::{
    BoundaryKind, CascadingImpactAnalyzer, CompatibilityAssessment, ImpactAnalyzer, PathFinder,
    ProjectBoundaryRegistry,
};
use ripple_core::{
    ChangeKind, DependencyKind, DependencySpec, DependencyTracker, EngineConfig, SymbolId,
    SymbolKind, SymbolNode,
};

fn engine() -> (Arc<DependencyTracker>, Arc<ProjectBoundaryRegistry>) {
    let tracker = Arc::new(DependencyTracker::new(EngineConfig::default()).unwrap());
    let registry = Arc::new(ProjectBoundaryRegistry::new());
    (tracker, registry)
}

fn symbol(id: &str, file: &str) -> SymbolNode {
    SymbolNode::new(id, id, SymbolKind::Function, file)
}

fn dependency(source: &str, target: &str, kind: DependencyKind) -> DependencySpec {
    DependencySpec {
        source: SymbolId::from(source),
        target: SymbolId::from(target),
        kind,
        file_path: None,
        line: None,
        strength: None,
    }
}

#[tokio::test]
async fn full_pipeline_ingest_analyze_summarize() {
    let (tracker, registry) = engine();
    registry.register_project_boundary(
        "backend",
        "frontend",
        BoundaryKind::Workspace,
        vec!["render".into()],
        None,
    );

    let symbols = vec![
        symbol("api.handler", "/workspace/backend/api.py"),
        symbol("db.query", "/workspace/backend/db.py"),
        symbol("ui.render", "/workspace/frontend/render.py"),
    ];
    let dependencies = vec![
        dependency("api.handler", "db.query", DependencyKind::FunctionCall),
        dependency("ui.render", "api.handler", DependencyKind::FunctionCall),
    ];
    let report = tracker.ingest_batch(symbols, dependencies).await;
    assert_eq!(report.symbols_added, 3);
    assert_eq!(report.dependencies_added, 2);
    assert!(report.errors.is_empty());

    // Single-project impact: who breaks if the handler's signature changes.
    let impact = ImpactAnalyzer::new(Arc::clone(&tracker));
    let analysis = impact
        .analyze_symbol_impact(&SymbolId::from("api.handler"), ChangeKind::SignatureChanged);
    assert_eq!(analysis.directly_affected, vec![SymbolId::from("ui.render")]);
    assert_eq!(analysis.breaking_changes.len(), 1);

    // Cascade: the change ripples from backend into frontend.
    let cascade = CascadingImpactAnalyzer::new(Arc::clone(&tracker), Arc::clone(&registry));
    let cascading = cascade.analyze_cascading_impact(
        &SymbolId::from("api.handler"),
        "backend",
        ChangeKind::SignatureChanged,
        false,
    );
    assert!(cascading.affected_projects.contains_key("frontend"));
    assert!(cascading.affected_projects.contains_key("backend"));

    let summary = cascade.generate_impact_summary(std::slice::from_ref(&cascading));
    assert_eq!(summary.total_projects_affected, 2);
    assert!(summary.total_symbols_affected >= 2);

    let metrics = tracker.get_metrics();
    assert_eq!(metrics.total_symbols, 3);
    assert_eq!(metrics.total_dependencies, 2);
    assert_eq!(metrics.impact_analyses, 1);
    assert_eq!(metrics.cross_project_impacts, 1);
    assert!(metrics.breaking_changes_detected >= 1);
}

#[tokio::test]
async fn workspace_cascade_crosses_declared_boundary() {
    let (tracker, registry) = engine();
    registry.register_project_boundary("backend", "frontend", BoundaryKind::Workspace, vec![], None);
    tracker
        .ingest_batch(
            vec![
                symbol("A", "/workspace/backend/a.py"),
                symbol("B", "/workspace/frontend/b.py"),
            ],
            vec![dependency("A", "B", DependencyKind::Import)],
        )
        .await;

    let cascade = CascadingImpactAnalyzer::new(tracker, registry);
    let impact = cascade.analyze_cascading_impact(
        &SymbolId::from("A"),
        "backend",
        ChangeKind::Modified,
        false,
    );
    assert_eq!(impact.affected_projects.len(), 1);
    assert_eq!(
        impact.affected_projects.get("frontend").unwrap(),
        &vec![SymbolId::from("B")]
    );
    assert_eq!(impact.total_affected_symbols, 1);
    assert_eq!(impact.compatibility, CompatibilityAssessment::Compatible);
}

#[tokio::test]
async fn impact_queries_run_during_batch_ingestion() {
    let (tracker, _) = engine();
    tracker.add_symbol(symbol("seed", "src/seed.py")).unwrap();

    let symbols: Vec<SymbolNode> = (0..500)
        .map(|i| symbol(&format!("s{i}"), "src/gen.py"))
        .collect();
    let dependencies: Vec<DependencySpec> = (0..500)
        .map(|i| dependency(&format!("s{i}"), "seed", DependencyKind::FunctionCall))
        .collect();

    let ingest_tracker = Arc::clone(&tracker);
    let ingest = tokio::spawn(async move {
        ingest_tracker.ingest_batch(symbols, dependencies).await
    });

    // Reads interleave with ingestion at chunk boundaries and always see a
    // consistent snapshot: dependents never exceed ingested symbols.
    let analyzer = ImpactAnalyzer::new(Arc::clone(&tracker));
    for _ in 0..20 {
        let result = analyzer.analyze_symbol_impact(&SymbolId::from("seed"), ChangeKind::Modified);
        assert!(result.directly_affected.len() <= 500);
        tokio::task::yield_now().await;
    }

    let report = ingest.await.unwrap();
    assert_eq!(report.symbols_added, 500);
    let finished = analyzer.analyze_symbol_impact(&SymbolId::from("seed"), ChangeKind::Modified);
    assert_eq!(finished.directly_affected.len(), 500);
}

#[tokio::test]
async fn removal_propagates_to_queries() {
    let (tracker, _) = engine();
    tracker
        .ingest_batch(
            vec![
                symbol("a", "src/a.py"),
                symbol("b", "src/b.py"),
                symbol("c", "src/c.py"),
            ],
            vec![
                dependency("a", "b", DependencyKind::FunctionCall),
                dependency("b", "c", DependencyKind::FunctionCall),
            ],
        )
        .await;

    let finder = PathFinder::new(Arc::clone(&tracker));
    assert!(finder
        .find_dependency_path(&SymbolId::from("a"), &SymbolId::from("c"))
        .is_some());

    tracker.remove_symbol(&SymbolId::from("b")).unwrap();
    assert!(finder
        .find_dependency_path(&SymbolId::from("a"), &SymbolId::from("c"))
        .is_none());

    // The removal is in the audit log with its pre-removal dependents.
    let changes = tracker.changes();
    let removal = changes.latest().unwrap();
    assert_eq!(removal.kind, ChangeKind::Removed);
    assert_eq!(removal.affected_symbols, vec![SymbolId::from("a")]);
}

#[tokio::test]
async fn snapshot_json_round_trips_into_engine() {
    let raw = r#"{
        "symbols": [
            {
                "id": "auth.login",
                "name": "login",
                "kind": "function",
                "file_path": "/workspace/backend/auth.py",
                "span": {"line_start": 10, "line_end": 42, "column_start": 0, "column_end": 0},
                "scope": "module",
                "signature": "def login(user, password)",
                "is_public": true,
                "is_exported": true,
                "project": null
            },
            {
                "id": "ui.form",
                "name": "form",
                "kind": "function",
                "file_path": "/workspace/frontend/form.py",
                "span": {"line_start": 1, "line_end": 9, "column_start": 0, "column_end": 0},
                "scope": null,
                "signature": null,
                "is_public": false,
                "is_exported": false,
                "project": null
            }
        ],
        "dependencies": [
            {"source": "ui.form", "target": "auth.login", "kind": "function_call", "line": 4}
        ]
    }"#;

    #[derive(serde::Deserialize)]
    struct Snapshot {
        symbols: Vec<SymbolNode>,
        dependencies: Vec<DependencySpec>,
    }
    let snapshot: Snapshot = serde_json::from_str(raw).unwrap();

    let (tracker, _) = engine();
    let report = tracker
        .ingest_batch(snapshot.symbols, snapshot.dependencies)
        .await;
    assert_eq!(report.symbols_added, 2);
    assert_eq!(report.dependencies_added, 1);

    let analyzer = ImpactAnalyzer::new(tracker);
    let result =
        analyzer.analyze_symbol_impact(&SymbolId::from("auth.login"), ChangeKind::Removed);
    assert_eq!(result.directly_affected, vec![SymbolId::from("ui.form")]);
}
