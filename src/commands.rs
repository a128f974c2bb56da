//! CLI command implementations
//!
//! Every command loads the extractor's JSON snapshot into a fresh engine,
//! then runs one query against it. The engine is constructed explicitly
//! here; nothing in the library crates holds global state.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

use ripple_analysis::{BoundaryKind, CascadingImpactAnalyzer, ImpactAnalyzer, PathFinder, ProjectBoundaryRegistry};
use ripple_core::{
    ChangeKind, DependencySpec, DependencyTracker, EngineConfig, SymbolId, SymbolNode,
};

/// On-disk snapshot format produced by the AST extractor.
#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    symbols: Vec<SymbolNode>,
    #[serde(default)]
    dependencies: Vec<DependencySpec>,
    #[serde(default)]
    boundaries: Vec<BoundarySpec>,
}

#[derive(Debug, Deserialize)]
struct BoundarySpec {
    source: String,
    target: String,
    kind: BoundaryKind,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    version_constraint: Option<String>,
}

async fn load(
    snapshot: &Path,
) -> anyhow::Result<(Arc<DependencyTracker>, Arc<ProjectBoundaryRegistry>)> {
    let text = std::fs::read_to_string(snapshot)
        .with_context(|| format!("cannot read snapshot {}", snapshot.display()))?;
    let snap: Snapshot = serde_json::from_str(&text).context("malformed snapshot")?;

    let tracker = Arc::new(DependencyTracker::new(EngineConfig::default())?);
    let report = tracker.ingest_batch(snap.symbols, snap.dependencies).await;
    for error in &report.errors {
        tracing::warn!("snapshot record rejected: {error}");
    }
    tracing::info!(
        symbols = report.symbols_added,
        dependencies = report.dependencies_added,
        "snapshot loaded"
    );

    let registry = Arc::new(ProjectBoundaryRegistry::new());
    for b in snap.boundaries {
        registry.register_project_boundary(
            &b.source,
            &b.target,
            b.kind,
            b.dependencies,
            b.version_constraint,
        );
    }
    Ok((tracker, registry))
}

fn parse_change(change: &str) -> anyhow::Result<ChangeKind> {
    match change {
        "added" => Ok(ChangeKind::Added),
        "modified" => Ok(ChangeKind::Modified),
        "removed" | "deleted" => Ok(ChangeKind::Removed),
        "moved" => Ok(ChangeKind::Moved),
        "signature_changed" => Ok(ChangeKind::SignatureChanged),
        other => anyhow::bail!("unknown change kind: {other}"),
    }
}

pub async fn ingest(snapshot: &Path) -> anyhow::Result<()> {
    let (tracker, registry) = load(snapshot).await?;
    let store = tracker.store();
    println!(
        "{} symbols, {} dependencies, {} projects",
        store.node_count(),
        store.edge_count(),
        registry.known_projects().len()
    );
    Ok(())
}

pub async fn deps(snapshot: &Path, symbol: &str, depth: usize) -> anyhow::Result<()> {
    let (tracker, _) = load(snapshot).await?;
    let view = tracker.get_symbol_dependencies(&SymbolId::from(symbol), depth)?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

pub async fn impact(snapshot: &Path, symbol: &str, change: &str) -> anyhow::Result<()> {
    let (tracker, _) = load(snapshot).await?;
    let analyzer = ImpactAnalyzer::new(tracker);
    let result = analyzer.analyze_symbol_impact(&SymbolId::from(symbol), parse_change(change)?);
    println!("{}", serde_json::to_string_pretty(&*result)?);
    Ok(())
}

pub async fn path(snapshot: &Path, from: &str, to: &str) -> anyhow::Result<()> {
    let (tracker, _) = load(snapshot).await?;
    let finder = PathFinder::new(tracker);
    match finder.find_dependency_path(&SymbolId::from(from), &SymbolId::from(to)) {
        Some(path) => println!("{}", serde_json::to_string_pretty(&path)?),
        None => println!("no dependency path from {from} to {to}"),
    }
    Ok(())
}

pub async fn cascade(
    snapshot: &Path,
    symbol: &str,
    project: &str,
    change: &str,
    include_external: bool,
) -> anyhow::Result<()> {
    let (tracker, registry) = load(snapshot).await?;
    let analyzer = CascadingImpactAnalyzer::new(tracker, registry);
    let impact = analyzer.analyze_cascading_impact(
        &SymbolId::from(symbol),
        project,
        parse_change(change)?,
        include_external,
    );
    println!("{}", serde_json::to_string_pretty(&impact)?);

    let summary = analyzer.generate_impact_summary(std::slice::from_ref(&impact));
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

pub async fn metrics(snapshot: &Path) -> anyhow::Result<()> {
    let (tracker, _) = load(snapshot).await?;
    println!("{}", serde_json::to_string_pretty(&tracker.get_metrics())?);
    Ok(())
}
