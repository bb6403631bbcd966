//! Subcommand handlers
//!
//! Each handler returns the process exit code.

use crate::args::scope_from_matches;
use crate::render::{render_report, render_snapshot};
use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use flowcoach_core::{
    CancellationFlag, FlowDataProvider, HttpFlowProvider, JsonFileFlowProvider, Pipeline,
    PipelineConfig,
};
use flowcoach_knowledge::KnowledgeIndex;
use flowcoach_metrics::{MetricsEngine, MetricsError};
use flowcoach_model::{Insight, RecordBatch};
use flowcoach_synthesis::ScenarioModeler;
use std::path::PathBuf;
use std::sync::Arc;

/// Exit code of a run stopped by Ctrl-C
const EXIT_CANCELLED: i32 = 130;
/// Exit code when the data could not support metrics
const EXIT_INSUFFICIENT: i32 = 2;

async fn load_config(args: &ArgMatches) -> Result<PipelineConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => PipelineConfig::load(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = args.try_get_one::<PathBuf>("corpus").ok().flatten() {
        config = config.with_corpus_dir(dir);
    }
    Ok(config)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) async fn analyze(args: &ArgMatches) -> Result<i32> {
    let today = chrono::Utc::now().date_naive();
    let scope = scope_from_matches(args, today)?;
    let config = load_config(args).await?;

    let provider: Arc<dyn FlowDataProvider> = match (
        args.get_one::<PathBuf>("records"),
        args.get_one::<String>("url"),
    ) {
        (Some(path), None) => Arc::new(JsonFileFlowProvider::new(path)),
        (None, Some(url)) => Arc::new(HttpFlowProvider::new(url)),
        _ => bail!("exactly one of --records or --url is required"),
    };
    let pipeline = Pipeline::from_config(config, provider).await?;

    let flag = CancellationFlag::new();
    let on_signal = flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; cancelling at the next stage boundary");
            on_signal.cancel();
        }
    });

    let mut run = pipeline.run(scope).with_today(today).with_cancellation(flag);
    if args.get_flag("scenarios") {
        run = run.with_enricher(Arc::new(ScenarioModeler::new()));
    }
    let report = run.execute().await;

    if args.get_flag("json") {
        print_json(&report)?;
    } else {
        print!("{}", render_report(&report)?);
    }
    Ok(if report.cancelled { EXIT_CANCELLED } else { 0 })
}

pub(crate) async fn metrics(args: &ArgMatches) -> Result<i32> {
    let scope = scope_from_matches(args, chrono::Utc::now().date_naive())?;
    let config = load_config(args).await?;
    let Some(path) = args.get_one::<PathBuf>("records") else {
        bail!("--records is required");
    };

    let input = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let batch = RecordBatch::from_json(&input)?;
    let history = batch.history.clone();
    let ingested = batch.ingest(scope.workflow, &config.ingest);
    if !ingested.rejected.is_empty() || ingested.ignored_fields > 0 {
        eprintln!(
            "{} record(s) rejected, {} duration field(s) ignored",
            ingested.rejected.len(),
            ingested.ignored_fields
        );
    }

    let engine = MetricsEngine::new(config.metrics);
    let snapshot = match engine.compute(&scope, &ingested.records, &history) {
        Ok(snapshot) => snapshot,
        Err(MetricsError::InsufficientData { completed, minimum }) => {
            eprintln!(
                "Insufficient data: {completed} completed item(s), at least {minimum} needed"
            );
            return Ok(EXIT_INSUFFICIENT);
        }
        Err(e) => return Err(e.into()),
    };

    if args.get_flag("json") {
        print_json(&snapshot)?;
    } else {
        let mut out = String::new();
        render_snapshot(&mut out, &snapshot)?;
        print!("{out}");
    }
    Ok(0)
}

pub(crate) async fn corpus(args: &ArgMatches) -> Result<i32> {
    let (action, sub) = args
        .subcommand()
        .context("expected `corpus list` or `corpus validate`")?;
    let index = match sub.get_one::<PathBuf>("dir") {
        Some(dir) => KnowledgeIndex::load_dir(dir)
            .await
            .with_context(|| format!("loading corpus from {}", dir.display()))?,
        None => KnowledgeIndex::builtin()?,
    };

    match action {
        "list" => {
            for doc in index.iter() {
                let scopes: Vec<&str> = doc.scopes.iter().map(|s| s.as_str()).collect();
                println!(
                    "{:<36} {:<8} [{}] {}",
                    doc.id.as_str(),
                    doc.confidence.as_str(),
                    scopes.join(","),
                    doc.title
                );
            }
        }
        "validate" => {
            let without_causes = index.iter().filter(|d| d.root_causes.is_empty()).count();
            let without_practices = index.iter().filter(|d| d.practices.is_empty()).count();
            println!("{} document(s) parsed", index.len());
            if without_causes > 0 {
                println!("  {without_causes} without root causes");
            }
            if without_practices > 0 {
                println!("  {without_practices} without practices");
            }
        }
        other => bail!("unknown corpus command: {other}"),
    }
    Ok(0)
}

pub(crate) fn schema() -> Result<i32> {
    print_json(&schemars::schema_for!(Insight))?;
    Ok(0)
}
