//! Registry command implementation.
//!
//! Logs training runs, promotes their weights and resolves aliases for serving.

use super::RegistryCommand;
use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};
use visionops_core::PipelineConfig;
use visionops_registry::{
    normalize_endpoint, resolve_alias_artifact, weights_uri, ArtifactLocation, FileRegistry, PromotionEngine,
    PromotionOutcome, PromotionPolicy, RegisteredModel, ResolvedArtifact, RunId, RunMetrics, TrainingRun,
};

/// Execute the registry command.
pub async fn execute(command: RegistryCommand, config: &PipelineConfig) -> anyhow::Result<()> {
    let registry = FileRegistry::for_workspace_root(&config.registry.root);

    match command {
        RegistryCommand::LogRun { name, metrics, results, metric, artifact_root, json } => {
            let name = name.unwrap_or_else(|| config.training.model_name.clone());
            let metrics = collect_metrics(metrics, results, &metric)?;
            log_run(&registry, name, metrics, artifact_root, json)
        }
        RegistryCommand::Promote { run_id, artifact, model, key_metric, json } => {
            let model = model.unwrap_or_else(|| config.training.model_name.clone());
            let key_metric = key_metric.unwrap_or_else(|| config.training.key_metric.clone());
            promote(registry, &RunId::from(run_id.as_str()), artifact, &model, key_metric, json).await
        }
        RegistryCommand::Show { model, json } => {
            let model = model.unwrap_or_else(|| config.training.model_name.clone());
            show(&registry, &model, json)
        }
        RegistryCommand::Resolve { model, alias, json } => {
            let model = model.unwrap_or_else(|| config.training.model_name.clone());
            resolve(&registry, &model, &alias, config, json).await
        }
    }
}

fn collect_metrics(json: Option<PathBuf>, results: Option<PathBuf>, pairs: &[String]) -> anyhow::Result<RunMetrics> {
    let mut metrics = match (json, results) {
        (Some(path), _) => RunMetrics::from_json_file(&path)
            .with_context(|| format!("Failed to read metrics from {}", path.display()))?,
        (None, Some(path)) => RunMetrics::from_results_csv(&path)
            .with_context(|| format!("Failed to read results from {}", path.display()))?,
        (None, None) => RunMetrics::new(),
    };
    for pair in pairs {
        let (name, value) = RunMetrics::parse_pair(pair)?;
        metrics.insert(name, value);
    }
    Ok(metrics)
}

fn log_run(
    registry: &FileRegistry,
    name: String,
    metrics: RunMetrics,
    artifact_root: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut run = TrainingRun::new(name, metrics);
    if let Some(root) = artifact_root {
        run = run.with_artifact_uri(root);
    }
    let run = registry.log_run(run).context("Failed to log training run")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    println!("{} Logged run {} ({})", "✓".green(), run.run_id.to_string().bold(), run.run_name);
    for (name, value) in &run.metrics.0 {
        println!("    {:<28} {value:.4}", name.dimmed());
    }
    Ok(())
}

async fn promote(
    registry: FileRegistry,
    run_id: &RunId,
    artifact: Option<String>,
    model: &str,
    key_metric: String,
    json: bool,
) -> anyhow::Result<()> {
    let artifact = match artifact {
        Some(uri) => uri,
        None => {
            let run = registry.run(run_id)?;
            let root = run
                .artifact_uri
                .with_context(|| format!("Run {run_id} has no artifact root; pass --artifact"))?;
            weights_uri(&root)
        }
    };

    let engine = PromotionEngine::new(registry, PromotionPolicy::new(key_metric));
    let outcome = engine.promote(model, run_id, &artifact).await.context("Failed to promote model")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("{}", "vops registry promote".bold().cyan());
    println!();
    let version = outcome.version();
    println!("  Registered {} version {}", model.bold(), version.version);
    let key = &engine.policy().key_metric;
    match &outcome {
        PromotionOutcome::Crowned { .. } => {
            println!("  {} No champion yet, version {} is now {}", "✓".green(), version.version, "Champion".bold());
        }
        PromotionOutcome::Challenger { champion_version, current_score, champion_score, .. } => {
            println!(
                "  {} {key} {current_score:.4} > {champion_score:.4} (champion v{champion_version}), version {} is now {}",
                "↑".green(),
                version.version,
                "Challenger".bold()
            );
        }
        PromotionOutcome::Retained { champion_version, current_score, champion_score, .. } => {
            println!(
                "  {} {key} {current_score:.4} <= {champion_score:.4} (champion v{champion_version}), aliases unchanged",
                "=".yellow()
            );
        }
    }
    Ok(())
}

fn show(registry: &FileRegistry, model: &str, json: bool) -> anyhow::Result<()> {
    let registered = registry.model(model)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&registered)?);
        return Ok(());
    }

    println!("{}", format!("Model {}", registered.name).bold().cyan());
    println!();
    display_versions_table(&registered);
    Ok(())
}

/// Display model versions in a compact table format.
fn display_versions_table(model: &RegisteredModel) {
    #[derive(Tabled)]
    struct VersionRow {
        #[tabled(rename = "Version")]
        version: u64,
        #[tabled(rename = "Aliases")]
        aliases: String,
        #[tabled(rename = "Run")]
        run_id: String,
        #[tabled(rename = "Artifact")]
        artifact: String,
        #[tabled(rename = "Registered")]
        created_at: String,
    }

    let rows: Vec<VersionRow> = model
        .versions
        .iter()
        .map(|v| {
            let aliases = model.aliases_of(v.version);
            VersionRow {
                version: v.version,
                aliases: if aliases.is_empty() { "-".to_string() } else { aliases.join(", ") },
                run_id: v.run_id.to_string(),
                artifact: v.artifact.uri.clone(),
                created_at: v.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            }
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();

    println!("{}", table);
    println!();
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    #[serde(flatten)]
    resolved: &'a ResolvedArtifact,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<&'a str>,
}

async fn resolve(
    registry: &FileRegistry,
    model: &str,
    alias: &str,
    config: &PipelineConfig,
    json: bool,
) -> anyhow::Result<()> {
    let resolved = resolve_alias_artifact(registry, model, alias).await?;
    let endpoint = match resolved.location {
        ArtifactLocation::ObjectStore { .. } => {
            config.object_store.as_ref().map(|store| normalize_endpoint(&store.endpoint_url))
        }
        ArtifactLocation::Local { .. } => None,
    };

    if json {
        let output = ResolveOutput { resolved: &resolved, endpoint };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} {model}@{alias} -> version {}", "✓".green(), resolved.version.version);
    println!("    {}", resolved.location);
    if let Some(endpoint) = endpoint {
        println!("    endpoint {}", endpoint.dimmed());
    }
    if let Some(ref sha) = resolved.version.artifact.sha256 {
        println!("    sha256 {}", sha.dimmed());
    }
    Ok(())
}
