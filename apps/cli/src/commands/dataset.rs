//! Dataset command implementation.
//!
//! Splits, describes and validates the detector's training corpus.

use super::DatasetCommand;
use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use visionops_core::PipelineConfig;
use visionops_dataset::{
    annotations_present, discover_samples, extract_annotations, partition, plan_partition, validate, write_manifest, DatasetError,
    IssueKind, PartitionOutcome, PartitionPlan, PartitionSummary, Severity, Split, SplitRatios, ValidationReport,
};

/// Execute the dataset command.
pub fn execute(command: DatasetCommand, config: &PipelineConfig) -> anyhow::Result<()> {
    match command {
        DatasetCommand::Split { root, train_ratio, valid_ratio, seed, dry_run, json } => {
            let root = dataset_root(root, config);
            let ratios = SplitRatios::new(
                train_ratio.unwrap_or(config.dataset.train_ratio),
                valid_ratio.unwrap_or(config.dataset.valid_ratio),
            )?;
            let seed = seed.unwrap_or(config.dataset.seed);
            if dry_run {
                split_preview(&root, ratios, seed, json)
            } else {
                split_execute(&root, ratios, seed, json)
            }
        }
        DatasetCommand::Manifest { root, classes } => {
            let root = dataset_root(root, config);
            let classes = if classes.is_empty() { config.require_classes()?.to_vec() } else { classes };
            manifest_execute(&root, &classes)
        }
        DatasetCommand::Validate { root, json } => validate_execute(&dataset_root(root, config), json),
        DatasetCommand::Prepare { root, archive, json } => {
            prepare_execute(&dataset_root(root, config), archive.as_deref(), config, json)
        }
        DatasetCommand::CheckAnnotations { root } => check_annotations_execute(&dataset_root(root, config)),
        DatasetCommand::ExtractAnnotations { archive, root } => {
            extract_annotations_execute(&archive, &dataset_root(root, config))
        }
    }
}

fn dataset_root(root: Option<PathBuf>, config: &PipelineConfig) -> PathBuf {
    root.unwrap_or_else(|| config.dataset.root.clone())
}

fn ensure_root(root: &Path) -> anyhow::Result<()> {
    if !root.is_dir() {
        return Err(DatasetError::MissingRoot(root.to_path_buf()).into());
    }
    Ok(())
}

fn split_preview(root: &Path, ratios: SplitRatios, seed: u64, json: bool) -> anyhow::Result<()> {
    ensure_root(root)?;
    let samples = discover_samples(root).context("Failed to scan dataset root")?;
    let plan = plan_partition(samples, ratios, seed);

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("{}", "vops dataset split --dry-run".bold().cyan());
    println!();
    println!(
        "  Ratios train {:.2} / valid {:.2} / test {:.2}, seed {seed}",
        ratios.train,
        ratios.valid,
        ratios.test()
    );
    println!();
    if plan.is_empty() {
        println!("  {} No images found in {}", "!".yellow(), root.display());
        return Ok(());
    }
    print_plan(&plan);
    println!();
    println!("  {} Nothing was moved", "i".cyan());
    Ok(())
}

fn print_plan(plan: &PartitionPlan) {
    for split in Split::ALL {
        let samples = plan.samples(split);
        let labeled = samples.iter().filter(|s| s.is_labeled()).count();
        println!("  {:<6} {} images, {} labels", split.as_str().bold(), samples.len(), labeled);
        for sample in samples {
            println!("    {}", sample.image_name().dimmed());
        }
    }
}

fn split_execute(root: &Path, ratios: SplitRatios, seed: u64, json: bool) -> anyhow::Result<()> {
    ensure_root(root)?;
    let outcome = partition(root, ratios, seed).context("Failed to split dataset")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("{}", "vops dataset split".bold().cyan());
    println!();
    match outcome {
        PartitionOutcome::Empty => {
            println!("  {} No images found in {}, nothing to split", "!".yellow(), root.display());
        }
        PartitionOutcome::Split(ref summary) => print_summary(summary),
    }
    Ok(())
}

fn print_summary(summary: &PartitionSummary) {
    for split in Split::ALL {
        let entry = summary.split(split);
        println!("  {:<6} {} images, {} labels", split.as_str().bold(), entry.images, entry.labels);
    }
    println!();
    println!("  {} Split {} samples", "✓".green(), summary.total);
}

fn manifest_execute(root: &Path, classes: &[String]) -> anyhow::Result<()> {
    ensure_root(root)?;
    let path = write_manifest(root, classes).context("Failed to write manifest")?;
    println!("{} Wrote {} ({} classes)", "✓".green(), path.display(), classes.len());
    Ok(())
}

fn validate_execute(root: &Path, json: bool) -> anyhow::Result<()> {
    ensure_root(root)?;
    let (report, failed) = match validate(root) {
        Ok(report) => (report, false),
        Err(DatasetError::Validation { report, .. }) => (*report, true),
        Err(e) => return Err(e).context("Failed to validate dataset"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", "vops dataset validate".bold().cyan());
        println!();
        print_report(&report);
    }

    if failed {
        anyhow::bail!("Dataset validation failed with {} error(s)", report.errors);
    }
    Ok(())
}

fn print_report(report: &ValidationReport) {
    for issue in &report.issues {
        let marker = match issue.kind.severity() {
            Severity::Error => "✗".red(),
            Severity::Warning => "!".yellow(),
        };
        let location = match issue.line {
            Some(line) => format!("{}:{line}", issue.path.display()),
            None => issue.path.display().to_string(),
        };
        println!("  {marker} [{}] {} ({})", issue.split, issue.message, location.dimmed());
    }
    if !report.issues.is_empty() {
        println!();
    }

    let missing_labels = report.issues_of(IssueKind::MissingLabel).count();
    if report.is_ok() {
        println!("  {} Dataset is valid ({} warning(s), {} unlabeled image(s))", "✓".green(), report.warnings, missing_labels);
    } else {
        println!("  {} {} error(s), {} warning(s)", "✗".red(), report.errors, report.warnings);
    }
}

#[derive(Serialize)]
struct PrepareOutput {
    partition: PartitionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    manifest: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation: Option<ValidationReport>,
}

fn prepare_execute(root: &Path, archive: Option<&Path>, config: &PipelineConfig, json: bool) -> anyhow::Result<()> {
    ensure_root(root)?;
    let classes = config.require_classes()?;
    let ratios = SplitRatios::new(config.dataset.train_ratio, config.dataset.valid_ratio)?;

    if let Some(archive) = archive {
        extract_annotations(archive, root)
            .with_context(|| format!("Failed to extract annotations from {}", archive.display()))?;
    }

    let partition = partition(root, ratios, config.dataset.seed).context("Failed to split dataset")?;
    if partition == PartitionOutcome::Empty {
        if json {
            let output = PrepareOutput { partition, manifest: None, validation: None };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{} No images found in {}, nothing to prepare", "!".yellow(), root.display());
        }
        return Ok(());
    }

    let manifest = write_manifest(root, classes).context("Failed to write manifest")?;
    let (report, failed) = match validate(root) {
        Ok(report) => (report, false),
        Err(DatasetError::Validation { report, .. }) => (*report, true),
        Err(e) => return Err(e).context("Failed to validate dataset"),
    };

    if json {
        let errors = report.errors;
        let output = PrepareOutput { partition, manifest: Some(manifest), validation: Some(report) };
        println!("{}", serde_json::to_string_pretty(&output)?);
        if failed {
            anyhow::bail!("Dataset validation failed with {} error(s)", errors);
        }
        return Ok(());
    }

    println!("{}", "vops dataset prepare".bold().cyan());
    println!();
    if let PartitionOutcome::Split(ref summary) = partition {
        print_summary(summary);
    }
    println!("  {} Wrote {}", "✓".green(), manifest.display());
    println!();
    print_report(&report);

    if failed {
        anyhow::bail!("Dataset validation failed with {} error(s)", report.errors);
    }
    Ok(())
}

fn check_annotations_execute(root: &Path) -> anyhow::Result<()> {
    ensure_root(root)?;
    if annotations_present(root)? {
        println!("{} Annotations present in {}", "✓".green(), root.display());
        Ok(())
    } else {
        anyhow::bail!("Images in {} have no label files; export the annotations first", root.display())
    }
}

fn extract_annotations_execute(archive: &Path, root: &Path) -> anyhow::Result<()> {
    ensure_root(root)?;
    let placed = extract_annotations(archive, root)
        .with_context(|| format!("Failed to extract annotations from {}", archive.display()))?;
    println!("{} Extracted {} label file(s) into {}", "✓".green(), placed, root.display());
    Ok(())
}
