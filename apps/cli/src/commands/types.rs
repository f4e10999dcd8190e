//! Command type definitions shared between main.rs and tests.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum DatasetCommand {
    /// Split a flat image + label corpus into train/valid/test
    Split {
        /// Dataset root (overrides dataset.root)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Fraction of samples for training (overrides dataset.train_ratio)
        #[arg(long)]
        train_ratio: Option<f64>,

        /// Fraction of samples for validation (overrides dataset.valid_ratio)
        #[arg(long)]
        valid_ratio: Option<f64>,

        /// Shuffle seed (overrides dataset.seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Show the assignment without moving any file
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the yolo.yaml manifest
    Manifest {
        /// Dataset root (overrides dataset.root)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Class name, repeat in index order (defaults to dataset.classes)
        #[arg(long = "class")]
        classes: Vec<String>,
    },

    /// Validate a split dataset
    Validate {
        /// Dataset root (overrides dataset.root)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Split, write the manifest and validate in one go
    Prepare {
        /// Dataset root (overrides dataset.root)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Annotation archive to unpack before splitting
        #[arg(long)]
        archive: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that label files exist next to the images
    CheckAnnotations {
        /// Dataset root (overrides dataset.root)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Replace the root's label files with those in an exported zip archive
    ExtractAnnotations {
        /// Zip archive holding the YOLO label files
        #[arg(long)]
        archive: PathBuf,

        /// Dataset root (overrides dataset.root)
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum RegistryCommand {
    /// Record a finished training run and its metrics
    LogRun {
        /// Run name (defaults to training.model_name)
        #[arg(long)]
        name: Option<String>,

        /// JSON file with a flat name -> number object
        #[arg(long, conflicts_with = "results")]
        metrics: Option<PathBuf>,

        /// Detector results.csv; the last epoch is used
        #[arg(long)]
        results: Option<PathBuf>,

        /// Extra metric as name=value (repeatable)
        #[arg(long = "metric")]
        metric: Vec<String>,

        /// Root the run's artifacts were uploaded to
        #[arg(long)]
        artifact_root: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Register a run's weights and apply the champion/challenger protocol
    Promote {
        /// Run to promote
        #[arg(long)]
        run_id: String,

        /// Weights URI (defaults to <artifact_root>/weights/best.pt of the run)
        #[arg(long)]
        artifact: Option<String>,

        /// Registered model name (defaults to training.model_name)
        #[arg(long)]
        model: Option<String>,

        /// Metric to compare (defaults to training.key_metric)
        #[arg(long)]
        key_metric: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the versions and aliases of a registered model
    Show {
        /// Registered model name (defaults to training.model_name)
        #[arg(long)]
        model: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve an alias to the weights to serve
    Resolve {
        /// Registered model name (defaults to training.model_name)
        #[arg(long)]
        model: Option<String>,

        /// Alias to resolve
        #[arg(long, default_value = "Champion")]
        alias: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Print the resolved configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
