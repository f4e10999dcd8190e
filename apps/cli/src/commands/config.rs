//! Config command implementation.

use super::ConfigCommand;
use colored::Colorize;
use visionops_core::PipelineConfig;

/// Execute the config command.
pub fn execute(command: ConfigCommand, config: &PipelineConfig) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                output_human(config);
            }
            Ok(())
        }
    }
}

fn output_human(config: &PipelineConfig) {
    println!("{}", "vops config".bold().cyan());
    println!();

    let d = &config.dataset;
    println!("  {}", "[dataset]".bold());
    println!("    root         {}", d.root.display());
    println!("    train_ratio  {}", d.train_ratio);
    println!("    valid_ratio  {}", d.valid_ratio);
    println!("    seed         {}", d.seed);
    let classes = if d.classes.is_empty() { "(none)".dimmed().to_string() } else { d.classes.join(", ") };
    println!("    classes      {classes}");
    println!();

    let t = &config.training;
    println!("  {}", "[training]".bold());
    println!("    model_name   {}", t.model_name);
    println!("    key_metric   {}", t.key_metric);
    println!("    epochs       {}", t.epochs);
    println!("    device       {}", t.device);
    println!();

    println!("  {}", "[registry]".bold());
    println!("    root         {}", config.registry.root.display());

    if let Some(ref store) = config.object_store {
        println!();
        println!("  {}", "[object_store]".bold());
        println!("    endpoint_url {}", store.endpoint_url);
        println!("    access_key_id {}", store.access_key_id);
        println!("    secret_access_key {}", "********".dimmed());
    }
}
