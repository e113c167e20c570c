//! Preflight CLI - Benchmark Scenario Validation
//!
//! This is a demonstration CLI for the Preflight library. It runs without
//! platform credentials, so only validators that look at the scenario
//! configuration alone can pass.

use anyhow::{bail, Context, Result};
use preflight::prelude::*;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("preflight");

    if args.len() < 2 {
        print_usage(program);
        return ExitCode::FAILURE;
    }

    let outcome = match args[1].as_str() {
        "list" => list_validators().map(|_| true),
        "info" => match args.get(2) {
            Some(name) => validator_info(name, args.get(3).map(String::as_str)).map(|_| true),
            None => Err(anyhow::anyhow!("Please specify a validator name")),
        },
        "check" => match (args.get(2), args.get(3)) {
            (Some(manifest), Some(scenario)) => check(manifest, scenario, args.get(4).map(String::as_str)),
            _ => Err(anyhow::anyhow!(
                "Usage: {} check <manifest.toml> <scenario.json|yaml> [plugin]",
                program
            )),
        },
        "help" | "--help" | "-h" => {
            print_usage(program);
            Ok(true)
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(program);
            Ok(false)
        }
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("Error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

fn print_usage(program: &str) {
    println!("🛫 Preflight - Benchmark Scenario Validation v{}", preflight::VERSION);
    println!();
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  list                                  List all registered validators");
    println!("  info <validator> [namespace]          Show details about a validator");
    println!("  check <manifest> <scenario> [plugin]  Validate a scenario file");
    println!("  help                                  Show this help message");
}

fn list_validators() -> Result<()> {
    let registry = ValidatorRegistry::global().read();
    let grouped = registry.grouped_by_namespace();

    println!("Available validators ({} total):", registry.len());
    println!();

    for (namespace, validators) in grouped {
        println!("  📁 {}", namespace);
        for metadata in validators {
            println!("      • {} - {}", metadata.name, metadata.description);
        }
        println!();
    }

    println!("Legacy functions:");
    for function in preflight::validators::builtin::legacy_functions() {
        println!("      • {}", function.name);
    }
    Ok(())
}

fn validator_info(name: &str, namespace: Option<&str>) -> Result<()> {
    let registry = ValidatorRegistry::global().read();
    let namespace = namespace.unwrap_or(DEFAULT_NAMESPACE);

    let Some(metadata) = registry.get_metadata(name, namespace) else {
        bail!("Validator not found: {}@{} (use 'list' to see available validators)", name, namespace);
    };

    println!("Validator: {}", metadata.key());
    println!();
    println!("Description:");
    println!("  {}", metadata.description);
    println!();

    let capabilities = &metadata.capabilities;
    println!("Requires:");
    println!("  platform: {}", capabilities.platform.as_deref().unwrap_or("-"));
    println!("  admin:    {}", capabilities.admin);
    println!("  users:    {}", capabilities.users);

    if let Some(entry) = preflight::validators::deprecated::DEPRECATED_VALIDATORS
        .iter()
        .find(|entry| entry.new_name == metadata.name && entry.old_name != entry.new_name)
    {
        println!();
        println!("Also reachable as '{}' until v{}", entry.old_name, entry.removal_version());
    }
    Ok(())
}

fn check(manifest_path: &str, scenario_path: &str, only: Option<&str>) -> Result<bool> {
    let manifest = PluginManifest::from_path(manifest_path)
        .with_context(|| format!("Failed to load manifest {}", manifest_path))?;
    let config = ScenarioConfig::from_path(scenario_path)
        .with_context(|| format!("Failed to load scenario {}", scenario_path))?;

    let plugins = match only {
        Some(name) => match manifest.plugin(name)? {
            Some(plugin) => vec![plugin],
            None => bail!("Plugin '{}' is not declared in {}", name, manifest_path),
        },
        None => manifest.build_plugins()?,
    };

    let registry = ValidatorRegistry::global().read();
    let pipeline = ValidationPipeline::new(&registry).with_settings(manifest.settings.clone());
    let credentials = Credentials::new();

    let mut all_passed = true;
    for plugin in &plugins {
        let report = pipeline
            .validate(plugin, &credentials, &config, None)
            .with_context(|| format!("Validation of {} aborted", plugin.name()))?;
        println!("{}", report.summary());
        all_passed &= report.success;
    }
    Ok(all_passed)
}
