//! Validation pipeline implementation.

use crate::core::config::ScenarioConfig;
use crate::core::credentials::Credentials;
use crate::core::error::{PreflightResult, ValidationReport};
use crate::core::settings::Settings;
use crate::validators::plugin::ScenarioPlugin;
use crate::validators::registry::{Validator, ValidatorKind, ValidatorRegistry};
use serde_json::Value;
use std::time::Instant;

/// Runs the validators a scenario plugin declares.
///
/// Validators run in declaration order and the run stops at the first
/// failure. Errors (unknown validators, bad arguments, platform failures)
/// abort the run and are returned as `Err`.
pub struct ValidationPipeline<'r> {
    registry: &'r ValidatorRegistry,
    settings: Settings,
}

impl<'r> ValidationPipeline<'r> {
    /// Create a pipeline over a registry with default settings.
    pub fn new(registry: &'r ValidatorRegistry) -> Self {
        Self {
            registry,
            settings: Settings::default(),
        }
    }

    /// Use the given settings.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Settings of this pipeline.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Build every validator the plugin declares.
    pub fn instantiate(&self, plugin: &ScenarioPlugin) -> PreflightResult<Vec<ValidatorKind>> {
        plugin
            .validators()
            .iter()
            .map(|spec| spec.instantiate(self.registry, &self.settings))
            .collect()
    }

    /// Validate a scenario configuration against a plugin's validators.
    pub fn validate(
        &self,
        plugin: &ScenarioPlugin,
        credentials: &Credentials,
        config: &ScenarioConfig,
        platform_config: Option<&Value>,
    ) -> PreflightResult<ValidationReport> {
        let start = Instant::now();
        let mut report = ValidationReport::new(plugin.name());

        // Argument errors surface before any platform call.
        let validators = self.instantiate(plugin)?;

        for (spec, validator) in plugin.validators().iter().zip(&validators) {
            let result = validator.validate(credentials, config, plugin, platform_config)?;
            report.validators_run += 1;
            log::debug!(
                "[{}] {} / {}: {}",
                report.run_id,
                plugin.name(),
                spec.name(),
                if result.is_valid() { "ok" } else { result.msg() }
            );

            if let Some(message) = result.into_failure() {
                report.fail(spec.name(), message);
                break;
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        log::info!("[{}] {} ({} ms)", report.run_id, report.summary(), report.duration_ms);
        Ok(report)
    }

    /// Quick check: does the configuration pass every validator?
    pub fn is_valid(
        &self,
        plugin: &ScenarioPlugin,
        credentials: &Credentials,
        config: &ScenarioConfig,
    ) -> PreflightResult<bool> {
        Ok(self.validate(plugin, credentials, config, None)?.success)
    }
}
