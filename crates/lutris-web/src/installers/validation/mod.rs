mod config;
mod rules;

pub use config::{ValidationConfig, DEFAULT_DEPRECATED_WINE_VERSIONS};

use super::domain::Installer;
use super::script::{InstallerScript, ScriptError};
use crate::catalog::Runner;
use rules::{RuleContext, RULES};
use serde::{Deserialize, Serialize};

/// Runs every shape rule against installer scripts.
#[derive(Debug, Clone, Default)]
pub struct InstallerValidator {
    config: ValidationConfig,
}

impl InstallerValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Rules are independent: every rule runs and all failures are reported.
    pub fn validate_script(
        &self,
        script: &InstallerScript,
        runner: Option<&Runner>,
    ) -> ValidationReport {
        let ctx = RuleContext {
            script,
            runner,
            config: &self.config,
        };

        let issues = RULES
            .iter()
            .flat_map(|(rule, check)| {
                check(&ctx).into_iter().map(move |message| ValidationIssue {
                    rule: rule.to_string(),
                    message,
                })
            })
            .collect();

        ValidationReport { issues }
    }

    pub fn validate_installer(&self, installer: &Installer) -> Result<ValidationReport, ScriptError> {
        let script = installer.script()?;
        Ok(self.validate_script(&script, Some(&installer.runner)))
    }
}

/// Validate an installer with the default rule configuration.
pub fn validate_installer(installer: &Installer) -> Result<ValidationReport, ScriptError> {
    InstallerValidator::default().validate_installer(installer)
}

/// Single failed rule check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub rule: String,
    pub message: String,
}

/// Outcome of running every rule against one script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn errors(&self) -> Vec<String> {
        self.issues
            .iter()
            .map(|issue| issue.message.clone())
            .collect()
    }

    pub fn summary(&self) -> String {
        if self.is_valid() {
            "installer is valid".to_string()
        } else {
            format!("{} problem(s): {}", self.issues.len(), self.errors().join("; "))
        }
    }
}
