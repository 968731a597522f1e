//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

use crate::core::Project;

/// Policy constants for the FPA calculation engine.
///
/// These are tunable per project; the defaults reflect common industry
/// values. All threshold semantics are documented on the field.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalculationPolicy {
    /// Hours per function point used when an estimate carries no
    /// productivity factor of its own.
    pub default_productivity_factor: f64,

    /// Working days per calendar month for duration conversion.
    pub working_days_per_month: f64,

    /// Baseline hours/FP against which team efficiency is measured.
    pub baseline_hours_per_fp: f64,

    /// Hours/FP at or below this rate as HIGH productivity.
    pub rating_high_max_hours_per_fp: f64,

    /// Hours/FP above this rate as LOW productivity.
    pub rating_low_min_hours_per_fp: f64,

    /// Teams smaller than this are flagged as a risk factor.
    pub min_team_size: u32,

    /// Teams larger than this are flagged as a risk factor.
    pub max_team_size: u32,

    /// Adjusted FP at or above this is MEDIUM scope risk.
    pub scope_medium_fp: f64,

    /// Adjusted FP at or above this is HIGH scope risk.
    pub scope_high_fp: f64,

    /// FP delivered per day at or above this is MEDIUM schedule compression.
    pub compression_medium_fp_per_day: f64,

    /// FP delivered per day at or above this is HIGH schedule compression.
    pub compression_high_fp_per_day: f64,

    /// Share of total FP in HIGH-complexity components at or above this
    /// is MEDIUM concentration risk.
    pub concentration_medium_share: f64,

    /// Share of total FP in HIGH-complexity components at or above this
    /// is HIGH concentration risk.
    pub concentration_high_share: f64,
}

impl Default for CalculationPolicy {
    fn default() -> Self {
        Self {
            default_productivity_factor: 10.0,
            working_days_per_month: 21.0,
            baseline_hours_per_fp: 10.0,
            rating_high_max_hours_per_fp: 8.0,
            rating_low_min_hours_per_fp: 15.0,
            min_team_size: 2,
            max_team_size: 10,
            scope_medium_fp: 300.0,
            scope_high_fp: 1000.0,
            compression_medium_fp_per_day: 5.0,
            compression_high_fp_per_day: 10.0,
            concentration_medium_share: 0.30,
            concentration_high_share: 0.50,
        }
    }
}

/// Metria configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default author for new entities
    pub author: Option<String>,

    /// Editor command for `metria ... edit`
    pub editor: Option<String>,

    /// Pager command for long output
    pub pager: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// Calculation policy overrides
    pub calculation: Option<CalculationPolicy>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/metria/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&global_path) {
                    if let Ok(global) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(global);
                    }
                }
            }
        }

        // 3. Project config (.metria/config.yaml)
        if let Ok(project) = Project::discover() {
            let project_config_path = project.metria_dir().join("config.yaml");
            if project_config_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&project_config_path) {
                    if let Ok(project_config) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(project_config);
                    }
                }
            }
        }

        // 4. Environment variables
        if let Ok(author) = std::env::var("METRIA_AUTHOR") {
            config.author = Some(author);
        }
        if let Ok(editor) = std::env::var("METRIA_EDITOR") {
            config.editor = Some(editor);
        }

        config
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "metria")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.editor.is_some() {
            self.editor = other.editor;
        }
        if other.pager.is_some() {
            self.pager = other.pager;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.calculation.is_some() {
            self.calculation = other.calculation;
        }
    }

    /// Get the effective calculation policy
    pub fn calculation(&self) -> CalculationPolicy {
        self.calculation.clone().unwrap_or_default()
    }

    /// Get the author name, falling back to git config or username
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        // Try git config
        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        // Fall back to username
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Get the editor command
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .or_else(|| std::env::var("VISUAL").ok())
            .unwrap_or_else(|| "vi".to_string())
    }

    /// Run the editor on a file, properly handling commands with arguments
    /// (e.g., "emacsclient -nw" or "code --wait")
    pub fn run_editor(
        &self,
        file_path: &std::path::Path,
    ) -> std::io::Result<std::process::ExitStatus> {
        let editor = self.editor();
        let parts: Vec<&str> = editor.split_whitespace().collect();

        if parts.is_empty() {
            return std::process::Command::new("vi").arg(file_path).status();
        }

        let cmd = parts[0];
        let args = &parts[1..];

        std::process::Command::new(cmd)
            .args(args)
            .arg(file_path)
            .status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults() {
        let policy = CalculationPolicy::default();
        assert_eq!(policy.default_productivity_factor, 10.0);
        assert_eq!(policy.working_days_per_month, 21.0);
        assert!(policy.rating_high_max_hours_per_fp < policy.rating_low_min_hours_per_fp);
        assert!(policy.scope_medium_fp < policy.scope_high_fp);
        assert!(policy.concentration_medium_share < policy.concentration_high_share);
    }

    #[test]
    fn test_policy_partial_yaml_fills_defaults() {
        let policy: CalculationPolicy =
            serde_yml::from_str("default_productivity_factor: 12.5").unwrap();
        assert_eq!(policy.default_productivity_factor, 12.5);
        assert_eq!(policy.working_days_per_month, 21.0);
    }

    #[test]
    fn test_config_merge_takes_other_calculation() {
        let mut base = Config::default();
        let other: Config =
            serde_yml::from_str("calculation:\n  working_days_per_month: 20.0").unwrap();
        base.merge(other);
        assert_eq!(base.calculation().working_days_per_month, 20.0);
    }
}
