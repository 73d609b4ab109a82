use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    tracking::entities::{EmployeeHours, TargetConfig},
    utils::duration::is_valid_duration,
};

pub const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_DAILY_GOAL: &str = "8:30";

/// Team setup stored next to the history. Missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerConfig {
    /// Goal used for people outside of the team list and for imported rows without a goal.
    pub default_goal: String,
    pub team: Vec<TargetConfig>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            default_goal: DEFAULT_DAILY_GOAL.into(),
            team: vec![
                TargetConfig::new("Raposo", "8:30"),
                TargetConfig::new("Mika", "8:30"),
                TargetConfig::new("Luiz", "8:30"),
                TargetConfig::new("Schutz", "6:00"),
                TargetConfig::new("Caio", "6:00"),
                TargetConfig::new("Thiago", "6:00"),
            ],
        }
    }
}

impl TrackerConfig {
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }

    /// Reads the config from `dir`, writing the default one first if there is none.
    pub fn load_or_create(dir: &Path) -> Result<Self> {
        let path = Self::path_in(dir);
        let config = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<TrackerConfig>(&content)
                .with_context(|| format!("Invalid config in {path:?}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Creating default config in {path:?}");
                let config = TrackerConfig::default();
                fs::write(&path, serde_json::to_string_pretty(&config)?)
                    .with_context(|| format!("Failed to write config into {path:?}"))?;
                config
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read {path:?}")),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_valid_duration(&self.default_goal) {
            bail!("Default goal {:?} should look like H:MM", self.default_goal);
        }
        for member in &self.team {
            if !is_valid_duration(&member.daily_goal) {
                bail!(
                    "Goal {:?} of {} should look like H:MM",
                    member.daily_goal,
                    member.employee_name
                );
            }
        }
        Ok(())
    }

    pub fn goal_for(&self, name: &str) -> &str {
        self.team
            .iter()
            .find(|v| v.employee_name == name)
            .map(|v| v.daily_goal.as_str())
            .unwrap_or(&self.default_goal)
    }

    /// Empty hours for every team member, the starting point of a new day.
    pub fn blank_day(&self) -> Vec<EmployeeHours> {
        self.team
            .iter()
            .map(|v| EmployeeHours::new(v.employee_name.clone(), "", v.daily_goal.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_default_config_is_written() -> Result<()> {
        let dir = tempdir()?;
        let config = TrackerConfig::load_or_create(dir.path())?;
        assert_eq!(config, TrackerConfig::default());
        assert!(TrackerConfig::path_in(dir.path()).exists());
        assert_eq!(TrackerConfig::load_or_create(dir.path())?, config);
        Ok(())
    }

    #[test]
    fn test_partial_config() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            TrackerConfig::path_in(dir.path()),
            r#"{"team": [{"employeeName": "Ana", "dailyGoal": "7:00"}]}"#,
        )?;
        let config = TrackerConfig::load_or_create(dir.path())?;
        assert_eq!(config.default_goal, DEFAULT_DAILY_GOAL);
        assert_eq!(config.goal_for("Ana"), "7:00");
        assert_eq!(config.goal_for("Someone else"), DEFAULT_DAILY_GOAL);
        Ok(())
    }

    #[test]
    fn test_invalid_goal_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            TrackerConfig::path_in(dir.path()),
            r#"{"defaultGoal": "eight"}"#,
        )?;
        assert!(TrackerConfig::load_or_create(dir.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_blank_day() {
        let day = TrackerConfig::default().blank_day();
        assert_eq!(day.len(), 6);
        assert!(day.iter().all(|v| v.hours_worked.is_empty()));
        assert_eq!(day[3], EmployeeHours::new("Schutz", "", "6:00"));
    }
}
