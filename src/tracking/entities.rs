use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::percentage::TEAM_TARGET_PERCENTAGE;

/// Static target of a single person. Belongs to the configuration, the engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetConfig {
    pub employee_name: String,
    pub daily_goal: String,
}

impl TargetConfig {
    pub fn new(employee_name: impl Into<String>, daily_goal: impl Into<String>) -> Self {
        Self {
            employee_name: employee_name.into(),
            daily_goal: daily_goal.into(),
        }
    }
}

/// Hours someone reported for a day, before any percentage is calculated. `hours_worked` may be
/// empty when nothing was typed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeHours {
    pub name: String,
    pub hours_worked: String,
    pub daily_goal: String,
}

impl EmployeeHours {
    pub fn new(
        name: impl Into<String>,
        hours_worked: impl Into<String>,
        daily_goal: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            hours_worked: hours_worked.into(),
            daily_goal: daily_goal.into(),
        }
    }
}

/// Result of one person for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkEntry {
    pub name: String,
    #[serde(rename = "hours")]
    pub hours_worked: String,
    pub daily_goal: String,
    #[serde(default, with = "null_as_zero")]
    pub percentage: f64,
}

/// Aggregated result of a calendar day across the whole team. This is the unit stored in the
/// history, dates are written as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub employees: Vec<WorkEntry>,
    #[serde(default, with = "null_as_zero")]
    pub average_percentage: f64,
    pub average_time: String,
}

impl DailyRecord {
    pub fn goal_met(&self) -> bool {
        self.average_percentage >= TEAM_TARGET_PERCENTAGE
    }

    pub fn entry(&self, name: &str) -> Option<&WorkEntry> {
        self.employees.iter().find(|v| v.name == name)
    }
}

/// Older history files may contain `null` where a percentage couldn't be calculated.
mod null_as_zero {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(*value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.))
    }
}
