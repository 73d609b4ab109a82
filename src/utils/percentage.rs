use std::{fmt::Display, ops::Deref, str::FromStr};

use anyhow::anyhow;

use super::duration::parse_minutes;

/// Average percentage a team day has to reach to count as met.
pub const TEAM_TARGET_PERCENTAGE: f64 = 90.;

/// Worked time as a percentage of the goal. A zero goal gives 0, there is no upper cap.
pub fn percentage(worked_minutes: u32, goal_minutes: u32) -> f64 {
    if goal_minutes == 0 {
        0.
    } else {
        worked_minutes as f64 / goal_minutes as f64 * 100.
    }
}

/// Same as [percentage], converting both durations with the lenient
/// [parse_minutes](super::duration::parse_minutes).
pub fn percentage_of(worked: &str, goal: &str) -> f64 {
    percentage(parse_minutes(worked), parse_minutes(goal))
}

/// Rounds to a single decimal place.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.).round() / 10.
}

/// One decimal with a comma as the separator, e.g. `94,1`. This is how the team reads
/// percentages, stored values stay numeric.
pub fn display(value: f64) -> String {
    format!("{:.1}", round_tenth(value)).replace('.', ",")
}

/// How far below the team target an average is. `None` once the target is reached.
pub fn goal_gap(average: f64) -> Option<f64> {
    (average < TEAM_TARGET_PERCENTAGE).then(|| TEAM_TARGET_PERCENTAGE - average)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceBand {
    OnTarget,
    Close,
    Low,
    Critical,
}

impl PerformanceBand {
    pub fn of(value: f64) -> Self {
        if value >= TEAM_TARGET_PERCENTAGE {
            PerformanceBand::OnTarget
        } else if value >= 70. {
            PerformanceBand::Close
        } else if value >= 50. {
            PerformanceBand::Low
        } else {
            PerformanceBand::Critical
        }
    }
}

impl Display for PerformanceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PerformanceBand::OnTarget => write!(f, "on target"),
            PerformanceBand::Close => write!(f, "close"),
            PerformanceBand::Low => write!(f, "low"),
            PerformanceBand::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", display(self.0))
    }
}

impl Percentage {
    pub fn new_opt(value: f64) -> Option<Percentage> {
        if value < 0. || value.is_nan() {
            None
        } else {
            Some(Percentage(value))
        }
    }

    pub fn band(&self) -> PerformanceBand {
        PerformanceBand::of(self.0)
    }
}

impl FromStr for Percentage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Both separators are accepted since values get copied out of the display form
        let s = s.trim_end_matches("%").replace(',', ".");
        let v = s.parse::<f64>()?;
        Percentage::new_opt(v).ok_or_else(|| anyhow!("Can't parse {s} into percentage"))
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
