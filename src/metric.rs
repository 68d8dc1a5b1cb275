use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::UnsupportedModeError;

/// Actual-vs-expected metric pair a chart or filter works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MetricMode {
    G,
    A,
    GA,
    PTS,
}

impl MetricMode {
    pub const ALL: [MetricMode; 4] = [MetricMode::G, MetricMode::A, MetricMode::GA, MetricMode::PTS];

    pub fn actual_column(self) -> &'static str {
        match self {
            MetricMode::G => "G",
            MetricMode::A => "A",
            MetricMode::GA => "GA",
            MetricMode::PTS => "PTS",
        }
    }

    pub fn expected_column(self) -> &'static str {
        match self {
            MetricMode::G => "xG",
            MetricMode::A => "xA",
            MetricMode::GA => "xGA",
            MetricMode::PTS => "xPTS",
        }
    }

    pub fn full_name(self) -> &'static str {
        match self {
            MetricMode::G => "Goal",
            MetricMode::A => "Assist",
            MetricMode::GA => "GoalAgainst",
            MetricMode::PTS => "Points",
        }
    }

    /// Lower-than-expected is the good direction for goals against.
    pub fn lower_is_better(self) -> bool {
        matches!(self, MetricMode::GA)
    }

    pub(crate) fn require(
        self,
        allowed: &[MetricMode],
        chart: &'static str,
    ) -> Result<Self, UnsupportedModeError> {
        if allowed.contains(&self) {
            Ok(self)
        } else {
            Err(UnsupportedModeError {
                mode: self.to_string(),
                chart: Some(chart),
            })
        }
    }
}

impl fmt::Display for MetricMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.actual_column())
    }
}

impl FromStr for MetricMode {
    type Err = UnsupportedModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "G" => Ok(MetricMode::G),
            "A" => Ok(MetricMode::A),
            "GA" => Ok(MetricMode::GA),
            "PTS" => Ok(MetricMode::PTS),
            other => Err(UnsupportedModeError {
                mode: other.to_string(),
                chart: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recognized_modes_only() {
        for mode in MetricMode::ALL {
            assert_eq!(mode.to_string().parse::<MetricMode>(), Ok(mode));
        }
        let err = "xG".parse::<MetricMode>().unwrap_err();
        assert_eq!(err.mode, "xG");
        assert!("g".parse::<MetricMode>().is_err());
    }

    #[test]
    fn require_names_the_chart() {
        let err = MetricMode::PTS
            .require(&[MetricMode::G, MetricMode::A], "player")
            .unwrap_err();
        assert_eq!(err.to_string(), "unsupported metric mode `PTS` for player chart");
    }
}
