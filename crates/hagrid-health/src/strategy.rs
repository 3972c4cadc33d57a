//! Node health strategies and the scores they give each health colour.

use std::fmt;
use std::str::FromStr;

use hagrid_core::{ClusterOptions, INFINITY, parse_score};

use crate::error::HealthError;

/// How node health attributes influence placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthStrategy {
    /// Health attributes are ignored.
    #[default]
    None,
    /// Resources move away from red nodes.
    MigrateOnRed,
    /// Resources only run on green nodes.
    OnlyGreen,
    /// Colour scores and a base score come from configuration.
    Progressive,
    /// Colour scores come from configuration.
    Custom,
}

impl FromStr for HealthStrategy {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "migrate-on-red" => Ok(Self::MigrateOnRed),
            "only-green" => Ok(Self::OnlyGreen),
            "progressive" => Ok(Self::Progressive),
            "custom" => Ok(Self::Custom),
            _ => Err(HealthError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for HealthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::MigrateOnRed => "migrate-on-red",
            Self::OnlyGreen => "only-green",
            Self::Progressive => "progressive",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Whether `value` names a known health strategy.
pub fn validate_health_strategy(value: &str) -> bool {
    value.parse::<HealthStrategy>().is_ok()
}

/// Scores for the `red`, `yellow` and `green` attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColourScores {
    pub red: i32,
    pub yellow: i32,
    pub green: i32,
}

impl ColourScores {
    pub fn for_strategy(strategy: HealthStrategy, options: &ClusterOptions) -> Self {
        match strategy {
            HealthStrategy::None => Self { red: 0, yellow: 0, green: 0 },
            HealthStrategy::MigrateOnRed => Self { red: -INFINITY, yellow: 0, green: 0 },
            HealthStrategy::OnlyGreen => Self { red: -INFINITY, yellow: -INFINITY, green: 0 },
            HealthStrategy::Progressive | HealthStrategy::Custom => Self {
                red: parse_score(&options.node_health_red),
                yellow: parse_score(&options.node_health_yellow),
                green: parse_score(&options.node_health_green),
            },
        }
    }

    /// Score of one health attribute value: a colour or a plain score.
    pub fn score(&self, value: &str) -> i32 {
        if value.eq_ignore_ascii_case("red") {
            self.red
        } else if value.eq_ignore_ascii_case("yellow") {
            self.yellow
        } else if value.eq_ignore_ascii_case("green") {
            self.green
        } else {
            parse_score(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_strategy_names() {
        for valid in ["none", "None", "NONE", "NoNe", "migrate-on-red", "only-green", "progressive", "custom"] {
            assert!(validate_health_strategy(valid), "{valid} should be valid");
        }
        for invalid in ["", "none to speak of", "customized"] {
            assert!(!validate_health_strategy(invalid), "{invalid:?} should be invalid");
        }
    }

    #[test]
    fn fixed_strategies_ignore_configured_colours() {
        let options = ClusterOptions {
            node_health_red: "-10".to_string(),
            ..ClusterOptions::default()
        };
        let scores = ColourScores::for_strategy(HealthStrategy::OnlyGreen, &options);
        assert_eq!(scores.yellow, -INFINITY);
        assert_eq!(scores.red, -INFINITY);

        let scores = ColourScores::for_strategy(HealthStrategy::Custom, &options);
        assert_eq!(scores.red, -10);
        assert_eq!(scores.green, 0);
    }

    #[test]
    fn attribute_values_map_colours_and_scores() {
        let scores = ColourScores::for_strategy(HealthStrategy::MigrateOnRed, &ClusterOptions::default());
        assert_eq!(scores.score("RED"), -INFINITY);
        assert_eq!(scores.score("green"), 0);
        assert_eq!(scores.score("-1"), -1);
        assert_eq!(scores.score("+INFINITY"), INFINITY);
    }
}
