// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Verbosity of the self-metrics a stage reports about its own operation.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsLevel {
    /// No self-metrics
    None,
    Basic,
    Normal,
    #[default]
    Detailed,
}

impl Display for MetricsLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsLevel::None => write!(f, "none"),
            MetricsLevel::Basic => write!(f, "basic"),
            MetricsLevel::Normal => write!(f, "normal"),
            MetricsLevel::Detailed => write!(f, "detailed"),
        }
    }
}

/// The `debug_metrics` block of a stage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugMetricsArgs {
    /// Drop attributes with unbounded cardinality (peer addresses and such)
    pub disable_high_cardinality_metrics: bool,

    pub level: MetricsLevel,
}

impl DebugMetricsArgs {
    pub fn set_to_default(&mut self) {
        *self = DebugMetricsArgs {
            disable_high_cardinality_metrics: true,
            level: MetricsLevel::Detailed,
        };
    }

    pub fn enabled(&self) -> bool {
        self.level != MetricsLevel::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_to_default() {
        let mut args = DebugMetricsArgs {
            disable_high_cardinality_metrics: false,
            level: MetricsLevel::None,
        };
        args.set_to_default();
        assert!(args.disable_high_cardinality_metrics);
        assert_eq!(MetricsLevel::Detailed, args.level);
        assert!(args.enabled());
    }

    #[test]
    fn test_level_names() {
        let args: DebugMetricsArgs = serde_json::from_str(r#"{"level": "none"}"#).unwrap();
        assert!(!args.enabled());
        assert_eq!("none", args.level.to_string());

        let res: Result<DebugMetricsArgs, _> = serde_json::from_str(r#"{"level": "verbose"}"#);
        assert!(res.is_err());
    }
}
