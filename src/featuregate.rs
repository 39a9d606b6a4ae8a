// SPDX-License-Identifier: Apache-2.0

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Maturity of a component type. Ordered from least to most stable, so a
/// minimum level can be compared directly against a registration.
#[derive(
    Default, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Stability {
    /// Never a valid level for a registered component
    #[default]
    #[value(skip)]
    Undefined,
    /// Subject to breaking changes, no compatibility guarantees
    Experimental,
    /// Reasonably stable, may still change between minor releases
    PublicPreview,
    /// Covered by backwards compatibility guarantees
    GenerallyAvailable,
}

impl Stability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stability::Undefined => "<invalid_stability_level>",
            Stability::Experimental => "experimental",
            Stability::PublicPreview => "public-preview",
            Stability::GenerallyAvailable => "generally-available",
        }
    }
}

impl Display for Stability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Stability {
    type Err = FeatureGateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "experimental" => Ok(Stability::Experimental),
            "public-preview" => Ok(Stability::PublicPreview),
            "generally-available" => Ok(Stability::GenerallyAvailable),
            _ => Err(FeatureGateError::UnknownLevel(s.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeatureGateError {
    #[error("unknown stability level {0:?}")]
    UnknownLevel(String),

    #[error("stability levels must be defined: got {stability:?} as stability of {feature}")]
    Undefined { feature: String, stability: String },

    #[error(
        "{feature} is at stability level {stability:?}, which is below the minimum allowed stability level {minimum:?}. Use --stability-level command-line flag to enable {stability:?}"
    )]
    BelowMinimum {
        feature: String,
        stability: String,
        minimum: String,
    },
}

/// Returns an error when `stability` is below `minimum` for the named feature.
pub fn check_allowed(
    stability: Stability,
    minimum: Stability,
    feature: &str,
) -> Result<(), FeatureGateError> {
    if stability == Stability::Undefined || minimum == Stability::Undefined {
        return Err(FeatureGateError::Undefined {
            feature: feature.to_string(),
            stability: stability.to_string(),
        });
    }

    if stability < minimum {
        return Err(FeatureGateError::BelowMinimum {
            feature: feature.to_string(),
            stability: stability.to_string(),
            minimum: minimum.to_string(),
        });
    }

    Ok(())
}
