// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Deserializer, Serialize};

/// The `output` block of a stage: names of the downstream inputs that receive
/// each kind of telemetry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerArgs {
    pub metrics: Vec<String>,
    pub logs: Vec<String>,
    pub traces: Vec<String>,
}

impl ConsumerArgs {
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.logs.is_empty() && self.traces.is_empty()
    }
}

// Deserializes a block that must be present in the user's configuration. A
// missing field fails with "missing field", unlike a plain Option.
pub(crate) fn required<'de, D>(deserializer: D) -> Result<Option<ConsumerArgs>, D::Error>
where
    D: Deserializer<'de>,
{
    ConsumerArgs::deserialize(deserializer).map(Some)
}
