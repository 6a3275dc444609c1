use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Radius in depth pixels for the centroid strategy's averaged sample.
    pub centroid_radius_px: u32,
    /// Retry line/polygon failures with the centroid strategy instead of erroring.
    pub fallback_to_centroid: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            centroid_radius_px: 3,
            fallback_to_centroid: true,
        }
    }
}
