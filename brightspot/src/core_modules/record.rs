// The metadata row handed to whoever keeps analysis history. The engine only
// builds it; storing it is the caller's business.

use crate::core_modules::intensity::{Luminance, Statistics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// The file name as uploaded, before sanitising.
    pub filename: String,
    pub average_brightness: Luminance,
    pub brightest_value: Luminance,
    pub darkest_value: Luminance,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn new(filename: impl Into<String>, statistics: &Statistics) -> Self {
        Self::at(filename, statistics, Utc::now())
    }

    pub fn at(filename: impl Into<String>, statistics: &Statistics, created_at: DateTime<Utc>) -> Self {
        Self {
            filename: filename.into(),
            average_brightness: statistics.average_brightness,
            brightest_value: statistics.brightest_value,
            darkest_value: statistics.darkest_value,
            created_at,
        }
    }
}
