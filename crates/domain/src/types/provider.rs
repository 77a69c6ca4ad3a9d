//! External health-data provider types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::measurement::MeasurementType;

/// Metadata marker this app writes onto provider samples it pushes.
/// Samples carrying it are skipped on import to prevent re-import loops.
pub const APP_ORIGIN_MARKER: &str = "bodylog";

/// A sample as reported by the external health-data provider.
///
/// Sample identifiers are provider-assigned and opaque to this engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderSample {
    pub sample_id: String,
    pub kind: MeasurementType,
    pub value: f64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Origin tag recorded by whichever app wrote the sample.
    pub origin: Option<String>,
}

impl ProviderSample {
    /// Whether this sample was pushed by this app.
    pub fn is_app_originated(&self) -> bool {
        self.origin.as_deref() == Some(APP_ORIGIN_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_marker_detection() {
        let mut sample = ProviderSample {
            sample_id: "hk-1".into(),
            kind: MeasurementType::Weight,
            value: 80.0,
            start: Utc::now(),
            end: Utc::now(),
            origin: Some(APP_ORIGIN_MARKER.into()),
        };
        assert!(sample.is_app_originated());

        sample.origin = Some("some-other-app".into());
        assert!(!sample.is_app_originated());

        sample.origin = None;
        assert!(!sample.is_app_originated());
    }
}
