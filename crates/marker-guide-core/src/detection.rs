//! Detector output as consumed by the pipeline.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// One marker reported by the external detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerObservation {
    /// Dictionary id of the marker.
    pub id: u32,
    /// Image-space corners in detector order (TL, TR, BR, BL), pixels.
    pub corners: [Point2<f64>; 4],
}

impl MarkerObservation {
    pub fn new(id: u32, corners: [[f64; 2]; 4]) -> Self {
        Self {
            id,
            corners: corners.map(|[x, y]| Point2::new(x, y)),
        }
    }
}

/// All markers reported for a single camera frame. Empty is valid and common.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameDetections {
    pub markers: Vec<MarkerObservation>,
}

impl FrameDetections {
    pub fn new(markers: Vec<MarkerObservation>) -> Self {
        Self { markers }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Fixed set of marker ids the guide reacts to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList {
    ids: Vec<u32>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self { ids: vec![10, 26] }
    }
}

impl AllowList {
    pub fn new(ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    #[inline]
    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    /// First allow-listed marker in detector order.
    ///
    /// Detector order is not guaranteed to be stable across frames, so with
    /// several allow-listed markers in view the target may switch.
    pub fn select<'a>(&self, frame: &'a FrameDetections) -> Option<&'a MarkerObservation> {
        frame.markers.iter().find(|m| self.contains(m.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(id: u32) -> MarkerObservation {
        MarkerObservation::new(
            id,
            [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
        )
    }

    #[test]
    fn selects_first_allowed_marker() {
        let allow = AllowList::new([10, 26]);
        let frame = FrameDetections::new(vec![square(3), square(26), square(10)]);
        let picked = allow.select(&frame).expect("allowed marker present");
        assert_eq!(picked.id, 26);
    }

    #[test]
    fn ignores_frames_without_allowed_ids() {
        let allow = AllowList::default();
        assert!(allow.select(&FrameDetections::empty()).is_none());
        let frame = FrameDetections::new(vec![square(1), square(2)]);
        assert!(allow.select(&frame).is_none());
    }

    #[test]
    fn frames_deserialize_from_plain_arrays() {
        let json = r#"[{"id": 10, "corners": [[1.0, 2.0], [3.0, 2.0], [3.0, 4.0], [1.0, 4.0]]}]"#;
        let frame: FrameDetections = serde_json::from_str(json).expect("valid frame");
        assert_eq!(frame.markers.len(), 1);
        assert_eq!(frame.markers[0].id, 10);
        assert_eq!(frame.markers[0].corners[2], Point2::new(3.0, 4.0));
    }
}
