use serde::{Deserialize, Serialize};

/// Keypoints per hand in the detector's convention (wrist + 4 per finger).
pub const LANDMARKS_PER_HAND: usize = 21;

/// Normalized camera-frame coordinate. Travels as `[x, y, z]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Landmark {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Landmark> for [f32; 3] {
    fn from(point: Landmark) -> Self {
        [point.x, point.y, point.z]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Handedness {
    #[serde(alias = "Left")]
    Left,
    #[serde(alias = "Right")]
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Handedness::Left => "Left",
            Handedness::Right => "Right",
        }
    }
}

/// One detected hand for one frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HandLandmarks {
    pub handedness: Handedness,
    #[serde(default = "default_score")]
    pub score: f32,
    pub landmarks: Vec<Landmark>,
}

fn default_score() -> f32 {
    1.0
}

impl HandLandmarks {
    pub fn new(handedness: Handedness, landmarks: Vec<Landmark>) -> Self {
        Self {
            handedness,
            score: 1.0,
            landmarks,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.landmarks.len() == LANDMARKS_PER_HAND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landmark_serializes_as_triple() {
        let point = Landmark::new(0.25, 0.5, -0.125);
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, "[0.25,0.5,-0.125]");

        let parsed: Landmark = serde_json::from_str("[0.1,0.2,0.3]").unwrap();
        assert_eq!(parsed, Landmark::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn hand_defaults_score_when_missing() {
        let hand: HandLandmarks =
            serde_json::from_str(r#"{"handedness":"right","landmarks":[[0,0,0]]}"#).unwrap();
        assert_eq!(hand.handedness, Handedness::Right);
        assert_eq!(hand.score, 1.0);
        assert!(!hand.is_complete());
    }

    #[test]
    fn detector_handedness_labels_are_accepted() {
        let hand: HandLandmarks =
            serde_json::from_str(r#"{"handedness":"Left","score":0.9,"landmarks":[]}"#).unwrap();
        assert_eq!(hand.handedness, Handedness::Left);
        let right: Handedness = serde_json::from_str(r#""Right""#).unwrap();
        assert_eq!(right, Handedness::Right);
        assert_eq!(serde_json::to_string(&right).unwrap(), r#""right""#);
    }
}
