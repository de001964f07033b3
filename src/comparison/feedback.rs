use serde::{Deserialize, Serialize};

/// Discrete feedback derived from a confidence score.
///
/// Only `Matched` moves the state machine; the other bands change the
/// message shown while detection continues.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FeedbackBand {
    Matched,
    VeryClose,
    GoodProgress,
    MatchMoreClosely,
    KeepPracticing,
    PositionHand,
}

const VERY_CLOSE_FLOOR: f64 = 0.70;
const GOOD_PROGRESS_FLOOR: f64 = 0.50;
const MATCH_MORE_FLOOR: f64 = 0.30;
const KEEP_PRACTICING_FLOOR: f64 = 0.10;

pub const POSITION_HAND_MESSAGE: &str = "Position your hand in the camera view";

impl FeedbackBand {
    /// Pure in both arguments; non-finite confidence counts as zero.
    pub fn for_confidence(confidence: f64, threshold: f64) -> Self {
        let confidence = if confidence.is_finite() { confidence } else { 0.0 };

        if confidence >= threshold {
            FeedbackBand::Matched
        } else if confidence >= VERY_CLOSE_FLOOR {
            FeedbackBand::VeryClose
        } else if confidence >= GOOD_PROGRESS_FLOOR {
            FeedbackBand::GoodProgress
        } else if confidence >= MATCH_MORE_FLOOR {
            FeedbackBand::MatchMoreClosely
        } else if confidence >= KEEP_PRACTICING_FLOOR {
            FeedbackBand::KeepPracticing
        } else {
            FeedbackBand::PositionHand
        }
    }

    pub fn message(&self, sign: &str, confidence: f64) -> String {
        match self {
            FeedbackBand::Matched => format!(
                "Great job! \"{sign}\" detected with {}% confidence",
                percent(confidence)
            ),
            FeedbackBand::VeryClose => "Very close! Adjust your hand position slightly".into(),
            FeedbackBand::GoodProgress => "Good progress! Keep adjusting your hand shape".into(),
            FeedbackBand::MatchMoreClosely => {
                "Hand detected. Try to match the target sign more closely".into()
            }
            FeedbackBand::KeepPracticing => "Hand detected. Keep practicing!".into(),
            FeedbackBand::PositionHand => POSITION_HAND_MESSAGE.into(),
        }
    }
}

pub fn percent(confidence: f64) -> u32 {
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 0.80;

    #[test]
    fn band_boundaries() {
        let cases = [
            (1.0, FeedbackBand::Matched),
            (0.80, FeedbackBand::Matched),
            (0.7999, FeedbackBand::VeryClose),
            (0.70, FeedbackBand::VeryClose),
            (0.6999, FeedbackBand::GoodProgress),
            (0.50, FeedbackBand::GoodProgress),
            (0.4999, FeedbackBand::MatchMoreClosely),
            (0.30, FeedbackBand::MatchMoreClosely),
            (0.2999, FeedbackBand::KeepPracticing),
            (0.10, FeedbackBand::KeepPracticing),
            (0.0999, FeedbackBand::PositionHand),
            (0.0, FeedbackBand::PositionHand),
        ];
        for (confidence, expected) in cases {
            assert_eq!(
                FeedbackBand::for_confidence(confidence, THRESHOLD),
                expected,
                "confidence {confidence}"
            );
        }
    }

    #[test]
    fn bands_are_deterministic() {
        for step in 0..=1000 {
            let confidence = step as f64 / 1000.0;
            assert_eq!(
                FeedbackBand::for_confidence(confidence, THRESHOLD),
                FeedbackBand::for_confidence(confidence, THRESHOLD)
            );
        }
    }

    #[test]
    fn threshold_is_configurable() {
        assert_eq!(FeedbackBand::for_confidence(0.75, 0.75), FeedbackBand::Matched);
        assert_eq!(FeedbackBand::for_confidence(0.85, 0.9), FeedbackBand::VeryClose);
    }

    #[test]
    fn nan_scores_position_hand() {
        assert_eq!(
            FeedbackBand::for_confidence(f64::NAN, THRESHOLD),
            FeedbackBand::PositionHand
        );
    }

    #[test]
    fn matched_message_names_the_sign() {
        let message = FeedbackBand::Matched.message("Hello", 0.954);
        assert!(message.contains("\"Hello\""));
        assert!(message.contains("95%"));
    }
}
