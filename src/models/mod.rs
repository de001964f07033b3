pub mod content;
pub mod gesture;
pub mod landmark;
pub mod progress;
pub mod quiz;

pub use content::{Difficulty, Lesson, Sign};
pub use gesture::{
    ComparisonSource, GestureComparisonRequest, GestureComparisonResponse,
    GestureRecognitionResult, PracticeGesture,
};
pub use landmark::{HandLandmarks, Handedness, Landmark, LANDMARKS_PER_HAND};
pub use progress::{
    Badge, BadgeRarity, ModuleProgress, ModuleStatus, ProgressStats, UserProgress,
};
pub use quiz::{QuizQuestion, QuizResult, QUIZ_PASS_PERCENT, XP_PER_CORRECT_ANSWER};
