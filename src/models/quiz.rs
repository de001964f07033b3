use serde::{Deserialize, Serialize};

/// Minimum percentage that counts as a pass.
pub const QUIZ_PASS_PERCENT: u32 = 70;
pub const XP_PER_CORRECT_ANSWER: u64 = 50;

/// Multiple-choice question closing out a learning module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: u32,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
}

impl QuizQuestion {
    pub fn is_correct(&self, answer: usize) -> bool {
        answer == self.correct_answer
    }
}

/// Graded attempt at a module quiz.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub module_id: u32,
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub passed: bool,
    pub perfect: bool,
    pub xp_earned: u64,
}

impl QuizResult {
    /// Percentage is rounded half up. An empty quiz never passes.
    pub fn grade(module_id: u32, score: u32, total: u32) -> Self {
        let score = score.min(total);
        let percentage = if total == 0 {
            0
        } else {
            (score * 100 + total / 2) / total
        };
        Self {
            module_id,
            score,
            total,
            percentage,
            passed: total > 0 && percentage >= QUIZ_PASS_PERCENT,
            perfect: total > 0 && score == total,
            xp_earned: u64::from(score) * XP_PER_CORRECT_ANSWER,
        }
    }

    /// Scores `answers` in question order; unanswered questions count as wrong.
    pub fn from_answers(module_id: u32, questions: &[QuizQuestion], answers: &[usize]) -> Self {
        let score = questions
            .iter()
            .zip(answers)
            .filter(|(question, answer)| question.is_correct(**answer))
            .count();
        let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);
        Self::grade(module_id, u32::try_from(score).unwrap_or(total), total)
    }
}
