//! Built-in content served when the remote table API is unavailable.

use chrono::Utc;

use crate::models::{Difficulty, Lesson, ProgressStats, Sign, UserProgress};

/// A target sign offered in a practice session, with a short how-to.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSign {
    pub id: String,
    pub sign: String,
    pub description: String,
}

fn sign(id: &str, word: &str, image: &str, description: &str) -> Sign {
    let url = format!("/{image}");
    Sign {
        id: id.into(),
        word: word.into(),
        category: "greetings".into(),
        video_url: url.clone(),
        thumbnail_url: url,
        description: description.into(),
        difficulty: Difficulty::Beginner,
    }
}

pub fn signs() -> Vec<Sign> {
    vec![
        sign("1", "Hello", "jsl-hello-sign.jpg", "A friendly greeting gesture"),
        sign("2", "Thank You", "jsl-thank-you-sign.jpg", "Express gratitude"),
        sign("3", "Please", "jsl-please-sign.jpg", "Polite request gesture"),
    ]
}

struct LessonSeed {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    module_id: u32,
    category: &'static str,
    difficulty: Difficulty,
    duration_minutes: u32,
    xp_reward: u32,
    locked: bool,
}

const LESSONS: &[LessonSeed] = &[
    LessonSeed { id: "1-1", title: "Basic Greetings", description: "Learn essential greeting signs to start conversations", module_id: 1, category: "basics", difficulty: Difficulty::Beginner, duration_minutes: 15, xp_reward: 100, locked: false },
    LessonSeed { id: "1-2", title: "Polite Expressions", description: "Learn polite signs for respectful communication", module_id: 1, category: "basics", difficulty: Difficulty::Beginner, duration_minutes: 12, xp_reward: 80, locked: false },
    LessonSeed { id: "1-3", title: "Goodbye & Farewell", description: "Learn how to say goodbye in JSL", module_id: 1, category: "basics", difficulty: Difficulty::Beginner, duration_minutes: 10, xp_reward: 70, locked: false },
    LessonSeed { id: "1-4", title: "Introduction to JSL", description: "Get started with the basics of Jamaican Sign Language", module_id: 1, category: "basics", difficulty: Difficulty::Beginner, duration_minutes: 8, xp_reward: 50, locked: false },
    LessonSeed { id: "2-1", title: "JSL Alphabet A-F", description: "Learn the first six letters of the JSL alphabet", module_id: 2, category: "alphabet", difficulty: Difficulty::Beginner, duration_minutes: 20, xp_reward: 120, locked: false },
    LessonSeed { id: "2-2", title: "JSL Alphabet G-L", description: "Continue with letters G through L", module_id: 2, category: "alphabet", difficulty: Difficulty::Beginner, duration_minutes: 18, xp_reward: 110, locked: false },
    LessonSeed { id: "2-3", title: "Numbers 1-10", description: "Learn to sign numbers from 1 to 10", module_id: 2, category: "numbers", difficulty: Difficulty::Beginner, duration_minutes: 15, xp_reward: 100, locked: false },
    LessonSeed { id: "3-1", title: "How are you?", description: "Learn to ask 'How are you?' in JSL", module_id: 3, category: "phrases", difficulty: Difficulty::Intermediate, duration_minutes: 12, xp_reward: 90, locked: true },
    LessonSeed { id: "3-2", title: "What is your name?", description: "Learn to ask for someone's name", module_id: 3, category: "phrases", difficulty: Difficulty::Intermediate, duration_minutes: 10, xp_reward: 80, locked: true },
    LessonSeed { id: "4-1", title: "Happy & Sad", description: "Learn to express emotions", module_id: 4, category: "emotions", difficulty: Difficulty::Intermediate, duration_minutes: 14, xp_reward: 100, locked: true },
    LessonSeed { id: "4-2", title: "Tired & Excited", description: "Learn more emotion signs", module_id: 4, category: "emotions", difficulty: Difficulty::Intermediate, duration_minutes: 12, xp_reward: 90, locked: true },
    LessonSeed { id: "5-1", title: "Stop, Go, Wait", description: "Learn directional commands", module_id: 5, category: "commands", difficulty: Difficulty::Intermediate, duration_minutes: 15, xp_reward: 110, locked: true },
    LessonSeed { id: "5-2", title: "Help & Come", description: "Learn helpful action signs", module_id: 5, category: "commands", difficulty: Difficulty::Intermediate, duration_minutes: 13, xp_reward: 100, locked: true },
    LessonSeed { id: "6-1", title: "Agreement & Understanding", description: "Learn to express agreement and comprehension", module_id: 6, category: "advanced", difficulty: Difficulty::Advanced, duration_minutes: 16, xp_reward: 120, locked: true },
    LessonSeed { id: "6-2", title: "Disagreement & Confusion", description: "Learn to express disagreement and confusion", module_id: 6, category: "advanced", difficulty: Difficulty::Advanced, duration_minutes: 14, xp_reward: 110, locked: true },
];

fn lesson_signs(lesson_id: &str) -> Vec<Sign> {
    match lesson_id {
        "1-1" => signs(),
        "1-2" => vec![
            sign("please", "Please", "jsl-please-sign.jpg", "Polite request gesture"),
            sign("excuse-me", "Excuse Me", "abstract-hand-gesture-pattern.jpg", "Polite attention-getting gesture"),
        ],
        "1-3" => vec![sign("goodbye", "Goodbye", "abstract-hand-gesture-pattern.jpg", "Farewell gesture")],
        "1-4" => vec![sign("welcome", "Welcome", "abstract-hand-gesture-pattern.jpg", "Welcoming gesture")],
        _ => Vec::new(),
    }
}

pub fn lessons() -> Vec<Lesson> {
    LESSONS
        .iter()
        .map(|seed| Lesson {
            id: seed.id.into(),
            title: seed.title.into(),
            description: seed.description.into(),
            module_id: seed.module_id,
            category: seed.category.into(),
            difficulty: seed.difficulty,
            duration_minutes: seed.duration_minutes,
            signs: lesson_signs(seed.id),
            completed: false,
            locked: seed.locked,
            xp_reward: seed.xp_reward,
        })
        .collect()
}

/// Starting progress shown before the learner has synced anything.
pub fn default_progress(user_id: &str) -> UserProgress {
    UserProgress {
        level: 3,
        xp: 450,
        xp_to_next_level: 550,
        streak: 5,
        last_active_date: Some(Utc::now().date_naive()),
        stats: ProgressStats {
            total_signs_learned: 12,
            total_practice_time: 120,
            quizzes_passed: 2,
            perfect_scores: 1,
        },
        ..UserProgress::new(user_id)
    }
}

pub fn practice_signs() -> Vec<PracticeSign> {
    [
        ("1", "Hello", "Wave your hand forward from your forehead"),
        ("2", "Thank You", "Touch your chin and move hand forward"),
        ("3", "Please", "Move your open hand in a small circle on your chest"),
        ("4", "Yes", "Nod your fist up and down"),
        ("5", "No", "Tap index and middle finger to thumb twice"),
    ]
    .into_iter()
    .map(|(id, sign, description)| PracticeSign {
        id: id.into(),
        sign: sign.into(),
        description: description.into(),
    })
    .collect()
}
