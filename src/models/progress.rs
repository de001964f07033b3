use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Lesson, QuizResult};

/// XP needed to clear one level once the current span is used up.
pub const LEVEL_XP_SPAN: u64 = 1000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BadgeRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub unlocked_at: DateTime<Utc>,
    pub rarity: BadgeRarity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub total_signs_learned: u32,
    /// Minutes.
    pub total_practice_time: u32,
    pub quizzes_passed: u32,
    pub perfect_scores: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleStatus {
    Completed,
    InProgress,
    Locked,
}

/// Per-module roll-up shown on the learning path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleProgress {
    pub module_id: u32,
    pub completed_lessons: u32,
    pub total_lessons: u32,
    pub points: u64,
    pub status: ModuleStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: String,
    pub level: u32,
    pub xp: u64,
    pub xp_to_next_level: u64,
    pub streak: u32,
    pub last_active_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed_lessons: Vec<String>,
    #[serde(default)]
    pub completed_modules: Vec<u32>,
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default)]
    pub stats: ProgressStats,
}

impl UserProgress {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            level: 1,
            xp: 0,
            xp_to_next_level: LEVEL_XP_SPAN,
            streak: 0,
            last_active_date: None,
            completed_lessons: Vec::new(),
            completed_modules: Vec::new(),
            badges: Vec::new(),
            stats: ProgressStats::default(),
        }
    }

    /// Adds XP and rolls any overflow into new levels. Returns levels gained.
    pub fn add_xp(&mut self, amount: u64) -> u32 {
        self.xp = self.xp.saturating_add(amount);

        let mut remaining = amount;
        let mut gained = 0;
        while remaining >= self.xp_to_next_level {
            remaining -= self.xp_to_next_level;
            self.level += 1;
            self.xp_to_next_level = LEVEL_XP_SPAN;
            gained += 1;
        }
        self.xp_to_next_level -= remaining;
        gained
    }

    /// Returns false if the lesson was already recorded.
    pub fn complete_lesson(&mut self, lesson_id: &str) -> bool {
        if self.completed_lessons.iter().any(|id| id == lesson_id) {
            return false;
        }
        self.completed_lessons.push(lesson_id.to_string());
        true
    }

    /// Returns false if the module was already complete.
    pub fn complete_module(&mut self, module_id: u32) -> bool {
        if self.completed_modules.contains(&module_id) {
            return false;
        }
        self.completed_modules.push(module_id);
        true
    }

    /// Completes `module_id` once every lesson in it is done. Returns true on
    /// the edge only.
    pub fn complete_module_if_finished(&mut self, module_id: u32, module_lessons: &[Lesson]) -> bool {
        let finished = !module_lessons.is_empty()
            && module_lessons
                .iter()
                .all(|lesson| self.completed_lessons.contains(&lesson.id));
        finished && self.complete_module(module_id)
    }

    /// The first module is always open; every other one opens when the
    /// module before it is complete.
    pub fn module_status(&self, module_id: u32) -> ModuleStatus {
        if self.completed_modules.contains(&module_id) {
            ModuleStatus::Completed
        } else if module_id <= 1 || self.completed_modules.contains(&(module_id - 1)) {
            ModuleStatus::InProgress
        } else {
            ModuleStatus::Locked
        }
    }

    /// Roll-up for every module that has at least one lesson, ordered by id.
    pub fn module_progress(&self, lessons: &[Lesson]) -> Vec<ModuleProgress> {
        let mut module_ids: Vec<u32> = lessons.iter().map(|lesson| lesson.module_id).collect();
        module_ids.sort_unstable();
        module_ids.dedup();

        module_ids
            .into_iter()
            .map(|module_id| {
                let in_module = lessons.iter().filter(|lesson| lesson.module_id == module_id);
                let (mut completed, mut total, mut points) = (0, 0, 0);
                for lesson in in_module {
                    total += 1;
                    if self.completed_lessons.contains(&lesson.id) {
                        completed += 1;
                        points += u64::from(lesson.xp_reward);
                    }
                }
                ModuleProgress {
                    module_id,
                    completed_lessons: completed,
                    total_lessons: total,
                    points,
                    status: self.module_status(module_id),
                }
            })
            .collect()
    }

    /// Credits a graded quiz. A pass also completes its module. Returns levels gained.
    pub fn record_quiz(&mut self, result: &QuizResult) -> u32 {
        if result.passed {
            self.stats.quizzes_passed += 1;
            self.complete_module(result.module_id);
        }
        if result.perfect {
            self.stats.perfect_scores += 1;
        }
        self.add_xp(result.xp_earned)
    }

    pub fn touch_streak(&mut self, today: NaiveDate) {
        match self.last_active_date {
            Some(last) if last == today => return,
            Some(last) if last.succ_opt() == Some(today) => self.streak += 1,
            _ => self.streak = 1,
        }
        self.last_active_date = Some(today);
    }

    pub fn record_sign_learned(&mut self) {
        self.stats.total_signs_learned += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xp_rolls_into_next_level() {
        let mut progress = UserProgress::new("guest");
        progress.xp = 450;
        progress.level = 3;
        progress.xp_to_next_level = 550;

        assert_eq!(progress.add_xp(50), 0);
        assert_eq!(progress.xp_to_next_level, 500);

        assert_eq!(progress.add_xp(600), 1);
        assert_eq!(progress.level, 4);
        assert_eq!(progress.xp, 1100);
        assert_eq!(progress.xp_to_next_level, LEVEL_XP_SPAN - 100);
    }

    #[test]
    fn exact_threshold_levels_up() {
        let mut progress = UserProgress::new("guest");
        assert_eq!(progress.add_xp(LEVEL_XP_SPAN * 2), 2);
        assert_eq!(progress.level, 3);
        assert_eq!(progress.xp_to_next_level, LEVEL_XP_SPAN);
    }

    #[test]
    fn lessons_are_recorded_once() {
        let mut progress = UserProgress::new("guest");
        assert!(progress.complete_lesson("1-1"));
        assert!(!progress.complete_lesson("1-1"));
        assert_eq!(progress.completed_lessons, vec!["1-1".to_string()]);
    }

    fn lesson(id: &str, module_id: u32, xp_reward: u32) -> Lesson {
        Lesson {
            id: id.into(),
            title: id.into(),
            description: String::new(),
            module_id,
            category: "basics".into(),
            difficulty: Default::default(),
            duration_minutes: 10,
            signs: Vec::new(),
            completed: false,
            locked: false,
            xp_reward,
        }
    }

    #[test]
    fn finishing_a_module_unlocks_the_next() {
        let lessons = vec![lesson("1-1", 1, 100), lesson("1-2", 1, 80), lesson("2-1", 2, 120)];
        let module_one: Vec<Lesson> = lessons[..2].to_vec();
        let mut progress = UserProgress::new("guest");

        assert_eq!(progress.module_status(1), ModuleStatus::InProgress);
        assert_eq!(progress.module_status(2), ModuleStatus::Locked);

        progress.complete_lesson("1-1");
        assert!(!progress.complete_module_if_finished(1, &module_one));
        assert_eq!(progress.module_status(2), ModuleStatus::Locked);

        progress.complete_lesson("1-2");
        assert!(progress.complete_module_if_finished(1, &module_one));
        assert!(!progress.complete_module_if_finished(1, &module_one));
        assert_eq!(progress.module_status(1), ModuleStatus::Completed);
        assert_eq!(progress.module_status(2), ModuleStatus::InProgress);
        assert_eq!(progress.module_status(3), ModuleStatus::Locked);

        let modules = progress.module_progress(&lessons);
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].completed_lessons, 2);
        assert_eq!(modules[0].total_lessons, 2);
        assert_eq!(modules[0].points, 180);
        assert_eq!(modules[1].status, ModuleStatus::InProgress);
        assert_eq!(modules[1].points, 0);
    }

    #[test]
    fn quiz_results_feed_stats_and_unlocks() {
        let mut progress = UserProgress::new("guest");

        progress.record_quiz(&QuizResult::grade(1, 3, 5));
        assert_eq!(progress.stats.quizzes_passed, 0);
        assert_eq!(progress.xp, 150);
        assert_eq!(progress.module_status(2), ModuleStatus::Locked);

        progress.record_quiz(&QuizResult::grade(1, 5, 5));
        assert_eq!(progress.stats.quizzes_passed, 1);
        assert_eq!(progress.stats.perfect_scores, 1);
        assert_eq!(progress.xp, 400);
        assert_eq!(progress.module_status(1), ModuleStatus::Completed);
        assert_eq!(progress.module_status(2), ModuleStatus::InProgress);
    }

    #[test]
    fn module_status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ModuleStatus::InProgress).unwrap(),
            r#""in-progress""#
        );
    }

    #[test]
    fn streak_follows_consecutive_days() {
        let mut progress = UserProgress::new("guest");
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        progress.touch_streak(day);
        assert_eq!(progress.streak, 1);
        progress.touch_streak(day);
        assert_eq!(progress.streak, 1);
        progress.touch_streak(day.succ_opt().unwrap());
        assert_eq!(progress.streak, 2);
        progress.touch_streak(NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert_eq!(progress.streak, 1);
    }
}
