use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Beginner
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sign {
    pub id: String,
    pub word: String,
    pub category: String,
    #[serde(default, alias = "video_url")]
    pub video_url: String,
    #[serde(default, alias = "thumbnail_url")]
    pub thumbnail_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "module_id")]
    pub module_id: u32,
    pub category: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default, alias = "duration")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub signs: Vec<Sign>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, alias = "xp_reward")]
    pub xp_reward: u32,
}
