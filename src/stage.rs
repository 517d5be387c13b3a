//! Word-list providers and stage configuration
//!
//! A `WordSource` turns a stage number into a word pool plus the cadence and
//! concurrency cap for that stage. The built-in catalog covers stages 1-20;
//! `JsonWordSource` reads the same shape the web API served.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::LoadError;

/// Per-stage round configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    pub stage: u32,
    /// Spawn cadence (ms)
    pub spawn_interval_ms: u64,
    /// Maximum simultaneously falling words
    pub max_concurrent: u32,
    /// Fall duration at stage 0 (ms)
    pub lifetime_base_ms: u64,
    /// Extra fall duration per stage (ms)
    pub lifetime_step_ms: u64,
    /// Words spawned per round
    pub target_words: u32,
}

impl StageConfig {
    /// Default configuration for a stage of the built-in catalog
    pub fn for_stage(stage: u32) -> Self {
        let level = stage.saturating_sub(1);
        Self {
            stage,
            spawn_interval_ms: 3000u64.saturating_sub(level as u64 * 100).max(1000),
            max_concurrent: (3 + level / 3).min(8),
            lifetime_base_ms: LIFETIME_BASE_MS,
            lifetime_step_ms: LIFETIME_STEP_MS,
            target_words: TARGET_WORD_COUNT,
        }
    }

    /// Time budget of a word spawned in this stage
    pub fn lifetime_ms(&self) -> u64 {
        self.lifetime_base_ms
            .saturating_add((self.stage as u64).saturating_mul(self.lifetime_step_ms))
    }
}

/// Word pool and configuration for one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageData {
    pub words: Vec<String>,
    pub config: StageConfig,
}

/// Supplies word lists for stages
pub trait WordSource {
    fn load(&self, stage: u32) -> Result<StageData, LoadError>;
}

const HOME_ROW: &[&str] = &[
    "ask", "dad", "sad", "lad", "add", "all", "fall", "hall", "glad", "flask", "salad", "alas",
    "jag", "gas", "lass", "shall", "flag", "half",
];

const BASIC_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "can", "had", "her", "was", "one", "our",
    "day", "get", "use", "man", "new", "now", "old", "see", "way", "may", "say", "each",
    "which", "she", "how", "its", "who", "oil", "try",
];

const COMMON_WORDS: &[&str] = &[
    "time", "work", "well", "good", "make", "will", "come", "could", "like", "what", "know",
    "take", "year", "look", "want", "give", "think", "most", "over", "other", "back", "after",
    "just", "where", "much", "find", "right",
];

const SENTENCE_WORDS: &[&str] = &[
    "quick", "brown", "jumps", "lazy", "sample", "sentence", "typing", "practice", "learning",
    "faster", "requires", "consistent", "patience", "regular", "exercises", "improve", "speed",
    "accuracy", "people",
];

const ADVANCED_WORDS: &[&str] = &[
    "digital", "ability", "quickly", "accurately", "increasingly", "important", "whether",
    "writing", "emails", "creating", "documents", "coding", "software", "significantly",
    "productivity", "efficiency", "function", "calculate", "result", "console",
];

/// The built-in 20-stage catalog
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinWords;

impl BuiltinWords {
    fn pool(stage: u32) -> &'static [&'static str] {
        match stage {
            1..=4 => HOME_ROW,
            5..=8 => BASIC_WORDS,
            9..=12 => COMMON_WORDS,
            13..=16 => SENTENCE_WORDS,
            _ => ADVANCED_WORDS,
        }
    }
}

impl WordSource for BuiltinWords {
    fn load(&self, stage: u32) -> Result<StageData, LoadError> {
        if stage == 0 || stage > MAX_STAGE {
            return Err(LoadError::UnknownStage(stage));
        }
        Ok(StageData {
            words: Self::pool(stage).iter().map(|w| w.to_string()).collect(),
            config: StageConfig::for_stage(stage),
        })
    }
}

/// On-disk stage file, `{ "words": [...], "config": { "speed": ms, "wordCount": n } }`
#[derive(Debug, Deserialize)]
struct StageFile {
    words: Vec<String>,
    #[serde(default)]
    config: StageFileConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StageFileConfig {
    speed: Option<u64>,
    word_count: Option<u32>,
    target_words: Option<u32>,
}

/// Reads `stage_<n>.json` files from a directory
#[derive(Debug, Clone)]
pub struct JsonWordSource {
    dir: PathBuf,
}

impl JsonWordSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, stage: u32) -> PathBuf {
        self.dir.join(format!("stage_{stage}.json"))
    }
}

impl WordSource for JsonWordSource {
    fn load(&self, stage: u32) -> Result<StageData, LoadError> {
        let path = self.path_for(stage);
        let json = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LoadError::UnknownStage(stage)
            } else {
                LoadError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        let file: StageFile =
            serde_json::from_str(&json).map_err(|source| LoadError::Parse { path, source })?;

        let words: Vec<String> = file
            .words
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return Err(LoadError::EmptyWordList(stage));
        }

        // Anything the file leaves out comes from the built-in formula
        let mut config = StageConfig::for_stage(stage);
        if let Some(speed) = file.config.speed {
            config.spawn_interval_ms = speed.max(1);
        }
        if let Some(count) = file.config.word_count {
            config.max_concurrent = count.max(1);
        }
        if let Some(target) = file.config.target_words {
            config.target_words = target;
        }

        log::debug!("Loaded {} words for stage {}", words.len(), stage);
        Ok(StageData { words, config })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifetime_grows_with_stage() {
        let one = StageConfig::for_stage(1);
        let ten = StageConfig::for_stage(10);
        assert_eq!(one.lifetime_ms(), 8200);
        assert_eq!(ten.lifetime_ms(), 10_000);
        assert!(ten.lifetime_ms() >= one.lifetime_ms());
    }

    #[test]
    fn test_lifetime_saturates() {
        let config = StageConfig {
            lifetime_base_ms: u64::MAX - 10,
            lifetime_step_ms: u64::MAX,
            ..StageConfig::for_stage(20)
        };
        assert_eq!(config.lifetime_ms(), u64::MAX);
    }

    #[test]
    fn test_stage_cadence_and_cap() {
        let one = StageConfig::for_stage(1);
        assert_eq!(one.spawn_interval_ms, 3000);
        assert_eq!(one.max_concurrent, 3);

        let last = StageConfig::for_stage(20);
        assert_eq!(last.spawn_interval_ms, 1100);
        assert_eq!(last.max_concurrent, 8);
        assert_eq!(last.target_words, 20);
    }

    #[test]
    fn test_builtin_bounds() {
        assert!(matches!(BuiltinWords.load(0), Err(LoadError::UnknownStage(0))));
        assert!(matches!(BuiltinWords.load(21), Err(LoadError::UnknownStage(21))));
        for stage in 1..=MAX_STAGE {
            let data = BuiltinWords.load(stage).unwrap();
            assert!(!data.words.is_empty());
            assert_eq!(data.config.stage, stage);
        }
    }

    #[test]
    fn test_json_source_reads_api_shape() {
        let dir = std::env::temp_dir().join(format!("sea_typer_words_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("stage_3.json"),
            r#"{ "words": ["Ocean", " wave ", ""], "config": { "speed": 1500, "wordCount": 4 } }"#,
        )
        .unwrap();
        fs::write(dir.join("stage_4.json"), r#"{ "words": [] }"#).unwrap();
        fs::write(dir.join("stage_5.json"), "not json").unwrap();

        let source = JsonWordSource::new(&dir);
        let data = source.load(3).unwrap();
        assert_eq!(data.words, vec!["Ocean".to_string(), "wave".to_string()]);
        assert_eq!(data.config.spawn_interval_ms, 1500);
        assert_eq!(data.config.max_concurrent, 4);
        assert_eq!(data.config.lifetime_ms(), 8600);

        assert!(matches!(source.load(4), Err(LoadError::EmptyWordList(4))));
        assert!(matches!(source.load(5), Err(LoadError::Parse { .. })));
        assert!(matches!(source.load(6), Err(LoadError::UnknownStage(6))));

        let _ = fs::remove_dir_all(&dir);
    }
}
