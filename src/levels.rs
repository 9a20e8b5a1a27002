use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::path::Path;

use crate::error::LevelError;

static TEXT_DIR: Dir = include_dir!("src/texts");

/// Static description of a built-in level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelInfo {
    pub id: u32,
    pub name: &'static str,
    pub target_wpm: f64,
    pub files: &'static [&'static str],
    pub description: &'static str,
}

pub const LEVELS: &[LevelInfo] = &[
    LevelInfo {
        id: 1,
        name: "Business - Beginner",
        target_wpm: 50.0,
        files: &[
            "level1_business_1.txt",
            "level1_business_2.txt",
            "level1_business_3.txt",
            "level1_business_4.txt",
            "level1_business_5.txt",
        ],
        description: "Professional emails and documents",
    },
    LevelInfo {
        id: 2,
        name: "Business - Advanced",
        target_wpm: 80.0,
        files: &[
            "level2_business_1.txt",
            "level2_business_2.txt",
            "level2_business_3.txt",
            "level2_business_4.txt",
            "level2_business_5.txt",
        ],
        description: "Fast-paced business communication",
    },
    LevelInfo {
        id: 3,
        name: "Code - Beginner",
        target_wpm: 20.0,
        files: &[
            "level3_code_1.py",
            "level3_code_2.py",
            "level3_code_3.py",
            "level3_code_4.py",
            "level3_code_5.py",
        ],
        description: "Python basics with special characters",
    },
    LevelInfo {
        id: 4,
        name: "Code - Advanced",
        target_wpm: 50.0,
        files: &[
            "level4_code_1.py",
            "level4_code_2.py",
            "level4_code_3.py",
            "level4_code_4.py",
            "level4_code_5.py",
        ],
        description: "Complex code with symbols",
    },
    LevelInfo {
        id: 5,
        name: "Mixed - Master",
        target_wpm: 40.0,
        files: &[
            "level5_mixed_1.md",
            "level5_mixed_2.md",
            "level5_mixed_3.md",
            "level5_mixed_4.md",
            "level5_mixed_5.md",
        ],
        description: "Markdown with inline code blocks",
    },
];

/// Validated practice material handed to a new session.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelContent {
    /// `None` for user-supplied files
    pub level_id: Option<u32>,
    pub title: String,
    pub text: String,
    pub target_wpm: f64,
}

impl LevelContent {
    /// Loads a user-supplied practice file.
    pub fn from_file<P: AsRef<Path>>(path: P, target_wpm: f64) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let text = normalize(&raw);
        if text.is_empty() {
            return Err(LevelError::EmptyContent(path.display().to_string()));
        }

        let title = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            level_id: None,
            title,
            text,
            target_wpm,
        })
    }
}

/// Windows line endings become `\n` and trailing newlines are dropped, so the
/// final keystroke of a level is never an invisible Enter.
fn normalize(raw: &str) -> String {
    raw.replace("\r\n", "\n").trim_end_matches('\n').to_string()
}

/// Read-only lookup over [`LEVELS`] and their embedded texts.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelRegistry;

impl LevelRegistry {
    pub fn all(&self) -> &'static [LevelInfo] {
        LEVELS
    }

    pub fn info(&self, level_id: u32) -> Option<&'static LevelInfo> {
        LEVELS.iter().find(|l| l.id == level_id)
    }

    /// Loads one of the level's texts, chosen at random.
    pub fn load(&self, level_id: u32) -> Result<LevelContent, LevelError> {
        self.load_with(level_id, &mut rand::thread_rng())
    }

    pub fn load_with<R: Rng + ?Sized>(
        &self,
        level_id: u32,
        rng: &mut R,
    ) -> Result<LevelContent, LevelError> {
        let info = self
            .info(level_id)
            .ok_or(LevelError::UnknownLevel(level_id))?;
        let file = info
            .files
            .choose(rng)
            .ok_or_else(|| LevelError::MissingContent {
                level: level_id,
                file: String::from("<none>"),
            })?;

        self.load_file(level_id, file)
    }

    pub fn load_file(&self, level_id: u32, file: &str) -> Result<LevelContent, LevelError> {
        let info = self
            .info(level_id)
            .ok_or(LevelError::UnknownLevel(level_id))?;

        let contents = TEXT_DIR
            .get_file(file)
            .ok_or_else(|| LevelError::MissingContent {
                level: level_id,
                file: file.to_string(),
            })?
            .contents_utf8()
            .ok_or_else(|| LevelError::InvalidEncoding {
                file: file.to_string(),
            })?;

        let text = normalize(contents);
        if text.is_empty() {
            return Err(LevelError::EmptyContent(file.to_string()));
        }

        log::info!("loaded level {} from {}", level_id, file);
        Ok(LevelContent {
            level_id: Some(level_id),
            title: info.name.to_string(),
            text,
            target_wpm: info.target_wpm,
        })
    }

    /// Following level id, wrapping to the first
    pub fn next_id(&self, level_id: u32) -> u32 {
        let idx = LEVELS.iter().position(|l| l.id == level_id).unwrap_or(0);
        LEVELS[(idx + 1) % LEVELS.len()].id
    }

    /// Preceding level id, wrapping to the last
    pub fn prev_id(&self, level_id: u32) -> u32 {
        let idx = LEVELS.iter().position(|l| l.id == level_id).unwrap_or(0);
        LEVELS[(idx + LEVELS.len() - 1) % LEVELS.len()].id
    }
}
