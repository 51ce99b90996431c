//! Hot-reloadable set of words suppressed from keyword output

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use shared::component_warn;
use shared::logging::{log_success, Component};

use crate::error::{AnalyticsError, AnalyticsResult};

/// Word list bundled with the crate
pub const DEFAULT_EXCLUSION_WORDS: &str = include_str!("../../data/exclusion_words.txt");

/// Immutable snapshot of excluded words, lowercased
pub type ExclusionSet = HashSet<String>;

/// Parse a word list: whitespace or comma separated, `#` starts a comment line
pub fn parse_exclusion_words(text: &str) -> ExclusionSet {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split(|c: char| c.is_whitespace() || c == ','))
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Exclusion set published behind a single pointer swap
pub struct ExclusionList {
    current: RwLock<Arc<ExclusionSet>>,
    source: Option<PathBuf>,
}

impl ExclusionList {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = words.into_iter().map(|w| w.as_ref().to_lowercase()).collect();
        Self {
            current: RwLock::new(Arc::new(set)),
            source: None,
        }
    }

    /// The bundled default list
    pub fn builtin() -> Self {
        Self {
            current: RwLock::new(Arc::new(parse_exclusion_words(DEFAULT_EXCLUSION_WORDS))),
            source: None,
        }
    }

    /// Load from `path`; later `reload` calls re-read the same file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> AnalyticsResult<Self> {
        let path = path.as_ref().to_path_buf();
        let set = read_words(&path).await?;
        Ok(Self {
            current: RwLock::new(Arc::new(set)),
            source: Some(path),
        })
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Current snapshot; holders keep it alive across a concurrent reload
    pub fn snapshot(&self) -> Arc<ExclusionSet> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.snapshot().contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Publish a new set
    pub fn replace(&self, words: ExclusionSet) {
        let next = Arc::new(words);
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = next;
    }

    /// Re-read the configured source file; on failure the previous set stays active
    pub async fn reload(&self) -> AnalyticsResult<usize> {
        let path = self.source.as_deref().ok_or(AnalyticsError::NoExclusionSource)?;
        self.reload_from(path).await
    }

    /// Load `path` and publish it; on failure the previous set stays active
    pub async fn reload_from(&self, path: &Path) -> AnalyticsResult<usize> {
        match read_words(path).await {
            Ok(words) => {
                let count = words.len();
                self.replace(words);
                log_success(
                    Component::Analytics,
                    &format!("Reloaded {} exclusion words from {}", count, path.display()),
                );
                Ok(count)
            }
            Err(e) => {
                component_warn!(
                    Component::Analytics,
                    "⚠️ Exclusion reload failed, keeping {} current words: {}",
                    self.len(),
                    e
                );
                Err(e)
            }
        }
    }
}

impl Default for ExclusionList {
    fn default() -> Self {
        Self::builtin()
    }
}

async fn read_words(path: &Path) -> AnalyticsResult<ExclusionSet> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AnalyticsError::ExclusionLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(parse_exclusion_words(&text))
}
