mod resolver;
pub mod similarity;

pub use resolver::{
    DEFAULT_KEYWORDS, MatchConfig, MatchResult, ResolveError, ScoredEntry, keyword_boost, rank,
    resolve,
};

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One curated question/answer pair. Its identity is its position in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeEntry {
    pub question: String,
    pub answer: String,
}

impl KnowledgeEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Ordered, read-only set of entries loaded once per process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeStore {
    entries: Vec<KnowledgeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedKnowledge {
    pub store: KnowledgeStore,
    /// Items dropped because a field was missing or blank.
    pub skipped: usize,
}

#[derive(Debug)]
pub enum KnowledgeError {
    NotFound(PathBuf),
    Read { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, message: String },
    MissingQuestions(PathBuf),
}

impl Display for KnowledgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "knowledge file {} not found", path.display()),
            Self::Read { path, source } => {
                write!(f, "unable to read knowledge file {}: {source}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "invalid JSON in knowledge file {}: {message}", path.display())
            }
            Self::MissingQuestions(path) => write!(
                f,
                "knowledge file {} has no 'questions' list",
                path.display()
            ),
        }
    }
}

impl Error for KnowledgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawKnowledgeFile {
    questions: Option<Vec<RawEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    question: Option<String>,
    answer: Option<String>,
}

impl KnowledgeStore {
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<LoadedKnowledge, KnowledgeError> {
        let text = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                KnowledgeError::NotFound(path.to_path_buf())
            } else {
                KnowledgeError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<LoadedKnowledge, KnowledgeError> {
        let raw: RawKnowledgeFile =
            serde_json::from_str(text).map_err(|err| KnowledgeError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        let items = raw
            .questions
            .ok_or_else(|| KnowledgeError::MissingQuestions(path.to_path_buf()))?;

        let total = items.len();
        let entries = items
            .into_iter()
            .filter_map(|item| {
                let question = item.question.filter(|q| !q.trim().is_empty())?;
                let answer = item.answer.filter(|a| !a.trim().is_empty())?;
                Some(KnowledgeEntry { question, answer })
            })
            .collect::<Vec<_>>();

        Ok(LoadedKnowledge {
            skipped: total - entries.len(),
            store: Self { entries },
        })
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&KnowledgeEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
