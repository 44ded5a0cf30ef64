use super::similarity::{normalize, sequence_ratio};
use super::{KnowledgeEntry, KnowledgeStore};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_KEYWORDS: [&str; 13] = [
    "eva",
    "cam",
    "phil",
    "eligibility",
    "claims",
    "payment",
    "verification",
    "processing",
    "posting",
    "payment posting",
    "agents",
    "benefits",
    "thoughtful",
];

/// Keyword mentions beyond this many stay in every query variant.
const MAX_REMOVABLE_MENTIONS: usize = 10;

/// Tuning knobs for matching a question against the store.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Minimum adjusted score for a stored answer to be returned directly.
    pub threshold: f64,
    /// Minimum score for an entry to be offered as fallback context.
    pub context_threshold: f64,
    pub context_limit: usize,
    /// Added once per keyword present in both texts.
    pub keyword_boost: f64,
    pub max_keyword_boost: f64,
    /// Lowercase keywords; multi-word keywords match as a run of whole words.
    pub keywords: Vec<String>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.4,
            context_threshold: 0.3,
            context_limit: 3,
            keyword_boost: 0.15,
            max_keyword_boost: 1.0,
            keywords: DEFAULT_KEYWORDS.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredEntry<'a> {
    pub index: usize,
    pub entry: &'a KnowledgeEntry,
    /// Best ratio against the question over the query with any subset of its
    /// shared keyword mentions dropped.
    pub similarity: f64,
    pub boost: f64,
    /// `similarity + boost`, capped at 1.0.
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchResult<'a> {
    Matched {
        index: usize,
        answer: &'a str,
        score: f64,
    },
    NoMatch {
        best_score: f64,
        /// Highest scoring entry even though it missed the threshold; `None`
        /// only when the store is empty.
        best: Option<ScoredEntry<'a>>,
    },
}

impl MatchResult<'_> {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    pub fn score(&self) -> f64 {
        match self {
            Self::Matched { score, .. } => *score,
            Self::NoMatch { best_score, .. } => *best_score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    InvalidInput,
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "question is empty"),
        }
    }
}

impl Error for ResolveError {}

/// Picks the stored answer whose question best matches `query`.
///
/// Ties keep the entry that comes first in the store. An empty or
/// whitespace-only query is rejected before any scoring happens.
pub fn resolve<'a>(
    query: &str,
    store: &'a KnowledgeStore,
    config: &MatchConfig,
) -> Result<MatchResult<'a>, ResolveError> {
    let query = PreparedQuery::new(query)?;

    let mut best: Option<ScoredEntry<'a>> = None;
    for (index, entry) in store.entries().iter().enumerate() {
        let scored = query.score(index, entry, config);
        if best.is_none_or(|current| scored.score > current.score) {
            best = Some(scored);
        }
    }

    Ok(match best {
        Some(best) if best.score >= config.threshold => MatchResult::Matched {
            index: best.index,
            answer: &best.entry.answer,
            score: best.score,
        },
        best => MatchResult::NoMatch {
            best_score: best.map_or(0.0, |entry| entry.score),
            best,
        },
    })
}

/// Every entry scored against `query`, best first. Equal scores keep store
/// order.
pub fn rank<'a>(
    query: &str,
    store: &'a KnowledgeStore,
    config: &MatchConfig,
) -> Result<Vec<ScoredEntry<'a>>, ResolveError> {
    let query = PreparedQuery::new(query)?;

    let mut ranked = store
        .entries()
        .iter()
        .enumerate()
        .map(|(index, entry)| query.score(index, entry, config))
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(ranked)
}

/// Bonus earned by keywords that occur in both texts, capped at
/// `max_keyword_boost`.
pub fn keyword_boost(query: &str, question: &str, config: &MatchConfig) -> f64 {
    let query_words = words(&normalize(query));
    let question_words = words(&normalize(question));
    boost_for(&query_words, &question_words, config)
}

struct PreparedQuery {
    segments: Vec<Segment>,
    words: Vec<String>,
    /// Index into `segments` of each entry of `words`.
    word_positions: Vec<usize>,
}

/// A maximal run of either word characters or separators.
struct Segment {
    text: String,
    is_word: bool,
}

impl PreparedQuery {
    fn new(query: &str) -> Result<Self, ResolveError> {
        let text = normalize(query);
        if text.is_empty() {
            return Err(ResolveError::InvalidInput);
        }

        let mut segments: Vec<Segment> = Vec::new();
        for ch in text.chars() {
            let is_word = ch.is_alphanumeric();
            match segments.last_mut() {
                Some(last) if last.is_word == is_word => last.text.push(ch),
                _ => segments.push(Segment {
                    text: ch.to_string(),
                    is_word,
                }),
            }
        }

        let (word_positions, words): (Vec<usize>, Vec<String>) = segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| segment.is_word)
            .map(|(position, segment)| (position, segment.text.clone()))
            .unzip();

        Ok(Self {
            segments,
            words,
            word_positions,
        })
    }

    fn score<'a>(
        &self,
        index: usize,
        entry: &'a KnowledgeEntry,
        config: &MatchConfig,
    ) -> ScoredEntry<'a> {
        let question = normalize(&entry.question);
        let question_words = words(&question);
        let similarity = self.similarity(&question, &question_words, config);
        let boost = boost_for(&self.words, &question_words, config);

        ScoredEntry {
            index,
            entry,
            similarity,
            boost,
            score: (similarity + boost).min(1.0),
        }
    }

    /// Never drops when a shared keyword is added to the query: the shorter
    /// query stays reachable by removing the new mention.
    fn similarity(
        &self,
        question: &str,
        question_words: &[String],
        config: &MatchConfig,
    ) -> f64 {
        let mentions = self.shared_mentions(question_words, config);
        let mut seen = HashSet::new();
        let mut best = 0.0_f64;

        for mask in 0..1_usize << mentions.len() {
            let removed = mentions
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .flat_map(|(_, positions)| positions.iter().copied())
                .collect::<HashSet<_>>();
            let variant = self.text_without(&removed);
            if variant.is_empty() || !seen.insert(variant.clone()) {
                continue;
            }
            best = best.max(sequence_ratio(&variant, question));
        }

        best
    }

    /// Segment positions of each keyword mention that the question shares.
    fn shared_mentions(
        &self,
        question_words: &[String],
        config: &MatchConfig,
    ) -> Vec<Vec<usize>> {
        let mut mentions = Vec::new();
        for keyword in &config.keywords {
            let keyword_words = words(keyword);
            if !contains_run(question_words, &keyword_words) {
                continue;
            }

            let len = keyword_words.len();
            for (start, window) in self.words.windows(len).enumerate() {
                if window == keyword_words.as_slice() {
                    mentions.push(self.word_positions[start..start + len].to_vec());
                }
            }
        }

        mentions.truncate(MAX_REMOVABLE_MENTIONS);
        mentions
    }

    fn text_without(&self, removed: &HashSet<usize>) -> String {
        let kept = self
            .segments
            .iter()
            .enumerate()
            .filter(|(position, _)| !removed.contains(position))
            .map(|(_, segment)| segment.text.as_str())
            .collect::<String>();

        kept.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

fn boost_for(query_words: &[String], question_words: &[String], config: &MatchConfig) -> f64 {
    let shared = config
        .keywords
        .iter()
        .filter(|keyword| {
            let keyword_words = words(keyword);
            contains_run(query_words, &keyword_words)
                && contains_run(question_words, &keyword_words)
        })
        .count();

    (shared as f64 * config.keyword_boost).min(config.max_keyword_boost)
}

fn words(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_run(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}
