//! Boolean term matching for song paths and tag membership.
//!
//! A query is a list of terms. Each term is an AND of sections (split on
//! `#`), each section an OR of words (split on `,`). A leading `!` turns
//! the term into an exclusion that vetoes any candidate it matches.
//!
//! ```text
//! rock#live,acoustic   ->  "rock" AND ("live" OR "acoustic")
//! !demo                ->  reject anything containing "demo"
//! ```
//!
//! Path terms are compared case-insensitively against the song path
//! relative to the music root. Tag terms keep their case and are matched
//! against tag names; the candidate passes a tag word when some tag whose
//! name contains the word lists the candidate among its songs.

use crate::tags::{normalize_song_path, Tag};

const EXCLUSION_PREFIX: char = '!';
const SECTION_SEPARATOR: char = '#';
const WORD_SEPARATOR: char = ',';

/// A single parsed query token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub raw: String,
    pub is_exclusion: bool,
    /// AND-groups of OR-words.
    pub sections: Vec<Vec<String>>,
}

impl Term {
    /// Parse a term keeping its case (used for tag terms).
    pub fn parse(raw: &str) -> Self {
        let (is_exclusion, body) = match raw.strip_prefix(EXCLUSION_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let sections = split_trimming_after(body, SECTION_SEPARATOR)
            .map(|section| {
                split_trimming_after(section, WORD_SEPARATOR)
                    .map(str::to_owned)
                    .collect()
            })
            .collect();

        Self {
            raw: raw.to_owned(),
            is_exclusion,
            sections,
        }
    }

    /// Parse a term for case-insensitive path matching.
    pub fn parse_lowercase(raw: &str) -> Self {
        let mut term = Self::parse(&raw.to_lowercase());
        term.raw = raw.to_owned();
        term
    }

    /// True when every section has at least one word accepted by `validator`.
    ///
    /// The exclusion flag is not consulted here; callers decide what a
    /// satisfied exclusion means.
    /// True for a term with no words at all, such as `!` or `#,`.
    pub fn is_blank(&self) -> bool {
        self.sections.iter().flatten().all(String::is_empty)
    }

    pub fn is_satisfied_by(&self, validator: impl Fn(&str) -> bool) -> bool {
        !self.sections.is_empty()
            && self
                .sections
                .iter()
                .all(|words| words.iter().any(|word| validator(word)))
    }
}

/// Split `input` on `separator`, dropping whitespace that directly
/// follows each separator. Leading whitespace of the first piece is kept.
fn split_trimming_after(input: &str, separator: char) -> impl Iterator<Item = &str> {
    input
        .split(separator)
        .enumerate()
        .map(|(index, piece)| if index == 0 { piece } else { piece.trim_start() })
}

/// Evaluate one raw query string against an arbitrary word validator.
///
/// The query is parsed as-is; lower-case it beforehand for
/// case-insensitive use.
pub fn validate_query(query: &str, validator: impl Fn(&str) -> bool) -> bool {
    Term::parse(query).is_satisfied_by(validator)
}

/// Pre-parsed path and tag terms, reusable across every candidate of a walk.
#[derive(Debug, Clone, Default)]
pub struct QueryMatcher {
    terms: Vec<Term>,
    tag_terms: Vec<Term>,
}

impl QueryMatcher {
    pub fn new<S: AsRef<str>>(terms: &[S], tag_terms: &[S]) -> Self {
        Self {
            terms: terms.iter().map(|t| Term::parse_lowercase(t.as_ref())).collect(),
            tag_terms: tag_terms.iter().map(|t| Term::parse(t.as_ref())).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.tag_terms.is_empty()
    }

    pub fn has_tag_terms(&self) -> bool {
        !self.tag_terms.is_empty()
    }

    /// Decide whether `candidate` (a path relative to the music root)
    /// passes the query.
    pub fn matches(&self, tags: Option<&[Tag]>, candidate: &str) -> bool {
        if self.is_empty() {
            return true;
        }

        let path = normalize_song_path(candidate);

        let Some(passed_one_term) = evaluate(&self.terms, |word| path.contains(word)) else {
            return false;
        };

        let tags = tags.unwrap_or_default();
        let in_tag = |word: &str| {
            tags.iter()
                .any(|tag| tag.name.contains(word) && tag.contains_song(&path))
        };

        let Some(passed_tag_requirement) = evaluate(&self.tag_terms, in_tag) else {
            return false;
        };

        passed_one_term && passed_tag_requirement
    }
}

/// Run a group of terms. `None` means an exclusion vetoed the candidate.
///
/// An empty group, or a group made only of exclusions none of which
/// matched, passes vacuously.
fn evaluate(terms: &[Term], validator: impl Fn(&str) -> bool) -> Option<bool> {
    let mut passed = terms.is_empty();

    for term in terms {
        // a bare `!` vetoes every candidate, whatever the validator says
        if term.is_exclusion && term.is_blank() {
            return None;
        }
        if term.is_satisfied_by(&validator) {
            if term.is_exclusion {
                return None;
            }
            passed = true;
        }
    }

    if !passed && terms.iter().all(|t| t.is_exclusion) {
        passed = true;
    }

    Some(passed)
}

/// One-shot form of [`QueryMatcher::matches`].
pub fn song_passes<S: AsRef<str>>(
    terms: &[S],
    tag_terms: &[S],
    tags: Option<&[Tag]>,
    candidate: &str,
) -> bool {
    QueryMatcher::new(terms, tag_terms).matches(tags, candidate)
}
