//! Keyword prefilter for non-answer detection.
//!
//! A deterministic lexical scan used to cheaply rule out rows that
//! cannot possibly be non-answers, avoiding costly remote calls. A
//! miss is unconditionally final: the row is resolved to label 0 and
//! the classifier is never contacted. This assumes the lexicon has no
//! false negatives for the non-answer class -- an intentional
//! cost-saving assumption worth auditing against labeled data (see the
//! `candor prefilter` subcommand).

use regex::Regex;

use candor_types::DictionaryVariant;

/// Phrases signalling refusal or inability to answer.
const BASE_PHRASES: &[&str] = &[
    "rather not",
    "prefer not to",
    "no comment",
    "not going to comment",
    "can't comment",
    "cannot comment",
    "won't comment",
    "decline to answer",
    "declined to answer",
    "can't answer",
    "cannot answer",
    "not able to answer",
    "unable to answer",
    "not going to get into",
    "won't get into",
    "not get into",
    "don't disclose",
    "do not disclose",
    "don't break out",
    "do not break out",
    "don't give guidance",
    "not providing guidance",
    "not at liberty",
    "competitive reasons",
    "proprietary",
    "confidential",
    "not prepared to",
    "too early to",
    "premature to",
    "hard to say",
    "difficult to predict",
    "can't predict",
    "cannot predict",
    "don't know",
    "do not know",
];

/// Forward-looking deferral phrases added by the `with-future` variant:
/// promises to answer later rather than now.
const FUTURE_PHRASES: &[&str] = &[
    "later call",
    "future call",
    "at a later date",
    "in due course",
    "down the road",
    "wait and see",
    "stay tuned",
    "when we report",
    "next quarter",
    "get back to you",
    "follow up with you",
    "circle back",
    "take it offline",
    "take this offline",
];

/// Result of scanning one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KwScan {
    /// Whether any phrase matched.
    pub matched: bool,
    /// The matched phrases, sorted and deduplicated.
    pub terms: Vec<String>,
}

impl KwScan {
    /// The matched terms joined with semicolons, the table column form.
    pub fn joined_terms(&self) -> String {
        self.terms.join(";")
    }
}

/// A compiled phrase dictionary.
///
/// Matching is case-insensitive, tolerates flexible whitespace inside
/// a phrase, and anchors on word boundaries so "proprietary" does not
/// fire inside "appropriateness".
pub struct KeywordDictionary {
    name: String,
    entries: Vec<(String, Regex)>,
}

impl KeywordDictionary {
    /// The base non-answer lexicon.
    pub fn base() -> Self {
        Self::from_phrases("base", BASE_PHRASES)
    }

    /// The base lexicon plus forward-looking deferral phrases.
    pub fn with_future() -> Self {
        let phrases: Vec<&str> = BASE_PHRASES
            .iter()
            .chain(FUTURE_PHRASES.iter())
            .copied()
            .collect();
        Self::from_phrases("with-future", &phrases)
    }

    /// The dictionary for a configured variant.
    pub fn for_variant(variant: DictionaryVariant) -> Self {
        match variant {
            DictionaryVariant::Base => Self::base(),
            DictionaryVariant::WithFuture => Self::with_future(),
        }
    }

    /// Compile a dictionary from a phrase list.
    pub fn from_phrases(name: &str, phrases: &[&str]) -> Self {
        let entries = phrases
            .iter()
            .map(|phrase| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(phrase).replace(' ', r"\s+"));
                let regex = Regex::new(&pattern).expect("phrase patterns are well-formed");
                (phrase.to_string(), regex)
            })
            .collect();
        Self {
            name: name.to_string(),
            entries,
        }
    }

    /// Dictionary name, for logging.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of phrases in the dictionary.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scan one answer for non-answer phrases.
    pub fn find_matches(&self, text: &str) -> KwScan {
        let mut terms: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, regex)| regex.is_match(text))
            .map(|(phrase, _)| phrase.clone())
            .collect();
        terms.sort();
        terms.dedup();
        KwScan {
            matched: !terms.is_empty(),
            terms,
        }
    }
}
