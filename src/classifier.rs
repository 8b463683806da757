// 🔎 Pattern Classifier - Shape rules as data
// Three independent rules, applied in a fixed order to the same text

use crate::codes::{Category, ExtractionResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// ============================================================================
// COMPILED PATTERNS
// ============================================================================

// `\d` is any Unicode decimal digit; code letters stay ASCII uppercase.
static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit run pattern is valid"));

static ALNUM_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Alphabetic}\d]+").expect("alphanumeric run pattern is valid")
});

static HCPCS_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]\d{4}").expect("HCPCS pattern is valid"));

static PLA_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}[A-Z]").expect("PLA pattern is valid"));

/// Length of a CPT code; the digit run must be exactly this long
pub const CPT_DIGITS: usize = 5;

// ============================================================================
// BOUNDARY MODE
// ============================================================================

/// How the letter/digit rules treat surrounding alphanumerics
///
/// The five-digit rule always refuses digit runs longer than five. The
/// letter/digit rules historically match anywhere, so "AB12345" yields
/// "B1234". `WholeToken` restricts them to complete alphanumeric runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryMode {
    #[default]
    Substring,
    WholeToken,
}

// ============================================================================
// PATTERN RULE
// ============================================================================

#[derive(Debug, Clone)]
enum Matcher {
    /// A maximal digit run of exactly `len` digits (counted in chars)
    DigitRun { len: usize },

    /// Leftmost non-overlapping matches anywhere in the text
    Substring(&'static Regex),

    /// The pattern must cover a whole alphanumeric run
    WholeToken(&'static Regex),
}

/// PatternRule - One shape rule bound to the category it fills
#[derive(Debug, Clone)]
pub struct PatternRule {
    category: Category,
    matcher: Matcher,
}

impl PatternRule {
    /// Five digits, not preceded or followed by another digit
    pub fn cpt() -> Self {
        PatternRule {
            category: Category::Cpt,
            matcher: Matcher::DigitRun { len: CPT_DIGITS },
        }
    }

    /// One uppercase letter then four digits
    pub fn hcpcs(mode: BoundaryMode) -> Self {
        PatternRule {
            category: Category::Hcpcs,
            matcher: Self::shaped(&HCPCS_SHAPE, mode),
        }
    }

    /// Four digits then one uppercase letter
    pub fn pla(mode: BoundaryMode) -> Self {
        PatternRule {
            category: Category::Pla,
            matcher: Self::shaped(&PLA_SHAPE, mode),
        }
    }

    fn shaped(regex: &'static Regex, mode: BoundaryMode) -> Matcher {
        match mode {
            BoundaryMode::Substring => Matcher::Substring(regex),
            BoundaryMode::WholeToken => Matcher::WholeToken(regex),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// All matches in left-to-right order (duplicates included)
    pub fn find_all<'t>(&self, text: &'t str) -> Vec<&'t str> {
        match &self.matcher {
            Matcher::DigitRun { len } => DIGIT_RUN
                .find_iter(text)
                .map(|m| m.as_str())
                .filter(|run| run.chars().count() == *len)
                .collect(),
            Matcher::Substring(regex) => regex.find_iter(text).map(|m| m.as_str()).collect(),
            Matcher::WholeToken(regex) => ALNUM_RUN
                .find_iter(text)
                .map(|m| m.as_str())
                .filter(|token| {
                    regex
                        .find(token)
                        .is_some_and(|m| m.start() == 0 && m.end() == token.len())
                })
                .collect(),
        }
    }

    /// Check whether a single token is exactly one code of this shape
    pub fn matches(&self, token: &str) -> bool {
        let found = self.find_all(token);
        found.len() == 1 && found[0].len() == token.len()
    }
}

// ============================================================================
// PATTERN CLASSIFIER
// ============================================================================

/// PatternClassifier - Applies every rule to the full text
///
/// Rules are independent: a token may satisfy more than one of them and
/// then appears in more than one bucket. No disjointness is forced.
#[derive(Debug, Clone)]
pub struct PatternClassifier {
    rules: Vec<PatternRule>,
    mode: BoundaryMode,
}

impl PatternClassifier {
    /// Classifier with the historical (substring) behavior
    pub fn new() -> Self {
        Self::with_mode(BoundaryMode::default())
    }

    pub fn with_mode(mode: BoundaryMode) -> Self {
        PatternClassifier {
            rules: vec![PatternRule::cpt(), PatternRule::hcpcs(mode), PatternRule::pla(mode)],
            mode,
        }
    }

    pub fn mode(&self) -> BoundaryMode {
        self.mode
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Extract unique codes per category, in discovery order
    pub fn classify(&self, text: &str) -> ExtractionResult {
        let mut result = ExtractionResult::new();

        for rule in &self.rules {
            result.extend(rule.category(), rule.find_all(text));
        }

        result
    }

    /// Categories whose rule accepts this exact token
    pub fn categories_of(&self, token: &str) -> Vec<Category> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(token))
            .map(|rule| rule.category())
            .collect()
    }
}

impl Default for PatternClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify text with the default classifier
pub fn classify(text: &str) -> ExtractionResult {
    PatternClassifier::new().classify(text)
}

// ============================================================================
// TESTS
// ============================================================================
