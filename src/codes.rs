// 🏷️ Code Model - Categories, codes and per-document results
// Categories are told apart purely by lexical shape, never by registry lookup

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CATEGORY
// ============================================================================

/// Category - Which shape rule a code was matched by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Five digits, not adjacent to another digit (e.g. "99213")
    #[serde(rename = "CPT")]
    Cpt,

    /// One uppercase letter followed by four digits (e.g. "G0008")
    #[serde(rename = "HCPCS")]
    Hcpcs,

    /// Four digits followed by one uppercase letter (e.g. "0002U")
    #[serde(rename = "PLA")]
    Pla,
}

impl Category {
    /// Every category, in export and display order
    pub const ALL: [Category; 3] = [Category::Cpt, Category::Hcpcs, Category::Pla];

    /// Short label used in exports ("CPT", "HCPCS", "PLA")
    pub fn label(&self) -> &'static str {
        match self {
            Category::Cpt => "CPT",
            Category::Hcpcs => "HCPCS",
            Category::Pla => "PLA",
        }
    }

    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            Category::Cpt => "Current Procedural Terminology",
            Category::Hcpcs => "Healthcare Common Procedure Coding System",
            Category::Pla => "Proprietary Laboratory Analyses",
        }
    }

    /// Shape hint shown next to the name
    pub fn shape(&self) -> &'static str {
        match self {
            Category::Cpt => "5 digits",
            Category::Hcpcs => "Letter + 4 digits",
            Category::Pla => "4 digits + letter",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CPT" => Ok(Category::Cpt),
            "HCPCS" => Ok(Category::Hcpcs),
            "PLA" => Ok(Category::Pla),
            other => Err(format!("Unknown code category: {}", other)),
        }
    }
}

// ============================================================================
// CODE
// ============================================================================

/// Code - A matched token together with the bucket it landed in
///
/// Equality is exact, case-sensitive string equality plus category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Code {
    pub value: String,
    pub category: Category,
}

impl Code {
    pub fn new(value: impl Into<String>, category: Category) -> Self {
        Code {
            value: value.into(),
            category,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

// ============================================================================
// EXTRACTION RESULT
// ============================================================================

/// ExtractionResult - Fixed-shape record of unique codes per category
///
/// Within a category codes are unique and kept in discovery order.
/// Sorting is a display concern, see [`ExtractionResult::sorted`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(rename = "CPT", default)]
    cpt: Vec<String>,

    #[serde(rename = "HCPCS", default)]
    hcpcs: Vec<String>,

    #[serde(rename = "PLA", default)]
    pla: Vec<String>,
}

/// AggregatedResult - Same shape, built by merging several documents
pub type AggregatedResult = ExtractionResult;

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a result from per-category lists, dropping later duplicates
    pub fn from_lists<S: AsRef<str>>(cpt: &[S], hcpcs: &[S], pla: &[S]) -> Self {
        let mut result = ExtractionResult::new();
        for (category, list) in [(Category::Cpt, cpt), (Category::Hcpcs, hcpcs), (Category::Pla, pla)] {
            result.extend(category, list.iter().map(|c| c.as_ref()));
        }
        result
    }

    fn bucket(&self, category: Category) -> &Vec<String> {
        match category {
            Category::Cpt => &self.cpt,
            Category::Hcpcs => &self.hcpcs,
            Category::Pla => &self.pla,
        }
    }

    fn bucket_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Cpt => &mut self.cpt,
            Category::Hcpcs => &mut self.hcpcs,
            Category::Pla => &mut self.pla,
        }
    }

    /// Append a code unless it is already present. Returns true if added.
    pub fn insert(&mut self, category: Category, value: &str) -> bool {
        let bucket = self.bucket_mut(category);
        if bucket.iter().any(|existing| existing == value) {
            return false;
        }
        bucket.push(value.to_string());
        true
    }

    /// Append many codes with stable dedup (first occurrence wins)
    pub fn extend<'a, I>(&mut self, category: Category, values: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let bucket = self.bucket_mut(category);
        let mut seen: HashSet<String> = bucket.iter().cloned().collect();
        for value in values {
            if seen.insert(value.to_string()) {
                bucket.push(value.to_string());
            }
        }
    }

    /// Append without a duplicate check; the caller tracks what it has seen
    pub(crate) fn push_unseen(&mut self, category: Category, value: &str) {
        self.bucket_mut(category).push(value.to_string());
    }

    /// Codes of one category in stored order
    pub fn codes(&self, category: Category) -> &[String] {
        self.bucket(category)
    }

    /// Codes of one category sorted for display
    pub fn sorted(&self, category: Category) -> Vec<String> {
        let mut codes = self.bucket(category).clone();
        codes.sort();
        codes
    }

    pub fn contains(&self, category: Category, value: &str) -> bool {
        self.bucket(category).iter().any(|c| c == value)
    }

    /// Iterate categories in `Category::ALL` order
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[String])> + '_ {
        Category::ALL
            .into_iter()
            .map(move |category| (category, self.codes(category)))
    }

    /// Flatten into `Code` rows, grouped by category
    pub fn codes_iter(&self) -> impl Iterator<Item = Code> + '_ {
        self.iter().flat_map(|(category, codes)| {
            codes.iter().map(move |value| Code::new(value.clone(), category))
        })
    }

    /// Number of codes in one category
    pub fn count(&self, category: Category) -> usize {
        self.bucket(category).len()
    }

    /// Total unique codes, summed over categories
    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|c| self.count(*c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::Cpt.label(), "CPT");
        assert_eq!(Category::Hcpcs.label(), "HCPCS");
        assert_eq!(Category::Pla.label(), "PLA");
        assert_eq!(Category::Pla.to_string(), "PLA");
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("cpt".parse::<Category>(), Ok(Category::Cpt));
        assert_eq!(" HCPCS ".parse::<Category>(), Ok(Category::Hcpcs));
        assert_eq!("Pla".parse::<Category>(), Ok(Category::Pla));
        assert!("ICD".parse::<Category>().is_err());
    }

    #[test]
    fn test_insert_ignores_duplicates() {
        let mut result = ExtractionResult::new();

        assert!(result.insert(Category::Cpt, "99213"));
        assert!(result.insert(Category::Cpt, "99214"));
        assert!(!result.insert(Category::Cpt, "99213"));

        assert_eq!(result.codes(Category::Cpt), ["99213", "99214"]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_same_value_in_two_categories_is_kept_in_both() {
        let mut result = ExtractionResult::new();
        result.insert(Category::Hcpcs, "A1234");
        result.insert(Category::Pla, "A1234");

        assert!(result.contains(Category::Hcpcs, "A1234"));
        assert!(result.contains(Category::Pla, "A1234"));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_codes_are_case_sensitive() {
        let mut result = ExtractionResult::new();
        result.insert(Category::Pla, "0002U");
        result.insert(Category::Pla, "0002u");

        assert_eq!(result.count(Category::Pla), 2);
    }

    #[test]
    fn test_sorted_does_not_reorder_storage() {
        let result = ExtractionResult::from_lists(&["99214", "99213"], &[], &[]);

        assert_eq!(result.sorted(Category::Cpt), vec!["99213", "99214"]);
        assert_eq!(result.codes(Category::Cpt), ["99214", "99213"]);
    }

    #[test]
    fn test_codes_iter_groups_by_category() {
        let result = ExtractionResult::from_lists(&["99213"], &["G0008"], &["0002U", "0001U"]);
        let rows: Vec<Code> = result.codes_iter().collect();

        assert_eq!(
            rows,
            vec![
                Code::new("99213", Category::Cpt),
                Code::new("G0008", Category::Hcpcs),
                Code::new("0002U", Category::Pla),
                Code::new("0001U", Category::Pla),
            ]
        );
    }

    #[test]
    fn test_json_shape() {
        let result = ExtractionResult::from_lists(&["99213"], &[], &["0002U"]);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"CPT": ["99213"], "HCPCS": [], "PLA": ["0002U"]})
        );

        let back: ExtractionResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_empty_result() {
        let result = ExtractionResult::new();
        assert!(result.is_empty());
        assert_eq!(result.codes_iter().count(), 0);
    }
}
