// 📖 Description Table - Static code → description lookup
// Built once, read-only afterwards. Extending means building a new table.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// Returned for any code absent from the table
pub const DESCRIPTION_NOT_AVAILABLE: &str = "Description not available";

/// Seed data: (code, description)
const BUILTIN_DESCRIPTIONS: &[(&str, &str)] = &[
    // CPT
    ("99213", "Office/outpatient visit, established patient, 20-29 minutes"),
    ("99214", "Office/outpatient visit, established patient, 30-39 minutes"),
    // HCPCS
    ("G0008", "Administration of influenza virus vaccine"),
    ("J0171", "Injection, adrenalin, epinephrine, 0.1 mg"),
    // PLA
    ("0001U", "Red blood cell antigen typing, DNA, human erythrocyte gene analysis"),
    ("0002U", "Oncology colorectal screening"),
];

static GLOBAL_TABLE: LazyLock<DescriptionTable> = LazyLock::new(DescriptionTable::builtin);

/// One row of a user-supplied descriptions CSV
#[derive(Debug, Deserialize)]
struct DescriptionRow {
    #[serde(rename = "Code", alias = "code")]
    code: String,

    #[serde(rename = "Description", alias = "description")]
    description: String,
}

/// DescriptionTable - Immutable mapping from code string to description
///
/// There is no insert or remove. To extend the seed data, build a new
/// table with [`DescriptionTable::extended_with`] at startup and share it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionTable {
    entries: HashMap<String, String>,
}

impl DescriptionTable {
    /// Table holding only the built-in seed entries
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN_DESCRIPTIONS
                .iter()
                .map(|(code, desc)| (code.to_string(), desc.to_string())),
        )
    }

    /// Process-wide built-in table
    pub fn global() -> &'static DescriptionTable {
        &GLOBAL_TABLE
    }

    /// Build from (code, description) pairs; later pairs win
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        DescriptionTable {
            entries: entries.into_iter().collect(),
        }
    }

    /// Load a `code,description` CSV (header row required)
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("Failed to open descriptions file: {}", path.display()))?;

        let mut entries = Vec::new();
        for (line_num, result) in rdr.deserialize().enumerate() {
            let row: DescriptionRow = result.with_context(|| {
                format!(
                    "Failed to parse descriptions line {} in {}",
                    line_num + 2,
                    path.display()
                )
            })?;
            if row.code.is_empty() {
                continue;
            }
            entries.push((row.code, row.description));
        }

        tracing::debug!(count = entries.len(), path = %path.display(), "Loaded code descriptions");
        Ok(Self::from_entries(entries))
    }

    /// New table with `other` layered over this one (entries in `other` win)
    pub fn extended_with(&self, other: &DescriptionTable) -> Self {
        let mut entries = self.entries.clone();
        entries.extend(other.entries.iter().map(|(k, v)| (k.clone(), v.clone())));
        DescriptionTable { entries }
    }

    /// Description for a code, or the sentinel on a miss
    pub fn describe(&self, code: &str) -> &str {
        self.entries
            .get(code)
            .map(String::as_str)
            .unwrap_or(DESCRIPTION_NOT_AVAILABLE)
    }

    /// "<code>: <description>" as shown to users
    pub fn format_line(&self, code: &str) -> String {
        format!("{}: {}", code, self.describe(code))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All known codes, sorted
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

/// Describe a code using the built-in table
pub fn describe(code: &str) -> &'static str {
    DescriptionTable::global().describe(code)
}

/// Format a display line using the built-in table
pub fn format_line(code: &str) -> String {
    DescriptionTable::global().format_line(code)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_descriptions() {
        assert_eq!(
            describe("99213"),
            "Office/outpatient visit, established patient, 20-29 minutes"
        );
        assert_eq!(describe("G0008"), "Administration of influenza virus vaccine");
        assert_eq!(describe("0002U"), "Oncology colorectal screening");
        assert_eq!(DescriptionTable::builtin().len(), 6);
    }

    #[test]
    fn test_unknown_code_returns_sentinel() {
        assert_eq!(describe("00000"), DESCRIPTION_NOT_AVAILABLE);
        assert_eq!(describe(""), "Description not available");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(describe("g0008"), DESCRIPTION_NOT_AVAILABLE);
    }

    #[test]
    fn test_format_line() {
        assert_eq!(
            format_line("J0171"),
            "J0171: Injection, adrenalin, epinephrine, 0.1 mg"
        );
        assert_eq!(format_line("12345"), "12345: Description not available");
    }

    #[test]
    fn test_extended_with_overrides_and_adds() {
        let extra = DescriptionTable::from_entries(vec![
            ("99213".to_string(), "Custom visit text".to_string()),
            ("A0428".to_string(), "Ambulance service, basic life support".to_string()),
        ]);
        let table = DescriptionTable::builtin().extended_with(&extra);

        assert_eq!(table.describe("99213"), "Custom visit text");
        assert_eq!(table.describe("A0428"), "Ambulance service, basic life support");
        assert_eq!(table.describe("99214"), describe("99214"));
        assert_eq!(table.len(), 7);

        // Inputs are untouched
        assert_eq!(DescriptionTable::global().len(), 6);
        assert!(!DescriptionTable::global().contains("A0428"));
    }

    #[test]
    fn test_from_csv_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Code,Description").unwrap();
        writeln!(file, "A0428,\"Ambulance service, basic life support\"").unwrap();
        writeln!(file, " 81479 , Unlisted molecular pathology procedure").unwrap();
        file.flush().unwrap();

        let table = DescriptionTable::from_csv_path(file.path()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.describe("A0428"), "Ambulance service, basic life support");
        assert_eq!(table.describe("81479"), "Unlisted molecular pathology procedure");
        assert_eq!(table.codes(), vec!["81479", "A0428"]);
    }

    #[test]
    fn test_from_csv_path_missing_file() {
        let result = DescriptionTable::from_csv_path(Path::new("/nonexistent/descriptions.csv"));
        assert!(result.is_err());
    }
}
