// 🧾 Report Views - What shells show for a batch
// Plain-text rendering for the CLI, serializable views for JSON output

use crate::aggregator::{BatchReport, BatchSummary, DocumentOutcome};
use crate::codes::{AggregatedResult, Category, ExtractionResult};
use crate::descriptions::DescriptionTable;
use serde::Serialize;

// ============================================================================
// TEXT RENDERING
// ============================================================================

/// Display lines for one category, sorted, or the "none found" notice
pub fn category_lines(
    result: &ExtractionResult,
    category: Category,
    table: &DescriptionTable,
) -> Vec<String> {
    let codes = result.sorted(category);
    if codes.is_empty() {
        return vec![format!("No {} codes found", category.label())];
    }
    codes.iter().map(|code| table.format_line(code)).collect()
}

/// Section for one document
pub fn render_outcome(outcome: &DocumentOutcome, table: &DescriptionTable) -> String {
    let mut out = format!("Results from {}\n", outcome.name);

    match &outcome.outcome {
        Ok(result) => {
            for category in Category::ALL {
                out.push_str(&format!("  {} Codes ({})\n", category.label(), category.shape()));
                for line in category_lines(result, category, table) {
                    out.push_str(&format!("    {}\n", line));
                }
            }
        }
        Err(e) => {
            out.push_str(&format!("  Error processing file: {}\n", e));
        }
    }

    out
}

/// Full plain-text report: every document, then the summary
pub fn render_report(report: &BatchReport, table: &DescriptionTable) -> String {
    let mut out = String::from("Extracted Codes with Descriptions\n");

    for outcome in &report.outcomes {
        out.push('\n');
        out.push_str(&render_outcome(outcome, table));
    }

    out.push('\n');
    out.push_str(&report.summary.message());
    out.push('\n');

    if report.summary.has_failures() {
        out.push_str(&format!(
            "{} file(s) could not be read. Please check that each one is a valid, non-empty PDF or text document.\n",
            report.summary.documents_failed
        ));
    }

    out
}

// ============================================================================
// SERIALIZABLE VIEWS
// ============================================================================

/// A code with its resolved description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescribedCode {
    pub code: String,
    pub category: Category,
    pub description: String,
}

/// DocumentView - One document as JSON
#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    pub name: String,
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub codes: Option<ExtractionResult>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub described: Vec<DescribedCode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentView {
    pub fn from_outcome(outcome: &DocumentOutcome, table: &DescriptionTable) -> Self {
        match &outcome.outcome {
            Ok(result) => DocumentView {
                name: outcome.name.clone(),
                success: true,
                codes: Some(result.clone()),
                described: describe_all(result, table),
                error: None,
            },
            Err(e) => DocumentView {
                name: outcome.name.clone(),
                success: false,
                codes: None,
                described: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }
}

/// ReportView - A whole batch as JSON
#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub documents: Vec<DocumentView>,
    pub combined: AggregatedResult,
    pub summary: BatchSummary,
    pub message: String,
}

impl ReportView {
    pub fn new(report: &BatchReport, table: &DescriptionTable) -> Self {
        ReportView {
            documents: report
                .outcomes
                .iter()
                .map(|o| DocumentView::from_outcome(o, table))
                .collect(),
            combined: report.combined.clone(),
            summary: report.summary.clone(),
            message: report.summary.message(),
        }
    }
}

/// Sorted, described codes for every category
pub fn describe_all(result: &ExtractionResult, table: &DescriptionTable) -> Vec<DescribedCode> {
    Category::ALL
        .into_iter()
        .flat_map(|category| {
            result.sorted(category).into_iter().map(move |code| DescribedCode {
                description: table.describe(&code).to_string(),
                code,
                category,
            })
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Aggregator;
    use crate::document::DecodeError;

    fn sample_report() -> BatchReport {
        let mut outcomes = Aggregator::new()
            .extract_texts(&[("visit.txt", "99214 99213 G0008")])
            .outcomes;
        outcomes.push(DocumentOutcome {
            name: "scan.pdf".to_string(),
            outcome: Err(DecodeError::Pdf {
                name: "scan.pdf".to_string(),
                reason: "invalid file header".to_string(),
            }),
        });
        BatchReport::from_outcomes(outcomes)
    }

    #[test]
    fn test_category_lines_sorted_with_descriptions() {
        let result = ExtractionResult::from_lists(&["99214", "99213"], &[], &[]);
        let lines = category_lines(&result, Category::Cpt, DescriptionTable::global());

        assert_eq!(
            lines,
            vec![
                "99213: Office/outpatient visit, established patient, 20-29 minutes",
                "99214: Office/outpatient visit, established patient, 30-39 minutes",
            ]
        );
    }

    #[test]
    fn test_category_lines_empty_notice() {
        let lines = category_lines(&ExtractionResult::new(), Category::Pla, DescriptionTable::global());
        assert_eq!(lines, vec!["No PLA codes found"]);
    }

    #[test]
    fn test_render_report() {
        let text = render_report(&sample_report(), DescriptionTable::global());

        assert!(text.contains("Results from visit.txt"));
        assert!(text.contains("G0008: Administration of influenza virus vaccine"));
        assert!(text.contains("No PLA codes found"));
        assert!(text.contains("Results from scan.pdf"));
        assert!(text.contains("Error processing file: Failed to parse PDF scan.pdf"));
        assert!(text.contains("Successfully processed 1 file(s) and extracted 3 unique medical codes!"));
        assert!(text.contains("1 file(s) could not be read"));
        assert!(!text.contains("valid PDF files"));
    }

    #[test]
    fn test_failure_hint_covers_text_documents() {
        let outcomes = vec![DocumentOutcome {
            name: "notes.txt".to_string(),
            outcome: Err(DecodeError::InvalidUtf8 {
                name: "notes.txt".to_string(),
            }),
        }];
        let text = render_report(&BatchReport::from_outcomes(outcomes), DescriptionTable::global());

        assert!(text.contains("notes.txt is not valid UTF-8 text"));
        assert!(text.contains("valid, non-empty PDF or text document"));
    }

    #[test]
    fn test_report_view_json() {
        let view = ReportView::new(&sample_report(), DescriptionTable::global());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["documents"][0]["success"], true);
        assert_eq!(json["documents"][0]["codes"]["CPT"][0], "99214");
        assert_eq!(json["documents"][0]["described"][0]["code"], "99213");
        assert_eq!(json["documents"][1]["success"], false);
        assert!(json["documents"][1].get("codes").is_none());
        assert_eq!(json["combined"]["HCPCS"][0], "G0008");
        assert_eq!(json["summary"]["unique_codes"], 3);
        assert_eq!(json["summary"]["documents_failed"], 1);
    }

    #[test]
    fn test_describe_all_uses_sentinel() {
        let result = ExtractionResult::from_lists(&["12345"], &[], &[]);
        let described = describe_all(&result, DescriptionTable::global());

        assert_eq!(
            described,
            vec![DescribedCode {
                code: "12345".to_string(),
                category: Category::Cpt,
                description: "Description not available".to_string(),
            }]
        );
    }
}
