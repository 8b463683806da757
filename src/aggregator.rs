// 🧮 Extraction Aggregator - One or many documents into one result
// Per-document outcomes are kept; merging is a stable dedup in document order

use crate::classifier::PatternClassifier;
use crate::codes::{AggregatedResult, Category, ExtractionResult};
use crate::document::{load_document, DecodeError, DocumentSource, RawDocument};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ============================================================================
// BATCH POLICY
// ============================================================================

/// What to do when a document in a batch cannot be decoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchPolicy {
    /// Record the failure and keep going
    #[default]
    Isolate,

    /// Abort the whole batch on the first failure
    FailFast,
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// DocumentOutcome - What happened to one document of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOutcome {
    pub name: String,
    pub outcome: Result<ExtractionResult, DecodeError>,
}

impl DocumentOutcome {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn codes(&self) -> Option<&ExtractionResult> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&DecodeError> {
        self.outcome.as_ref().err()
    }
}

/// Counts for one category in the combined result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

/// BatchSummary - Counts shown after a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Documents successfully turned into codes
    pub documents_processed: usize,

    /// Documents that failed to decode
    pub documents_failed: usize,

    /// Sum over categories of the combined (deduplicated) result
    pub unique_codes: usize,

    pub per_category: Vec<CategoryCount>,
}

impl BatchSummary {
    pub fn from_combined(combined: &AggregatedResult, processed: usize, failed: usize) -> Self {
        BatchSummary {
            documents_processed: processed,
            documents_failed: failed,
            unique_codes: combined.len(),
            per_category: combined
                .iter()
                .map(|(category, codes)| CategoryCount {
                    category,
                    count: codes.len(),
                })
                .collect(),
        }
    }

    pub fn message(&self) -> String {
        format!(
            "Successfully processed {} file(s) and extracted {} unique medical codes!",
            self.documents_processed, self.unique_codes
        )
    }

    pub fn has_failures(&self) -> bool {
        self.documents_failed > 0
    }
}

/// BatchReport - Per-document outcomes plus the merged view
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<DocumentOutcome>,
    pub combined: AggregatedResult,
    pub summary: BatchSummary,
}

impl BatchReport {
    /// Build a report, merging only the documents that succeeded
    pub fn from_outcomes(outcomes: Vec<DocumentOutcome>) -> Self {
        let combined = merge(outcomes.iter().filter_map(|o| o.codes()));
        let processed = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.len() - processed;
        let summary = BatchSummary::from_combined(&combined, processed, failed);

        BatchReport {
            outcomes,
            combined,
            summary,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &DecodeError> {
        self.outcomes.iter().filter_map(|o| o.error())
    }
}

// ============================================================================
// MERGE
// ============================================================================

/// Concatenate per category in the given order, keeping first occurrences
pub fn merge<'a, I>(results: I) -> AggregatedResult
where
    I: IntoIterator<Item = &'a ExtractionResult>,
{
    let mut combined = AggregatedResult::new();
    // One seen-set per category for the whole batch, indexed like Category::ALL
    let mut seen: [HashSet<&'a str>; 3] = Default::default();

    for result in results {
        for (idx, category) in Category::ALL.into_iter().enumerate() {
            for code in result.codes(category) {
                if seen[idx].insert(code.as_str()) {
                    combined.push_unseen(category, code);
                }
            }
        }
    }

    combined
}

// ============================================================================
// AGGREGATOR
// ============================================================================

/// Aggregator - Runs the classifier over documents, sequentially
pub struct Aggregator {
    classifier: PatternClassifier,
    policy: BatchPolicy,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::with_classifier(PatternClassifier::new())
    }

    pub fn with_classifier(classifier: PatternClassifier) -> Self {
        Aggregator {
            classifier,
            policy: BatchPolicy::default(),
        }
    }

    /// Builder: set the batch failure policy
    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    pub fn classifier(&self) -> &PatternClassifier {
        &self.classifier
    }

    /// Classify one piece of text
    pub fn extract_one(&self, text: &str) -> ExtractionResult {
        self.classifier.classify(text)
    }

    /// Classify already-decoded documents, keeping their identifiers
    pub fn extract_many<S, T>(&self, documents: &[(S, T)]) -> Vec<(String, ExtractionResult)>
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        documents
            .iter()
            .map(|(id, text)| (id.as_ref().to_string(), self.extract_one(text.as_ref())))
            .collect()
    }

    /// Merge per-document results (stable dedup in document order)
    pub fn merge<'a, I>(&self, results: I) -> AggregatedResult
    where
        I: IntoIterator<Item = &'a ExtractionResult>,
    {
        merge(results)
    }

    /// Decode and classify each document, one outcome per document
    ///
    /// Under `BatchPolicy::FailFast` the first decode failure is returned
    /// instead and no partial report exists.
    pub fn extract_documents(
        &self,
        source: &dyn DocumentSource,
        documents: &[RawDocument],
    ) -> Result<BatchReport, DecodeError> {
        let decoded = documents
            .iter()
            .map(|doc| (doc.name.clone(), source.read_text(&doc.name, &doc.bytes)));

        self.run_batch(decoded, documents.len(), &mut |_, _, _| {})
    }

    /// Read files from disk and classify them; unreadable files are failures
    pub fn extract_files<P: AsRef<Path>>(
        &self,
        source: &dyn DocumentSource,
        paths: &[P],
    ) -> Result<BatchReport, DecodeError> {
        self.extract_files_with_progress(source, paths, |_, _, _| {})
    }

    /// `extract_files`, calling `on_document(index, total, name)` (1-based)
    /// as each file is processed
    pub fn extract_files_with_progress<P, F>(
        &self,
        source: &dyn DocumentSource,
        paths: &[P],
        mut on_document: F,
    ) -> Result<BatchReport, DecodeError>
    where
        P: AsRef<Path>,
        F: FnMut(usize, usize, &str),
    {
        let decoded = paths.iter().map(|path| match load_document(path.as_ref()) {
            Ok(doc) => {
                let text = source.read_text(&doc.name, &doc.bytes);
                (doc.name, text)
            }
            Err(e) => (e.document().to_string(), Err(e)),
        });

        self.run_batch(decoded, paths.len(), &mut on_document)
    }

    /// Classify decoded texts one at a time, honoring the batch policy
    fn run_batch<I>(
        &self,
        decoded: I,
        total: usize,
        on_document: &mut dyn FnMut(usize, usize, &str),
    ) -> Result<BatchReport, DecodeError>
    where
        I: Iterator<Item = (String, Result<String, DecodeError>)>,
    {
        let mut outcomes = Vec::with_capacity(total);

        for (idx, (name, text)) in decoded.enumerate() {
            tracing::debug!(document = %name, index = idx + 1, total, "Processing document");
            on_document(idx + 1, total, &name);

            let outcome = text.map(|text| self.extract_one(&text));

            match &outcome {
                Ok(codes) => {
                    tracing::debug!(document = %name, codes = codes.len(), "Extracted codes");
                }
                Err(e) => {
                    tracing::warn!(document = %name, error = %e, "Failed to decode document");
                    if self.policy == BatchPolicy::FailFast {
                        return Err(e.clone());
                    }
                }
            }

            outcomes.push(DocumentOutcome { name, outcome });
        }

        let report = BatchReport::from_outcomes(outcomes);
        tracing::info!(
            processed = report.summary.documents_processed,
            failed = report.summary.documents_failed,
            unique_codes = report.summary.unique_codes,
            "Batch complete"
        );

        Ok(report)
    }

    /// Same as `extract_documents` for text that is already decoded
    pub fn extract_texts<S, T>(&self, documents: &[(S, T)]) -> BatchReport
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let outcomes = self
            .extract_many(documents)
            .into_iter()
            .map(|(name, codes)| DocumentOutcome {
                name,
                outcome: Ok(codes),
            })
            .collect();

        BatchReport::from_outcomes(outcomes)
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::AutoSource;

    fn cpt(codes: &[&str]) -> ExtractionResult {
        let mut result = ExtractionResult::new();
        result.extend(Category::Cpt, codes.iter().copied());
        result
    }

    #[test]
    fn test_merge_preserves_first_seen_order() {
        let merged = merge(&[cpt(&["A", "B"]), cpt(&["B", "C"])]);
        assert_eq!(merged.codes(Category::Cpt), ["A", "B", "C"]);
    }

    #[test]
    fn test_merge_identical_results() {
        let single = ExtractionResult::from_lists(&["99213", "99214"], &["G0008"], &["0002U"]);
        let merged = merge(&[single.clone(), single.clone()]);

        assert_eq!(merged, single);
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn test_merge_keeps_position_of_first_occurrence() {
        let doc1 = cpt(&["11111"]);
        let doc2 = cpt(&["22222"]);
        let doc3 = cpt(&["33333", "11111"]);

        let merged = merge(&[doc1, doc2, doc3]);
        assert_eq!(merged.codes(Category::Cpt), ["11111", "22222", "33333"]);
    }

    #[test]
    fn test_merge_is_per_category() {
        let a = ExtractionResult::from_lists(&["99213"], &["G0008"], &[]);
        let b = ExtractionResult::from_lists(&[], &["J0171", "G0008"], &["0001U"]);

        let merged = merge(&[a, b]);
        assert_eq!(merged.codes(Category::Cpt), ["99213"]);
        assert_eq!(merged.codes(Category::Hcpcs), ["G0008", "J0171"]);
        assert_eq!(merged.codes(Category::Pla), ["0001U"]);
    }

    #[test]
    fn test_merge_many_documents_with_repeats() {
        let docs: Vec<ExtractionResult> = (0..50)
            .map(|i| {
                let own = format!("{:05}", 10000 + i);
                ExtractionResult::from_lists(&[own.as_str(), "99213"], &["G0008"], &[])
            })
            .collect();

        let combined = merge(&docs);

        assert_eq!(combined.count(Category::Cpt), 51);
        assert_eq!(combined.codes(Category::Cpt)[0], "10000");
        assert_eq!(combined.codes(Category::Cpt)[1], "99213");
        assert_eq!(combined.codes(Category::Cpt)[2], "10001");
        assert_eq!(combined.codes(Category::Cpt)[50], "10049");
        assert_eq!(combined.codes(Category::Hcpcs), ["G0008"]);
    }

    #[test]
    fn test_merge_nothing() {
        let merged = merge(std::iter::empty());
        assert!(merged.is_empty());
    }

    #[test]
    fn test_extract_many_keeps_identifiers() {
        let aggregator = Aggregator::new();
        let results = aggregator.extract_many(&[("a.pdf", "99213"), ("b.pdf", "G0008")]);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "a.pdf");
        assert_eq!(results[0].1.codes(Category::Cpt), ["99213"]);
        assert_eq!(results[1].0, "b.pdf");
        assert_eq!(results[1].1.codes(Category::Hcpcs), ["G0008"]);
    }

    #[test]
    fn test_summary_counts_merged_codes() {
        let aggregator = Aggregator::new();
        let report = aggregator.extract_texts(&[
            ("a.txt", "99213 G0008"),
            ("b.txt", "99213 0002U"),
        ]);

        assert_eq!(report.summary.documents_processed, 2);
        assert_eq!(report.summary.documents_failed, 0);
        // 99213 is counted once across both documents
        assert_eq!(report.summary.unique_codes, 3);
        assert_eq!(
            report.summary.message(),
            "Successfully processed 2 file(s) and extracted 3 unique medical codes!"
        );
    }

    #[test]
    fn test_single_document_summary_matches_result() {
        let aggregator = Aggregator::new();
        let report = aggregator.extract_texts(&[("only.txt", "99213 99214 J0171")]);

        assert_eq!(report.combined, report.outcomes[0].codes().unwrap().clone());
        assert_eq!(report.summary.unique_codes, 3);
        assert_eq!(
            report.summary.per_category,
            vec![
                CategoryCount { category: Category::Cpt, count: 2 },
                CategoryCount { category: Category::Hcpcs, count: 1 },
                CategoryCount { category: Category::Pla, count: 0 },
            ]
        );
    }

    #[test]
    fn test_failed_document_is_isolated() {
        let aggregator = Aggregator::new();
        let documents = vec![
            RawDocument::new("first.txt", "99213"),
            RawDocument::new("broken.pdf", "not a pdf"),
            RawDocument::new("third.txt", "G0008 99213"),
        ];

        let report = aggregator.extract_documents(&AutoSource, &documents).unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert!(report.outcomes[0].is_success());
        assert!(!report.outcomes[1].is_success());
        assert_eq!(report.outcomes[1].error().unwrap().document(), "broken.pdf");
        assert!(report.outcomes[2].is_success());

        assert_eq!(report.combined.codes(Category::Cpt), ["99213"]);
        assert_eq!(report.combined.codes(Category::Hcpcs), ["G0008"]);
        assert_eq!(report.summary.documents_processed, 2);
        assert_eq!(report.summary.documents_failed, 1);
        assert!(report.summary.has_failures());
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_fail_fast_aborts_batch() {
        let aggregator = Aggregator::new().with_policy(BatchPolicy::FailFast);
        let documents = vec![
            RawDocument::new("first.txt", "99213"),
            RawDocument::new("scan.png", "binary"),
            RawDocument::new("third.txt", "G0008"),
        ];

        let err = aggregator.extract_documents(&AutoSource, &documents).unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported { ref name } if name == "scan.png"));
    }

    #[test]
    fn test_extract_files_reports_progress_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        std::fs::write(&first, "99213").unwrap();
        std::fs::write(&second, "G0008").unwrap();
        let missing = dir.path().join("gone.pdf");

        let mut seen = Vec::new();
        let report = Aggregator::new()
            .extract_files_with_progress(&AutoSource, &[first, missing, second], |i, total, name| {
                seen.push(format!("{}/{} {}", i, total, name));
            })
            .unwrap();

        assert_eq!(seen, vec!["1/3 first.txt", "2/3 gone.pdf", "3/3 second.txt"]);
        assert_eq!(report.summary.documents_failed, 1);
    }

    #[test]
    fn test_extract_files_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("visit.txt");
        std::fs::write(&present, "Office visit 99214, flu shot G0008").unwrap();
        let missing = dir.path().join("missing.txt");

        let report = Aggregator::new()
            .extract_files(&AutoSource, &[present, missing])
            .unwrap();

        assert_eq!(report.outcomes[0].name, "visit.txt");
        assert_eq!(report.outcomes[0].codes().unwrap().codes(Category::Cpt), ["99214"]);
        assert_eq!(report.outcomes[1].name, "missing.txt");
        assert!(matches!(report.outcomes[1].error(), Some(DecodeError::Io { .. })));
        assert_eq!(report.summary.unique_codes, 2);
    }

    #[test]
    fn test_empty_batch() {
        let aggregator = Aggregator::new();
        let report = aggregator.extract_documents(&AutoSource, &[]).unwrap();

        assert!(report.outcomes.is_empty());
        assert!(report.combined.is_empty());
        assert_eq!(report.summary.documents_processed, 0);
        assert_eq!(report.summary.unique_codes, 0);
    }
}
