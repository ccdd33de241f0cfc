//! Sparse term-count vectorization of item feature text.
//!
//! ## Algorithm
//! 1. Lowercase the text
//! 2. Split into tokens: maximal runs of alphanumeric or `_` characters,
//!    keeping tokens of two or more characters
//! 3. Drop stop words
//! 4. Emit n-grams over the remaining tokens (unigrams and bigrams by
//!    default, bigram parts joined by a space)
//! 5. Count terms per document into a CSR matrix (documents × vocabulary)
//!
//! There is no document-frequency floor: every term seen at least once is
//! part of the vocabulary, which is sorted lexicographically so identical
//! inputs always produce an identical matrix.

use crate::stopwords::is_stop_word;
use sprs::{CsMat, TriMat};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Learns a vocabulary and produces term counts
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    ngram_range: (usize, usize),
    remove_stop_words: bool,
}

/// Output of [`CountVectorizer::fit_transform`]
#[derive(Debug, Clone)]
pub struct TermCounts {
    /// Vocabulary, column `j` of `matrix` counts `vocabulary[j]`
    pub vocabulary: Vec<String>,
    /// Documents × vocabulary term counts
    pub matrix: CsMat<f64>,
}

impl CountVectorizer {
    /// Word unigrams and bigrams with English stop words removed
    pub fn new() -> Self {
        Self {
            ngram_range: (1, 2),
            remove_stop_words: true,
        }
    }

    /// Configure the n-gram range (default: 1..=2)
    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        let min_n = min_n.max(1);
        self.ngram_range = (min_n, max_n.max(min_n));
        self
    }

    /// Configure stop word removal (default: enabled)
    pub fn with_stop_words(mut self, enabled: bool) -> Self {
        self.remove_stop_words = enabled;
        self
    }

    /// Lowercased tokens of `text` after stop word removal
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|token| token.chars().count() >= 2)
            .filter(|token| !(self.remove_stop_words && is_stop_word(token)))
            .map(str::to_string)
            .collect()
    }

    /// All n-gram terms of `text`, in order of occurrence (with repeats)
    pub fn terms(&self, text: &str) -> Vec<String> {
        let tokens = self.tokenize(text);
        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Learn the vocabulary of `documents` and count every term per document
    pub fn fit_transform<S: AsRef<str>>(&self, documents: &[S]) -> TermCounts {
        let doc_terms: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| self.terms(doc.as_ref()))
            .collect();

        let vocabulary: Vec<String> = doc_terms
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let column_of: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(col, term)| (term.as_str(), col))
            .collect();

        let mut triplets = TriMat::new((documents.len(), vocabulary.len()));
        for (row, terms) in doc_terms.iter().enumerate() {
            let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
            for term in terms {
                if let Some(&col) = column_of.get(term.as_str()) {
                    *counts.entry(col).or_insert(0.0) += 1.0;
                }
            }
            for (col, count) in counts {
                triplets.add_triplet(row, col, count);
            }
        }

        debug!(
            "Vectorized {} documents into {} terms",
            documents.len(),
            vocabulary.len()
        );

        TermCounts {
            vocabulary,
            matrix: triplets.to_csr(),
        }
    }
}

impl Default for CountVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_drops_short_and_stop_words() {
        let vectorizer = CountVectorizer::new();
        let tokens = vectorizer.tokenize("The Dark Knight a Sci-Fi X");
        assert_eq!(tokens, vec!["dark", "knight", "sci", "fi"]);
    }

    #[test]
    fn test_terms_include_bigrams_over_remaining_tokens() {
        let vectorizer = CountVectorizer::new();
        let terms = vectorizer.terms("tom hanks and tim allen");
        assert_eq!(
            terms,
            vec!["tom", "hanks", "tim", "allen", "tom hanks", "hanks tim", "tim allen"]
        );
    }

    #[test]
    fn test_unigram_only_range() {
        let vectorizer = CountVectorizer::new().with_ngram_range(1, 1);
        assert_eq!(vectorizer.terms("space opera"), vec!["space", "opera"]);
    }

    #[test]
    fn test_fit_transform_counts_repeated_terms() {
        let vectorizer = CountVectorizer::new().with_ngram_range(1, 1);
        let counts = vectorizer.fit_transform(&["nolan nolan nolan drama", "comedy"]);

        assert_eq!(counts.vocabulary, vec!["comedy", "drama", "nolan"]);
        assert_eq!(counts.matrix.shape(), (2, 3));
        assert_eq!(counts.matrix.get(0, 2), Some(&3.0));
        assert_eq!(counts.matrix.get(0, 1), Some(&1.0));
        assert_eq!(counts.matrix.get(1, 0), Some(&1.0));
        assert_eq!(counts.matrix.get(1, 2), None);
    }

    #[test]
    fn test_document_without_terms_is_an_empty_row() {
        let vectorizer = CountVectorizer::new();
        let counts = vectorizer.fit_transform(&["the of and", "thriller"]);
        assert_eq!(counts.matrix.shape(), (2, 1));
        assert_eq!(counts.matrix.outer_view(0).map(|row| row.nnz()), Some(0));
    }
}
