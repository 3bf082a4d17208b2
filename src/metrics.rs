//! Span-level precision / recall / F1 over BIO label sequences.
//!
//! Spans are the runs produced by segment grouping (see [`crate::segment::label_runs`]),
//! so a prediction is scored on exactly what the user would see. A predicted
//! span counts as correct only if its type and both boundaries match a gold span.

use std::collections::{BTreeMap, HashSet};
use std::io::{self, Write};

use serde::Serialize;

use crate::labels::LabelVocab;
use crate::output::presenter::Render;
use crate::segment::label_runs;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpanCounts {
    pub correct: usize,
    pub predicted: usize,
    pub gold: usize,
}

impl SpanCounts {
    pub fn precision(&self) -> f64 { ratio(self.correct, self.predicted) }
    pub fn recall(&self) -> f64 { ratio(self.correct, self.gold) }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }

    fn scores(&self) -> SpanScores {
        SpanScores { precision: self.precision(), recall: self.recall(), f1: self.f1(), support: self.gold }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpanScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Accumulates counts over many documents.
#[derive(Debug, Default, Clone)]
pub struct Evaluation {
    overall: SpanCounts,
    by_type: BTreeMap<String, SpanCounts>,
    tokens_correct: usize,
    tokens_total: usize,
    documents: usize,
}

impl Evaluation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score one document. `gold` and `pred` are core labels (no boundary positions).
    pub fn add(&mut self, gold: &[usize], pred: &[usize], vocab: &LabelVocab) -> SpanCounts {
        let n = gold.len().min(pred.len());
        self.tokens_total += n;
        self.tokens_correct += gold.iter().zip(pred).filter(|(g, p)| g == p).count();
        self.documents += 1;

        let gold_spans = label_runs(&gold[..n], vocab);
        let pred_spans = label_runs(&pred[..n], vocab);
        let gold_set: HashSet<&(String, usize, usize)> = gold_spans.iter().collect();

        let mut doc = SpanCounts { gold: gold_spans.len(), predicted: pred_spans.len(), correct: 0 };
        for span in &gold_spans {
            self.by_type.entry(span.0.clone()).or_default().gold += 1;
        }
        for span in &pred_spans {
            let entry = self.by_type.entry(span.0.clone()).or_default();
            entry.predicted += 1;
            if gold_set.contains(span) {
                entry.correct += 1;
                doc.correct += 1;
            }
        }

        self.overall.correct += doc.correct;
        self.overall.predicted += doc.predicted;
        self.overall.gold += doc.gold;
        doc
    }

    pub fn report(&self) -> EvalReport {
        EvalReport {
            documents: self.documents,
            overall: self.overall.scores(),
            by_type: self.by_type.iter().map(|(k, v)| (k.clone(), v.scores())).collect(),
            token_accuracy: ratio(self.tokens_correct, self.tokens_total),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvalReport {
    pub documents: usize,
    pub overall: SpanScores,
    pub by_type: BTreeMap<String, SpanScores>,
    pub token_accuracy: f64,
}

impl Render for EvalReport {
    fn render_text(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "documents: {}", self.documents)?;
        writeln!(w, "{:<16} {:>9} {:>9} {:>9} {:>8}", "type", "precision", "recall", "f1", "support")?;
        for (kind, s) in &self.by_type {
            writeln!(w, "{:<16} {:>9.4} {:>9.4} {:>9.4} {:>8}", kind, s.precision, s.recall, s.f1, s.support)?;
        }
        let o = &self.overall;
        writeln!(w, "{:<16} {:>9.4} {:>9.4} {:>9.4} {:>8}", "overall", o.precision, o.recall, o.f1, o.support)?;
        writeln!(w, "token accuracy: {:.4}", self.token_accuracy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(vocab: &LabelVocab, labels: &[&str]) -> Vec<usize> {
        labels.iter().map(|l| vocab.id(l).unwrap()).collect()
    }

    #[test]
    fn exact_match_scores_one() {
        let vocab = LabelVocab::default();
        let gold = ids(&vocab, &["B-THOUGHT", "I-THOUGHT", "O", "B-TEXT"]);
        let mut ev = Evaluation::new();
        let doc = ev.add(&gold, &gold, &vocab);
        assert_eq!(doc, SpanCounts { correct: 2, predicted: 2, gold: 2 });

        let r = ev.report();
        assert_eq!(r.overall.f1, 1.0);
        assert_eq!(r.token_accuracy, 1.0);
        assert_eq!(r.by_type.len(), 2);
    }

    #[test]
    fn boundary_mismatch_is_not_a_hit() {
        let vocab = LabelVocab::default();
        let gold = ids(&vocab, &["B-TEXT", "I-TEXT", "I-TEXT", "O"]);
        let pred = ids(&vocab, &["B-TEXT", "I-TEXT", "O", "O"]);
        let mut ev = Evaluation::new();
        ev.add(&gold, &pred, &vocab);

        let r = ev.report();
        assert_eq!(r.overall.precision, 0.0);
        assert_eq!(r.overall.recall, 0.0);
        assert_eq!(r.overall.f1, 0.0);
        assert_eq!(r.token_accuracy, 0.75);
    }

    #[test]
    fn partial_credit_across_documents() {
        let vocab = LabelVocab::default();
        let mut ev = Evaluation::new();
        // doc 1: one of two gold spans found, plus one spurious span
        let gold = ids(&vocab, &["B-THOUGHT", "O", "B-TEXT", "I-TEXT"]);
        let pred = ids(&vocab, &["B-THOUGHT", "B-TOOLCALL", "O", "O"]);
        ev.add(&gold, &pred, &vocab);
        // doc 2: nothing to find, nothing predicted
        ev.add(&[0, 0], &[0, 0], &vocab);

        let r = ev.report();
        assert_eq!(r.documents, 2);
        assert_eq!(r.overall.precision, 0.5);
        assert_eq!(r.overall.recall, 0.5);
        assert_eq!(r.overall.f1, 0.5);
        assert_eq!(r.by_type["THOUGHT"].f1, 1.0);
        assert_eq!(r.by_type["TEXT"].recall, 0.0);
        assert_eq!(r.by_type["TOOLCALL"].precision, 0.0);
        assert_eq!(r.by_type["TOOLCALL"].support, 0);
    }

    #[test]
    fn empty_evaluation_reports_zeros() {
        let r = Evaluation::new().report();
        assert_eq!(r.documents, 0);
        assert_eq!(r.overall.f1, 0.0);
        assert_eq!(r.token_accuracy, 0.0);

        let mut buf: Vec<u8> = Vec::new();
        r.render_text(&mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("token accuracy: 0.0000"));
    }
}
