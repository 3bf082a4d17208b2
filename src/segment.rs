//! Grouping of an aligned (token, label) sequence into typed segments.

use std::fmt;

use serde::Serialize;

use crate::labeler::LabeledSequence;
use crate::labels::{LabelVocab, BACKGROUND};
use crate::tokenizer::TokenizerService;

const SUBWORD_MARKER: &str = "##";

/// Maximal run of tokens sharing one non-background segment type.
/// `start..end` indexes the aligned sequence; `text` is the display tokens joined by spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledSegment {
    pub kind: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl fmt::Display for LabeledSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: {}", self.kind, self.text)
    }
}

enum GroupState {
    Idle,
    InSegment { kind: String, words: Vec<String>, start: usize, end: usize },
}

impl GroupState {
    fn open(kind: &str, word: String, index: usize) -> Self {
        if kind == BACKGROUND {
            GroupState::Idle
        } else {
            GroupState::InSegment { kind: kind.to_string(), words: vec![word], start: index, end: index + 1 }
        }
    }

    fn step(self, kind: &str, word: String, index: usize, out: &mut Vec<LabeledSegment>) -> Self {
        match self {
            GroupState::Idle => GroupState::open(kind, word, index),
            GroupState::InSegment { kind: current, mut words, start, .. } if current == kind => {
                words.push(word);
                GroupState::InSegment { kind: current, words, start, end: index + 1 }
            }
            open => {
                open.close(out);
                GroupState::open(kind, word, index)
            }
        }
    }

    fn close(self, out: &mut Vec<LabeledSegment>) {
        if let GroupState::InSegment { kind, words, start, end } = self {
            out.push(LabeledSegment { kind, text: words.join(" "), start, end });
        }
    }
}

// every marker occurrence goes, not only a leading one
fn display_word(token: &str) -> String {
    token.replace(SUBWORD_MARKER, "")
}

/// Group display tokens by segment type. Positions flagged in `special` are
/// skipped entirely and never end a segment.
pub fn group_tokens(
    tokens: &[String],
    special: &[bool],
    labels: &[usize],
    vocab: &LabelVocab,
) -> Vec<LabeledSegment> {
    let mut out = Vec::new();
    let mut state = GroupState::Idle;

    for (i, (token, label)) in tokens.iter().zip(labels).enumerate() {
        if special.get(i).copied().unwrap_or(false) {
            continue;
        }
        state = state.step(vocab.segment_type(*label), display_word(token), i, &mut out);
    }
    state.close(&mut out);
    out
}

/// Segments of a labeled sequence, with the tokenizer's special ids excluded.
pub fn group_sequence(
    seq: &LabeledSequence,
    tokenizer: &dyn TokenizerService,
    vocab: &LabelVocab,
) -> Vec<LabeledSegment> {
    let tokens = tokenizer.display_tokens(&seq.ids);
    let special: Vec<bool> = seq.ids.iter().map(|id| tokenizer.is_special(*id)).collect();
    group_tokens(&tokens, &special, &seq.labels, vocab)
}

/// `(kind, start, end)` runs of a bare label sequence.
pub fn label_runs(labels: &[usize], vocab: &LabelVocab) -> Vec<(String, usize, usize)> {
    let tokens = vec![String::new(); labels.len()];
    group_tokens(&tokens, &[], labels, vocab)
        .into_iter()
        .map(|s| (s.kind, s.start, s.end))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::mock::{one_hot, MockClassifier};
    use crate::labeler::{WindowConfig, WindowedLabeler};

    fn toks(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn ids(vocab: &LabelVocab, labels: &[&str]) -> Vec<usize> {
        labels.iter().map(|l| vocab.id(l).unwrap()).collect()
    }

    fn rendered(segs: &[LabeledSegment]) -> Vec<String> {
        segs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn background_gaps_separate_segments() {
        let vocab = LabelVocab::default();
        let labels = ids(&vocab, &["O", "B-TEXT", "I-TEXT", "O", "B-TOOLCALL"]);
        let tokens = toks(&["so", "hello", "there", ".", "search"]);

        let segs = group_tokens(&tokens, &[], &labels, &vocab);
        assert_eq!(rendered(&segs), vec!["[TEXT]: hello there", "[TOOLCALL]: search"]);
        assert_eq!((segs[0].start, segs[0].end), (1, 3));
        assert_eq!((segs[1].start, segs[1].end), (4, 5));
    }

    #[test]
    fn type_change_without_gap_closes_segment() {
        let vocab = LabelVocab::default();
        let labels = ids(&vocab, &["B-THOUGHT", "I-THOUGHT", "B-TOOLCALL", "I-TOOLCALL", "B-TEXT"]);
        let tokens = toks(&["i", "think", "call", "(", "done"]);

        let segs = group_tokens(&tokens, &[], &labels, &vocab);
        assert_eq!(
            rendered(&segs),
            vec!["[THOUGHT]: i think", "[TOOLCALL]: call (", "[TEXT]: done"]
        );
    }

    #[test]
    fn repeated_begin_of_same_type_stays_one_segment() {
        let vocab = LabelVocab::default();
        let labels = ids(&vocab, &["B-TEXT", "I-TEXT", "B-TEXT"]);
        let segs = group_tokens(&toks(&["a", "b", "c"]), &[], &labels, &vocab);
        assert_eq!(rendered(&segs), vec!["[TEXT]: a b c"]);
    }

    #[test]
    fn subword_markers_are_stripped_for_display() {
        let vocab = LabelVocab::default();
        let labels = ids(&vocab, &["B-TEXT", "I-TEXT", "I-TEXT", "I-TEXT"]);
        let segs = group_tokens(&toks(&["play", "##ing", "###", "foo##bar"]), &[], &labels, &vocab);
        assert_eq!(segs[0].text, "play ing # foobar");
    }

    #[test]
    fn special_positions_never_enter_a_segment() {
        let vocab = LabelVocab::default();
        // boundary positions carry a non-background label on purpose
        let labels = ids(&vocab, &["B-TEXT", "I-TEXT", "I-TEXT", "I-TEXT"]);
        let tokens = toks(&["[CLS]", "hi", "there", "[SEP]"]);
        let special = [true, false, false, true];

        let segs = group_tokens(&tokens, &special, &labels, &vocab);
        assert_eq!(rendered(&segs), vec!["[TEXT]: hi there"]);
        assert_eq!((segs[0].start, segs[0].end), (1, 3));
    }

    #[test]
    fn all_background_yields_nothing() {
        let vocab = LabelVocab::default();
        let segs = group_tokens(&toks(&["a", "b"]), &[], &[0, 0], &vocab);
        assert!(segs.is_empty());
        assert!(group_tokens(&[], &[], &[], &vocab).is_empty());
    }

    #[test]
    fn regrouping_normalized_labels_is_stable() {
        let vocab = LabelVocab::default();
        let labels = ids(
            &vocab,
            &["O", "I-TEXT", "B-TEXT", "B-THOUGHT", "O", "O", "I-TOOLRESPONSE", "B-TEXT", "I-TEXT"],
        );
        let tokens = toks(&["a", "b", "c", "d", "e", "f", "g", "h", "i"]);
        let first = group_tokens(&tokens, &[], &labels, &vocab);

        // rewrite as clean BIO from the derived segment types and group again
        let mut relabeled = vec![0usize; labels.len()];
        for seg in &first {
            relabeled[seg.start] = vocab.id(&format!("B-{}", seg.kind)).unwrap();
            for l in &mut relabeled[seg.start + 1..seg.end] {
                *l = vocab.id(&format!("I-{}", seg.kind)).unwrap();
            }
        }
        let second = group_tokens(&tokens, &[], &relabeled, &vocab);
        assert_eq!(first, second);
    }

    #[test]
    fn label_runs_match_grouping() {
        let vocab = LabelVocab::default();
        let labels = ids(&vocab, &["O", "B-TEXT", "I-TEXT", "O", "B-THOUGHT"]);
        assert_eq!(
            label_runs(&labels, &vocab),
            vec![("TEXT".to_string(), 1, 3), ("THOUGHT".to_string(), 4, 5)]
        );
    }

    #[test]
    fn thought_document_becomes_one_segment() {
        let tok = crate::tokenizer::mock::MockTokenizer::new();
        let vocab = LabelVocab::default();
        let b = vocab.id("B-THOUGHT").unwrap();
        let i = vocab.id("I-THOUGHT").unwrap();
        let mut clf = MockClassifier::with_scorer(vocab.len(), move |ids| {
            // position 1 is the first core token
            let mut a = one_hot(ids.len(), 9, i, 1.0);
            a[[1, b]] = 2.0;
            a
        });

        let seq = WindowedLabeler::new(&tok, &mut clf, WindowConfig::default())
            .unwrap()
            .label("THOUGHT: x")
            .unwrap();
        assert_eq!(seq.core_len(), 3);
        assert_eq!(seq.core_labels(), &[b, i, i]);

        let segs = group_sequence(&seq, &tok, &vocab);
        assert_eq!(rendered(&segs), vec!["[THOUGHT]: thought : x"]);
    }

    #[test]
    fn empty_sequence_has_no_segments() {
        let tok = crate::tokenizer::mock::MockTokenizer::new();
        let vocab = LabelVocab::default();
        let mut clf = MockClassifier::new(vocab.len());
        let seq = WindowedLabeler::new(&tok, &mut clf, WindowConfig::default())
            .unwrap()
            .label("")
            .unwrap();
        assert_eq!(seq.labels.len(), 2);
        assert!(group_sequence(&seq, &tok, &vocab).is_empty());
    }
}
