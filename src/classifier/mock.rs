use std::collections::VecDeque;

use ndarray::Array2;

use super::{InferenceError, TokenClassifier};

type Scorer = Box<dyn Fn(&[i64]) -> Array2<f32>>;

/// Replays queued responses, then falls back to `scorer`; records every call.
pub struct MockClassifier {
    num_labels: usize,
    responses: VecDeque<Result<Array2<f32>, InferenceError>>,
    scorer: Option<Scorer>,
    calls: Vec<Vec<i64>>,
}

impl MockClassifier {
    pub fn new(num_labels: usize) -> Self {
        Self { num_labels, responses: VecDeque::new(), scorer: None, calls: Vec::new() }
    }

    pub fn with_scorer(num_labels: usize, scorer: impl Fn(&[i64]) -> Array2<f32> + 'static) -> Self {
        Self { scorer: Some(Box::new(scorer)), ..Self::new(num_labels) }
    }

    pub fn push_response(&mut self, resp: Result<Array2<f32>, InferenceError>) {
        self.responses.push_back(resp);
    }

    pub fn calls(&self) -> &[Vec<i64>] {
        &self.calls
    }
}

impl TokenClassifier for MockClassifier {
    fn num_labels(&self) -> usize { self.num_labels }

    fn infer(&mut self, ids: &[i64], _attention_mask: &[i64]) -> Result<Array2<f32>, InferenceError> {
        self.calls.push(ids.to_vec());
        if let Some(resp) = self.responses.pop_front() {
            return resp;
        }
        match &self.scorer {
            Some(f) => Ok(f(ids)),
            None => Err(InferenceError::Unavailable("mock response queue is empty".into())),
        }
    }
}

/// `rows x num_labels` scores with `value` in column `label` and zeros elsewhere.
pub fn one_hot(rows: usize, num_labels: usize, label: usize, value: f32) -> Array2<f32> {
    let mut a = Array2::zeros((rows, num_labels));
    a.column_mut(label).fill(value);
    a
}
