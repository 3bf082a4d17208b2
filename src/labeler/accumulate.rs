use anyhow::{bail, Result};
use ndarray::{s, Array2, ArrayView1, ArrayView2};

use crate::labels::BACKGROUND_ID;

/// Running per-label score sums and window counts for every core index.
#[derive(Debug, Clone)]
pub struct ScoreAccumulator {
    totals: Array2<f32>,
    counts: Vec<u32>,
}

impl ScoreAccumulator {
    pub fn new(len: usize, num_labels: usize) -> Self {
        Self { totals: Array2::zeros((len, num_labels)), counts: vec![0; len] }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Add the scores of one window whose first row is core index `start`.
    pub fn add(&mut self, start: usize, scores: ArrayView2<'_, f32>) -> Result<()> {
        let end = start + scores.nrows();
        if end > self.len() {
            bail!("window [{start}, {end}) runs past {} core tokens", self.len());
        }
        if scores.ncols() != self.totals.ncols() {
            bail!("window has {} labels, accumulator has {}", scores.ncols(), self.totals.ncols());
        }
        let mut view = self.totals.slice_mut(s![start..end, ..]);
        view += &scores;
        for c in &mut self.counts[start..end] {
            *c += 1;
        }
        Ok(())
    }

    /// Indices no window has touched.
    pub fn uncovered(&self) -> usize {
        self.counts.iter().filter(|c| **c == 0).count()
    }

    /// Average over contributing windows, then arg-max. Uncovered indices get the background label.
    pub fn finalize(self) -> Vec<usize> {
        self.totals
            .rows()
            .into_iter()
            .zip(self.counts.iter())
            .map(|(row, count)| {
                if *count == 0 {
                    return BACKGROUND_ID;
                }
                let avg = row.mapv(|v| v / *count as f32);
                argmax_row(avg.view())
            })
            .collect()
    }
}

/// Index of the first maximum; ties resolve to the lowest label index.
pub fn argmax_row(row: ArrayView1<'_, f32>) -> usize {
    let mut best = 0usize;
    let mut best_score = f32::NEG_INFINITY;
    for (i, v) in row.iter().enumerate() {
        if *v > best_score {
            best = i;
            best_score = *v;
        }
    }
    best
}
