// ============================================================
// Layer 4 — Batcher
// ============================================================
// Groups aligned pairs into padded id matrices for teacher
// forcing:
//
//   encoder_inputs  : source ids                      + <pad>...
//   decoder_inputs  : <bos> target ids                + <pad>...
//   decoder_targets : target ids <eos>                + <pad>...
//
// Example with source "a b c", target "x y":
//   encoder_inputs  = [a, b, c]
//   decoder_inputs  = [<bos>, x, y]
//   decoder_targets = [x, y, <eos>]
//
// All three matrices of one batch share the same width: the
// longest of (source length, target length + 1) in that batch.
// There is no global width; a batch of short sentences stays
// narrow.
//
// `iterate` is lazy: it permutes an index vector once per call
// (when shuffling) and builds each Batch only when the loop
// asks for it.

use rand::{seq::SliceRandom, Rng};

use crate::domain::aligned_pair::AlignedPair;
use crate::domain::constants::{BOS_ID, EOS_ID, PAD_ID};

// ─── Matrix ───────────────────────────────────────────────────────────────────
/// Row-major matrix of token ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<u32>,
}

impl Matrix {
    /// Left-align `sequences` in a `[rows, cols]` matrix filled with the pad id.
    fn padded<I>(sequences: I, rows: usize, cols: usize) -> Self
    where
        I: IntoIterator<Item = Vec<u32>>,
    {
        let mut data = vec![PAD_ID; rows * cols];
        for (r, seq) in sequences.into_iter().enumerate() {
            data[r * cols..r * cols + seq.len()].copy_from_slice(&seq);
        }
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    pub fn row(&self, r: usize) -> &[u32] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Flat row-major view, the layout tensor constructors expect
    pub fn as_slice(&self) -> &[u32] {
        &self.data
    }
}

// ─── Batch ────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub encoder_inputs:  Matrix,
    pub decoder_inputs:  Matrix,
    pub decoder_targets: Matrix,
}

impl Batch {
    /// Build one batch from the given pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = &'a AlignedPair>,
    {
        let pairs: Vec<&AlignedPair> = pairs.into_iter().collect();
        let rows  = pairs.len();
        let width = pairs
            .iter()
            .map(|p| p.source.len().max(p.target.len() + 1))
            .max()
            .unwrap_or(0);

        let encoder_inputs = Matrix::padded(pairs.iter().map(|p| p.source.clone()), rows, width);

        let decoder_inputs = Matrix::padded(
            pairs.iter().map(|p| {
                let mut seq = Vec::with_capacity(p.target.len() + 1);
                seq.push(BOS_ID);
                seq.extend_from_slice(&p.target);
                seq
            }),
            rows,
            width,
        );

        let decoder_targets = Matrix::padded(
            pairs.iter().map(|p| {
                let mut seq = p.target.clone();
                seq.push(EOS_ID);
                seq
            }),
            rows,
            width,
        );

        Self { encoder_inputs, decoder_inputs, decoder_targets }
    }

    /// Number of sentence pairs in the batch
    pub fn len(&self) -> usize {
        self.encoder_inputs.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Padded sequence width shared by all three matrices
    pub fn width(&self) -> usize {
        self.encoder_inputs.cols()
    }
}

// ─── iterate ──────────────────────────────────────────────────────────────────
/// Lazy sequence of batches over `pairs`.
///
/// With `shuffle`, the order is one full random permutation drawn
/// from `rng` at call time; otherwise the input order is kept.
/// Every batch has `batch_size` rows except possibly the last,
/// which holds the remainder.
///
/// # Panics
/// Panics if `batch_size` is 0.
pub fn iterate<'a, R: Rng + ?Sized>(
    pairs:      &'a [AlignedPair],
    batch_size: usize,
    shuffle:    bool,
    rng:        &mut R,
) -> Batches<'a> {
    assert!(batch_size > 0, "batch_size must be positive");

    let mut order: Vec<usize> = (0..pairs.len()).collect();
    if shuffle {
        order.shuffle(rng);
    }

    Batches { pairs, order, batch_size, cursor: 0 }
}

pub struct Batches<'a> {
    pairs:      &'a [AlignedPair],
    order:      Vec<usize>,
    batch_size: usize,
    cursor:     usize,
}

impl Iterator for Batches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let batch = Batch::from_pairs(self.order[self.cursor..end].iter().map(|&i| &self.pairs[i]));
        self.cursor = end;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.order.len() - self.cursor;
        let n = remaining.div_ceil(self.batch_size);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Batches<'_> {}
