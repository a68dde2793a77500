// ============================================================
// Layer 4 — Parallel Corpus Reader
// ============================================================
// Reads two line-aligned text files (line i of the source file
// is the translation of line i of the target file) and turns
// every line into vocabulary ids.
//
// Two length policies exist:
//   Drop(n)     — training: a pair with more than n tokens on
//                 either side is discarded entirely
//   Truncate(n) — scoring: every side is cut to its first n
//                 tokens and no pair is lost
//
// Out-of-vocabulary words become the unknown id; that is a
// lossy mapping, not an error.

use std::{
    fs,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::data::vocab::Vocabulary;
use crate::domain::aligned_pair::AlignedPair;

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("cannot read '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error(
        "parallel files are not aligned: '{source_path}' has {source_lines} lines, \
         '{target_path}' has {target_lines}"
    )]
    LineCountMismatch {
        source_path:  PathBuf,
        source_lines: usize,
        target_path:  PathBuf,
        target_lines: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthPolicy {
    Drop(usize),
    Truncate(usize),
}

/// The surviving pairs of a read, in file order.
#[derive(Debug, Clone, Default)]
pub struct ParallelCorpus {
    pub pairs:   Vec<AlignedPair>,
    /// Pairs discarded for exceeding the length limit
    pub dropped: usize,
}

/// Read a training corpus, dropping pairs longer than `max_len`
/// on either side.
pub fn read_parallel(
    source_path:  &Path,
    target_path:  &Path,
    source_vocab: &Vocabulary,
    target_vocab: &Vocabulary,
    max_len:      usize,
) -> Result<ParallelCorpus, ReaderError> {
    let corpus = read_aligned(
        source_path,
        target_path,
        source_vocab,
        target_vocab,
        LengthPolicy::Drop(max_len),
    )?;
    if corpus.dropped > 0 {
        tracing::info!(
            "Dropped {} of {} sentence pairs longer than {} tokens",
            corpus.dropped,
            corpus.dropped + corpus.pairs.len(),
            max_len
        );
    }
    Ok(corpus)
}

/// Read a held-out corpus, keeping every pair but only the first
/// `max_len` tokens of each side.
pub fn read_truncated(
    source_path:  &Path,
    target_path:  &Path,
    source_vocab: &Vocabulary,
    target_vocab: &Vocabulary,
    max_len:      usize,
) -> Result<Vec<AlignedPair>, ReaderError> {
    read_aligned(
        source_path,
        target_path,
        source_vocab,
        target_vocab,
        LengthPolicy::Truncate(max_len),
    )
    .map(|corpus| corpus.pairs)
}

pub fn read_aligned(
    source_path:  &Path,
    target_path:  &Path,
    source_vocab: &Vocabulary,
    target_vocab: &Vocabulary,
    policy:       LengthPolicy,
) -> Result<ParallelCorpus, ReaderError> {
    let source_lines = read_lines(source_path)?;
    let target_lines = read_lines(target_path)?;

    if source_lines.len() != target_lines.len() {
        return Err(ReaderError::LineCountMismatch {
            source_path:  source_path.to_path_buf(),
            source_lines: source_lines.len(),
            target_path:  target_path.to_path_buf(),
            target_lines: target_lines.len(),
        });
    }

    let mut corpus = ParallelCorpus::default();
    for (src, tgt) in source_lines.iter().zip(&target_lines) {
        let mut pair = AlignedPair::new(
            source_vocab.encode_line(src),
            target_vocab.encode_line(tgt),
        );
        match policy {
            LengthPolicy::Drop(max_len) if !pair.fits(max_len) => {
                corpus.dropped += 1;
                continue;
            }
            LengthPolicy::Drop(_) => {}
            LengthPolicy::Truncate(max_len) => {
                pair.source.truncate(max_len);
                pair.target.truncate(max_len);
            }
        }
        corpus.pairs.push(pair);
    }

    tracing::debug!(
        "Read {} pairs from '{}' / '{}'",
        corpus.pairs.len(),
        source_path.display(),
        target_path.display()
    );
    Ok(corpus)
}

fn read_lines(path: &Path) -> Result<Vec<String>, ReaderError> {
    let io_err = |source| ReaderError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::open(path).map_err(io_err)?;
    BufReader::new(file)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)
}
