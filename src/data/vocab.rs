// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Bidirectional word ↔ id table for one side of the corpus.
//
// Construction:
//   1. Split every line on whitespace and count each word
//   2. Rank words by descending frequency; ties are broken
//      by ascending lexicographic order so two builds from
//      the same corpus always produce the same table
//   3. Keep the top `max_size - 3` words
//   4. Assign ids sequentially after the reserved ids:
//        0 = <pad>, 1 = <eos> (also the start marker), 2 = <unk>
//
// Once built the table is never mutated. It is persisted as
// JSON where the array position of a word is its id:
//
//   { "max_size": 50000, "words": ["<pad>", "<eos>", "<unk>", "the", ...] }

use std::{
    collections::HashMap,
    fmt,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::domain::constants::{EOS, NUM_RESERVED, PAD, UNK, UNK_ID};

/// Errors raised while reading or writing a vocabulary file.
#[derive(Debug, thiserror::Error)]
pub enum VocabError {
    #[error("cannot access vocabulary file '{path}': {source}")]
    Io {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("malformed vocabulary file '{path}': {source}")]
    Json {
        path:   PathBuf,
        source: serde_json::Error,
    },

    #[error("corrupt vocabulary file '{path}': {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// On-disk representation
#[derive(Serialize, Deserialize)]
struct VocabFile {
    max_size: usize,
    words:    Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    /// id → word
    words:    Vec<String>,
    /// word → id
    index:    HashMap<String, u32>,
    max_size: usize,
}

impl Vocabulary {
    /// Build a vocabulary from an iterator of corpus lines.
    ///
    /// The reserved symbol strings are never counted as corpus
    /// words, so they keep exactly one id each.
    pub fn build<I, S>(lines: I, max_size: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut freq: HashMap<String, usize> = HashMap::new();
        for line in lines {
            for word in line.as_ref().split_whitespace() {
                if is_reserved(word) {
                    continue;
                }
                *freq.entry(word.to_string()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_size.saturating_sub(NUM_RESERVED));

        let words = [PAD, EOS, UNK]
            .into_iter()
            .map(str::to_string)
            .chain(ranked.into_iter().map(|(w, _)| w))
            .collect();

        Self::from_words(words, max_size)
    }

    /// Build a vocabulary from a whitespace-tokenised text file.
    pub fn build_from_file(path: &Path, max_size: usize) -> Result<Self, VocabError> {
        let file = fs::File::open(path).map_err(|source| VocabError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let lines = BufReader::new(file)
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| VocabError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::build(lines, max_size))
    }

    fn from_words(words: Vec<String>, max_size: usize) -> Self {
        let index = words
            .iter()
            .enumerate()
            .map(|(id, w)| (w.clone(), id as u32))
            .collect();
        Self { words, index, max_size }
    }

    /// Number of ids in use, reserved ids included
    pub fn size(&self) -> usize {
        self.words.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn id_of(&self, word: &str) -> u32 {
        self.index.get(word).copied().unwrap_or(UNK_ID)
    }

    /// The unknown id, and any id outside the table, decode to `<unk>`.
    pub fn word_of(&self, id: u32) -> &str {
        if id == UNK_ID {
            return UNK;
        }
        self.words.get(id as usize).map(String::as_str).unwrap_or(UNK)
    }

    pub fn ids_of<'a, I>(&self, words: I) -> Vec<u32>
    where
        I: IntoIterator<Item = &'a str>,
    {
        words.into_iter().map(|w| self.id_of(w)).collect()
    }

    pub fn words_of(&self, ids: &[u32]) -> Vec<&str> {
        ids.iter().map(|&id| self.word_of(id)).collect()
    }

    /// Tokenise a raw line on whitespace and map it to ids
    pub fn encode_line(&self, line: &str) -> Vec<u32> {
        self.ids_of(line.split_whitespace())
    }

    /// Render ids back to a space-separated line
    pub fn decode_line(&self, ids: &[u32]) -> String {
        self.words_of(ids).join(" ")
    }

    /// Write the table as JSON, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), VocabError> {
        let file = VocabFile {
            max_size: self.max_size,
            words:    self.words.clone(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| VocabError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| VocabError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Saved vocabulary ({} words) to '{}'", self.size(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, VocabError> {
        let json = fs::read_to_string(path).map_err(|source| VocabError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: VocabFile = serde_json::from_str(&json).map_err(|source| VocabError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        let corrupt = |reason: String| VocabError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        if file.words.len() < NUM_RESERVED
            || file.words[..NUM_RESERVED] != [PAD, EOS, UNK]
        {
            return Err(corrupt("reserved symbols missing or out of place".into()));
        }
        if file.words.len() > file.max_size.max(NUM_RESERVED) {
            return Err(corrupt(format!(
                "{} words exceed max_size {}",
                file.words.len(),
                file.max_size
            )));
        }

        let vocab = Self::from_words(file.words, file.max_size);
        if vocab.index.len() != vocab.words.len() {
            return Err(corrupt("duplicate words".into()));
        }
        Ok(vocab)
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vocabulary(size={}, max_size={})", self.size(), self.max_size)
    }
}

fn is_reserved(word: &str) -> bool {
    word == PAD || word == EOS || word == UNK
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::constants::{EOS_ID, PAD_ID};

    fn sample() -> Vocabulary {
        Vocabulary::build(["the cat sat", "the dog sat", "a cat"], 100)
    }

    #[test]
    fn test_reserved_ids_come_first() {
        let v = sample();
        assert_eq!(v.word_of(PAD_ID), PAD);
        assert_eq!(v.word_of(EOS_ID), EOS);
        assert_eq!(v.word_of(UNK_ID), UNK);
    }

    #[test]
    fn test_known_words_round_trip() {
        let v = sample();
        for word in ["the", "cat", "sat", "dog", "a"] {
            assert_eq!(v.word_of(v.id_of(word)), word);
        }
    }

    #[test]
    fn test_unknown_word_maps_to_unk() {
        let v = sample();
        assert_eq!(v.id_of("zebra"), UNK_ID);
        assert_eq!(v.words_of(&v.ids_of(["zebra"])), vec![UNK]);
        // ids beyond the table also decode to <unk>
        assert_eq!(v.word_of(9999), UNK);
    }

    #[test]
    fn test_frequency_order_with_lexicographic_tie_break() {
        let v = sample();
        // "cat", "sat", "the" all occur twice → alphabetical
        assert_eq!(v.id_of("cat"), 3);
        assert_eq!(v.id_of("sat"), 4);
        assert_eq!(v.id_of("the"), 5);
        // "a" and "dog" occur once
        assert_eq!(v.id_of("a"), 6);
        assert_eq!(v.id_of("dog"), 7);
    }

    #[test]
    fn test_size_is_capped_at_max_size() {
        let v = Vocabulary::build(["a b c d e f g"], 5);
        assert_eq!(v.size(), 5);
        // only two learned words fit; ties resolved alphabetically
        assert_eq!(v.id_of("a"), 3);
        assert_eq!(v.id_of("b"), 4);
        assert_eq!(v.id_of("c"), UNK_ID);
    }

    #[test]
    fn test_empty_corpus_still_has_reserved_ids() {
        let v = Vocabulary::build(Vec::<String>::new(), 10);
        assert_eq!(v.size(), 3);
    }

    #[test]
    fn test_reserved_strings_in_corpus_are_not_duplicated() {
        let v = Vocabulary::build(["<unk> <pad> word <eos>"], 10);
        assert_eq!(v.size(), 4);
        assert_eq!(v.id_of("<unk>"), UNK_ID);
        assert_eq!(v.id_of("word"), 3);
    }

    #[test]
    fn test_encode_and_decode_line() {
        let v = sample();
        let ids = v.encode_line("  the   zebra sat ");
        assert_eq!(ids, vec![5, UNK_ID, 4]);
        assert_eq!(v.decode_line(&ids), "the <unk> sat");
    }

    #[test]
    fn test_build_is_deterministic() {
        let lines = ["x y z x y z", "q r s"];
        assert_eq!(Vocabulary::build(lines, 6), Vocabulary::build(lines, 6));
    }

    #[test]
    fn test_save_and_load() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.json");
        let v    = sample();

        v.save(&path).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        // saving again overwrites with identical bytes
        v.save(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), first);

        let loaded = Vocabulary::load(&path).unwrap();
        assert_eq!(loaded, v);
    }

    #[test]
    fn test_load_rejects_missing_reserved_symbols() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.json");
        std::fs::write(&path, r#"{"max_size": 10, "words": ["a", "b", "c"]}"#).unwrap();
        assert!(matches!(Vocabulary::load(&path), Err(VocabError::Corrupt { .. })));
    }

    #[test]
    fn test_load_rejects_duplicates() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.json");
        std::fs::write(
            &path,
            r#"{"max_size": 10, "words": ["<pad>", "<eos>", "<unk>", "a", "a"]}"#,
        )
        .unwrap();
        assert!(matches!(Vocabulary::load(&path), Err(VocabError::Corrupt { .. })));
    }
}
