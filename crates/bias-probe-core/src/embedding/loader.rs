//! Loaders for word2vec-format embedding files.
//!
//! Both layouts start with a `"<count> <dim>"` header line.
//!
//! - **binary**: each entry is the word bytes terminated by a space, then
//!   `dim` little-endian `f32` values, optionally followed by a newline.
//! - **text**: each line is the word followed by `dim` whitespace-separated
//!   floats.
//!
//! Invalid UTF-8 in words is replaced rather than rejected. Words that occur
//! more than once keep their first vector.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{BiasError, BiasResult};

use super::provider::SimilarityProvider;
use super::store::EmbeddingStore;

/// Largest vector width accepted from a file header.
pub const MAX_DIMENSION: usize = 1 << 16;

/// Upper bounds on what is reserved up front from a header; the store grows
/// past them as entries are actually read.
const RESERVE_ENTRIES: usize = 1 << 16;
const RESERVE_FLOATS: usize = 1 << 24;

/// On-disk layout of an embedding file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingFormat {
    /// word2vec binary (`binary=True`)
    #[default]
    Binary,
    /// word2vec text
    Text,
}

impl EmbeddingFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingFormat::Binary => "binary",
            EmbeddingFormat::Text => "text",
        }
    }
}

impl fmt::Display for EmbeddingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingFormat {
    type Err = BiasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "bin" | "w2v" => Ok(EmbeddingFormat::Binary),
            "text" | "txt" | "w2v-text" => Ok(EmbeddingFormat::Text),
            other => Err(BiasError::ConfigError(format!(
                "unsupported embedding format '{}' (expected binary or text)",
                other
            ))),
        }
    }
}

/// Load a word2vec file into an [`EmbeddingStore`].
///
/// `limit` caps the number of entries read from the top of the file.
pub fn load_word2vec(
    path: &Path,
    format: EmbeddingFormat,
    limit: Option<usize>,
) -> BiasResult<EmbeddingStore> {
    let file = File::open(path).map_err(|e| BiasError::io(path, e))?;
    let mut reader = BufReader::new(file);

    let store = match format {
        EmbeddingFormat::Binary => read_binary(&mut reader, path, limit)?,
        EmbeddingFormat::Text => read_text(reader, path, limit)?,
    };

    info!(
        path = %path.display(),
        format = %format,
        words = store.len(),
        dimension = store.dimension(),
        "Loaded embeddings"
    );
    Ok(store)
}

fn parse_header(line: &str, path: &Path) -> BiasResult<(usize, usize)> {
    let mut fields = line.split_whitespace();
    let count = fields.next().and_then(|f| f.parse::<usize>().ok());
    let dim = fields.next().and_then(|f| f.parse::<usize>().ok());
    match (count, dim) {
        (Some(_), Some(dim)) if dim > MAX_DIMENSION => Err(BiasError::parse(
            path,
            1,
            format!("dimension {} exceeds the maximum of {}", dim, MAX_DIMENSION),
        )),
        (Some(count), Some(dim)) if dim > 0 => Ok((count, dim)),
        _ => Err(BiasError::parse(
            path,
            1,
            format!("expected '<count> <dimension>' header, got '{}'", line.trim()),
        )),
    }
}

/// Entries to reserve for a header claiming `to_read` vectors of `dim`.
fn reserved_entries(to_read: usize, dim: usize) -> usize {
    to_read.min(RESERVE_ENTRIES).min(RESERVE_FLOATS / dim)
}

fn read_header<R: BufRead>(reader: &mut R, path: &Path) -> BiasResult<(usize, usize)> {
    let mut header = String::new();
    reader
        .read_line(&mut header)
        .map_err(|e| BiasError::io(path, e))?;
    parse_header(&header, path)
}

pub(crate) fn read_binary<R: BufRead>(
    reader: &mut R,
    path: &Path,
    limit: Option<usize>,
) -> BiasResult<EmbeddingStore> {
    let (count, dim) = read_header(reader, path)?;
    let to_read = limit.map_or(count, |l| l.min(count));
    debug!(count, dim, to_read, "word2vec binary header");

    let byte_width = dim
        .checked_mul(4)
        .ok_or_else(|| BiasError::parse(path, 1, format!("dimension {} is too large", dim)))?;
    let mut store = EmbeddingStore::with_capacity(dim, reserved_entries(to_read, dim));
    let mut word_buf = Vec::with_capacity(64);
    let mut vec_buf = vec![0u8; byte_width];
    let mut vector = vec![0.0f32; dim];
    let mut duplicates = 0usize;

    for entry in 0..to_read {
        word_buf.clear();
        let n = reader
            .read_until(b' ', &mut word_buf)
            .map_err(|e| BiasError::io(path, e))?;
        if n == 0 || word_buf.last() != Some(&b' ') {
            return Err(BiasError::parse(
                path,
                entry + 2,
                format!("file ends after {} of {} entries", entry, count),
            ));
        }
        word_buf.pop();
        let start = word_buf
            .iter()
            .position(|&b| b != b'\n' && b != b'\r')
            .unwrap_or(word_buf.len());
        let word = String::from_utf8_lossy(&word_buf[start..]).into_owned();

        reader
            .read_exact(&mut vec_buf)
            .map_err(|e| BiasError::io(path, e))?;
        for (slot, chunk) in vector.iter_mut().zip(vec_buf.chunks_exact(4)) {
            *slot = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        if !store.insert(word, &vector)? {
            duplicates += 1;
        }
    }

    if duplicates > 0 {
        warn!(duplicates, "Ignored repeated words in embedding file");
    }
    Ok(store)
}

pub(crate) fn read_text<R: BufRead>(
    reader: R,
    path: &Path,
    limit: Option<usize>,
) -> BiasResult<EmbeddingStore> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line.map_err(|e| BiasError::io(path, e))?,
        None => return Err(BiasError::parse(path, 1, "empty embedding file")),
    };
    let (count, dim) = parse_header(&header, path)?;
    let to_read = limit.map_or(count, |l| l.min(count));
    debug!(count, dim, to_read, "word2vec text header");

    let mut store = EmbeddingStore::with_capacity(dim, reserved_entries(to_read, dim));
    let mut vector = Vec::with_capacity(dim);
    let mut duplicates = 0usize;
    let mut read = 0usize;

    for (idx, line) in lines.enumerate() {
        if read >= to_read {
            break;
        }
        let line_num = idx + 2;
        let line = line.map_err(|e| BiasError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let word = match fields.next() {
            Some(w) => w.to_string(),
            None => continue,
        };

        vector.clear();
        for field in fields {
            let value = field.parse::<f32>().map_err(|e| {
                BiasError::parse(path, line_num, format!("invalid float '{}': {}", field, e))
            })?;
            vector.push(value);
        }
        if vector.len() != dim {
            return Err(BiasError::parse(
                path,
                line_num,
                format!("expected {} values for '{}', got {}", dim, word, vector.len()),
            ));
        }

        if !store.insert(word, &vector)? {
            duplicates += 1;
        }
        read += 1;
    }

    if read < to_read {
        warn!(read, expected = to_read, "Embedding file shorter than its header");
    }
    if duplicates > 0 {
        warn!(duplicates, "Ignored repeated words in embedding file");
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn binary_bytes(entries: &[(&str, [f32; 3])], trailing_newline: bool) -> Vec<u8> {
        let mut out = format!("{} 3\n", entries.len()).into_bytes();
        for (word, v) in entries {
            out.extend_from_slice(word.as_bytes());
            out.push(b' ');
            for x in v {
                out.extend_from_slice(&x.to_le_bytes());
            }
            if trailing_newline {
                out.push(b'\n');
            }
        }
        out
    }

    #[test]
    fn test_read_binary_with_newlines() {
        let bytes = binary_bytes(&[("he", [1.0, 0.0, 0.5]), ("she", [0.0, 1.0, -0.5])], true);
        let store = read_binary(&mut Cursor::new(bytes), Path::new("mem"), None).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.words(), &["he".to_string(), "she".to_string()]);
        assert_eq!(store.resolve("she").unwrap(), &[0.0, 1.0, -0.5]);
    }

    #[test]
    fn test_read_binary_without_newlines() {
        let bytes = binary_bytes(&[("a", [1.0, 2.0, 3.0]), ("b", [4.0, 5.0, 6.0])], false);
        let store = read_binary(&mut Cursor::new(bytes), Path::new("mem"), None).unwrap();
        assert_eq!(store.resolve("b").unwrap(), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_read_binary_limit() {
        let bytes = binary_bytes(&[("a", [1.0; 3]), ("b", [2.0; 3]), ("c", [3.0; 3])], true);
        let store = read_binary(&mut Cursor::new(bytes), Path::new("mem"), Some(2)).unwrap();
        assert_eq!(store.len(), 2);
        assert!(!store.contains("c"));
    }

    #[test]
    fn test_read_binary_truncated() {
        let mut bytes = binary_bytes(&[("a", [1.0; 3]), ("b", [2.0; 3])], true);
        bytes.truncate(bytes.len() - 20);
        assert!(read_binary(&mut Cursor::new(bytes), Path::new("mem"), None).is_err());
    }

    #[test]
    fn test_read_text() {
        let text = "2 2\nking 0.5 0.25\nqueen -0.5 0.75\n";
        let store = read_text(Cursor::new(text), Path::new("mem"), None).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.resolve("queen").unwrap(), &[-0.5, 0.75]);
    }

    #[test]
    fn test_read_text_wrong_width_reports_line() {
        let text = "2 2\nking 0.5 0.25\nqueen -0.5\n";
        match read_text(Cursor::new(text), Path::new("mem"), None) {
            Err(BiasError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_header() {
        let text = "not a header\n";
        assert!(matches!(
            read_text(Cursor::new(text), Path::new("mem"), None),
            Err(BiasError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_read_binary_oversized_count_is_parse_error() {
        let mut bytes = b"4611686018427387904 4\nhe ".to_vec();
        for x in [1.0f32, 0.0, 0.0, 0.5] {
            bytes.extend_from_slice(&x.to_le_bytes());
        }
        bytes.push(b'\n');
        assert!(matches!(
            read_binary(&mut Cursor::new(bytes), Path::new("mem"), None),
            Err(BiasError::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn test_oversized_dimension_is_parse_error() {
        let text = "1 4611686018427387904\nhe 1 0\n";
        assert!(matches!(
            read_text(Cursor::new(text), Path::new("mem"), None),
            Err(BiasError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            read_binary(&mut Cursor::new(text.as_bytes()), Path::new("mem"), None),
            Err(BiasError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_reserved_entries_is_bounded() {
        assert_eq!(reserved_entries(10, 300), 10);
        assert_eq!(reserved_entries(usize::MAX, 4), RESERVE_ENTRIES);
        assert_eq!(reserved_entries(usize::MAX, MAX_DIMENSION), RESERVE_FLOATS / MAX_DIMENSION);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("w2v".parse::<EmbeddingFormat>().unwrap(), EmbeddingFormat::Binary);
        assert_eq!("TEXT".parse::<EmbeddingFormat>().unwrap(), EmbeddingFormat::Text);
        assert!("ft".parse::<EmbeddingFormat>().is_err());
    }

    #[test]
    fn test_load_word2vec_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&binary_bytes(&[("man", [1.0, 0.0, 0.0])], true))
            .unwrap();
        let store = load_word2vec(file.path(), EmbeddingFormat::Binary, None).unwrap();
        assert!(store.contains("man"));
    }

    #[test]
    fn test_load_word2vec_missing_file() {
        let err = load_word2vec(Path::new("/no/such/vectors.bin"), EmbeddingFormat::Binary, None)
            .unwrap_err();
        assert!(matches!(err, BiasError::Io { .. }));
    }
}
