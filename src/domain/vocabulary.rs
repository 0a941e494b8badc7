use crate::core::{DEFAULT_ALPHABET, OCRError};
use std::path::Path;

/// Ordered symbol set of a recognition model.
///
/// Label `0` is reserved for the CTC blank; label `i > 0` maps to
/// `symbols[i - 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    symbols: Vec<char>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::from_symbols(DEFAULT_ALPHABET.chars())
    }
}

impl Vocabulary {
    /// Builds a vocabulary from symbols in label order (blank excluded).
    pub fn from_symbols(symbols: impl IntoIterator<Item = char>) -> Self {
        Self {
            symbols: symbols.into_iter().collect(),
        }
    }

    /// Reads a character dictionary with one symbol per line.
    ///
    /// Only the first character of each line is used and empty lines are
    /// skipped. With `use_space_char`, a space symbol is appended unless the
    /// dictionary already has one.
    pub fn from_dict_file(path: impl AsRef<Path>, use_space_char: bool) -> Result<Self, OCRError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| OCRError::io_error(path, e))?;
        let mut symbols: Vec<char> = content
            .lines()
            .filter_map(|line| line.trim_end_matches('\r').chars().next())
            .collect();
        if symbols.is_empty() {
            return Err(OCRError::config_error(format!(
                "character dictionary '{}' is empty",
                path.display()
            )));
        }
        if use_space_char && !symbols.contains(&' ') {
            symbols.push(' ');
        }
        Ok(Self { symbols })
    }

    /// Number of model classes, blank included.
    pub fn len(&self) -> usize {
        self.symbols.len() + 1
    }

    /// Always false: the blank is always present.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Label of the CTC blank.
    pub fn blank(&self) -> usize {
        0
    }

    /// Symbol for a label; `None` for the blank or an out-of-range label.
    pub fn symbol(&self, label: usize) -> Option<char> {
        label.checked_sub(1).and_then(|i| self.symbols.get(i).copied())
    }

    /// Label of a symbol, if present.
    pub fn label_of(&self, symbol: char) -> Option<usize> {
        self.symbols.iter().position(|s| *s == symbol).map(|i| i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_alphabet_labels() {
        let vocab = Vocabulary::default();
        assert_eq!(vocab.len(), 97);
        assert_eq!(vocab.symbol(0), None);
        assert_eq!(vocab.symbol(1), Some(' '));
        assert_eq!(vocab.symbol(2), Some('0'));
        assert_eq!(vocab.label_of('€'), Some(44));
        assert_eq!(vocab.symbol(96), Some('z'));
        assert_eq!(vocab.symbol(97), None);
    }

    #[test]
    fn test_dict_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "a\r\nb\n\nc\n").unwrap();
        let vocab = Vocabulary::from_dict_file(file.path(), true).unwrap();
        assert_eq!(vocab.len(), 5);
        assert_eq!(vocab.symbol(3), Some('c'));
        assert_eq!(vocab.symbol(4), Some(' '));

        let vocab = Vocabulary::from_dict_file(file.path(), false).unwrap();
        assert_eq!(vocab.len(), 4);
    }

    #[test]
    fn test_empty_dict_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(Vocabulary::from_dict_file(file.path(), true).is_err());
    }
}
