//! Building a DAFSA from top-level domain data.
//!
//! Each entry is a domain followed by a single ASCII digit, its type code,
//! e.g. `"example1"`. The digit is stored as the small byte `digit & 0x0F`
//! so it stays apart from the printable characters of the domain. Entries
//! usually come from a gperf file:
//!
//! ```text
//! %{
//! // header
//! %}
//! %%
//! example, 1
//! test, 2
//! %%
//! ```

use std::fs;
use std::path::Path;

use log::debug;
use thiserror::Error;

use super::graph::{Dafsa, DafsaError};

/// Errors returned while reading TLD data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TldError {
    /// An entry has no room for both a domain and a type code.
    #[error("entry {line}: {entry:?} is too short")]
    TooShort {
        /// 1-based position of the entry.
        line: usize,
        /// The offending entry.
        entry: String,
    },
    /// An entry does not end in an ASCII digit.
    #[error("entry {line}: {entry:?} does not end in a type code digit")]
    InvalidTypeCode {
        /// 1-based position of the entry.
        line: usize,
        /// The offending entry.
        entry: String,
    },
    /// The gperf text lacks the `%%` lines around its keyword section.
    #[error("gperf input has no complete %% section")]
    MissingSection,
    /// A gperf keyword line is not of the form `domain, N`.
    #[error("line {line}: malformed gperf entry {entry:?}")]
    MalformedEntry {
        /// 1-based line number in the gperf text.
        line: usize,
        /// The offending line.
        entry: String,
    },
    /// Reading the input failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Appending an entry failed.
    #[error(transparent)]
    Dafsa(#[from] DafsaError),
}

fn encode_line(line: usize, entry: &str) -> Result<Vec<u8>, TldError> {
    let mut bytes = entry.as_bytes().to_vec();
    if bytes.len() < 2 {
        return Err(TldError::TooShort {
            line,
            entry: entry.to_owned(),
        });
    }
    let code = bytes.last_mut().expect("entry has at least two bytes");
    if !code.is_ascii_digit() {
        return Err(TldError::InvalidTypeCode {
            line,
            entry: entry.to_owned(),
        });
    }
    *code &= 0x0F;
    Ok(bytes)
}

impl Dafsa<u8> {
    /// Creates a byte DAFSA from TLD entries such as `"example1"`.
    ///
    /// The trailing digit of every entry becomes the byte `digit & 0x0F`.
    /// Only that last digit is the type code: in `"foo12"` the `1` belongs
    /// to the domain and the code is `2`. Use [`parse_gperf`] to reject
    /// multi-digit codes. Entries are appended in the order given; all of
    /// them are checked before the first one is appended.
    ///
    /// ```
    /// use incremental_dafsa::Dafsa;
    ///
    /// let dafsa = Dafsa::from_tld_data(["example1", "example2", "test2"]).unwrap();
    /// assert!(dafsa.contains(b"example\x01"));
    /// assert!(!dafsa.contains(b"example1"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`TldError::TooShort`] for entries shorter than two bytes and
    /// [`TldError::InvalidTypeCode`] for entries not ending in an ASCII digit.
    pub fn from_tld_data<S: AsRef<str>>(
        lines: impl IntoIterator<Item = S>,
    ) -> Result<Self, TldError> {
        let words = lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| encode_line(i + 1, line.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut dafsa = Dafsa::new();
        for word in &words {
            dafsa.append_slice(word)?;
        }
        debug!(
            "built TLD DAFSA from {} entries: {} nodes",
            words.len(),
            dafsa.node_count()
        );
        Ok(dafsa)
    }
}

/// Extracts TLD entries from the keyword section of a gperf file.
///
/// The section lies between the first two lines consisting of `%%`. Every
/// non-blank line in it must read `domain, N` with a single digit `N` and
/// turns into `"domainN"`.
///
/// ```
/// let text = "%{\n%}\n%%\nexample, 1\ntest, 2\n%%\n";
/// let entries = incremental_dafsa::dafsa::tld::parse_gperf(text).unwrap();
/// assert_eq!(entries, ["example1", "test2"]);
/// ```
pub fn parse_gperf(text: &str) -> Result<Vec<String>, TldError> {
    let mut lines = text.lines().enumerate();
    lines
        .by_ref()
        .find(|(_, line)| line.trim_end() == "%%")
        .ok_or(TldError::MissingSection)?;

    let mut entries = Vec::new();
    for (i, line) in lines {
        let line = line.trim_end();
        if line == "%%" {
            debug!("parsed {} gperf entries", entries.len());
            return Ok(entries);
        }
        if line.is_empty() {
            continue;
        }
        let malformed = || TldError::MalformedEntry {
            line: i + 1,
            entry: line.to_owned(),
        };
        let (domain, code) = line.rsplit_once(',').ok_or_else(malformed)?;
        let (domain, code) = (domain.trim(), code.trim());
        if domain.is_empty() || code.len() != 1 || !code.as_bytes()[0].is_ascii_digit() {
            return Err(malformed());
        }
        entries.push(format!("{domain}{code}"));
    }
    Err(TldError::MissingSection)
}

/// Reads a gperf file and extracts its TLD entries with [`parse_gperf`].
pub fn read_gperf_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, TldError> {
    let text = fs::read_to_string(path)?;
    parse_gperf(&text)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn type_code_is_masked() {
        assert_eq!(encode_line(1, "ab7").unwrap(), b"ab\x07");
        assert_eq!(encode_line(1, "x0").unwrap(), b"x\x00");
    }

    #[test]
    fn shared_domain_prefix() {
        let dafsa = Dafsa::from_tld_data(["example1", "example2", "test2"]).unwrap();
        dafsa.verify().unwrap();

        let words: Vec<Vec<u8>> = dafsa.words().collect();
        assert_eq!(
            words,
            [
                b"example\x01".to_vec(),
                b"example\x02".to_vec(),
                b"test\x02".to_vec()
            ]
        );

        let walk = |word: &[u8]| {
            word.iter()
                .try_fold(dafsa.root(), |n, &b| dafsa.node(n).child(b))
                .unwrap()
        };
        let example = walk(b"example".as_slice());
        assert_eq!(dafsa.node(example).child_count(), 2);
        // The type code node after "test" is the one after "example".
        assert_eq!(walk(b"example\x02".as_slice()), walk(b"test\x02".as_slice()));
        assert_eq!(dafsa.node_count(), 15);
        assert_eq!(dafsa.node_count(), dafsa.minimal_node_count());
    }

    #[test]
    fn only_the_last_digit_is_the_type_code() {
        let dafsa = Dafsa::from_tld_data(["foo12"]).unwrap();
        assert!(dafsa.contains(b"foo1\x02"));
        assert!(!dafsa.contains(b"foo\x0c"));
    }

    #[test]
    fn rejects_short_entries() {
        let err = Dafsa::from_tld_data(["ok1", "7"]).unwrap_err();
        assert!(matches!(err, TldError::TooShort { line: 2, .. }), "{err}");
        let err = Dafsa::from_tld_data([""]).unwrap_err();
        assert!(matches!(err, TldError::TooShort { line: 1, .. }));
    }

    #[test]
    fn rejects_missing_type_code() {
        let err = Dafsa::from_tld_data(["example1", "example"]).unwrap_err();
        assert!(matches!(
            err,
            TldError::InvalidTypeCode { line: 2, ref entry } if entry == "example"
        ));
    }

    #[test]
    fn gperf_section() {
        let text = "\
%{
// header, with a comma
%}
struct Domain { const char* name; int type; };
%%
example, 1
a.example, 2

test,3
%%
trailing, 4
";
        let entries = parse_gperf(text).unwrap();
        assert_eq!(entries, ["example1", "a.example2", "test3"]);

        let dafsa = Dafsa::from_tld_data(&entries).unwrap();
        assert!(dafsa.contains(b"a.example\x02"));
        assert!(!dafsa.contains(b"trailing\x04"));
    }

    #[test]
    fn gperf_errors() {
        assert!(matches!(
            parse_gperf("no section here"),
            Err(TldError::MissingSection)
        ));
        assert!(matches!(
            parse_gperf("%%\nexample, 1\n"),
            Err(TldError::MissingSection)
        ));
        assert!(matches!(
            parse_gperf("%%\nexample 1\n%%\n"),
            Err(TldError::MalformedEntry { line: 2, .. })
        ));
        assert!(matches!(
            parse_gperf("%%\nexample, 12\n%%\n"),
            Err(TldError::MalformedEntry { line: 2, .. })
        ));
        assert!(matches!(
            parse_gperf("%%\n, 1\n%%\n"),
            Err(TldError::MalformedEntry { line: 2, .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_gperf_file("/nonexistent/effective_tld_names.gperf").unwrap_err();
        assert!(matches!(err, TldError::Io(_)));
    }
}
