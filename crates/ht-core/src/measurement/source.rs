//! Measurement file parsing.
//!
//! File format: the token `rate:`, a positive rate, then whitespace-separated
//! non-negative inter-event times. Only the first `required` measurements
//! are read; anything after them is ignored without being parsed.

use std::path::Path;

use ht_common::{Error, Result};
use sha2::{Digest, Sha256};

use super::Hypothesis;

/// Header token that must open every data file.
pub const RATE_HEADER: &str = "rate:";

/// Parse a data file's text into a [`Hypothesis`].
///
/// Fails with `MalformedInput` when the header or a token is invalid, and
/// with `InsufficientData` when fewer than `required` measurements follow
/// the header.
pub fn parse_measurements(
    text: &str,
    source_name: &str,
    index: usize,
    required: usize,
) -> Result<Hypothesis> {
    let mut tokens = text.split_whitespace();

    match tokens.next() {
        Some(RATE_HEADER) => {}
        Some(other) => {
            return Err(Error::malformed(
                source_name,
                format!("first token is '{}', expected '{}'", other, RATE_HEADER),
            ))
        }
        None => {
            return Err(Error::malformed(
                source_name,
                format!("file is empty, expected '{}' header", RATE_HEADER),
            ))
        }
    }

    let rate_token = tokens
        .next()
        .ok_or_else(|| Error::malformed(source_name, "missing rate value after header"))?;
    let rate: f64 = rate_token.parse().map_err(|_| {
        Error::malformed(source_name, format!("rate '{}' is not a number", rate_token))
    })?;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(Error::malformed(
            source_name,
            format!("rate {} must be a positive finite number", rate_token),
        ));
    }

    let mut measurements = Vec::with_capacity(required);
    for (position, token) in tokens.take(required).enumerate() {
        let value: f64 = token.parse().map_err(|_| {
            Error::malformed(
                source_name,
                format!("measurement {} ('{}') is not a number", position, token),
            )
        })?;
        if !value.is_finite() || value < 0.0 {
            return Err(Error::malformed(
                source_name,
                format!(
                    "measurement {} ('{}') must be a non-negative finite number",
                    position, token
                ),
            ));
        }
        measurements.push(value);
    }

    if measurements.len() < required {
        return Err(Error::insufficient_measurements(
            source_name,
            required,
            measurements.len(),
        ));
    }

    Ok(Hypothesis {
        index,
        rate,
        measurements,
        source: source_name.to_string(),
        sha256: None,
    })
}

/// Read and parse a data file, recording the SHA-256 of its bytes.
pub fn load_hypothesis(path: &Path, index: usize, required: usize) -> Result<Hypothesis> {
    let bytes = std::fs::read(path)?;
    let digest = hex::encode(Sha256::digest(&bytes));
    let source_name = path.display().to_string();

    tracing::debug!(
        path = %source_name,
        bytes = bytes.len() as u64,
        hypothesis = index as u64,
        "read measurement file"
    );

    let text = std::str::from_utf8(&bytes)
        .map_err(|e| Error::malformed(&source_name, format!("not valid UTF-8: {}", e)))?;

    let mut hypothesis = parse_measurements(text, &source_name, index, required)?;
    hypothesis.sha256 = Some(digest);
    Ok(hypothesis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn expect_malformed(text: &str) -> String {
        match parse_measurements(text, "data.txt", 0, 1) {
            Err(Error::MalformedInput { reason, .. }) => reason,
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn parses_header_and_measurements() {
        let h = parse_measurements("rate: 2.5\n0.1 0.2 0.3 ", "data.txt", 1, 3).unwrap();
        assert_eq!(h.index, 1);
        assert_eq!(h.rate, 2.5);
        assert_eq!(h.measurements, vec![0.1, 0.2, 0.3]);
        assert_eq!(h.source, "data.txt");
    }

    #[test]
    fn reads_only_required_prefix() {
        // Trailing garbage past the required prefix is never parsed.
        let h = parse_measurements("rate: 1 0.5 0.25 junk", "data.txt", 0, 2).unwrap();
        assert_eq!(h.measurements, vec![0.5, 0.25]);
    }

    #[test]
    fn rejects_wrong_header() {
        assert!(expect_malformed("rat: 1 0.5").contains("'rat:'"));
        assert!(expect_malformed("rate:1 0.5").contains("expected 'rate:'"));
        assert!(expect_malformed("   ").contains("empty"));
    }

    #[test]
    fn rejects_bad_rate() {
        assert!(expect_malformed("rate:").contains("missing rate"));
        assert!(expect_malformed("rate: fast 0.5").contains("not a number"));
        assert!(expect_malformed("rate: 0 0.5").contains("positive"));
        assert!(expect_malformed("rate: -1 0.5").contains("positive"));
        assert!(expect_malformed("rate: inf 0.5").contains("positive"));
    }

    #[test]
    fn rejects_bad_measurements() {
        assert!(expect_malformed("rate: 1 abc").contains("not a number"));
        assert!(expect_malformed("rate: 1 -0.5").contains("non-negative"));
        assert!(expect_malformed("rate: 1 NaN").contains("non-negative"));
    }

    #[test]
    fn short_file_is_insufficient() {
        let err = parse_measurements("rate: 1 0.5 0.5", "data.txt", 0, 10).unwrap_err();
        match err {
            Error::InsufficientData { needed, have, .. } => {
                assert_eq!(needed, 10);
                assert_eq!(have, 2);
            }
            other => panic!("expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn load_records_digest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "rate: 1\n1 2 3 ").unwrap();
        let h = load_hypothesis(file.path(), 0, 3).unwrap();
        let digest = h.sha256.unwrap();
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hex::encode(Sha256::digest(b"rate: 1\n1 2 3 ")));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_hypothesis(&dir.path().join("absent.txt"), 0, 1).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
