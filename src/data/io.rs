//! Whitespace-separated `Q I dI` text input.
//!
//! Rows whose first three tokens do not all parse as `f64` (headers,
//! comments, blank lines) are skipped silently. Columns past the third are
//! ignored. The parsed columns go through [`ScatteringData::new`], so the
//! reader returns the same validated container as the array constructor.
use crate::data::{
    errors::{DataError, DataResult},
    scattering::ScatteringData,
};
use ndarray::Array1;
use std::path::Path;

impl ScatteringData {
    /// Parse a three-column `Q I dI` table held in memory.
    ///
    /// Errors
    /// ------
    /// - `DataError::NoNumericRows` when no row parses.
    /// - Any validation error from [`ScatteringData::new`].
    pub fn from_text(text: &str) -> DataResult<Self> {
        let mut q = Vec::new();
        let mut intensity = Vec::new();
        let mut uncertainty = Vec::new();

        for line in text.lines() {
            if let Some([q_val, i_val, di_val]) = parse_row(line) {
                q.push(q_val);
                intensity.push(i_val);
                uncertainty.push(di_val);
            }
        }
        if q.is_empty() {
            return Err(DataError::NoNumericRows);
        }

        ScatteringData::new(Array1::from(q), Array1::from(intensity), Array1::from(uncertainty))
    }
}

/// Read a three-column `Q I dI` file from disk.
///
/// Errors
/// ------
/// - `DataError::Io` when the file cannot be read.
/// - Anything [`ScatteringData::from_text`] returns.
pub fn read_three_column<P: AsRef<Path>>(path: P) -> DataResult<ScatteringData> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|err| DataError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    ScatteringData::from_text(&text)
}

fn parse_row(line: &str) -> Option<[f64; 3]> {
    let mut tokens = line.split_whitespace();
    let mut row = [0.0; 3];
    for slot in row.iter_mut() {
        *slot = tokens.next()?.parse::<f64>().ok()?;
    }
    Some(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Header and comment rows are skipped; numeric rows are kept in order.
    //
    // Given
    // -----
    // - A header line, a comment, two numeric rows (one with a 4th column),
    //   and a trailing blank line.
    //
    // Expect
    // ------
    // - Two points with the expected Q, I and dI.
    fn from_text_skips_non_numeric_rows() {
        let text = "Q I dI\n# sample\n0.01 10.0 0.5\n0.02 8.0 0.4 0.001\n\n";

        let curve = ScatteringData::from_text(text).expect("two rows parse");

        assert_eq!(curve.q, array![0.01, 0.02]);
        assert_eq!(curve.intensity, array![10.0, 8.0]);
        assert_eq!(curve.uncertainty, array![0.5, 0.4]);
    }

    #[test]
    // Purpose
    // -------
    // Text without any numeric row is an error rather than an empty curve.
    //
    // Given
    // -----
    // - Header-only input and a row with only two columns.
    //
    // Expect
    // ------
    // - `DataError::NoNumericRows`.
    fn from_text_requires_a_numeric_row() {
        let result = ScatteringData::from_text("Q I dI\n0.1 2.0\n");

        assert_eq!(result.unwrap_err(), DataError::NoNumericRows);
    }

    #[test]
    // Purpose
    // -------
    // Missing files surface as `DataError::Io` carrying the path.
    //
    // Given
    // -----
    // - A path that does not exist.
    //
    // Expect
    // ------
    // - `DataError::Io { path, .. }` with the same path string.
    fn read_three_column_reports_missing_file() {
        let path = "definitely/not/here.txt";

        let err = read_three_column(path).unwrap_err();

        assert!(matches!(err, DataError::Io { ref path, .. } if path == "definitely/not/here.txt"));
    }
}
