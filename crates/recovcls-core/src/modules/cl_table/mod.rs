//! Readers for the spectrum tables written by the simulation.
//!
//! Recovered spectra come as one table with a `# l Cl-<field> ...` header and
//! one row per multipole. Input theory spectra come as one headerless
//! two-column file (`l`, `Cl`) per field.

mod parser;

pub use parser::TableFormatError;

use crate::domain::{CheckError, CheckResult, ClSeries, ELL_KEY, SeriesError};
use parser::{columns_from_rows, numbered_lines, parse_header, parse_rows};
use std::fs;
use std::path::Path;

pub fn load_cl_table(path: &Path) -> CheckResult<ClSeries> {
    let source = read_table_source(path, "recovered Cl table")?;
    parse_cl_table(&source, &path.display().to_string())
}

pub fn parse_cl_table(source: &str, origin: &str) -> CheckResult<ClSeries> {
    let mut lines = numbered_lines(source).skip_while(|(_, line)| line.trim().is_empty());
    let (_, header_line) = lines
        .next()
        .ok_or_else(|| CheckError::table_format(origin, TableFormatError::EmptySource))?;

    let keys = parse_header(header_line).map_err(|error| CheckError::table_format(origin, error))?;
    let rows = parse_rows(lines, keys.len()).map_err(|error| CheckError::table_format(origin, error))?;

    let mut ell = Vec::new();
    let mut fields = Vec::with_capacity(keys.len().saturating_sub(1));
    for (key, values) in columns_from_rows(&keys, &rows) {
        if key == ELL_KEY {
            ell = values;
        } else {
            fields.push((key, values));
        }
    }

    series_or_format_error(ell, fields, origin)
}

/// Loads one headerless `l Cl` file as a series holding the single `field`.
pub fn load_two_column(path: &Path, field: &str) -> CheckResult<ClSeries> {
    let source = read_table_source(path, "input Cl file")?;
    parse_two_column(&source, &path.display().to_string(), field)
}

pub fn parse_two_column(source: &str, origin: &str, field: &str) -> CheckResult<ClSeries> {
    let rows = parse_rows(numbered_lines(source), 2)
        .map_err(|error| CheckError::table_format(origin, error))?;
    let ell = rows.iter().map(|row| row[0]).collect();
    let cl = rows.iter().map(|row| row[1]).collect();
    series_or_format_error(ell, vec![(field.to_string(), cl)], origin)
}

fn series_or_format_error(
    ell: Vec<f64>,
    fields: Vec<(String, Vec<f64>)>,
    origin: &str,
) -> CheckResult<ClSeries> {
    ClSeries::new(ell, fields).map_err(|error: SeriesError| CheckError::table_format(origin, error))
}

fn read_table_source(path: &Path, what: &str) -> CheckResult<String> {
    if !path.is_file() {
        return Err(CheckError::missing_input_file(path, what));
    }
    fs::read_to_string(path).map_err(|source| {
        CheckError::io_system(
            "IO.CL_TABLE_READ",
            format!("failed to read {} '{}': {}", what, path.display(), source),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{load_cl_table, load_two_column, parse_cl_table, parse_two_column};
    use crate::domain::errors::{CL_TABLE_FORMAT, MISSING_INPUT_FILE};
    use std::fs;
    use tempfile::TempDir;

    const RECOVERED: &str = "\
# l Cl-f1z1f1z1 Cl-f1z1f2z1
2 1.0e-5 2.0e-6
3 8.0e-6 1.5e-6
4 6.0e-6 1.0e-6
";

    #[test]
    fn recovered_table_is_keyed_by_bare_field_names() {
        let series = parse_cl_table(RECOVERED, "recov.dat").expect("table should parse");

        assert_eq!(series.len(), 3);
        assert_eq!(series.ell(), &[2.0, 3.0, 4.0]);
        assert_eq!(
            series.field_keys().collect::<Vec<_>>(),
            ["f1z1f1z1", "f1z1f2z1"]
        );
        assert_eq!(series.field("f1z1f2z1"), Some(&[2.0e-6, 1.5e-6, 1.0e-6][..]));
    }

    #[test]
    fn ell_column_need_not_come_first() {
        let series = parse_cl_table("# Cl-a l\n0.5 2\n0.25 3\n", "recov.dat").expect("table should parse");
        assert_eq!(series.ell(), &[2.0, 3.0]);
        assert_eq!(series.field("a"), Some(&[0.5, 0.25][..]));
    }

    #[test]
    fn ragged_rows_are_format_errors() {
        let error = parse_cl_table("# l Cl-a\n2 1.0\n3\n", "recov.dat").expect_err("row 3 is short");
        assert_eq!(error.code(), CL_TABLE_FORMAT);
        assert!(error.message().contains("line 3: expected 2 columns, found 1"));
    }

    #[test]
    fn header_only_table_is_rejected() {
        let error = parse_cl_table("# l Cl-a\n", "recov.dat").expect_err("no rows");
        assert_eq!(error.code(), CL_TABLE_FORMAT);
        assert!(error.message().contains("no rows"));
    }

    #[test]
    fn two_column_file_becomes_single_field_series() {
        let series = parse_two_column("# theory\n2 0.1\n3 0.2\n4 0.3\n", "in.dat", "f1f1")
            .expect("input file should parse");
        assert_eq!(series.field_keys().collect::<Vec<_>>(), ["f1f1"]);
        assert_eq!(series.field("f1f1"), Some(&[0.1, 0.2, 0.3][..]));

        let error = parse_two_column("2 0.1 0.2\n", "in.dat", "f1f1").expect_err("three columns");
        assert_eq!(error.code(), CL_TABLE_FORMAT);
    }

    #[test]
    fn loaders_report_missing_files() {
        let temp = TempDir::new().expect("tempdir should be created");
        let missing = temp.path().join("nope.dat");

        let error = load_cl_table(&missing).expect_err("file does not exist");
        assert_eq!(error.code(), MISSING_INPUT_FILE);
        let error = load_two_column(&missing, "f1f1").expect_err("file does not exist");
        assert_eq!(error.code(), MISSING_INPUT_FILE);
    }

    #[test]
    fn loaders_read_files_from_disk() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("recov.dat");
        fs::write(&path, RECOVERED).expect("table should be written");

        let series = load_cl_table(&path).expect("table should load");
        assert_eq!(series.ell_max(), 4.0);
    }
}
