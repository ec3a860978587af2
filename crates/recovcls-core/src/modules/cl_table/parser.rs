use crate::domain::ELL_KEY;

pub(super) const FIELD_PREFIX: &str = "Cl-";
const COMMENT_MARKER: char = '#';

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableFormatError {
    #[error("table is empty")]
    EmptySource,
    #[error("first line must be a '#' header listing column names, got '{line}'")]
    MissingHeader { line: String },
    #[error("header lists no column names")]
    EmptyHeader,
    #[error("header has no 'l' column")]
    MissingEllColumn,
    #[error("line {line}: expected {expected} columns, found {actual}")]
    ColumnCount {
        line: usize,
        expected: usize,
        actual: usize,
    },
    #[error("line {line}: cannot parse '{token}' as a number")]
    InvalidNumber { line: usize, token: String },
}

pub(super) fn column_key(name: &str) -> &str {
    if name == ELL_KEY {
        return name;
    }
    name.strip_prefix(FIELD_PREFIX).unwrap_or(name)
}

pub(super) fn parse_header(line: &str) -> Result<Vec<String>, TableFormatError> {
    let trimmed = line.trim_start();
    let Some(names) = trimmed.strip_prefix(COMMENT_MARKER) else {
        return Err(TableFormatError::MissingHeader {
            line: line.trim().to_string(),
        });
    };

    let keys = names
        .split_whitespace()
        .map(|name| column_key(name).to_string())
        .collect::<Vec<_>>();
    if keys.is_empty() {
        return Err(TableFormatError::EmptyHeader);
    }
    if !keys.iter().any(|key| key == ELL_KEY) {
        return Err(TableFormatError::MissingEllColumn);
    }
    Ok(keys)
}

fn is_data_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    !trimmed.is_empty() && !trimmed.starts_with(COMMENT_MARKER)
}

/// Parses numeric rows, each checked against `expected` columns.
/// Line numbers in errors are 1-based and count every source line.
pub(super) fn parse_rows<'a>(
    lines: impl Iterator<Item = (usize, &'a str)>,
    expected: usize,
) -> Result<Vec<Vec<f64>>, TableFormatError> {
    let mut rows = Vec::new();
    for (line_number, line) in lines.filter(|(_, line)| is_data_line(line)) {
        let row = line
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<f64>()
                    .map_err(|_| TableFormatError::InvalidNumber {
                        line: line_number,
                        token: token.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if row.len() != expected {
            return Err(TableFormatError::ColumnCount {
                line: line_number,
                expected,
                actual: row.len(),
            });
        }
        rows.push(row);
    }
    Ok(rows)
}

pub(super) fn numbered_lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source.lines().enumerate().map(|(index, line)| (index + 1, line))
}

/// Transposes rows into one column per header key.
pub(super) fn columns_from_rows(keys: &[String], rows: &[Vec<f64>]) -> Vec<(String, Vec<f64>)> {
    keys.iter()
        .enumerate()
        .map(|(column, key)| (key.clone(), rows.iter().map(|row| row[column]).collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{TableFormatError, column_key, numbered_lines, parse_header, parse_rows};

    #[test]
    fn header_strips_field_prefix_but_keeps_ell() {
        let keys = parse_header("# l Cl-f1z1f1z1 Cl-f1z1f2z1").expect("header should parse");
        assert_eq!(keys, ["l", "f1z1f1z1", "f1z1f2z1"]);
        assert_eq!(column_key("l"), "l");
        assert_eq!(column_key("plain"), "plain");
    }

    #[test]
    fn header_accepts_marker_without_space() {
        let keys = parse_header("#l Cl-f1f1").expect("header should parse");
        assert_eq!(keys, ["l", "f1f1"]);
    }

    #[test]
    fn header_problems_are_reported() {
        assert!(matches!(
            parse_header("2 0.1"),
            Err(TableFormatError::MissingHeader { .. })
        ));
        assert_eq!(parse_header("#   "), Err(TableFormatError::EmptyHeader));
        assert_eq!(parse_header("# Cl-f1f1"), Err(TableFormatError::MissingEllColumn));
    }

    #[test]
    fn rows_must_match_header_width() {
        let source = "# l Cl-a\n2 1.0\n\n3 2.0 9.0\n";
        let error = parse_rows(numbered_lines(source).skip(1), 2).expect_err("row 4 is too wide");
        assert_eq!(
            error,
            TableFormatError::ColumnCount {
                line: 4,
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn rows_parse_scientific_notation_and_skip_comments() {
        let source = "# l a\n# produced by a test\n2 1.5e-10\n3\t-2.0E-11\n";
        let rows = parse_rows(numbered_lines(source).skip(1), 2).expect("rows should parse");
        assert_eq!(rows, vec![vec![2.0, 1.5e-10], vec![3.0, -2.0e-11]]);
    }

    #[test]
    fn invalid_numbers_name_the_token() {
        let error = parse_rows(numbered_lines("2 abc\n"), 2).expect_err("abc is not a number");
        assert_eq!(
            error,
            TableFormatError::InvalidNumber {
                line: 1,
                token: "abc".to_string()
            }
        );
    }
}
