#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ConfigEntry {
    pub(super) key: String,
    pub(super) value: String,
    pub(super) source_line: usize,
}

pub(super) fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(data, _)| data)
}

/// Splits `key : value` on the first colon; the value keeps inner spaces
/// but loses surrounding whitespace and tabs.
pub(super) fn parse_entry_line(line: &str, source_line: usize) -> Option<ConfigEntry> {
    let data = strip_comment(line);
    let (key, value) = data.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    Some(ConfigEntry {
        key: key.to_string(),
        value: value.trim().to_string(),
        source_line,
    })
}

pub(super) fn parse_config_entries(source: &str) -> Vec<ConfigEntry> {
    source
        .lines()
        .enumerate()
        .filter_map(|(index, line)| parse_entry_line(line, index + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{parse_config_entries, parse_entry_line, strip_comment};

    #[test]
    fn comments_are_stripped_before_splitting() {
        assert_eq!(strip_comment("NSIDE: 64 # resolution"), "NSIDE: 64 ");
        assert_eq!(strip_comment("# only a comment"), "");
        assert!(parse_entry_line("# RECOVCLS_OUT: out.dat", 1).is_none());
    }

    #[test]
    fn value_is_trimmed_of_tabs_and_spaces() {
        let entry = parse_entry_line("CL_PREFIX:\t in/theory_ \t# inputs", 7)
            .expect("line should parse");
        assert_eq!(entry.key, "CL_PREFIX");
        assert_eq!(entry.value, "in/theory_");
        assert_eq!(entry.source_line, 7);
    }

    #[test]
    fn only_first_colon_separates_key_and_value() {
        let entry = parse_entry_line("RECOVCLS_OUT: C:/runs/recov.dat", 1).expect("line should parse");
        assert_eq!(entry.value, "C:/runs/recov.dat");
    }

    #[test]
    fn lines_without_colon_are_ignored() {
        let entries = parse_config_entries("\nFIELDS_INFO\nNSIDE: 32\n   \n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source_line, 3);
    }
}
