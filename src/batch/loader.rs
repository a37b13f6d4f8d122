//! CSV test-list loader.
//!
//! The first line is a header whose first field starts with `#`, for example
//! `#id_number,test_type,source,destination,count,size`. Data rows starting
//! with `#` are commented out and skipped. Cells may be double-quoted, in
//! which case they can contain commas and `""` stands for one quote.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, warn};

use super::{TestDefinition, DEFAULT_SOURCE};

/// Read and parse a test list from disk.
pub fn load_definitions(path: &Path) -> Result<Vec<TestDefinition>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input file: {}", path.display()))?;
    let defs = parse_definitions(&content)
        .with_context(|| format!("failed to parse input file: {}", path.display()))?;
    debug!(path = %path.display(), rows = defs.len(), "loaded test definitions");
    Ok(defs)
}

/// Parse CSV text into raw definitions. Columns are matched by header name.
pub fn parse_definitions(content: &str) -> Result<Vec<TestDefinition>> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header_line)) = lines.next() else {
        bail!("input is empty; expected a header row starting with '#'");
    };
    if !header_line.trim_start().starts_with('#') {
        bail!("header row must start with '#', found: {}", header_line.trim());
    }
    let header: Vec<String> = split_row(header_line.trim_start().trim_start_matches('#'))
        .map_err(|e| anyhow!("header row: {e}"))?
        .into_iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();

    let mut defs = Vec::new();
    for (line_ref, line) in lines {
        if line.trim_start().starts_with('#') {
            warn!(line = line_ref, row = %line.trim(), "skipping commented-out row");
            continue;
        }

        let mut def = TestDefinition {
            line_ref,
            ..TestDefinition::default()
        };
        let cells = split_row(line).map_err(|e| anyhow!("line {line_ref}: {e}"))?;
        for (column, value) in header.iter().zip(cells) {
            if value.is_empty() {
                continue;
            }
            let value = Some(value);
            match column.as_str() {
                "id_number" => def.id_number = value,
                "test_type" => def.test_type = value,
                "source" => def.source = value,
                "destination" => def.destination = value,
                "count" => def.count = value,
                "size" => def.size = value,
                other => debug!(line = line_ref, column = other, "ignoring unknown column"),
            }
        }
        if def.source.is_none() {
            def.source = Some(DEFAULT_SOURCE.to_string());
        }
        defs.push(def);
    }

    Ok(defs)
}

/// Split one row into trimmed cells.
fn split_row(line: &str) -> Result<Vec<String>, String> {
    let mut cells = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let mut cell = String::new();

        if chars.next_if_eq(&'"').is_some() {
            loop {
                match chars.next() {
                    None => return Err("unterminated quoted cell".into()),
                    Some('"') if chars.next_if_eq(&'"').is_some() => cell.push('"'),
                    Some('"') => break,
                    Some(c) => cell.push(c),
                }
            }
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            if let Some(c) = chars.next_if(|c| *c != ',') {
                return Err(format!("unexpected '{c}' after closing quote"));
            }
        } else {
            while let Some(c) = chars.next_if(|c| *c != ',') {
                cell.push(c);
            }
        }

        cells.push(cell.trim().to_string());
        // Either the separator or the end of the row.
        if chars.next().is_none() {
            return Ok(cells);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
#id_number,test_type,source,destination,count,size
1,latency,probe-a,10.0.0.1,5,
2,throughput,,10.0.0.2,,10M
#3,jitter,probe-a,10.0.0.3,,

4,jitter,probe-b,10.0.0.4,,
";

    #[test]
    fn test_parse_sample() {
        let defs = parse_definitions(SAMPLE).unwrap();
        assert_eq!(defs.len(), 3);

        assert_eq!(defs[0].id_number.as_deref(), Some("1"));
        assert_eq!(defs[0].test_type.as_deref(), Some("latency"));
        assert_eq!(defs[0].count.as_deref(), Some("5"));
        assert_eq!(defs[0].size, None);
        assert_eq!(defs[0].line_ref, 2);

        assert_eq!(defs[1].source.as_deref(), Some(DEFAULT_SOURCE));
        assert_eq!(defs[1].size.as_deref(), Some("10M"));

        assert_eq!(defs[2].id_number.as_deref(), Some("4"));
        assert_eq!(defs[2].line_ref, 6);
    }

    #[test]
    fn test_header_without_hash_is_rejected() {
        let err = parse_definitions("id_number,test_type\n1,latency\n").unwrap_err();
        assert!(err.to_string().contains("must start with '#'"));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(parse_definitions("\n\n").is_err());
    }

    #[test]
    fn test_columns_follow_header_order() {
        let defs = parse_definitions("#destination,id_number,test_type\n8.8.8.8,7,jitter\n").unwrap();
        assert_eq!(defs[0].destination.as_deref(), Some("8.8.8.8"));
        assert_eq!(defs[0].id_number.as_deref(), Some("7"));
        assert_eq!(defs[0].test_type.as_deref(), Some("jitter"));
    }

    #[test]
    fn test_quoted_cells_are_unwrapped() {
        let defs = parse_definitions(
            "#\"id_number\",test_type,source,destination,size
1,\"latency\",\"localhost\",\"10.0.0.1\",
2,throughput, \"probe-a\" ,\"10.0.0.2\",\"10M\"
",
        )
        .unwrap();
        assert_eq!(defs[0].id_number.as_deref(), Some("1"));
        assert_eq!(defs[0].test_type.as_deref(), Some("latency"));
        assert_eq!(defs[0].destination.as_deref(), Some("10.0.0.1"));
        assert_eq!(defs[1].source.as_deref(), Some("probe-a"));
        assert_eq!(defs[1].size.as_deref(), Some("10M"));
    }

    #[test]
    fn test_quoted_comma_does_not_shift_columns() {
        let defs = parse_definitions(
            "#id_number,note,test_type,destination\n1,\"rack 4, \"\"core\"\"\",jitter,10.0.0.1\n",
        )
        .unwrap();
        assert_eq!(defs[0].test_type.as_deref(), Some("jitter"));
        assert_eq!(defs[0].destination.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_split_row_edge_cases() {
        assert_eq!(split_row("a,,b,").unwrap(), vec!["a", "", "b", ""]);
        assert_eq!(split_row("\"\"").unwrap(), vec![""]);
        assert_eq!(split_row("\"a\"\"b\"").unwrap(), vec!["a\"b"]);
        assert!(split_row("1,\"open").is_err());
        assert!(split_row("\"a\"b,c").is_err());
    }

    #[test]
    fn test_unterminated_quote_reports_line() {
        let err = parse_definitions("#id_number,destination\n1,\"10.0.0.1\n").unwrap_err();
        assert!(err.to_string().contains("line 2: unterminated quoted cell"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tests.csv");
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(load_definitions(&path).unwrap().len(), 3);
    }
}
