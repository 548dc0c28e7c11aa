//! Fact sheet parsing.
//!
//! Line-oriented UTF-8. Recognized lines:
//! - `key = value | alias | alias` (or `key: value | alias`)
//! - markdown table rows `| key | value | alias; alias |`
//!
//! Blank lines, `#` comments, table headers and separator rows are skipped.
//! Anything else is skipped with a warning.

use super::FactEntry;

/// Parse a fact sheet. Never fails; malformed lines are logged and dropped.
pub fn parse_sheet(text: &str) -> Vec<FactEntry> {
    let mut entries: Vec<FactEntry> = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parsed = if line.starts_with('|') {
            parse_table_row(line)
        } else {
            parse_assignment(line)
        };
        match parsed {
            Some(Row::Entry(entry)) => {
                if entries.iter().any(|e| e.key == entry.key) {
                    tracing::warn!(line = idx + 1, key = %entry.key, "duplicate fact key, keeping the first");
                    continue;
                }
                entries.push(entry);
            }
            Some(Row::Skip) => {}
            None => tracing::warn!(line = idx + 1, "skipping malformed fact sheet line"),
        }
    }
    entries
}

enum Row {
    Entry(FactEntry),
    Skip,
}

fn parse_assignment(line: &str) -> Option<Row> {
    let split_at = line.find('=').or_else(|| line.find(':'))?;
    let key = line[..split_at].trim();
    let mut parts = line[split_at + 1..].split('|');
    let value = unquote(parts.next().unwrap_or_default());
    let aliases = parts.map(unquote).filter(|a| !a.is_empty()).collect();
    FactEntry::new(key, value, aliases).map(Row::Entry)
}

fn parse_table_row(line: &str) -> Option<Row> {
    let cells: Vec<&str> = line
        .trim_matches('|')
        .split('|')
        .map(str::trim)
        .collect();
    if cells.iter().all(|c| is_separator_cell(c)) {
        return Some(Row::Skip);
    }
    let header = cells
        .first()
        .map(|c| c.to_ascii_lowercase())
        .is_some_and(|c| matches!(c.as_str(), "key" | "fact" | "name"));
    if header {
        return Some(Row::Skip);
    }
    if cells.len() < 2 {
        return None;
    }
    let aliases = cells
        .get(2)
        .map(|c| {
            c.split([';', ','])
                .map(unquote)
                .filter(|a| !a.is_empty())
                .collect()
        })
        .unwrap_or_default();
    FactEntry::new(cells[0], unquote(cells[1]), aliases).map(Row::Entry)
}

fn is_separator_cell(cell: &str) -> bool {
    let inner = cell.trim_matches(':');
    !inner.is_empty() && inner.chars().all(|c| c == '-')
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    let stripped = s
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')));
    stripped.unwrap_or(s).trim().to_string()
}
