//! Plain-text tables for reports.

/// Render rows under a header, padding every column to its widest cell.
pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: Vec<String>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:width$}", c, width = widths[i]))
            .collect();
        padded.join(" | ").trim_end().to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers.iter().map(|h| h.to_string()).collect()));
    out.push('\n');
    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&sep.join("-+-"));
    out.push('\n');
    for row in rows {
        let mut cells: Vec<String> = row.iter().take(widths.len()).cloned().collect();
        cells.resize(widths.len(), String::new());
        out.push_str(&line(cells));
        out.push('\n');
    }
    out.push_str(&format!("({} rows)\n", rows.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_pads_columns() {
        let rows = vec![
            vec!["q1".to_string(), "3".to_string()],
            vec!["query-10".to_string(), "12".to_string()],
        ];
        let out = render(&["id", "plans"], &rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "id       | plans");
        assert_eq!(lines[1], "---------+------");
        assert_eq!(lines[2], "q1       | 3");
        assert_eq!(lines[3], "query-10 | 12");
        assert_eq!(lines[4], "(2 rows)");
    }

    #[test]
    fn test_render_short_rows_and_unicode() {
        let rows = vec![vec!["±5%".to_string()]];
        let out = render(&["spread", "x"], &rows);
        assert!(out.lines().nth(2).unwrap().starts_with("±5%    |"));
    }
}
