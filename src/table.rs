use std::borrow::Cow;
use std::fmt::Write as _;

/// Marker appended to cells that carry a validation error.
pub const FLAG_MARKER: &str = " (!)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub flagged: bool,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            flagged: false,
        }
    }

    pub fn flagged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            flagged: true,
        }
    }

    fn rendered(&self) -> Cow<'_, str> {
        let text = single_line(&self.text);
        if self.flagged {
            Cow::Owned(format!("{text}{FLAG_MARKER}"))
        } else {
            text
        }
    }
}

/// Renders `headers` and `rows` as left-aligned columns separated by two
/// spaces, with a dashed rule under the header.
pub fn render_table(headers: &[String], rows: &[Vec<Cell>]) -> String {
    let header_cells = headers
        .iter()
        .map(|h| single_line(h))
        .collect::<Vec<_>>();
    let body = rows
        .iter()
        .map(|row| row.iter().map(Cell::rendered).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    let mut widths = header_cells
        .iter()
        .map(|h| visible_width(h).max(1))
        .collect::<Vec<_>>();
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(visible_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", join_padded(&header_cells, &widths));
    let rule = widths
        .iter()
        .map(|w| Cow::Owned("-".repeat((*w).max(3))))
        .collect::<Vec<Cow<str>>>();
    let rule_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", join_padded(&rule, &rule_widths));
    for row in &body {
        let _ = writeln!(output, "{}", join_padded(row, &widths));
    }
    output
}

fn join_padded(cells: &[Cow<'_, str>], widths: &[usize]) -> String {
    let mut line = String::new();
    for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if idx > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        let padding = width.saturating_sub(visible_width(cell));
        line.extend(std::iter::repeat_n(' ', padding));
    }
    line.truncate(line.trim_end().len());
    line
}

/// Character count, skipping ANSI colour sequences.
fn visible_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;
    for ch in value.chars() {
        match (in_escape, ch) {
            (false, '\u{1b}') => in_escape = true,
            (true, 'm') => in_escape = false,
            (true, _) => {}
            (false, _) => width += 1,
        }
    }
    width
}

fn single_line(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
