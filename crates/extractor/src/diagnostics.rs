/// Lines of source shown on each side of a syntax error
const CONTEXT_LINES: usize = 2;

/// Render the source around a 1-based `line`/`column` with a `^` pointer
/// under the offending column.
#[must_use]
pub fn source_context(source: &str, line: usize, column: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    if lines.is_empty() || line == 0 {
        return String::new();
    }

    let target = line.min(lines.len());
    let first = target.saturating_sub(CONTEXT_LINES).max(1);
    let last = (target + CONTEXT_LINES).min(lines.len());
    let width = last.to_string().len();

    let mut out = String::new();
    for number in first..=last {
        let marker = if number == target { '>' } else { ' ' };
        out.push_str(&format!(
            "{marker} {number:>width$} | {}\n",
            lines[number - 1]
        ));
        if number == target {
            let pad = column.saturating_sub(1);
            out.push_str(&format!(
                "  {:>width$} | {}^\n",
                "",
                " ".repeat(pad)
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::source_context;

    #[test]
    fn pointer_lands_under_column() {
        let src = "const a = 1;\nconst b = ;\nconst c = 3;";
        let ctx = source_context(src, 2, 11);
        let lines: Vec<&str> = ctx.lines().collect();
        assert_eq!(lines[0], "  1 | const a = 1;");
        assert_eq!(lines[1], "> 2 | const b = ;");
        assert_eq!(lines[2], "    |           ^");
        assert_eq!(lines[3], "  3 | const c = 3;");
    }

    #[test]
    fn out_of_range_line_is_clamped() {
        let ctx = source_context("only line", 40, 1);
        assert!(ctx.contains("> 1 | only line"));
        assert!(source_context("", 1, 1).is_empty());
    }
}
