/// Depth of a line: the number of leading tab characters
pub fn indent_of(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b'\t').count()
}

/// Shift moved text to a new depth.
///
/// The block's first line should end up at `target_indent + nesting_delta`
/// tabs. Every line that follows a line break in `text` is shifted by the same
/// amount, keeping descendants' relative indentation; blank lines included.
/// Lines without enough tabs to remove are left as they are. Text before the
/// first line break is never touched, so callers pass the block with its
/// leading newline.
pub fn reindent(
    text: &str,
    source_indent: usize,
    target_indent: usize,
    nesting_delta: usize,
) -> String {
    let new_indent = target_indent + nesting_delta;
    let add_tabs = new_indent.saturating_sub(source_indent);
    let remove_tabs = source_indent.saturating_sub(new_indent);
    if add_tabs == 0 && remove_tabs == 0 {
        return text.to_string();
    }

    let remove = "\t".repeat(remove_tabs);
    let add = "\t".repeat(add_tabs);

    let mut lines = text.split('\n');
    let mut out = String::with_capacity(text.len() + add_tabs * 8);
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    for line in lines {
        out.push('\n');
        let line = line.strip_prefix(remove.as_str()).unwrap_or(line);
        out.push_str(&add);
        out.push_str(line);
    }
    out
}
