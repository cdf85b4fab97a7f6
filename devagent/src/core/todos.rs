//! TODO marker collection over tracked file contents.

/// Literal marker a line must contain to be collected.
pub const TODO_MARKER: &str = "TODO";

/// One line containing [`TODO_MARKER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoLine {
    pub path: String,
    /// 1-based line number.
    pub line: usize,
    pub text: String,
}

impl TodoLine {
    /// `path:line:text`, the same layout `grep -rn` prints.
    pub fn render(&self) -> String {
        format!("{}:{}:{}", self.path, self.line, self.text)
    }
}

/// Collect matching lines from one file, in line order.
pub fn todo_lines(path: &str, contents: &str) -> Vec<TodoLine> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, text)| text.contains(TODO_MARKER))
        .map(|(idx, text)| TodoLine {
            path: path.to_string(),
            line: idx + 1,
            text: text.trim_end().to_string(),
        })
        .collect()
}

/// Join rendered lines into the batch sent to the model.
pub fn render_batch(lines: &[TodoLine]) -> String {
    lines
        .iter()
        .map(TodoLine::render)
        .collect::<Vec<_>>()
        .join("\n")
}
