use crate::lexer::Span;

/// Formats `message` with the offending source line and a caret under `span`.
pub fn render(source: &str, span: Span, message: &str) -> String {
    let line_text = source
        .lines()
        .nth(span.line.saturating_sub(1))
        .unwrap_or("");
    format!(
        "error:{}:{}: {}\n  {}\n  {}^",
        span.line,
        span.column,
        message,
        line_text,
        " ".repeat(span.column.saturating_sub(1))
    )
}
