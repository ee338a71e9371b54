//! Delimiter syntax translation.
//!
//! View files mark template code with a configurable delimiter pair (`<%` and
//! `%>` by default). Tera only understands its own `{{ }}` / `{% %}` markers,
//! so before compilation every code region is rewritten into the matching Tera
//! construct and all literal text is protected from Tera's parser.
//!
//! | Source                  | Tera output                                 |
//! |-------------------------|---------------------------------------------|
//! | `<%= expr %>`           | `{{ expr }}` (HTML-escaped)                 |
//! | `<%- expr %>`           | `{% set v = expr %}{{ v \| safe }}`         |
//! | `<%# comment %>`        | nothing                                     |
//! | `<%% `                  | literal `<%`                                |
//! | `<% stmt %>`            | `{% stmt %}`                                |
//! | `... -%>`               | also drops the newline following the tag    |

/// Variable used to hold unescaped output before marking it safe.
const RAW_OUTPUT_VAR: &str = "__viewpress_raw";

/// A code region that could not be translated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// What went wrong
    pub message: String,
    /// 1-based line of the offending opening delimiter
    pub line: usize,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (line {})", self.message, self.line)
    }
}

impl std::error::Error for SyntaxError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagMode {
    Escaped,
    Raw,
    Comment,
    Statement,
}

/// Translate delimiter-marked template source into Tera source.
pub fn translate(source: &str, open: &str, close: &str) -> Result<String, SyntaxError> {
    let mut output = String::with_capacity(source.len() + source.len() / 4);
    let mut literal = String::new();
    let mut pos = 0;

    while let Some(found) = source[pos..].find(open) {
        let tag_start = pos + found;
        literal.push_str(&source[pos..tag_start]);
        let code_start = tag_start + open.len();

        // `<%%` is an escaped opening delimiter
        if source[code_start..].starts_with('%') {
            literal.push_str(open);
            pos = code_start + 1;
            continue;
        }

        let Some(code_len) = source[code_start..].find(close) else {
            return Err(SyntaxError {
                message: format!("code region opened with '{}' is never closed with '{}'", open, close),
                line: line_of(source, tag_start),
            });
        };
        let mut code = &source[code_start..code_start + code_len];
        pos = code_start + code_len + close.len();

        let mode = match code.chars().next() {
            Some('=') => TagMode::Escaped,
            Some('-') => TagMode::Raw,
            Some('#') => TagMode::Comment,
            _ => TagMode::Statement,
        };
        if mode != TagMode::Statement {
            code = &code[1..];
        }

        if code.ends_with('-') {
            code = &code[..code.len() - 1];
            if source[pos..].starts_with("\r\n") {
                pos += 2;
            } else if source[pos..].starts_with('\n') {
                pos += 1;
            }
        }

        let code = code.trim();
        if mode == TagMode::Comment || code.is_empty() {
            continue;
        }

        output.push_str(&escape_literal(&literal));
        literal.clear();

        match mode {
            TagMode::Escaped => {
                output.push_str("{{ ");
                output.push_str(code);
                output.push_str(" }}");
            }
            TagMode::Raw => {
                output.push_str(&format!(
                    "{{% set {var} = {code} %}}{{{{ {var} | safe }}}}",
                    var = RAW_OUTPUT_VAR,
                    code = code
                ));
            }
            TagMode::Statement => {
                output.push_str("{% ");
                output.push_str(code);
                output.push_str(" %}");
            }
            TagMode::Comment => {}
        }
    }

    literal.push_str(&source[pos..]);
    output.push_str(&escape_literal(&literal));
    Ok(output)
}

/// Protect literal text from Tera's own markers.
///
/// Any `{` that could start a Tera tag (followed by `{`, `%`, `#`, or by the
/// next translated tag) is emitted as an expression producing `{`.
fn escape_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{' && matches!(chars.peek(), None | Some('{') | Some('%') | Some('#')) {
            escaped.push_str("{{ \"{\" }}");
        } else {
            escaped.push(c);
        }
    }
    escaped
}

fn line_of(source: &str, byte_offset: usize) -> usize {
    source[..byte_offset].matches('\n').count() + 1
}
