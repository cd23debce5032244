//! Restricted inline-markup support for notes, header/footer text, and
//! contact info lines. The accepted subset is `<b>`, `<i>` (and their
//! `strong`/`em` synonyms), `<br>`, and `<center>`; unknown tags are
//! dropped, and `&amp;`/`&lt;`/`&gt;`/`&nbsp;` are decoded.

/// A run of text drawn with one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Span {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

/// One logical line (explicit `<br>` or block boundary).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Line {
    pub spans: Vec<Span>,
    pub centered: bool,
}

impl Line {
    fn is_empty(&self) -> bool {
        self.spans.iter().all(|span| span.text.trim().is_empty())
    }
}

pub(crate) fn parse(input: &str) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    let mut line = Line::default();
    let mut bold = 0u32;
    let mut italic = 0u32;
    let mut centered = false;
    let mut text = String::new();

    let flush_span = |line: &mut Line, text: &mut String, bold: u32, italic: u32| {
        if !text.is_empty() {
            line.spans.push(Span {
                text: std::mem::take(text),
                bold: bold > 0,
                italic: italic > 0,
            });
        }
    };

    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '<' => {
                let mut tag = String::new();
                for tag_ch in chars.by_ref() {
                    if tag_ch == '>' {
                        break;
                    }
                    tag.push(tag_ch);
                }
                let tag = tag.trim().trim_end_matches('/').trim().to_ascii_lowercase();
                match tag.as_str() {
                    "b" | "strong" => {
                        flush_span(&mut line, &mut text, bold, italic);
                        bold += 1;
                    }
                    "/b" | "/strong" => {
                        flush_span(&mut line, &mut text, bold, italic);
                        bold = bold.saturating_sub(1);
                    }
                    "i" | "em" => {
                        flush_span(&mut line, &mut text, bold, italic);
                        italic += 1;
                    }
                    "/i" | "/em" => {
                        flush_span(&mut line, &mut text, bold, italic);
                        italic = italic.saturating_sub(1);
                    }
                    "br" => {
                        flush_span(&mut line, &mut text, bold, italic);
                        line.centered = centered;
                        lines.push(std::mem::take(&mut line));
                    }
                    "center" => {
                        flush_span(&mut line, &mut text, bold, italic);
                        if !line.is_empty() {
                            line.centered = centered;
                            lines.push(std::mem::take(&mut line));
                        }
                        centered = true;
                    }
                    "/center" => {
                        flush_span(&mut line, &mut text, bold, italic);
                        if !line.is_empty() {
                            line.centered = centered;
                            lines.push(std::mem::take(&mut line));
                        }
                        centered = false;
                    }
                    // Unknown tags are dropped, their content kept.
                    _ => {}
                }
            }
            '&' => {
                let mut entity = String::new();
                let mut terminated = false;
                while let Some(&next) = chars.peek() {
                    if next == ';' {
                        chars.next();
                        terminated = true;
                        break;
                    }
                    if next == '&' || next == '<' || entity.len() >= 6 {
                        break;
                    }
                    entity.push(next);
                    chars.next();
                }
                match (terminated, entity.as_str()) {
                    (true, "amp") => text.push('&'),
                    (true, "lt") => text.push('<'),
                    (true, "gt") => text.push('>'),
                    (true, "nbsp") => text.push('\u{A0}'),
                    _ => {
                        text.push('&');
                        text.push_str(&entity);
                        if terminated {
                            text.push(';');
                        }
                    }
                }
            }
            '\n' => text.push(' '),
            _ => text.push(ch),
        }
    }

    flush_span(&mut line, &mut text, bold, italic);
    if !line.is_empty() {
        line.centered = centered;
        lines.push(line);
    }
    lines
}
