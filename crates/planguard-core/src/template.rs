//! Message templates.
//!
//! A template is plain text with `{path}` placeholders.  Each placeholder is
//! resolved through the same `Scope` as condition paths, so a rule can print
//! any variable its `exists` bound.  `{{` and `}}` produce literal braces.

use planguard_contracts::error::EvalException;

use crate::scope::Scope;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece<'t> {
    Text(String),
    Placeholder(&'t str),
}

/// Split `template` into text and placeholders.
pub fn parse(template: &str) -> Result<Vec<Piece<'_>>, EvalException> {
    let mut pieces = Vec::new();
    let mut text = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((at, c)) = chars.next() {
        match c {
            '{' if chars.peek().map(|&(_, next)| next) == Some('{') => {
                chars.next();
                text.push('{');
            }
            '}' if chars.peek().map(|&(_, next)| next) == Some('}') => {
                chars.next();
                text.push('}');
            }
            '{' => {
                let start = at + 1;
                let end = loop {
                    match chars.next() {
                        Some((end, '}')) => break end,
                        Some((_, '{')) | None => {
                            return Err(EvalException::Template {
                                reason: format!("unclosed placeholder at byte {at}"),
                            })
                        }
                        Some(_) => {}
                    }
                };
                let path = template[start..end].trim();
                if path.is_empty() {
                    return Err(EvalException::Template {
                        reason: format!("empty placeholder at byte {at}"),
                    });
                }
                if !text.is_empty() {
                    pieces.push(Piece::Text(std::mem::take(&mut text)));
                }
                pieces.push(Piece::Placeholder(path));
            }
            '}' => {
                return Err(EvalException::Template {
                    reason: format!("unmatched '}}' at byte {at}"),
                })
            }
            other => text.push(other),
        }
    }

    if !text.is_empty() {
        pieces.push(Piece::Text(text));
    }
    Ok(pieces)
}

/// Render `template` against `scope`.
pub fn render(template: &str, scope: &Scope<'_, '_>) -> Result<String, EvalException> {
    let mut out = String::with_capacity(template.len());
    for piece in parse(template)? {
        match piece {
            Piece::Text(text) => out.push_str(&text),
            Piece::Placeholder(path) => out.push_str(&scope.resolve(path)?.to_string()),
        }
    }
    Ok(out)
}
