//! URL rule patterns.
//!
//! Patterns use the werkzeug rule syntax backend engines register their
//! handlers with:
//!
//! ```text
//! /2013-04-01/hostedzone/<zone_id>/rrset/
//! /<regex("[a-z0-9-]+"):bucket>/<path:key>
//! /things/<any(a, b):kind>/<int:id>
//! ```
//!
//! Static text matches literally. A variable `<name>` matches one path
//! segment; `<converter(args):name>` selects a converter. Each pattern is
//! compiled into a single anchored regular expression.
//!
//! Trailing slashes are never strict: every pattern matches the path with
//! or without a final slash, whether or not the rule itself ends in `/` (or
//! in the regex-style `/?`).

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

/// Error raised when a URL rule pattern cannot be compiled.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// The rule text is malformed.
    #[error("malformed rule {pattern}: {reason}")]
    Syntax {
        /// The offending pattern.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The rule references a converter that does not exist.
    #[error("unknown converter {converter} in rule {pattern}")]
    UnknownConverter {
        /// The offending pattern.
        pattern: String,
        /// The converter name.
        converter: String,
    },

    /// The compiled expression is not a valid regular expression.
    #[error("invalid regular expression in rule {pattern}: {source}")]
    Regex {
        /// The offending pattern.
        pattern: String,
        /// The regex compilation error.
        source: regex::Error,
    },
}

/// A compiled URL rule.
#[derive(Clone)]
pub struct RoutePattern {
    source: String,
    regex: Regex,
    variables: Vec<String>,
}

impl RoutePattern {
    /// Compile a rule.
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] if the rule is malformed, uses an unknown
    /// converter, or yields an invalid regular expression.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let body = strip_trailing_slash(pattern);

        let mut expr = String::with_capacity(body.len() * 2 + 8);
        expr.push('^');
        let mut variables = Vec::new();
        let mut rest = body;

        while let Some(start) = rest.find('<') {
            expr.push_str(&regex::escape(&rest[..start]));
            let (variable, consumed) = parse_variable(pattern, &rest[start..])?;
            if variables.contains(&variable.name) {
                return Err(PatternError::Syntax {
                    pattern: pattern.to_owned(),
                    reason: format!("variable {} is bound twice", variable.name),
                });
            }

            expr.push_str("(?P<");
            expr.push_str(&group_name(variables.len()));
            expr.push('>');
            expr.push_str(&converter_regex(pattern, &variable)?);
            expr.push(')');
            variables.push(variable.name);

            rest = &rest[start + consumed..];
        }
        expr.push_str(&regex::escape(rest));
        expr.push_str("/?$");

        let regex = Regex::new(&expr).map_err(|source| PatternError::Regex {
            pattern: pattern.to_owned(),
            source,
        })?;

        Ok(Self {
            source: pattern.to_owned(),
            regex,
            variables,
        })
    }

    /// The rule text this pattern was compiled from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of the rule's variables, in order of appearance.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Whether `path` matches this rule.
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(normalize(path))
    }

    /// Match `path`, returning the bound variables on success.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let caps = self.regex.captures(normalize(path))?;
        let params = self
            .variables
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                caps.name(&group_name(i))
                    .map(|m| (name.clone(), m.as_str().to_owned()))
            })
            .collect();
        Some(params)
    }
}

impl fmt::Debug for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutePattern")
            .field("source", &self.source)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn group_name(index: usize) -> String {
    format!("__v{index}")
}

fn normalize(path: &str) -> &str {
    if path.is_empty() { "/" } else { path }
}

/// Strip a trailing `/` or `/?`.
fn strip_trailing_slash(pattern: &str) -> &str {
    pattern
        .strip_suffix("/?")
        .or_else(|| pattern.strip_suffix('/'))
        .unwrap_or(pattern)
}

struct Variable {
    name: String,
    converter: String,
    args: Vec<String>,
}

/// Parse one `<...>` variable at the start of `text`.
///
/// Returns the variable and the number of bytes consumed.
fn parse_variable(pattern: &str, text: &str) -> Result<(Variable, usize), PatternError> {
    let syntax = |reason: &str| PatternError::Syntax {
        pattern: pattern.to_owned(),
        reason: reason.to_owned(),
    };

    let bytes = text.as_bytes();
    let mut pos = 1;
    let ident_end = |from: usize| {
        let mut end = from;
        while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
            end += 1;
        }
        end
    };

    let end = ident_end(pos);
    if end == pos {
        return Err(syntax("expected a variable or converter name after '<'"));
    }
    let first = &text[pos..end];
    pos = end;

    let (converter, args) = match bytes.get(pos) {
        Some(b'>') => {
            let variable = Variable {
                name: first.to_owned(),
                converter: "default".to_owned(),
                args: Vec::new(),
            };
            return Ok((variable, pos + 1));
        }
        Some(b'(') => {
            let close = find_args_end(text, pos + 1).ok_or_else(|| syntax("unterminated converter arguments"))?;
            let args = split_args(&text[pos + 1..close]);
            pos = close + 1;
            (first.to_owned(), args)
        }
        Some(b':') => (first.to_owned(), Vec::new()),
        _ => return Err(syntax("unterminated variable")),
    };

    if bytes.get(pos) != Some(&b':') {
        return Err(syntax("expected ':' after converter"));
    }
    pos += 1;

    let end = ident_end(pos);
    if end == pos {
        return Err(syntax("expected a variable name after ':'"));
    }
    let name = text[pos..end].to_owned();
    if bytes.get(end) != Some(&b'>') {
        return Err(syntax("unterminated variable"));
    }

    Ok((
        Variable {
            name,
            converter,
            args,
        },
        end + 1,
    ))
}

/// Find the `)` closing a converter argument list, skipping quoted text.
fn find_args_end(text: &str, from: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in text[from..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, ')') => return Some(from + i),
            (None, _) => {}
        }
    }
    None
}

/// Split converter arguments on top-level commas and unquote them.
///
/// Text outside the quotes of a quoted argument is dropped. Inside quotes
/// only an escaped quote character is unescaped; other backslash sequences
/// are kept verbatim.
fn split_args(raw: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut quoted = false;
    let mut chars = raw.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(_), '\\') => match chars.next() {
                Some(next) if Some(next) == quote => current.push(next),
                Some(next) => {
                    current.push('\\');
                    current.push(next);
                }
                None => current.push('\\'),
            },
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                current.clear();
                quote = Some(ch);
                quoted = true;
            }
            (None, ',') => {
                args.push(finish_arg(&mut current, quoted));
                quoted = false;
            }
            (None, _) if quoted => {}
            (None, c) => current.push(c),
        }
    }
    if quoted || !current.trim().is_empty() {
        args.push(finish_arg(&mut current, quoted));
    }
    args
}

fn finish_arg(current: &mut String, quoted: bool) -> String {
    let arg = std::mem::take(current);
    if quoted { arg } else { arg.trim().to_owned() }
}

fn converter_regex(pattern: &str, variable: &Variable) -> Result<String, PatternError> {
    let expr = match variable.converter.as_str() {
        "default" | "string" => "[^/]+".to_owned(),
        "path" => "[^/].*?".to_owned(),
        "int" => r"\d+".to_owned(),
        "float" => r"\d+\.\d+".to_owned(),
        "uuid" => {
            "[A-Fa-f0-9]{8}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{4}-[A-Fa-f0-9]{12}".to_owned()
        }
        "any" => {
            if variable.args.is_empty() {
                return Err(PatternError::Syntax {
                    pattern: pattern.to_owned(),
                    reason: "any() requires at least one item".to_owned(),
                });
            }
            let items: Vec<String> = variable
                .args
                .iter()
                .map(String::as_str)
                .map(regex::escape)
                .collect();
            format!("(?:{})", items.join("|"))
        }
        "regex" => match variable.args.as_slice() {
            [expr] => format!("(?:{expr})"),
            _ => {
                return Err(PatternError::Syntax {
                    pattern: pattern.to_owned(),
                    reason: "regex() takes exactly one expression".to_owned(),
                });
            }
        },
        other => {
            return Err(PatternError::UnknownConverter {
                pattern: pattern.to_owned(),
                converter: other.to_owned(),
            });
        }
    };
    Ok(expr)
}
