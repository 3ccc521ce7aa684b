// src/rules/posix.rs

//! Translation of POSIX regular expressions into `regex` crate syntax.
//!
//! Rule files have historically been written as POSIX basic regular
//! expressions. The `regex` crate speaks a Perl-like dialect, so patterns are
//! rewritten before compilation:
//!
//! - BRE: `\(`, `\)`, `\{`, `\}`, `\|`, `\+`, `\?` become operators; bare
//!   `(`, `)`, `{`, `}`, `|`, `+`, `?` become literals; `*` at the start of an
//!   expression is a literal; `^`/`$` are anchors only at the edges of an
//!   expression.
//! - ERE: passed through as is.
//!
//! In both dialects a backslash inside a bracket expression is a literal
//! character, and `[=c=]` / `[.c.]` are reduced to the character itself.
//! Back-references are rejected since the regex engine cannot express them.

use crate::types::RuleSyntax;

/// Rewrite `pattern` into an equivalent `regex` crate pattern.
///
/// The error string describes why the pattern cannot be translated.
pub fn translate(pattern: &str, syntax: RuleSyntax) -> Result<String, String> {
    match syntax {
        RuleSyntax::Basic => translate_basic(pattern),
        RuleSyntax::Extended => translate_extended(pattern),
    }
}

fn translate_basic(pattern: &str) -> Result<String, String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut i = 0;
    // True at the start of the whole pattern, a group, or an alternative.
    let mut at_start = true;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                let Some(&next) = chars.get(i + 1) else {
                    return Err("trailing backslash".to_string());
                };
                i += 2;
                match next {
                    '(' | '|' => {
                        out.push(next);
                        at_start = true;
                        continue;
                    }
                    ')' | '+' | '?' => out.push(next),
                    '{' => {
                        i = copy_interval(&chars, i, &mut out)?;
                    }
                    '}' => return Err("unmatched \\}".to_string()),
                    '1'..='9' => {
                        return Err(format!("back-reference \\{next} is not supported"));
                    }
                    '<' | '>' | 'w' | 'W' | 's' | 'S' | 'b' | 'B' => {
                        out.push('\\');
                        out.push(next);
                    }
                    '`' => out.push_str(r"\A"),
                    '\'' => out.push_str(r"\z"),
                    other => push_literal(&mut out, other),
                }
                at_start = false;
            }
            '[' => {
                i = copy_bracket(&chars, i, &mut out)?;
                at_start = false;
            }
            '*' if at_start => {
                out.push_str(r"\*");
                i += 1;
                at_start = false;
            }
            '^' => {
                if at_start {
                    out.push('^');
                } else {
                    out.push_str(r"\^");
                }
                // `^*` keeps the star literal.
                i += 1;
            }
            '$' => {
                if closes_expression(&chars, i + 1) {
                    out.push('$');
                } else {
                    out.push_str(r"\$");
                }
                i += 1;
                at_start = false;
            }
            '(' | ')' | '{' | '}' | '|' | '+' | '?' => {
                push_literal(&mut out, c);
                i += 1;
                at_start = false;
            }
            _ => {
                push_char(&mut out, c);
                i += 1;
                at_start = false;
            }
        }
    }

    Ok(out)
}

fn translate_extended(pattern: &str) -> Result<String, String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let Some(&next) = chars.get(i + 1) else {
                    return Err("trailing backslash".to_string());
                };
                if next.is_ascii_digit() && next != '0' {
                    return Err(format!("back-reference \\{next} is not supported"));
                }
                out.push('\\');
                out.push(next);
                i += 2;
            }
            '[' => {
                i = copy_bracket(&chars, i, &mut out)?;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok(out)
}

/// `$` is an anchor when it ends the pattern, a group or an alternative.
fn closes_expression(chars: &[char], at: usize) -> bool {
    match chars.get(at) {
        None => true,
        Some('\\') => matches!(chars.get(at + 1), Some(')') | Some('|')),
        _ => false,
    }
}

/// Copy a BRE interval body (after `\{`) up to and including `\}`.
fn copy_interval(chars: &[char], mut i: usize, out: &mut String) -> Result<usize, String> {
    out.push('{');
    loop {
        match chars.get(i) {
            Some('\\') if chars.get(i + 1) == Some(&'}') => {
                out.push('}');
                return Ok(i + 2);
            }
            Some(&c) if c.is_ascii_digit() || c == ',' => {
                out.push(c);
                i += 1;
            }
            Some(&c) => return Err(format!("invalid character '{c}' in interval")),
            None => return Err("unterminated \\{ interval".to_string()),
        }
    }
}

/// Copy a bracket expression starting at `chars[start] == '['`.
///
/// Returns the index just past the closing `]`.
fn copy_bracket(chars: &[char], start: usize, out: &mut String) -> Result<usize, String> {
    let mut i = start + 1;
    out.push('[');

    if chars.get(i) == Some(&'^') {
        out.push('^');
        i += 1;
    }
    // A leading `]` is a literal member.
    if chars.get(i) == Some(&']') {
        out.push_str(r"\]");
        i += 1;
    }

    loop {
        let Some(&c) = chars.get(i) else {
            return Err("unterminated bracket expression".to_string());
        };
        match c {
            ']' => {
                out.push(']');
                return Ok(i + 1);
            }
            '[' if matches!(chars.get(i + 1), Some(':') | Some('=') | Some('.')) => {
                let delim = chars[i + 1];
                let body_start = i + 2;
                let mut j = body_start;
                while j + 1 < chars.len() && !(chars[j] == delim && chars[j + 1] == ']') {
                    j += 1;
                }
                if j + 1 >= chars.len() {
                    return Err(format!("unterminated [{delim} in bracket expression"));
                }
                let body: String = chars[body_start..j].iter().collect();
                if delim == ':' {
                    out.push_str("[:");
                    out.push_str(&body);
                    out.push_str(":]");
                } else {
                    for ch in body.chars() {
                        if ch.is_ascii_punctuation() {
                            out.push('\\');
                        }
                        out.push(ch);
                    }
                }
                i = j + 2;
            }
            // Characters that carry meaning inside a `regex` class but not in
            // a POSIX one.
            '\\' | '[' | '&' | '~' => {
                out.push('\\');
                out.push(c);
                i += 1;
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                out.push_str(r"\-");
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
}

fn push_literal(out: &mut String, c: char) {
    out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
}

/// Push a character that has the same meaning in BRE and `regex` syntax.
fn push_char(out: &mut String, c: char) {
    match c {
        '.' | '*' => out.push(c),
        _ => push_literal(out, c),
    }
}
