use thiserror::Error;

use crate::condition::ast::{Clause, Condition};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unrecognized clause `{text}`: {reason}")]
    UnrecognizedClause { text: String, reason: String },
    #[error("unsupported joiner `{found}` at offset {offset} (groups may only be joined with `||`)")]
    UnsupportedJoiner { found: String, offset: usize },
    #[error("malformed quoted value at offset {offset}")]
    MalformedQuote { offset: usize },
    #[error("unbalanced parentheses at offset {offset}")]
    UnbalancedParens { offset: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum TokenKind {
    Open,
    Close,
    Or,
    And,
    Equals,
    Key(String),
    Quoted(String),
}

impl TokenKind {
    fn text(&self) -> String {
        match self {
            Self::Open => "(".to_owned(),
            Self::Close => ")".to_owned(),
            Self::Or => "||".to_owned(),
            Self::And => "&&".to_owned(),
            Self::Equals => "=".to_owned(),
            Self::Key(key) => key.clone(),
            Self::Quoted(value) => format!("\"{value}\""),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    offset: usize,
    end: usize,
}

/// Parses a canonical condition string into its clauses.
///
/// Blank input yields the empty condition rather than an error.
pub fn parse(text: &str) -> Result<Condition, ParseError> {
    let tokens = tokenize(text)?;
    let mut clauses = Vec::new();
    let mut index = 0;

    if tokens.is_empty() {
        return Ok(Condition::empty());
    }

    loop {
        let Some(token) = tokens.get(index) else {
            break;
        };
        match &token.kind {
            TokenKind::Open => {}
            TokenKind::Close => return Err(ParseError::UnbalancedParens { offset: token.offset }),
            TokenKind::Or | TokenKind::And => {
                return Err(ParseError::UnsupportedJoiner {
                    found: token.kind.text(),
                    offset: token.offset,
                });
            }
            TokenKind::Equals | TokenKind::Key(_) | TokenKind::Quoted(_) => {
                let end = tokens[index..]
                    .iter()
                    .find(|candidate| matches!(candidate.kind, TokenKind::Open))
                    .map(|candidate| candidate.offset)
                    .unwrap_or(text.len());
                return Err(ParseError::UnrecognizedClause {
                    text: text[token.offset..end].trim().to_owned(),
                    reason: "clauses must be wrapped in parentheses".to_owned(),
                });
            }
        }

        let close = matching_close(&tokens, index)?;
        let group_text = &text[tokens[index].offset..tokens[close].end];
        clauses.push(parse_group(&tokens[index + 1..close], group_text)?);
        index = close + 1;

        let Some(joiner) = tokens.get(index) else {
            break;
        };
        match &joiner.kind {
            TokenKind::Or => {
                index += 1;
                if index == tokens.len() {
                    return Err(ParseError::UnsupportedJoiner {
                        found: joiner.kind.text(),
                        offset: joiner.offset,
                    });
                }
            }
            TokenKind::Close => {
                return Err(ParseError::UnbalancedParens { offset: joiner.offset });
            }
            other => {
                return Err(ParseError::UnsupportedJoiner {
                    found: other.text(),
                    offset: joiner.offset,
                });
            }
        }
    }

    Ok(Condition::new(clauses))
}

fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        let kind = match ch {
            c if c.is_whitespace() => continue,
            '(' => TokenKind::Open,
            ')' => TokenKind::Close,
            '=' => {
                // tolerate `==` as a single equality operator
                if matches!(chars.peek(), Some((_, '='))) {
                    chars.next();
                }
                TokenKind::Equals
            }
            '|' | '&' => {
                if chars.peek().map(|(_, next)| *next) != Some(ch) {
                    return Err(ParseError::UnsupportedJoiner { found: ch.to_string(), offset });
                }
                chars.next();
                if ch == '|' {
                    TokenKind::Or
                } else {
                    TokenKind::And
                }
            }
            '"' | '\'' => {
                let mut value = String::new();
                let mut closed = false;
                for (_, next) in chars.by_ref() {
                    if next == ch {
                        closed = true;
                        break;
                    }
                    value.push(next);
                }
                if !closed {
                    return Err(ParseError::MalformedQuote { offset });
                }
                TokenKind::Quoted(value)
            }
            c if is_key_char(c) => {
                let mut key = c.to_string();
                while let Some((_, next)) = chars.peek() {
                    if !is_key_char(*next) {
                        break;
                    }
                    key.push(*next);
                    chars.next();
                }
                TokenKind::Key(key)
            }
            other => {
                return Err(ParseError::UnrecognizedClause {
                    text: other.to_string(),
                    reason: format!("unexpected character at offset {offset}"),
                });
            }
        };

        let end = chars.peek().map(|(next, _)| *next).unwrap_or(text.len());
        tokens.push(Token { kind, offset, end });
    }

    Ok(tokens)
}

fn is_key_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.')
}

fn matching_close(tokens: &[Token], open: usize) -> Result<usize, ParseError> {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::Open => depth += 1,
            TokenKind::Close => {
                depth -= 1;
                if depth == 0 {
                    return Ok(index);
                }
            }
            _ => {}
        }
    }
    Err(ParseError::UnbalancedParens { offset: tokens[open].offset })
}

struct Term {
    key: String,
    value: String,
}

fn parse_group(tokens: &[Token], group_text: &str) -> Result<Clause, ParseError> {
    let unrecognized = |reason: &str| ParseError::UnrecognizedClause {
        text: group_text.to_owned(),
        reason: reason.to_owned(),
    };

    if tokens.is_empty() {
        return Err(unrecognized("empty group"));
    }
    if tokens.iter().any(|token| matches!(token.kind, TokenKind::Open)) {
        return Err(unrecognized("nested groups are not supported"));
    }

    let mut terms = Vec::new();
    let mut joiners = Vec::new();
    let mut index = 0;
    while index < tokens.len() {
        let TokenKind::Key(key) = &tokens[index].kind else {
            return Err(unrecognized("expected a `key = \"value\"` term"));
        };
        match tokens.get(index + 1).map(|token| &token.kind) {
            Some(TokenKind::Equals) => {}
            _ => return Err(unrecognized("expected `=` after key")),
        }
        let value = match tokens.get(index + 2) {
            Some(Token { kind: TokenKind::Quoted(value), .. }) => value.clone(),
            Some(token) => return Err(ParseError::MalformedQuote { offset: token.offset }),
            None => return Err(unrecognized("missing value after `=`")),
        };
        terms.push(Term { key: key.to_ascii_lowercase(), value });
        index += 3;

        if let Some(token) = tokens.get(index) {
            match token.kind {
                TokenKind::Or | TokenKind::And => joiners.push(token.kind.clone()),
                _ => return Err(unrecognized("terms must be joined with `&&` or `||`")),
            }
            index += 1;
            if index == tokens.len() {
                return Err(unrecognized("dangling joiner"));
            }
        }
    }

    if terms.iter().any(|term| term.key == "department") {
        if joiners.iter().any(|joiner| *joiner != TokenKind::And) {
            return Err(unrecognized("department terms may only be joined with `&&`"));
        }
        let mut department = None;
        let mut role = None;
        for term in terms {
            let slot = match term.key.as_str() {
                "department" => &mut department,
                "role" => &mut role,
                _ => return Err(unrecognized("department clauses accept only `department` and `role`")),
            };
            if slot.replace(term.value).is_some() {
                return Err(unrecognized("duplicate key in department clause"));
            }
        }
        let department = department.ok_or_else(|| unrecognized("missing department"))?;
        return Clause::department(department, role)
            .map_err(|error| unrecognized(&error.to_string()));
    }

    if terms.iter().all(|term| term.key == "id") {
        if joiners.iter().any(|joiner| *joiner != TokenKind::Or) {
            return Err(unrecognized("employee ids may only be joined with `||`"));
        }
        return Clause::employees(terms.into_iter().map(|term| term.value))
            .map_err(|error| unrecognized(&error.to_string()));
    }

    Err(unrecognized("expected `department` or `id` terms"))
}
