//! Plan-selection hint injection.
//!
//! The engine accepts `/*+ NTH_PLAN(n) */` right after the leading keyword of
//! a statement. Hints already present in that block are kept; only the plan
//! selection entry is added, replaced or removed.

use sqlparser::dialect::MySqlDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Location, Token, TokenWithSpan, Tokenizer, Whitespace};

use super::error::{ParseError, ParseResult};

/// Name of the plan-selection hint.
pub const PLAN_HINT: &str = "NTH_PLAN";

/// Force plan `index` of `sql`; `0` removes any forced plan.
pub fn with_plan_hint(sql: &str, index: usize) -> ParseResult<String> {
    let dialect = MySqlDialect {};
    let tokens = Tokenizer::new(&dialect, sql).tokenize_with_location()?;

    let keyword_at = tokens
        .iter()
        .position(|t| !matches!(t.token, Token::Whitespace(_)))
        .ok_or(ParseError::EmptyQuery)?;
    match &tokens[keyword_at].token {
        Token::Word(w)
            if matches!(
                w.keyword,
                Keyword::SELECT | Keyword::INSERT | Keyword::REPLACE | Keyword::UPDATE | Keyword::DELETE
            ) => {}
        other => {
            return Err(ParseError::NoHintPosition {
                found: other.to_string(),
            })
        }
    }

    let start_of = |i: usize| -> usize {
        tokens
            .get(i)
            .map(|t| byte_offset(sql, t.span.start))
            .unwrap_or(sql.len())
    };

    let block_at = (keyword_at + 1..tokens.len())
        .find(|&i| !is_blank(&tokens[i]))
        .filter(|&i| hint_body(&tokens[i]).is_some());

    let Some(block_at) = block_at else {
        if index == 0 {
            return Ok(sql.to_string());
        }
        let at = start_of(keyword_at + 1);
        return Ok(format!("{} /*+ {}({}) */{}", &sql[..at], PLAN_HINT, index, &sql[at..]));
    };

    let body = hint_body(&tokens[block_at]).unwrap_or_default();
    let mut hints: Vec<String> = split_hint_list(body)
        .into_iter()
        .filter(|h| !h.to_lowercase().starts_with("nth_plan"))
        .collect();
    if index > 0 {
        hints.push(format!("{}({})", PLAN_HINT, index));
    }

    let start = start_of(block_at);
    if hints.is_empty() {
        let next = (block_at + 1..tokens.len())
            .find(|&i| !is_blank(&tokens[i]))
            .unwrap_or(tokens.len());
        return Ok(format!("{}{}", &sql[..start], &sql[start_of(next)..]));
    }
    let end = start_of(block_at + 1);
    Ok(format!("{}/*+ {} */{}", &sql[..start], hints.join(", "), &sql[end..]))
}

/// Split a hint list on top-level commas, keeping order.
pub fn split_hint_list(raw: &str) -> Vec<String> {
    let mut hints = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in raw.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                push_trimmed(&mut hints, &current);
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    push_trimmed(&mut hints, &current);
    hints
}

fn push_trimmed(hints: &mut Vec<String>, raw: &str) {
    let hint = raw.trim();
    if !hint.is_empty() {
        hints.push(hint.to_string());
    }
}

fn is_blank(token: &TokenWithSpan) -> bool {
    matches!(
        token.token,
        Token::Whitespace(Whitespace::Space | Whitespace::Tab | Whitespace::Newline)
    )
}

/// Contents of an optimizer hint comment, without the leading `+`.
fn hint_body(token: &TokenWithSpan) -> Option<&str> {
    match &token.token {
        Token::Whitespace(Whitespace::MultiLineComment(body)) => body.strip_prefix('+'),
        _ => None,
    }
}

/// Translate a 1-based line/column (in characters) into a byte offset.
fn byte_offset(sql: &str, location: Location) -> usize {
    let (mut line, mut column) = (1u64, 1u64);
    for (i, c) in sql.char_indices() {
        if line == location.line && column == location.column {
            return i;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    sql.len()
}
