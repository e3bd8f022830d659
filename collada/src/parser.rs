use std::{any::type_name, str::FromStr};

use crate::error::ParseError;

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

fn next_token<'a>(text: &mut &'a str) -> Option<&'a str> {
    let start = text.trim_start_matches(is_whitespace);
    if start.is_empty() {
        *text = start;
        return None;
    }

    let end = start.find(is_whitespace).unwrap_or(start.len());
    let (token, rest) = start.split_at(end);
    *text = rest;
    Some(token)
}

fn parse_token<T: FromStr>(token: &str) -> Result<T, ParseError> {
    match token.parse::<T>() {
        Ok(v) => Ok(v),
        Err(_) => Err(ParseError::TypeMismatch(type_name::<T>(), token.to_string())),
    }
}

/// Reads exactly `count` whitespace separated values from `text`.
///
/// Fewer values than `count` and anything but whitespace after the last
/// value are both errors.
pub fn parse_tokens<T: FromStr>(text: &str, count: usize) -> Result<Vec<T>, ParseError> {
    let mut remaining = text;
    // Each value takes at least one character and one separator.
    let mut result = Vec::with_capacity(count.min(text.len() / 2 + 1));

    for found in 0..count {
        match next_token(&mut remaining) {
            Some(token) => result.push(parse_token(token)?),
            None => {
                return Err(ParseError::MissingTokens {
                    expected: count,
                    found,
                })
            }
        }
    }

    match next_token(&mut remaining) {
        Some(token) => Err(ParseError::TrailingData(token.to_string())),
        None => Ok(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tokens_accepts_any_whitespace_run() {
        let cases = [
            "1 2  3\n4",
            "  1\t2\r\n3 4  ",
            "1\n\n\n2 3\t\t4\n",
        ];

        for input in cases {
            let parsed = parse_tokens::<f32>(input, 4).unwrap();
            assert_eq!(parsed, vec![1.0, 2.0, 3.0, 4.0], "input {:?}", input);
        }
    }

    #[test]
    fn parse_tokens_rejects_missing_values() {
        assert_eq!(
            parse_tokens::<i32>("1 2 3", 4),
            Err(ParseError::MissingTokens {
                expected: 4,
                found: 3
            })
        );
        assert_eq!(
            parse_tokens::<i32>("   ", 1),
            Err(ParseError::MissingTokens {
                expected: 1,
                found: 0
            })
        );
    }

    #[test]
    fn parse_tokens_rejects_trailing_values() {
        assert_eq!(
            parse_tokens::<i32>("1 2 3 4 5", 4),
            Err(ParseError::TrailingData("5".into()))
        );
        assert_eq!(
            parse_tokens::<u32>("7 garbage", 1),
            Err(ParseError::TrailingData("garbage".into()))
        );
    }

    #[test]
    fn parse_tokens_rejects_invalid_values() {
        match parse_tokens::<u32>("0 1 -2", 3) {
            Err(ParseError::TypeMismatch(_, token)) => assert_eq!(token, "-2"),
            other => panic!("expected a type mismatch, got {:?}", other),
        }
        match parse_tokens::<f32>("0.5 1.0abc", 2) {
            Err(ParseError::TypeMismatch(type_, token)) => {
                assert_eq!(type_, "f32");
                assert_eq!(token, "1.0abc");
            }
            other => panic!("expected a type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn parse_tokens_reads_empty_text() {
        assert_eq!(parse_tokens::<f32>("", 0), Ok(vec![]));
        assert_eq!(parse_tokens::<f32>(" \n ", 0), Ok(vec![]));
    }

    #[test]
    fn parse_tokens_parses_scientific_notation() {
        let parsed = parse_tokens::<f32>("1e-3 -2.5E2 0", 3).unwrap();
        assert_eq!(parsed, vec![0.001, -250.0, 0.0]);
    }

    #[test]
    fn parse_tokens_rejects_huge_counts() {
        let cases = [1_000_000_000, 4_611_686_018_427_387_904, usize::MAX];

        for count in cases {
            assert_eq!(
                parse_tokens::<f32>("1 2 3", count),
                Err(ParseError::MissingTokens {
                    expected: count,
                    found: 3
                })
            );
        }
    }
}
