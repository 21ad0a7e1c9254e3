//! Service filter parser
//!
//! Parses the LDAP-style filter strings (RFC 1960 as profiled by the OSGi
//! framework) used as reference targets:
//!
//! ```text
//! filter     ::= ws '(' ws filtercomp ws ')' ws
//! filtercomp ::= '&' filter+ | '|' filter+ | '!' filter | item
//! item       ::= attr ( '=' | '~=' | '>=' | '<=' ) value
//! value      ::= ( char | '\' any | '*' )*      -- '*' only meaningful after '='
//! ```
//!
//! Whitespace is accepted around parentheses and operators; it is significant
//! inside values.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, cut, map},
    error::{context, ContextError, ErrorKind, ParseError as NomParseError, VerboseError},
    multi::{many0, many1},
    sequence::preceded,
    IResult,
};
use std::fmt;
use thiserror::Error;

// ============================================================================
// AST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Equal {
        attr: String,
        value: String,
    },
    Approx {
        attr: String,
        value: String,
    },
    GreaterEq {
        attr: String,
        value: String,
    },
    LessEq {
        attr: String,
        value: String,
    },
    Present {
        attr: String,
    },
    Substring {
        attr: String,
        initial: Option<String>,
        any: Vec<String>,
        last: Option<String>,
    },
}

impl Filter {
    /// Attribute names referenced anywhere in the filter, in order of appearance.
    pub fn attributes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_attributes(&mut out);
        out
    }

    fn collect_attributes<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Filter::And(items) | Filter::Or(items) => {
                for item in items {
                    item.collect_attributes(out);
                }
            }
            Filter::Not(inner) => inner.collect_attributes(out),
            Filter::Equal { attr, .. }
            | Filter::Approx { attr, .. }
            | Filter::GreaterEq { attr, .. }
            | Filter::LessEq { attr, .. }
            | Filter::Present { attr }
            | Filter::Substring { attr, .. } => out.push(attr),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::And(items) => {
                write!(f, "(&")?;
                for item in items {
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Filter::Or(items) => {
                write!(f, "(|")?;
                for item in items {
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Filter::Not(inner) => write!(f, "(!{})", inner),
            Filter::Equal { attr, value } => write!(f, "({}={})", attr, escape_value(value)),
            Filter::Approx { attr, value } => write!(f, "({}~={})", attr, escape_value(value)),
            Filter::GreaterEq { attr, value } => write!(f, "({}>={})", attr, escape_value(value)),
            Filter::LessEq { attr, value } => write!(f, "({}<={})", attr, escape_value(value)),
            Filter::Present { attr } => write!(f, "({}=*)", attr),
            Filter::Substring {
                attr,
                initial,
                any,
                last,
            } => {
                write!(f, "({}=", attr)?;
                if let Some(initial) = initial {
                    write!(f, "{}", escape_value(initial))?;
                }
                write!(f, "*")?;
                for part in any {
                    write!(f, "{}*", escape_value(part))?;
                }
                if let Some(last) = last {
                    write!(f, "{}", escape_value(last))?;
                }
                write!(f, ")")
            }
        }
    }
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '(' | ')' | '*') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

// ============================================================================
// Public API
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid filter at position {position}: {message}")]
pub struct FilterError {
    pub position: usize,
    pub message: String,
}

/// Parse a complete filter string.
pub fn parse_filter(input: &str) -> Result<Filter, FilterError> {
    match all_consuming(filter::<VerboseError<&str>>)(input) {
        Ok((_, parsed)) => Ok(parsed),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let position = e
                .errors
                .first()
                .map(|(rest, _)| input.len() - rest.len())
                .unwrap_or(0);
            Err(FilterError {
                position,
                message: nom::error::convert_error(input, e),
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(FilterError {
            position: input.len(),
            message: "Incomplete input".to_string(),
        }),
    }
}

/// True if the string parses as a filter.
pub fn is_valid_filter(input: &str) -> bool {
    parse_filter(input).is_ok()
}

// ============================================================================
// Internal Parsers
// ============================================================================

fn filter<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Filter, E> {
    let (input, _) = multispace0(input)?;
    let (input, _) = char('(')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, parsed) = filter_comp(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = cut(context("closing parenthesis", char(')')))(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, parsed))
}

fn filter_comp<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Filter, E> {
    alt((
        map(preceded(char('&'), filter_list), Filter::And),
        map(preceded(char('|'), filter_list), Filter::Or),
        map(preceded(char('!'), cut(filter)), |f| Filter::Not(Box::new(f))),
        item,
    ))(input)
}

fn filter_list<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Vec<Filter>, E> {
    cut(context("filter list", many1(filter)))(input)
}

fn item<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Filter, E> {
    let (input, attr) = context("attribute", attribute)(input)?;
    let (input, op) = context(
        "operator",
        alt((tag("~="), tag(">="), tag("<="), tag("="))),
    )(input)?;

    match op {
        "=" => {
            let (input, parts) = many0(value_part)(input)?;
            Ok((input, equality(attr, parts)))
        }
        _ => {
            // Only '=' may have an empty value.
            let (input, value) = cut(context("value", escaped_text("()")))(input)?;
            let parsed = match op {
                "~=" => Filter::Approx { attr, value },
                ">=" => Filter::GreaterEq { attr, value },
                _ => Filter::LessEq { attr, value },
            };
            Ok((input, parsed))
        }
    }
}

fn attribute<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    let (rest, raw) = take_while1(|c: char| !matches!(c, '=' | '<' | '>' | '~' | '(' | ')'))(input)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Verify)));
    }
    Ok((rest, trimmed.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ValuePart {
    Star,
    Text(String),
}

fn value_part<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, ValuePart, E> {
    alt((
        map(char('*'), |_| ValuePart::Star),
        map(escaped_text("()*"), ValuePart::Text),
    ))(input)
}

/// Non-empty run of value characters up to an unescaped stop character.
fn escaped_text<'a, E: NomParseError<&'a str>>(
    stop: &'static str,
) -> impl Fn(&'a str) -> IResult<&'a str, String, E> {
    move |input: &'a str| {
        let mut out = String::new();
        let mut end = 0;
        let mut chars = input.char_indices();

        while let Some((pos, ch)) = chars.next() {
            if ch == '\\' {
                match chars.next() {
                    Some((escaped_pos, escaped)) => {
                        out.push(escaped);
                        end = escaped_pos + escaped.len_utf8();
                    }
                    None => {
                        return Err(nom::Err::Failure(E::from_error_kind(
                            &input[pos..],
                            ErrorKind::Escaped,
                        )))
                    }
                }
            } else if stop.contains(ch) {
                break;
            } else {
                out.push(ch);
                end = pos + ch.len_utf8();
            }
        }

        if end == 0 {
            Err(nom::Err::Error(E::from_error_kind(
                input,
                ErrorKind::TakeWhile1,
            )))
        } else {
            Ok((&input[end..], out))
        }
    }
}

/// Classify the parts of an `=` value into equal / present / substring.
fn equality(attr: String, parts: Vec<ValuePart>) -> Filter {
    // Adjacent stars are equivalent to one.
    let mut collapsed: Vec<ValuePart> = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            ValuePart::Star => {
                if collapsed.last() != Some(&ValuePart::Star) {
                    collapsed.push(ValuePart::Star);
                }
            }
            ValuePart::Text(text) => match collapsed.last_mut() {
                Some(ValuePart::Text(prev)) => prev.push_str(&text),
                _ => collapsed.push(ValuePart::Text(text)),
            },
        }
    }

    if !collapsed.contains(&ValuePart::Star) {
        let value = match collapsed.pop() {
            Some(ValuePart::Text(text)) => text,
            _ => String::new(),
        };
        return Filter::Equal { attr, value };
    }
    if collapsed == [ValuePart::Star] {
        return Filter::Present { attr };
    }

    let initial = match collapsed.first() {
        Some(ValuePart::Text(text)) => Some(text.clone()),
        _ => None,
    };
    let last = match collapsed.last() {
        Some(ValuePart::Text(text)) if collapsed.len() > 1 => Some(text.clone()),
        _ => None,
    };
    let skip_front = usize::from(initial.is_some());
    let skip_back = usize::from(last.is_some());
    let any = collapsed[skip_front..collapsed.len() - skip_back]
        .iter()
        .filter_map(|p| match p {
            ValuePart::Text(text) => Some(text.clone()),
            ValuePart::Star => None,
        })
        .collect();

    Filter::Substring {
        attr,
        initial,
        any,
        last,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(attr: &str, value: &str) -> Filter {
        Filter::Equal {
            attr: attr.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_simple_equal() {
        assert_eq!(
            parse_filter("(objectClass=org.example.Log)").unwrap(),
            eq("objectClass", "org.example.Log")
        );
    }

    #[test]
    fn test_composites() {
        let parsed = parse_filter("(&(a=1)(|(b=2)(!(c=3))))").unwrap();
        assert_eq!(
            parsed,
            Filter::And(vec![
                eq("a", "1"),
                Filter::Or(vec![eq("b", "2"), Filter::Not(Box::new(eq("c", "3")))]),
            ])
        );
        assert_eq!(parsed.attributes(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_comparison_operators() {
        assert!(matches!(
            parse_filter("(ranking>=10)").unwrap(),
            Filter::GreaterEq { .. }
        ));
        assert!(matches!(
            parse_filter("(ranking<=10)").unwrap(),
            Filter::LessEq { .. }
        ));
        assert!(matches!(
            parse_filter("(name~=Foo)").unwrap(),
            Filter::Approx { .. }
        ));
    }

    #[test]
    fn test_present_and_substring() {
        assert_eq!(
            parse_filter("(service.pid=*)").unwrap(),
            Filter::Present {
                attr: "service.pid".to_string()
            }
        );
        assert_eq!(
            parse_filter("(name=ab*cd*ef)").unwrap(),
            Filter::Substring {
                attr: "name".to_string(),
                initial: Some("ab".to_string()),
                any: vec!["cd".to_string()],
                last: Some("ef".to_string()),
            }
        );
        assert_eq!(
            parse_filter("(name=*mid*)").unwrap(),
            Filter::Substring {
                attr: "name".to_string(),
                initial: None,
                any: vec!["mid".to_string()],
                last: None,
            }
        );
    }

    #[test]
    fn test_escapes_and_whitespace() {
        assert_eq!(
            parse_filter(r"(title=a\(b\)\*c)").unwrap(),
            eq("title", "a(b)*c")
        );
        assert_eq!(parse_filter(" ( & ( a=1 ) ) ").unwrap(), Filter::And(vec![eq("a", "1 ")]));
        assert_eq!(parse_filter("(a=)").unwrap(), eq("a", ""));
    }

    #[test]
    fn test_display_is_canonical() {
        let parsed = parse_filter(r"( &(a=x\*y)(b=*) (c=p*q) )").unwrap();
        assert_eq!(parsed.to_string(), r"(&(a=x\*y)(b=*)(c=p*q))");
        assert_eq!(parse_filter(&parsed.to_string()).unwrap(), parsed);
    }

    #[test]
    fn test_invalid_filters() {
        for input in [
            "",
            "a=b",
            "(a=b",
            "(=b)",
            "(a)",
            "(&)",
            "(!)",
            "(a=b))",
            "(a=b(c)",
            r"(a=b\",
            "(a=b)(c=d)",
            "(a>=)",
            "(a<=)",
            "(a~=)",
        ] {
            assert!(parse_filter(input).is_err(), "expected '{}' to be rejected", input);
        }
    }

    #[test]
    fn test_error_position() {
        let err = parse_filter("(&(a=1)(b=2)").unwrap_err();
        assert!(err.position <= "(&(a=1)(b=2)".len());
        assert!(!err.message.is_empty());
    }
}
