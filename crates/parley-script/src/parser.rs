//! Expression parser using winnow.
//!
//! Parses a single sandbox expression into an [`Expr`]. Handles:
//! - Number, string, boolean and null literals, array literals
//! - Member access, indexing and calls
//! - Prefix `!` and `-`, the usual infix operators and `?:`
//! - An optional leading `return` and trailing `;`

use winnow::combinator::{alt, opt, separated};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};

use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::MAX_OPERATORS;
use crate::error::ParseError;

/// Parse an expression, rejecting input that nests deeper than `max_depth`.
pub fn parse_expression(source: &str, max_depth: usize) -> Result<Expr, ParseError> {
    let body = strip_statement(source);
    if body.is_empty() {
        return Err(ParseError::Empty);
    }
    let shape = Shape::of(body);
    if shape.depth > max_depth {
        return Err(ParseError::TooDeep { max_depth });
    }
    if shape.operators > MAX_OPERATORS {
        return Err(ParseError::TooLong {
            max_operators: MAX_OPERATORS,
        });
    }

    let mut remaining = body;
    match expression(&mut remaining) {
        Ok(expr) => {
            let _ = ws(&mut remaining);
            if remaining.is_empty() {
                Ok(expr)
            } else {
                let (line, column) = calculate_position(body, remaining);
                Err(ParseError::Syntax {
                    line,
                    column,
                    message: format!(
                        "unexpected character: '{}'",
                        remaining.chars().next().unwrap_or('?')
                    ),
                })
            }
        }
        Err(e) => {
            let (line, column) = calculate_position(body, remaining);
            Err(ParseError::Syntax {
                line,
                column,
                message: format!("parse error: {e}"),
            })
        }
    }
}

/// Strip a leading `return` keyword and trailing semicolons.
fn strip_statement(source: &str) -> &str {
    let mut body = source.trim();
    if let Some(rest) = body.strip_prefix("return")
        && !rest.starts_with(is_ident_cont)
    {
        body = rest.trim_start();
    }
    body.trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

/// Size bounds of an expression, read from its text outside string literals.
struct Shape {
    /// Deepest bracket nesting plus every `?`.
    depth: usize,
    /// Operator, accessor and separator characters.
    operators: usize,
}

impl Shape {
    fn of(source: &str) -> Self {
        let mut depth = 0usize;
        let mut deepest = 0usize;
        let mut conditionals = 0usize;
        let mut operators = 0usize;
        let mut quote: Option<char> = None;
        let mut escaped = false;
        for c in source.chars() {
            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '"' | '\'' => quote = Some(c),
                '(' | '[' => {
                    depth += 1;
                    deepest = deepest.max(depth);
                    operators += 1;
                }
                ')' | ']' => depth = depth.saturating_sub(1),
                '?' => {
                    conditionals += 1;
                    operators += 1;
                }
                '+' | '-' | '*' | '/' | '%' | '<' | '>' | '=' | '!' | '&' | '|' | '.' | ',' => {
                    operators += 1;
                }
                _ => {}
            }
        }
        Self {
            depth: deepest + conditionals,
            operators,
        }
    }
}

/// Calculate line and column from the parsed body and the remaining input.
fn calculate_position(original: &str, remaining: &str) -> (usize, usize) {
    let consumed = original.len() - remaining.len();
    let consumed_str = &original[..consumed];
    let line = consumed_str.chars().filter(|&c| c == '\n').count() + 1;
    let column = match consumed_str.rfind('\n') {
        Some(pos) => consumed - pos,
        None => consumed + 1,
    };
    (line, column)
}

fn backtrack<T>() -> ModalResult<T> {
    Err(ErrMode::Backtrack(ContextError::new()))
}

/// Parse optional whitespace.
fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., char::is_whitespace)
        .void()
        .parse_next(input)
}

/// Consume `c` if it comes next.
fn eat(input: &mut &str, c: char) -> ModalResult<bool> {
    opt(c).map(|m| m.is_some()).parse_next(input)
}

fn expect(input: &mut &str, c: char) -> ModalResult<()> {
    c.void().parse_next(input)
}

fn expression(input: &mut &str) -> ModalResult<Expr> {
    conditional(input)
}

/// `condition ? then : otherwise`, right associative.
fn conditional(input: &mut &str) -> ModalResult<Expr> {
    let condition = logical_or(input)?;
    ws(input)?;
    if !eat(input, '?')? {
        return Ok(condition);
    }
    let then = conditional(input)?;
    ws(input)?;
    expect(input, ':')?;
    let otherwise = conditional(input)?;
    Ok(Expr::Conditional {
        condition: Box::new(condition),
        then: Box::new(then),
        otherwise: Box::new(otherwise),
    })
}

/// Parse a left-associative chain of `operand (operator operand)*`.
fn left_assoc(
    input: &mut &str,
    mut operand: impl FnMut(&mut &str) -> ModalResult<Expr>,
    mut operator: impl FnMut(&mut &str) -> ModalResult<BinaryOp>,
) -> ModalResult<Expr> {
    let mut lhs = operand(input)?;
    loop {
        ws(input)?;
        let Some(op) = opt(&mut operator).parse_next(input)? else {
            break;
        };
        let rhs = operand(input)?;
        lhs = Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
    }
    Ok(lhs)
}

fn logical_or(input: &mut &str) -> ModalResult<Expr> {
    left_assoc(input, logical_and, |i: &mut &str| {
        "||".value(BinaryOp::Or).parse_next(i)
    })
}

fn logical_and(input: &mut &str) -> ModalResult<Expr> {
    left_assoc(input, equality, |i: &mut &str| {
        "&&".value(BinaryOp::And).parse_next(i)
    })
}

fn equality(input: &mut &str) -> ModalResult<Expr> {
    left_assoc(input, comparison, |i: &mut &str| {
        alt((
            "===".value(BinaryOp::StrictEq),
            "!==".value(BinaryOp::StrictNe),
            "==".value(BinaryOp::LooseEq),
            "!=".value(BinaryOp::LooseNe),
        ))
        .parse_next(i)
    })
}

fn comparison(input: &mut &str) -> ModalResult<Expr> {
    left_assoc(input, additive, |i: &mut &str| {
        alt((
            "<=".value(BinaryOp::Le),
            ">=".value(BinaryOp::Ge),
            '<'.value(BinaryOp::Lt),
            '>'.value(BinaryOp::Gt),
        ))
        .parse_next(i)
    })
}

fn additive(input: &mut &str) -> ModalResult<Expr> {
    left_assoc(input, multiplicative, |i: &mut &str| {
        alt(('+'.value(BinaryOp::Add), '-'.value(BinaryOp::Sub))).parse_next(i)
    })
}

fn multiplicative(input: &mut &str) -> ModalResult<Expr> {
    left_assoc(input, unary, |i: &mut &str| {
        alt((
            '*'.value(BinaryOp::Mul),
            '/'.value(BinaryOp::Div),
            '%'.value(BinaryOp::Rem),
        ))
        .parse_next(i)
    })
}

/// Prefix operators are collected iteratively so long `!!!x` chains cannot
/// exhaust the stack.
fn unary(input: &mut &str) -> ModalResult<Expr> {
    let mut ops = Vec::new();
    loop {
        ws(input)?;
        match opt(prefix_operator).parse_next(input)? {
            Some(op) => ops.push(op),
            None => break,
        }
    }
    let mut expr = postfix(input)?;
    for op in ops.into_iter().rev() {
        expr = Expr::Unary {
            op,
            operand: Box::new(expr),
        };
    }
    Ok(expr)
}

fn prefix_operator(input: &mut &str) -> ModalResult<UnaryOp> {
    alt(('!'.value(UnaryOp::Not), '-'.value(UnaryOp::Neg))).parse_next(input)
}

/// Member access, indexing and calls following a primary expression.
fn postfix(input: &mut &str) -> ModalResult<Expr> {
    let mut expr = primary(input)?;
    loop {
        ws(input)?;
        if eat(input, '.')? {
            ws(input)?;
            let property = identifier(input)?;
            expr = Expr::Member {
                object: Box::new(expr),
                property: property.to_string(),
            };
        } else if eat(input, '[')? {
            let index = expression(input)?;
            ws(input)?;
            expect(input, ']')?;
            expr = Expr::Index {
                object: Box::new(expr),
                index: Box::new(index),
            };
        } else if eat(input, '(')? {
            let args = list_items(input, ')')?;
            expr = Expr::Call {
                callee: Box::new(expr),
                args,
            };
        } else {
            break;
        }
    }
    Ok(expr)
}

/// Comma separated expressions up to (and including) `close`.
fn list_items(input: &mut &str, close: char) -> ModalResult<Vec<Expr>> {
    let items: Vec<Expr> = separated(0.., expression, (ws, ',', ws)).parse_next(input)?;
    ws(input)?;
    expect(input, close)?;
    Ok(items)
}

fn primary(input: &mut &str) -> ModalResult<Expr> {
    ws(input)?;
    alt((number, string_literal, array_literal, parenthesized, word)).parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<Expr> {
    let text = numeral(input)?;
    match text.parse::<f64>() {
        Ok(n) => Ok(Expr::Literal(Literal::Number(n))),
        Err(_) => backtrack(),
    }
}

fn numeral<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_digit()),
        opt(('.', take_while(1.., |c: char| c.is_ascii_digit()))),
    )
        .take()
        .parse_next(input)
}

/// Parse a single- or double-quoted string with `\` escapes.
fn string_literal(input: &mut &str) -> ModalResult<Expr> {
    let quote = quote_mark(input)?;
    let mut out = String::new();
    loop {
        let c = next_char(input)?;
        if c == quote {
            break;
        }
        if c == '\\' {
            let escaped = next_char(input)?;
            out.push(match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                other => other,
            });
        } else {
            out.push(c);
        }
    }
    Ok(Expr::Literal(Literal::String(out)))
}

fn quote_mark(input: &mut &str) -> ModalResult<char> {
    one_of(['"', '\'']).parse_next(input)
}

fn next_char(input: &mut &str) -> ModalResult<char> {
    any.parse_next(input)
}

fn array_literal(input: &mut &str) -> ModalResult<Expr> {
    expect(input, '[')?;
    list_items(input, ']').map(Expr::Array)
}

fn parenthesized(input: &mut &str) -> ModalResult<Expr> {
    expect(input, '(')?;
    let expr = expression(input)?;
    ws(input)?;
    expect(input, ')')?;
    Ok(expr)
}

/// Keywords and identifiers.
fn word(input: &mut &str) -> ModalResult<Expr> {
    let name = identifier(input)?;
    Ok(match name {
        "true" => Expr::Literal(Literal::Bool(true)),
        "false" => Expr::Literal(Literal::Bool(false)),
        "null" | "undefined" => Expr::Literal(Literal::Null),
        _ => Expr::Identifier(name.to_string()),
    })
}

fn identifier<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (one_of(is_ident_start), take_while(0.., is_ident_cont))
        .take()
        .parse_next(input)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_cont(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Expr {
        parse_expression(source, 64).unwrap()
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse("1 + 2 * 3");
        let Expr::Binary { op, rhs, .. } = expr else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(
            *rhs,
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn return_and_semicolon_are_stripped() {
        assert_eq!(parse("return 5;"), Expr::Literal(Literal::Number(5.0)));
        assert_eq!(
            parse("returned"),
            Expr::Identifier("returned".to_string())
        );
    }

    #[test]
    fn member_call_chain() {
        let expr = parse("_.sample(users).username");
        let Expr::Member { object, property } = expr else {
            panic!("expected member access");
        };
        assert_eq!(property, "username");
        assert!(matches!(*object, Expr::Call { .. }));
    }

    #[test]
    fn strict_equality_is_preferred_over_loose() {
        let Expr::Binary { op, .. } = parse("a === 'b'") else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinaryOp::StrictEq);
    }

    #[test]
    fn trailing_garbage_reports_position() {
        let err = parse_expression("1 + 2 )", 64).unwrap_err();
        assert_eq!(
            err,
            ParseError::Syntax {
                line: 1,
                column: 7,
                message: "unexpected character: ')'".to_string(),
            }
        );
    }

    #[test]
    fn assignment_is_rejected() {
        assert!(parse_expression("a = 1", 64).is_err());
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let source = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert_eq!(
            parse_expression(&source, 5),
            Err(ParseError::TooDeep { max_depth: 5 })
        );
    }
}
