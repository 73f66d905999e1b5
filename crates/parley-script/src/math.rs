//! Numeric expression evaluator for `(math.…)` filters.
//!
//! Supports `+ - * / % ^`, unary minus, parentheses, the constants `pi` and
//! `e`, and a fixed set of functions. `^` is right associative and binds
//! tighter than unary minus, so `-2^2` is `-4`.

use std::f64::consts::{E, PI};

use winnow::combinator::{alt, opt, separated};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

use crate::MAX_OPERATORS;
use crate::error::{EvalError, ParseError, ScriptError};

/// Parentheses deeper than this are rejected before parsing, as are
/// expressions with more than [`MAX_OPERATORS`] operators.
const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Number(f64),
    Constant(String),
    Neg(Box<Node>),
    Binary(char, Box<Node>, Box<Node>),
    Call(String, Vec<Node>),
}

/// Evaluate a numeric expression. Results that are `NaN` or infinite are
/// reported as [`EvalError::NonFinite`].
pub fn evaluate(source: &str) -> Result<f64, ScriptError> {
    let body = source.trim();
    if body.is_empty() {
        return Err(ParseError::Empty.into());
    }
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut operators = 0usize;
    for c in body.chars() {
        match c {
            '(' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ')' => depth = depth.saturating_sub(1),
            '+' | '-' | '*' | '/' | '%' | '^' | ',' => operators += 1,
            _ => {}
        }
    }
    if deepest > MAX_NESTING {
        return Err(ParseError::TooDeep {
            max_depth: MAX_NESTING,
        }
        .into());
    }
    if operators > MAX_OPERATORS {
        return Err(ParseError::TooLong {
            max_operators: MAX_OPERATORS,
        }
        .into());
    }

    let mut remaining = body;
    let node = match sum(&mut remaining) {
        Ok(node) => {
            let _ = ws(&mut remaining);
            if !remaining.is_empty() {
                return Err(syntax_error(body, remaining, "unexpected input").into());
            }
            node
        }
        Err(e) => return Err(syntax_error(body, remaining, &e.to_string()).into()),
    };

    let result = eval(&node)?;
    if result.is_finite() {
        Ok(result)
    } else {
        Err(EvalError::NonFinite.into())
    }
}

fn syntax_error(body: &str, remaining: &str, message: &str) -> ParseError {
    ParseError::Syntax {
        line: 1,
        column: body.len() - remaining.len() + 1,
        message: message.to_string(),
    }
}

fn eval(node: &Node) -> Result<f64, EvalError> {
    Ok(match node {
        Node::Number(n) => *n,
        Node::Constant(name) => match name.as_str() {
            "pi" | "PI" => PI,
            "e" | "E" => E,
            _ => return Err(EvalError::UnknownIdentifier { name: name.clone() }),
        },
        Node::Neg(inner) => -eval(inner)?,
        Node::Binary(op, lhs, rhs) => {
            let (a, b) = (eval(lhs)?, eval(rhs)?);
            match op {
                '+' => a + b,
                '-' => a - b,
                '*' => a * b,
                '/' => a / b,
                '%' => a % b,
                _ => a.powf(b),
            }
        }
        Node::Call(name, args) => {
            let values = args.iter().map(eval).collect::<Result<Vec<_>, _>>()?;
            call(name, &values)?
        }
    })
}

fn call(name: &str, args: &[f64]) -> Result<f64, EvalError> {
    let arity = |expected: &'static str| EvalError::TypeMismatch {
        function: name.to_string(),
        expected,
    };
    let unary = |f: fn(f64) -> f64| match args {
        [x] => Ok(f(*x)),
        _ => Err(arity("one argument")),
    };
    match name {
        "sqrt" => unary(f64::sqrt),
        "abs" => unary(f64::abs),
        "round" => unary(|x| (x + 0.5).floor()),
        "floor" => unary(f64::floor),
        "ceil" => unary(f64::ceil),
        "log" => match args {
            [x] => Ok(x.ln()),
            [x, base] => Ok(x.log(*base)),
            _ => Err(arity("one or two arguments")),
        },
        "exp" => unary(f64::exp),
        "sin" => unary(f64::sin),
        "cos" => unary(f64::cos),
        "tan" => unary(f64::tan),
        "pow" => match args {
            [x, y] => Ok(x.powf(*y)),
            _ => Err(arity("two arguments")),
        },
        "min" | "max" => {
            if args.is_empty() {
                return Err(arity("at least one argument"));
            }
            let fold: fn(f64, f64) -> f64 = if name == "min" { f64::min } else { f64::max };
            Ok(args.iter().copied().reduce(fold).unwrap_or(f64::NAN))
        }
        _ => Err(EvalError::UnknownFunction {
            namespace: "math".to_string(),
            name: name.to_string(),
        }),
    }
}

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., char::is_whitespace)
        .void()
        .parse_next(input)
}

fn expect(input: &mut &str, c: char) -> ModalResult<()> {
    c.void().parse_next(input)
}

fn symbol(input: &mut &str, set: &'static [char]) -> ModalResult<Option<char>> {
    ws(input)?;
    opt(one_of(set)).parse_next(input)
}

fn sum(input: &mut &str) -> ModalResult<Node> {
    let mut lhs = product(input)?;
    while let Some(op) = symbol(input, &['+', '-'])? {
        let rhs = product(input)?;
        lhs = Node::Binary(op, Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn product(input: &mut &str) -> ModalResult<Node> {
    let mut lhs = signed(input)?;
    while let Some(op) = symbol(input, &['*', '/', '%'])? {
        let rhs = signed(input)?;
        lhs = Node::Binary(op, Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

/// Leading signs, collected iteratively.
fn signed(input: &mut &str) -> ModalResult<Node> {
    let mut negate = false;
    while let Some(sign) = symbol(input, &['+', '-'])? {
        if sign == '-' {
            negate = !negate;
        }
    }
    let node = power(input)?;
    Ok(if negate { Node::Neg(Box::new(node)) } else { node })
}

fn power(input: &mut &str) -> ModalResult<Node> {
    let base = atom(input)?;
    if symbol(input, &['^'])?.is_some() {
        let exponent = signed(input)?;
        return Ok(Node::Binary('^', Box::new(base), Box::new(exponent)));
    }
    Ok(base)
}

fn atom(input: &mut &str) -> ModalResult<Node> {
    ws(input)?;
    alt((number, group, function_or_constant)).parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<Node> {
    let text = numeral(input)?;
    match text.parse::<f64>() {
        Ok(n) => Ok(Node::Number(n)),
        Err(_) => Err(ErrMode::Backtrack(ContextError::new())),
    }
}

fn numeral<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    alt((
        (
            take_while(1.., |c: char| c.is_ascii_digit()),
            opt(('.', take_while(0.., |c: char| c.is_ascii_digit()))),
        )
            .take(),
        ('.', take_while(1.., |c: char| c.is_ascii_digit())).take(),
    ))
    .parse_next(input)
}

fn group(input: &mut &str) -> ModalResult<Node> {
    expect(input, '(')?;
    let inner = sum(input)?;
    ws(input)?;
    expect(input, ')')?;
    Ok(inner)
}

fn function_or_constant(input: &mut &str) -> ModalResult<Node> {
    let name = name(input)?;
    ws(input)?;
    if symbol(input, &['('])?.is_none() {
        return Ok(Node::Constant(name.to_string()));
    }
    let args: Vec<Node> = separated(0.., sum, (ws, ',')).parse_next(input)?;
    ws(input)?;
    expect(input, ')')?;
    Ok(Node::Call(name.to_string(), args))
}

fn name<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(evaluate("-2^2").unwrap(), -4.0);
        assert_eq!(evaluate("(1 + 2) * -3").unwrap(), -9.0);
    }

    #[test]
    fn functions_and_constants() {
        assert_eq!(evaluate("sqrt(16) + max(1, 5, 3)").unwrap(), 9.0);
        assert_eq!(evaluate("round(2.5)").unwrap(), 3.0);
        assert!((evaluate("pi").unwrap() - PI).abs() < 1e-12);
    }

    #[test]
    fn division_by_zero_is_not_finite() {
        assert_eq!(
            evaluate("1 / 0"),
            Err(ScriptError::Eval(EvalError::NonFinite))
        );
    }

    #[test]
    fn unknown_function_is_reported() {
        assert!(matches!(
            evaluate("eval(1)"),
            Err(ScriptError::Eval(EvalError::UnknownFunction { .. }))
        ));
    }

    #[test]
    fn garbage_is_a_syntax_error() {
        assert!(matches!(
            evaluate("2 +"),
            Err(ScriptError::Parse(ParseError::Syntax { .. }))
        ));
        assert!(matches!(
            evaluate("2 2"),
            Err(ScriptError::Parse(ParseError::Syntax { .. }))
        ));
    }
}
