//! Sandboxed expressions for SKU patterns.
//!
//! Patterns may embed `{{ ... }}` blocks when evaluation is switched on for a
//! generator. A block holds a single expression built from string literals,
//! integers, tokens and calls to a fixed set of pure string functions:
//!
//! ```text
//! {{ upper(substr([commerce_product_variation:product:title], 0, 3)) }}
//! ```
//!
//! Only functions on the generator's allowlist may run. Token values are
//! substituted as plain strings and never parsed again.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0},
    combinator::{all_consuming, map, opt, recognize},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, tuple},
    IResult,
};
use std::collections::BTreeSet;
use thiserror::Error;

pub const BUILTIN_FUNCTIONS: [&str; 8] = [
    "upper", "lower", "trim", "concat", "substr", "replace", "slug", "default",
];

const MAX_EXPRESSION_LENGTH: usize = 1024;
const MAX_OUTPUT_LENGTH: usize = 4096;
const BLOCK_OPEN: &str = "{{";
const BLOCK_CLOSE: &str = "}}";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("cannot parse expression '{0}'")]
    Parse(String),
    #[error("unterminated expression block")]
    Unterminated,
    #[error("expression is longer than {} characters", MAX_EXPRESSION_LENGTH)]
    TooLong,
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("function '{0}' is not allowed")]
    NotAllowed(String),
    #[error("function '{function}' expects {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: &'static str,
        found: usize,
    },
    #[error("function '{function}': {message}")]
    InvalidArgument { function: String, message: String },
    #[error("expression output exceeds {} characters", MAX_OUTPUT_LENGTH)]
    OutputTooLong,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Str(String),
    Token(String),
    Call { name: String, args: Vec<Expr> },
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn string_literal(input: &str) -> IResult<&str, Expr> {
    map(
        alt((
            delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
            delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
        )),
        |s: &str| Expr::Str(s.to_string()),
    )(input)
}

fn integer(input: &str) -> IResult<&str, Expr> {
    map(recognize(pair(opt(char('-')), digit1)), |s: &str| {
        Expr::Str(s.to_string())
    })(input)
}

fn token(input: &str) -> IResult<&str, Expr> {
    map(
        recognize(delimited(
            char('['),
            take_while1(|c: char| c != '[' && c != ']'),
            char(']'),
        )),
        |s: &str| Expr::Token(s.to_string()),
    )(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(alpha1, many0(alt((alphanumeric1, tag("_"))))))(input)
}

fn call(input: &str) -> IResult<&str, Expr> {
    map(
        tuple((
            identifier,
            ws(char('(')),
            separated_list0(char(','), expr),
            ws(char(')')),
        )),
        |(name, _, args, _)| Expr::Call {
            name: name.to_string(),
            args,
        },
    )(input)
}

fn expr(input: &str) -> IResult<&str, Expr> {
    ws(alt((string_literal, integer, token, call)))(input)
}

/// Parses a single expression (the contents of a `{{ }}` block).
pub fn parse_expression(input: &str) -> Result<Expr, ExpressionError> {
    if input.chars().count() > MAX_EXPRESSION_LENGTH {
        return Err(ExpressionError::TooLong);
    }
    all_consuming(expr)(input)
        .map(|(_, parsed)| parsed)
        .map_err(|_| ExpressionError::Parse(input.trim().to_string()))
}

/// A piece of a pattern: literal text, or an expression block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Expression(Expr),
}

pub fn split_template(template: &str) -> Result<Vec<Segment>, ExpressionError> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find(BLOCK_OPEN) {
        if start > 0 {
            segments.push(Segment::Text(rest[..start].to_string()));
        }
        let after_open = &rest[start + BLOCK_OPEN.len()..];
        let end = after_open.find(BLOCK_CLOSE).ok_or(ExpressionError::Unterminated)?;
        segments.push(Segment::Expression(parse_expression(&after_open[..end])?));
        rest = &after_open[end + BLOCK_CLOSE.len()..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }

    Ok(segments)
}

/// Evaluator restricted to an allowlist of built-in functions.
#[derive(Debug, Clone)]
pub struct Sandbox {
    allowed: BTreeSet<String>,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new(BUILTIN_FUNCTIONS.iter().map(|f| f.to_string()))
    }
}

impl Sandbox {
    pub fn new(allowed: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    /// Rejects unknown or disallowed functions without evaluating anything.
    pub fn check(&self, expr: &Expr) -> Result<(), ExpressionError> {
        match expr {
            Expr::Str(_) | Expr::Token(_) => Ok(()),
            Expr::Call { name, args } => {
                self.permit(name)?;
                args.iter().try_for_each(|arg| self.check(arg))
            }
        }
    }

    fn permit(&self, name: &str) -> Result<(), ExpressionError> {
        if !BUILTIN_FUNCTIONS.contains(&name) {
            return Err(ExpressionError::UnknownFunction(name.to_string()));
        }
        if !self.allowed.contains(name) {
            return Err(ExpressionError::NotAllowed(name.to_string()));
        }
        Ok(())
    }

    pub fn evaluate(&self, expr: &Expr, resolve_token: &dyn Fn(&str) -> String) -> Result<String, ExpressionError> {
        let output = match expr {
            Expr::Str(s) => s.clone(),
            Expr::Token(raw) => resolve_token(raw),
            Expr::Call { name, args } => {
                self.permit(name)?;
                let values = args
                    .iter()
                    .map(|arg| self.evaluate(arg, resolve_token))
                    .collect::<Result<Vec<_>, _>>()?;
                apply(name, values)?
            }
        };

        if output.chars().count() > MAX_OUTPUT_LENGTH {
            return Err(ExpressionError::OutputTooLong);
        }
        Ok(output)
    }

    /// Renders a whole pattern. `render_text` handles literal text between
    /// blocks, `resolve_token` supplies token values inside blocks.
    pub fn render(
        &self,
        template: &str,
        render_text: &dyn Fn(&str) -> String,
        resolve_token: &dyn Fn(&str) -> String,
    ) -> Result<String, ExpressionError> {
        let mut output = String::new();
        for segment in split_template(template)? {
            match segment {
                Segment::Text(text) => output.push_str(&render_text(&text)),
                Segment::Expression(expr) => output.push_str(&self.evaluate(&expr, resolve_token)?),
            }
        }
        Ok(output)
    }
}

fn arity(function: &str, args: &[String], min: usize, max: usize, expected: &'static str) -> Result<(), ExpressionError> {
    if args.len() < min || args.len() > max {
        return Err(ExpressionError::Arity {
            function: function.to_string(),
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

fn integer_argument(function: &str, value: &str) -> Result<usize, ExpressionError> {
    value.trim().parse::<usize>().map_err(|_| ExpressionError::InvalidArgument {
        function: function.to_string(),
        message: format!("'{}' is not a non-negative integer", value),
    })
}

fn slugify(value: &str) -> String {
    let mut slug = String::new();
    for c in value.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn apply(name: &str, args: Vec<String>) -> Result<String, ExpressionError> {
    match name {
        "upper" => {
            arity(name, &args, 1, 1, "1")?;
            Ok(args[0].to_uppercase())
        }
        "lower" => {
            arity(name, &args, 1, 1, "1")?;
            Ok(args[0].to_lowercase())
        }
        "trim" => {
            arity(name, &args, 1, 1, "1")?;
            Ok(args[0].trim().to_string())
        }
        "concat" => Ok(args.concat()),
        "substr" => {
            arity(name, &args, 2, 3, "2 or 3")?;
            let start = integer_argument(name, &args[1])?;
            let chars = args[0].chars().skip(start);
            Ok(match args.get(2) {
                Some(length) => chars.take(integer_argument(name, length)?).collect(),
                None => chars.collect(),
            })
        }
        "replace" => {
            arity(name, &args, 3, 3, "3")?;
            if args[1].is_empty() {
                return Ok(args[0].clone());
            }
            Ok(args[0].replace(&args[1], &args[2]))
        }
        "slug" => {
            arity(name, &args, 1, 1, "1")?;
            Ok(slugify(&args[0]))
        }
        "default" => {
            arity(name, &args, 2, 2, "2")?;
            let mut args = args;
            let fallback = args.pop().unwrap_or_default();
            let value = args.pop().unwrap_or_default();
            Ok(if value.trim().is_empty() { fallback } else { value })
        }
        other => Err(ExpressionError::UnknownFunction(other.to_string())),
    }
}
