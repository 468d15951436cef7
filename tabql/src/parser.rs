//! Filter expression parser using nom
//!
//! Grammar:
//!
//! ```text
//! expr    := term ('|' term)*
//! term    := prefix value | value? '..' value? | value
//! prefix  := '<>' | '>=' | '<=' | '>' | '<'
//! value   := quoted | bare
//! ```

use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, none_of, one_of, space0},
    combinator::{all_consuming, map, not, opt, recognize, value as constant},
    error::{Error as NomError, ErrorKind},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, preceded, terminated},
};

use crate::ast::*;
use crate::error::{ParseError, ParseErrorKind};

/// Parse a complete expression
pub fn parse_expr(input: &str) -> Result<FilterExpr, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::new(ParseErrorKind::Empty, input));
    }

    match all_consuming(expr)(input) {
        Ok((_, parsed)) => Ok(parsed),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let position = input.len() - e.input.len();
            Err(ParseError::new(ParseErrorKind::Syntax, input).at(position))
        }
        Err(nom::Err::Incomplete(_)) => Err(ParseError::new(ParseErrorKind::Incomplete, input)),
    }
}

// ============================================================================
// Terms
// ============================================================================

fn expr(input: &str) -> IResult<&str, FilterExpr> {
    map(separated_list1(char('|'), term), |terms| FilterExpr { terms })(input)
}

fn term(input: &str) -> IResult<&str, Term> {
    delimited(space0, alt((prefixed, range, plain)), space0)(input)
}

fn prefixed(input: &str) -> IResult<&str, Term> {
    alt((
        map(preceded(tag("<>"), operand), Term::NotEqual),
        map(preceded(tag(">="), operand), |v| Term::Compare(CompareOp::Ge, v)),
        map(preceded(tag("<="), operand), |v| Term::Compare(CompareOp::Le, v)),
        map(preceded(tag(">"), operand), |v| Term::Compare(CompareOp::Gt, v)),
        map(preceded(tag("<"), operand), |v| Term::Compare(CompareOp::Lt, v)),
    ))(input)
}

fn range(input: &str) -> IResult<&str, Term> {
    let (rest, from) = opt(operand)(input)?;
    let (rest, _) = delimited(space0, tag(".."), space0)(rest)?;
    let (rest, to) = opt(operand)(rest)?;

    if from.is_none() && to.is_none() {
        return Err(nom::Err::Error(NomError::new(input, ErrorKind::Verify)));
    }

    Ok((rest, Term::Range { from, to }))
}

fn plain(input: &str) -> IResult<&str, Term> {
    alt((
        map(quoted, Term::Equal),
        map(bare, |v| {
            if v.contains('*') || v.contains('?') {
                Term::Pattern(v)
            } else {
                Term::Equal(v)
            }
        }),
    ))(input)
}

// ============================================================================
// Values
// ============================================================================

fn operand(input: &str) -> IResult<&str, String> {
    preceded(space0, alt((quoted, bare)))(input)
}

/// `'...'` with `''` standing for one quote
fn quoted(input: &str) -> IResult<&str, String> {
    delimited(
        char('\''),
        map(
            many0(alt((constant('\'', tag("''")), none_of("'")))),
            |chars: Vec<char>| chars.into_iter().collect(),
        ),
        char('\''),
    )(input)
}

/// Unquoted text up to `|` or `..`, trimmed; cannot start with a quote or an operator
fn bare(input: &str) -> IResult<&str, String> {
    let (rest, raw) = recognize(preceded(not(one_of("'<>")), many1(bare_char)))(input)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(nom::Err::Error(NomError::new(input, ErrorKind::Verify)));
    }
    Ok((rest, trimmed.to_string()))
}

fn bare_char(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(none_of("|.")),
        recognize(terminated(char('.'), not(char('.')))),
    ))(input)
}
