// Recognizers for the date-like string shapes used in temporal detection
//
// Each shape matches a prefix of the value, so "2024-01-05T10:00:00" is an
// ISO date and "1/5/2024 08:30" is a slash date.

use super::lexer::{digits, fixed_digits, month_abbrev, space};
use nom::{
    branch::alt,
    character::complete::char,
    combinator::map,
    sequence::tuple,
    IResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateShape {
    /// YYYY-MM-DD
    Iso,
    /// M/D/YYYY or MM/DD/YYYY
    Slash,
    /// Mon D, YYYY
    MonthName,
}

fn iso_date(input: &str) -> IResult<&str, DateShape> {
    map(
        tuple((fixed_digits(4), char('-'), fixed_digits(2), char('-'), fixed_digits(2))),
        |_| DateShape::Iso,
    )(input)
}

fn slash_date(input: &str) -> IResult<&str, DateShape> {
    map(
        tuple((digits(1, 2), char('/'), digits(1, 2), char('/'), fixed_digits(4))),
        |_| DateShape::Slash,
    )(input)
}

fn month_name_date(input: &str) -> IResult<&str, DateShape> {
    map(
        tuple((month_abbrev, space, digits(1, 2), char(','), space, fixed_digits(4))),
        |_| DateShape::MonthName,
    )(input)
}

/// Parse the leading date shape of `input`, if any
pub fn parse_date_shape(input: &str) -> IResult<&str, DateShape> {
    alt((iso_date, slash_date, month_name_date))(input)
}

/// True if the value starts with one of the recognized date shapes
pub fn looks_like_date(value: &str) -> bool {
    parse_date_shape(value.trim_start()).is_ok()
}
