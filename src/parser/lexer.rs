// Small nom building blocks shared by the value parsers

use nom::{
    bytes::complete::{tag_no_case, take_while_m_n},
    character::complete::char,
    combinator::value,
    branch::alt,
    IResult,
};

/// Between `min` and `max` ASCII digits
pub fn digits<'a>(min: usize, max: usize) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    take_while_m_n(min, max, |c: char| c.is_ascii_digit())
}

/// Exactly `n` ASCII digits
pub fn fixed_digits<'a>(n: usize) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    digits(n, n)
}

/// A single literal space
pub fn space(input: &str) -> IResult<&str, char> {
    char(' ')(input)
}

/// Three-letter English month abbreviation, returned as month number (1-12)
pub fn month_abbrev(input: &str) -> IResult<&str, u32> {
    alt((
        value(1, tag_no_case("jan")),
        value(2, tag_no_case("feb")),
        value(3, tag_no_case("mar")),
        value(4, tag_no_case("apr")),
        value(5, tag_no_case("may")),
        value(6, tag_no_case("jun")),
        value(7, tag_no_case("jul")),
        value(8, tag_no_case("aug")),
        value(9, tag_no_case("sep")),
        value(10, tag_no_case("oct")),
        value(11, tag_no_case("nov")),
        value(12, tag_no_case("dec")),
    ))(input)
}
