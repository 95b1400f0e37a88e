use super::{ws, Result, UsdaParseError};
use crate::path::PrimPath;
use crate::value::{Value, ValueType};
use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag, take_until},
    character::complete::{char, digit1},
    combinator::{map, map_res, opt, recognize, value},
    multi::separated_list,
    number::complete::double,
    sequence::{delimited, pair, tuple},
    Err,
};

/// Parses a value literal of the given declared type. The declared type decides the
/// grammar, so a value that parses always matches its attribute's type.
pub fn typed_value(input: &str, value_type: ValueType) -> Result<Value> {
    match value_type {
        ValueType::Bool => map(bool_literal, Value::Bool)(input),
        ValueType::Int => map(int_literal, Value::Int)(input),
        ValueType::Float => map(real_literal, |v| Value::Float(v as f32))(input),
        ValueType::Double => map(real_literal, Value::Double)(input),
        ValueType::String => map(quoted_string, Value::String)(input),
        ValueType::Token => map(quoted_string, Value::Token)(input),
        ValueType::IntArray => map(array(int_literal), Value::IntArray)(input),
        ValueType::FloatArray => map(
            array(|i| map(real_literal, |v| v as f32)(i)),
            Value::FloatArray,
        )(input),
        ValueType::DoubleArray => map(array(real_literal), Value::DoubleArray)(input),
        ValueType::TokenArray => map(array(quoted_string), Value::TokenArray)(input),
    }
}

pub fn bool_literal(input: &str) -> Result<bool> {
    alt((value(true, tag("true")), value(false, tag("false"))))(input)
}

pub fn int_literal(input: &str) -> Result<i32> {
    map_res(recognize(pair(opt(char('-')), digit1)), |text: &str| {
        text.parse::<i32>()
    })(input)
}

pub fn real_literal(input: &str) -> Result<f64> {
    double(input)
}

/// A double-quoted string with the usual backslash escapes.
pub fn quoted_string(input: &str) -> Result<String> {
    let (input, _) = char('"')(input)?;
    let (input, text) = opt(escaped_transform(
        is_not("\"\\"),
        '\\',
        alt((
            value("\\", char('\\')),
            value("\"", char('"')),
            value("\n", char('n')),
            value("\r", char('r')),
            value("\t", char('t')),
        )),
    ))(input)?;
    let (input, _) = char('"')(input)?;

    Ok((input, text.unwrap_or_default()))
}

/// An `@`-delimited asset path, like `@./reference.usd@`. Asset paths are opaque text,
/// there is nothing to validate in them.
pub fn asset_path(input: &str) -> Result<String> {
    map(
        delimited(char('@'), take_until("@"), char('@')),
        String::from,
    )(input)
}

/// An angle-bracketed prim path, like `</root_0>`. The text between the brackets must be
/// a valid absolute path.
pub fn path_target(input: &str) -> Result<PrimPath> {
    let (input, text) = delimited(char('<'), take_until(">"), char('>'))(input)?;

    match PrimPath::try_new(text) {
        Some(path) => Ok((input, path)),
        None => Err(Err::Failure(UsdaParseError::InvalidPathTarget(
            String::from(text),
        ))),
    }
}

/// A bracketed, comma-separated list of `element`s. Empty lists are allowed.
pub fn array<'a, T>(
    element: impl Fn(&'a str) -> Result<'a, T>,
) -> impl Fn(&'a str) -> Result<'a, Vec<T>> {
    move |input| {
        delimited(
            pair(char('['), ws),
            separated_list(tuple((ws, char(','), ws)), |i| element(i)),
            pair(ws, char(']')),
        )(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ints() {
        assert_eq!(int_literal("12 ").unwrap(), (" ", 12));
        assert_eq!(int_literal("-7]").unwrap(), ("]", -7));
        assert!(int_literal("abc").is_err());
    }

    #[test]
    fn reals() {
        assert_eq!(real_literal("0.5)").unwrap(), ((")", 0.5)));
        assert_eq!(real_literal("1e-5 ").unwrap(), (" ", 1e-5));
        assert_eq!(real_literal("3 ").unwrap(), (" ", 3.0));
    }

    #[test]
    fn quoted_strings() {
        assert_eq!(quoted_string("\"hello\"").unwrap(), ("", String::from("hello")));
        assert_eq!(quoted_string("\"\"").unwrap(), ("", String::new()));
        assert_eq!(
            quoted_string("\"say \\\"hi\\\"\"").unwrap(),
            ("", String::from("say \"hi\""))
        );
        assert!(quoted_string("\"unterminated").is_err());
    }

    #[test]
    fn asset_paths() {
        assert_eq!(
            asset_path("@./reference.usd@,").unwrap(),
            (",", String::from("./reference.usd"))
        );
    }

    #[test]
    fn path_targets() {
        assert_eq!(
            path_target("</root_0/child_1>").unwrap(),
            ("", PrimPath::new("/root_0/child_1"))
        );
        assert!(path_target("<relative/path>").is_err());
    }

    #[test]
    fn arrays() {
        assert_eq!(array(int_literal)("[1, 2, 3]").unwrap(), ("", vec![1, 2, 3]));
        assert_eq!(array(int_literal)("[]").unwrap(), ("", Vec::<i32>::new()));
        assert_eq!(array(int_literal)("[ 1 , 2 ]").unwrap(), ("", vec![1, 2]));
    }

    #[test]
    fn typed_values_follow_the_declared_type() {
        assert_eq!(typed_value("12", ValueType::Int).unwrap(), ("", Value::Int(12)));
        assert_eq!(
            typed_value("[1, 2]", ValueType::IntArray).unwrap(),
            ("", Value::IntArray(vec![1, 2]))
        );
        assert_eq!(
            typed_value("0.5", ValueType::Float).unwrap(),
            ("", Value::Float(0.5))
        );
        assert_eq!(
            typed_value("\"a\"", ValueType::Token).unwrap(),
            ("", Value::Token(String::from("a")))
        );
        assert!(typed_value("\"a\"", ValueType::Int).is_err());
    }
}
