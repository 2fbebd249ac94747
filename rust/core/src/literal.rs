// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Literal codec for USDA attribute values
//!
//! Reads the textual literals found on authored attributes (scalars, tuples,
//! matrices, strings, relationship targets, asset paths) and formats new ones
//! for authoring. Every reader fails closed: malformed input yields `None`,
//! never a panic.

use nom::{
    bytes::complete::{take_till, take_while},
    character::complete::char,
    combinator::opt,
    multi::separated_list0,
    sequence::{delimited, preceded, terminated},
    IResult,
};
use smallvec::SmallVec;

/// Numeric components of a tuple or array literal.
pub type Components = SmallVec<[f64; 4]>;

/// A 4x4 matrix literal, stored row by row.
pub type MatrixRows = [[f64; 4]; 4];

/// Scan a numeric token at the start of `input`.
///
/// Accepts integers, decimals, scientific notation, `inf` and `nan`, with an
/// optional leading sign. Returns the value and the unconsumed remainder.
pub fn scan_number(input: &str) -> Option<(f64, &str)> {
    let unsigned = input.strip_prefix('+').unwrap_or(input);
    match fast_float::parse_partial::<f64, _>(unsigned) {
        Ok((value, consumed)) if consumed > 0 => Some((value, &unsigned[consumed..])),
        _ => None,
    }
}

/// Parse a literal that must be exactly one number (surrounding whitespace allowed).
pub fn parse_number(input: &str) -> Option<f64> {
    let (value, rest) = scan_number(input.trim())?;
    rest.trim().is_empty().then_some(value)
}

/// Parse a boolean literal: `1`/`0`, `true`/`false`.
pub fn parse_bool(input: &str) -> Option<bool> {
    match input.trim() {
        "1" | "true" | "True" => Some(true),
        "0" | "false" | "False" => Some(false),
        other => parse_number(other).map(|v| v != 0.0),
    }
}

/// Skip whitespace
fn ws(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c.is_whitespace())(input)
}

/// Parse a single number token
fn number(input: &str) -> IResult<&str, f64> {
    match scan_number(input) {
        Some((value, rest)) => Ok((rest, value)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

/// Comma-separated numbers with an optional trailing comma
fn number_list(input: &str) -> IResult<&str, Vec<f64>> {
    terminated(
        separated_list0(delimited(ws, char(','), ws), number),
        opt(preceded(ws, char(','))),
    )(input)
}

/// Parse tuple: (1, 2, 3)
fn paren_numbers(input: &str) -> IResult<&str, Vec<f64>> {
    delimited(
        terminated(char('('), ws),
        number_list,
        preceded(ws, char(')')),
    )(input)
}

/// Parse array: [1, 2, 3]
fn bracket_numbers(input: &str) -> IResult<&str, Vec<f64>> {
    delimited(
        terminated(char('['), ws),
        number_list,
        preceded(ws, char(']')),
    )(input)
}

/// Parse a scalar tuple `(a, b, c)` or array `[a, b, c]`.
pub fn parse_scalar_array(input: &str) -> Option<Components> {
    let trimmed = input.trim();
    let parsed = if trimmed.starts_with('[') {
        bracket_numbers(trimmed)
    } else {
        paren_numbers(trimmed)
    };
    match parsed {
        Ok((rest, values)) if rest.trim().is_empty() => Some(values.into_iter().collect()),
        _ => None,
    }
}

/// Parse a 3-component vector literal.
pub fn parse_vec3(input: &str) -> Option<[f64; 3]> {
    let values = parse_scalar_array(input)?;
    match values.as_slice() {
        [x, y, z] => Some([*x, *y, *z]),
        _ => None,
    }
}

/// Parse a 4-component vector literal.
pub fn parse_vec4(input: &str) -> Option<[f64; 4]> {
    let values = parse_scalar_array(input)?;
    match values.as_slice() {
        [a, b, c, d] => Some([*a, *b, *c, *d]),
        _ => None,
    }
}

/// Parse a quaternion literal. USDA writes quaternions real part first: `(w, x, y, z)`.
pub fn parse_quat(input: &str) -> Option<[f64; 4]> {
    parse_vec4(input)
}

/// Parse matrix: ( (r0), (r1), (r2), (r3) )
fn matrix_rows(input: &str) -> IResult<&str, Vec<Vec<f64>>> {
    delimited(
        terminated(char('('), ws),
        separated_list0(delimited(ws, char(','), ws), paren_numbers),
        preceded(ws, char(')')),
    )(input)
}

/// Parse a 4x4 matrix literal written as four parenthesized rows.
pub fn parse_matrix4(input: &str) -> Option<MatrixRows> {
    let (rest, rows) = matrix_rows(input.trim()).ok()?;
    if !rest.trim().is_empty() || rows.len() != 4 {
        return None;
    }
    let mut matrix = [[0.0; 4]; 4];
    for (target, row) in matrix.iter_mut().zip(rows.iter()) {
        if row.len() != 4 {
            return None;
        }
        target.copy_from_slice(row);
    }
    Some(matrix)
}

/// Parse string content up to the closing quote, resolving backslash escapes.
fn quoted(input: &str) -> IResult<&str, String> {
    fn fail(input: &str) -> nom::Err<nom::error::Error<&str>> {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char))
    }

    // Triple-quoted strings carry their content verbatim
    if let Some(body) = input.strip_prefix("\"\"\"") {
        let end = body.find("\"\"\"").ok_or_else(|| fail(input))?;
        return Ok((&body[end + 3..], body[..end].to_string()));
    }

    let quote = match input.chars().next() {
        Some(c @ ('"' | '\'')) => c,
        _ => return Err(fail(input)),
    };

    let mut out = String::new();
    let mut chars = input[1..].char_indices();
    while let Some((i, c)) = chars.next() {
        if c == quote {
            return Ok((&input[1 + i + c.len_utf8()..], out));
        }
        if c == '\\' {
            match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, escaped)) => out.push(escaped),
                None => return Err(fail(input)),
            }
        } else {
            out.push(c);
        }
    }

    // No closing quote found
    Err(fail(input))
}

/// Parse a quoted string literal (`"..."`, `'...'` or `"""..."""`).
pub fn parse_string(input: &str) -> Option<String> {
    match quoted(input.trim()) {
        Ok((rest, value)) if rest.trim().is_empty() => Some(value),
        _ => None,
    }
}

/// Parse a token literal: a quoted string or a bare identifier.
pub fn parse_token(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.starts_with('"') || trimmed.starts_with('\'') {
        return parse_string(trimmed);
    }
    let bare = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '.' | '-'));
    bare.then(|| trimmed.to_string())
}

/// Parse relationship target: <path>
fn target(input: &str) -> IResult<&str, &str> {
    delimited(char('<'), take_till(|c| c == '>'), char('>'))(input)
}

/// Parse a single relationship target `<path>`; a one-element list `[<path>]` is accepted too.
pub fn parse_relationship_target(input: &str) -> Option<String> {
    let targets = parse_relationship_targets(input);
    match targets.as_slice() {
        [single] => Some(single.clone()),
        _ => None,
    }
}

/// Parse every relationship target in `<a>` or `[<a>, <b>]`.
///
/// Malformed entries are dropped; an empty or `None` literal yields no targets.
pub fn parse_relationship_targets(input: &str) -> Vec<String> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    body.split(',')
        .filter_map(|item| match target(item.trim()) {
            Ok((rest, path)) if rest.trim().is_empty() && !path.trim().is_empty() => {
                Some(path.trim().to_string())
            }
            _ => None,
        })
        .collect()
}

/// Parse an asset path literal `@path@`.
pub fn parse_asset(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let body = trimmed.strip_prefix('@')?;
    let end = body.find('@')?;
    body[end + 1..].trim().is_empty().then(|| body[..end].to_string())
}

/// Split a reference literal `@asset@</prim>` into its asset and optional prim path.
pub fn parse_asset_reference(input: &str) -> Option<(String, Option<String>)> {
    let trimmed = input.trim();
    let body = trimmed.strip_prefix('@')?;
    let end = body.find('@')?;
    let asset = body[..end].to_string();
    let rest = body[end + 1..].trim();
    if rest.is_empty() {
        return Some((asset, None));
    }
    match target(rest) {
        Ok((tail, path)) if tail.trim().is_empty() => Some((asset, Some(path.to_string()))),
        _ => None,
    }
}

/// Parse a string array literal `["a", "b"]`.
pub fn parse_string_array(input: &str) -> Option<Vec<String>> {
    fn strings(input: &str) -> IResult<&str, Vec<String>> {
        delimited(
            terminated(char('['), ws),
            terminated(
                separated_list0(delimited(ws, char(','), ws), quoted),
                opt(preceded(ws, char(','))),
            ),
            preceded(ws, char(']')),
        )(input)
    }

    match strings(input.trim()) {
        Ok((rest, values)) if rest.trim().is_empty() => Some(values),
        _ => None,
    }
}

/// Format a boolean as `1` or `0`.
pub fn format_bool(value: bool) -> String {
    let text = if value { "1" } else { "0" };
    text.to_string()
}

/// Format a floating value with at most 6 decimal digits, trailing zeros trimmed.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let mut text = format!("{:.6}", value);
    if text.contains('.') {
        let trimmed_len = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed_len);
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}

/// Format an integer literal.
pub fn format_int(value: i64) -> String {
    value.to_string()
}

/// Format an unsigned 32-bit literal.
pub fn format_uint(value: u32) -> String {
    value.to_string()
}

fn format_tuple(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format_float(*v)).collect();
    format!("({})", parts.join(", "))
}

/// Format a 3-component vector as `(x, y, z)`.
pub fn format_vec3(value: [f64; 3]) -> String {
    format_tuple(&value)
}

/// Format a 4-component vector (or `(w, x, y, z)` quaternion).
pub fn format_vec4(value: [f64; 4]) -> String {
    format_tuple(&value)
}

/// Format a 4x4 matrix as four parenthesized row tuples.
pub fn format_matrix4(rows: &MatrixRows) -> String {
    let parts: Vec<String> = rows.iter().map(|row| format_tuple(row)).collect();
    format!("( {} )", parts.join(", "))
}

/// Quote a string, escaping quotes and backslashes.
pub fn format_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Format a string array as `["a", "b"]`.
pub fn format_string_array(values: &[String]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format_string(v)).collect();
    format!("[{}]", parts.join(", "))
}

/// Format a relationship target as `<path>`.
pub fn format_relationship(path: &str) -> String {
    format!("<{}>", path)
}

/// Format several relationship targets as `[<a>, <b>]`.
pub fn format_relationship_array(paths: &[String]) -> String {
    let parts: Vec<String> = paths.iter().map(|p| format_relationship(p)).collect();
    format!("[{}]", parts.join(", "))
}

/// Format an asset path as `@path@`.
pub fn format_asset(path: &str) -> String {
    format!("@{}@", path)
}

/// Format a reference as `@asset@</prim>`.
pub fn format_asset_reference(asset: &str, prim_path: Option<&str>) -> String {
    match prim_path {
        Some(path) => format!("{}{}", format_asset(asset), format_relationship(path)),
        None => format_asset(asset),
    }
}
