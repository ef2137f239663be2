// Copyright 2025 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Proscenium Transform: CSS-style transform strings as 2D affine matrices.
//!
//! A sprite stores a single flat affine matrix `(a, b, c, d, e, f)`. Callers usually
//! describe it with human-readable transform syntax instead, for example
//! `"translate(10px, 20px) rotate(45deg)"`. This crate provides the contract that
//! turns such text into matrix components ([`TransformResolver`]) and a default
//! implementation for CSS transform-function syntax ([`CssTransformResolver`]).
//!
//! ## Contract
//!
//! [`TransformResolver::resolve`] returns either the matrix components or `None`,
//! meaning "no valid transform: keep whatever you had". `none`, malformed input, and
//! unknown functions all resolve to `None`. A resolver may return fewer than six
//! components; [`affine_from_components`] fills the tail from the identity
//! `(1, 0, 0, 1, 0, 0)`.
//!
//! ```
//! use kurbo::Affine;
//! use proscenium_transform::{CssTransformResolver, TransformResolver, affine_from_components};
//!
//! let resolver = CssTransformResolver;
//! let coeffs = resolver.resolve("translate(10px, 20px) scale(2)").unwrap();
//! assert_eq!(
//!     affine_from_components(&coeffs),
//!     Affine::new([2.0, 0.0, 0.0, 2.0, 10.0, 20.0])
//! );
//!
//! assert!(resolver.resolve("none").is_none());
//! assert!(resolver.resolve("wobble(3)").is_none());
//! ```
//!
//! ## Supported syntax
//!
//! - `none`
//! - `matrix(a, b, c, d, e, f)`
//! - `translate(tx[, ty])`, `translateX(tx)`, `translateY(ty)`
//! - `scale(sx[, sy])`, `scaleX(sx)`, `scaleY(sy)`
//! - `rotate(angle)`
//! - `skew(ax[, ay])`, `skewX(ax)`, `skewY(ay)`
//!
//! Functions are separated by whitespace and composed left to right, so the
//! rightmost function is applied to a point first. Arguments may be separated by
//! commas or whitespace. Lengths accept an optional `px` suffix. Angles accept
//! `deg`, `rad`, `grad`, and `turn`; a bare number is only accepted for zero.
//! Function names are matched ASCII case-insensitively.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use alloc::string::{String, ToString};
use core::f64::consts::PI;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Affine;
use smallvec::SmallVec;

/// Matrix components produced by a resolver, in `(a, b, c, d, e, f)` order.
pub type Components = SmallVec<[f64; 6]>;

/// The identity matrix components.
pub const IDENTITY_COMPONENTS: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Maps transform text to affine matrix components.
///
/// Returning `None` means the text describes no valid transform and the caller should
/// keep its current matrix.
pub trait TransformResolver {
    /// Resolve `text` into matrix components, or `None` to leave the matrix unchanged.
    fn resolve(&self, text: &str) -> Option<Components>;
}

impl<F> TransformResolver for F
where
    F: Fn(&str) -> Option<Components>,
{
    fn resolve(&self, text: &str) -> Option<Components> {
        self(text)
    }
}

/// Resolver for CSS transform-function syntax.
///
/// See the crate docs for the accepted grammar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CssTransformResolver;

impl TransformResolver for CssTransformResolver {
    fn resolve(&self, text: &str) -> Option<Components> {
        let affine = parse_transform(text).ok()??;
        Some(SmallVec::from_slice(&affine.as_coeffs()))
    }
}

/// Build an [`Affine`] from up to six components, defaulting missing ones to the identity.
///
/// Components past the sixth are ignored.
pub fn affine_from_components(components: &[f64]) -> Affine {
    let mut coeffs = IDENTITY_COMPONENTS;
    for (slot, value) in coeffs.iter_mut().zip(components) {
        *slot = *value;
    }
    Affine::new(coeffs)
}

/// Errors produced while parsing transform text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The input was empty or only whitespace.
    #[error("empty transform")]
    Empty,
    /// A transform function name was not recognized.
    #[error("unknown transform function `{0}`")]
    UnknownFunction(String),
    /// A character appeared where a function name or `(` was expected.
    #[error("unexpected character `{found}` at byte {position}")]
    UnexpectedChar {
        /// Byte offset into the input.
        position: usize,
        /// The offending character.
        found: char,
    },
    /// A function's argument list was never closed.
    #[error("missing `)` for `{0}`")]
    UnclosedParen(String),
    /// A function was given the wrong number of arguments.
    #[error("`{function}` takes {expected} argument(s), got {found}")]
    ArgumentCount {
        /// Function name as written.
        function: String,
        /// Human-readable expected count.
        expected: &'static str,
        /// Number of arguments supplied.
        found: usize,
    },
    /// An argument was not a number.
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    /// An argument carried a unit that is not valid in its position.
    #[error("invalid unit in `{0}`")]
    InvalidUnit(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Function {
    Matrix,
    Translate,
    TranslateX,
    TranslateY,
    Scale,
    ScaleX,
    ScaleY,
    Rotate,
    Skew,
    SkewX,
    SkewY,
}

impl Function {
    const NAMES: [(&'static str, Self); 11] = [
        ("matrix", Self::Matrix),
        ("translate", Self::Translate),
        ("translatex", Self::TranslateX),
        ("translatey", Self::TranslateY),
        ("scale", Self::Scale),
        ("scalex", Self::ScaleX),
        ("scaley", Self::ScaleY),
        ("rotate", Self::Rotate),
        ("skew", Self::Skew),
        ("skewx", Self::SkewX),
        ("skewy", Self::SkewY),
    ];

    fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, f)| *f)
    }

    /// Allowed argument counts as an inclusive range, plus its description.
    fn arity(self) -> (usize, usize, &'static str) {
        match self {
            Self::Matrix => (6, 6, "6"),
            Self::Translate | Self::Scale | Self::Skew => (1, 2, "1 or 2"),
            _ => (1, 1, "1"),
        }
    }
}

/// Parse transform text into an [`Affine`].
///
/// Returns `Ok(None)` for the keyword `none`.
///
/// ```
/// use kurbo::Affine;
/// use proscenium_transform::parse_transform;
///
/// let m = parse_transform("matrix(1, 0, 0, 1, 5, 6)").unwrap().unwrap();
/// assert_eq!(m, Affine::translate((5.0, 6.0)));
/// assert_eq!(parse_transform("none"), Ok(None));
/// assert!(parse_transform("scale(1, 2, 3)").is_err());
/// ```
pub fn parse_transform(text: &str) -> Result<Option<Affine>, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }
    if text.eq_ignore_ascii_case("none") {
        return Ok(None);
    }

    let mut acc = Affine::IDENTITY;
    let mut rest = text;
    while !rest.is_empty() {
        let offset = text.len() - rest.len();
        let name_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        if name_len == 0 {
            let found = rest.chars().next().unwrap_or(' ');
            return Err(ParseError::UnexpectedChar {
                position: offset,
                found,
            });
        }
        let name = &rest[..name_len];
        let after_name = rest[name_len..].trim_start();
        let Some(args_start) = after_name.strip_prefix('(') else {
            let position = text.len() - after_name.len();
            return Err(match after_name.chars().next() {
                Some(found) => ParseError::UnexpectedChar { position, found },
                None => ParseError::UnclosedParen(name.to_string()),
            });
        };
        let Some(close) = args_start.find(')') else {
            return Err(ParseError::UnclosedParen(name.to_string()));
        };

        let function = Function::from_name(name)
            .ok_or_else(|| ParseError::UnknownFunction(name.to_string()))?;
        acc *= function_affine(function, name, &args_start[..close])?;

        rest = args_start[close + 1..].trim_start();
    }
    Ok(Some(acc))
}

fn function_affine(function: Function, name: &str, args: &str) -> Result<Affine, ParseError> {
    let args: SmallVec<[&str; 6]> = args
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|a| !a.is_empty())
        .collect();
    let (min, max, expected) = function.arity();
    if args.len() < min || args.len() > max {
        return Err(ParseError::ArgumentCount {
            function: name.to_string(),
            expected,
            found: args.len(),
        });
    }

    let affine = match function {
        Function::Matrix => {
            let mut coeffs = [0.0; 6];
            for (slot, arg) in coeffs.iter_mut().zip(&args) {
                *slot = number(arg)?;
            }
            Affine::new(coeffs)
        }
        Function::Translate => {
            let tx = length(args[0])?;
            let ty = args.get(1).map(|a| length(a)).transpose()?.unwrap_or(0.0);
            Affine::translate((tx, ty))
        }
        Function::TranslateX => Affine::translate((length(args[0])?, 0.0)),
        Function::TranslateY => Affine::translate((0.0, length(args[0])?)),
        Function::Scale => {
            let sx = number(args[0])?;
            let sy = args.get(1).map(|a| number(a)).transpose()?.unwrap_or(sx);
            Affine::scale_non_uniform(sx, sy)
        }
        Function::ScaleX => Affine::scale_non_uniform(number(args[0])?, 1.0),
        Function::ScaleY => Affine::scale_non_uniform(1.0, number(args[0])?),
        Function::Rotate => Affine::rotate(angle(args[0])?),
        Function::Skew => {
            let ax = angle(args[0])?;
            let ay = args.get(1).map(|a| angle(a)).transpose()?.unwrap_or(0.0);
            Affine::skew(ax.tan(), ay.tan())
        }
        Function::SkewX => Affine::skew(angle(args[0])?.tan(), 0.0),
        Function::SkewY => Affine::skew(0.0, angle(args[0])?.tan()),
    };
    Ok(affine)
}

/// Split a token into its numeric prefix and unit suffix.
fn split_unit(token: &str) -> (&str, &str) {
    let unit_start = token
        .rfind(|c: char| c.is_ascii_digit() || c == '.')
        .map_or(0, |i| i + 1);
    token.split_at(unit_start)
}

fn number(token: &str) -> Result<f64, ParseError> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber(token.to_string()))
}

fn length(token: &str) -> Result<f64, ParseError> {
    let (value, unit) = split_unit(token);
    let value = number(value)?;
    if unit.is_empty() || unit.eq_ignore_ascii_case("px") {
        Ok(value)
    } else {
        Err(ParseError::InvalidUnit(token.to_string()))
    }
}

/// Parse an angle into radians.
fn angle(token: &str) -> Result<f64, ParseError> {
    let (value, unit) = split_unit(token);
    let value = number(value)?;
    let unit = unit.to_ascii_lowercase();
    match unit.as_str() {
        "deg" => Ok(value * PI / 180.0),
        "rad" => Ok(value),
        "grad" => Ok(value * PI / 200.0),
        "turn" => Ok(value * 2.0 * PI),
        "" if value == 0.0 => Ok(0.0),
        _ => Err(ParseError::InvalidUnit(token.to_string())),
    }
}
