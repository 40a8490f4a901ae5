//! printf-style numeric formats used by fixed-width numeric fields.

use crate::value::Value;

/// Conversion character of a [`NumericFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// `d` / `i`
    Integer,
    /// `f`
    Fixed,
    /// `e` (lowercase) or `E` (uppercase)
    Exponent { uppercase: bool },
}

/// A parsed format such as `%+21.14E` or `%08.3f`.
///
/// Exponents are written with a sign and at least two digits (`1.5E+03`),
/// matching the C conventions the on-disk values follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericFormat {
    pub plus: bool,
    pub space: bool,
    pub zero_pad: bool,
    pub left_align: bool,
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub conversion: Conversion,
}

impl NumericFormat {
    /// Parses a format specification. Returns a description of the problem on failure.
    pub fn parse(spec: &str) -> Result<Self, String> {
        let rest = spec
            .strip_prefix('%')
            .ok_or_else(|| format!("format {spec:?} must start with `%`"))?;
        let bytes = rest.as_bytes();
        let mut pos = 0;

        let mut format = NumericFormat {
            plus: false,
            space: false,
            zero_pad: false,
            left_align: false,
            width: None,
            precision: None,
            conversion: Conversion::Integer,
        };

        while let Some(flag) = bytes.get(pos) {
            match flag {
                b'+' => format.plus = true,
                b' ' => format.space = true,
                b'0' => format.zero_pad = true,
                b'-' => format.left_align = true,
                _ => break,
            }
            pos += 1;
        }

        let digits = |pos: &mut usize| -> Option<usize> {
            let start = *pos;
            while bytes.get(*pos).is_some_and(u8::is_ascii_digit) {
                *pos += 1;
            }
            rest[start..*pos].parse().ok()
        };

        format.width = digits(&mut pos);
        if bytes.get(pos) == Some(&b'.') {
            pos += 1;
            format.precision = Some(digits(&mut pos).unwrap_or(0));
        }

        format.conversion = match bytes.get(pos) {
            Some(b'd') | Some(b'i') => Conversion::Integer,
            Some(b'f') | Some(b'F') => Conversion::Fixed,
            Some(b'e') => Conversion::Exponent { uppercase: false },
            Some(b'E') => Conversion::Exponent { uppercase: true },
            _ => return Err(format!("format {spec:?} has no supported conversion (d, f, e, E)")),
        };
        if pos + 1 != bytes.len() {
            return Err(format!("format {spec:?} has trailing characters"));
        }

        Ok(format)
    }

    /// Formats a value. Returns `None` if the value kind cannot use this conversion.
    pub fn apply(&self, value: &Value) -> Option<String> {
        let (negative, body) = match (self.conversion, value) {
            (Conversion::Integer, Value::Int(i)) => (*i < 0, i.unsigned_abs().to_string()),
            (Conversion::Integer, _) => return None,
            (Conversion::Fixed, v) => {
                let v = v.as_float()?;
                let precision = self.precision.unwrap_or(6);
                (v.is_sign_negative() && v != 0.0, format!("{:.*}", precision, v.abs()))
            }
            (Conversion::Exponent { uppercase }, v) => {
                let v = v.as_float()?;
                let precision = self.precision.unwrap_or(6);
                (
                    v.is_sign_negative() && v != 0.0,
                    c_exponent(v.abs(), precision, uppercase),
                )
            }
        };

        let sign = if negative {
            "-"
        } else if self.plus {
            "+"
        } else if self.space {
            " "
        } else {
            ""
        };

        let width = self.width.unwrap_or(0);
        let len = sign.len() + body.len();
        if len >= width {
            return Some(format!("{sign}{body}"));
        }
        let pad = width - len;
        Some(if self.left_align {
            format!("{sign}{body}{}", " ".repeat(pad))
        } else if self.zero_pad {
            format!("{sign}{}{body}", "0".repeat(pad))
        } else {
            format!("{}{sign}{body}", " ".repeat(pad))
        })
    }
}

/// `1.5e3` -> `1.500000E+03` style output for a non-negative value.
fn c_exponent(v: f64, precision: usize, uppercase: bool) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let rust = format!("{:.*e}", precision, v);
    let (mantissa, exponent) = rust.split_once('e').unwrap_or((&rust, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let marker = if uppercase { 'E' } else { 'e' };
    let exp_sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}{marker}{exp_sign}{:02}", exponent.unsigned_abs())
}

/// Default text for an integer field: right-justified, zero-padded.
pub(crate) fn default_integer(value: i64, width: usize) -> String {
    format!("{:0width$}", value)
}

/// Default text for a float field: the shortest representation that fits,
/// right-justified and zero-padded. Returns `None` if nothing fits.
pub(crate) fn default_float(value: f64, width: usize) -> Option<String> {
    let shortest = value.to_string();
    if shortest.len() <= width {
        return Some(zero_pad(&shortest, width));
    }
    (0..=17)
        .rev()
        .map(|precision| format!("{:.*}", precision, value))
        .find(|text| text.len() <= width)
        .map(|text| zero_pad(&text, width))
}

/// Left-pads with zeros, keeping a leading `-` in front of the padding.
fn zero_pad(text: &str, width: usize) -> String {
    match text.strip_prefix('-') {
        Some(digits) => format!("-{:0>pad$}", digits, pad = width.saturating_sub(1)),
        None => format!("{:0>width$}", text),
    }
}
