//! printf-style column formats.
//!
//! Every column may carry a format string such as `"%v"` (the default),
//! `"%-8s"` or `"%.2f"`. A format holds a single directive that formats the
//! cell value; any text around it is copied literally.
//!
//! Supported verbs: `v` and `s` (display form, precision truncates strings),
//! `d`, `f`/`F`, `e`/`E` and `g`/`G` for numbers, `x`/`X` (hex of integers or
//! string bytes), `q` (quoted string) and `t` (booleans). Exponents always
//! carry a sign and at least two digits, as in `1.5e+03`.
//!
//! Parsing never fails. Mismatches degrade instead of erroring:
//!
//! - a verb that does not fit the value (e.g. `%d` on a string) falls back to
//!   the value's display form, still padded to the requested width
//! - a format without a directive prints literally and drops the value
//! - only the first directive is interpreted; later ones are literal text

use crate::value::Value;

/// The default format: the value's display form.
pub const DEFAULT_FORMAT: &str = "%v";

/// A parsed single-value format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    prefix: String,
    directive: Option<Directive>,
    suffix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Directive {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    width: Option<usize>,
    precision: Option<usize>,
    verb: char,
}

impl Default for Format {
    fn default() -> Self {
        Format::parse(DEFAULT_FORMAT)
    }
}

impl Format {
    /// Parse a format string.
    pub fn parse(source: &str) -> Self {
        let mut chars = source.chars().peekable();
        let mut prefix = String::new();
        let mut directive = None;

        while let Some(c) = chars.next() {
            if c != '%' {
                prefix.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                prefix.push('%');
                continue;
            }

            let mut d = Directive::default();
            let mut raw = String::from("%");
            while let Some(&flag) = chars.peek() {
                match flag {
                    '-' => d.left = true,
                    '+' => d.plus = true,
                    ' ' => d.space = true,
                    '0' => d.zero = true,
                    '#' => {}
                    _ => break,
                }
                raw.push(flag);
                chars.next();
            }
            d.width = take_number(&mut chars, &mut raw);
            if chars.peek() == Some(&'.') {
                raw.push('.');
                chars.next();
                d.precision = Some(take_number(&mut chars, &mut raw).unwrap_or(0));
            }
            match chars.next() {
                Some(verb) => {
                    d.verb = verb;
                    directive = Some(d);
                }
                // Dangling directive at the end of the string is literal text.
                None => prefix.push_str(&raw),
            }
            break;
        }

        let rest: String = chars.collect();
        Format {
            prefix,
            directive,
            suffix: rest.replace("%%", "%"),
        }
    }

    /// Format one value.
    pub fn apply(&self, value: &Value) -> String {
        let Some(d) = &self.directive else {
            return format!("{}{}", self.prefix, self.suffix);
        };
        let (body, numeric) = d.render(value);
        format!("{}{}{}", self.prefix, d.pad(body, numeric), self.suffix)
    }
}

fn take_number(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    raw: &mut String,
) -> Option<usize> {
    let mut digits = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    raw.push_str(&digits);
    digits.parse().ok()
}

impl Directive {
    /// Render the value body; the flag reports whether it is a number that
    /// may take zero padding.
    fn render(&self, value: &Value) -> (String, bool) {
        match (self.verb, value) {
            ('v' | 's', Value::Str(s)) => (self.truncate(s), false),
            ('v', Value::Float(x)) if self.precision.is_some() => {
                (self.signed(format!("{:.*}", self.precision.unwrap_or(0), x)), true)
            }
            ('v', Value::Int(_) | Value::Float(_)) => (self.signed(value.to_string()), true),
            ('d', Value::Int(i)) => (self.signed(i.to_string()), true),
            ('f' | 'F', Value::Int(_) | Value::Float(_)) => {
                let x = value.as_f64().unwrap_or_default();
                let precision = self.precision.unwrap_or(6);
                (self.signed(format!("{:.*}", precision, x)), true)
            }
            ('e' | 'E', Value::Int(_) | Value::Float(_)) => {
                let x = value.as_f64().unwrap_or_default();
                let body = exponent_form(&format!("{:.*e}", self.precision.unwrap_or(6), x));
                (self.signed(self.upper(body)), true)
            }
            ('g' | 'G', Value::Int(_) | Value::Float(_)) => {
                let x = value.as_f64().unwrap_or_default();
                (self.signed(self.upper(self.general(x))), true)
            }
            ('t', Value::Bool(b)) => (b.to_string(), false),
            ('x' | 'X', Value::Int(i)) => {
                let hex = if *i < 0 {
                    format!("-{:x}", i.unsigned_abs())
                } else {
                    format!("{:x}", i)
                };
                (self.case(hex), true)
            }
            ('x' | 'X', Value::Str(s)) => {
                let hex: String = s.bytes().map(|b| format!("{:02x}", b)).collect();
                (self.case(hex), false)
            }
            ('q', Value::Str(s)) => (format!("{:?}", s), false),
            _ => (value.to_string(), false),
        }
    }

    fn truncate(&self, s: &str) -> String {
        match self.precision {
            Some(p) => s.chars().take(p).collect(),
            None => s.to_string(),
        }
    }

    fn signed(&self, digits: String) -> String {
        if digits.starts_with('-') {
            digits
        } else if self.plus {
            format!("+{}", digits)
        } else if self.space {
            format!(" {}", digits)
        } else {
            digits
        }
    }

    fn case(&self, hex: String) -> String {
        if self.verb == 'X' {
            hex.to_uppercase()
        } else {
            hex
        }
    }

    fn upper(&self, body: String) -> String {
        if self.verb.is_ascii_uppercase() {
            body.to_uppercase()
        } else {
            body
        }
    }

    /// `%g`: exponent form for large or tiny magnitudes, fixed otherwise.
    /// Precision counts significant digits; without one the shortest
    /// representation is used.
    fn general(&self, x: f64) -> String {
        if x == 0.0 || !x.is_finite() {
            return x.to_string();
        }
        let (scientific, limit) = match self.precision {
            Some(p) => (format!("{:.*e}", p.max(1) - 1, x), p.max(1) as i32),
            None => (format!("{:e}", x), 6),
        };
        let exp = scientific
            .split_once('e')
            .and_then(|(_, e)| e.parse::<i32>().ok())
            .unwrap_or_default();

        if exp < -4 || exp >= limit {
            let (mantissa, e) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
            return exponent_form(&format!("{}e{}", trim_zeros(mantissa), e));
        }
        match self.precision {
            Some(_) => {
                let decimals = (limit - 1 - exp).max(0) as usize;
                trim_zeros(&format!("{:.*}", decimals, x)).to_string()
            }
            None => x.to_string(),
        }
    }

    fn pad(&self, body: String, numeric: bool) -> String {
        let Some(width) = self.width else {
            return body;
        };
        let len = body.chars().count();
        if len >= width {
            return body;
        }
        let fill = width - len;
        if self.left {
            format!("{}{}", body, " ".repeat(fill))
        } else if self.zero && numeric {
            let sign_len = body
                .chars()
                .next()
                .filter(|c| matches!(c, '-' | '+' | ' '))
                .map_or(0, |c| c.len_utf8());
            let (sign, digits) = body.split_at(sign_len);
            format!("{}{}{}", sign, "0".repeat(fill), digits)
        } else {
            format!("{}{}", " ".repeat(fill), body)
        }
    }
}

/// Rewrite Rust's `1.5e3` exponent as `1.5e+03`
fn exponent_form(scientific: &str) -> String {
    let Some((mantissa, exp)) = scientific.split_once('e') else {
        return scientific.to_string();
    };
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exp),
    };
    format!("{}e{}{:0>2}", mantissa, sign, digits)
}

fn trim_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
