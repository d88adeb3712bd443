//! Output format masks.
//!
//! Two kinds of mask can be attached to a column through `sdn_odv_format`:
//! SeaDataNet ISO 8601 time masks (`YYYY-MM-DDThh:mm:ss.sss`) for timestamp
//! columns, and printf-style masks (`%5.2f`) for numeric columns. Masks are
//! parsed once per export; a mask that does not parse is reported in the
//! header and the column falls back to its default rendering.

use chrono::{DateTime, Datelike, Timelike, Utc};
use regex::Regex;
use std::sync::LazyLock;

static NUMBER_MASK: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^((?:[^%]|%%)*)%([-+ 0]*)(\d+)?(?:\.(\d+))?([feEgG])((?:[^%]|%%)*)$").ok()
});

/// Parsed SeaDataNet time mask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeMask {
    mask: String,
    tokens: Vec<TimeToken>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeToken {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    /// Fractional seconds with this many digits
    Fraction(usize),
    Literal(char),
}

impl TimeMask {
    /// Parse a mask; it must start with the year and use only known tokens
    pub fn parse(mask: &str) -> Option<Self> {
        if !mask.starts_with("YYYY") {
            return None;
        }

        let mut tokens = Vec::new();
        let mut rest = mask;
        while !rest.is_empty() {
            let (token, len) = if rest.starts_with("YYYY") {
                (TimeToken::Year, 4)
            } else if rest.starts_with("MM") {
                (TimeToken::Month, 2)
            } else if rest.starts_with("DD") {
                (TimeToken::Day, 2)
            } else if rest.starts_with("hh") {
                (TimeToken::Hour, 2)
            } else if rest.starts_with("mm") {
                (TimeToken::Minute, 2)
            } else if rest.starts_with("ss") {
                (TimeToken::Second, 2)
            } else if let Some(fraction) = rest.strip_prefix('.') {
                let digits = fraction.chars().take_while(|&c| c == 's').count();
                if digits == 0 || digits > 9 {
                    return None;
                }
                (TimeToken::Fraction(digits), digits + 1)
            } else if rest == "Z" {
                (TimeToken::Literal('Z'), 1)
            } else {
                match rest.chars().next() {
                    Some(c @ ('-' | 'T' | ':' | ' ' | '/')) => (TimeToken::Literal(c), 1),
                    _ => return None,
                }
            };
            tokens.push(token);
            rest = &rest[len..];
        }

        Some(Self {
            mask: mask.to_string(),
            tokens,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.mask
    }

    /// Format epoch seconds; missing or out-of-range times render empty
    pub fn format_seconds(&self, seconds: Option<f64>) -> String {
        let Some(time) = seconds.and_then(epoch_to_datetime) else {
            return String::new();
        };

        let mut out = String::with_capacity(self.mask.len());
        for token in &self.tokens {
            match token {
                TimeToken::Year => out.push_str(&format!("{:04}", time.year())),
                TimeToken::Month => out.push_str(&format!("{:02}", time.month())),
                TimeToken::Day => out.push_str(&format!("{:02}", time.day())),
                TimeToken::Hour => out.push_str(&format!("{:02}", time.hour())),
                TimeToken::Minute => out.push_str(&format!("{:02}", time.minute())),
                TimeToken::Second => out.push_str(&format!("{:02}", time.second())),
                TimeToken::Fraction(digits) => {
                    let nanos = format!("{:09}", time.nanosecond() % 1_000_000_000);
                    out.push('.');
                    out.push_str(&nanos[..*digits]);
                }
                TimeToken::Literal(c) => out.push(*c),
            }
        }
        out
    }
}

/// Epoch seconds rounded to the millisecond
fn epoch_to_datetime(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let millis = (seconds * 1000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

/// Parsed printf-style numeric mask with a single floating conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    mask: String,
    prefix: String,
    suffix: String,
    left_align: bool,
    plus_sign: bool,
    space_sign: bool,
    zero_pad: bool,
    width: usize,
    precision: Option<usize>,
    conversion: char,
}

impl NumberFormat {
    pub fn parse(mask: &str) -> Option<Self> {
        let caps = NUMBER_MASK.as_ref()?.captures(mask)?;

        let flags = caps.get(2).map_or("", |m| m.as_str());
        let width = match caps.get(3) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        let precision = match caps.get(4) {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        };
        let conversion = caps.get(5)?.as_str().chars().next()?;

        Some(Self {
            mask: mask.to_string(),
            prefix: caps.get(1).map_or("", |m| m.as_str()).replace("%%", "%"),
            suffix: caps.get(6).map_or("", |m| m.as_str()).replace("%%", "%"),
            left_align: flags.contains('-'),
            plus_sign: flags.contains('+'),
            space_sign: flags.contains(' '),
            zero_pad: flags.contains('0'),
            width,
            precision,
            conversion,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.mask
    }

    pub fn format(&self, value: f64) -> String {
        let digits = Digits::of(value.abs());
        let precision = self.precision.unwrap_or(6);
        let body = match self.conversion {
            'f' => digits.fixed(precision),
            'e' => digits.scientific(precision, false),
            'E' => digits.scientific(precision, true),
            'g' => digits.general(precision, false),
            _ => digits.general(precision, true),
        };

        let sign = if value.is_sign_negative() {
            "-"
        } else if self.plus_sign {
            "+"
        } else if self.space_sign {
            " "
        } else {
            ""
        };

        let len = sign.len() + body.len();
        let padding = self.width.saturating_sub(len);
        let number = if padding == 0 {
            format!("{sign}{body}")
        } else if self.left_align {
            format!("{sign}{body}{}", " ".repeat(padding))
        } else if self.zero_pad {
            format!("{sign}{}{body}", "0".repeat(padding))
        } else {
            format!("{}{sign}{body}", " ".repeat(padding))
        };

        format!("{}{}{}", self.prefix, number, self.suffix)
    }
}

/// Decimal digits of a non-negative value, read as `d0.d1d2... x 10^exponent`.
///
/// Rounding works on the shortest decimal form of the value and goes half
/// up, so `10.25` with one decimal gives `10.3`.
#[derive(Debug, Clone)]
struct Digits {
    digits: Vec<u8>,
    exponent: i32,
}

impl Digits {
    fn of(magnitude: f64) -> Self {
        let text = format!("{:e}", magnitude);
        let (mantissa, exponent) = text.split_once('e').unwrap_or((&text, "0"));
        let digits: Vec<u8> = mantissa
            .bytes()
            .filter(u8::is_ascii_digit)
            .map(|b| b - b'0')
            .collect();
        if digits.iter().all(|&d| d == 0) {
            return Self::zero();
        }
        Self {
            digits,
            exponent: exponent.parse().unwrap_or(0),
        }
    }

    fn zero() -> Self {
        Self {
            digits: vec![0],
            exponent: 0,
        }
    }

    fn is_zero(&self) -> bool {
        self.digits.iter().all(|&d| d == 0)
    }

    /// Keep `count` significant digits
    fn rounded(&self, count: i32) -> Self {
        if self.is_zero() || count < 0 {
            return Self::zero();
        }
        if count == 0 {
            return if self.digits[0] >= 5 {
                Self {
                    digits: vec![1],
                    exponent: self.exponent + 1,
                }
            } else {
                Self::zero()
            };
        }

        let count = count as usize;
        if self.digits.len() <= count {
            return self.clone();
        }

        let mut digits = self.digits[..count].to_vec();
        let mut exponent = self.exponent;
        if self.digits[count] >= 5 {
            let mut carry = true;
            for digit in digits.iter_mut().rev() {
                if *digit == 9 {
                    *digit = 0;
                } else {
                    *digit += 1;
                    carry = false;
                    break;
                }
            }
            if carry {
                digits.insert(0, 1);
                digits.pop();
                exponent += 1;
            }
        }
        Self { digits, exponent }
    }

    /// Digit in front of `10^power`, zero outside the stored digits
    fn digit_at(&self, power: i32) -> char {
        let index = self.exponent - power;
        if index < 0 {
            return '0';
        }
        self.digits
            .get(index as usize)
            .map_or('0', |d| char::from(b'0' + d))
    }

    /// `%f`: `precision` decimals
    fn fixed(&self, precision: usize) -> String {
        let rounded = self.rounded(self.exponent + 1 + precision as i32);
        let mut out: String = (0..=rounded.exponent.max(0))
            .rev()
            .map(|power| rounded.digit_at(power))
            .collect();
        if precision > 0 {
            out.push('.');
            out.extend((1..=precision as i32).map(|power| rounded.digit_at(-power)));
        }
        out
    }

    /// `%e`: mantissa with `precision` decimals, signed exponent of two or more digits
    fn scientific(&self, precision: usize, upper: bool) -> String {
        let rounded = self.rounded(precision as i32 + 1);
        let mut out = String::new();
        out.push(rounded.digit_at(rounded.exponent));
        if precision > 0 {
            out.push('.');
            out.extend((1..=precision as i32).map(|i| rounded.digit_at(rounded.exponent - i)));
        }
        out.push(if upper { 'E' } else { 'e' });
        out.push(if rounded.exponent < 0 { '-' } else { '+' });
        out.push_str(&format!("{:02}", rounded.exponent.abs()));
        out
    }

    /// `%g`: `precision` significant digits, fixed notation unless the
    /// exponent is below -4 or reaches the precision
    fn general(&self, precision: usize, upper: bool) -> String {
        let precision = precision.max(1);
        let rounded = self.rounded(precision as i32);
        if rounded.is_zero() {
            return rounded.fixed(precision - 1);
        }

        if rounded.exponent >= -4 && rounded.exponent < precision as i32 {
            let decimals = (precision as i32 - 1 - rounded.exponent).max(0) as usize;
            rounded.fixed(decimals)
        } else {
            rounded.scientific(precision - 1, upper)
        }
    }
}

/// Output mask attached to a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    Time(TimeMask),
    Number(NumberFormat),
}

impl OutputFormat {
    pub fn as_str(&self) -> &str {
        match self {
            OutputFormat::Time(mask) => mask.as_str(),
            OutputFormat::Number(format) => format.as_str(),
        }
    }
}

/// Parse text as a finite number, the precondition for applying a mask
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
