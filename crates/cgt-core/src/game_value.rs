//! Game values returned by the engine

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Result of one successful request/response exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameValue {
    canonical_form: String,
    temperature: Temperature,
}

impl GameValue {
    /// Create a game value from its parts
    pub fn new(canonical_form: impl Into<String>, temperature: Temperature) -> Self {
        Self {
            canonical_form: canonical_form.into(),
            temperature,
        }
    }

    /// Engine's canonical textual form, not interpreted by the client
    pub fn canonical_form(&self) -> &str {
        &self.canonical_form
    }

    /// Engine's reported temperature
    pub fn temperature(&self) -> Temperature {
        self.temperature
    }
}

impl fmt::Display for GameValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (temperature {})", self.canonical_form, self.temperature)
    }
}

/// Exact rational temperature, kept in lowest terms with a positive denominator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Temperature {
    numerator: i64,
    denominator: u64,
}

/// Error parsing a temperature string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTemperatureError(String);

impl fmt::Display for ParseTemperatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid temperature '{}'", self.0)
    }
}

impl std::error::Error for ParseTemperatureError {}

impl Temperature {
    /// Create `numerator / denominator`, reduced. Returns `None` for a zero denominator.
    pub fn new(numerator: i64, denominator: u64) -> Option<Self> {
        Self::reduce(numerator as i128, denominator as i128)
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// Whether the value is a whole number
    pub fn is_integer(&self) -> bool {
        self.denominator == 1
    }

    /// Nearest `f64`
    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    fn reduce(numerator: i128, denominator: i128) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        let sign = if denominator < 0 { -1 } else { 1 };
        let (mut n, mut d) = (numerator * sign, denominator * sign);
        let g = gcd(n.unsigned_abs(), d.unsigned_abs()).max(1) as i128;
        n /= g;
        d /= g;
        Some(Self {
            numerator: i64::try_from(n).ok()?,
            denominator: u64::try_from(d).ok()?,
        })
    }

    fn parse_fraction(
        s: &str,
        numerator: &str,
        denominator: &str,
    ) -> Result<Self, ParseTemperatureError> {
        let err = || ParseTemperatureError(s.to_string());
        let n: i64 = numerator.trim().parse().map_err(|_| err())?;
        let denominator = denominator.trim();
        let d: u64 = match denominator.strip_prefix("2^") {
            Some(exponent) => {
                let k: u32 = exponent.parse().map_err(|_| err())?;
                1u64.checked_shl(k).ok_or_else(err)?
            }
            None => denominator.parse().map_err(|_| err())?,
        };
        Self::new(n, d).ok_or_else(err)
    }

    /// Finite decimal such as `-1.25` or `5e-1`
    fn parse_decimal(s: &str) -> Result<Self, ParseTemperatureError> {
        let err = || ParseTemperatureError(s.to_string());
        let (mantissa, exponent) = match s.find(['e', 'E']) {
            Some(idx) => {
                let exp: i32 = s[idx + 1..].parse().map_err(|_| err())?;
                (&s[..idx], exp)
            }
            None => (s, 0),
        };
        let (negative, digits) = match mantissa.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(err());
        }

        let mut numerator: i128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            numerator = numerator
                .checked_mul(10)
                .and_then(|v| v.checked_add(i128::from(c as u8 - b'0')))
                .ok_or_else(err)?;
        }
        if negative {
            numerator = -numerator;
        }

        let frac_digits = i32::try_from(frac_part.len()).map_err(|_| err())?;
        let scale = exponent.checked_sub(frac_digits).ok_or_else(err)?;
        let pow10 = |k: u32| 10i128.checked_pow(k).ok_or_else(err);
        let (numerator, denominator) = if scale >= 0 {
            let factor = pow10(scale as u32)?;
            (numerator.checked_mul(factor).ok_or_else(err)?, 1)
        } else {
            (numerator, pow10(scale.unsigned_abs())?)
        };
        Self::reduce(numerator, denominator).ok_or_else(err)
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl From<i64> for Temperature {
    fn from(value: i64) -> Self {
        Self {
            numerator: value,
            denominator: 1,
        }
    }
}

impl FromStr for Temperature {
    type Err = ParseTemperatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.split_once('/') {
            Some((n, d)) => Self::parse_fraction(trimmed, n, d),
            None => match trimmed.parse::<i64>() {
                Ok(n) => Ok(Self::from(n)),
                Err(_) => Self::parse_decimal(trimmed),
            },
        }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integer() {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

impl PartialOrd for Temperature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Temperature {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = i128::from(self.numerator) * i128::from(other.denominator);
        let rhs = i128::from(other.numerator) * i128::from(self.denominator);
        lhs.cmp(&rhs)
    }
}

impl Serialize for Temperature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Wire shapes accepted for a temperature
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTemperature {
    Text(String),
    Number(serde_json::Number),
}

impl<'de> Deserialize<'de> for Temperature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = match RawTemperature::deserialize(deserializer)? {
            RawTemperature::Text(text) => text,
            RawTemperature::Number(number) => number.to_string(),
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}
