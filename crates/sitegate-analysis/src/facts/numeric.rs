//! Numeric values and claims: currency, thousands separators, magnitude
//! suffixes, percentages and "X per Y" ratios.

use std::fmt;

use regex::{Captures, Regex};

const NUMBER_PATTERN: &str = r"(?i)(?:(?P<cur>[$€£])\s?)?(?P<int>\d{1,3}(?:,\d{3})+|\d+)(?:\.(?P<frac>\d+))?(?:\s?(?P<suffix>%|percent\b|thousand\b|million\b|billion\b|mn\b|bn\b|[kmb]\b))?";

const RATIO_PATTERN: &str = r"(?i)^[\s:,]*(?:[a-z][a-z'-]*\s+){0,4}?(?:per|for\s+every|for\s+each)\s+(?P<denom>(?:[$€£]\s?)?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?)";

/// A parsed number as written: mantissa, unit multiplier and precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericValue {
    pub mantissa: f64,
    pub multiplier: f64,
    pub decimals: u32,
    pub percent: bool,
    pub currency: bool,
}

impl NumericValue {
    fn from_captures(caps: &Captures<'_>) -> Self {
        let int = caps.name("int").map_or("0", |m| m.as_str()).replace(',', "");
        let frac = caps.name("frac").map_or("", |m| m.as_str());
        let mantissa = format!("{int}.{}", if frac.is_empty() { "0" } else { frac })
            .parse::<f64>()
            .unwrap_or(0.0);
        let suffix = caps
            .name("suffix")
            .map(|m| m.as_str().to_ascii_lowercase());
        let (multiplier, percent) = match suffix.as_deref() {
            Some("%" | "percent") => (1.0, true),
            Some("k" | "thousand") => (1e3, false),
            Some("m" | "mn" | "million") => (1e6, false),
            Some("b" | "bn" | "billion") => (1e9, false),
            _ => (1.0, false),
        };
        Self {
            mantissa,
            multiplier,
            decimals: frac.len() as u32,
            percent,
            currency: caps.name("cur").is_some(),
        }
    }

    /// Absolute value with the multiplier applied.
    pub fn value(&self) -> f64 {
        self.mantissa * self.multiplier
    }

    /// Whether `claimed` (absolute) equals this value at this value's
    /// precision, expressed in this value's unit.
    pub fn agrees_with(&self, claimed: f64) -> bool {
        let scale = 10f64.powi(self.decimals as i32);
        let expected = (self.mantissa * scale).round();
        let actual = (claimed / self.multiplier * scale).round();
        expected == actual
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", self.decimals as usize, self.mantissa)
    }
}

/// A number asserted in prose.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    /// The claim as written, including any ratio phrase.
    pub text: String,
    /// Absolute value, divided by the denominator for ratios.
    pub value: f64,
    /// Byte range in the searched text.
    pub start: usize,
    pub end: usize,
}

/// Compiled number and ratio patterns.
#[derive(Debug, Clone)]
pub struct ClaimParser {
    number: Regex,
    ratio: Regex,
}

impl ClaimParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            number: Regex::new(NUMBER_PATTERN)?,
            ratio: Regex::new(RATIO_PATTERN)?,
        })
    }

    /// Parse a canonical value such as `1.80`, `$2.5M`, `12%` or `4,300`.
    /// The whole string must be one number.
    pub fn parse_value(&self, text: &str) -> Option<NumericValue> {
        let text = text.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        let caps = self.number.captures(text)?;
        let whole = caps.get(0)?;
        if whole.start() != 0 || whole.end() != text.len() {
            return None;
        }
        Some(NumericValue::from_captures(&caps))
    }

    /// The first numeric claim in `window`, skipping digits embedded in words
    /// and bare four-digit years.
    pub fn first_claim(&self, window: &str) -> Option<Claim> {
        for caps in self.number.captures_iter(window) {
            let Some(whole) = caps.get(0) else { continue };
            let (start, mut end) = (whole.start(), whole.end());
            let preceded_by_word = window[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || c == '.' || c == '_');
            if preceded_by_word {
                continue;
            }
            let parsed = NumericValue::from_captures(&caps);
            if is_year(&caps, &parsed) {
                continue;
            }

            let mut value = parsed.value();
            if let Some(ratio) = self.ratio.captures(&window[end..]) {
                let denom = ratio
                    .name("denom")
                    .and_then(|d| self.parse_value(d.as_str()))
                    .map(|d| d.value())
                    .filter(|d| *d > 0.0);
                if let (Some(denom), Some(full)) = (denom, ratio.get(0)) {
                    value /= denom;
                    end += full.end();
                }
            }
            return Some(Claim {
                text: window[start..end].trim().to_string(),
                value,
                start,
                end,
            });
        }
        None
    }
}

fn is_year(caps: &Captures<'_>, parsed: &NumericValue) -> bool {
    caps.name("cur").is_none()
        && caps.name("suffix").is_none()
        && caps.name("frac").is_none()
        && caps.name("int").is_some_and(|m| m.as_str().len() == 4)
        && (1900.0..=2100.0).contains(&parsed.mantissa)
}
