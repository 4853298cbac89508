//! src/units.rs
//!
//! Unit conversion selection: given the metadata units, the caller's desired
//! units and the visible value bounds, pick how values are converted and how
//! many fraction digits they are shown with. Selection is pure.

pub mod scales;

use serde_json::{Map, Value};

pub use scales::{Conversable, Scale};

/// Fraction-digit ladder: the index of the first threshold below the delta.
const DECIMALS: [f64; 7] = [1000.0, 10.0, 1.0, 0.1, 0.01, 0.001, 0.0001];

#[derive(Clone, Debug, PartialEq)]
pub enum ConversionMethod {
    Original,
    Divide,
    /// Non-linear conversion from the `units` table entry `to`.
    Convert { units: String, to: String },
}

impl ConversionMethod {
    /// Attribute encoding: `original`, `divide`, or `<units> -> <to>`.
    pub fn key(&self) -> String {
        match self {
            ConversionMethod::Original => "original".to_string(),
            ConversionMethod::Divide => "divide".to_string(),
            ConversionMethod::Convert { units, to } => format!("{units} -> {to}"),
        }
    }

    pub fn parse(key: &str) -> Self {
        match key {
            "divide" => ConversionMethod::Divide,
            _ => match key.split_once(" -> ") {
                Some((units, to)) => ConversionMethod::Convert {
                    units: units.to_string(),
                    to: to.to_string(),
                },
                None => ConversionMethod::Original,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnitsConversion {
    pub method: ConversionMethod,
    pub divider: Option<f64>,
    /// Display unit after conversion.
    pub unit: String,
    /// `None` means no rounding (non-linear conversions).
    pub fraction_digits: Option<usize>,
}

/// Everything selection depends on.
#[derive(Clone, Copy, Debug)]
pub struct ConversionInput<'a> {
    /// Units reported by the metadata.
    pub units: &'a str,
    /// `auto`, `original`, or a unit from the matching table.
    pub desired_units: &'a str,
    /// Chart attributes consulted by conversion checks.
    pub attributes: &'a Map<String, Value>,
}

pub fn fraction_digits(delta: f64) -> usize {
    DECIMALS
        .iter()
        .position(|d| delta > *d)
        .unwrap_or(DECIMALS.len())
}

pub fn convert(method: &ConversionMethod, value: f64, divider: Option<f64>) -> f64 {
    match method {
        ConversionMethod::Original => value,
        ConversionMethod::Divide => match divider {
            Some(divider) if divider != 0.0 => value / divider,
            _ => value,
        },
        ConversionMethod::Convert { units, to } => scales::conversable(units)
            .and_then(|table| table.iter().find(|c| c.unit == to))
            .map_or(value, |c| (c.convert)(value)),
    }
}

fn original(units: &str) -> (ConversionMethod, Option<f64>, String) {
    (ConversionMethod::Original, None, units.to_string())
}

fn scalable(scale: Scale, input: &ConversionInput<'_>, min: f64, max: f64) -> (ConversionMethod, Option<f64>, String) {
    if input.desired_units != "auto" {
        return match scale.iter().find(|(unit, _)| *unit == input.desired_units) {
            Some((unit, divider)) => (ConversionMethod::Divide, Some(*divider), unit.to_string()),
            None => original(input.units),
        };
    }

    let delta = min.abs().max(max.abs());
    match scale.iter().rev().find(|(_, divider)| delta > *divider) {
        Some((unit, divider)) => (ConversionMethod::Divide, Some(*divider), unit.to_string()),
        None => original(input.units),
    }
}

fn conversable(
    table: &'static [Conversable],
    input: &ConversionInput<'_>,
    max: f64,
) -> (ConversionMethod, Option<f64>, String) {
    let chosen = if input.desired_units != "auto" {
        table.iter().find(|c| c.unit == input.desired_units)
    } else {
        table.iter().find(|c| (c.check)(input.attributes, max))
    };

    match chosen {
        Some(c) => (
            ConversionMethod::Convert {
                units: input.units.to_string(),
                to: c.unit.to_string(),
            },
            None,
            c.unit.to_string(),
        ),
        None => original(input.units),
    }
}

/// Pick the conversion for values within `[min, max]`.
pub fn select(input: &ConversionInput<'_>, min: f64, max: f64) -> UnitsConversion {
    let (method, divider, unit) = if input.desired_units == "original" {
        original(input.units)
    } else if let Some(scale) = scales::scalable(input.units) {
        scalable(scale, input, min, max)
    } else if let Some(table) = scales::conversable(input.units) {
        conversable(table, input, max)
    } else {
        original(input.units)
    };

    let converted_min = convert(&method, min, divider);
    let converted_max = convert(&method, max, divider);
    let delta = if converted_min == converted_max {
        converted_min.abs()
    } else {
        (converted_max - converted_min).abs()
    };

    let fraction_digits = match method {
        ConversionMethod::Original | ConversionMethod::Divide => Some(fraction_digits(delta)),
        ConversionMethod::Convert { .. } => None,
    };

    UnitsConversion {
        method,
        divider,
        unit,
        fraction_digits,
    }
}

/// Format with digit grouping and a fixed number of fraction digits.
pub fn format_value(value: f64, fraction_digits: Option<usize>) -> String {
    let text = match fraction_digits {
        Some(digits) => format!("{value:.digits$}"),
        None => value.to_string(),
    };
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int, frac) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}
