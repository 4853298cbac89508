//! src/units/scales.rs
//!
//! Static unit tables: linear scales and context-dependent conversions.

use serde_json::{Map, Value};

/// Ordered smallest to largest: `(display unit, divider)`.
pub type Scale = &'static [(&'static str, f64)];

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;
const TIB: f64 = GIB * 1024.0;

pub fn scalable(units: &str) -> Option<Scale> {
    let scale: Scale = match units {
        "num" => &[
            ("num", 1.0),
            ("num (K)", 1e3),
            ("num (M)", 1e6),
            ("num (G)", 1e9),
            ("num (T)", 1e12),
        ],
        "bytes" => &[
            ("bytes", 1.0),
            ("KB", 1e3),
            ("MB", 1e6),
            ("GB", 1e9),
            ("TB", 1e12),
        ],
        "kilobits/s" => &[
            ("bits/s", 1e-3),
            ("kilobits/s", 1.0),
            ("megabits/s", 1e3),
            ("gigabits/s", 1e6),
            ("terabits/s", 1e9),
        ],
        "kilobytes/s" | "KiB/s" => &[
            ("bytes/s", 1.0 / KIB),
            ("kilobytes/s", 1.0),
            ("megabytes/s", KIB),
            ("gigabytes/s", MIB),
            ("terabytes/s", GIB),
        ],
        "KiB" => &[
            ("B", 1.0 / KIB),
            ("KiB", 1.0),
            ("MiB", KIB),
            ("GiB", MIB),
            ("TiB", GIB),
        ],
        "MiB" => &[
            ("KiB", 1.0 / KIB),
            ("MiB", 1.0),
            ("GiB", KIB),
            ("TiB", MIB),
        ],
        "B" => &[
            ("B", 1.0),
            ("KiB", KIB),
            ("MiB", MIB),
            ("GiB", GIB),
            ("TiB", TIB),
        ],
        _ => return None,
    };
    Some(scale)
}

/// A candidate conversion, evaluated in declared priority order.
pub struct Conversable {
    pub unit: &'static str,
    pub check: fn(&Map<String, Value>, f64) -> bool,
    pub convert: fn(f64) -> f64,
}

fn temperature_is(attributes: &Map<String, Value>, wanted: &str) -> bool {
    attributes.get("temperature").and_then(Value::as_str) == Some(wanted)
}

fn seconds_as_time(attributes: &Map<String, Value>) -> bool {
    attributes
        .get("secondsAsTime")
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

static MILLISECONDS: [Conversable; 4] = [
    Conversable {
        unit: "microseconds",
        check: |_, max| max < 1.0,
        convert: |v| v * 1000.0,
    },
    Conversable {
        unit: "milliseconds",
        check: |_, max| max < 1000.0,
        convert: |v| v,
    },
    Conversable {
        unit: "seconds",
        check: |attributes, max| !seconds_as_time(attributes) || max < 60_000.0,
        convert: |v| v / 1000.0,
    },
    Conversable {
        unit: "minutes",
        check: |_, _| true,
        convert: |v| v / 60_000.0,
    },
];

static SECONDS: [Conversable; 6] = [
    Conversable {
        unit: "microseconds",
        check: |_, max| max < 0.001,
        convert: |v| v * 1_000_000.0,
    },
    Conversable {
        unit: "milliseconds",
        check: |_, max| max < 1.0,
        convert: |v| v * 1000.0,
    },
    Conversable {
        unit: "seconds",
        check: |attributes, max| !seconds_as_time(attributes) || max < 60.0,
        convert: |v| v,
    },
    Conversable {
        unit: "minutes",
        check: |_, max| max < 3_600.0,
        convert: |v| v / 60.0,
    },
    Conversable {
        unit: "hours",
        check: |_, max| max < 86_400.0,
        convert: |v| v / 3_600.0,
    },
    Conversable {
        unit: "days",
        check: |_, _| true,
        convert: |v| v / 86_400.0,
    },
];

static CELSIUS: [Conversable; 2] = [
    Conversable {
        unit: "Fahrenheit",
        check: |attributes, _| temperature_is(attributes, "fahrenheit"),
        convert: |v| v * 9.0 / 5.0 + 32.0,
    },
    Conversable {
        unit: "Celsius",
        check: |_, _| true,
        convert: |v| v,
    },
];

pub fn conversable(units: &str) -> Option<&'static [Conversable]> {
    match units {
        "milliseconds" | "ms" => Some(&MILLISECONDS),
        "seconds" | "s" => Some(&SECONDS),
        "Celsius" => Some(&CELSIUS),
        _ => None,
    }
}
