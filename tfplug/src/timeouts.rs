//! Operation timeouts configured through a nested `timeouts` attribute
//!
//! Durations use Terraform's notation (`"30s"`, `"10m"`, `"1h30m"`).

use crate::error::{Result, TfplugError};
use crate::schema::{Attribute, AttributeBuilder, AttributeType, NestedType};
use crate::typed::StringValue;
use crate::validator::DurationString;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub create: StringValue,
    pub read: StringValue,
    pub update: StringValue,
    pub delete: StringValue,
}

impl Timeouts {
    pub fn create(&self, default: Duration) -> Duration {
        resolve(&self.create, default)
    }

    pub fn read(&self, default: Duration) -> Duration {
        resolve(&self.read, default)
    }

    pub fn update(&self, default: Duration) -> Duration {
        resolve(&self.update, default)
    }

    pub fn delete(&self, default: Duration) -> Duration {
        resolve(&self.delete, default)
    }
}

fn resolve(value: &StringValue, default: Duration) -> Duration {
    match value.get() {
        Some(raw) => parse_duration(raw).unwrap_or_else(|e| {
            tracing::warn!("Ignoring timeout: {}, using {}", e, format_duration(default));
            default
        }),
        None => default,
    }
}

/// Which operations the `timeouts` attribute exposes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutOpts {
    pub create: bool,
    pub read: bool,
    pub update: bool,
    pub delete: bool,
}

impl TimeoutOpts {
    pub fn all() -> Self {
        Self {
            create: true,
            read: true,
            update: true,
            delete: true,
        }
    }
}

/// Optional `timeouts` nested attribute.
pub fn timeouts_attribute(opts: TimeoutOpts) -> Attribute {
    let enabled = [
        ("create", opts.create),
        ("read", opts.read),
        ("update", opts.update),
        ("delete", opts.delete),
    ];
    let attributes = enabled
        .into_iter()
        .filter(|(_, on)| *on)
        .map(|(name, _)| {
            AttributeBuilder::new(name, AttributeType::String)
                .description(&format!(
                    "A string that can be parsed as a duration, e.g. \"30s\" or \"2h45m\". Applies to {} operations.",
                    name
                ))
                .optional()
                .validator(DurationString::create())
                .build()
        })
        .collect();

    AttributeBuilder::nested("timeouts", NestedType::single(attributes))
        .optional()
        .build()
}

/// Parses `1h30m`, `45s`, `500ms`, `1.5h` and friends.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = || TfplugError::InvalidDuration(input.to_string());
    let s = input.trim();
    if s.is_empty() {
        return Err(invalid());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        if num_len == 0 {
            return Err(invalid());
        }
        let number: f64 = rest[..num_len].parse().map_err(|_| invalid())?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let seconds = match &rest[..unit_len] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(invalid()),
        };
        total += number * seconds;
        rest = &rest[unit_len..];
    }

    Ok(Duration::from_secs_f64(total))
}

/// Formats like Go's `time.Duration`: `10m0s`, `1h30m0s`, `500ms`.
pub fn format_duration(d: impl Borrow<Duration>) -> String {
    let d = *d.borrow();
    if d.is_zero() {
        return "0s".to_string();
    }
    if d < Duration::from_secs(1) {
        let nanos = d.as_nanos();
        return if nanos >= 1_000_000 && nanos % 1_000_000 == 0 {
            format!("{}ms", nanos / 1_000_000)
        } else if nanos >= 1_000 && nanos % 1_000 == 0 {
            format!("{}µs", nanos / 1_000)
        } else {
            format!("{}ns", nanos)
        };
    }

    let total = d.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    let mut secs = seconds.to_string();
    let frac = d.subsec_nanos();
    if frac > 0 {
        let digits = format!("{:09}", frac);
        secs = format!("{}.{}", seconds, digits.trim_end_matches('0'));
    }

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
