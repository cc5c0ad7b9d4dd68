// Sample decoder - tolerant multi-format line parsing
//
// Each supported layout is a `DecodeStrategy`; `decode` tries them in order and
// returns the first success. Adding a layout means adding a strategy to the list.
use super::sample::MotorSample;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Fewest fields any layout can be recovered from
pub const MIN_FIELDS: usize = 6;

/// Column-name fragments that mark the first line of a source as a header
pub const HEADER_MARKERS: [&str; 8] = [
    "timestamp",
    "iq",
    "id",
    "coolant",
    "ambient",
    "torque",
    "u_q",
    "stator_winding",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Empty line")]
    EmptyLine,
    #[error("Unable to parse line - found {found} parts, expected at least {required}")]
    Unparseable { found: usize, required: usize },
}

/// A line after quote stripping and field splitting
#[derive(Debug)]
pub struct DecodeInput<'a> {
    pub cleaned: &'a str,
    pub tokens: Vec<&'a str>,
    /// Instant used whenever the layout carries no timestamp
    pub now: DateTime<Utc>,
}

pub trait DecodeStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Attempt to decode; `None` hands the line to the next strategy
    fn attempt(&self, input: &DecodeInput<'_>) -> Option<MotorSample>;
}

/// measures_v2 layout:
/// u_q,coolant,stator_winding,u_d,stator_tooth,motor_speed,i_d,i_q,pm,stator_yoke,ambient,torque,profile_id
pub struct StructuredSchema;

impl DecodeStrategy for StructuredSchema {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn attempt(&self, input: &DecodeInput<'_>) -> Option<MotorSample> {
        let t = &input.tokens;
        if t.len() < 13 {
            return None;
        }
        Some(MotorSample::new(
            input.now,
            parse_f64(t[7])?,
            parse_f64(t[6])?,
            parse_f64(t[1])?,
            parse_i32(t[12])?,
            parse_f64(t[10])?,
            parse_f64(t[11])?,
        ))
    }
}

/// Timestamp,Iq,Id,Coolant,ProfileId,Ambient[,Torque]
pub struct LegacySchema;

impl DecodeStrategy for LegacySchema {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn attempt(&self, input: &DecodeInput<'_>) -> Option<MotorSample> {
        let t = &input.tokens;
        if !(MIN_FIELDS..13).contains(&t.len()) {
            return None;
        }
        let timestamp = parse_timestamp(t[0]).unwrap_or(input.now);
        let iq = parse_f64(t[1])?;
        let id = parse_f64(t[2])?;
        let coolant = parse_f64(t[3])?;
        let profile_id = parse_i32(t[4])?;
        let ambient = parse_f64(t[5])?;
        let torque = t.get(6).and_then(|v| parse_f64(v)).unwrap_or(0.0);
        Some(MotorSample::new(
            timestamp, iq, id, coolant, profile_id, ambient, torque,
        ))
    }
}

/// Last resort: numeric tokens in order of appearance
pub struct NumericTokens;

impl DecodeStrategy for NumericTokens {
    fn name(&self) -> &'static str {
        "numeric-tokens"
    }

    fn attempt(&self, input: &DecodeInput<'_>) -> Option<MotorSample> {
        let numbers: Vec<&str> = numeric_pattern()
            .find_iter(input.cleaned)
            .map(|m| m.as_str())
            .collect();
        if numbers.len() < MIN_FIELDS {
            return None;
        }
        // torque is only taken when a seventh token shows the row carries it
        let torque = if numbers.len() > MIN_FIELDS {
            parse_f64(numbers[5])?
        } else {
            0.0
        };
        Some(MotorSample::new(
            input.now,
            parse_f64(numbers[0])?,
            parse_f64(numbers[1])?,
            parse_f64(numbers[2])?,
            parse_i32(numbers[3])?,
            parse_f64(numbers[4])?,
            torque,
        ))
    }
}

fn numeric_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("numeric token pattern is valid"))
}

static STRATEGIES: [&dyn DecodeStrategy; 3] = [&StructuredSchema, &LegacySchema, &NumericTokens];

/// Decode one raw line. `now` stamps layouts without a timestamp column.
pub fn decode(line: &str, now: DateTime<Utc>) -> Result<MotorSample, DecodeError> {
    if line.trim().is_empty() {
        return Err(DecodeError::EmptyLine);
    }

    let cleaned = line.replace('"', "");
    let input = DecodeInput {
        cleaned: &cleaned,
        tokens: cleaned.split([',', ';', '\t']).collect(),
        now,
    };

    for strategy in STRATEGIES {
        if let Some(sample) = strategy.attempt(&input) {
            tracing::trace!(strategy = strategy.name(), "decoded line");
            return Ok(sample);
        }
    }

    Err(DecodeError::Unparseable {
        found: input.tokens.len(),
        required: MIN_FIELDS,
    })
}

/// Whether a first line looks like a column header
pub fn is_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    HEADER_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn parse_f64(token: &str) -> Option<f64> {
    token.trim().parse().ok()
}

fn parse_i32(token: &str) -> Option<i32> {
    token.trim().parse().ok()
}

fn parse_timestamp(token: &str) -> Option<DateTime<Utc>> {
    let token = token.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(token) {
        return Some(ts.with_timezone(&Utc));
    }
    const DATE_TIMES: [&str; 6] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%m/%d/%Y %H:%M:%S%.f",
        "%m/%d/%Y %H:%M",
        "%m/%d/%Y %I:%M:%S %p",
    ];
    for format in DATE_TIMES {
        if let Ok(naive) = NaiveDateTime::parse_from_str(token, format) {
            return Some(naive.and_utc());
        }
    }
    ["%Y-%m-%d", "%m/%d/%Y"]
        .into_iter()
        .find_map(|format| NaiveDate::parse_from_str(token, format).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
