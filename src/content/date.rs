//! Post date normalization
//!
//! Header dates arrive either as structured values (YAML timestamps, TOML
//! datetimes) or as plain strings. [`PostDate`] captures which one we got and
//! [`PostDate::canonical`] turns it into the single string form used for
//! sorting and output.

use chrono::{FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// YAML 1.1 date-only timestamp
    static ref DATE_RE: Regex = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap();

    /// YAML 1.1 date/time timestamp (also covers RFC 3339)
    static ref DATETIME_RE: Regex = Regex::new(
        r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[Tt]|[ \t]+)(\d{1,2}):(\d{2}):(\d{2})(?:\.(\d*))?(?:[ \t]*(Z|z|[-+]\d{1,2}(?::\d{2})?))?$"
    )
    .unwrap();
}

const ISO_DATETIME: &str = "%Y-%m-%dT%H:%M:%S";

/// A header date, classified by how it was written
#[derive(Debug, Clone, PartialEq)]
pub enum PostDate {
    /// Date and time, with the offset only if the source carried one
    DateTime {
        naive: NaiveDateTime,
        offset: Option<FixedOffset>,
    },
    /// Calendar date without a time
    Date(NaiveDate),
    /// Anything else, kept verbatim
    Raw(String),
    /// No date in the header
    Absent,
}

impl PostDate {
    /// Classify a YAML header value. Strings are taken as plain scalars;
    /// callers that know the scalar was quoted keep it as `Raw` instead.
    pub fn from_yaml(value: Option<&serde_yaml::Value>) -> Self {
        use serde_yaml::Value;

        match value {
            None | Some(Value::Null) => PostDate::Absent,
            Some(Value::String(s)) => Self::from_plain_scalar(s),
            Some(Value::Number(n)) => PostDate::Raw(n.to_string()),
            Some(Value::Bool(b)) => PostDate::Raw(b.to_string()),
            Some(Value::Tagged(tagged)) => {
                let tag = tagged.tag.to_string();
                match &tagged.value {
                    Value::String(s) if tag.trim_start_matches('!').ends_with("timestamp") => {
                        Self::from_plain_scalar(s)
                    }
                    Value::String(s) => PostDate::Raw(s.clone()),
                    other => PostDate::Raw(yaml_to_string(other)),
                }
            }
            Some(other) => PostDate::Raw(yaml_to_string(other)),
        }
    }

    /// Classify a TOML header value. TOML datetimes are natively structured.
    pub fn from_toml(value: Option<&toml::Value>) -> Self {
        match value {
            None => PostDate::Absent,
            Some(toml::Value::Datetime(dt)) => {
                let text = dt.to_string();
                Self::parse_timestamp(&text).unwrap_or(PostDate::Raw(text))
            }
            Some(toml::Value::String(s)) => PostDate::Raw(s.clone()),
            Some(other) => PostDate::Raw(other.to_string()),
        }
    }

    /// Classify a JSON header value. JSON has no date type, so strings stay raw.
    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        match value {
            None | Some(serde_json::Value::Null) => PostDate::Absent,
            Some(serde_json::Value::String(s)) => PostDate::Raw(s.clone()),
            Some(other) => PostDate::Raw(other.to_string()),
        }
    }

    /// A plain YAML scalar resolves to a timestamp when it matches the YAML
    /// timestamp grammar and names a real calendar date.
    fn from_plain_scalar(s: &str) -> Self {
        Self::parse_timestamp(s).unwrap_or_else(|| PostDate::Raw(s.to_string()))
    }

    /// Parse a YAML 1.1 / RFC 3339 timestamp
    pub fn parse_timestamp(s: &str) -> Option<Self> {
        if let Some(caps) = DATE_RE.captures(s) {
            let date = NaiveDate::from_ymd_opt(
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
            )?;
            return Some(PostDate::Date(date));
        }

        let caps = DATETIME_RE.captures(s)?;
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )?;

        let micros = match caps.get(7) {
            Some(fraction) if !fraction.as_str().is_empty() => {
                // Truncate to microseconds, right-padded
                let digits: String = fraction.as_str().chars().take(6).collect();
                format!("{:0<6}", digits).parse::<u32>().ok()?
            }
            _ => 0,
        };
        let time = NaiveTime::from_hms_micro_opt(
            caps[4].parse().ok()?,
            caps[5].parse().ok()?,
            caps[6].parse().ok()?,
            micros,
        )?;

        let offset = match caps.get(8) {
            Some(tz) => Some(parse_offset(tz.as_str())?),
            None => None,
        };

        Some(PostDate::DateTime {
            naive: date.and_time(time),
            offset,
        })
    }

    /// The canonical string form. `Absent` yields the current local time, so
    /// it is recomputed on every call.
    pub fn canonical(&self) -> String {
        match self {
            PostDate::DateTime { naive, offset } => {
                let mut out = format_naive(naive);
                if let Some(offset) = offset {
                    out.push_str(&offset.to_string());
                }
                out
            }
            PostDate::Date(date) => date.format("%Y-%m-%d").to_string(),
            PostDate::Raw(raw) => raw.clone(),
            PostDate::Absent => Local::now()
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
        }
    }
}

fn format_naive(naive: &NaiveDateTime) -> String {
    let micros = naive.and_utc().timestamp_subsec_micros();
    if micros == 0 {
        naive.format(ISO_DATETIME).to_string()
    } else {
        format!("{}.{:06}", naive.format(ISO_DATETIME), micros)
    }
}

/// Parse `Z`, `+5`, `-05` or `+05:30`
fn parse_offset(tz: &str) -> Option<FixedOffset> {
    if tz.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = tz.split_at(1);
    let sign = if sign == "-" { -1 } else { 1 };
    let rest = rest.replace(':', "");
    let (hours, minutes) = if rest.len() > 2 {
        rest.split_at(rest.len() - 2)
    } else {
        (rest.as_str(), "0")
    };

    let seconds = hours.parse::<i32>().ok()? * 3600 + minutes.parse::<i32>().ok()? * 60;
    FixedOffset::east_opt(sign * seconds)
}

fn yaml_to_string(value: &serde_yaml::Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_default()
}
