pub mod request;
pub mod response;
pub mod transaction;

pub(crate) mod decoder {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde_json::Value;

    use crate::error::DataFormatError;

    const NAIVE_DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    const DATE_FORMAT: &str = "%Y-%m-%d";

    /// Timestamps without an offset are taken to be UTC. Numbers are epoch milliseconds.
    pub fn parse_created_at(value: Option<&Value>) -> Result<DateTime<Utc>, DataFormatError> {
        match value {
            None | Some(Value::Null) => Err(DataFormatError::MissingCreatedAt),
            Some(Value::String(s)) => parse_timestamp(s),
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(DateTime::from_timestamp_millis)
                .ok_or_else(|| DataFormatError::InvalidCreatedAt(n.to_string())),
            Some(other) => Err(DataFormatError::InvalidCreatedAt(other.to_string())),
        }
    }

    fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DataFormatError> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(DataFormatError::MissingCreatedAt);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        if let Some(naive) = NAIVE_DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        {
            return Ok(naive.and_utc());
        }

        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .ok_or_else(|| DataFormatError::InvalidCreatedAt(raw.to_owned()))
    }

    /// Non-finite values are reported with the text they were read from.
    pub fn parse_amount(value: Option<&Value>) -> Result<f64, DataFormatError> {
        let (amount, raw) = match value {
            None | Some(Value::Null) => return Err(DataFormatError::MissingAdminEarning),
            Some(Value::Number(n)) => {
                let amount = n
                    .as_f64()
                    .ok_or_else(|| DataFormatError::InvalidAdminEarning(n.to_string()))?;
                (amount, n.to_string())
            }
            Some(Value::String(s)) => {
                let cleaned_string = s.trim().trim_matches('"').replace(',', "");
                if cleaned_string.is_empty() {
                    return Err(DataFormatError::MissingAdminEarning);
                }
                let amount = cleaned_string
                    .parse::<f64>()
                    .map_err(|err| DataFormatError::InvalidAdminEarning(format!("{s}: {err}")))?;
                (amount, s.clone())
            }
            Some(other) => return Err(DataFormatError::InvalidAdminEarning(other.to_string())),
        };

        if amount.is_finite() {
            Ok(amount)
        } else {
            Err(DataFormatError::NonFiniteAdminEarning(raw))
        }
    }

}
