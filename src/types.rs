//! Shared value types: timestamps and integer money
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::error::ValidationError;

/// Amounts are integers in the grant currency's smallest unit.
pub type Amount = u64;

/// Signed balance, used where a projection may go below zero.
pub type Balance = i64;

/// Largest amount accepted anywhere, so every amount also fits a [`Balance`].
pub const MAX_AMOUNT: Amount = Balance::MAX as Amount;

/// Parses a user typed amount. Spaces used as thousands separators are accepted.
pub fn parse_amount(field: &'static str, raw: &str) -> Result<Amount, ValidationError> {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    let amount: Amount = digits.parse().map_err(|_| ValidationError::MalformedNumber {
        field,
        raw: raw.to_string(),
    })?;
    if amount > MAX_AMOUNT {
        return Err(ValidationError::AmountTooLarge { field, amount });
    }
    Ok(amount)
}

/// An amount as a signed balance, pinned to [`Balance::MAX`] above it.
pub fn as_balance(amount: Amount) -> Balance {
    Balance::try_from(amount).unwrap_or(Balance::MAX)
}

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl<T: TimeZone + Eq> PartialOrd for TimeStamp<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: TimeZone + Eq> Ord for TimeStamp<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    /// Midnight UTC on the given calendar day. Out of range values fall back to the unix epoch.
    pub fn on_day(year: i32, month: u32, day: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .unwrap_or_default()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }
    /// Milliseconds since the unix epoch, the comparison key used when sorting by date.
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl std::fmt::Display for TimeStamp<Utc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn timestamp_encoding() {
        let original = TimeStamp::new();

        let encoding = minicbor::to_vec(original.clone()).unwrap();
        let decode: TimeStamp<Utc> = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }

    #[test]
    fn on_day_is_midnight() {
        let ts = TimeStamp::on_day(2024, 6, 15);
        assert_eq!(ts.date().year(), 2024);
        assert_eq!(ts.date().day(), 15);
        assert_eq!(ts.to_string(), "2024-06-15");
    }

    #[test]
    fn amounts_parse_with_separators() {
        assert_eq!(parse_amount("amount", "1 500 000"), Ok(1_500_000));
        assert_eq!(parse_amount("amount", "  "), Err(ValidationError::MissingField { field: "amount" }));
        assert!(matches!(
            parse_amount("amount", "12,5"),
            Err(ValidationError::MalformedNumber { .. })
        ));
        assert!(parse_amount("amount", "-4").is_err());
    }

    #[test]
    fn amounts_stay_within_balance_range() {
        assert_eq!(parse_amount("amount", &MAX_AMOUNT.to_string()), Ok(MAX_AMOUNT));
        assert_eq!(
            parse_amount("amount", "9223372036854775809"),
            Err(ValidationError::AmountTooLarge {
                field: "amount",
                amount: (1 << 63) + 1
            })
        );
        assert_eq!(as_balance(u64::MAX), Balance::MAX);
        assert_eq!(as_balance(42), 42);
    }

    #[test]
    fn invalid_day_falls_back_to_epoch() {
        let ts = TimeStamp::on_day(2024, 2, 31);
        assert_eq!(ts.timestamp_millis(), 0);
    }
}
