//! Tracking numbers.
//!
//! Format: `PREFIX` (1-4 upper-case letters) + 8 digits taken from a
//! millisecond clock + 4 random upper-case alphanumerics, e.g.
//! `TRK48213377Q7ZP`.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use serde::{Deserialize, Serialize};

const DIGITS: usize = 8;
const SUFFIX: usize = 4;
const MAX_PREFIX: usize = 4;
const DIGIT_MODULUS: u64 = 100_000_000;
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Errors that can occur when parsing a [`TrackingNumber`] or prefix.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingNumberError {
    #[error("tracking number cannot be empty")]
    Empty,
    #[error("tracking number has an invalid length")]
    InvalidLength,
    #[error("tracking number prefix must be 1-4 letters A-Z")]
    InvalidPrefix,
    #[error("tracking number must contain 8 digits after the prefix")]
    InvalidDigits,
    #[error("tracking number must end with 4 letters or digits")]
    InvalidSuffix,
}

/// A well-formed, upper-case tracking number.
///
/// ```
/// use shipdesk_core::TrackingNumber;
///
/// let number = TrackingNumber::parse(" trk48213377q7zp ").unwrap();
/// assert_eq!(number.as_str(), "TRK48213377Q7ZP");
/// assert!(TrackingNumber::parse("hello").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingNumber(String);

impl TrackingNumber {
    /// Parse user input, trimming and upper-casing it first.
    ///
    /// # Errors
    ///
    /// Returns a [`TrackingNumberError`] if the input does not have the
    /// tracking number shape.
    pub fn parse(s: &str) -> Result<Self, TrackingNumberError> {
        let s = s.trim().to_ascii_uppercase();
        if s.is_empty() {
            return Err(TrackingNumberError::Empty);
        }
        if !s.is_ascii() || s.len() <= DIGITS + SUFFIX || s.len() > MAX_PREFIX + DIGITS + SUFFIX {
            return Err(TrackingNumberError::InvalidLength);
        }

        let (head, suffix) = s.split_at(s.len() - SUFFIX);
        let (prefix, digits) = head.split_at(head.len() - DIGITS);

        validate_prefix(prefix)?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TrackingNumberError::InvalidDigits);
        }
        if !suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b)) {
            return Err(TrackingNumberError::InvalidSuffix);
        }

        Ok(Self(s))
    }

    /// Returns the tracking number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_prefix(prefix: &str) -> Result<(), TrackingNumberError> {
    if prefix.is_empty()
        || prefix.len() > MAX_PREFIX
        || !prefix.bytes().all(|b| b.is_ascii_uppercase())
    {
        return Err(TrackingNumberError::InvalidPrefix);
    }
    Ok(())
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TrackingNumber {
    type Err = TrackingNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TrackingNumber {
    type Error = TrackingNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TrackingNumber> for String {
    fn from(number: TrackingNumber) -> Self {
        number.0
    }
}

impl AsRef<str> for TrackingNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for TrackingNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for TrackingNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for TrackingNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// Issues tracking numbers.
///
/// The clock component is monotonic per generator (`max(now, last + 1)`), so
/// one generator never repeats its 8 digits within a 10^8 ms window even when
/// called many times per millisecond. The random suffix separates numbers
/// issued by different processes; the database unique index is the final
/// arbiter.
#[derive(Debug)]
pub struct TrackingNumberGenerator {
    prefix: String,
    last_millis: AtomicU64,
}

impl TrackingNumberGenerator {
    /// Default prefix.
    pub const DEFAULT_PREFIX: &'static str = "TRK";

    /// Create a generator with the given prefix.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingNumberError::InvalidPrefix`] unless the prefix is
    /// 1-4 upper-case ASCII letters.
    pub fn new(prefix: &str) -> Result<Self, TrackingNumberError> {
        validate_prefix(prefix)?;
        Ok(Self {
            prefix: prefix.to_owned(),
            last_millis: AtomicU64::new(0),
        })
    }

    /// The configured prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Issue the next tracking number.
    #[must_use]
    pub fn generate(&self) -> TrackingNumber {
        let stamp = self.next_millis();
        let mut rng = rand::rng();
        let suffix: String = (0..SUFFIX)
            .map(|_| char::from(SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())]))
            .collect();

        TrackingNumber(format!(
            "{}{:08}{suffix}",
            self.prefix,
            stamp % DIGIT_MODULUS
        ))
    }

    fn next_millis(&self) -> u64 {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        let step = |last: u64| now.max(last + 1);
        // fetch_update returns the previous value; the closure never fails.
        match self
            .last_millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(step(last)))
        {
            Ok(previous) | Err(previous) => step(previous),
        }
    }
}

impl Default for TrackingNumberGenerator {
    fn default() -> Self {
        Self {
            prefix: Self::DEFAULT_PREFIX.to_owned(),
            last_millis: AtomicU64::new(0),
        }
    }
}
