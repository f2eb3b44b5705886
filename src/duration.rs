//! Support for attributes of type xs:duration, with nanosecond precision.
//
// The lexical representation for duration is the ISO 8601 extended format PnYnMnDTnHnMnS, as per
// https://www.w3.org/TR/xmlschema-2/#duration. We only accept the subset which can be converted to
// a fixed number of nanoseconds without a calendar: a year is always 365 days, a day is always 24
// hours, and a month component is only accepted when its value is zero (there is no sensible fixed
// length for a month). Weeks, fractional values on components other than seconds, a leading "+",
// a comma as decimal separator and surrounding whitespace are all rejected.
//
// Examples: "PT0S", "PT1M30.5S", "P1DT2H", "-PT0.001S", "P0Y0M0DT0H4M20.880S"
//
// There are two parsers for this grammar. The default parser walks the string backwards from the
// final designator, which is both faster and lets us check digit runs for overflow without going
// through a library integer parse. The second parser matches the whole string against a regular
// expression. Both feed the same component record into the same evaluation step, so they return
// the same result (including the same error kind) on every input.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use tracing::trace;
use crate::DashMpdError;


const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_MINUTE: u64 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u64 = 60 * NANOS_PER_MINUTE;
const NANOS_PER_DAY: u64 = 24 * NANOS_PER_HOUR;
const NANOS_PER_YEAR: u64 = 365 * NANOS_PER_DAY;
// Digits of a fractional second beyond this are truncated.
const FRACTION_DIGITS: usize = 9;

lazy_static! {
    static ref XS_DURATION_PATTERN: Regex = Regex::new(concat!(
        r"^(?P<sign>-)?P",
        r"(?:(?P<years>[0-9]+)Y)?",
        r"(?:(?P<months>[0-9]+)M)?",
        r"(?:(?P<days>[0-9]+)D)?",
        r"(?:(?P<time>T)",
        r"(?:(?P<hours>[0-9]+)H)?",
        r"(?:(?P<minutes>[0-9]+)M)?",
        r"(?:(?P<seconds>[0-9]+)(?:\.(?P<fraction>[0-9]+))?S)?",
        r")?$"))
        .expect("compiling xs:duration pattern");
}


/// A signed span of time with nanosecond resolution, serialized as an xs:duration.
///
/// The value range is that of an `i64` count of nanoseconds, or roughly ±292 years. Formatting
/// produces a canonical form which omits zero-valued components (but never omits the seconds of a
/// zero duration, which is `PT0S`):
///
/// ```
/// use dash_mpd_xsd::XsDuration;
///
/// let d = XsDuration::from_millis(61_100).unwrap();
/// assert_eq!(d.to_string(), "PT1M1.1S");
/// assert_eq!("PT1M1.1S".parse::<XsDuration>().unwrap(), d);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct XsDuration(i64);

impl XsDuration {
    pub const ZERO: XsDuration = XsDuration(0);

    pub const fn from_nanos(nanos: i64) -> Self {
        XsDuration(nanos)
    }

    /// Returns `None` if the value does not fit in an `i64` count of nanoseconds.
    pub fn from_millis(millis: i64) -> Option<Self> {
        millis.checked_mul(1_000_000).map(XsDuration)
    }

    /// Returns `None` if the value does not fit in an `i64` count of nanoseconds.
    pub fn from_secs(secs: i64) -> Option<Self> {
        secs.checked_mul(1_000_000_000).map(XsDuration)
    }

    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// The magnitude of this duration, which is always representable as a `std::time::Duration`.
    pub const fn unsigned_abs(self) -> Duration {
        Duration::from_nanos(self.0.unsigned_abs())
    }
}

impl fmt::Display for XsDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; 32];
        let start = format_into(&mut buf, self.0);
        let s = std::str::from_utf8(&buf[start..]).map_err(|_| fmt::Error)?;
        f.pad(s)
    }
}

// Writes the canonical lexical form of nanos into the tail of buf, returning the index of the first
// byte written. The longest possible output is "-P292Y364DT23H59M59.999999999S".
fn format_into(buf: &mut [u8; 32], nanos: i64) -> usize {
    let magnitude = nanos.unsigned_abs();
    let fraction = magnitude % NANOS_PER_SEC;
    let total_secs = magnitude / NANOS_PER_SEC;
    let seconds = total_secs % 60;
    let total_minutes = total_secs / 60;
    let minutes = total_minutes % 60;
    let total_hours = total_minutes / 60;
    let hours = total_hours % 24;
    let total_days = total_hours / 24;
    let days = total_days % 365;
    let years = total_days / 365;

    let mut w = buf.len();
    let with_seconds = seconds != 0 || fraction != 0 || total_minutes == 0;
    if with_seconds {
        w = put_byte(buf, w, b'S');
        w = put_fraction(buf, w, fraction);
        w = put_int(buf, w, seconds);
    }
    if minutes != 0 {
        w = put_byte(buf, w, b'M');
        w = put_int(buf, w, minutes);
    }
    if hours != 0 {
        w = put_byte(buf, w, b'H');
        w = put_int(buf, w, hours);
    }
    if with_seconds || minutes != 0 || hours != 0 {
        w = put_byte(buf, w, b'T');
    }
    if days != 0 {
        w = put_byte(buf, w, b'D');
        w = put_int(buf, w, days);
    }
    if years != 0 {
        w = put_byte(buf, w, b'Y');
        w = put_int(buf, w, years);
    }
    w = put_byte(buf, w, b'P');
    if nanos < 0 {
        w = put_byte(buf, w, b'-');
    }
    w
}

fn put_byte(buf: &mut [u8], w: usize, b: u8) -> usize {
    buf[w - 1] = b;
    w - 1
}

// Writes the decimal digits of v (at least one digit) ending just before position w.
fn put_int(buf: &mut [u8], mut w: usize, mut v: u64) -> usize {
    loop {
        w -= 1;
        buf[w] = b'0' + (v % 10) as u8;
        v /= 10;
        if v == 0 {
            return w;
        }
    }
}

// Writes a decimal point and the nanoseconds in v as a fraction of a second, omitting trailing
// zeros. Writes nothing at all when v is zero.
fn put_fraction(buf: &mut [u8], mut w: usize, mut v: u64) -> usize {
    let mut significant = false;
    for _ in 0..FRACTION_DIGITS {
        let digit = (v % 10) as u8;
        significant = significant || digit != 0;
        if significant {
            w -= 1;
            buf[w] = b'0' + digit;
        }
        v /= 10;
    }
    if significant {
        w = put_byte(buf, w, b'.');
    }
    w
}


fn malformed(lexical: &str) -> DashMpdError {
    DashMpdError::MalformedDuration(lexical.to_string())
}

// The digit runs of each component found in a lexical duration. Slices borrow from the input and
// contain only ASCII digits.
#[derive(Debug, Default, Clone, Copy)]
struct Components<'a> {
    negative: bool,
    years: Option<&'a [u8]>,
    months: Option<&'a [u8]>,
    days: Option<&'a [u8]>,
    hours: Option<&'a [u8]>,
    minutes: Option<&'a [u8]>,
    seconds: Option<&'a [u8]>,
    fraction: Option<&'a [u8]>,
}

impl Components<'_> {
    fn has_time(&self) -> bool {
        self.hours.is_some() || self.minutes.is_some() || self.seconds.is_some()
    }

    fn has_designator(&self) -> bool {
        self.years.is_some() || self.months.is_some() || self.days.is_some() || self.has_time()
    }

    fn to_duration(self, lexical: &str) -> Result<XsDuration, DashMpdError> {
        if self.months.is_some_and(|m| m.iter().any(|&d| d != b'0')) {
            return Err(DashMpdError::MonthsNotSupported(lexical.to_string()));
        }
        let units = [
            (self.years, NANOS_PER_YEAR),
            (self.days, NANOS_PER_DAY),
            (self.hours, NANOS_PER_HOUR),
            (self.minutes, NANOS_PER_MINUTE),
            (self.seconds, NANOS_PER_SEC),
        ];
        let mut magnitude: u64 = 0;
        for (digits, unit) in units {
            if let Some(digits) = digits {
                let count = atoi(digits).ok_or_else(|| malformed(lexical))?;
                magnitude = count.unsigned_abs().checked_mul(unit)
                    .and_then(|nanos| magnitude.checked_add(nanos))
                    .ok_or_else(|| malformed(lexical))?;
            }
        }
        if let Some(fraction) = self.fraction {
            magnitude = magnitude.checked_add(fraction_nanos(fraction))
                .ok_or_else(|| malformed(lexical))?;
        }
        // The magnitude of i64::MIN is one more than i64::MAX, so negative values are built by
        // subtraction rather than by negating a positive i64.
        let nanos = if self.negative {
            0i64.checked_sub_unsigned(magnitude)
        } else {
            i64::try_from(magnitude).ok()
        };
        nanos.map(XsDuration).ok_or_else(|| malformed(lexical))
    }
}

// Overflow-checked conversion of a run of ASCII digits.
fn atoi(digits: &[u8]) -> Option<i64> {
    digits.iter()
        .try_fold(0i64, |acc, &d| acc.checked_mul(10)?.checked_add(i64::from(d - b'0')))
}

fn fraction_nanos(digits: &[u8]) -> u64 {
    let kept = &digits[..digits.len().min(FRACTION_DIGITS)];
    let scale = 10u64.pow((FRACTION_DIGITS - kept.len()) as u32);
    kept.iter().fold(0u64, |acc, &d| acc * 10 + u64::from(d - b'0')) * scale
}


// Cursor over a string which consumes bytes from the end towards the start.
#[derive(Debug, Clone, Copy)]
struct ReverseScanner<'a> {
    bytes: &'a [u8],
    end: usize,
}

impl<'a> ReverseScanner<'a> {
    fn new(s: &'a str) -> Self {
        ReverseScanner { bytes: s.as_bytes(), end: s.len() }
    }

    fn peek(&self) -> Option<u8> {
        self.end.checked_sub(1).map(|i| self.bytes[i])
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.end -= 1;
            true
        } else {
            false
        }
    }

    // Consumes the longest run of ASCII digits ending at the cursor, possibly empty.
    fn digits(&mut self) -> &'a [u8] {
        let stop = self.end;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.end -= 1;
        }
        &self.bytes[self.end..stop]
    }

    // A designator together with the digits that precede it. Ok(None) if the designator is not at
    // the cursor.
    fn component(&mut self, designator: u8, lexical: &str) -> Result<Option<&'a [u8]>, DashMpdError> {
        if !self.eat(designator) {
            return Ok(None);
        }
        let digits = self.digits();
        if digits.is_empty() {
            return Err(malformed(lexical));
        }
        Ok(Some(digits))
    }

    fn remaining(&self) -> &'a [u8] {
        &self.bytes[..self.end]
    }
}


/// Parse an xs:duration by scanning the string backwards from its final designator.
///
/// This is the parser used by the `FromStr` and serde `Deserialize` implementations of
/// [`XsDuration`]. Fails with [`DashMpdError::MonthsNotSupported`] on a non-zero month component
/// and with [`DashMpdError::MalformedDuration`] on any other violation of the grammar, or when the
/// value overflows an `i64` count of nanoseconds.
pub fn parse_xs_duration(s: &str) -> Result<XsDuration, DashMpdError> {
    let mut scan = ReverseScanner::new(s);
    let mut c = Components::default();

    if scan.eat(b'S') {
        let digits = scan.digits();
        if digits.is_empty() {
            return Err(malformed(s));
        }
        if scan.eat(b'.') {
            let whole = scan.digits();
            if whole.is_empty() {
                return Err(malformed(s));
            }
            c.seconds = Some(whole);
            c.fraction = Some(digits);
        } else {
            c.seconds = Some(digits);
        }
    }
    // An M designator counts minutes when its digits follow T or H, and months otherwise.
    let mut probe = scan;
    if let Some(minutes) = probe.component(b'M', s)? {
        if matches!(probe.peek(), Some(b'T' | b'H')) {
            c.minutes = Some(minutes);
            scan = probe;
        }
    }
    c.hours = scan.component(b'H', s)?;
    // T is present if and only if some time component follows it.
    if scan.eat(b'T') != c.has_time() {
        return Err(malformed(s));
    }
    c.days = scan.component(b'D', s)?;
    c.months = scan.component(b'M', s)?;
    c.years = scan.component(b'Y', s)?;
    if !scan.eat(b'P') {
        return Err(malformed(s));
    }
    c.negative = match scan.remaining() {
        b"" => false,
        b"-" => true,
        _ => return Err(malformed(s)),
    };
    if !c.has_designator() {
        return Err(malformed(s));
    }
    c.to_duration(s)
}

/// Parse an xs:duration by matching it against a regular expression.
///
/// Accepts and rejects exactly the same strings as [`parse_xs_duration`], with the same error
/// kinds, but is several times slower.
pub fn parse_xs_duration_pattern(s: &str) -> Result<XsDuration, DashMpdError> {
    let caps = XS_DURATION_PATTERN.captures(s)
        .ok_or_else(|| malformed(s))?;
    let digits = |name: &str| caps.name(name).map(|m| m.as_str().as_bytes());
    let c = Components {
        negative: caps.name("sign").is_some(),
        years: digits("years"),
        months: digits("months"),
        days: digits("days"),
        hours: digits("hours"),
        minutes: digits("minutes"),
        seconds: digits("seconds"),
        fraction: digits("fraction"),
    };
    if caps.name("time").is_some() && !c.has_time() {
        return Err(malformed(s));
    }
    if !c.has_designator() {
        return Err(malformed(s));
    }
    c.to_duration(s)
}

impl FromStr for XsDuration {
    type Err = DashMpdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_xs_duration(s)
    }
}


impl TryFrom<Duration> for XsDuration {
    type Error = DashMpdError;

    fn try_from(d: Duration) -> Result<Self, Self::Error> {
        i64::try_from(d.as_nanos())
            .map(XsDuration)
            .map_err(|_| DashMpdError::DurationOutOfRange(format!("{d:?}")))
    }
}

impl TryFrom<XsDuration> for Duration {
    type Error = DashMpdError;

    fn try_from(d: XsDuration) -> Result<Self, Self::Error> {
        u64::try_from(d.0)
            .map(Duration::from_nanos)
            .map_err(|_| DashMpdError::DurationOutOfRange(d.to_string()))
    }
}


impl Serialize for XsDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

struct XsDurationVisitor;

impl de::Visitor<'_> for XsDurationVisitor {
    type Value = XsDuration;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an xs:duration such as PT1M30.5S")
    }

    fn visit_str<E>(self, v: &str) -> Result<XsDuration, E>
    where
        E: de::Error,
    {
        parse_xs_duration(v).map_err(|e| {
            trace!("rejecting xs:duration {v:?}: {e}");
            E::custom(e)
        })
    }
}

impl<'de> Deserialize<'de> for XsDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(XsDurationVisitor)
    }
}
