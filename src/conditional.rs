//! Support for attributes of type ConditionalUintType
//
// DASH-MPD.xsd declares several AdaptationSet attributes (@segmentAlignment, @subsegmentAlignment,
// @startWithSAP, @subsegmentStartsWithSAP) as a union of xs:unsignedInt and xs:boolean. A value of
// "true" or an integer value means that the property holds (the integer identifying, for example,
// a group of adaptation sets sharing the same segment alignment), and an absent attribute is
// interpreted by DASH clients in the same way as "false".

use std::fmt;
use std::str::FromStr;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use crate::DashMpdError;


/// The value of an attribute which is either an unsigned integer or a boolean.
///
/// `Absent` corresponds to the attribute not being present in the manifest, and is never
/// serialized.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionalUint {
    #[default]
    Absent,
    Uint(u64),
    Bool(bool),
}

impl ConditionalUint {
    pub fn is_absent(&self) -> bool {
        matches!(self, ConditionalUint::Absent)
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            ConditionalUint::Uint(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConditionalUint::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether the property holds: an integer value or `true`. An absent attribute counts as false.
    pub fn is_enabled(&self) -> bool {
        matches!(self, ConditionalUint::Uint(_) | ConditionalUint::Bool(true))
    }
}

impl From<u64> for ConditionalUint {
    fn from(n: u64) -> Self {
        ConditionalUint::Uint(n)
    }
}

impl From<bool> for ConditionalUint {
    fn from(b: bool) -> Self {
        ConditionalUint::Bool(b)
    }
}

// The unsigned integer alternative is tried first. We don't use the integer parser alone because it
// accepts a leading "+", which is not part of the xs:unsignedInt lexical space. Booleans are
// restricted to the canonical literals, so "1" is always the integer 1.
impl FromStr for ConditionalUint {
    type Err = DashMpdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = s.parse::<u64>() {
                return Ok(ConditionalUint::Uint(n));
            }
        }
        match s {
            "true" => Ok(ConditionalUint::Bool(true)),
            "false" => Ok(ConditionalUint::Bool(false)),
            _ => Err(DashMpdError::MalformedConditionalUint(s.to_string())),
        }
    }
}

impl fmt::Display for ConditionalUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionalUint::Uint(n) => write!(f, "{n}"),
            ConditionalUint::Bool(b) => write!(f, "{b}"),
            ConditionalUint::Absent => Ok(()),
        }
    }
}

// Fields of this type should be annotated with
//   #[serde(default, skip_serializing_if = "ConditionalUint::is_absent")]
// so that an Absent value leads to the attribute being omitted, rather than serialized as an empty
// string.
impl Serialize for ConditionalUint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ConditionalUint::Uint(n) => serializer.serialize_u64(*n),
            ConditionalUint::Bool(b) => serializer.serialize_bool(*b),
            ConditionalUint::Absent => serializer.serialize_none(),
        }
    }
}

struct ConditionalUintVisitor;

impl de::Visitor<'_> for ConditionalUintVisitor {
    type Value = ConditionalUint;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an unsigned integer or a boolean")
    }

    fn visit_str<E>(self, v: &str) -> Result<ConditionalUint, E>
    where
        E: de::Error,
    {
        v.parse::<ConditionalUint>().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for ConditionalUint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(ConditionalUintVisitor)
    }
}
