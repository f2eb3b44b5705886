//! A Rust library for parsing and serializing DASH MPD manifests, with an exact codec for the
//! xs:duration attributes they contain.
//!
//! [DASH](https://en.wikipedia.org/wiki/Dynamic_Adaptive_Streaming_over_HTTP) (dynamic adaptive
//! streaming over HTTP), also called MPEG-DASH, is a technology used for media streaming over the
//! web. The Media Presentation Description (MPD) is an XML manifest describing the resources
//! (periods, adaptation sets, representations, segments) that a DASH client uses to perform
//! adaptive streaming of the content.
//!
//! This library provides a serde-based parser (deserializer) and serializer for the core of the
//! MPD format, as defined in ISO/IEC standard 23009-1. Attributes of type xs:duration are
//! represented by [`XsDuration`], a signed count of nanoseconds which serializes to a canonical
//! lexical form (`PT0S`, `PT1M30.5S`, `P1DT2H`), and attributes of the schema's
//! ConditionalUintType are represented by [`ConditionalUint`].
//!
//! ```
//! use dash_mpd_xsd::{parse, XsDuration};
//!
//! let mpd = parse(r#"<MPD minBufferTime="PT1.500S"><Period duration="PT2M"/></MPD>"#).unwrap();
//! assert_eq!(mpd.minBufferTime, Some(XsDuration::from_nanos(1_500_000_000)));
//! assert_eq!(mpd.periods[0].duration.unwrap().to_string(), "PT2M");
//! ```
//!
//! ## Limitations
//!
//! - Durations with a non-zero month component are rejected, since a month has no fixed length.
//! - No validation against the MPD XML schema; unknown elements and attributes are ignored.
//
//
// The MPD format is documented by ISO using an XML Schema at
// https://standards.iso.org/ittf/PubliclyAvailableStandards/MPEG-DASH_schema_files/DASH-MPD.xsd
//
// We are using the quick_xml + serde crates to deserialize the XML content to Rust structs, and the
// reverse serialization process of programmatically generating XML from Rust structs. Note that
// serde will ignore unknown fields when deserializing, so we don't need to cover every single
// possible field.


#![allow(non_snake_case)]

pub mod conditional;
pub mod duration;

use std::fmt;
use serde::{Serialize, Deserialize};
use serde_with::skip_serializing_none;
use chrono::DateTime;

pub use crate::conditional::ConditionalUint;
pub use crate::duration::{XsDuration, parse_xs_duration, parse_xs_duration_pattern};


/// Type representing an xs:dateTime, as per <https://www.w3.org/TR/xmlschema-2/#dateTime>
// Something like 2021-06-03T13:00:00Z
pub type XsDatetime = DateTime<chrono::offset::Utc>;


#[derive(thiserror::Error, Debug)]
pub enum DashMpdError {
    #[error("parse error {0}")]
    Parsing(String),
    #[error("serialization error {0}")]
    Serializing(String),
    #[error("invalid xs:duration: {0:?}")]
    MalformedDuration(String),
    #[error("non-zero months are not supported in xs:duration: {0:?}")]
    MonthsNotSupported(String),
    #[error("duration out of range: {0}")]
    DurationOutOfRange(String),
    #[error("invalid ConditionalUint (expecting unsigned integer or boolean): {0:?}")]
    MalformedConditionalUint(String),
}


/// Describes a sequence of contiguous Segments with identical duration.
#[skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct S {
    /// time
    #[serde(rename = "@t")]
    pub t: Option<u64>,
    /// the duration (shall not exceed the value of MPD@maxSegmentDuration)
    #[serde(rename = "@d")]
    pub d: u64,
    /// the repeat count (number of contiguous Segments with identical MPD duration minus one),
    /// defaulting to zero if not present
    #[serde(rename = "@r")]
    pub r: Option<i64>,
}

/// Contains a sequence of `S` elements, each of which describes a sequence of contiguous segments of
/// identical duration.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SegmentTimeline {
    #[serde(rename = "S")]
    pub segments: Vec<S>,
}

/// Allows template-based `SegmentURL` construction. Specifies various substitution rules using
/// dynamic values such as `$Time$` and `$Number$` that map to a sequence of Segments.
#[skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SegmentTemplate {
    // note: the spec says this is an unsigned int, not an xs:duration
    #[serde(rename = "@duration")]
    pub duration: Option<u64>,
    #[serde(rename = "@timescale")]
    pub timescale: Option<u64>,
    #[serde(rename = "@media")]
    pub media: Option<String>,
    #[serde(rename = "@initialization")]
    pub initialization: Option<String>,
    #[serde(rename = "@startNumber")]
    pub startNumber: Option<u64>,
    #[serde(rename = "@presentationTimeOffset")]
    pub presentationTimeOffset: Option<u64>,
    #[serde(rename = "@availabilityTimeOffset")]
    pub availabilityTimeOffset: Option<f64>,
    #[serde(rename = "@availabilityTimeComplete")]
    pub availabilityTimeComplete: Option<bool>,
    pub SegmentTimeline: Option<SegmentTimeline>,
}

/// A URI string that specifies one or more common locations for Segments and other resources.
#[skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BaseURL {
    /// Elements with the same `@serviceLocation` value are likely to have their URLs resolve to
    /// services at a common network location, for example the same CDN.
    #[serde(rename = "@serviceLocation")]
    pub serviceLocation: Option<String>,
    #[serde(rename = "@byteRange")]
    pub byteRange: Option<String>,
    #[serde(rename = "@availabilityTimeOffset")]
    pub availabilityTimeOffset: Option<u64>,
    #[serde(rename = "@availabilityTimeComplete")]
    pub availabilityTimeComplete: Option<bool>,
    #[serde(rename = "$text")]
    pub base: String,
}

/// A generic `schemeIdUri` + `value` pair, used for Role and ContentProtection elements.
#[skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Descriptor {
    #[serde(rename = "@schemeIdUri")]
    pub schemeIdUri: Option<String>,
    #[serde(rename = "@value")]
    pub value: Option<String>,
}

/// A representation describes a version of the content, using a specific encoding and bitrate.
/// Streams often have multiple representations with different bitrates, to allow the client to
/// select that most suitable to its network conditions.
#[skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Representation {
    #[serde(rename = "@id")]
    pub id: Option<String>,
    #[serde(rename = "@width")]
    pub width: Option<u64>,
    #[serde(rename = "@height")]
    pub height: Option<u64>,
    #[serde(rename = "@frameRate")]
    pub frameRate: Option<String>, // can be something like "15/2"
    #[serde(rename = "@bandwidth")]
    pub bandwidth: Option<u64>,
    #[serde(rename = "@audioSamplingRate")]
    pub audioSamplingRate: Option<String>,
    /// An RFC6381 string, <https://tools.ietf.org/html/rfc6381>
    #[serde(rename = "@codecs")]
    pub codecs: Option<String>,
    #[serde(rename = "@sar")]
    pub sar: Option<String>,
    /// If present, this attribute is expected to be set to "progressive".
    #[serde(rename = "@scanType")]
    pub scanType: Option<String>,
    #[serde(rename = "ContentProtection")]
    pub content_protection: Vec<Descriptor>,
    pub SegmentTemplate: Option<SegmentTemplate>,
    #[serde(rename = "BaseURL")]
    pub base_url: Vec<BaseURL>,
}

/// Contains a set of Representations. For example, if multiple language streams are available for
/// the audio content, each one can be in its own AdaptationSet.
#[skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AdaptationSet {
    // eg "video/mp4"
    #[serde(rename = "@mimeType")]
    pub mimeType: Option<String>,
    // eg "audio", "video", "text"
    #[serde(rename = "@contentType")]
    pub contentType: Option<String>,
    #[serde(rename = "@segmentAlignment", skip_serializing_if = "ConditionalUint::is_absent")]
    pub segmentAlignment: ConditionalUint,
    #[serde(rename = "@subsegmentAlignment", skip_serializing_if = "ConditionalUint::is_absent")]
    pub subsegmentAlignment: ConditionalUint,
    #[serde(rename = "@startWithSAP", skip_serializing_if = "ConditionalUint::is_absent")]
    pub startWithSAP: ConditionalUint,
    #[serde(rename = "@subsegmentStartsWithSAP", skip_serializing_if = "ConditionalUint::is_absent")]
    pub subsegmentStartsWithSAP: ConditionalUint,
    #[serde(rename = "@bitstreamSwitching")]
    pub bitstreamSwitching: Option<bool>,
    /// Content language, in RFC 5646 format
    #[serde(rename = "@lang")]
    pub lang: Option<String>,
    #[serde(rename = "@par")]
    pub par: Option<String>,
    /// An RFC6381 string, <https://tools.ietf.org/html/rfc6381> (eg. "avc1.4D400C")
    #[serde(rename = "@codecs")]
    pub codecs: Option<String>,
    #[serde(rename = "Role")]
    pub roles: Vec<Descriptor>,
    #[serde(rename = "BaseURL")]
    pub base_url: Vec<BaseURL>,
    pub SegmentTemplate: Option<SegmentTemplate>,
    #[serde(rename = "ContentProtection")]
    pub content_protection: Vec<Descriptor>,
    #[serde(rename = "Representation")]
    pub representations: Vec<Representation>,
}

/// Describes a chunk of the content with a start time and a duration. Content can be split up into
/// multiple periods (such as chapters, advertising segments).
#[skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Period {
    #[serde(rename = "@id")]
    pub id: Option<String>,
    #[serde(rename = "@start")]
    pub start: Option<XsDuration>,
    // note: the spec says that this is an xs:duration, not an unsigned int as for other "duration" fields
    #[serde(rename = "@duration")]
    pub duration: Option<XsDuration>,
    #[serde(rename = "AdaptationSet")]
    pub adaptations: Vec<AdaptationSet>,
    #[serde(rename = "BaseURL")]
    pub base_url: Vec<BaseURL>,
}

/// The root node of a parsed DASH MPD manifest.
#[skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MPD {
    #[serde(rename = "@xmlns")]
    pub xmlns: Option<String>,
    /// The Presentation Type, either "static" or "dynamic" (a live stream for which segments become
    /// available over time).
    #[serde(rename = "@type")]
    pub mpdtype: Option<String>,
    #[serde(rename = "@minimumUpdatePeriod")]
    pub minimumUpdatePeriod: Option<XsDuration>,
    #[serde(rename = "@availabilityStartTime")]
    pub availabilityStartTime: Option<XsDatetime>,
    #[serde(rename = "@availabilityEndTime")]
    pub availabilityEndTime: Option<XsDatetime>,
    #[serde(rename = "@mediaPresentationDuration")]
    pub mediaPresentationDuration: Option<XsDuration>,
    /// Prescribes how much buffer a client should keep to avoid stalling when streaming under ideal
    /// network conditions with bandwidth matching the @bandwidth attribute.
    #[serde(rename = "@minBufferTime")]
    pub minBufferTime: Option<XsDuration>,
    /// A suggested delay of the presentation compared to the Live edge.
    #[serde(rename = "@suggestedPresentationDelay")]
    pub suggestedPresentationDelay: Option<XsDuration>,
    #[serde(rename = "@timeShiftBufferDepth")]
    pub timeShiftBufferDepth: Option<XsDuration>,
    #[serde(rename = "@publishTime")]
    pub publishTime: Option<XsDatetime>,
    #[serde(rename = "@profiles")]
    pub profiles: Option<String>,
    /// There may be several BaseURLs, for redundancy (for example multiple CDNs)
    #[serde(rename = "BaseURL")]
    pub base_url: Vec<BaseURL>,
    #[serde(rename = "Period")]
    pub periods: Vec<Period>,
}


/// Parse an MPD manifest, provided as an XML string, returning an `MPD` node.
///
/// A malformed attribute value anywhere in the document (for example an invalid xs:duration) makes
/// the whole parse fail; the error message includes the path to the offending attribute.
#[tracing::instrument(level = "trace", skip_all)]
pub fn parse(xml: &str) -> Result<MPD, DashMpdError> {
    let xd = &mut quick_xml::de::Deserializer::from_str(xml);
    // The path tracker sits outermost, so attribute errors carry their path with or without the
    // ignored-element warnings.
    #[cfg(feature = "warn_ignored_elements")]
    let mut warn_unused = |path: serde_ignored::Path<'_>| {
        tracing::warn!("Unused XML element in manifest: {path}");
    };
    #[cfg(feature = "warn_ignored_elements")]
    let xd = serde_ignored::Deserializer::new(xd, &mut warn_unused);
    let mpd: MPD = serde_path_to_error::deserialize(xd)
        .map_err(|e| DashMpdError::Parsing(e.to_string()))?;
    Ok(mpd)
}


/// Settings for [`MPD::encode_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Number of spaces per nesting level, or `None` to write the document on a single line.
    pub indent: Option<usize>,
    /// Whether to start the output with an `<?xml ...?>` declaration.
    pub xml_declaration: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions { indent: Some(2), xml_declaration: true }
    }
}

impl MPD {
    /// Serialize to XML with the default [`EncodeOptions`]: an XML declaration followed by the
    /// document indented by two spaces.
    pub fn encode(&self) -> Result<String, DashMpdError> {
        self.encode_with(&EncodeOptions::default())
    }

    /// Serialize to XML. Elements without attributes or content are written as self-closing tags.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn encode_with(&self, options: &EncodeOptions) -> Result<String, DashMpdError> {
        let mut xml = String::new();
        if options.xml_declaration {
            xml.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
            xml.push('\n');
        }
        let mut ser = quick_xml::se::Serializer::new(&mut xml);
        ser.expand_empty_elements(false);
        if let Some(width) = options.indent {
            ser.indent(' ', width);
        }
        self.serialize(ser)
            .map_err(|e| DashMpdError::Serializing(e.to_string()))?;
        xml.push('\n');
        Ok(xml)
    }
}

/// Writes the output of [`MPD::encode`]. A serialization failure surfaces as `fmt::Error`, which
/// makes `to_string()` panic; call `encode()` to handle it as a [`DashMpdError::Serializing`].
impl fmt::Display for MPD {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xml = self.encode().map_err(|_| fmt::Error)?;
        f.write_str(&xml)
    }
}
