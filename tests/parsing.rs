// Tests for the parsing support
//
// To run this test while enabling printing to stdout/stderr
//
//    cargo test --test parsing -- --show-output


pub mod common;
use chrono::prelude::*;
use dash_mpd_xsd::{parse, ConditionalUint, DashMpdError, XsDuration};
use common::{setup_logging, fixture};


#[test]
fn test_mpd_parser () {
    setup_logging();
    let case1 = r#"<?xml version="1.0" encoding="UTF-8"?><MPD><Period></Period></MPD>"#;
    let mpd = parse(case1).unwrap();
    assert_eq!(mpd.periods.len(), 1);
    assert!(mpd.minBufferTime.is_none());

    let case2 = r#"<?xml version="1.0" encoding="UTF-8"?><MPD foo="foo"><Period></Period><foo></foo></MPD>"#;
    let mpd = parse(case2).unwrap();
    assert_eq!(mpd.periods.len(), 1);

    let case3 = r#"<?xml version="1.0" encoding="UTF-8"?><MPD><Period></PeriodZ></MPD>"#;
    assert!(matches!(parse(case3), Err(DashMpdError::Parsing(_))));

    let case4 = r#"<MPD>
                     <BaseURL>http://cdn1.example.com/</BaseURL>
                     <BaseURL>http://cdn2.example.com/</BaseURL>
                   </MPD>"#;
    let mpd = parse(case4).unwrap();
    assert_eq!(mpd.base_url.len(), 2);
    assert_eq!(mpd.base_url[1].base, "http://cdn2.example.com/");

    let case5 = r#"<MPD type="static" minBufferTime="PT1S">
    <Period duration="PT2S">
      <AdaptationSet mimeType="video/mp4">
        <Representation bandwidth="42" id="3"></Representation>
      </AdaptationSet>
    </Period></MPD>"#;
    let mpd = parse(case5).unwrap();
    assert_eq!(mpd.mpdtype.as_deref(), Some("static"));
    assert_eq!(mpd.minBufferTime, Some(XsDuration::from_nanos(1_000_000_000)));
    let p1 = &mpd.periods[0];
    assert_eq!(p1.duration, Some(XsDuration::from_nanos(2_000_000_000)));
    let a1 = &p1.adaptations[0];
    assert_eq!(a1.mimeType.as_deref(), Some("video/mp4"));
    assert!(a1.segmentAlignment.is_absent());
    assert_eq!(a1.representations[0].bandwidth, Some(42));
}

#[test]
fn test_parse_dynamic_fixture() {
    setup_logging();
    let mpd = parse(&fixture("conditional")).unwrap();
    assert_eq!(mpd.xmlns.as_deref(), Some("urn:mpeg:dash:schema:mpd:2011"));
    assert_eq!(mpd.mpdtype.as_deref(), Some("dynamic"));
    assert_eq!(mpd.minimumUpdatePeriod, Some(XsDuration::from_nanos(2_000_000_000)));
    assert_eq!(mpd.timeShiftBufferDepth, Some(XsDuration::from_nanos(300_000_000_000)));
    assert_eq!(mpd.suggestedPresentationDelay, Some(XsDuration::from_nanos(6_000_000_000)));
    assert_eq!(mpd.minBufferTime, Some(XsDuration::from_nanos(1_500_000_000)));
    assert_eq!(mpd.availabilityStartTime, Some(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap()));
    assert_eq!(mpd.publishTime, Some(Utc.with_ymd_and_hms(2023, 3, 14, 9, 21, 44).unwrap()));
    assert_eq!(mpd.base_url.len(), 2);
    assert_eq!(mpd.base_url[0].serviceLocation.as_deref(), Some("cdn-a"));
    assert_eq!(mpd.base_url[1].availabilityTimeComplete, Some(false));

    let period = &mpd.periods[0];
    assert_eq!(period.id.as_deref(), Some("p0"));
    assert_eq!(period.start, Some(XsDuration::ZERO));
    assert!(period.duration.is_none());

    let video = &period.adaptations[0];
    assert_eq!(video.segmentAlignment, ConditionalUint::Bool(true));
    assert_eq!(video.startWithSAP, ConditionalUint::Uint(1));
    assert_eq!(video.subsegmentAlignment, ConditionalUint::Uint(2));
    assert!(video.subsegmentStartsWithSAP.is_absent());
    assert!(!video.subsegmentStartsWithSAP.is_enabled());
    assert_eq!(video.roles[0].value.as_deref(), Some("main"));
    assert_eq!(video.content_protection[0].value.as_deref(), Some("cenc"));
    assert_eq!(video.representations.len(), 2);
    assert_eq!(video.representations[0].scanType.as_deref(), Some("progressive"));
    let st = video.SegmentTemplate.as_ref().unwrap();
    assert_eq!(st.duration, Some(180000));
    assert_eq!(st.timescale, Some(90000));

    let audio = &period.adaptations[1];
    assert_eq!(audio.segmentAlignment, ConditionalUint::Bool(false));
    assert!(!audio.segmentAlignment.is_enabled());
    assert_eq!(audio.lang.as_deref(), Some("en"));
    let timeline = audio.SegmentTemplate.as_ref().unwrap().SegmentTimeline.as_ref().unwrap();
    assert_eq!(timeline.segments.len(), 2);
    assert_eq!(timeline.segments[0].t, Some(0));
    assert_eq!(timeline.segments[0].r, Some(29));
    assert_eq!(timeline.segments[1].d, 48000);
    assert!(timeline.segments[1].r.is_none());
    assert_eq!(audio.representations[0].audioSamplingRate.as_deref(), Some("48000"));
}

#[test]
fn test_parse_static_fixture() {
    setup_logging();
    let mpd = parse(&fixture("static")).unwrap();
    // A zero-valued month component is accepted.
    assert_eq!(mpd.mediaPresentationDuration, Some(XsDuration::from_nanos(260_880_000_000)));
    assert_eq!(mpd.minBufferTime, Some(XsDuration::from_nanos(10_000_000_000)));
    let period = &mpd.periods[0];
    assert_eq!(period.duration, mpd.mediaPresentationDuration);
    assert_eq!(period.base_url[0].base, "https://example.com/vod/");
    let adapt = &period.adaptations[0];
    assert_eq!(adapt.subsegmentStartsWithSAP, ConditionalUint::Uint(1));
    assert_eq!(adapt.subsegmentAlignment, ConditionalUint::Bool(true));
    assert_eq!(adapt.bitstreamSwitching, Some(true));
    let rep = &adapt.representations[0];
    assert_eq!(rep.base_url[0].byteRange.as_deref(), Some("0-999"));
    assert_eq!(rep.base_url[0].base, "video-128k.mp4");
}

// Any malformed duration or conditional attribute fails the whole document.
#[test]
fn test_parse_invalid_attributes() {
    setup_logging();
    for xml in [
        r#"<MPD minBufferTime="PT"/>"#,
        r#"<MPD minBufferTime="PT1.S"/>"#,
        r#"<MPD minBufferTime=" PT1S"/>"#,
        r#"<MPD minBufferTime="PT1S "/>"#,
        r#"<MPD mediaPresentationDuration="P1Y2M"/>"#,
        r#"<MPD><Period start="xPT1S"/></MPD>"#,
        r#"<MPD><Period duration="PT1Sx"/></MPD>"#,
        r#"<MPD><Period><AdaptationSet segmentAlignment="TRUE"/></Period></MPD>"#,
        r#"<MPD><Period><AdaptationSet startWithSAP="yes"/></Period></MPD>"#,
        r#"<MPD><Period><AdaptationSet startWithSAP="-1"/></Period></MPD>"#,
        r#"<MPD><Period><AdaptationSet startWithSAP=""/></Period></MPD>"#,
    ] {
        match parse(xml) {
            Err(DashMpdError::Parsing(msg)) => assert!(!msg.is_empty()),
            other => panic!("expected a parse failure for {xml}, got {other:?}"),
        }
    }
}

#[test]
fn test_parse_error_mentions_attribute() {
    setup_logging();
    let err = parse(r#"<MPD><Period><AdaptationSet segmentAlignment="maybe"/></Period></MPD>"#)
        .unwrap_err()
        .to_string();
    assert!(err.contains("segmentAlignment"), "{err}");
    assert!(err.contains("maybe"), "{err}");
}

// These tests check that we are able to parse DASH manifests that contain XML elements for which we
// don't have definitions. We want to degrade gracefully and ignore these unknown elements, instead
// of triggering a parse failure.
#[test]
fn test_unknown_elements () {
    setup_logging();
    let case1 = r#"<MPD><UnknownElement/></MPD>"#;
    assert_eq!(parse(case1).unwrap().periods.len(), 0);

    let case2 = r#"<MPD><uprefix:UnknownElement></uprefix:UnknownElement></MPD>"#;
    assert_eq!(parse(case2).unwrap().periods.len(), 0);

    let case3 = r#"<MPD><Period><EventStream schemeIdUri="urn:foo"/><AdaptationSet/></Period></MPD>"#;
    let mpd = parse(case3).unwrap();
    assert_eq!(mpd.periods[0].adaptations.len(), 1);
}
