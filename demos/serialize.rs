// serialize.rs -- demonstrate generating a DASH MPD in XML programatically from Rust
//
// Run with `cargo run --example serialize`

use chrono::prelude::*;
use dash_mpd_xsd::{MPD, BaseURL, Representation, AdaptationSet, Period, ConditionalUint, XsDuration};


fn main () {
    let rep1 = Representation {
        id: Some("1".to_string()),
        codecs: Some("avc1.640028".to_string()),
        width: Some(1920),
        height: Some(800),
        bandwidth: Some(1980081),
        base_url: vec!(BaseURL { base: "https://example.net/foobles/".to_string(), ..Default::default() }),
        ..Default::default()
    };
    let rep2 = Representation {
        id: Some("2".to_string()),
        codecs: Some("hev1.1.6.L120.90".to_string()),
        width: Some(800),
        height: Some(600),
        bandwidth: Some(180081),
        base_url: vec!(BaseURL { base: "https://example.net/foobles/".to_string(), ..Default::default() }),
        ..Default::default()
    };
    let adapt = AdaptationSet {
        contentType: Some("video".to_string()),
        lang: Some("eng".to_string()),
        mimeType: Some("video/mp4".to_string()),
        segmentAlignment: ConditionalUint::Bool(true),
        startWithSAP: ConditionalUint::Uint(1),
        bitstreamSwitching: Some(true),
        representations: vec!(rep1, rep2),
        ..Default::default()
    };
    let period = Period {
        id: Some("1".to_string()),
        duration: XsDuration::from_millis(42_500),
        adaptations: vec!(adapt),
        ..Default::default()
    };
    let mpd = MPD {
        mpdtype: Some("static".to_string()),
        xmlns: Some("urn:mpeg:dash:schema:mpd:2011".to_string()),
        minBufferTime: XsDuration::from_secs(2),
        mediaPresentationDuration: XsDuration::from_millis(42_500),
        periods: vec!(period),
        publishTime: Some(Utc::now()),
        ..Default::default()
    };

    let xml = match mpd.encode() {
        Ok(xml) => xml,
        Err(e) => {
            eprintln!("Can't serialize MPD: {e}");
            std::process::exit(1);
        },
    };
    print!("{xml}");
    // check round-trippability
    if let Err(e) = dash_mpd_xsd::parse(&xml) {
        eprintln!("Can't deserialize our serialized XML: {e:?}");
    }
}
