// round_trip.rs -- check round trip from XML to Rust structs to XML.
//
// This tool reads a DASH manifest from a file, deserializes the content to our Rust structs, then
// serializes the result back to XML on stdout. It can be used to help identify attributes and nodes
// that are incorrectly defined in our Rust structs.
//
// You should expect attributes of type xs:duration to be flagged as differences when comparing
// the output with the original manifest, because we always write their canonical form (for
// instance, we don't serialize trailing zeros in the fractional part of seconds, and "PT60S" is
// written as "PT1M"). Elements and attributes for which we have no definition are dropped.
//
// To run this little tool:
//
//    cargo run --example round_trip tests/fixtures/static.mpd


use std::fs;
use anyhow::{Context, Result};
use clap::{Arg, ArgAction};
use dash_mpd_xsd::{parse, EncodeOptions};
use tracing::info;


fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env()
                         .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let matches = clap::Command::new("round-trip")
        .arg(Arg::new("compact")
             .long("compact")
             .action(ArgAction::SetTrue)
             .help("Write the manifest on a single line, without an XML declaration"))
        .arg(Arg::new("path")
             .num_args(1)
             .value_name("MPD-FILE")
             .help("Path of the MPD manifest")
             .required(true)
             .index(1))
        .get_matches();
    let path = matches.get_one::<String>("path")
        .context("missing manifest path")?;
    let xml = fs::read_to_string(path)
        .with_context(|| format!("reading {path}"))?;
    let mpd = parse(&xml).context("parsing DASH XML")?;
    info!("Parsed manifest with {} period(s)", mpd.periods.len());
    let options = if matches.get_flag("compact") {
        EncodeOptions { indent: None, xml_declaration: false }
    } else {
        EncodeOptions::default()
    };
    let rewritten = mpd.encode_with(&options).context("serializing MPD")?;
    print!("{rewritten}");
    Ok(())
}
