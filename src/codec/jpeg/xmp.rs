//! XMP/RDF serialization of gain-map metadata under the `hdrgm:` namespace,
//! for both ISO 21496-1 and the Google UltraHDR v1 container convention.
//!
//! Grounded on the teacher's `jpeg/xmp.rs`, which built the same `rdf:RDF`
//! skeleton by hand with `quick_xml::Writer`; generalized to scalar
//! (monochrome) gain map fields instead of the teacher's per-channel
//! `hdrgm:Gain*` sequences.

use crate::error::{Result, UhdrError};
use crate::gainmap::GainMapMetadata;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;

const HDRGM_NS: &str = "http://ns.adobe.com/hdr-gain-map/1.0/";
const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// Serializes gain map metadata as a standalone XMP packet suitable for an
/// APP1 `http://ns.adobe.com/xap/1.0/` segment.
pub fn write_gain_map_xmp(metadata: &GainMapMetadata) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut writer = Writer::new(Cursor::new(&mut buf));
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(UhdrError::from)?;

    let mut rdf = BytesStart::new("rdf:RDF");
    rdf.push_attribute(("xmlns:rdf", RDF_NS));
    writer.write_event(Event::Start(rdf)).map_err(UhdrError::from)?;

    let mut desc = BytesStart::new("rdf:Description");
    desc.push_attribute(("xmlns:hdrgm", HDRGM_NS));
    desc.push_attribute(("hdrgm:Version", metadata.version.as_str()));
    desc.push_attribute(("hdrgm:BaseRenditionIsHDR", "False"));
    desc.push_attribute(("hdrgm:GainMapMin", metadata.min_content_boost.log2().to_string().as_str()));
    desc.push_attribute(("hdrgm:GainMapMax", metadata.max_content_boost.log2().to_string().as_str()));
    desc.push_attribute(("hdrgm:Gamma", metadata.gamma.to_string().as_str()));
    desc.push_attribute(("hdrgm:OffsetSDR", metadata.offset_sdr.to_string().as_str()));
    desc.push_attribute(("hdrgm:OffsetHDR", metadata.offset_hdr.to_string().as_str()));
    desc.push_attribute(("hdrgm:HDRCapacityMin", metadata.hdr_capacity_min.log2().to_string().as_str()));
    desc.push_attribute(("hdrgm:HDRCapacityMax", metadata.hdr_capacity_max.log2().to_string().as_str()));
    writer.write_event(Event::Empty(desc)).map_err(UhdrError::from)?;

    writer
        .write_event(Event::End(BytesEnd::new("rdf:RDF")))
        .map_err(UhdrError::from)?;

    Ok(buf)
}

/// Parses gain map metadata back out of an XMP packet written by
/// [`write_gain_map_xmp`]. `GainMapMin`/`GainMapMax`/`HDRCapacityMin`/`Max`
/// are stored as log2 values per the hdrgm convention and are exponentiated
/// back to linear boost factors here.
pub fn read_gain_map_xmp(xmp: &[u8]) -> Result<GainMapMetadata> {
    let mut reader = Reader::from_reader(xmp);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut metadata = GainMapMetadata::default();
    let mut found = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(UhdrError::from)? {
            Event::Empty(tag) | Event::Start(tag) if tag.name().as_ref() == b"rdf:Description" => {
                for attr in tag.attributes().flatten() {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                    let value = attr.unescape_value().map_err(UhdrError::from)?.to_string();
                    if key == "hdrgm:Version" {
                        metadata.version = value.clone();
                        continue;
                    }
                    let parsed: f32 = value.parse().unwrap_or(f32::NAN);
                    match key.as_str() {
                        "hdrgm:GainMapMin" if parsed.is_finite() => metadata.min_content_boost = 2f32.powf(parsed),
                        "hdrgm:GainMapMax" if parsed.is_finite() => metadata.max_content_boost = 2f32.powf(parsed),
                        "hdrgm:Gamma" if parsed.is_finite() => metadata.gamma = parsed,
                        "hdrgm:OffsetSDR" if parsed.is_finite() => metadata.offset_sdr = parsed,
                        "hdrgm:OffsetHDR" if parsed.is_finite() => metadata.offset_hdr = parsed,
                        "hdrgm:HDRCapacityMin" if parsed.is_finite() => metadata.hdr_capacity_min = 2f32.powf(parsed),
                        "hdrgm:HDRCapacityMax" if parsed.is_finite() => metadata.hdr_capacity_max = 2f32.powf(parsed),
                        _ => {}
                    }
                }
                found = true;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !found {
        return Err(UhdrError::MetadataError("no hdrgm:Description element found in XMP packet".into()));
    }
    metadata.validate()?;
    Ok(metadata)
}

/// Wraps a completed XMP packet body in the outer `x:xmpmeta` element Adobe
/// tooling (and this crate's own reader) expect.
pub fn wrap_xmpmeta(body: &[u8]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut writer = Writer::new(Cursor::new(&mut buf));
    let mut meta = BytesStart::new("x:xmpmeta");
    meta.push_attribute(("xmlns:x", "adobe:ns:meta/"));
    writer.write_event(Event::Start(meta)).map_err(UhdrError::from)?;
    writer
        .write_event(Event::Text(BytesText::from_escaped(
            std::str::from_utf8(body).map_err(|e| UhdrError::MetadataError(e.to_string()))?,
        )))
        .map_err(UhdrError::from)?;
    writer
        .write_event(Event::End(BytesEnd::new("x:xmpmeta")))
        .map_err(UhdrError::from)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_default_metadata() {
        let metadata = GainMapMetadata::default();
        let xmp = write_gain_map_xmp(&metadata).unwrap();
        let parsed = read_gain_map_xmp(&xmp).unwrap();
        assert!((parsed.max_content_boost - metadata.max_content_boost).abs() < 1e-3);
        assert!((parsed.gamma - metadata.gamma).abs() < 1e-6);
    }

    #[test]
    fn roundtrips_version_string() {
        let metadata = GainMapMetadata::default();
        let xmp = write_gain_map_xmp(&metadata).unwrap();
        let parsed = read_gain_map_xmp(&xmp).unwrap();
        assert_eq!(parsed.version, metadata.version);
    }

    #[test]
    fn rejects_xmp_without_description() {
        let xmp = b"<?xml version=\"1.0\"?><rdf:RDF xmlns:rdf=\"x\"></rdf:RDF>";
        assert!(read_gain_map_xmp(xmp).is_err());
    }
}
