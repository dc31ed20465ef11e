//! Markup serialization of scan results
//!
//! Results are written in the barcode results schema versioned by
//! [`NAMESPACE`]. Printable payloads go into CDATA sections; anything else
//! is hex encoded and tagged with `format='hex'`.

use crate::image::Image;
use crate::symbol::{Addon, Symbol};
use crate::{Error, Result};
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Namespace identifying the results schema version
pub const NAMESPACE: &str = "http://zbar.sourceforge.net/2008/barcode";

/// Output format for scan results
pub trait SymbolFormatter {
    /// Render one symbol on its own
    fn format_symbol(&self, symbol: &Symbol) -> Result<String>;

    /// Render every symbol attached to `image`
    fn format_image(&self, image: &Image) -> Result<String>;
}

/// Formatter for the barcode results markup
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFormatter;

impl SymbolFormatter for XmlFormatter {
    fn format_symbol(&self, symbol: &Symbol) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        write_symbol(&mut writer, symbol)?;
        finish(writer)
    }

    fn format_image(&self, image: &Image) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        let seq = image.sequence().to_string();
        emit(
            &mut writer,
            Event::Start(BytesStart::new("barcodes").with_attributes([("xmlns", NAMESPACE)])),
        )?;
        emit(
            &mut writer,
            Event::Start(BytesStart::new("index").with_attributes([("num", seq.as_str())])),
        )?;
        for symbol in &image.symbols() {
            write_symbol(&mut writer, symbol)?;
        }
        emit(&mut writer, Event::End(BytesEnd::new("index")))?;
        emit(&mut writer, Event::End(BytesEnd::new("barcodes")))?;
        finish(writer)
    }
}

impl Symbol {
    /// Render this symbol as a `<symbol>` element
    pub fn to_xml(&self) -> Result<String> {
        XmlFormatter.format_symbol(self)
    }
}

impl Image {
    /// Render the results of the last scan as a `<barcodes>` document
    pub fn results_xml(&self) -> Result<String> {
        XmlFormatter.format_image(self)
    }
}

fn write_symbol(writer: &mut Writer<Vec<u8>>, symbol: &Symbol) -> Result<()> {
    let kind = symbol.symbol_type().to_string();
    let quality = symbol.quality().to_string();
    let count = symbol.cache_count().to_string();

    let mut start = BytesStart::new("symbol");
    start.push_attribute(("type", kind.as_str()));
    start.push_attribute(("quality", quality.as_str()));
    match symbol.addon() {
        Some(Addon::Two) => start.push_attribute(("addon", "2")),
        Some(Addon::Five) => start.push_attribute(("addon", "5")),
        None => {}
    }
    if symbol.cache_count() != 0 {
        start.push_attribute(("count", count.as_str()));
    }
    emit(writer, Event::Start(start))?;

    if !symbol.points().is_empty() {
        let points = symbol
            .points()
            .iter()
            .map(|p| format!("{},{}", p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ");
        emit(
            writer,
            Event::Empty(BytesStart::new("polygon").with_attributes([("points", points.as_str())])),
        )?;
    }

    match printable(symbol.data()) {
        Some(text) => {
            emit(writer, Event::Start(BytesStart::new("data")))?;
            emit(writer, Event::CData(BytesCData::new(text)))?;
        }
        None => {
            let length = symbol.data().len().to_string();
            let start = BytesStart::new("data")
                .with_attributes([("format", "hex"), ("length", length.as_str())]);
            emit(writer, Event::Start(start))?;
            let encoded = hex::encode(symbol.data());
            emit(writer, Event::Text(BytesText::new(&encoded)))?;
        }
    }
    emit(writer, Event::End(BytesEnd::new("data")))?;
    emit(writer, Event::End(BytesEnd::new("symbol")))
}

/// Payload as text when it can sit in a CDATA section unchanged
fn printable(data: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(data).ok()?;
    let clean = text
        .chars()
        .all(|c| !c.is_control() || matches!(c, '\t' | '\r' | '\n'));
    (clean && !text.contains("]]>")).then_some(text)
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Markup(e.to_string()))
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    String::from_utf8(writer.into_inner()).map_err(|e| Error::Markup(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::RawSymbol;
    use crate::symbol::SymbolType;

    fn symbol(raw: RawSymbol) -> Symbol {
        Symbol::from(&raw)
    }

    #[test]
    fn test_text_payload_in_cdata() {
        let sym = symbol(
            RawSymbol::new(SymbolType::QrCode, "hello <world>")
                .with_quality(1)
                .with_points([(0, 0), (10, 0), (10, 10)]),
        );
        assert_eq!(
            sym.to_xml().unwrap(),
            "<symbol type=\"QR-Code\" quality=\"1\">\
             <polygon points=\"0,0 10,0 10,10\"/>\
             <data><![CDATA[hello <world>]]></data></symbol>"
        );
    }

    #[test]
    fn test_binary_payload_is_hex() {
        let sym = symbol(RawSymbol::new(SymbolType::Code128, vec![0x00, 0xff, 0x41]));
        let xml = sym.to_xml().unwrap();
        assert!(xml.contains("<data format=\"hex\" length=\"3\">00ff41</data>"));
    }

    #[test]
    fn test_cdata_terminator_forces_hex() {
        let sym = symbol(RawSymbol::new(SymbolType::Code128, "a]]>b"));
        assert!(sym.to_xml().unwrap().contains("format=\"hex\""));
    }

    #[test]
    fn test_addon_and_count_attributes() {
        let raw = i32::from(SymbolType::Ean13) | 0x500;
        let sym = symbol(RawSymbol::new(raw, "978020137962").with_cache_count(-2));
        let xml = sym.to_xml().unwrap();
        assert!(xml.starts_with("<symbol type=\"EAN-13\" quality=\"0\" addon=\"5\" count=\"-2\">"));

        let plain = symbol(RawSymbol::new(SymbolType::Ean8, "12345670"));
        let xml = plain.to_xml().unwrap();
        assert!(!xml.contains("count="));
        assert!(!xml.contains("addon="));
        assert!(!xml.contains("<polygon"));
    }

    #[test]
    fn test_whitespace_controls_stay_text() {
        assert_eq!(printable(b"a\tb\r\nc"), Some("a\tb\r\nc"));
        assert_eq!(printable(b"a\x07b"), None);
        assert_eq!(printable(&[0xc3, 0x28]), None);
    }

    #[test]
    fn test_image_document() {
        let mut img = Image::from_gray(&[0; 4], 2, 2).unwrap();
        img.set_sequence(3);
        img.set_results(
            [
                RawSymbol::new(SymbolType::Ean8, "12345670"),
                RawSymbol::new(SymbolType::QrCode, "x"),
            ]
            .into_iter()
            .collect(),
        );
        let xml = img.results_xml().unwrap();
        assert!(xml.starts_with(&format!("<barcodes xmlns=\"{NAMESPACE}\"><index num=\"3\">")));
        assert!(xml.ends_with("</index></barcodes>"));
        assert_eq!(xml.matches("<symbol ").count(), 2);
        assert!(xml.find("EAN-8").unwrap() < xml.find("QR-Code").unwrap());
    }

    #[test]
    fn test_empty_image_document() {
        let xml = Image::new().results_xml().unwrap();
        assert_eq!(
            xml,
            format!("<barcodes xmlns=\"{NAMESPACE}\"><index num=\"0\"></index></barcodes>")
        );
    }
}
