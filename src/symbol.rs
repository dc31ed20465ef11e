//! Decoded symbol results
//!
//! A [`Symbol`] is an owned copy of one scan result. It holds no reference
//! to the image or its sample buffer, so it stays valid after both are
//! gone.

use crate::scanner::{RawSymbol, SymbolChain};
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;
use std::fmt::{self, Display};

/// Low byte of a symbology tag: the base barcode type
pub const BASE_MASK: i32 = 0x00ff;
/// Bits of a symbology tag that flag an EAN/UPC add-on
pub const ADDON_MASK: i32 = 0x0700;
const ADDON2: i32 = 0x0200;
const ADDON5: i32 = 0x0500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord, Hash)]
pub enum SymbolType {
    #[default]
    None = 0,
    /// Intermediate status while decoding is still in progress
    Partial = 1,
    Ean2 = 2,
    Ean5 = 5,
    Ean8 = 8,
    Upce = 9,
    Isbn10 = 10,
    Upca = 12,
    Ean13 = 13,
    Isbn13 = 14,
    Composite = 15,
    I25 = 25,
    Databar = 34,
    DatabarExp = 35,
    Codabar = 38,
    Code39 = 39,
    Pdf417 = 57,
    QrCode = 64,
    SqCode = 80,
    Code93 = 93,
    Code128 = 128,
}

impl SymbolType {
    /// Every concrete symbology (excludes `None` and `Partial`)
    pub const ALL: [Self; 19] = [
        SymbolType::Ean2,
        SymbolType::Ean5,
        SymbolType::Ean8,
        SymbolType::Upce,
        SymbolType::Isbn10,
        SymbolType::Upca,
        SymbolType::Ean13,
        SymbolType::Isbn13,
        SymbolType::Composite,
        SymbolType::I25,
        SymbolType::Databar,
        SymbolType::DatabarExp,
        SymbolType::Codabar,
        SymbolType::Code39,
        SymbolType::Pdf417,
        SymbolType::QrCode,
        SymbolType::SqCode,
        SymbolType::Code93,
        SymbolType::Code128,
    ];
}

impl Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::None => "None",
                Self::Partial => "Partial",
                Self::Ean2 => "EAN-2",
                Self::Ean5 => "EAN-5",
                Self::Ean8 => "EAN-8",
                Self::Upce => "UPC-E",
                Self::Isbn10 => "ISBN-10",
                Self::Upca => "UPC-A",
                Self::Ean13 => "EAN-13",
                Self::Isbn13 => "ISBN-13",
                Self::Composite => "COMPOSITE",
                Self::I25 => "I2/5",
                Self::Databar => "DataBar",
                Self::DatabarExp => "DataBar-Exp",
                Self::Codabar => "Codabar",
                Self::Code39 => "CODE-39",
                Self::Pdf417 => "PDF417",
                Self::Code93 => "CODE-93",
                Self::Code128 => "CODE-128",
                Self::QrCode => "QR-Code",
                Self::SqCode => "SQ-Code",
            }
        )
    }
}

impl From<SymbolType> for i32 {
    fn from(value: SymbolType) -> Self {
        value as i32
    }
}

impl From<i32> for SymbolType {
    fn from(value: i32) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Partial,
            2 => Self::Ean2,
            5 => Self::Ean5,
            8 => Self::Ean8,
            9 => Self::Upce,
            10 => Self::Isbn10,
            12 => Self::Upca,
            13 => Self::Ean13,
            14 => Self::Isbn13,
            15 => Self::Composite,
            25 => Self::I25,
            34 => Self::Databar,
            35 => Self::DatabarExp,
            38 => Self::Codabar,
            39 => Self::Code39,
            57 => Self::Pdf417,
            64 => Self::QrCode,
            80 => Self::SqCode,
            93 => Self::Code93,
            128 => Self::Code128,
            _ => Self::None,
        }
    }
}

/// EAN/UPC supplement flagged in the add-on bits of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Addon {
    Two,
    Five,
}

impl Display for Addon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Two => "+2",
            Self::Five => "+5",
        })
    }
}

/// A full symbology tag: base type plus add-on flags
///
/// The raw integer is kept, so tags are passed through unchanged even when
/// the base type is not one this crate names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Symbology {
    raw: i32,
}

impl Symbology {
    pub fn from_raw(raw: i32) -> Self {
        Self { raw }
    }

    pub fn raw(self) -> i32 {
        self.raw
    }

    pub fn base(self) -> SymbolType {
        SymbolType::from(self.raw & BASE_MASK)
    }

    pub fn addon(self) -> Option<Addon> {
        match self.raw & ADDON_MASK {
            ADDON2 => Some(Addon::Two),
            ADDON5 => Some(Addon::Five),
            _ => None,
        }
    }

    /// Intermediate result, neither "nothing" nor a concrete symbology
    pub fn is_partial(self) -> bool {
        self.raw & BASE_MASK == SymbolType::Partial as i32
    }
}

impl From<SymbolType> for Symbology {
    fn from(value: SymbolType) -> Self {
        Self { raw: value as i32 }
    }
}

impl From<Symbology> for i32 {
    fn from(value: Symbology) -> Self {
        value.raw
    }
}

impl Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base())?;
        if let Some(addon) = self.addon() {
            write!(f, "{addon}")?;
        }
        Ok(())
    }
}

/// Inter-frame cache status of a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Seen too few times to confirm; holds the (negative) count
    Uncertain(i32),
    /// Newly verified in this frame
    Verified,
    /// The nth repeat of an already verified symbol
    Duplicate(i32),
}

impl From<i32> for CacheState {
    fn from(count: i32) -> Self {
        match count {
            c if c < 0 => Self::Uncertain(c),
            0 => Self::Verified,
            c => Self::Duplicate(c),
        }
    }
}

/// Image-space location point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// A decoded barcode symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    symbology: Symbology,
    data: Vec<u8>,
    quality: i32,
    cache_count: i32,
    points: Vec<Point>,
}

impl Symbol {
    /// Get the base symbol type
    pub fn symbol_type(&self) -> SymbolType {
        self.symbology.base()
    }

    /// Get the full tag including add-on flags
    pub fn symbology(&self) -> Symbology {
        self.symbology
    }

    pub fn addon(&self) -> Option<Addon> {
        self.symbology.addon()
    }

    /// Get the decoded data as bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the decoded data as a string (if valid UTF-8)
    pub fn data_string(&self) -> Option<&str> {
        std::str::from_utf8(self.data()).ok()
    }

    /// Get the decoded data as text
    ///
    /// Valid UTF-8 is returned as is; anything else is read as Windows-1252,
    /// which never fails.
    pub fn text(&self) -> Cow<'_, str> {
        match self.data_string() {
            Some(s) => Cow::Borrowed(s),
            None => WINDOWS_1252.decode_without_bom_handling(&self.data).0,
        }
    }

    /// Relative confidence; only comparable within one scan
    pub fn quality(&self) -> i32 {
        self.quality
    }

    /// Inter-frame cache count, exactly as the scanner reported it
    pub fn cache_count(&self) -> i32 {
        self.cache_count
    }

    pub fn cache_state(&self) -> CacheState {
        CacheState::from(self.cache_count)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn loc_size(&self) -> u32 {
        self.points.len() as u32
    }

    /// X coordinate of location point `index`, or -1 past the end
    pub fn loc_x(&self, index: u32) -> i32 {
        self.points.get(index as usize).map_or(-1, |p| p.x)
    }

    /// Y coordinate of location point `index`, or -1 past the end
    pub fn loc_y(&self, index: u32) -> i32 {
        self.points.get(index as usize).map_or(-1, |p| p.y)
    }
}

impl From<&RawSymbol> for Symbol {
    fn from(raw: &RawSymbol) -> Self {
        Self {
            symbology: Symbology::from_raw(raw.symbol_type()),
            data: raw.data().to_vec(),
            quality: raw.quality(),
            cache_count: raw.cache_count(),
            points: raw
                .points()
                .iter()
                .map(|&[x, y]| Point { x, y })
                .collect(),
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.symbology, self.text())
    }
}

/// Iterator over symbols
pub struct SymbolIterator<'a> {
    iter: std::slice::Iter<'a, Symbol>,
}

impl<'a> Iterator for SymbolIterator<'a> {
    type Item = &'a Symbol;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl ExactSizeIterator for SymbolIterator<'_> {}

/// Collection of decoded symbols, in scan order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolSet {
    symbols: Vec<Symbol>,
}

impl SymbolSet {
    /// Copy every record of a chain in a single pass from its head
    pub fn from_chain(chain: &SymbolChain) -> Self {
        Self {
            symbols: chain.iter().map(Symbol::from).collect(),
        }
    }

    /// Get an iterator over the symbols
    pub fn iter(&self) -> SymbolIterator<'_> {
        SymbolIterator {
            iter: self.symbols.iter(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Symbol> {
        self.symbols.get(index)
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Check if there are any symbols
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Get the number of symbols
    pub fn len(&self) -> usize {
        self.symbols.len()
    }
}

impl IntoIterator for SymbolSet {
    type Item = Symbol;
    type IntoIter = std::vec::IntoIter<Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.symbols.into_iter()
    }
}

impl<'a> IntoIterator for &'a SymbolSet {
    type Item = &'a Symbol;
    type IntoIter = SymbolIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_type_round_trip() {
        for ty in SymbolType::ALL {
            assert_eq!(SymbolType::from(i32::from(ty)), ty);
        }
        assert_eq!(SymbolType::from(7), SymbolType::None);
    }

    #[test]
    fn test_partial_is_distinct() {
        let partial = Symbology::from(SymbolType::Partial);
        assert!(partial.is_partial());
        assert_ne!(partial.base(), SymbolType::None);
        assert!(!Symbology::default().is_partial());
        assert!(SymbolType::ALL.iter().all(|&t| !Symbology::from(t).is_partial()));
    }

    #[test]
    fn test_addon_bits() {
        let ean5 = Symbology::from_raw(0x0500 | 13);
        assert_eq!(ean5.base(), SymbolType::Ean13);
        assert_eq!(ean5.addon(), Some(Addon::Five));
        assert_eq!(ean5.to_string(), "EAN-13+5");

        let ean2 = Symbology::from_raw(0x0200 | 12);
        assert_eq!(ean2.base(), SymbolType::Upca);
        assert_eq!(ean2.addon(), Some(Addon::Two));

        assert_eq!(Symbology::from(SymbolType::Code128).addon(), None);
        assert_eq!(Symbology::from(SymbolType::Code128).base(), SymbolType::Code128);
    }

    #[test]
    fn test_cache_state() {
        assert_eq!(CacheState::from(-2), CacheState::Uncertain(-2));
        assert_eq!(CacheState::from(0), CacheState::Verified);
        assert_eq!(CacheState::from(3), CacheState::Duplicate(3));
    }

    #[test]
    fn test_symbol_copies_record() {
        let raw = RawSymbol::new(SymbolType::Ean13, "9780201379624")
            .with_quality(4)
            .with_cache_count(-1)
            .with_points([(1, 2), (3, 4)]);
        let sym = Symbol::from(&raw);
        drop(raw);
        assert_eq!(sym.symbol_type(), SymbolType::Ean13);
        assert_eq!(sym.data(), b"9780201379624");
        assert_eq!(sym.quality(), 4);
        assert_eq!(sym.cache_count(), -1);
        assert_eq!(sym.cache_state(), CacheState::Uncertain(-1));
        assert_eq!(sym.points(), &[Point { x: 1, y: 2 }, Point { x: 3, y: 4 }]);
        assert_eq!(sym.loc_x(5), -1);
        assert_eq!(sym.to_string(), "EAN-13 9780201379624");
    }

    #[test]
    fn test_binary_payload_keeps_zero_bytes() {
        let sym = Symbol::from(&RawSymbol::new(SymbolType::QrCode, vec![0x41, 0x00, 0xe9]));
        assert_eq!(sym.data(), &[0x41, 0x00, 0xe9]);
        assert_eq!(sym.data_string(), None);
        assert_eq!(sym.text(), "A\u{0}é");
    }

    #[test]
    fn test_set_from_chain() {
        let chain: SymbolChain = [
            RawSymbol::new(SymbolType::Code39, "A"),
            RawSymbol::new(SymbolType::Code93, "B"),
        ]
        .into_iter()
        .collect();
        let set = SymbolSet::from_chain(&chain);
        assert_eq!(set.len(), 2);
        let types: Vec<_> = set.iter().map(Symbol::symbol_type).collect();
        assert_eq!(types, vec![SymbolType::Code39, SymbolType::Code93]);
        assert_eq!(set.get(1).unwrap().data(), b"B");
        assert_eq!(set.into_iter().count(), 2);
    }
}
