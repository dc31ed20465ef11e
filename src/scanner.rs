//! Scanner collaborator contract
//!
//! Decoders live outside this crate. A [`Scanner`] takes a prepared
//! [`Image`], finds symbols in it and attaches them as a [`SymbolChain`]: a
//! singly linked, forward-only list of [`RawSymbol`] records. The image
//! then exposes owned [`Symbol`](crate::Symbol) values copied from that
//! chain.

use crate::image::Image;
use crate::Result;
use std::fmt;

/// Image scanner that can find barcodes in 2D images
///
/// # Example
/// ```
/// use zedbar_image::{Image, RawSymbol, Result, Scanner, SymbolChain, SymbolType};
///
/// struct Fixed;
///
/// impl Scanner for Fixed {
///     fn scan(&mut self, image: &mut Image) -> Result<usize> {
///         let chain: SymbolChain = [RawSymbol::new(SymbolType::QrCode, "hello")]
///             .into_iter()
///             .collect();
///         let found = chain.len();
///         image.set_results(chain);
///         Ok(found)
///     }
/// }
///
/// let mut image = Image::from_gray(&[0u8; 16], 4, 4).unwrap();
/// assert_eq!(Fixed.scan(&mut image).unwrap(), 1);
/// assert_eq!(image.symbols().len(), 1);
/// ```
pub trait Scanner {
    /// Scan `image`, attach the results to it and return how many were found
    fn scan(&mut self, image: &mut Image) -> Result<usize>;
}

/// One decode result as a scanner reports it
///
/// The type is kept as the raw integer tag so that add-on bits and tags
/// this crate does not name pass through untouched.
pub struct RawSymbol {
    symbol_type: i32,
    data: Vec<u8>,
    quality: i32,
    cache_count: i32,
    points: Vec<[i32; 2]>,
    next: Option<Box<RawSymbol>>,
}

impl RawSymbol {
    pub fn new(symbol_type: impl Into<i32>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            symbol_type: symbol_type.into(),
            data: data.into(),
            quality: 0,
            cache_count: 0,
            points: Vec::new(),
            next: None,
        }
    }

    pub fn with_quality(mut self, quality: i32) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_cache_count(mut self, count: i32) -> Self {
        self.cache_count = count;
        self
    }

    pub fn with_point(mut self, x: i32, y: i32) -> Self {
        self.points.push([x, y]);
        self
    }

    pub fn with_points(mut self, points: impl IntoIterator<Item = (i32, i32)>) -> Self {
        self.points.extend(points.into_iter().map(|(x, y)| [x, y]));
        self
    }

    pub fn symbol_type(&self) -> i32 {
        self.symbol_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    pub fn quality(&self) -> i32 {
        self.quality
    }

    pub fn cache_count(&self) -> i32 {
        self.cache_count
    }

    /// Number of points in the location polygon
    pub fn loc_size(&self) -> u32 {
        self.points.len() as u32
    }

    /// X coordinate of location point `index`, or -1 past the end
    pub fn loc_x(&self, index: u32) -> i32 {
        self.points.get(index as usize).map_or(-1, |p| p[0])
    }

    /// Y coordinate of location point `index`, or -1 past the end
    pub fn loc_y(&self, index: u32) -> i32 {
        self.points.get(index as usize).map_or(-1, |p| p[1])
    }

    pub(crate) fn points(&self) -> &[[i32; 2]] {
        &self.points
    }

    /// The record after this one in its chain
    pub fn next(&self) -> Option<&RawSymbol> {
        self.next.as_deref()
    }
}

impl Drop for RawSymbol {
    fn drop(&mut self) {
        // unlink iteratively so long chains cannot exhaust the stack
        let mut next = self.next.take();
        while let Some(mut node) = next {
            next = node.next.take();
        }
    }
}

impl fmt::Debug for RawSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawSymbol")
            .field("symbol_type", &self.symbol_type)
            .field("data", &String::from_utf8_lossy(&self.data))
            .field("quality", &self.quality)
            .field("cache_count", &self.cache_count)
            .field("points", &self.points)
            .field("has_next", &self.next.is_some())
            .finish()
    }
}

/// Forward-only chain of scan results, in the order the scanner found them
#[derive(Default)]
pub struct SymbolChain {
    head: Option<Box<RawSymbol>>,
    len: usize,
}

impl SymbolChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head(&self) -> Option<&RawSymbol> {
        self.head.as_deref()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Walk the chain from its head
    pub fn iter(&self) -> ChainIter<'_> {
        ChainIter { cur: self.head() }
    }
}

impl FromIterator<RawSymbol> for SymbolChain {
    fn from_iter<I: IntoIterator<Item = RawSymbol>>(iter: I) -> Self {
        let records: Vec<RawSymbol> = iter.into_iter().collect();
        let len = records.len();
        let mut head = None;
        for mut record in records.into_iter().rev() {
            record.next = head;
            head = Some(Box::new(record));
        }
        Self { head, len }
    }
}

impl fmt::Debug for SymbolChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over the records of a [`SymbolChain`]
pub struct ChainIter<'a> {
    cur: Option<&'a RawSymbol>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = &'a RawSymbol;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.cur?;
        self.cur = cur.next();
        Some(cur)
    }
}

impl<'a> IntoIterator for &'a SymbolChain {
    type Item = &'a RawSymbol;
    type IntoIter = ChainIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_keeps_order() {
        let chain: SymbolChain = (0..3)
            .map(|i| RawSymbol::new(13, vec![b'0' + i as u8]).with_quality(i))
            .collect();
        assert_eq!(chain.len(), 3);
        let qualities: Vec<i32> = chain.iter().map(RawSymbol::quality).collect();
        assert_eq!(qualities, vec![0, 1, 2]);
        let head = chain.head().unwrap();
        assert_eq!(head.next().unwrap().data(), b"1");
        assert!(head.next().unwrap().next().unwrap().next().is_none());
    }

    #[test]
    fn test_empty_chain() {
        let chain = SymbolChain::new();
        assert!(chain.is_empty());
        assert!(chain.head().is_none());
        assert_eq!(chain.iter().count(), 0);
    }

    #[test]
    fn test_location_accessors() {
        let sym = RawSymbol::new(64, "x").with_point(3, 4).with_points([(5, 6)]);
        assert_eq!(sym.loc_size(), 2);
        assert_eq!((sym.loc_x(0), sym.loc_y(0)), (3, 4));
        assert_eq!((sym.loc_x(1), sym.loc_y(1)), (5, 6));
        assert_eq!((sym.loc_x(2), sym.loc_y(2)), (-1, -1));
    }

    #[test]
    fn test_long_chain_drops_without_recursion() {
        let chain: SymbolChain = (0..200_000).map(|_| RawSymbol::new(128, "a")).collect();
        assert_eq!(chain.len(), 200_000);
        drop(chain);
    }
}
