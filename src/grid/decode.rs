//! Provides deserializers of the correction grid resources.
//!
//! Two encodings are accepted.
//!
//! - The flat format, little-endian: the magic `b"OSTN"`,
//!   `columns: u32`, `rows: u32`, `east_base: i32`, `north_base: i32`,
//!   `sentinel: i32` (−1 for none), then `columns * rows` east raw values
//!   and the same number of north raw values, as `u16`.
//! - The packed format, one text line per row (northing km).
//!   A line starts with 3 ASCII digits, the first populated column,
//!   followed by 6 bytes per column, 3 base-32 digits (from `'0'` to `'O'`)
//!   for east and 3 for north. The grid is 701 columns wide,
//!   the bases are 86 m and −82 m, and the raw value 0 means no data.
use std::error::Error;
use std::fmt::{Display, Formatter};

use super::CorrectionGrid;

/// The magic bytes of the flat format.
pub const MAGIC: &[u8; 4] = b"OSTN";

const HEADER_LEN: usize = 24;
const NO_SENTINEL: i32 = -1;

/// The east base of the packed format \[mm\].
const PACKED_EAST_BASE: i32 = 86000;
/// The north base of the packed format \[mm\].
const PACKED_NORTH_BASE: i32 = -82000;
const PACKED_SENTINEL: u16 = 0;

/// The max number of rows of the packed format, 0 to 1250 km north.
pub const MAX_PACKED_ROWS: usize = 1251;

/// Deserializes a correction grid resource in either format.
///
/// The flat format is detected by the magic.
///
/// # Errors
///
/// Returns [`Err`] when `bytes` is malformed.
///
/// # Example
///
/// ```
/// # use osgb::grid::{decode, CorrectionGrid};
/// let grid = CorrectionGrid::from_parts(2, 2, vec![1, 2, 3, 4], vec![5, 6, 7, 8], 86000, -82000, None)?;
/// assert_eq!(decode(&grid.encode_flat())?, grid);
///
/// // packed, a single row with one populated column
/// let grid = decode(b"0020D20:@\n")?;
/// assert_eq!(grid.columns(), 701);
/// assert_eq!(grid.rows(), 1);
/// # Ok::<(), osgb::grid::DecodeGridError>(())
/// ```
pub fn decode(bytes: &[u8]) -> Result<CorrectionGrid, DecodeGridError> {
    if bytes.starts_with(MAGIC) {
        decode_flat(bytes)
    } else {
        decode_packed(bytes)
    }
}

#[inline]
fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[inline]
fn le_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Deserializes the flat format.
///
/// # Errors
///
/// Returns [`Err`] when the header is invalid
/// or the length of `bytes` does not match the header.
pub fn decode_flat(bytes: &[u8]) -> Result<CorrectionGrid, DecodeGridError> {
    let header = bytes
        .get(..HEADER_LEN)
        .ok_or(DecodeGridError::new_truncated(HEADER_LEN, bytes.len()))?;

    if !header.starts_with(MAGIC) {
        return Err(DecodeGridError::new_bad_header());
    }

    let columns = le_u32(header, 4) as usize;
    let rows = le_u32(header, 8) as usize;
    let east_base = le_i32(header, 12);
    let north_base = le_i32(header, 16);
    let sentinel = match le_i32(header, 20) {
        NO_SENTINEL => None,
        value => Some(u16::try_from(value).map_err(|_| DecodeGridError::new_bad_header())?),
    };

    let count = columns
        .checked_mul(rows)
        .ok_or(DecodeGridError::new_bad_header())?;
    let expected = count
        .checked_mul(4)
        .and_then(|n| n.checked_add(HEADER_LEN))
        .ok_or(DecodeGridError::new_bad_header())?;

    if bytes.len() < expected {
        return Err(DecodeGridError::new_truncated(expected, bytes.len()));
    } else if bytes.len() > expected {
        return Err(DecodeGridError::new_length(expected, bytes.len()));
    }

    let (east, north) = bytes[HEADER_LEN..].split_at(2 * count);
    let values = |raw: &[u8]| -> Vec<u16> {
        raw.chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    };

    let grid = CorrectionGrid::from_parts(
        columns,
        rows,
        values(east),
        values(north),
        east_base,
        north_base,
        sentinel,
    )?;

    tracing::debug!(columns, rows, "decoded flat correction grid");
    Ok(grid)
}

/// Decodes 3 base-32 digits.
#[inline]
fn triple(digits: &[u8]) -> Option<u16> {
    digits.iter().try_fold(0u16, |acc, &digit| match digit {
        b'0'..=b'O' => Some((acc << 5) | (digit - b'0') as u16),
        _ => None,
    })
}

/// Deserializes the packed format.
///
/// Lines are separated by `\n`, a trailing `\r` is ignored.
/// The columns not populated by a line are filled by the sentinel.
///
/// # Errors
///
/// Returns [`Err`] when a line is malformed or overruns the width,
/// or there are more than [`MAX_PACKED_ROWS`] lines.
///
/// # Example
///
/// ```
/// # use osgb::Shift;
/// # use osgb::grid::decode_packed;
/// let grid = decode_packed(b"0020D20:@\n")?;
///
/// assert_eq!(grid.node(1, 0), None);
/// // east 0D2 = 642, north 0:@ = 336
/// assert_eq!(grid.node(2, 0), Some(Shift::new(86.642, -81.664)));
/// # Ok::<(), osgb::grid::DecodeGridError>(())
/// ```
pub fn decode_packed(bytes: &[u8]) -> Result<CorrectionGrid, DecodeGridError> {
    const WIDTH: usize = CorrectionGrid::COLUMNS;

    let mut lines: Vec<&[u8]> = bytes.split(|b| *b == b'\n').collect();
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    // every line costs 701 nodes
    if lines.len() > MAX_PACKED_ROWS {
        return Err(DecodeGridError::new_too_tall(MAX_PACKED_ROWS + 1));
    }

    let rows = lines.len();
    let mut east = vec![PACKED_SENTINEL; WIDTH * rows];
    let mut north = vec![PACKED_SENTINEL; WIDTH * rows];

    for (row, line) in lines.into_iter().enumerate() {
        let lineno = row + 1;
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        let (head, body) = line
            .split_at_checked(3)
            .ok_or(DecodeGridError::new_row(lineno))?;

        if !head.iter().all(u8::is_ascii_digit) || body.len() % 6 != 0 {
            return Err(DecodeGridError::new_row(lineno));
        }

        let start = head
            .iter()
            .fold(0, |acc, digit| 10 * acc + (digit - b'0') as usize);

        if start + body.len() / 6 > WIDTH {
            return Err(DecodeGridError::new_too_wide(lineno));
        }

        for (i, chunk) in body.chunks_exact(6).enumerate() {
            let column = 3 + 6 * i;
            let index = row * WIDTH + start + i;

            east[index] =
                triple(&chunk[..3]).ok_or(DecodeGridError::new_digit(lineno, column))?;
            north[index] =
                triple(&chunk[3..]).ok_or(DecodeGridError::new_digit(lineno, column + 3))?;
        }
    }

    let grid = CorrectionGrid::from_parts(
        WIDTH,
        rows,
        east,
        north,
        PACKED_EAST_BASE,
        PACKED_NORTH_BASE,
        Some(PACKED_SENTINEL),
    )?;

    tracing::debug!(columns = WIDTH, rows, "decoded packed correction grid");
    Ok(grid)
}

impl CorrectionGrid {
    /// Serializes the grid into the flat format.
    ///
    /// # Example
    ///
    /// ```
    /// # use osgb::grid::{decode_flat, CorrectionGrid};
    /// let grid = CorrectionGrid::from_parts(1, 1, vec![7], vec![9], 0, 0, Some(0))?;
    /// let bytes = grid.encode_flat();
    ///
    /// assert_eq!(&bytes[..4], b"OSTN");
    /// assert_eq!(bytes.len(), 24 + 4);
    /// assert_eq!(decode_flat(&bytes)?, grid);
    /// # Ok::<(), osgb::grid::DecodeGridError>(())
    /// ```
    pub fn encode_flat(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + 4 * self.east.len());

        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&(self.columns as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.rows as u32).to_le_bytes());
        bytes.extend_from_slice(&self.east_base.to_le_bytes());
        bytes.extend_from_slice(&self.north_base.to_le_bytes());
        bytes.extend_from_slice(
            &self
                .sentinel
                .map_or(NO_SENTINEL, i32::from)
                .to_le_bytes(),
        );

        for value in self.east.iter().chain(self.north.iter()) {
            bytes.extend_from_slice(&value.to_le_bytes());
        }

        bytes
    }
}

//
// Error
//

/// An error which can be returned on decoding a correction grid.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DecodeGridError {
    kind: DecodeGridErrorKind,
}

/// An error kind of [`DecodeGridError`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum DecodeGridErrorKind {
    /// The flat header is invalid
    BadHeader,
    /// The resource is shorter than the header declares
    Truncated { expected: usize, found: usize },
    /// The dimension `columns * rows` overflows
    Dimension { columns: usize, rows: usize },
    /// The number of values does not match the dimension
    Length { expected: usize, found: usize },
    /// A packed line is malformed, `lineno` is 1-based
    Row { lineno: usize },
    /// A packed line contains a non base-32 digit at the byte offset `column`
    Digit { lineno: usize, column: usize },
    /// A packed line overruns the width
    TooWide { lineno: usize },
    /// A packed resource has more lines than [`MAX_PACKED_ROWS`]
    TooTall { lineno: usize },
}

impl DecodeGridError {
    #[cold]
    const fn new_bad_header() -> Self {
        Self {
            kind: DecodeGridErrorKind::BadHeader,
        }
    }

    #[cold]
    const fn new_truncated(expected: usize, found: usize) -> Self {
        Self {
            kind: DecodeGridErrorKind::Truncated { expected, found },
        }
    }

    #[cold]
    pub(super) const fn new_dimension(columns: usize, rows: usize) -> Self {
        Self {
            kind: DecodeGridErrorKind::Dimension { columns, rows },
        }
    }

    #[cold]
    pub(super) const fn new_length(expected: usize, found: usize) -> Self {
        Self {
            kind: DecodeGridErrorKind::Length { expected, found },
        }
    }

    #[cold]
    const fn new_row(lineno: usize) -> Self {
        Self {
            kind: DecodeGridErrorKind::Row { lineno },
        }
    }

    #[cold]
    const fn new_digit(lineno: usize, column: usize) -> Self {
        Self {
            kind: DecodeGridErrorKind::Digit { lineno, column },
        }
    }

    #[cold]
    const fn new_too_wide(lineno: usize) -> Self {
        Self {
            kind: DecodeGridErrorKind::TooWide { lineno },
        }
    }

    #[cold]
    const fn new_too_tall(lineno: usize) -> Self {
        Self {
            kind: DecodeGridErrorKind::TooTall { lineno },
        }
    }

    /// Returns the detailed cause.
    pub const fn kind(&self) -> &DecodeGridErrorKind {
        &self.kind
    }
}

impl Error for DecodeGridError {}

impl Display for DecodeGridError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.kind {
            DecodeGridErrorKind::BadHeader => write!(f, "decode error: invalid header"),
            DecodeGridErrorKind::Truncated { expected, found } => write!(
                f,
                "decode error: truncated, expected {expected} bytes, found {found}"
            ),
            DecodeGridErrorKind::Dimension { columns, rows } => write!(
                f,
                "decode error: dimension overflows, {columns} columns by {rows} rows"
            ),
            DecodeGridErrorKind::Length { expected, found } => write!(
                f,
                "decode error: length mismatch, expected {expected}, found {found}"
            ),
            DecodeGridErrorKind::Row { lineno } => write!(f, "decode error: row at l{lineno}"),
            DecodeGridErrorKind::Digit { lineno, column } => {
                write!(f, "decode error: digit at l{lineno}:{column}")
            }
            DecodeGridErrorKind::TooWide { lineno } => {
                write!(f, "decode error: row too wide at l{lineno}")
            }
            DecodeGridErrorKind::TooTall { lineno } => {
                write!(f, "decode error: too many rows at l{lineno}")
            }
        }
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;
    use crate::point::{GridPoint, Shift};

    /// Encodes `value` into 3 base-32 digits.
    fn packed(value: u16) -> String {
        [value >> 10, (value >> 5) & 31, value & 31]
            .into_iter()
            .map(|digit| (b'0' + digit as u8) as char)
            .collect()
    }

    mod test_flat {
        use super::*;

        fn sample() -> CorrectionGrid {
            CorrectionGrid::from_parts(
                3,
                2,
                vec![0, 1, 2, 3, 4, u16::MAX],
                vec![10, 11, 12, 13, 14, 15],
                95000,
                -72000,
                Some(u16::MAX),
            )
            .unwrap()
        }

        #[test]
        fn test_encode() {
            let bytes = sample().encode_flat();

            assert_eq!(bytes.len(), 24 + 2 * 2 * 6);
            assert_eq!(&bytes[..4], b"OSTN");
            assert_eq!(&bytes[4..8], &[3, 0, 0, 0]);
            assert_eq!(&bytes[8..12], &[2, 0, 0, 0]);
            assert_eq!(&bytes[12..16], &95000i32.to_le_bytes());
            assert_eq!(&bytes[16..20], &(-72000i32).to_le_bytes());
            assert_eq!(&bytes[20..24], &65535i32.to_le_bytes());
            // the first east and the first north value
            assert_eq!(&bytes[24..26], &[0, 0]);
            assert_eq!(&bytes[36..38], &[10, 0]);
        }

        #[test]
        fn test_decode() {
            let grid = decode(&sample().encode_flat()).unwrap();

            assert_eq!(grid, sample());
            assert_eq!(grid.node(1, 1), Some(Shift::new(95.004, -71.986)));
            assert_eq!(grid.node(2, 1), None);
        }

        #[test]
        fn test_no_sentinel() {
            let grid = CorrectionGrid::from_parts(1, 1, vec![0], vec![0], 0, 0, None).unwrap();
            let bytes = grid.encode_flat();

            assert_eq!(&bytes[20..24], &(-1i32).to_le_bytes());
            assert_eq!(decode_flat(&bytes).unwrap().sentinel(), None);
        }

        #[test]
        fn test_bad_header() {
            let mut bytes = sample().encode_flat();
            bytes[0] = b'X';
            assert_eq!(
                decode_flat(&bytes).unwrap_err().kind(),
                &DecodeGridErrorKind::BadHeader
            );

            let mut bytes = sample().encode_flat();
            bytes[20..24].copy_from_slice(&70000i32.to_le_bytes());
            assert_eq!(
                decode_flat(&bytes).unwrap_err().kind(),
                &DecodeGridErrorKind::BadHeader
            );
        }

        #[test]
        fn test_truncated() {
            let bytes = sample().encode_flat();

            assert_eq!(
                decode(&bytes[..10]).unwrap_err().kind(),
                &DecodeGridErrorKind::Truncated {
                    expected: 24,
                    found: 10
                }
            );
            assert_eq!(
                decode(&bytes[..47]).unwrap_err().kind(),
                &DecodeGridErrorKind::Truncated {
                    expected: 48,
                    found: 47
                }
            );
        }

        #[test]
        fn test_trailing() {
            let mut bytes = sample().encode_flat();
            bytes.push(0);

            let err = decode(&bytes).unwrap_err();
            assert_eq!(
                err.kind(),
                &DecodeGridErrorKind::Length {
                    expected: 48,
                    found: 49
                }
            );
            assert_eq!(
                err.to_string(),
                "decode error: length mismatch, expected 48, found 49"
            );
        }
    }

    mod test_packed {
        use super::*;

        #[test]
        fn test_triple() {
            assert_eq!(packed(1234), "16B");
            assert_eq!(triple(b"16B"), Some(1234));
            assert_eq!(triple(b"000"), Some(0));
            assert_eq!(triple(b"OOO"), Some(32767));
            assert_eq!(triple(b"0P0"), None);
            assert_eq!(triple(b"/00"), None);
        }

        #[test]
        fn test_decode() {
            let text = format!(
                "000{}{}{}{}\r\n699{}{}{}{}\n",
                packed(100),
                packed(200),
                packed(300),
                packed(0),
                packed(16000),
                packed(24000),
                packed(16001),
                packed(24001),
            );
            let grid = decode(text.as_bytes()).unwrap();

            assert_eq!(grid.columns(), 701);
            assert_eq!(grid.rows(), 2);
            assert_eq!(grid.sentinel(), Some(0));

            assert_eq!(grid.node(0, 0), Some(Shift::new(86.1, -81.8)));
            // decoded north 0 is the sentinel
            assert_eq!(grid.node(1, 0), None);
            // unpopulated
            assert_eq!(grid.node(2, 0), None);
            assert_eq!(grid.node(698, 1), None);
            assert_eq!(grid.node(699, 1), Some(Shift::new(102.0, -58.0)));
            assert_eq!(grid.node(700, 1), Some(Shift::new(102.001, -57.999)));
        }

        #[test]
        fn test_coverage() {
            // two full rows of constant shift
            let cell = format!("{}{}", packed(10000), packed(20000));
            let line = format!("000{}\n", cell.repeat(701));
            let grid = decode_packed(line.repeat(2).as_bytes()).unwrap();

            assert_eq!(
                grid.shift_at(&GridPoint::new(699500.0, 500.0)),
                Some(Shift::new(96.0, -62.0))
            );
            assert_eq!(grid.shift_at(&GridPoint::new(700000.0, 500.0)), None);
            assert_eq!(grid.shift_at(&GridPoint::new(500.0, 1000.0)), None);
        }

        #[test]
        fn test_empty() {
            let grid = decode_packed(b"").unwrap();
            assert_eq!(grid.rows(), 0);
            assert!(grid.is_empty());
        }

        #[rstest]
        #[case(&b"00"[..], DecodeGridErrorKind::Row { lineno: 1 })]
        #[case(&b"0a0"[..], DecodeGridErrorKind::Row { lineno: 1 })]
        #[case(&b"000\n00000000"[..], DecodeGridErrorKind::Row { lineno: 2 })]
        #[case(&b"700000000000000"[..], DecodeGridErrorKind::TooWide { lineno: 1 })]
        #[case(&b"000000000\n000000z00"[..], DecodeGridErrorKind::Digit { lineno: 2, column: 6 })]
        fn test_error(#[case] bytes: &[u8], #[case] expected: DecodeGridErrorKind) {
            assert_eq!(decode(bytes).unwrap_err().kind(), &expected);
        }

        #[test]
        fn test_max_rows() {
            let text = "000\n".repeat(MAX_PACKED_ROWS);
            assert_eq!(decode_packed(text.as_bytes()).unwrap().rows(), 1251);

            let text = "000\n".repeat(MAX_PACKED_ROWS + 1);
            let err = decode_packed(text.as_bytes()).unwrap_err();
            assert_eq!(err.kind(), &DecodeGridErrorKind::TooTall { lineno: 1252 });
            assert_eq!(err.to_string(), "decode error: too many rows at l1252");
        }

        #[test]
        fn test_display() {
            let err = decode(b"000000000\n000000z00").unwrap_err();
            assert_eq!(err.to_string(), "decode error: digit at l2:6");
        }
    }
}
