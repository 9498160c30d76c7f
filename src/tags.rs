//! Tag bytes of the cork wire format.
//!
//! Every encoded value starts with a single tag byte. The low half of the
//! byte space holds self-contained "fixed" tags that embed a small value or
//! length; the `0xE0..=0xFF` range holds markers that are followed by a
//! big-endian length or payload of a known width.
//!
//! Tags are stable and part of the wire format. Most users never need these
//! directly.

///< Small non-negative integer, value = tag
pub const FIX_INT: u8 = 0x00;
pub const FIX_INT_MAX: u8 = 0x7F;
///< Short string, length = tag - FIX_STR
pub const FIX_STR: u8 = 0x80;
pub const FIX_STR_MAX: u8 = 0x9F;
///< Short binary, length = tag - FIX_BIN
pub const FIX_BIN: u8 = 0xA0;
pub const FIX_BIN_MAX: u8 = 0xAF;
///< Short extension, payload length = tag - FIX_EXT
pub const FIX_EXT: u8 = 0xB0;
pub const FIX_EXT_MAX: u8 = 0xBF;
///< Short array, count = tag - FIX_ARR
pub const FIX_ARR: u8 = 0xC0;
pub const FIX_ARR_MAX: u8 = 0xCF;
///< Short map, count = tag - FIX_MAP
pub const FIX_MAP: u8 = 0xD0;
pub const FIX_MAP_MAX: u8 = 0xDF;

pub const NIL: u8 = 0xE0;
pub const TRUE: u8 = 0xE1;
pub const FALSE: u8 = 0xE2;
///< i64 nanoseconds since the Unix epoch
pub const TIME: u8 = 0xE3;

pub const STR8: u8 = 0xE4;
pub const STR16: u8 = 0xE5;
pub const STR32: u8 = 0xE6;
pub const STR64: u8 = 0xE7;

pub const BIN8: u8 = 0xE8;
pub const BIN16: u8 = 0xE9;
pub const BIN32: u8 = 0xEA;
pub const BIN64: u8 = 0xEB;

///< Length counts the payload only, the extension tag byte follows the length
pub const EXT8: u8 = 0xEC;
pub const EXT16: u8 = 0xED;
pub const EXT32: u8 = 0xEE;
pub const EXT64: u8 = 0xEF;

pub const INT8: u8 = 0xF0;
pub const INT16: u8 = 0xF1;
pub const INT32: u8 = 0xF2;
pub const INT64: u8 = 0xF3;

pub const UINT8: u8 = 0xF4;
pub const UINT16: u8 = 0xF5;
pub const UINT32: u8 = 0xF6;
pub const UINT64: u8 = 0xF7;

pub const FLOAT32: u8 = 0xF8;
pub const FLOAT64: u8 = 0xF9;
pub const COMPLEX64: u8 = 0xFA;
pub const COMPLEX128: u8 = 0xFB;

///< Array with more than 15 elements, count follows as a tagged unsigned integer
pub const ARR: u8 = 0xFC;
///< Map with more than 15 pairs, count follows as a tagged unsigned integer
pub const MAP: u8 = 0xFD;
///< Stream-protocol extension: extension tag byte, then self-framed content
pub const SYMBOL: u8 = 0xFE;
///< Reserved, never valid in a stream
pub const ALT: u8 = 0xFF;

/// Broad classification of a tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Nil,
    Bool,
    Int,
    Uint,
    Float,
    Complex,
    Time,
    Str,
    Bin,
    Ext,
    Symbol,
    Arr,
    Map,
    Reserved,
}

impl Kind {
    /// Human readable name, used in `TypeMismatch` messages.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Nil => "nil",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::Complex => "complex",
            Kind::Time => "time",
            Kind::Str => "string",
            Kind::Bin => "binary",
            Kind::Ext => "extension",
            Kind::Symbol => "symbol",
            Kind::Arr => "array",
            Kind::Map => "map",
            Kind::Reserved => "reserved",
        }
    }
}

/// Classifies a tag byte. Fixed-range integers classify as [`Kind::Int`].
pub fn kind_of(tag: u8) -> Kind {
    match tag {
        FIX_INT..=FIX_INT_MAX => Kind::Int,
        FIX_STR..=FIX_STR_MAX => Kind::Str,
        FIX_BIN..=FIX_BIN_MAX => Kind::Bin,
        FIX_EXT..=FIX_EXT_MAX => Kind::Ext,
        FIX_ARR..=FIX_ARR_MAX => Kind::Arr,
        FIX_MAP..=FIX_MAP_MAX => Kind::Map,
        NIL => Kind::Nil,
        TRUE | FALSE => Kind::Bool,
        TIME => Kind::Time,
        STR8..=STR64 => Kind::Str,
        BIN8..=BIN64 => Kind::Bin,
        EXT8..=EXT64 => Kind::Ext,
        INT8..=INT64 => Kind::Int,
        UINT8..=UINT64 => Kind::Uint,
        FLOAT32 | FLOAT64 => Kind::Float,
        COMPLEX64 | COMPLEX128 => Kind::Complex,
        ARR => Kind::Arr,
        MAP => Kind::Map,
        SYMBOL => Kind::Symbol,
        ALT => Kind::Reserved,
    }
}

/// Returns true when the tag itself carries the value or length.
#[inline]
pub fn is_fixed(tag: u8) -> bool {
    tag <= FIX_MAP_MAX
}

/// The value or length embedded in a fixed tag.
#[inline]
pub fn fixed_size(tag: u8) -> Option<usize> {
    let base = match tag {
        FIX_INT..=FIX_INT_MAX => FIX_INT,
        FIX_STR..=FIX_STR_MAX => FIX_STR,
        FIX_BIN..=FIX_BIN_MAX => FIX_BIN,
        FIX_EXT..=FIX_EXT_MAX => FIX_EXT,
        FIX_ARR..=FIX_ARR_MAX => FIX_ARR,
        FIX_MAP..=FIX_MAP_MAX => FIX_MAP,
        _ => return None,
    };
    Some((tag - base) as usize)
}

/// Width in bytes of the field that follows a marker.
///
/// For strings, binaries and extensions this is the width of the length
/// prefix; for numbers and timestamps it is the width of the payload.
pub fn marker_width(tag: u8) -> Option<usize> {
    match tag {
        STR8..=INT64 | UINT8..=UINT64 => Some(1 << (tag & 0x03)),
        TIME | FLOAT64 | COMPLEX64 => Some(8),
        FLOAT32 => Some(4),
        COMPLEX128 => Some(16),
        _ => None,
    }
}

#[inline]
pub fn is_nil(tag: u8) -> bool {
    tag == NIL
}

#[inline]
pub fn is_bool(tag: u8) -> bool {
    tag == TRUE || tag == FALSE
}

#[inline]
pub fn is_int(tag: u8) -> bool {
    tag <= FIX_INT_MAX || (INT8..=INT64).contains(&tag)
}

#[inline]
pub fn is_uint(tag: u8) -> bool {
    (UINT8..=UINT64).contains(&tag)
}

#[inline]
pub fn is_str(tag: u8) -> bool {
    kind_of(tag) == Kind::Str
}

#[inline]
pub fn is_bin(tag: u8) -> bool {
    kind_of(tag) == Kind::Bin
}

#[inline]
pub fn is_ext(tag: u8) -> bool {
    kind_of(tag) == Kind::Ext
}

#[inline]
pub fn is_arr(tag: u8) -> bool {
    kind_of(tag) == Kind::Arr
}

#[inline]
pub fn is_map(tag: u8) -> bool {
    kind_of(tag) == Kind::Map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_every_byte() {
        for b in 0..=255u8 {
            let kind = kind_of(b);
            assert_eq!(kind == Kind::Reserved, b == ALT, "byte 0x{b:02X}");
        }
        assert_eq!(kind_of(0x00), Kind::Int);
        assert_eq!(kind_of(0x7F), Kind::Int);
        assert_eq!(kind_of(0x80), Kind::Str);
        assert_eq!(kind_of(0xE7), Kind::Str);
        assert_eq!(kind_of(0xB3), Kind::Ext);
        assert_eq!(kind_of(0xEF), Kind::Ext);
        assert_eq!(kind_of(0xF6), Kind::Uint);
        assert_eq!(kind_of(0xFB), Kind::Complex);
        assert_eq!(kind_of(0xFE), Kind::Symbol);
    }

    #[test]
    fn fixed_sizes() {
        assert_eq!(fixed_size(0x05), Some(5));
        assert_eq!(fixed_size(0x9F), Some(31));
        assert_eq!(fixed_size(0xAF), Some(15));
        assert_eq!(fixed_size(0xC3), Some(3));
        assert_eq!(fixed_size(0xD0), Some(0));
        assert_eq!(fixed_size(NIL), None);
        assert!(is_fixed(FIX_MAP_MAX));
        assert!(!is_fixed(NIL));
    }

    #[test]
    fn marker_widths() {
        assert_eq!(marker_width(STR8), Some(1));
        assert_eq!(marker_width(BIN16), Some(2));
        assert_eq!(marker_width(EXT32), Some(4));
        assert_eq!(marker_width(INT64), Some(8));
        assert_eq!(marker_width(UINT16), Some(2));
        assert_eq!(marker_width(FLOAT32), Some(4));
        assert_eq!(marker_width(COMPLEX128), Some(16));
        assert_eq!(marker_width(TIME), Some(8));
        assert_eq!(marker_width(ARR), None);
        assert_eq!(marker_width(0x10), None);
    }
}
