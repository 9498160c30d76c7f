//! Encoding and decoding options.

/// Element type used when materializing arrays and maps into a [`crate::Value`].
///
/// `Any` keeps whatever the stream holds. Any other variant coerces each
/// element into the widest value of that kind and rejects elements of a
/// different kind with [`crate::CorkError::TypeMismatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementType {
    #[default]
    Any,
    Bool,
    Int,
    Uint,
    Float,
    Complex,
    Time,
    String,
    Binary,
}

/// Key and value element types for dynamically decoded maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapType {
    pub key: ElementType,
    pub value: ElementType,
}

impl MapType {
    pub fn new(key: ElementType, value: ElementType) -> Self {
        Self { key, value }
    }
}

/// What to do with a value that has no wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unsupported {
    /// Write nil in its place.
    #[default]
    Nil,
    /// Fail the whole encode call.
    Error,
}

/// Options shared by a [`crate::Writer`] or [`crate::Reader`] for one call.
///
/// # Example
/// ```rust
/// use cork::{encode_with, Handle};
///
/// let handle = Handle::new().with_precision(true);
/// let bytes = encode_with(&5i32, &handle).unwrap();
/// assert_eq!(&bytes[..], &[0xF2, 0, 0, 0, 5]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle {
    /// Element type for arrays decoded into a `Value`.
    pub array_type: ElementType,
    /// Key and value types for maps decoded into a `Value`.
    pub map_type: MapType,
    /// Encode integers at their declared width instead of the smallest form.
    pub precision: bool,
    /// Encode maps and sets in ascending byte order of their encoded keys.
    pub sort_map_keys: bool,
    pub unsupported: Unsupported,
    /// Deepest array, map or struct nesting a decode accepts.
    pub max_depth: usize,
}

/// Default limit for [`Handle::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

impl Default for Handle {
    fn default() -> Self {
        Self {
            array_type: ElementType::default(),
            map_type: MapType::default(),
            precision: false,
            sort_map_keys: false,
            unsupported: Unsupported::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Handle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precision(mut self, precision: bool) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_sorted_keys(mut self, sort: bool) -> Self {
        self.sort_map_keys = sort;
        self
    }

    pub fn with_array_type(mut self, element: ElementType) -> Self {
        self.array_type = element;
        self
    }

    pub fn with_map_type(mut self, key: ElementType, value: ElementType) -> Self {
        self.map_type = MapType::new(key, value);
        self
    }

    pub fn with_unsupported(mut self, policy: Unsupported) -> Self {
        self.unsupported = policy;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}
