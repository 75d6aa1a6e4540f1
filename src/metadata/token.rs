use std::fmt;
use std::hash::{Hash, Hasher};

/// Table tag for type definition rows.
pub const TABLE_TYPE_DEF: u8 = 0x02;
/// Table tag for method definition rows.
pub const TABLE_METHOD_DEF: u8 = 0x06;
/// Table tag for imported method reference rows.
pub const TABLE_METHOD_REF: u8 = 0x0A;

/// A metadata token representing a reference to a metadata table entry.
///
/// Tokens in a module image consist of a 32-bit value where:
/// - The high byte (bits 24-31) indicates the table type
/// - The low 24 bits (bits 0-23) indicate the 1-based row index within that table
///
/// Call instruction operands are tokens: a splice into a target method calls
/// through a [`TABLE_METHOD_REF`] token produced by importing the hook method,
/// while calls within a module use [`TABLE_METHOD_DEF`] tokens.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token(pub u32);

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a type definition token for the given 1-based row
    #[must_use]
    pub fn type_def(row: u32) -> Self {
        Token((u32::from(TABLE_TYPE_DEF) << 24) | (row & 0x00FF_FFFF))
    }

    /// Creates a method definition token for the given 1-based row
    #[must_use]
    pub fn method_def(row: u32) -> Self {
        Token((u32::from(TABLE_METHOD_DEF) << 24) | (row & 0x00FF_FFFF))
    }

    /// Creates a method reference token for the given 1-based row
    #[must_use]
    pub fn method_ref(row: u32) -> Self {
        Token((u32::from(TABLE_METHOD_REF) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if this token references the method definition table
    #[must_use]
    pub fn is_method_def(&self) -> bool {
        self.table() == TABLE_METHOD_DEF
    }

    /// Returns true if this token references the method reference table
    #[must_use]
    pub fn is_method_ref(&self) -> bool {
        self.table() == TABLE_METHOD_REF
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}
