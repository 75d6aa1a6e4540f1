//! Byte-order aware, bounds-checked reading and writing primitives.
//!
//! Everything in a module image is little-endian, so this module only deals in
//! little-endian conversions. It provides safe primitives for decoding and encoding
//! fixed-width integers from byte buffers, with bounds checking on every access to
//! prevent buffer overruns while parsing untrusted image data.
//!
//! # Architecture
//!
//! The module is built around the [`crate::file::io::ImageIO`] trait which provides a
//! unified interface for reading and writing binary data in a type-safe manner:
//!
//! - Generic trait-based reading and writing for the fixed-width integer types the
//!   image format uses
//! - Automatic bounds checking on every access
//! - Consistent error handling through the [`crate::Result`] type
//!
//! # Key Components
//!
//! - [`crate::file::io::ImageIO`] - Trait defining the byte conversions per type
//! - [`crate::file::io::read_le`] - Read a value from the start of a buffer
//! - [`crate::file::io::read_le_at`] - Read at an offset, advancing the offset
//! - [`crate::file::io::write_le`] - Write a value to the start of a buffer
//! - [`crate::file::io::write_le_at`] - Write at an offset, advancing the offset
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use dotsplice::file::io::{read_le_at, write_le_at};
//!
//! let mut data = [0u8; 6];
//! let mut offset = 0;
//!
//! write_le_at(&mut data, &mut offset, 1u16)?;  // offset: 0 -> 2
//! write_le_at(&mut data, &mut offset, 2u32)?;  // offset: 2 -> 6
//!
//! offset = 0;
//! let first: u16 = read_le_at(&data, &mut offset)?;
//! let second: u32 = read_le_at(&data, &mut offset)?;
//! assert_eq!((first, second), (1, 2));
//! # Ok::<(), dotsplice::Error>(())
//! ```
//!
//! # Error Handling
//!
//! All functions return [`crate::Result<T>`] and fail with [`crate::Error::OutOfBounds`]
//! if there are insufficient bytes in the buffer to complete the operation.

use crate::{Error::OutOfBounds, Result};

/// Trait for implementing type-specific safe binary data access.
///
/// This trait provides a unified interface for reading and writing the primitive
/// integer types that appear in module images. Each implementation defines a
/// `Bytes` associated type representing the fixed-size byte array for that type
/// (e.g. `[u8; 4]` for `u32`), and converts between it and the typed value in
/// little-endian order.
pub trait ImageIO: Sized {
    /// Associated type representing the byte array type for this numeric type.
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]> + AsRef<[u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Write T to a byte buffer in little-endian
    fn to_le_bytes(self) -> Self::Bytes;
}

// Implement ImageIO support for u32
impl ImageIO for u32 {
    type Bytes = [u8; 4];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        u32::from_le_bytes(bytes)
    }

    fn to_le_bytes(self) -> Self::Bytes {
        u32::to_le_bytes(self)
    }
}

// Implement ImageIO support for i32
impl ImageIO for i32 {
    type Bytes = [u8; 4];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        i32::from_le_bytes(bytes)
    }

    fn to_le_bytes(self) -> Self::Bytes {
        i32::to_le_bytes(self)
    }
}

// Implement ImageIO support for u16
impl ImageIO for u16 {
    type Bytes = [u8; 2];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        u16::from_le_bytes(bytes)
    }

    fn to_le_bytes(self) -> Self::Bytes {
        u16::to_le_bytes(self)
    }
}

// Implement ImageIO support for i16
impl ImageIO for i16 {
    type Bytes = [u8; 2];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        i16::from_le_bytes(bytes)
    }

    fn to_le_bytes(self) -> Self::Bytes {
        i16::to_le_bytes(self)
    }
}

// Implement ImageIO support for u8
impl ImageIO for u8 {
    type Bytes = [u8; 1];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        u8::from_le_bytes(bytes)
    }

    fn to_le_bytes(self) -> Self::Bytes {
        u8::to_le_bytes(self)
    }
}

// Implement ImageIO support for i8
impl ImageIO for i8 {
    type Bytes = [u8; 1];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        i8::from_le_bytes(bytes)
    }

    fn to_le_bytes(self) -> Self::Bytes {
        i8::to_le_bytes(self)
    }
}

/// Safely reads a value of type `T` in little-endian byte order from a data buffer.
///
/// This function reads from the beginning of the buffer and supports all types that
/// implement the [`crate::file::io::ImageIO`] trait.
///
/// # Arguments
///
/// * `data` - The byte buffer to read from
///
/// # Returns
///
/// Returns the decoded value or [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le<T: ImageIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at a specific offset.
///
/// This function reads from the specified offset and automatically advances the offset
/// by the number of bytes read.
///
/// # Arguments
///
/// * `data` - The byte buffer to read from
/// * `offset` - Mutable reference to the offset position (will be advanced after reading)
///
/// # Returns
///
/// Returns the decoded value or [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn read_le_at<T: ImageIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    if (type_len + *offset) > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..*offset + type_len].try_into() else {
        return Err(OutOfBounds);
    };

    *offset += type_len;

    Ok(T::from_le_bytes(read))
}

/// Safely writes a value of type `T` in little-endian byte order to a data buffer.
///
/// This function writes to the beginning of the buffer and supports all types that
/// implement the [`crate::file::io::ImageIO`] trait.
///
/// # Arguments
///
/// * `data` - The mutable byte buffer to write to
/// * `value` - The value to write
///
/// # Returns
///
/// Returns `Ok(())` on success or [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn write_le<T: ImageIO>(data: &mut [u8], value: T) -> Result<()> {
    let mut offset = 0_usize;
    write_le_at(data, &mut offset, value)
}

/// Safely writes a value of type `T` in little-endian byte order at a specific offset.
///
/// This function writes at the specified offset and automatically advances the offset
/// by the number of bytes written.
///
/// # Arguments
///
/// * `data` - The mutable byte buffer to write to
/// * `offset` - Mutable reference to the offset position (will be advanced after writing)
/// * `value` - The value to write
///
/// # Returns
///
/// Returns `Ok(())` on success or [`crate::Error::OutOfBounds`] if there are insufficient bytes.
pub fn write_le_at<T: ImageIO>(data: &mut [u8], offset: &mut usize, value: T) -> Result<()> {
    let type_len = std::mem::size_of::<T>();
    if (type_len + *offset) > data.len() {
        return Err(OutOfBounds);
    }

    let bytes = value.to_le_bytes();
    data[*offset..*offset + type_len].copy_from_slice(bytes.as_ref());
    *offset += type_len;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_BUFFER: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn read_le_u8() {
        let result = read_le::<u8>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x01);
    }

    #[test]
    fn read_le_i8() {
        let result = read_le::<i8>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x01);
    }

    #[test]
    fn read_le_u16() {
        let result = read_le::<u16>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0201);
    }

    #[test]
    fn read_le_i16() {
        let result = read_le::<i16>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0201);
    }

    #[test]
    fn read_le_u32() {
        let result = read_le::<u32>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0403_0201);
    }

    #[test]
    fn read_le_i32() {
        let result = read_le::<i32>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0403_0201);
    }

    #[test]
    fn read_le_from() {
        let mut offset = 2_usize;
        let result = read_le_at::<u16>(&TEST_BUFFER, &mut offset).unwrap();
        assert_eq!(result, 0x403);
        assert_eq!(offset, 4);
    }

    #[test]
    fn read_errors() {
        let buffer = [0xFF, 0xFF];

        let result = read_le::<u32>(&buffer);
        assert!(matches!(result, Err(OutOfBounds)));

        let mut offset = 1_usize;
        let result = read_le_at::<u16>(&buffer, &mut offset);
        assert!(matches!(result, Err(OutOfBounds)));
    }

    #[test]
    fn write_le_u16() {
        let mut buffer = [0u8; 2];
        write_le(&mut buffer, 0x1234u16).unwrap();
        assert_eq!(buffer, [0x34, 0x12]); // Little-endian
    }

    #[test]
    fn write_le_u32() {
        let mut buffer = [0u8; 4];
        write_le(&mut buffer, 0x12345678u32).unwrap();
        assert_eq!(buffer, [0x78, 0x56, 0x34, 0x12]); // Little-endian
    }

    #[test]
    fn write_le_i32() {
        let mut buffer = [0u8; 4];
        write_le(&mut buffer, -1i32).unwrap();
        assert_eq!(buffer, [0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn write_le_at_sequential() {
        let mut buffer = [0u8; 8];
        let mut offset = 0;

        write_le_at(&mut buffer, &mut offset, 0x1234u16).unwrap();
        assert_eq!(offset, 2);

        write_le_at(&mut buffer, &mut offset, 0x5678u16).unwrap();
        assert_eq!(offset, 4);

        write_le_at(&mut buffer, &mut offset, 0xABCDu32).unwrap();
        assert_eq!(offset, 8);

        assert_eq!(buffer, [0x34, 0x12, 0x78, 0x56, 0xCD, 0xAB, 0x00, 0x00]);
    }

    #[test]
    fn write_errors() {
        let mut buffer = [0u8; 2];

        // Try to write u32 (4 bytes) into 2-byte buffer
        let result = write_le(&mut buffer, 0x12345678u32);
        assert!(matches!(result, Err(OutOfBounds)));
    }

    #[test]
    fn round_trip_consistency() {
        const VALUE_U32: u32 = 0x12345678;
        const VALUE_I32: i32 = -12345;

        let mut buffer = [0u8; 4];
        write_le(&mut buffer, VALUE_U32).unwrap();
        let read_value: u32 = read_le(&buffer).unwrap();
        assert_eq!(read_value, VALUE_U32);

        write_le(&mut buffer, VALUE_I32).unwrap();
        let read_value: i32 = read_le(&buffer).unwrap();
        assert_eq!(read_value, VALUE_I32);
    }
}
