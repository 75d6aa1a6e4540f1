//! Binary format reader for module images.
//!
//! Decodes a raw image buffer into a [`Module`]. The layout is read in one
//! forward pass: header, extern-ref indices, strings heap, type rows with
//! their methods inline, then method-ref rows. String fields that precede the
//! heap are stashed as indices and resolved once the heap is available; all
//! later fields resolve eagerly, so the returned model carries owned strings
//! and no heap. Method bodies stay as raw byte blobs; only methods that
//! receive an injection are ever decoded into instructions.
//!
//! Structural validation happens here as well: enclosing-type links must stay
//! inside the arena and form no cycles, and fully-qualified type names must be
//! unique across the module.

use std::collections::HashSet;

use uguid::Guid;

use crate::file::parser::Parser;
use crate::metadata::attributes::{AttrArgument, CustomAttribute, ARGUMENT_TYPE};
use crate::metadata::method::{MethodAttributes, MethodDef, ParamAttributes, ParamDef};
use crate::metadata::module::{MethodRef, Module};
use crate::metadata::types::{TypeAttributes, TypeDef, TypeIndex};
use crate::metadata::{IMAGE_MAGIC, IMAGE_VERSION};
use crate::{Error, Result};

/// Borrowed view of the strings heap with offset-based access.
struct StringsHeap<'a> {
    data: &'a [u8],
}

impl<'a> StringsHeap<'a> {
    fn new(data: &'a [u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(malformed_error!("Strings heap cannot be empty"));
        }
        if data[0] != 0 {
            return Err(malformed_error!(
                "Strings heap must begin with a zero byte, found 0x{:02x}",
                data[0]
            ));
        }
        Ok(StringsHeap { data })
    }

    /// Resolves a byte offset to its null-terminated UTF-8 string.
    fn get(&self, offset: u32) -> Result<String> {
        let start = offset as usize;
        if start >= self.data.len() {
            return Err(malformed_error!(
                "String offset {} is outside the heap ({} bytes)",
                start,
                self.data.len()
            ));
        }

        let mut end = start;
        while end < self.data.len() && self.data[end] != 0 {
            end += 1;
        }

        String::from_utf8(self.data[start..end].to_vec()).map_err(|e| {
            malformed_error!(
                "Invalid UTF-8 string at heap offset {}: {}",
                start,
                e.utf8_error()
            )
        })
    }
}

/// Reads a count prefix and rejects values that cannot fit in the remaining
/// data, so corrupt counts fail fast instead of looping to the first
/// out-of-bounds read.
fn read_count(parser: &mut Parser<'_>, what: &str) -> Result<usize> {
    let count = parser.read_le::<u32>()? as usize;
    if count > parser.remaining() {
        return Err(malformed_error!(
            "{} count {} exceeds remaining image data ({} bytes)",
            what,
            count,
            parser.remaining()
        ));
    }
    Ok(count)
}

/// Decodes a module image from raw bytes.
pub(crate) fn read_module(data: &[u8]) -> Result<Module> {
    let mut parser = Parser::new(data);

    let magic = parser.read_le::<u32>()?;
    if magic != IMAGE_MAGIC {
        return Err(Error::NotSupported);
    }

    let version = parser.read_le::<u16>()?;
    if version != IMAGE_VERSION {
        return Err(Error::NotSupported);
    }

    let flags = parser.read_le::<u16>()?;
    if flags != 0 {
        return Err(malformed_error!(
            "Reserved header flags must be zero, found 0x{:04x}",
            flags
        ));
    }

    let mut mvid_bytes = [0u8; 16];
    mvid_bytes.copy_from_slice(parser.read_bytes(16)?);
    let mvid = Guid::from_bytes(mvid_bytes);

    // Name and extern refs precede the heap; resolve them after it is read.
    let name_index = parser.read_le::<u32>()?;
    let extern_count = read_count(&mut parser, "Extern ref")?;
    let mut extern_indices = Vec::with_capacity(extern_count);
    for _ in 0..extern_count {
        extern_indices.push(parser.read_le::<u32>()?);
    }

    let heap_length = parser.read_le::<u32>()? as usize;
    let heap = StringsHeap::new(parser.read_bytes(heap_length)?)?;

    let mut module = Module::new(heap.get(name_index)?, mvid);
    for index in extern_indices {
        module.add_extern_ref(heap.get(index)?);
    }

    let type_count = read_count(&mut parser, "Type")?;
    for row in 0..type_count {
        let type_def = read_type(&mut parser, &heap, row, type_count)?;
        module.push_type(type_def);
    }

    validate_nesting(&module)?;
    validate_unique_fullnames(&module)?;

    let ref_count = read_count(&mut parser, "Method ref")?;
    for _ in 0..ref_count {
        let owner = heap.get(parser.read_le::<u32>()?)?;
        let name = heap.get(parser.read_le::<u32>()?)?;
        module.push_method_ref(MethodRef { owner, name });
    }

    // The method-ref table is the last section; a well-formed image ends here.
    if parser.remaining() > 0 {
        return Err(malformed_error!(
            "Image has {} trailing bytes after the method-ref table",
            parser.remaining()
        ));
    }

    Ok(module)
}

fn read_type(
    parser: &mut Parser<'_>,
    heap: &StringsHeap<'_>,
    row: usize,
    type_count: usize,
) -> Result<TypeDef> {
    let namespace = heap.get(parser.read_le::<u32>()?)?;
    let name = heap.get(parser.read_le::<u32>()?)?;
    let flags = TypeAttributes::from_raw(parser.read_le::<u32>()?);

    let enclosing_row = parser.read_le::<u32>()? as usize;
    let enclosing = match enclosing_row {
        0 => None,
        row_ref if row_ref > type_count => {
            return Err(malformed_error!(
                "Type '{}' references enclosing row {} beyond type count {}",
                name,
                row_ref,
                type_count
            ));
        }
        row_ref if row_ref == row + 1 => {
            return Err(malformed_error!("Type '{}' encloses itself", name));
        }
        row_ref => Some(TypeIndex(row_ref - 1)),
    };

    let mut type_def = TypeDef::new(namespace, name, flags);
    type_def.enclosing = enclosing;

    let method_count = read_count(parser, "Method")?;
    for _ in 0..method_count {
        type_def.methods.push(read_method(parser, heap)?);
    }

    Ok(type_def)
}

fn read_method(parser: &mut Parser<'_>, heap: &StringsHeap<'_>) -> Result<MethodDef> {
    let name = heap.get(parser.read_le::<u32>()?)?;
    let flags = MethodAttributes::from_raw(parser.read_le::<u32>()?);
    let return_type = heap.get(parser.read_le::<u32>()?)?;

    let mut method = MethodDef::new(name, flags, return_type);

    let param_count = read_count(parser, "Param")?;
    for _ in 0..param_count {
        let name = heap.get(parser.read_le::<u32>()?)?;
        let type_name = heap.get(parser.read_le::<u32>()?)?;
        let flags = ParamAttributes::from_raw(parser.read_le::<u8>()?);
        method.params.push(ParamDef {
            name,
            type_name,
            flags,
        });
    }

    let attr_count = read_count(parser, "Attribute")?;
    for _ in 0..attr_count {
        method.attributes.push(read_attribute(parser, heap)?);
    }

    let body_length = parser.read_le::<u32>()? as usize;
    method.body = parser.read_bytes(body_length)?.to_vec();

    Ok(method)
}

fn read_attribute(parser: &mut Parser<'_>, heap: &StringsHeap<'_>) -> Result<CustomAttribute> {
    let attr_type = heap.get(parser.read_le::<u32>()?)?;

    let arg_count = read_count(parser, "Attribute argument")?;
    let mut args = Vec::with_capacity(arg_count);
    for _ in 0..arg_count {
        let tag = parser.read_le::<u8>()?;
        let arg = match tag {
            ARGUMENT_TYPE::BOOLEAN => match parser.read_le::<u8>()? {
                0 => AttrArgument::Bool(false),
                1 => AttrArgument::Bool(true),
                other => {
                    return Err(malformed_error!(
                        "Boolean attribute argument must be 0 or 1, found 0x{:02x}",
                        other
                    ));
                }
            },
            ARGUMENT_TYPE::I4 => AttrArgument::I4(parser.read_le::<i32>()?),
            ARGUMENT_TYPE::STRING => AttrArgument::Str(heap.get(parser.read_le::<u32>()?)?),
            other => {
                return Err(malformed_error!(
                    "Unknown attribute argument tag: 0x{:02x}",
                    other
                ));
            }
        };
        args.push(arg);
    }

    Ok(CustomAttribute { attr_type, args })
}

/// Rejects enclosing-type chains that loop back on themselves.
fn validate_nesting(module: &Module) -> Result<()> {
    let limit = module.types().len();
    for index in 0..limit {
        let mut current = TypeIndex(index);
        let mut steps = 0;
        while let Some(enclosing) = module[current].enclosing {
            steps += 1;
            if steps > limit {
                return Err(malformed_error!(
                    "Type nesting cycle detected at row {}",
                    index + 1
                ));
            }
            current = enclosing;
        }
    }
    Ok(())
}

/// Rejects modules where two types share a fully-qualified name.
fn validate_unique_fullnames(module: &Module) -> Result<()> {
    let mut seen = HashSet::new();
    for index in 0..module.types().len() {
        let fullname = module.type_fullname(TypeIndex(index));
        if !seen.insert(fullname.clone()) {
            return Err(malformed_error!(
                "Duplicate type name '{}' in module",
                fullname
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Byte-level image builder for handcrafting test inputs.
    struct RawImage {
        data: Vec<u8>,
    }

    impl RawImage {
        fn new() -> Self {
            RawImage { data: Vec::new() }
        }

        fn u8(mut self, value: u8) -> Self {
            self.data.push(value);
            self
        }

        fn u16(mut self, value: u16) -> Self {
            self.data.extend_from_slice(&value.to_le_bytes());
            self
        }

        fn u32(mut self, value: u32) -> Self {
            self.data.extend_from_slice(&value.to_le_bytes());
            self
        }

        fn i32(mut self, value: i32) -> Self {
            self.data.extend_from_slice(&value.to_le_bytes());
            self
        }

        fn bytes(mut self, value: &[u8]) -> Self {
            self.data.extend_from_slice(value);
            self
        }

        fn header(self, heap: &[u8], name_index: u32) -> Self {
            self.u32(IMAGE_MAGIC)
                .u16(IMAGE_VERSION)
                .u16(0)
                .bytes(&[0u8; 16])
                .u32(name_index)
                .u32(0) // no extern refs
                .u32(heap.len() as u32)
                .bytes(heap)
        }
    }

    #[test]
    fn test_minimal_module() {
        let heap = b"\0app\0";
        let image = RawImage::new()
            .header(heap, 1)
            .u32(0) // types
            .u32(0) // method refs
            .data;

        let module = read_module(&image).unwrap();
        assert_eq!(module.name(), "app");
        assert!(module.types().is_empty());
        assert!(module.method_refs().is_empty());
    }

    #[test]
    fn test_module_with_type_and_method() {
        // Heap offsets: 1="Game", 6="Player", 13="Damage", 20="System.Void",
        // 32="amount", 39="System.Int32"
        let heap = b"\0Game\0Player\0Damage\0System.Void\0amount\0System.Int32\0";
        let image = RawImage::new()
            .header(heap, 1)
            .u32(1) // one type
            .u32(1) // namespace = "Game"
            .u32(6) // name = "Player"
            .u32(0x0001) // public
            .u32(0) // top-level
            .u32(1) // one method
            .u32(13) // name = "Damage"
            .u32(0x0001) // public
            .u32(20) // returns System.Void
            .u32(1) // one param
            .u32(32) // param name = "amount"
            .u32(39) // param type = "System.Int32"
            .u8(0x00)
            .u32(0) // no attributes
            .u32(2) // body length
            .bytes(&[0x00, 0x2A]) // nop; ret
            .u32(0) // no method refs
            .data;

        let module = read_module(&image).unwrap();
        assert_eq!(module.types().len(), 1);

        let player = &module.types()[0];
        assert_eq!(player.namespace, "Game");
        assert_eq!(player.name, "Player");
        assert!(player.is_public());

        let damage = &player.methods[0];
        assert_eq!(damage.name, "Damage");
        assert_eq!(damage.return_type, "System.Void");
        assert_eq!(damage.params[0].name, "amount");
        assert_eq!(damage.params[0].type_name, "System.Int32");
        assert_eq!(damage.body, vec![0x00, 0x2A]);
    }

    #[test]
    fn test_attribute_arguments() {
        // Heap offsets: 1="T", 3="Run", 7="Hooks.MarkAttribute", 27="x"
        let heap = b"\0T\0Run\0Hooks.MarkAttribute\0x\0";
        let image = RawImage::new()
            .header(heap, 1)
            .u32(1)
            .u32(0) // empty namespace
            .u32(1) // "T"
            .u32(0x0001)
            .u32(0)
            .u32(1) // one method
            .u32(3) // "Run"
            .u32(0x0003)
            .u32(0) // empty return type slot resolves to ""
            .u32(0) // no params
            .u32(1) // one attribute
            .u32(7) // "Hooks.MarkAttribute"
            .u32(3) // three args
            .u8(ARGUMENT_TYPE::STRING)
            .u32(27) // "x"
            .u8(ARGUMENT_TYPE::BOOLEAN)
            .u8(1)
            .u8(ARGUMENT_TYPE::I4)
            .i32(-7)
            .u32(0) // empty body
            .u32(0) // no method refs
            .data;

        let module = read_module(&image).unwrap();
        let attr = &module.types()[0].methods[0].attributes[0];
        assert_eq!(attr.attr_type, "Hooks.MarkAttribute");
        assert_eq!(attr.args[0].as_str(), Some("x"));
        assert_eq!(attr.args[1].as_bool(), Some(true));
        assert_eq!(attr.args[2].as_i4(), Some(-7));
    }

    #[test]
    fn test_bad_magic_not_supported() {
        let image = RawImage::new()
            .u32(0xDEAD_BEEF)
            .u16(IMAGE_VERSION)
            .u16(0)
            .bytes(&[0u8; 16])
            .data;
        assert!(matches!(read_module(&image), Err(Error::NotSupported)));
    }

    #[test]
    fn test_future_version_not_supported() {
        let image = RawImage::new()
            .u32(IMAGE_MAGIC)
            .u16(IMAGE_VERSION + 1)
            .u16(0)
            .data;
        assert!(matches!(read_module(&image), Err(Error::NotSupported)));
    }

    #[test]
    fn test_truncated_image() {
        let heap = b"\0app\0";
        let mut image = RawImage::new().header(heap, 1).u32(1).data;
        // Type row is cut off mid-way
        image.truncate(image.len() - 1);
        assert!(matches!(
            read_module(&image),
            Err(Error::OutOfBounds) | Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let heap = b"\0app\0";
        let image = RawImage::new()
            .header(heap, 1)
            .u32(0) // types
            .u32(0) // method refs
            .u8(0xCC) // garbage past the last table
            .data;
        assert!(matches!(read_module(&image), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_corrupt_count_rejected() {
        let heap = b"\0app\0";
        let image = RawImage::new()
            .header(heap, 1)
            .u32(0xFFFF_FFFF) // type count larger than the image
            .data;
        assert!(matches!(read_module(&image), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_heap_must_start_with_zero() {
        let heap = b"app\0";
        let image = RawImage::new().header(heap, 0).data;
        assert!(matches!(read_module(&image), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_string_offset_outside_heap() {
        let heap = b"\0app\0";
        let image = RawImage::new().header(heap, 99).data;
        assert!(matches!(read_module(&image), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_self_enclosing_type_rejected() {
        let heap = b"\0T\0";
        let image = RawImage::new()
            .header(heap, 1)
            .u32(1)
            .u32(0)
            .u32(1) // "T"
            .u32(0x0001)
            .u32(1) // encloses itself (row 1)
            .u32(0)
            .u32(0)
            .data;
        assert!(matches!(read_module(&image), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_nesting_cycle_rejected() {
        // Two types enclosing each other
        let heap = b"\0A\0B\0";
        let image = RawImage::new()
            .header(heap, 1)
            .u32(2)
            .u32(0)
            .u32(1) // "A"
            .u32(0x0001)
            .u32(2) // enclosed by B
            .u32(0)
            .u32(0)
            .u32(3) // "B"
            .u32(0x0001)
            .u32(1) // enclosed by A
            .u32(0)
            .u32(0)
            .data;
        assert!(matches!(read_module(&image), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_duplicate_fullname_rejected() {
        let heap = b"\0Game\0Player\0";
        let image = RawImage::new()
            .header(heap, 1)
            .u32(2)
            .u32(1) // "Game"
            .u32(6) // "Player"
            .u32(0x0001)
            .u32(0)
            .u32(0)
            .u32(1) // "Game"
            .u32(6) // "Player"
            .u32(0x0001)
            .u32(0)
            .u32(0)
            .u32(0)
            .data;
        assert!(matches!(read_module(&image), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_unknown_attribute_tag_rejected() {
        let heap = b"\0T\0Run\0X\0";
        let image = RawImage::new()
            .header(heap, 1)
            .u32(1)
            .u32(0)
            .u32(1) // "T"
            .u32(0x0001)
            .u32(0)
            .u32(1) // one method
            .u32(3) // "Run"
            .u32(0x0001)
            .u32(0)
            .u32(0) // no params
            .u32(1) // one attribute
            .u32(7) // "X"
            .u32(1) // one arg
            .u8(0x55) // bogus tag
            .data;
        assert!(matches!(read_module(&image), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_nonzero_reserved_flags_rejected() {
        let image = RawImage::new()
            .u32(IMAGE_MAGIC)
            .u16(IMAGE_VERSION)
            .u16(0x0001)
            .bytes(&[0u8; 16])
            .data;
        assert!(matches!(read_module(&image), Err(Error::Malformed { .. })));
    }
}
