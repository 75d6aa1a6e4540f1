//! Binary format writer for module images.
//!
//! Encodes a [`Module`] back into image bytes. Strings are interned into a
//! deduplicated heap in a first pass over the model, then the sections are
//! emitted in the same order the reader consumes them. Method bodies are
//! written verbatim, so methods the patcher never touched round-trip
//! byte-for-byte.

use std::collections::HashMap;

use crate::file::io::ImageIO;
use crate::metadata::attributes::AttrArgument;
use crate::metadata::method::MethodDef;
use crate::metadata::module::Module;
use crate::metadata::types::TypeDef;
use crate::metadata::{IMAGE_MAGIC, IMAGE_VERSION};
use crate::Result;

/// Deduplicating strings heap builder.
///
/// The heap always begins with a zero byte so offset 0 is the empty string.
struct StringInterner {
    buffer: Vec<u8>,
    offsets: HashMap<String, u32>,
}

impl StringInterner {
    fn new() -> Self {
        StringInterner {
            buffer: vec![0],
            offsets: HashMap::new(),
        }
    }

    /// Adds a string to the heap if it is not already present and returns its
    /// byte offset.
    fn intern(&mut self, value: &str) -> Result<u32> {
        if value.is_empty() {
            return Ok(0);
        }
        if let Some(&offset) = self.offsets.get(value) {
            return Ok(offset);
        }

        let offset = as_u32(self.buffer.len(), "Strings heap offset")?;
        self.buffer.extend_from_slice(value.as_bytes());
        self.buffer.push(0);
        self.offsets.insert(value.to_string(), offset);
        Ok(offset)
    }
}

/// Append-only little-endian section writer.
struct ImageWriter {
    buffer: Vec<u8>,
}

impl ImageWriter {
    fn new() -> Self {
        ImageWriter { buffer: Vec::new() }
    }

    fn write_le<T: ImageIO>(&mut self, value: T) {
        self.buffer.extend_from_slice(value.to_le_bytes().as_ref());
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }
}

fn as_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| malformed_error!("{} {} does not fit in 32 bits", what, value))
}

/// Encodes a module into image bytes.
pub(crate) fn write_module(module: &Module) -> Result<Vec<u8>> {
    let mut strings = StringInterner::new();
    intern_strings(module, &mut strings)?;

    let mut writer = ImageWriter::new();
    writer.write_le(IMAGE_MAGIC);
    writer.write_le(IMAGE_VERSION);
    writer.write_le(0u16);
    writer.write_bytes(&module.mvid().to_bytes());
    writer.write_le(strings.intern(module.name())?);

    writer.write_le(as_u32(module.extern_refs().len(), "Extern ref count")?);
    for extern_ref in module.extern_refs() {
        writer.write_le(strings.intern(extern_ref)?);
    }

    writer.write_le(as_u32(strings.buffer.len(), "Strings heap length")?);
    writer.write_bytes(&strings.buffer);

    writer.write_le(as_u32(module.types().len(), "Type count")?);
    for type_def in module.types() {
        write_type(&mut writer, &mut strings, module, type_def)?;
    }

    writer.write_le(as_u32(module.method_refs().len(), "Method ref count")?);
    for method_ref in module.method_refs() {
        writer.write_le(strings.intern(&method_ref.owner)?);
        writer.write_le(strings.intern(&method_ref.name)?);
    }

    Ok(writer.buffer)
}

/// Walks the model in emit order so every string is in the heap before any
/// section referencing it is written.
fn intern_strings(module: &Module, strings: &mut StringInterner) -> Result<()> {
    strings.intern(module.name())?;
    for extern_ref in module.extern_refs() {
        strings.intern(extern_ref)?;
    }
    for type_def in module.types() {
        strings.intern(&type_def.namespace)?;
        strings.intern(&type_def.name)?;
        for method in &type_def.methods {
            strings.intern(&method.name)?;
            strings.intern(&method.return_type)?;
            for param in &method.params {
                strings.intern(&param.name)?;
                strings.intern(&param.type_name)?;
            }
            for attribute in &method.attributes {
                strings.intern(&attribute.attr_type)?;
                for arg in &attribute.args {
                    if let AttrArgument::Str(value) = arg {
                        strings.intern(value)?;
                    }
                }
            }
        }
    }
    for method_ref in module.method_refs() {
        strings.intern(&method_ref.owner)?;
        strings.intern(&method_ref.name)?;
    }
    Ok(())
}

fn write_type(
    writer: &mut ImageWriter,
    strings: &mut StringInterner,
    module: &Module,
    type_def: &TypeDef,
) -> Result<()> {
    writer.write_le(strings.intern(&type_def.namespace)?);
    writer.write_le(strings.intern(&type_def.name)?);
    writer.write_le(type_def.flags.bits());

    match type_def.enclosing {
        None => writer.write_le(0u32),
        Some(enclosing) => {
            if enclosing.0 >= module.types().len() {
                return Err(malformed_error!(
                    "Type '{}' references enclosing {} outside the arena of {} types",
                    type_def.name,
                    enclosing,
                    module.types().len()
                ));
            }
            writer.write_le(as_u32(enclosing.0 + 1, "Enclosing row")?);
        }
    }

    writer.write_le(as_u32(type_def.methods.len(), "Method count")?);
    for method in &type_def.methods {
        write_method(writer, strings, method)?;
    }
    Ok(())
}

fn write_method(
    writer: &mut ImageWriter,
    strings: &mut StringInterner,
    method: &MethodDef,
) -> Result<()> {
    writer.write_le(strings.intern(&method.name)?);
    writer.write_le(method.flags.bits());
    writer.write_le(strings.intern(&method.return_type)?);

    writer.write_le(as_u32(method.params.len(), "Param count")?);
    for param in &method.params {
        writer.write_le(strings.intern(&param.name)?);
        writer.write_le(strings.intern(&param.type_name)?);
        writer.write_le(param.flags.bits());
    }

    writer.write_le(as_u32(method.attributes.len(), "Attribute count")?);
    for attribute in &method.attributes {
        writer.write_le(strings.intern(&attribute.attr_type)?);
        writer.write_le(as_u32(attribute.args.len(), "Attribute argument count")?);
        for arg in &attribute.args {
            writer.write_le(arg.tag());
            match arg {
                AttrArgument::Bool(value) => writer.write_le(u8::from(*value)),
                AttrArgument::I4(value) => writer.write_le(*value),
                AttrArgument::Str(value) => writer.write_le(strings.intern(value)?),
            }
        }
    }

    writer.write_le(as_u32(method.body.len(), "Body length")?);
    writer.write_bytes(&method.body);
    Ok(())
}
