//! Intermediate representation of a parsed class file.

use super::ClassFileError;

/// A parsed class file.
///
/// Every index is a raw constant-pool index exactly as it appeared on disk;
/// nothing is renumbered, so the writer can reproduce the input image.
#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<AttributeInfo>,
}

/// A field or method; the two share their on-disk layout.
#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

/// An attribute header plus its undecoded payload.
#[derive(Debug, Clone)]
pub struct AttributeInfo {
    pub name_index: u16,
    pub info: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ConstantPool {
    // Index 0 is unused; Long/Double entries occupy two slots, the second
    // of which is None.
    pub(super) entries: Vec<Option<CpInfo>>,
}

impl ConstantPool {
    /// The constant_pool_count value: one more than the highest valid index.
    pub fn count(&self) -> u16 {
        self.entries.len() as u16
    }

    pub fn get(&self, index: u16) -> Result<&CpInfo, ClassFileError> {
        if index == 0 {
            return Err(ClassFileError::InvalidConstantPoolIndex(index));
        }
        self.entries
            .get(index as usize)
            .and_then(|e| e.as_ref())
            .ok_or(ClassFileError::InvalidConstantPoolIndex(index))
    }

    /// The raw modified-UTF-8 payload of a `Utf8` entry.
    pub fn get_utf8(&self, index: u16) -> Result<&[u8], ClassFileError> {
        match self.get(index)? {
            CpInfo::Utf8(bytes) => Ok(bytes),
            _ => Err(ClassFileError::InvalidConstantPoolIndex(index)),
        }
    }
}

/// One constant pool entry.
///
/// `Utf8` keeps raw modified UTF-8 (it is not always valid Rust UTF-8) and
/// `Float`/`Double` keep raw bit patterns (re-encoding via `f32`/`f64` can
/// canonicalize NaN payloads).
#[derive(Debug, Clone, PartialEq)]
pub enum CpInfo {
    Utf8(Vec<u8>),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class { name_index: u16 },
    String { string_index: u16 },
    Fieldref { class_index: u16, name_and_type_index: u16 },
    Methodref { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodref { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

impl ClassFile {
    /// Internal binary name of the class this file defines
    /// (e.g. `java/lang/String`).
    pub fn class_name(&self) -> Result<&[u8], ClassFileError> {
        match self.constant_pool.get(self.this_class)? {
            CpInfo::Class { name_index } => self.constant_pool.get_utf8(*name_index),
            _ => Err(ClassFileError::InvalidConstantPoolIndex(self.this_class)),
        }
    }

    /// Resolves a type descriptor (`Ljava/lang/String;`) against this file.
    ///
    /// A class file defines exactly one class, so this validates rather than
    /// searches: the descriptor must name the file's own class. Returns the
    /// `this_class` constant-pool index.
    pub fn class_index(&self, descriptor: &str) -> Result<u16, ClassFileError> {
        let inner = descriptor
            .strip_prefix('L')
            .and_then(|d| d.strip_suffix(';'))
            .ok_or_else(|| ClassFileError::ClassNotFound(descriptor.to_string()))?;

        if self.class_name()? == inner.as_bytes() {
            Ok(self.this_class)
        } else {
            Err(ClassFileError::ClassNotFound(descriptor.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_class_pool() -> ConstantPool {
        ConstantPool {
            entries: vec![
                None,
                Some(CpInfo::Utf8(b"com/example/Probe".to_vec())),
                Some(CpInfo::Class { name_index: 1 }),
            ],
        }
    }

    #[test]
    fn index_zero_is_invalid() {
        let pool = single_class_pool();
        assert_eq!(
            pool.get(0),
            Err(ClassFileError::InvalidConstantPoolIndex(0))
        );
    }

    #[test]
    fn count_includes_the_unused_slot() {
        assert_eq!(single_class_pool().count(), 3);
    }

    #[test]
    fn utf8_lookup_rejects_non_utf8_entries() {
        let pool = single_class_pool();
        assert!(pool.get_utf8(2).is_err());
        assert_eq!(pool.get_utf8(1).unwrap(), b"com/example/Probe");
    }
}
