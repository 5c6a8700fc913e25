//! Class file parsing.

use super::ir::{AttributeInfo, ClassFile, ConstantPool, CpInfo, MemberInfo};
use super::ClassFileError;

/// Cursor-based class file reader.
///
/// ```rust,ignore
/// let class = Reader::new(&bytes).parse()?;
/// let index = class.class_index("Lcom/example/Probe;")?;
/// ```
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Parses the whole class file. The input must contain exactly one class
    /// file image; trailing bytes are an error, since the writer could not
    /// reproduce them.
    pub fn parse(mut self) -> Result<ClassFile, ClassFileError> {
        let magic = self.read_u4()?;
        if magic != 0xCAFE_BABE {
            return Err(ClassFileError::InvalidMagic(magic));
        }

        let minor_version = self.read_u2()?;
        let major_version = self.read_u2()?;

        let constant_pool = self.parse_constant_pool()?;

        let access_flags = self.read_u2()?;
        let this_class = self.read_u2()?;
        let super_class = self.read_u2()?;

        let interfaces_count = self.read_u2()?;
        let mut interfaces = Vec::with_capacity(interfaces_count as usize);
        for _ in 0..interfaces_count {
            interfaces.push(self.read_u2()?);
        }

        let fields = self.parse_members()?;
        let methods = self.parse_members()?;
        let attributes = self.parse_attributes()?;

        if self.remaining() != 0 {
            return Err(ClassFileError::TrailingBytes(self.remaining()));
        }

        Ok(ClassFile {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    fn parse_constant_pool(&mut self) -> Result<ConstantPool, ClassFileError> {
        let count = self.read_u2()? as usize;
        let mut entries: Vec<Option<CpInfo>> = Vec::with_capacity(count);
        entries.push(None); // index 0 is unused

        let mut i = 1;
        while i < count {
            let tag = self.read_u1()?;
            let entry = match tag {
                1 => {
                    let len = self.read_u2()? as usize;
                    CpInfo::Utf8(self.read_bytes(len)?.to_vec())
                }
                3 => CpInfo::Integer(self.read_u4()? as i32),
                4 => CpInfo::Float(self.read_u4()?),
                5 => {
                    let high = self.read_u4()? as u64;
                    let low = self.read_u4()? as u64;
                    entries.push(Some(CpInfo::Long(((high << 32) | low) as i64)));
                    entries.push(None); // second slot of an 8-byte constant
                    i += 2;
                    continue;
                }
                6 => {
                    let high = self.read_u4()? as u64;
                    let low = self.read_u4()? as u64;
                    entries.push(Some(CpInfo::Double((high << 32) | low)));
                    entries.push(None);
                    i += 2;
                    continue;
                }
                7 => CpInfo::Class { name_index: self.read_u2()? },
                8 => CpInfo::String { string_index: self.read_u2()? },
                9 => CpInfo::Fieldref {
                    class_index: self.read_u2()?,
                    name_and_type_index: self.read_u2()?,
                },
                10 => CpInfo::Methodref {
                    class_index: self.read_u2()?,
                    name_and_type_index: self.read_u2()?,
                },
                11 => CpInfo::InterfaceMethodref {
                    class_index: self.read_u2()?,
                    name_and_type_index: self.read_u2()?,
                },
                12 => CpInfo::NameAndType {
                    name_index: self.read_u2()?,
                    descriptor_index: self.read_u2()?,
                },
                15 => CpInfo::MethodHandle {
                    reference_kind: self.read_u1()?,
                    reference_index: self.read_u2()?,
                },
                16 => CpInfo::MethodType { descriptor_index: self.read_u2()? },
                17 => CpInfo::Dynamic {
                    bootstrap_method_attr_index: self.read_u2()?,
                    name_and_type_index: self.read_u2()?,
                },
                18 => CpInfo::InvokeDynamic {
                    bootstrap_method_attr_index: self.read_u2()?,
                    name_and_type_index: self.read_u2()?,
                },
                19 => CpInfo::Module { name_index: self.read_u2()? },
                20 => CpInfo::Package { name_index: self.read_u2()? },
                _ => return Err(ClassFileError::InvalidConstantPoolTag(tag)),
            };

            entries.push(Some(entry));
            i += 1;
        }

        Ok(ConstantPool { entries })
    }

    fn parse_members(&mut self) -> Result<Vec<MemberInfo>, ClassFileError> {
        let count = self.read_u2()?;
        let mut members = Vec::with_capacity(count as usize);
        for _ in 0..count {
            members.push(MemberInfo {
                access_flags: self.read_u2()?,
                name_index: self.read_u2()?,
                descriptor_index: self.read_u2()?,
                attributes: self.parse_attributes()?,
            });
        }
        Ok(members)
    }

    fn parse_attributes(&mut self) -> Result<Vec<AttributeInfo>, ClassFileError> {
        let count = self.read_u2()?;
        let mut attrs = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let name_index = self.read_u2()?;
            let length = self.read_u4()? as usize;
            let info = self.read_bytes(length)?.to_vec();
            attrs.push(AttributeInfo { name_index, info });
        }
        Ok(attrs)
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn read_u1(&mut self) -> Result<u8, ClassFileError> {
        if self.remaining() < 1 {
            return Err(ClassFileError::UnexpectedEof);
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    fn read_u2(&mut self) -> Result<u16, ClassFileError> {
        if self.remaining() < 2 {
            return Err(ClassFileError::UnexpectedEof);
        }
        let v = u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(v)
    }

    fn read_u4(&mut self) -> Result<u32, ClassFileError> {
        if self.remaining() < 4 {
            return Err(ClassFileError::UnexpectedEof);
        }
        let v = u32::from_be_bytes([
            self.data[self.pos],
            self.data[self.pos + 1],
            self.data[self.pos + 2],
            self.data[self.pos + 3],
        ]);
        self.pos += 4;
        Ok(v)
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ClassFileError> {
        if self.remaining() < len {
            return Err(ClassFileError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }
}
