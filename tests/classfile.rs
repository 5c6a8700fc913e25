use interference_agent::classfile::{ClassFileError, CpInfo, Reader, Writer};

struct CpBuilder {
    entries: Vec<Vec<u8>>,
}

impl CpBuilder {
    fn new() -> Self {
        Self { entries: Vec::new() }
    }

    fn push(&mut self, entry: Vec<u8>) -> u16 {
        self.entries.push(entry);
        self.entries.len() as u16
    }

    fn utf8(&mut self, s: &str) -> u16 {
        self.utf8_raw(s.as_bytes())
    }

    fn utf8_raw(&mut self, bytes: &[u8]) -> u16 {
        let mut entry = Vec::new();
        entry.push(1);
        entry.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        entry.extend_from_slice(bytes);
        self.push(entry)
    }

    fn integer(&mut self, value: i32) -> u16 {
        let mut entry = Vec::new();
        entry.push(3);
        entry.extend_from_slice(&value.to_be_bytes());
        self.push(entry)
    }

    fn float_bits(&mut self, bits: u32) -> u16 {
        let mut entry = Vec::new();
        entry.push(4);
        entry.extend_from_slice(&bits.to_be_bytes());
        self.push(entry)
    }

    fn long(&mut self, value: i64) -> u16 {
        let mut entry = Vec::new();
        entry.push(5);
        entry.extend_from_slice(&value.to_be_bytes());
        let index = self.push(entry);
        self.push(Vec::new()); // shadow slot, emits nothing
        index
    }

    fn double_bits(&mut self, bits: u64) -> u16 {
        let mut entry = Vec::new();
        entry.push(6);
        entry.extend_from_slice(&bits.to_be_bytes());
        let index = self.push(entry);
        self.push(Vec::new());
        index
    }

    fn class(&mut self, name_index: u16) -> u16 {
        let mut entry = Vec::new();
        entry.push(7);
        entry.extend_from_slice(&name_index.to_be_bytes());
        self.push(entry)
    }

    fn name_and_type(&mut self, name_index: u16, descriptor_index: u16) -> u16 {
        let mut entry = Vec::new();
        entry.push(12);
        entry.extend_from_slice(&name_index.to_be_bytes());
        entry.extend_from_slice(&descriptor_index.to_be_bytes());
        self.push(entry)
    }

    fn methodref(&mut self, class_index: u16, name_and_type_index: u16) -> u16 {
        let mut entry = Vec::new();
        entry.push(10);
        entry.extend_from_slice(&class_index.to_be_bytes());
        entry.extend_from_slice(&name_and_type_index.to_be_bytes());
        self.push(entry)
    }
}

fn u1(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

fn u2(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn u4(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn push_attr(out: &mut Vec<u8>, name_index: u16, info: &[u8]) {
    u2(out, name_index);
    u4(out, info.len() as u32);
    out.extend_from_slice(info);
}

struct ProbeIndices {
    utf_probe: u16,
    shadow: u16,
    float_nan: u16,
    modified_utf8: u16,
}

/// Assembles a class roughly like what javac emits for
/// `class Probe { int value = 123; Probe() {} }`, with extra constants
/// chosen to stress the codec: an 8-byte long, NaN float/double bit
/// patterns, and a modified-UTF-8 string holding an encoded NUL.
fn build_probe_class() -> (Vec<u8>, ProbeIndices) {
    let mut cp = CpBuilder::new();

    let utf_probe = cp.utf8("com/example/Probe");
    let utf_object = cp.utf8("java/lang/Object");
    let class_probe = cp.class(utf_probe);
    let class_object = cp.class(utf_object);

    let utf_init = cp.utf8("<init>");
    let utf_void_sig = cp.utf8("()V");
    let nat_init = cp.name_and_type(utf_init, utf_void_sig);
    let _mref = cp.methodref(class_object, nat_init);

    let utf_value = cp.utf8("value");
    let utf_int = cp.utf8("I");
    let const_int = cp.integer(123);

    let utf_code = cp.utf8("Code");
    let utf_lnt = cp.utf8("LineNumberTable");
    let utf_constant_value = cp.utf8("ConstantValue");
    let utf_source_file = cp.utf8("SourceFile");
    let utf_source_name = cp.utf8("Probe.java");
    let utf_deprecated = cp.utf8("Deprecated");
    let utf_unknown = cp.utf8("SomeToolAttribute");

    let long_const = cp.long(0x1122_3344_5566_7788);
    let shadow = long_const + 1;
    let _double_nan = cp.double_bits(0x7FF8_0000_0000_0001);
    let float_nan = cp.float_bits(0x7FC0_0001);
    // Modified UTF-8 encodes NUL as 0xC0 0x80, which standard UTF-8 rejects.
    let modified_utf8 = cp.utf8_raw(&[0xC0, 0x80]);

    let cp_count = (cp.entries.len() + 1) as u16;

    let mut bytes = Vec::new();
    u4(&mut bytes, 0xCAFE_BABE);
    u2(&mut bytes, 0); // minor
    u2(&mut bytes, 55); // major (Java 11)
    u2(&mut bytes, cp_count);
    for entry in cp.entries {
        bytes.extend_from_slice(&entry);
    }

    u2(&mut bytes, 0x0021); // ACC_PUBLIC | ACC_SUPER
    u2(&mut bytes, class_probe);
    u2(&mut bytes, class_object);

    u2(&mut bytes, 0); // interfaces

    // one field: int value, with a ConstantValue attribute
    u2(&mut bytes, 1);
    u2(&mut bytes, 0x0002); // ACC_PRIVATE
    u2(&mut bytes, utf_value);
    u2(&mut bytes, utf_int);
    u2(&mut bytes, 1);
    let mut cv_info = Vec::new();
    u2(&mut cv_info, const_int);
    push_attr(&mut bytes, utf_constant_value, &cv_info);

    // one method: <init>()V with a Code attribute
    u2(&mut bytes, 1);
    u2(&mut bytes, 0x0001); // ACC_PUBLIC
    u2(&mut bytes, utf_init);
    u2(&mut bytes, utf_void_sig);

    let mut code_info = Vec::new();
    u2(&mut code_info, 1); // max_stack
    u2(&mut code_info, 1); // max_locals
    u4(&mut code_info, 1); // code_length
    u1(&mut code_info, 0xB1); // return
    u2(&mut code_info, 0); // exception table

    let mut code_sub_attrs = Vec::new();
    let mut lnt_info = Vec::new();
    u2(&mut lnt_info, 1);
    u2(&mut lnt_info, 0);
    u2(&mut lnt_info, 1);
    push_attr(&mut code_sub_attrs, utf_lnt, &lnt_info);
    u2(&mut code_info, 1);
    code_info.extend_from_slice(&code_sub_attrs);

    let mut method_attrs = Vec::new();
    push_attr(&mut method_attrs, utf_code, &code_info);
    u2(&mut bytes, 1);
    bytes.extend_from_slice(&method_attrs);

    // class attributes: SourceFile, Deprecated, and one unknown attribute
    let mut class_attrs = Vec::new();
    let mut sf_info = Vec::new();
    u2(&mut sf_info, utf_source_name);
    push_attr(&mut class_attrs, utf_source_file, &sf_info);
    push_attr(&mut class_attrs, utf_deprecated, &[]);
    push_attr(&mut class_attrs, utf_unknown, b"opaque payload");
    u2(&mut bytes, 3);
    bytes.extend_from_slice(&class_attrs);

    (
        bytes,
        ProbeIndices { utf_probe, shadow, float_nan, modified_utf8 },
    )
}

#[test]
fn parses_structure() {
    let (bytes, idx) = build_probe_class();
    let class = Reader::new(&bytes).parse().expect("parse probe class");

    assert_eq!(class.major_version, 55);
    assert_eq!(class.access_flags, 0x0021);
    assert_eq!(class.interfaces.len(), 0);
    assert_eq!(class.fields.len(), 1);
    assert_eq!(class.methods.len(), 1);
    assert_eq!(class.attributes.len(), 3);
    assert_eq!(class.fields[0].attributes.len(), 1);
    assert_eq!(class.methods[0].attributes.len(), 1);

    assert_eq!(class.class_name().unwrap(), b"com/example/Probe");
    assert_eq!(
        class.constant_pool.get_utf8(idx.utf_probe).unwrap(),
        b"com/example/Probe"
    );
}

#[test]
fn round_trip_is_byte_identical() {
    let (bytes, _) = build_probe_class();
    let class = Reader::new(&bytes).parse().expect("parse probe class");
    assert_eq!(Writer::new(&class).to_bytes(), bytes);
}

#[test]
fn eight_byte_constants_occupy_two_slots() {
    let (bytes, idx) = build_probe_class();
    let class = Reader::new(&bytes).parse().unwrap();

    assert_eq!(
        class.constant_pool.get(idx.shadow - 1).unwrap(),
        &CpInfo::Long(0x1122_3344_5566_7788)
    );
    assert_eq!(
        class.constant_pool.get(idx.shadow),
        Err(ClassFileError::InvalidConstantPoolIndex(idx.shadow))
    );
}

#[test]
fn nan_bit_patterns_are_preserved() {
    let (bytes, idx) = build_probe_class();
    let class = Reader::new(&bytes).parse().unwrap();

    assert_eq!(
        class.constant_pool.get(idx.float_nan).unwrap(),
        &CpInfo::Float(0x7FC0_0001)
    );
}

#[test]
fn modified_utf8_survives() {
    let (bytes, idx) = build_probe_class();
    let class = Reader::new(&bytes).parse().unwrap();

    assert_eq!(
        class.constant_pool.get_utf8(idx.modified_utf8).unwrap(),
        &[0xC0, 0x80]
    );
}

#[test]
fn class_index_matches_own_descriptor() {
    let (bytes, _) = build_probe_class();
    let class = Reader::new(&bytes).parse().unwrap();

    let index = class.class_index("Lcom/example/Probe;").unwrap();
    assert_eq!(index, class.this_class);
}

#[test]
fn class_index_rejects_foreign_descriptor() {
    let (bytes, _) = build_probe_class();
    let class = Reader::new(&bytes).parse().unwrap();

    assert_eq!(
        class.class_index("Lcom/example/Other;"),
        Err(ClassFileError::ClassNotFound("Lcom/example/Other;".to_string()))
    );
}

#[test]
fn class_index_rejects_malformed_descriptor() {
    let (bytes, _) = build_probe_class();
    let class = Reader::new(&bytes).parse().unwrap();

    // An internal name is not a descriptor.
    assert!(class.class_index("com/example/Probe").is_err());
}

#[test]
fn truncated_input_fails_cleanly() {
    let (bytes, _) = build_probe_class();
    for len in [0, 3, 9, bytes.len() / 2, bytes.len() - 1] {
        match Reader::new(&bytes[..len]).parse() {
            Err(ClassFileError::UnexpectedEof) => {}
            other => panic!("truncation at {len} gave {other:?}"),
        }
    }
}

#[test]
fn bad_magic_fails() {
    let (mut bytes, _) = build_probe_class();
    bytes[0] = 0xDE;
    assert!(matches!(
        Reader::new(&bytes).parse(),
        Err(ClassFileError::InvalidMagic(_))
    ));
}

#[test]
fn unknown_constant_tag_fails() {
    let mut bytes = Vec::new();
    u4(&mut bytes, 0xCAFE_BABE);
    u2(&mut bytes, 0);
    u2(&mut bytes, 52);
    u2(&mut bytes, 2); // one constant
    u1(&mut bytes, 2); // tag 2 was never assigned

    assert_eq!(
        Reader::new(&bytes).parse().unwrap_err(),
        ClassFileError::InvalidConstantPoolTag(2)
    );
}

#[test]
fn trailing_bytes_fail() {
    let (mut bytes, _) = build_probe_class();
    bytes.push(0);
    assert_eq!(
        Reader::new(&bytes).parse().unwrap_err(),
        ClassFileError::TrailingBytes(1)
    );
}
