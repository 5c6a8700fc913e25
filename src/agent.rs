//! The retransformation interference probe.
//!
//! One `ClassFileLoadHook` that pulls every intercepted class through the
//! class-file codec and hands back an equivalent image, plus two JNI entry
//! points the host test calls to trigger retransformation and to switch the
//! hook off. The agent exists so a test can check that an unrelated
//! transforming agent does not disturb other agents' instrumentation.

use std::ffi::{c_void, CStr};
use std::os::raw::c_char;
use std::sync::OnceLock;

use crate::classfile::{Allocator, ClassFileError, Image, Reader, Writer};
use crate::env::{GlobalRef, JniEnv, Jvmti};
use crate::sys::jni::{self, jclass, jint, jobject, jobjectArray, JavaVM, JNIEnv};
use crate::sys::jvmti::{self, jvmtiEnv, jvmtiEventCallbacks};

const TAG: &str = "[interference-agent]";

/// The JVMTI environment pointer obtained at attach time.
///
/// JVMTI environments are valid on every thread, so sharing the pointer
/// process-wide is sound.
struct JvmtiHandle(*mut jvmtiEnv);

unsafe impl Send for JvmtiHandle {}
unsafe impl Sync for JvmtiHandle {}

struct AgentState {
    jvmti: JvmtiHandle,
    /// Internal-form name of the only class to transform, or `None` to
    /// round-trip everything that loads while the hook is enabled.
    filter: Option<String>,
}

static STATE: OnceLock<AgentState> = OnceLock::new();

impl AgentState {
    fn env(&self) -> Jvmti {
        unsafe { Jvmti::from_raw(self.jvmti.0) }
    }
}

/// Shared body of `Agent_OnLoad` and `Agent_OnAttach`.
///
/// Capability negotiation and hook installation, each step returning the
/// host's status code unchanged on failure.
fn attach(vm: *mut JavaVM, options: *mut c_char) -> jint {
    if STATE.get().is_some() {
        eprintln!("{TAG} already attached, refusing second environment");
        return jni::JNI_ERR;
    }

    let options = if options.is_null() {
        ""
    } else {
        unsafe { CStr::from_ptr(options) }.to_str().unwrap_or("")
    };

    let jvmti_env = match Jvmti::new(vm) {
        Ok(env) => env,
        Err(code) => {
            eprintln!("{TAG} GetEnv failed: {code}");
            return code;
        }
    };

    if let Err(e) = jvmti_env.add_capabilities_with(|caps| {
        caps.set_can_retransform_classes(true);
    }) {
        eprintln!("{TAG} AddCapabilities failed: {}", jvmti_env.error_name(e));
        return e.code();
    }

    let callbacks = jvmtiEventCallbacks {
        ClassFileLoadHook: Some(transform),
        ..Default::default()
    };
    if let Err(e) = jvmti_env.set_event_callbacks(callbacks) {
        eprintln!("{TAG} SetEventCallbacks failed: {}", jvmti_env.error_name(e));
        return e.code();
    }

    if let Err(e) =
        jvmti_env.set_event_notification_mode(true, jvmti::JVMTI_EVENT_CLASS_FILE_LOAD_HOOK)
    {
        eprintln!("{TAG} enabling ClassFileLoadHook failed: {}", jvmti_env.error_name(e));
        return e.code();
    }

    let state = AgentState {
        jvmti: JvmtiHandle(jvmti_env.raw()),
        filter: parse_options(options),
    };
    if STATE.set(state).is_err() {
        return jni::JNI_ERR;
    }

    jni::JNI_OK
}

/// Parses the agent options string (`class=<binary name>`); unknown keys
/// are ignored.
fn parse_options(options: &str) -> Option<String> {
    options
        .split(',')
        .filter_map(|opt| opt.split_once('='))
        .find(|(key, _)| key.trim() == "class")
        .map(|(_, value)| to_internal_form(value.trim()))
}

/// `java.lang.String` or `java/lang/String` -> `java/lang/String`.
fn to_internal_form(name: &str) -> String {
    name.replace('.', "/")
}

/// `java.lang.String` or `java/lang/String` -> `Ljava/lang/String;`.
fn to_descriptor(name: &str) -> String {
    let mut descriptor = String::with_capacity(name.len() + 2);
    descriptor.push('L');
    descriptor.push_str(&to_internal_form(name));
    descriptor.push(';');
    descriptor
}

/// Allocator backed by JVMTI `Allocate`; the memory published through
/// `new_class_data` becomes owned by the VM.
struct JvmtiAllocator<'a> {
    env: &'a Jvmti,
}

impl Allocator for JvmtiAllocator<'_> {
    fn allocate(&self, size: usize) -> *mut u8 {
        self.env
            .allocate(size as jni::jlong)
            .unwrap_or(std::ptr::null_mut())
    }
}

/// Parse, validate the class identity, and re-emit into VM-owned memory.
fn reencode(jvmti_env: &Jvmti, name: &str, data: &[u8]) -> Result<Image, ClassFileError> {
    let class = Reader::new(data).parse()?;
    class.class_index(&to_descriptor(name))?;

    let allocator = JvmtiAllocator { env: jvmti_env };
    Writer::new(&class).create_image(&allocator)
}

/// The `ClassFileLoadHook` callback.
///
/// Round-trips the class bytes through the IR and publishes the re-encoded
/// image. The callback ABI has no status channel: on any failure the
/// out-parameters stay untouched and the class loads unmodified.
unsafe extern "system" fn transform(
    jvmti_env: *mut jvmtiEnv,
    _jni_env: *mut JNIEnv,
    _class_being_redefined: jclass,
    _loader: jobject,
    name: *const c_char,
    _protection_domain: jobject,
    class_data_len: jint,
    class_data: *const u8,
    new_class_data_len: *mut jint,
    new_class_data: *mut *mut u8,
) {
    let Some(state) = STATE.get() else { return };
    if name.is_null() || class_data.is_null() || class_data_len < 0 {
        return;
    }

    let Ok(name) = CStr::from_ptr(name).to_str() else { return };
    if let Some(filter) = &state.filter {
        if to_internal_form(name) != *filter {
            return;
        }
    }

    let data = std::slice::from_raw_parts(class_data, class_data_len as usize);
    match reencode(&Jvmti::from_raw(jvmti_env), name, data) {
        Ok(image) => {
            *new_class_data = image.data;
            *new_class_data_len = image.len as jint;
        }
        Err(e) => {
            eprintln!("{TAG} leaving {name} untouched: {e}");
        }
    }
}

// --- Exported host entry points ---

#[no_mangle]
pub unsafe extern "system" fn Agent_OnLoad(
    vm: *mut JavaVM,
    options: *mut c_char,
    _reserved: *mut c_void,
) -> jint {
    attach(vm, options)
}

#[no_mangle]
pub unsafe extern "system" fn Agent_OnAttach(
    vm: *mut JavaVM,
    options: *mut c_char,
    _reserved: *mut c_void,
) -> jint {
    attach(vm, options)
}

/// `int nativeRetransformClasses(Class<?>[] classes)` on
/// `com.agenttest.interference.InterferenceTest`.
///
/// Pins each class with a global reference across the `RetransformClasses`
/// call and returns the JVMTI status code.
#[no_mangle]
pub unsafe extern "system" fn Java_com_agenttest_interference_InterferenceTest_nativeRetransformClasses(
    env: *mut JNIEnv,
    _this: jobject,
    classes: jobjectArray,
) -> jint {
    let Some(state) = STATE.get() else {
        eprintln!("{TAG} retransform requested before attach");
        return jni::JNI_ERR;
    };

    let jni_env = unsafe { JniEnv::from_raw(env) };
    let count = jni_env.get_array_length(classes);

    let mut pinned: Vec<GlobalRef> = Vec::with_capacity(count as usize);
    for i in 0..count {
        let local = jni_env.get_object_array_element(classes, i);
        pinned.push(unsafe { GlobalRef::new(&jni_env, local) });
    }
    let class_refs: Vec<jclass> = pinned.iter().map(GlobalRef::get).collect();

    let jvmti_env = state.env();
    match jvmti_env.retransform_classes(&class_refs) {
        Ok(()) => jvmti::jvmtiError::NONE.code(),
        Err(e) => {
            eprintln!("{TAG} RetransformClasses failed: {}", jvmti_env.error_name(e));
            e.code()
        }
    }
}

/// `int disableRetransformHook()` on
/// `com.agenttest.interference.InterferenceTest`.
///
/// Turns the hook off so later class loads skip the round-trip.
#[no_mangle]
pub unsafe extern "system" fn Java_com_agenttest_interference_InterferenceTest_disableRetransformHook(
    _env: *mut JNIEnv,
    _class: jclass,
) -> jint {
    let Some(state) = STATE.get() else {
        return jni::JNI_ERR;
    };

    match state
        .env()
        .set_event_notification_mode(false, jvmti::JVMTI_EVENT_CLASS_FILE_LOAD_HOOK)
    {
        Ok(()) => jvmti::jvmtiError::NONE.code(),
        Err(e) => e.code(),
    }
}
