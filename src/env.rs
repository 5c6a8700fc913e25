//! Safe wrappers around the JVMTI and JNI environment pointers.
//!
//! Raw vtable access stays inside this module; everything above it works
//! with `Result` returns. The wrappers cover exactly the operations the
//! agent performs, nothing more.

use std::ptr;

use crate::sys::jni;
use crate::sys::jvmti;

fn check(err: jvmti::jvmtiError) -> Result<(), jvmti::jvmtiError> {
    if err == jvmti::jvmtiError::NONE {
        Ok(())
    } else {
        Err(err)
    }
}

/// Safe wrapper around the JVMTI environment pointer.
///
/// JVMTI environments, unlike JNI environments, may be used from any thread.
pub struct Jvmti {
    env: *mut jvmti::jvmtiEnv,
}

impl Jvmti {
    /// Connects to the VM and retrieves a JVMTI environment at version 1.2.
    ///
    /// Fails with the raw `GetEnv` status (e.g. `JNI_EVERSION`) so the
    /// caller can hand it back to the host unchanged.
    pub fn new(vm: *mut jni::JavaVM) -> Result<Self, jni::jint> {
        let mut env_ptr: *mut std::ffi::c_void = ptr::null_mut();

        unsafe {
            // vm: *mut JavaVM = *mut *const JNIInvokeInterface_
            let res = ((**vm).GetEnv)(vm, &mut env_ptr, jvmti::JVMTI_VERSION_1_2);
            if res != jni::JNI_OK {
                return Err(res);
            }
        }

        Ok(Jvmti {
            env: env_ptr as *mut jvmti::jvmtiEnv,
        })
    }

    /// Wraps a raw `jvmtiEnv` pointer.
    ///
    /// # Safety
    /// The pointer must come from the host VM and stay valid for the
    /// lifetime of this wrapper.
    pub unsafe fn from_raw(env: *mut jvmti::jvmtiEnv) -> Self {
        Jvmti { env }
    }

    /// The raw environment pointer.
    pub fn raw(&self) -> *mut jvmti::jvmtiEnv {
        self.env
    }

    pub fn add_capabilities(
        &self,
        caps: &jvmti::jvmtiCapabilities,
    ) -> Result<(), jvmti::jvmtiError> {
        unsafe {
            let add = (*(*self.env).functions)
                .AddCapabilities
                .ok_or(jvmti::jvmtiError::NOT_AVAILABLE)?;
            check(add(self.env, caps))
        }
    }

    /// Builder-style capability request: start from an empty set, let the
    /// closure switch on what it needs, then submit.
    pub fn add_capabilities_with(
        &self,
        configure: impl FnOnce(&mut jvmti::jvmtiCapabilities),
    ) -> Result<(), jvmti::jvmtiError> {
        let mut caps = jvmti::jvmtiCapabilities::default();
        configure(&mut caps);
        self.add_capabilities(&caps)
    }

    pub fn set_event_callbacks(
        &self,
        callbacks: jvmti::jvmtiEventCallbacks,
    ) -> Result<(), jvmti::jvmtiError> {
        unsafe {
            let set = (*(*self.env).functions)
                .SetEventCallbacks
                .ok_or(jvmti::jvmtiError::NOT_AVAILABLE)?;
            let size = std::mem::size_of::<jvmti::jvmtiEventCallbacks>() as jni::jint;
            check(set(self.env, &callbacks, size))
        }
    }

    /// Enables or disables one event globally (`event_thread` = null).
    pub fn set_event_notification_mode(
        &self,
        enable: bool,
        event_type: u32,
    ) -> Result<(), jvmti::jvmtiError> {
        unsafe {
            let set = (*(*self.env).functions)
                .SetEventNotificationMode
                .ok_or(jvmti::jvmtiError::NOT_AVAILABLE)?;
            let mode = if enable { jvmti::JVMTI_ENABLE } else { jvmti::JVMTI_DISABLE };
            check(set(self.env, mode, event_type, ptr::null_mut()))
        }
    }

    pub fn retransform_classes(&self, classes: &[jni::jclass]) -> Result<(), jvmti::jvmtiError> {
        unsafe {
            let retransform = (*(*self.env).functions)
                .RetransformClasses
                .ok_or(jvmti::jvmtiError::NOT_AVAILABLE)?;
            check(retransform(self.env, classes.len() as jni::jint, classes.as_ptr()))
        }
    }

    /// Allocates `size` bytes from the JVMTI allocator. Memory handed to the
    /// VM (e.g. via `new_class_data`) must come from here.
    pub fn allocate(&self, size: jni::jlong) -> Result<*mut u8, jvmti::jvmtiError> {
        let mut mem: *mut u8 = ptr::null_mut();
        unsafe {
            let alloc = (*(*self.env).functions)
                .Allocate
                .ok_or(jvmti::jvmtiError::NOT_AVAILABLE)?;
            check(alloc(self.env, size, &mut mem))?;
        }
        Ok(mem)
    }

    pub fn deallocate(&self, mem: *mut u8) -> Result<(), jvmti::jvmtiError> {
        if mem.is_null() {
            return Ok(());
        }
        unsafe {
            let dealloc = (*(*self.env).functions)
                .Deallocate
                .ok_or(jvmti::jvmtiError::NOT_AVAILABLE)?;
            check(dealloc(self.env, mem))
        }
    }

    /// Human-readable name for a JVMTI status code, for diagnostics.
    pub fn error_name(&self, err: jvmti::jvmtiError) -> String {
        let mut name_ptr: *mut std::os::raw::c_char = ptr::null_mut();
        unsafe {
            let get_name = match (*(*self.env).functions).GetErrorName {
                Some(f) => f,
                None => return format!("JVMTI_ERROR({})", err.0),
            };
            if get_name(self.env, err, &mut name_ptr) != jvmti::jvmtiError::NONE
                || name_ptr.is_null()
            {
                return format!("JVMTI_ERROR({})", err.0);
            }
            let name = std::ffi::CStr::from_ptr(name_ptr)
                .to_string_lossy()
                .into_owned();
            let _ = self.deallocate(name_ptr as *mut u8);
            name
        }
    }
}

/// Safe wrapper around a JNI environment pointer.
///
/// A `JniEnv` is tied to the current thread; it must not be stored.
pub struct JniEnv {
    env: *mut jni::JNIEnv,
}

impl JniEnv {
    /// Wraps a raw `JNIEnv` pointer.
    ///
    /// # Safety
    /// The pointer must be the current thread's JNI environment.
    pub unsafe fn from_raw(env: *mut jni::JNIEnv) -> Self {
        JniEnv { env }
    }

    /// The raw environment pointer.
    pub fn raw(&self) -> *mut jni::JNIEnv {
        self.env
    }

    pub fn get_array_length(&self, array: jni::jarray) -> jni::jsize {
        unsafe { ((**self.env).GetArrayLength)(self.env, array) }
    }

    pub fn get_object_array_element(
        &self,
        array: jni::jobjectArray,
        index: jni::jsize,
    ) -> jni::jobject {
        unsafe { ((**self.env).GetObjectArrayElement)(self.env, array, index) }
    }

    pub fn new_global_ref(&self, obj: jni::jobject) -> jni::jobject {
        unsafe { ((**self.env).NewGlobalRef)(self.env, obj) }
    }

    pub fn delete_global_ref(&self, obj: jni::jobject) {
        if !obj.is_null() {
            unsafe { ((**self.env).DeleteGlobalRef)(self.env, obj) }
        }
    }

    pub fn delete_local_ref(&self, obj: jni::jobject) {
        if !obj.is_null() {
            unsafe { ((**self.env).DeleteLocalRef)(self.env, obj) }
        }
    }
}

/// RAII guard for a JNI global reference.
///
/// Pins an object for the duration of a native call and deletes the global
/// reference on drop.
pub struct GlobalRef {
    env: *mut jni::JNIEnv,
    obj: jni::jobject,
}

impl GlobalRef {
    /// Promotes a local reference to a global one.
    ///
    /// # Safety
    /// The guard must be dropped on the same thread while `env` is valid.
    pub unsafe fn new(env: &JniEnv, local: jni::jobject) -> Self {
        GlobalRef {
            env: env.raw(),
            obj: env.new_global_ref(local),
        }
    }

    pub fn get(&self) -> jni::jobject {
        self.obj
    }
}

impl Drop for GlobalRef {
    fn drop(&mut self) {
        if !self.obj.is_null() && !self.env.is_null() {
            unsafe {
                let env = JniEnv::from_raw(self.env);
                env.delete_global_ref(self.obj);
            }
        }
    }
}
