// interference-agent/src/sys/jni.rs
//
// JNI (Java Native Interface) bindings, reduced to what this agent touches.
//
// Verified against the JDK 27 jni.h header. Compatible with JDK 8+.
//
// The JNI function table has been stable since JDK 1.6 and newer JDKs only
// append functions at the END of the vtable. This table is therefore declared
// as a prefix: every slot up to and including the object-array operations, in
// header order. Slots the agent never calls are opaque pointers named after
// the function they stand for, and the uniform Call*/field accessor families
// are collapsed into fixed-size pointer arrays. Every slot is pointer-sized,
// so the layout matches the full table.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

use std::ffi::c_void;

// =============================================================================
// Primitive types
// =============================================================================

pub type jint = i32;
pub type jlong = i64;
pub type jbyte = i8;
pub type jboolean = u8;
pub type jchar = u16;
pub type jshort = i16;
pub type jfloat = f32;
pub type jdouble = f64;
pub type jsize = jint;

// =============================================================================
// Reference types (opaque pointers)
// =============================================================================

pub type jobject = *mut c_void;
pub type jclass = jobject;
pub type jstring = jobject;
pub type jarray = jobject;
pub type jthread = jobject;
pub type jobjectArray = jarray;

// =============================================================================
// Constants
// =============================================================================

pub const JNI_OK: jint = 0;
pub const JNI_ERR: jint = -1;
pub const JNI_EDETACHED: jint = -2;
pub const JNI_EVERSION: jint = -3;

pub const JNI_TRUE: jboolean = 1;
pub const JNI_FALSE: jboolean = 0;

pub const JNI_VERSION_1_6: jint = 0x0001_0006;
pub const JNI_VERSION_1_8: jint = 0x0001_0008;

// =============================================================================
// JNINativeInterface_ - the JNI function table (vtable prefix)
// =============================================================================
//
// Slot numbers follow the JDK header. Order must exactly match it.

#[repr(C)]
pub struct JNINativeInterface_ {
    // 0-3: reserved
    pub reserved0: *mut c_void,
    pub reserved1: *mut c_void,
    pub reserved2: *mut c_void,
    pub reserved3: *mut c_void,

    // 4: GetVersion
    pub GetVersion: unsafe extern "system" fn(env: *mut JNIEnv) -> jint,

    // 5-12: class and reflection operations
    pub DefineClass: *mut c_void,
    pub FindClass: *mut c_void,
    pub FromReflectedMethod: *mut c_void,
    pub FromReflectedField: *mut c_void,
    pub ToReflectedMethod: *mut c_void,
    pub GetSuperclass: *mut c_void,
    pub IsAssignableFrom: *mut c_void,
    pub ToReflectedField: *mut c_void,

    // 13-18: exception handling
    pub Throw: *mut c_void,
    pub ThrowNew: *mut c_void,
    pub ExceptionOccurred: *mut c_void,
    pub ExceptionDescribe: *mut c_void,
    pub ExceptionClear: *mut c_void,
    pub FatalError: *mut c_void,

    // 19-20: local frames
    pub PushLocalFrame: *mut c_void,
    pub PopLocalFrame: *mut c_void,

    // 21-26: references
    pub NewGlobalRef: unsafe extern "system" fn(env: *mut JNIEnv, lobj: jobject) -> jobject,
    pub DeleteGlobalRef: unsafe extern "system" fn(env: *mut JNIEnv, gref: jobject),
    pub DeleteLocalRef: unsafe extern "system" fn(env: *mut JNIEnv, obj: jobject),
    pub IsSameObject: *mut c_void,
    pub NewLocalRef: *mut c_void,
    pub EnsureLocalCapacity: *mut c_void,

    // 27-30: object construction
    pub AllocObject: *mut c_void,
    pub NewObject: *mut c_void,
    pub NewObjectV: *mut c_void,
    pub NewObjectA: *mut c_void,

    // 31-33: object queries
    pub GetObjectClass: *mut c_void,
    pub IsInstanceOf: *mut c_void,
    pub GetMethodID: *mut c_void,

    // 34-63: Call<Type>Method{,V,A}, 10 return types
    pub CallMethodFamily: [*mut c_void; 30],
    // 64-93: CallNonvirtual<Type>Method{,V,A}, 10 return types
    pub CallNonvirtualMethodFamily: [*mut c_void; 30],

    // 94: GetFieldID
    pub GetFieldID: *mut c_void,
    // 95-103: Get<Type>Field, 9 field types
    pub GetFieldFamily: [*mut c_void; 9],
    // 104-112: Set<Type>Field, 9 field types
    pub SetFieldFamily: [*mut c_void; 9],

    // 113: GetStaticMethodID
    pub GetStaticMethodID: *mut c_void,
    // 114-143: CallStatic<Type>Method{,V,A}, 10 return types
    pub CallStaticMethodFamily: [*mut c_void; 30],

    // 144: GetStaticFieldID
    pub GetStaticFieldID: *mut c_void,
    // 145-153: GetStatic<Type>Field, 9 field types
    pub GetStaticFieldFamily: [*mut c_void; 9],
    // 154-162: SetStatic<Type>Field, 9 field types
    pub SetStaticFieldFamily: [*mut c_void; 9],

    // 163-170: string operations
    pub NewString: *mut c_void,
    pub GetStringLength: *mut c_void,
    pub GetStringChars: *mut c_void,
    pub ReleaseStringChars: *mut c_void,
    pub NewStringUTF: *mut c_void,
    pub GetStringUTFLength: *mut c_void,
    pub GetStringUTFChars: *mut c_void,
    pub ReleaseStringUTFChars: *mut c_void,

    // 171-174: array operations
    pub GetArrayLength: unsafe extern "system" fn(env: *mut JNIEnv, array: jarray) -> jsize,
    pub NewObjectArray: *mut c_void,
    pub GetObjectArrayElement:
        unsafe extern "system" fn(env: *mut JNIEnv, array: jobjectArray, index: jsize) -> jobject,
    pub SetObjectArrayElement: *mut c_void,
}

/// JNIEnv is directly the vtable pointer (C ABI definition)
pub type JNIEnv = *const JNINativeInterface_;

// =============================================================================
// JNIInvokeInterface_ - the JavaVM function table
// =============================================================================

#[repr(C)]
pub struct JNIInvokeInterface_ {
    pub reserved0: *mut c_void,
    pub reserved1: *mut c_void,
    pub reserved2: *mut c_void,

    pub DestroyJavaVM: unsafe extern "system" fn(vm: *mut JavaVM) -> jint,
    pub AttachCurrentThread:
        unsafe extern "system" fn(vm: *mut JavaVM, penv: *mut *mut c_void, args: *mut c_void) -> jint,
    pub DetachCurrentThread: unsafe extern "system" fn(vm: *mut JavaVM) -> jint,
    pub GetEnv:
        unsafe extern "system" fn(vm: *mut JavaVM, penv: *mut *mut c_void, version: jint) -> jint,
    pub AttachCurrentThreadAsDaemon:
        unsafe extern "system" fn(vm: *mut JavaVM, penv: *mut *mut c_void, args: *mut c_void) -> jint,
}

// In C JNI, JavaVM is directly a pointer to the vtable:
//   typedef const struct JNIInvokeInterface_ *JavaVM;
// The JavaVM_ wrapper struct only exists in C++.

/// JavaVM is directly the vtable pointer (C ABI definition)
pub type JavaVM = *const JNIInvokeInterface_;
