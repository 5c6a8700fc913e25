// interference-agent/src/sys/jvmti.rs
//
// JVMTI (JVM Tool Interface) bindings, reduced to what this agent touches.
//
// Verified against the JDK 27 jvmti.h header. Compatible with JDK 8+.
//
// Unlike the JNI table, JVMTI functions sit in the MIDDLE of the vtable
// (reserved slots were recycled over the years: 3, 18, 40, 45, 67, ...), so
// the struct must carry all 156 slots to keep offsets right. Slots the agent
// does not call are opaque pointers named after the function they stand for.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

use std::ffi::c_void;
use std::os::raw::c_char;

use crate::sys::jni::{jclass, jint, jlong, jobject, jthread, JNIEnv};

// --- Versions ---
pub const JVMTI_VERSION_1_0: jint = 0x3001_0000;
pub const JVMTI_VERSION_1_1: jint = 0x3001_0100;
pub const JVMTI_VERSION_1_2: jint = 0x3001_0200;

// --- Event numbers (jvmti.h: JVMTI_MIN_EVENT_TYPE_VAL = 50) ---
pub const JVMTI_EVENT_VM_INIT: u32 = 50;
pub const JVMTI_EVENT_VM_DEATH: u32 = 51;
pub const JVMTI_EVENT_CLASS_FILE_LOAD_HOOK: u32 = 54;
pub const JVMTI_EVENT_CLASS_LOAD: u32 = 55;
pub const JVMTI_EVENT_CLASS_PREPARE: u32 = 56;

pub const JVMTI_ENABLE: jint = 1;
pub const JVMTI_DISABLE: jint = 0;

// --- Error codes ---
//
// The host may hand back any code from the full jvmti.h set, so this is a
// transparent newtype rather than an enum: an unknown discriminant coming
// through FFI must not be undefined behavior.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct jvmtiError(pub u32);

impl jvmtiError {
    pub const NONE: jvmtiError = jvmtiError(0);
    pub const INVALID_THREAD: jvmtiError = jvmtiError(10);
    pub const INVALID_CLASS: jvmtiError = jvmtiError(21);
    pub const UNMODIFIABLE_CLASS: jvmtiError = jvmtiError(79);
    pub const NOT_AVAILABLE: jvmtiError = jvmtiError(98);
    pub const MUST_POSSESS_CAPABILITY: jvmtiError = jvmtiError(99);
    pub const NULL_POINTER: jvmtiError = jvmtiError(100);
    pub const INVALID_EVENT_TYPE: jvmtiError = jvmtiError(102);
    pub const ILLEGAL_ARGUMENT: jvmtiError = jvmtiError(103);
    pub const OUT_OF_MEMORY: jvmtiError = jvmtiError(110);
    pub const WRONG_PHASE: jvmtiError = jvmtiError(112);
    pub const INTERNAL: jvmtiError = jvmtiError(113);

    /// The raw code, as it is returned to Java callers.
    pub fn code(self) -> jint {
        self.0 as jint
    }
}

// --- Capabilities ---
//
// jvmtiCapabilities is a C bitfield struct padded to 128 bits. Bit offsets
// follow jvmti.h field order.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct jvmtiCapabilities {
    bits: [u32; 4],
}

impl Default for jvmtiCapabilities {
    fn default() -> Self {
        Self { bits: [0; 4] }
    }
}

impl jvmtiCapabilities {
    fn set_bit(&mut self, bit_offset: usize, value: bool) {
        let word = bit_offset / 32;
        let bit = bit_offset % 32;
        if value {
            self.bits[word] |= 1 << bit;
        } else {
            self.bits[word] &= !(1 << bit);
        }
    }

    fn get_bit(&self, bit_offset: usize) -> bool {
        let word = bit_offset / 32;
        let bit = bit_offset % 32;
        (self.bits[word] & (1 << bit)) != 0
    }

    // [9]
    pub fn set_can_redefine_classes(&mut self, v: bool) { self.set_bit(9, v); }
    pub fn can_redefine_classes(&self) -> bool { self.get_bit(9) }

    // [26]
    pub fn set_can_generate_all_class_hook_events(&mut self, v: bool) { self.set_bit(26, v); }
    pub fn can_generate_all_class_hook_events(&self) -> bool { self.get_bit(26) }

    // [37]
    pub fn set_can_retransform_classes(&mut self, v: bool) { self.set_bit(37, v); }
    pub fn can_retransform_classes(&self) -> bool { self.get_bit(37) }

    // [38]
    pub fn set_can_retransform_any_class(&mut self, v: bool) { self.set_bit(38, v); }
    pub fn can_retransform_any_class(&self) -> bool { self.get_bit(38) }
}

// --- Function typedefs (only the slots this agent calls) ---

pub type JvmtiSetEventNotificationModeFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    mode: jint,
    event_type: u32,
    event_thread: jthread,
) -> jvmtiError;

pub type JvmtiAllocateFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    size: jlong,
    mem_ptr: *mut *mut u8,
) -> jvmtiError;

pub type JvmtiDeallocateFn =
    unsafe extern "system" fn(env: *mut jvmtiEnv, mem: *mut u8) -> jvmtiError;

pub type JvmtiSetEventCallbacksFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    callbacks: *const jvmtiEventCallbacks,
    size_of_callbacks: jint,
) -> jvmtiError;

pub type JvmtiGetErrorNameFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    error: jvmtiError,
    name_ptr: *mut *mut c_char,
) -> jvmtiError;

pub type JvmtiAddCapabilitiesFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    capabilities_ptr: *const jvmtiCapabilities,
) -> jvmtiError;

pub type JvmtiRetransformClassesFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    class_count: jint,
    classes: *const jclass,
) -> jvmtiError;

// --- Event callback typedefs ---

pub type JvmtiClassFileLoadHookFn = unsafe extern "system" fn(
    jvmti_env: *mut jvmtiEnv,
    jni_env: *mut JNIEnv,
    class_being_redefined: jclass,
    loader: jobject,
    name: *const c_char,
    protection_domain: jobject,
    class_data_len: jint,
    class_data: *const u8,
    new_class_data_len: *mut jint,
    new_class_data: *mut *mut u8,
);

/// Placeholder for event slots this agent leaves unset.
pub type JvmtiEventUnused = Option<unsafe extern "system" fn()>;

// =============================================================================
// jvmtiInterface_1_ - the JVMTI function table
// =============================================================================

#[repr(C)]
pub struct jvmtiInterface_1_ {
    /*   1: reserved */
    pub reserved1: *mut c_void,
    /*   2 */ pub SetEventNotificationMode: Option<JvmtiSetEventNotificationModeFn>,
    /*   3 */ pub GetAllModules: *mut c_void,
    /*   4 */ pub GetAllThreads: *mut c_void,
    /*   5 */ pub SuspendThread: *mut c_void,
    /*   6 */ pub ResumeThread: *mut c_void,
    /*   7 */ pub StopThread: *mut c_void,
    /*   8 */ pub InterruptThread: *mut c_void,
    /*   9 */ pub GetThreadInfo: *mut c_void,
    /*  10 */ pub GetOwnedMonitorInfo: *mut c_void,
    /*  11 */ pub GetCurrentContendedMonitor: *mut c_void,
    /*  12 */ pub RunAgentThread: *mut c_void,
    /*  13 */ pub GetTopThreadGroups: *mut c_void,
    /*  14 */ pub GetThreadGroupInfo: *mut c_void,
    /*  15 */ pub GetThreadGroupChildren: *mut c_void,
    /*  16 */ pub GetFrameCount: *mut c_void,
    /*  17 */ pub GetThreadState: *mut c_void,
    /*  18 */ pub GetCurrentThread: *mut c_void,
    /*  19 */ pub GetFrameLocation: *mut c_void,
    /*  20 */ pub NotifyFramePop: *mut c_void,
    /*  21 */ pub GetLocalObject: *mut c_void,
    /*  22 */ pub GetLocalInt: *mut c_void,
    /*  23 */ pub GetLocalLong: *mut c_void,
    /*  24 */ pub GetLocalFloat: *mut c_void,
    /*  25 */ pub GetLocalDouble: *mut c_void,
    /*  26 */ pub SetLocalObject: *mut c_void,
    /*  27 */ pub SetLocalInt: *mut c_void,
    /*  28 */ pub SetLocalLong: *mut c_void,
    /*  29 */ pub SetLocalFloat: *mut c_void,
    /*  30 */ pub SetLocalDouble: *mut c_void,
    /*  31 */ pub CreateRawMonitor: *mut c_void,
    /*  32 */ pub DestroyRawMonitor: *mut c_void,
    /*  33 */ pub RawMonitorEnter: *mut c_void,
    /*  34 */ pub RawMonitorExit: *mut c_void,
    /*  35 */ pub RawMonitorWait: *mut c_void,
    /*  36 */ pub RawMonitorNotify: *mut c_void,
    /*  37 */ pub RawMonitorNotifyAll: *mut c_void,
    /*  38 */ pub SetBreakpoint: *mut c_void,
    /*  39 */ pub ClearBreakpoint: *mut c_void,
    /*  40 */ pub GetNamedModule: *mut c_void,
    /*  41 */ pub SetFieldAccessWatch: *mut c_void,
    /*  42 */ pub ClearFieldAccessWatch: *mut c_void,
    /*  43 */ pub SetFieldModificationWatch: *mut c_void,
    /*  44 */ pub ClearFieldModificationWatch: *mut c_void,
    /*  45 */ pub IsModifiableClass: *mut c_void,
    /*  46 */ pub Allocate: Option<JvmtiAllocateFn>,
    /*  47 */ pub Deallocate: Option<JvmtiDeallocateFn>,
    /*  48 */ pub GetClassSignature: *mut c_void,
    /*  49 */ pub GetClassStatus: *mut c_void,
    /*  50 */ pub GetSourceFileName: *mut c_void,
    /*  51 */ pub GetClassModifiers: *mut c_void,
    /*  52 */ pub GetClassMethods: *mut c_void,
    /*  53 */ pub GetClassFields: *mut c_void,
    /*  54 */ pub GetImplementedInterfaces: *mut c_void,
    /*  55 */ pub IsInterface: *mut c_void,
    /*  56 */ pub IsArrayClass: *mut c_void,
    /*  57 */ pub GetClassLoader: *mut c_void,
    /*  58 */ pub GetObjectHashCode: *mut c_void,
    /*  59 */ pub GetObjectMonitorUsage: *mut c_void,
    /*  60 */ pub GetFieldName: *mut c_void,
    /*  61 */ pub GetFieldDeclaringClass: *mut c_void,
    /*  62 */ pub GetFieldModifiers: *mut c_void,
    /*  63 */ pub IsFieldSynthetic: *mut c_void,
    /*  64 */ pub GetMethodName: *mut c_void,
    /*  65 */ pub GetMethodDeclaringClass: *mut c_void,
    /*  66 */ pub GetMethodModifiers: *mut c_void,
    /*  67 */ pub ClearAllFramePops: *mut c_void,
    /*  68 */ pub GetMaxLocals: *mut c_void,
    /*  69 */ pub GetArgumentsSize: *mut c_void,
    /*  70 */ pub GetLineNumberTable: *mut c_void,
    /*  71 */ pub GetMethodLocation: *mut c_void,
    /*  72 */ pub GetLocalVariableTable: *mut c_void,
    /*  73 */ pub SetNativeMethodPrefix: *mut c_void,
    /*  74 */ pub SetNativeMethodPrefixes: *mut c_void,
    /*  75 */ pub GetBytecodes: *mut c_void,
    /*  76 */ pub IsMethodNative: *mut c_void,
    /*  77 */ pub IsMethodSynthetic: *mut c_void,
    /*  78 */ pub GetLoadedClasses: *mut c_void,
    /*  79 */ pub GetClassLoaderClasses: *mut c_void,
    /*  80 */ pub PopFrame: *mut c_void,
    /*  81 */ pub ForceEarlyReturnObject: *mut c_void,
    /*  82 */ pub ForceEarlyReturnInt: *mut c_void,
    /*  83 */ pub ForceEarlyReturnLong: *mut c_void,
    /*  84 */ pub ForceEarlyReturnFloat: *mut c_void,
    /*  85 */ pub ForceEarlyReturnDouble: *mut c_void,
    /*  86 */ pub ForceEarlyReturnVoid: *mut c_void,
    /*  87 */ pub RedefineClasses: *mut c_void,
    /*  88 */ pub GetVersionNumber: *mut c_void,
    /*  89 */ pub GetCapabilities: *mut c_void,
    /*  90 */ pub GetSourceDebugExtension: *mut c_void,
    /*  91 */ pub IsMethodObsolete: *mut c_void,
    /*  92 */ pub SuspendThreadList: *mut c_void,
    /*  93 */ pub ResumeThreadList: *mut c_void,
    /*  94 */ pub AddModuleReads: *mut c_void,
    /*  95 */ pub AddModuleExports: *mut c_void,
    /*  96 */ pub AddModuleOpens: *mut c_void,
    /*  97 */ pub AddModuleUses: *mut c_void,
    /*  98 */ pub AddModuleProvides: *mut c_void,
    /*  99 */ pub IsModifiableModule: *mut c_void,
    /* 100 */ pub GetAllStackTraces: *mut c_void,
    /* 101 */ pub GetThreadListStackTraces: *mut c_void,
    /* 102 */ pub GetThreadLocalStorage: *mut c_void,
    /* 103 */ pub SetThreadLocalStorage: *mut c_void,
    /* 104 */ pub GetStackTrace: *mut c_void,
    /* 105: reserved */
    pub reserved105: *mut c_void,
    /* 106 */ pub GetTag: *mut c_void,
    /* 107 */ pub SetTag: *mut c_void,
    /* 108 */ pub ForceGarbageCollection: *mut c_void,
    /* 109 */ pub IterateOverObjectsReachableFromObject: *mut c_void,
    /* 110 */ pub IterateOverReachableObjects: *mut c_void,
    /* 111 */ pub IterateOverHeap: *mut c_void,
    /* 112 */ pub IterateOverInstancesOfClass: *mut c_void,
    /* 113: reserved */
    pub reserved113: *mut c_void,
    /* 114 */ pub GetObjectsWithTags: *mut c_void,
    /* 115 */ pub FollowReferences: *mut c_void,
    /* 116 */ pub IterateThroughHeap: *mut c_void,
    /* 117: reserved */
    pub reserved117: *mut c_void,
    /* 118 */ pub SuspendAllVirtualThreads: *mut c_void,
    /* 119 */ pub ResumeAllVirtualThreads: *mut c_void,
    /* 120 */ pub SetJNIFunctionTable: *mut c_void,
    /* 121 */ pub GetJNIFunctionTable: *mut c_void,
    /* 122 */ pub SetEventCallbacks: Option<JvmtiSetEventCallbacksFn>,
    /* 123 */ pub GenerateEvents: *mut c_void,
    /* 124 */ pub GetExtensionFunctions: *mut c_void,
    /* 125 */ pub GetExtensionEvents: *mut c_void,
    /* 126 */ pub SetExtensionEventCallback: *mut c_void,
    /* 127 */ pub DisposeEnvironment: *mut c_void,
    /* 128 */ pub GetErrorName: Option<JvmtiGetErrorNameFn>,
    /* 129 */ pub GetJLocationFormat: *mut c_void,
    /* 130 */ pub GetSystemProperties: *mut c_void,
    /* 131 */ pub GetSystemProperty: *mut c_void,
    /* 132 */ pub SetSystemProperty: *mut c_void,
    /* 133 */ pub GetPhase: *mut c_void,
    /* 134 */ pub GetCurrentThreadCpuTimerInfo: *mut c_void,
    /* 135 */ pub GetCurrentThreadCpuTime: *mut c_void,
    /* 136 */ pub GetThreadCpuTimerInfo: *mut c_void,
    /* 137 */ pub GetThreadCpuTime: *mut c_void,
    /* 138 */ pub GetTimerInfo: *mut c_void,
    /* 139 */ pub GetTime: *mut c_void,
    /* 140 */ pub GetPotentialCapabilities: *mut c_void,
    /* 141: reserved */
    pub reserved141: *mut c_void,
    /* 142 */ pub AddCapabilities: Option<JvmtiAddCapabilitiesFn>,
    /* 143 */ pub RelinquishCapabilities: *mut c_void,
    /* 144 */ pub GetAvailableProcessors: *mut c_void,
    /* 145 */ pub GetClassVersionNumbers: *mut c_void,
    /* 146 */ pub GetConstantPool: *mut c_void,
    /* 147 */ pub GetEnvironmentLocalStorage: *mut c_void,
    /* 148 */ pub SetEnvironmentLocalStorage: *mut c_void,
    /* 149 */ pub AddToBootstrapClassLoaderSearch: *mut c_void,
    /* 150 */ pub SetVerboseFlag: *mut c_void,
    /* 151 */ pub AddToSystemClassLoaderSearch: *mut c_void,
    /* 152 */ pub RetransformClasses: Option<JvmtiRetransformClassesFn>,
    /* 153 */ pub GetOwnedMonitorStackDepthInfo: *mut c_void,
    /* 154 */ pub GetObjectSize: *mut c_void,
    /* 155 */ pub GetLocalInstance: *mut c_void,
    /* 156 */ pub SetHeapSamplingInterval: *mut c_void,
}

#[repr(C)]
pub struct jvmtiEnv {
    pub functions: *const jvmtiInterface_1_,
}

// =============================================================================
// jvmtiEventCallbacks
// =============================================================================
//
// Full layout through the JDK 21 virtual-thread events. Struct index is
// event number minus 50; events 72, 77-79 and 85 are reserved in jvmti.h.

#[repr(C)]
#[derive(Copy, Clone, Default)]
pub struct jvmtiEventCallbacks {
    pub VMInit: JvmtiEventUnused,
    pub VMDeath: JvmtiEventUnused,
    pub ThreadStart: JvmtiEventUnused,
    pub ThreadEnd: JvmtiEventUnused,
    pub ClassFileLoadHook: Option<JvmtiClassFileLoadHookFn>,
    pub ClassLoad: JvmtiEventUnused,
    pub ClassPrepare: JvmtiEventUnused,
    pub VMStart: JvmtiEventUnused,
    pub Exception: JvmtiEventUnused,
    pub ExceptionCatch: JvmtiEventUnused,
    pub SingleStep: JvmtiEventUnused,
    pub FramePop: JvmtiEventUnused,
    pub Breakpoint: JvmtiEventUnused,
    pub FieldAccess: JvmtiEventUnused,
    pub FieldModification: JvmtiEventUnused,
    pub MethodEntry: JvmtiEventUnused,
    pub MethodExit: JvmtiEventUnused,
    pub NativeMethodBind: JvmtiEventUnused,
    pub CompiledMethodLoad: JvmtiEventUnused,
    pub CompiledMethodUnload: JvmtiEventUnused,
    pub DynamicCodeGenerated: JvmtiEventUnused,
    pub DataDumpRequest: JvmtiEventUnused,
    pub reserved72: JvmtiEventUnused,
    pub MonitorWait: JvmtiEventUnused,
    pub MonitorWaited: JvmtiEventUnused,
    pub MonitorContendedEnter: JvmtiEventUnused,
    pub MonitorContendedEntered: JvmtiEventUnused,
    pub reserved77: JvmtiEventUnused,
    pub reserved78: JvmtiEventUnused,
    pub reserved79: JvmtiEventUnused,
    pub ResourceExhausted: JvmtiEventUnused,
    pub GarbageCollectionStart: JvmtiEventUnused,
    pub GarbageCollectionFinish: JvmtiEventUnused,
    pub ObjectFree: JvmtiEventUnused,
    pub VMObjectAlloc: JvmtiEventUnused,
    pub reserved85: JvmtiEventUnused,
    pub SampledObjectAlloc: JvmtiEventUnused,
    pub VirtualThreadStart: JvmtiEventUnused,
    pub VirtualThreadEnd: JvmtiEventUnused,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_bits_land_in_the_right_words() {
        let mut caps = jvmtiCapabilities::default();
        caps.set_can_retransform_classes(true);
        assert!(caps.can_retransform_classes());
        assert!(!caps.can_retransform_any_class());
        assert!(!caps.can_generate_all_class_hook_events());

        caps.set_can_retransform_classes(false);
        assert_eq!(caps, jvmtiCapabilities::default());
    }

    #[test]
    fn callbacks_default_to_no_handlers() {
        let cb = jvmtiEventCallbacks::default();
        assert!(cb.ClassFileLoadHook.is_none());
        assert!(cb.VMInit.is_none());
    }

    #[test]
    fn callback_struct_is_densely_packed() {
        // 39 pointer-sized slots: events 50..=88 with reserved gaps kept.
        assert_eq!(
            std::mem::size_of::<jvmtiEventCallbacks>(),
            39 * std::mem::size_of::<usize>()
        );
    }
}
