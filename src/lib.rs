//! # interference-agent
//!
//! A native JVMTI test agent with **zero runtime dependencies**, built to
//! support a test that several independently loaded agents can each install
//! a `ClassFileLoadHook` transformer without stepping on one another.
//!
//! The agent does deliberately boring work: every class file it intercepts
//! is parsed into an IR and re-serialized unmodified, so it behaves like a
//! transforming agent without changing any semantics. The host test then
//! checks that its *other* instrumentation still works while this agent's
//! hook fires.
//!
//! ## Surface
//!
//! | Entry point | Purpose |
//! |-------------|---------|
//! | `Agent_OnLoad` / `Agent_OnAttach` | capability negotiation, hook installation |
//! | `...InterferenceTest_nativeRetransformClasses` | retransform a `Class<?>[]` through the hook |
//! | `...InterferenceTest_disableRetransformHook` | switch the hook off |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 agent - hook + JNI exports           │
//! ├──────────────────────────────────────────────────────┤
//! │   classfile - IR, reader, writer, Allocator seam     │
//! ├──────────────────────────────────────────────────────┤
//! │   env - Jvmti / JniEnv wrappers, GlobalRef guard     │
//! ├──────────────────────────────────────────────────────┤
//! │   sys - raw JNI / JVMTI vtables (FFI)                │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Loading
//!
//! ```bash
//! cargo build --release
//! java -agentpath:./target/release/libinterference_agent.so MyTestRunner
//! # or scope the hook to one class:
//! java -agentpath:./target/release/libinterference_agent.so=class=com.agenttest.interference.InterferenceTest\$TestClass ...
//! ```
//!
//! The agent also supports runtime attach (`Agent_OnAttach`) for hosts that
//! load agents after VM start.

pub mod agent;
pub mod classfile;
pub mod env;
pub mod sys;
