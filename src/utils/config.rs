//! Constants shared by the profile model and the flame graph engine.

/// Node id reserved for the synthetic profile root
pub const ROOT_NODE_ID: u64 = 0;

/// Name and lib-type of the output tree root
pub const ROOT_NAME: &str = "root";
pub const ROOT_LIBTYPE: &str = "";

// Capability flags in `Profile::params`. A flag is only considered set
// when its value is the literal string "true".
pub const HAS_NODE_STACK: &str = "has_node_stack";
pub const HAS_PARENT: &str = "has_parent";
pub const HAS_SAMPLES_CPU: &str = "has_samples_cpu";
pub const HAS_SAMPLES_PID: &str = "has_samples_pid";
pub const HAS_SAMPLES_TID: &str = "has_samples_tid";
pub const HAS_VALUES: &str = "hasValues";

// Lib-type tags
pub const LIBTYPE_KERNEL: &str = "kernel";
pub const LIBTYPE_USER: &str = "user";
pub const LIBTYPE_JIT: &str = "jit";
pub const LIBTYPE_INLINED: &str = "inlined";

// V8 code-tier prefixes found in perf-map symbol names
pub const V8_OPTIMIZED_PREFIX: &str = "LazyCompile:";
pub const V8_INTERPRETED_PREFIX: &str = "InterpretedFunction:";

/// Default output path for the `build` command
pub const DEFAULT_OUTPUT: &str = "profile.json";
