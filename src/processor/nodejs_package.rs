//! Node.js package-level processor.
//!
//! Collapses each stack into one frame per run of consecutive frames that
//! belong to the same npm package (or to app code, node internals, native
//! code, the kernel), then inserts the collapsed stack like the default
//! processor does.

use super::nodejs::{split_code_location, strip_tier_prefix};
use super::{fold_stack, ProcessorOptions, StackProcessor};
use crate::aggregator::FlameNode;
use crate::profile::StackFrame;
use crate::utils::config::LIBTYPE_KERNEL;

pub const APP_CODE: &str = "(app code)";
pub const NODE_API: &str = "(node api)";
pub const NATIVE: &str = "(native)";
pub const KERNEL: &str = "(kernel)";

const NODE_MODULES: &str = "node_modules";

#[derive(Debug, Clone, Default)]
pub struct NodeJsPackageStackProcessor {
    options: ProcessorOptions,
}

impl NodeJsPackageStackProcessor {
    pub fn new(options: ProcessorOptions) -> Self {
        Self { options }
    }
}

/// Package a frame belongs to
pub fn resolve_package(frame: &StackFrame) -> String {
    let location = strip_tier_prefix(&frame.function_name)
        .and_then(|(rest, _)| split_code_location(rest).1);

    let Some(location) = location else {
        let package = if frame.lib_type == LIBTYPE_KERNEL { KERNEL } else { NATIVE };
        return package.to_string();
    };

    let path = location.split(':').next().unwrap_or_default();

    if let Some(package) = node_modules_package(path) {
        return package;
    }
    if path.starts_with('/') || path.contains("[eval") {
        APP_CODE.to_string()
    } else {
        NODE_API.to_string()
    }
}

/// First component after the last `node_modules`, two for `@scope/name`
fn node_modules_package(path: &str) -> Option<String> {
    let index = path.rfind(NODE_MODULES)?;
    let mut parts = path[index + NODE_MODULES.len()..]
        .split('/')
        .filter(|part| !part.is_empty());

    let first = parts.next()?;
    if first.starts_with('@') {
        if let Some(name) = parts.next() {
            return Some(format!("{}/{}", first, name));
        }
    }
    Some(first.to_string())
}

/// Cheap V8 builtins that sit between JS frames; they fold into the
/// surrounding package instead of splitting it.
pub fn is_transparent_builtin(name: &str) -> bool {
    if name.contains("ArgumentsAdaptorTrampoline") {
        return true;
    }
    if name.starts_with("Builtin")
        && (name.contains("Construct")
            || name.contains("LoadIC")
            || name.contains("StoreIC")
            || name.contains("InterpreterEntryTrampoline"))
    {
        return true;
    }
    name.starts_with("BytecodeHandler")
}

/// One synthetic frame per run of same-package frames, always starting
/// with `(native)`.
pub fn collapse_packages(stack: &[StackFrame]) -> Vec<StackFrame> {
    let mut collapsed = Vec::new();
    let mut current = StackFrame::new(NATIVE, "");

    for frame in stack {
        if is_transparent_builtin(&frame.function_name) {
            continue;
        }
        let package = resolve_package(frame);
        if package == current.function_name {
            continue;
        }
        collapsed.push(std::mem::replace(&mut current, StackFrame::new(package, "")));
    }
    collapsed.push(current);

    collapsed
}

impl StackProcessor for NodeJsPackageStackProcessor {
    fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    fn process(&self, root: &mut FlameNode, stack: &[StackFrame], value: f64) {
        let collapsed = collapse_packages(stack);
        fold_stack(self, root, &collapsed, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(name: &str, lib_type: &str) -> String {
        resolve_package(&StackFrame::new(name, lib_type))
    }

    #[test]
    fn test_resolve_package() {
        assert_eq!(
            package("InterpretedFunction:parseResponse /apps/routes/node_modules/restify-clients/lib/JsonClient.js:76", "jit"),
            "restify-clients"
        );
        assert_eq!(
            package("LazyCompile: /apps/routes/node_modules/@netflix-internal/naql-ipc/lib/ipc/AbstractClient.js:213", "jit"),
            "@netflix-internal/naql-ipc"
        );
        assert_eq!(package("LazyCompile:*get bar /home/nfsuper/foo.js:1", "jit"), APP_CODE);
        assert_eq!(package("LazyCompile:*a [eval]:1", "jit"), APP_CODE);
        assert_eq!(
            package("LazyCompile:processTicksAndRejections internal/process/task_queues.js:69", "jit"),
            NODE_API
        );
        assert_eq!(package("smp_call_function_single", "kernel"), KERNEL);
        assert_eq!(package("uv_run", "user"), NATIVE);
        assert_eq!(package("LazyCompile:noLocation", "jit"), NATIVE);
    }

    #[test]
    fn test_nested_node_modules_uses_innermost_package() {
        assert_eq!(
            package("LazyCompile:f /app/node_modules/a/node_modules/b/index.js:1", "jit"),
            "b"
        );
    }

    #[test]
    fn test_transparent_builtins() {
        assert!(is_transparent_builtin("Builtins_ArgumentsAdaptorTrampoline"));
        assert!(is_transparent_builtin("Builtins_JSConstructStubGeneric"));
        assert!(is_transparent_builtin("Builtins_LoadIC_Megamorphic"));
        assert!(is_transparent_builtin("Builtins_KeyedStoreIC"));
        assert!(is_transparent_builtin("Builtins_InterpreterEntryTrampoline"));
        assert!(is_transparent_builtin("BytecodeHandler:LdaZero"));
        assert!(!is_transparent_builtin("Builtins_CEntry_Return1_DontSaveFPRegs_ArgvOnStack_NoBuiltinExit"));
        assert!(!is_transparent_builtin("v8::internal::LoadIC::Load"));
    }

    #[test]
    fn test_collapse_runs() {
        let stack = vec![
            StackFrame::new("uv_run", "user"),
            StackFrame::new("node::Start", "user"),
            StackFrame::new("LazyCompile:main /srv/app.js:1", "jit"),
            StackFrame::new("Builtins_InterpreterEntryTrampoline", "user"),
            StackFrame::new("LazyCompile:helper /srv/util.js:4", "jit"),
            StackFrame::new("LazyCompile:get /srv/node_modules/lodash/get.js:9", "jit"),
            StackFrame::new("sys_read", "kernel"),
        ];

        let names: Vec<String> = collapse_packages(&stack)
            .into_iter()
            .map(|f| f.function_name)
            .collect();
        assert_eq!(names, vec![NATIVE, APP_CODE, "lodash", KERNEL]);
    }

    #[test]
    fn test_collapse_keeps_leading_native_frame() {
        let stack = vec![StackFrame::new("LazyCompile:main /srv/app.js:1", "jit")];
        let collapsed = collapse_packages(&stack);

        assert_eq!(collapsed.len(), 2);
        assert_eq!(collapsed[0].function_name, NATIVE);
        assert!(collapsed.iter().all(|f| f.lib_type.is_empty()));
        assert_eq!(collapse_packages(&[]).len(), 1);
    }

    #[test]
    fn test_process_builds_package_tree() {
        let processor = NodeJsPackageStackProcessor::default();
        let mut root = FlameNode::root();
        let stack = vec![
            StackFrame::new("LazyCompile:main /srv/app.js:1", "jit"),
            StackFrame::new("LazyCompile:get /srv/node_modules/lodash/get.js:9", "jit"),
        ];

        processor.process(&mut root, &stack, 2.0);

        let native = root.find_child(NATIVE).unwrap();
        let app = native.find_child(APP_CODE).unwrap();
        let lodash = app.find_child("lodash").unwrap();
        assert_eq!(lodash.value, 2.0);
        assert_eq!(root.value, 2.0);
    }
}
