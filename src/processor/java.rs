//! JVM frame name cleanup.
//!
//! Perf maps from JIT agents carry type descriptors such as
//! `Ljava/util/concurrent/FutureTask;::run`. These are turned back into
//! dotted class names, and generated proxy/lambda suffixes are dropped so
//! that all instances of a class collapse into one frame.

use super::{FrameExtras, ProcessorOptions, StackProcessor, StackScratch};
use crate::profile::StackFrame;
use crate::utils::config::{LIBTYPE_INLINED, LIBTYPE_JIT};

#[derive(Debug, Clone, Default)]
pub struct JavaStackProcessor {
    options: ProcessorOptions,
}

impl JavaStackProcessor {
    pub fn new(options: ProcessorOptions) -> Self {
        Self { options }
    }
}

/// Demangle a JVM frame name
pub fn demangle_java_name(name: &str, lib_type: &str) -> String {
    let (class_name, method) = match name.split_once("::") {
        Some((class_name, method)) => (class_name, Some(method)),
        None => (name, None),
    };

    let mut class_name = class_name.split("$$").next().unwrap_or_default();

    if lib_type == LIBTYPE_JIT || lib_type == LIBTYPE_INLINED {
        class_name = class_name.strip_prefix('L').unwrap_or(class_name);
    }
    let class_name = class_name.strip_suffix(';').unwrap_or(class_name).replace('/', ".");

    match method {
        Some(method) => format!("{}::{}", class_name, method),
        None => class_name,
    }
}

impl StackProcessor for JavaStackProcessor {
    fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    fn process_frame(&self, frame: &StackFrame) -> (StackFrame, FrameExtras) {
        let mut processed = frame.clone();
        processed.function_name = demangle_java_name(&frame.function_name, &frame.lib_type);
        (processed, FrameExtras::default())
    }

    fn should_skip_frame(
        &self,
        frame: &StackFrame,
        _extras: &FrameExtras,
        _value: f64,
        _scratch: &mut StackScratch,
    ) -> bool {
        frame.function_name.contains("Interpreter")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::FlameNode;

    #[test]
    fn test_java_naming() {
        let cases = [
            (
                "Ljava/util/concurrent/Executors$RunnableAdapter;::call",
                "jit",
                "java.util.concurrent.Executors$RunnableAdapter::call",
            ),
            (
                "Ljava/util/concurrent/Executors$RunnableAdapter;::call",
                "inlined",
                "java.util.concurrent.Executors$RunnableAdapter::call",
            ),
            (
                "Ljava/util/concurrent/FutureTask;::run",
                "inlined",
                "java.util.concurrent.FutureTask::run",
            ),
            (
                "Lcom/netflix/napa/SearchService$$EnhancerBySpringCGLIB$$65a2ea77;::searchNapa",
                "jit",
                "com.netflix.napa.SearchService::searchNapa",
            ),
            (
                "Lio/grpc/stub/ServerCalls$UnaryServerCallHandler$UnaryServerCallListener;::onHalfClose",
                "jit",
                "io.grpc.stub.ServerCalls$UnaryServerCallHandler$UnaryServerCallListener::onHalfClose",
            ),
            (
                "Lcom/netflix/springboot/sso/grpcextensions/GrpcContextAspect$$Lambda$2611/1287052643;::call",
                "inlined",
                "com.netflix.springboot.sso.grpcextensions.GrpcContextAspect::call",
            ),
        ];

        let processor = JavaStackProcessor::default();
        for (input, lib_type, expected) in cases {
            let (processed, _) = processor.process_frame(&StackFrame::new(input, lib_type));
            assert_eq!(processed.function_name, expected, "input: {}", input);
            assert_eq!(processed.lib_type, lib_type);
        }
    }

    #[test]
    fn test_descriptor_marker_only_stripped_for_jit_code() {
        assert_eq!(demangle_java_name("Lfoo/Bar;::baz", "user"), "Lfoo.Bar::baz");
        assert_eq!(demangle_java_name("libjvm.so", "user"), "libjvm.so");
    }

    #[test]
    fn test_interpreter_frames_are_skipped() {
        let processor = JavaStackProcessor::default();
        let mut root = FlameNode::root();
        let stack = vec![
            StackFrame::new("Ljava/lang/Thread;::run", "jit"),
            StackFrame::new("Interpreter", "user"),
            StackFrame::new("Lcom/acme/Worker;::work", "jit"),
        ];

        processor.process(&mut root, &stack, 1.0);

        let thread = root.find_child("java.lang.Thread::run").unwrap();
        assert_eq!(thread.children.len(), 1);
        assert_eq!(thread.children[0].name, "com.acme.Worker::work");
    }
}
