use crate::error::Frame;

/// Output of one run, and the calls active while it runs.
///
/// Program output is collected here instead of being written to the process
/// streams, so a caller decides where it goes. A fresh buffer is created for
/// every compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IoBuffer {
    /// Everything the program printed.
    pub stdout: String,
    /// Rendered diagnostics.
    pub stderr: String,
    frames:     Vec<Frame>,
}

impl IoBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends program output.
    pub fn print(&mut self, text: &str, newline: bool) {
        self.stdout.push_str(text);
        if newline {
            self.stdout.push('\n');
        }
    }

    /// Appends one diagnostic line to `stderr`.
    pub fn report(&mut self, text: &str) {
        self.stderr.push_str(text);
        self.stderr.push('\n');
    }

    /// Number of active calls.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// The active calls, most recent first.
    #[must_use]
    pub fn stack(&self) -> Vec<Frame> {
        self.frames.iter().rev().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::span::Span;

    #[test]
    fn print_modes_append() {
        let mut buffer = IoBuffer::new();
        buffer.print("a", false);
        buffer.print("b", true);
        buffer.print("c", false);
        assert_eq!(buffer.stdout, "ab\nc");
        assert!(buffer.stderr.is_empty());
    }

    #[test]
    fn stack_lists_most_recent_call_first() {
        let mut buffer = IoBuffer::new();
        for name in ["outer", "inner"] {
            buffer.push_frame(Frame { name: name.to_string(),
                                      span: Span::default(), });
        }
        let names = buffer.stack().into_iter().map(|f| f.name).collect::<Vec<_>>();
        assert_eq!(names, ["inner", "outer"]);
        buffer.pop_frame();
        assert_eq!(buffer.depth(), 1);
    }
}
