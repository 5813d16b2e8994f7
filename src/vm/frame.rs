//! Call frames for the VM.

use zinc_core::{OverflowedStack, RuntimeError};

/// One activation on the VM's call stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallFrame {
    /// Stack index of local slot 0. The stack is cut back to here on return.
    pub base: usize,
    /// Where execution continues in the caller.
    pub return_ip: usize,
}

/// Fixed-capacity call-frame stack.
#[derive(Debug)]
pub struct FrameStack {
    frames: Vec<CallFrame>,
    limit: usize,
}

impl FrameStack {
    pub fn new(limit: usize) -> Self {
        Self {
            frames: Vec::with_capacity(limit.min(64)),
            limit,
        }
    }

    /// Enter a frame; the top-level frame counts toward the limit.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), RuntimeError> {
        if self.frames.len() >= self.limit {
            return Err(RuntimeError::StackOverflow {
                stack: OverflowedStack::Frames,
                limit: self.limit,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<CallFrame> {
        self.frames.pop()
    }

    /// The active frame.
    pub fn current(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    /// Number of active frames, including the top-level one.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_is_bounded() {
        let mut frames = FrameStack::new(2);
        let frame = CallFrame {
            base: 0,
            return_ip: 0,
        };
        frames.push(frame).unwrap();
        frames.push(frame).unwrap();
        assert!(frames.push(frame).unwrap_err().is_stack_overflow());
        assert_eq!(frames.depth(), 2);
    }
}
