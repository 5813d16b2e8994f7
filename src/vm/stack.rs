//! Fixed-capacity value stack for the VM.

use zinc_core::{OverflowedStack, RuntimeError};

use super::Value;

/// The VM's operand stack.
///
/// Pushing past `limit` is a [`RuntimeError::StackOverflow`]. Reads return
/// `None` when out of range so the VM can report where it happened.
#[derive(Debug)]
pub struct ValueStack {
    values: Vec<Value>,
    limit: usize,
}

impl ValueStack {
    /// Create an empty stack holding at most `limit` values.
    pub fn new(limit: usize) -> Self {
        Self {
            values: Vec::with_capacity(limit.min(256)),
            limit,
        }
    }

    /// Push a value onto the stack.
    #[inline]
    pub fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.values.len() >= self.limit {
            return Err(RuntimeError::StackOverflow {
                stack: OverflowedStack::Values,
                limit: self.limit,
            });
        }
        self.values.push(value);
        Ok(())
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Value> {
        self.values.pop()
    }

    /// Get a value at an absolute index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Set a value at an absolute index.
    #[inline]
    pub fn set(&mut self, index: usize, value: Value) -> Option<()> {
        let slot = self.values.get_mut(index)?;
        *slot = value;
        Some(())
    }

    /// Remove the value at `index`, shifting everything above it down.
    pub fn remove(&mut self, index: usize) -> Option<Value> {
        (index < self.values.len()).then(|| self.values.remove(index))
    }

    /// Pop the top `n` values, deepest first.
    pub fn pop_n(&mut self, n: usize) -> Option<Vec<Value>> {
        let start = self.values.len().checked_sub(n)?;
        Some(self.values.drain(start..).collect())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Truncate the stack to the given size.
    #[inline]
    pub fn truncate(&mut self, size: usize) {
        self.values.truncate(size);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
