use thiserror::Error;

use crate::STACK_SIZE;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    #[error("call stack overflow")]
    Overflow,
    #[error("return with empty call stack")]
    Underflow,
}

/// A stack for 16-bit return addresses, used to call subroutines and return from them
#[derive(Debug, Clone)]
pub struct Stack {
    frames: [u16; STACK_SIZE],
    /// Number of frames in use, which is also the index of the next free slot
    sp: usize,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            frames: [0; STACK_SIZE],
            sp: 0,
        }
    }

    pub fn push(&mut self, addr: u16) -> Result<(), StackError> {
        let slot = self.frames.get_mut(self.sp).ok_or(StackError::Overflow)?;
        *slot = addr;
        self.sp += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, StackError> {
        if self.sp == 0 {
            return Err(StackError::Underflow);
        }
        self.sp -= 1;
        Ok(self.frames[self.sp])
    }

    pub fn depth(&self) -> usize {
        self.sp
    }

    pub fn frames(&self) -> &[u16] {
        &self.frames[..self.sp]
    }
}
