use thiserror::Error;

use crate::memory::OutOfBounds;
use crate::stack::StackError;

/// A fatal condition raised while executing an instruction. Emulation halts on any of these.
#[derive(Debug, Error)]
pub enum Fault {
    #[error("unknown instruction {raw:#06x} at {pc:#05x}")]
    Decode { pc: u16, raw: u16 },
    #[error("call stack overflow executing {raw:#06x} at {pc:#05x}")]
    StackOverflow { pc: u16, raw: u16 },
    #[error("return with empty call stack executing {raw:#06x} at {pc:#05x}")]
    StackUnderflow { pc: u16, raw: u16 },
    #[error("memory access at {addr:#06x} out of bounds executing {raw:#06x} at {pc:#05x}")]
    Bounds { pc: u16, raw: u16, addr: usize },
    #[error("program counter {pc:#06x} is outside of memory")]
    PcOutOfBounds { pc: u16 },
    #[error("adapter failed at {pc:#05x}")]
    Adapter {
        pc: u16,
        #[source]
        source: anyhow::Error,
    },
}

impl Fault {
    /// Address of the instruction that faulted
    pub fn pc(&self) -> u16 {
        match self {
            Fault::Decode { pc, .. }
            | Fault::StackOverflow { pc, .. }
            | Fault::StackUnderflow { pc, .. }
            | Fault::Bounds { pc, .. }
            | Fault::PcOutOfBounds { pc }
            | Fault::Adapter { pc, .. } => *pc,
        }
    }
}

/// What can go wrong inside a single operation, before the PC and raw word are attached
#[derive(Debug, Error)]
pub(crate) enum ExecError {
    #[error(transparent)]
    Stack(#[from] StackError),
    #[error(transparent)]
    Memory(#[from] OutOfBounds),
    #[error(transparent)]
    Adapter(#[from] anyhow::Error),
}

impl ExecError {
    pub(crate) fn at(self, pc: u16, raw: u16) -> Fault {
        match self {
            ExecError::Stack(StackError::Overflow) => Fault::StackOverflow { pc, raw },
            ExecError::Stack(StackError::Underflow) => Fault::StackUnderflow { pc, raw },
            ExecError::Memory(OutOfBounds { addr }) => Fault::Bounds { pc, raw, addr },
            ExecError::Adapter(source) => Fault::Adapter { pc, source },
        }
    }
}
