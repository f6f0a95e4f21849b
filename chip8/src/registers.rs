use std::ops::{Index, IndexMut};

use crate::REGISTER_COUNT;

/// The flag register, overwritten as a side effect of carry, borrow, shift and collision
pub const VF: u8 = 0xF;

/// The general purpose registers V0 through VF, indexed by the 4-bit register nibble
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers([u8; REGISTER_COUNT]);

impl Index<u8> for Registers {
    type Output = u8;

    fn index(&self, register: u8) -> &Self::Output {
        &self.0[(register & 0xF) as usize]
    }
}

impl IndexMut<u8> for Registers {
    fn index_mut(&mut self, register: u8) -> &mut Self::Output {
        &mut self.0[(register & 0xF) as usize]
    }
}

impl Registers {
    pub fn new() -> Self {
        Self([0; REGISTER_COUNT])
    }

    /// V0 through Vx inclusive
    pub fn range(&self, x: u8) -> &[u8] {
        &self.0[..=(x & 0xF) as usize]
    }

    pub fn range_mut(&mut self, x: u8) -> &mut [u8] {
        &mut self.0[..=(x & 0xF) as usize]
    }

    pub fn as_array(&self) -> &[u8; REGISTER_COUNT] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Registers, VF};

    #[test]
    fn test_index() {
        let mut v = Registers::new();
        v[0xA] = 2;
        v[VF] = 1;
        assert_eq!(v[0xA], 2);
        assert_eq!(v.as_array()[0xF], 1);
        assert_eq!(v.range(0xA).len(), 11);
    }
}
