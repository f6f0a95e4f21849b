//! # Instructions
//!
//! Every instruction is 16 bits, stored big-endian. The top nibble selects the family and the
//! remaining 12 bits are split per family into:
//! - `x`   `[_x__]` a register index
//! - `y`   `[__y_]` a register index
//! - `n`   `[___n]` a 4-bit immediate
//! - `kk`  `[__kk]` an 8-bit immediate
//! - `nnn` `[_nnn]` a 12-bit address
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 0nnn
    Sys(u16),
    /// 1nnn
    Jp(u16),
    /// 2nnn
    Call(u16),
    /// 3xkk
    SeImm(u8, u8),
    /// 4xkk
    SneImm(u8, u8),
    /// 5xy0
    SeReg(u8, u8),
    /// 6xkk
    LdImm(u8, u8),
    /// 7xkk
    AddImm(u8, u8),
    /// 8xy0
    LdReg(u8, u8),
    /// 8xy1
    Or(u8, u8),
    /// 8xy2
    And(u8, u8),
    /// 8xy3
    Xor(u8, u8),
    /// 8xy4
    AddReg(u8, u8),
    /// 8xy5
    Sub(u8, u8),
    /// 8xy6
    Shr(u8, u8),
    /// 8xy7
    Subn(u8, u8),
    /// 8xyE
    Shl(u8, u8),
    /// 9xy0
    SneReg(u8, u8),
    /// Annn
    LdI(u16),
    /// Bnnn
    JpV0(u16),
    /// Cxkk
    Rnd(u8, u8),
    /// Dxyn
    Drw(u8, u8, u8),
    /// Ex9E
    Skp(u8),
    /// ExA1
    Sknp(u8),
    /// Fx07
    LdVxDt(u8),
    /// Fx0A
    LdVxKey(u8),
    /// Fx15
    LdDtVx(u8),
    /// Fx18
    LdStVx(u8),
    /// Fx1E
    AddI(u8),
    /// Fx29
    LdFont(u8),
    /// Fx33
    LdBcd(u8),
    /// Fx55
    StoreRegs(u8),
    /// Fx65
    LoadRegs(u8),
}

impl Instruction {
    /// Decode a raw word, or `None` if no instruction matches it
    pub fn decode(raw: u16) -> Option<Self> {
        use Instruction::*;

        let family = (raw >> 12) as u8;
        let x = ((raw & 0x0F00) >> 8) as u8;
        let y = ((raw & 0x00F0) >> 4) as u8;
        let n = (raw & 0x000F) as u8;
        let kk = (raw & 0x00FF) as u8;
        let nnn = raw & 0x0FFF;

        let instruction = match (family, n) {
            (0x0, _) => match nnn {
                0x0E0 => Cls,
                0x0EE => Ret,
                _ => Sys(nnn),
            },
            (0x1, _) => Jp(nnn),
            (0x2, _) => Call(nnn),
            (0x3, _) => SeImm(x, kk),
            (0x4, _) => SneImm(x, kk),
            (0x5, 0x0) => SeReg(x, y),
            (0x6, _) => LdImm(x, kk),
            (0x7, _) => AddImm(x, kk),
            (0x8, 0x0) => LdReg(x, y),
            (0x8, 0x1) => Or(x, y),
            (0x8, 0x2) => And(x, y),
            (0x8, 0x3) => Xor(x, y),
            (0x8, 0x4) => AddReg(x, y),
            (0x8, 0x5) => Sub(x, y),
            (0x8, 0x6) => Shr(x, y),
            (0x8, 0x7) => Subn(x, y),
            (0x8, 0xE) => Shl(x, y),
            (0x9, 0x0) => SneReg(x, y),
            (0xA, _) => LdI(nnn),
            (0xB, _) => JpV0(nnn),
            (0xC, _) => Rnd(x, kk),
            (0xD, _) => Drw(x, y, n),
            (0xE, _) => match kk {
                0x9E => Skp(x),
                0xA1 => Sknp(x),
                _ => return None,
            },
            (0xF, _) => match kk {
                0x07 => LdVxDt(x),
                0x0A => LdVxKey(x),
                0x15 => LdDtVx(x),
                0x18 => LdStVx(x),
                0x1E => AddI(x),
                0x29 => LdFont(x),
                0x33 => LdBcd(x),
                0x55 => StoreRegs(x),
                0x65 => LoadRegs(x),
                _ => return None,
            },
            _ => return None,
        };
        Some(instruction)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Sys(nnn) => write!(f, "SYS {:#05x}", nnn),
            Jp(nnn) => write!(f, "JP {:#05x}", nnn),
            Call(nnn) => write!(f, "CALL {:#05x}", nnn),
            SeImm(x, kk) => write!(f, "SE V{:X}, {:#04x}", x, kk),
            SneImm(x, kk) => write!(f, "SNE V{:X}, {:#04x}", x, kk),
            SeReg(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            LdImm(x, kk) => write!(f, "LD V{:X}, {:#04x}", x, kk),
            AddImm(x, kk) => write!(f, "ADD V{:X}, {:#04x}", x, kk),
            LdReg(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Or(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            And(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            Shr(x, y) => write!(f, "SHR V{:X}, V{:X}", x, y),
            Subn(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Shl(x, y) => write!(f, "SHL V{:X}, V{:X}", x, y),
            SneReg(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            LdI(nnn) => write!(f, "LD I, {:#05x}", nnn),
            JpV0(nnn) => write!(f, "JP V0, {:#05x}", nnn),
            Rnd(x, kk) => write!(f, "RND V{:X}, {:#04x}", x, kk),
            Drw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Skp(x) => write!(f, "SKP V{:X}", x),
            Sknp(x) => write!(f, "SKNP V{:X}", x),
            LdVxDt(x) => write!(f, "LD V{:X}, DT", x),
            LdVxKey(x) => write!(f, "LD V{:X}, K", x),
            LdDtVx(x) => write!(f, "LD DT, V{:X}", x),
            LdStVx(x) => write!(f, "LD ST, V{:X}", x),
            AddI(x) => write!(f, "ADD I, V{:X}", x),
            LdFont(x) => write!(f, "LD F, V{:X}", x),
            LdBcd(x) => write!(f, "LD B, V{:X}", x),
            StoreRegs(x) => write!(f, "LD [I], V{:X}", x),
            LoadRegs(x) => write!(f, "LD V{:X}, [I]", x),
        }
    }
}

/// One decoded slot of a program listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    /// A full word, with its instruction if it decodes to one
    Word {
        addr: u16,
        raw: u16,
        instruction: Option<Instruction>,
    },
    /// A trailing odd byte
    Byte { addr: u16, value: u8 },
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Listing::Word {
                addr,
                raw,
                instruction: Some(instruction),
            } => write!(f, "{:#05x}: {:04X}  {}", addr, raw, instruction),
            Listing::Word {
                addr,
                raw,
                instruction: None,
            } => write!(f, "{:#05x}: {:04X}  DW {:#06x}", addr, raw, raw),
            Listing::Byte { addr, value } => {
                write!(f, "{:#05x}: {:02X}    DB {:#04x}", addr, value, value)
            }
        }
    }
}

/// Walk `bytes` two at a time as if they were loaded at `origin`
pub fn disassemble(bytes: &[u8], origin: u16) -> Vec<Listing> {
    let mut listing = Vec::with_capacity(bytes.len() / 2 + 1);
    let mut chunks = bytes.chunks_exact(2);
    let mut addr = origin;
    for word in &mut chunks {
        let raw = (word[0] as u16) << 8 | word[1] as u16;
        listing.push(Listing::Word {
            addr,
            raw,
            instruction: Instruction::decode(raw),
        });
        addr = addr.wrapping_add(2);
    }
    if let [value] = chunks.remainder() {
        listing.push(Listing::Byte {
            addr,
            value: *value,
        });
    }
    listing
}
