mod adapter;
mod display;
mod error;
mod instruction;
mod keypad;
mod memory;
mod registers;
mod stack;
mod stop;
mod timer;

use std::fmt::Display as FmtDisplay;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub use crate::adapter::{Adapter, Headless};
pub use crate::display::{Display, FrameBuffer};
pub use crate::error::Fault;
pub use crate::instruction::{disassemble, Instruction, Listing};
pub use crate::keypad::Keypad;
pub use crate::memory::{Memory, OutOfBounds};
pub use crate::registers::{Registers, VF};
pub use crate::stack::{Stack, StackError};
pub use crate::stop::StopToken;
pub use crate::timer::{Timer, TIMER_HZ};

use crate::error::ExecError;

pub const FONT_CHAR_LENGTH: usize = 5;

pub const FONT_DATA: [u8; FONT_CHAR_LENGTH * 0x10] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Programs don't write below `ROM_ADDR` by convention; nothing enforces it
pub const FONT_ADDR: usize = 0x000;

pub const MEM_SIZE: usize = 0x1000;
pub const ROM_ADDR: usize = 0x200;
pub const STACK_SIZE: usize = 0x10;
pub const REGISTER_COUNT: usize = 0x10;
pub const KEY_COUNT: usize = 0x10;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

#[derive(Debug, Clone)]
pub struct Config {
    /// Fixed pause after every instruction in `Chip8::run`
    pub cycle_delay: Duration,
    /// Rate of the timer threads, or `None` to only count down on `Chip8::tick_timers`
    pub timer_hz: Option<u32>,
    /// Treat `0nnn` as a jump rather than ignoring it
    pub sys_jump: bool,
    /// Log every executed instruction at trace level
    pub trace_operations: bool,
    /// Seed for `Cxkk`; a fresh OS seed is used when unset
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cycle_delay: Duration::from_millis(2),
            timer_hz: Some(TIMER_HZ),
            sys_jump: false,
            trace_operations: false,
            seed: None,
        }
    }
}

pub struct Chip8<A: Adapter> {
    config: Config,
    /// RAM that stores font data and the ROM, and is fully writeable
    memory: Memory,
    /// Everything outside the machine: screen, keyboard and speaker
    adapter: A,
    /// Return addresses for subroutine calls
    stack: Stack,
    /// 16 8-bit general-purpose variable registers numbered 0 through F hexadecimal
    v: Registers,
    /// The program counter points to the current instruction in memory
    pc: u16,
    /// The index register is used to point at locations in memory
    i: u16,
    dt: Timer,
    /// Counts down like the delay timer; a tone is requested when it's set from zero
    st: Timer,
    rng: StdRng,
    stop: StopToken,
}

impl<A: Adapter> Chip8<A> {
    pub fn new(adapter: A) -> anyhow::Result<Self> {
        Self::with_config(adapter, Config::default())
    }

    pub fn with_config(adapter: A, config: Config) -> anyhow::Result<Self> {
        let (dt, st) = match config.timer_hz {
            Some(hz) => (
                Timer::start("delay", hz).context("start delay timer")?,
                Timer::start("sound", hz).context("start sound timer")?,
            ),
            None => (Timer::manual("delay"), Timer::manual("sound")),
        };
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Chip8 {
            config,
            memory: Memory::with_font(),
            adapter,
            stack: Stack::new(),
            v: Registers::new(),
            pc: ROM_ADDR as u16,
            i: 0,
            dt,
            st,
            rng,
            stop: StopToken::new(),
        })
    }

    /* Config builder functions */
    pub fn cycle_delay(mut self, value: Duration) -> Self {
        self.config.cycle_delay = value;
        self
    }

    pub fn sys_jump(mut self, value: bool) -> Self {
        self.config.sys_jump = value;
        self
    }

    pub fn trace_operations(mut self, value: bool) -> Self {
        self.config.trace_operations = value;
        self
    }

    pub fn seed(mut self, value: u64) -> Self {
        self.config.seed = Some(value);
        self.rng = StdRng::seed_from_u64(value);
        self
    }

    pub fn load_rom(&mut self, rom: &[u8]) -> anyhow::Result<()> {
        self.memory
            .write(ROM_ADDR, rom)
            .context("write rom into memory")?;
        self.pc = ROM_ADDR as u16;
        info!("loaded {} byte rom at {:#05x}", rom.len(), ROM_ADDR);
        Ok(())
    }

    pub fn load_rom_from_file(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let buf = std::fs::read(path)
            .with_context(|| format!("read rom file {}", path.display()))?;
        self.load_rom(&buf).context("load rom from file")?;
        Ok(())
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn registers(&self) -> &Registers {
        &self.v
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn delay_timer(&self) -> u8 {
        self.dt.get()
    }

    pub fn sound_timer(&self) -> u8 {
        self.st.get()
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    /// A handle that stops `run` and releases a blocked key read from any thread
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Count both timers down once. Only useful when they were built without threads.
    pub fn tick_timers(&self) {
        self.dt.tick();
        self.st.tick();
    }

    /// Stop the run loop and both timer threads
    pub fn shutdown(&mut self) {
        self.stop.cancel();
        self.dt.stop();
        self.st.stop();
    }

    /// Execute instructions until the stop token is cancelled or a fault occurs
    pub fn run(&mut self) -> Result<(), Fault> {
        debug!("run loop started at {:#05x}", self.pc);
        while !self.stop.is_cancelled() {
            self.step()?;
            self.adapter
                .refresh()
                .map_err(|source| Fault::Adapter {
                    pc: self.pc,
                    source,
                })?;
            if !self.config.cycle_delay.is_zero() {
                thread::sleep(self.config.cycle_delay);
            }
        }
        debug!("run loop stopped at {:#05x}", self.pc);
        Ok(())
    }

    /// Fetch, decode and execute a single instruction
    pub fn step(&mut self) -> Result<(), Fault> {
        let pc = self.pc;
        let raw = self
            .memory
            .read_word(pc as usize)
            .map_err(|_| Fault::PcOutOfBounds { pc })?;
        let instruction = Instruction::decode(raw).ok_or(Fault::Decode { pc, raw })?;

        if self.config.trace_operations {
            trace!("{:#05x}: {:04X}  {}", pc, raw, instruction);
        }

        self.pc += 2;
        self.execute(instruction).map_err(|e| {
            // a faulted machine stays on the instruction that faulted
            self.pc = pc;
            let fault = e.at(pc, raw);
            debug!("halting: {}", fault);
            fault
        })
    }

    fn execute(&mut self, instruction: Instruction) -> Result<(), ExecError> {
        use Instruction::*;

        match instruction {
            Cls => self.op_cls(),
            Ret => self.op_sub_return()?,
            Sys(nnn) => self.op_sys(nnn),
            Jp(nnn) => self.op_jump(nnn),
            Call(nnn) => self.op_sub_call(nnn)?,
            SeImm(x, kk) => self.skip_if(self.v[x] == kk),
            SneImm(x, kk) => self.skip_if(self.v[x] != kk),
            SeReg(x, y) => self.skip_if(self.v[x] == self.v[y]),
            LdImm(x, kk) => self.v[x] = kk,
            AddImm(x, kk) => self.v[x] = self.v[x].wrapping_add(kk),
            LdReg(x, y) => self.v[x] = self.v[y],
            Or(x, y) => self.v[x] |= self.v[y],
            And(x, y) => self.v[x] &= self.v[y],
            Xor(x, y) => self.v[x] ^= self.v[y],
            AddReg(x, y) => self.op_reg_add(x, y),
            Sub(x, y) => self.op_reg_sub(x, y),
            Shr(x, y) => self.op_reg_shift_right(x, y),
            Subn(x, y) => self.op_reg_sub_reversed(x, y),
            Shl(x, y) => self.op_reg_shift_left(x, y),
            SneReg(x, y) => self.skip_if(self.v[x] != self.v[y]),
            LdI(nnn) => self.i = nnn,
            JpV0(nnn) => self.pc = nnn + self.v[0] as u16,
            Rnd(x, kk) => self.v[x] = self.rng.random::<u8>() & kk,
            Drw(x, y, n) => self.op_display(x, y, n)?,
            Skp(x) => {
                let pressed = self.adapter.is_key_pressed(self.v[x] & 0xF)?;
                self.skip_if(pressed)
            }
            Sknp(x) => {
                let pressed = self.adapter.is_key_pressed(self.v[x] & 0xF)?;
                self.skip_if(!pressed)
            }
            LdVxDt(x) => self.v[x] = self.dt.get(),
            LdVxKey(x) => self.op_get_key(x)?,
            LdDtVx(x) => self.dt.set(self.v[x]),
            LdStVx(x) => self.op_st_set(x),
            AddI(x) => self.i = self.i.wrapping_add(self.v[x] as u16),
            LdFont(x) => self.i = Memory::find_font_sprite_address(self.v[x]),
            LdBcd(x) => self.op_convert_to_decimal(x)?,
            StoreRegs(x) => self.memory.store(self.i as usize, self.v.range(x))?,
            LoadRegs(x) => {
                let bytes = self.memory.slice(self.i as usize, x as usize + 1)?;
                self.v.range_mut(x).copy_from_slice(bytes);
            }
        }
        Ok(())
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc += 2;
        }
    }

    /* Operations */

    /// 0x00E0
    fn op_cls(&mut self) {
        self.adapter.clear_screen();
    }

    /// 0x00EE
    fn op_sub_return(&mut self) -> Result<(), ExecError> {
        self.pc = self.stack.pop()?;
        Ok(())
    }

    /// 0x0NNN
    fn op_sys(&mut self, nnn: u16) {
        if self.config.sys_jump {
            self.pc = nnn;
        }
    }

    /// 0x1NNN
    fn op_jump(&mut self, nnn: u16) {
        self.pc = nnn;
    }

    /// 0x2NNN
    fn op_sub_call(&mut self, nnn: u16) -> Result<(), ExecError> {
        self.stack.push(self.pc)?;
        self.pc = nnn;
        Ok(())
    }

    /// 0x8XY4
    fn op_reg_add(&mut self, x: u8, y: u8) {
        let (sum, overflow) = self.v[x].overflowing_add(self.v[y]);
        self.v[x] = sum;
        self.v[VF] = overflow as u8;
    }

    /// 0x8XY5
    fn op_reg_sub(&mut self, x: u8, y: u8) {
        let (vx, vy) = (self.v[x], self.v[y]);
        self.v[x] = vx.wrapping_sub(vy);
        self.v[VF] = (vx > vy) as u8;
    }

    /// 0x8XY6, shifting Vy into Vx
    fn op_reg_shift_right(&mut self, x: u8, y: u8) {
        let vy = self.v[y];
        self.v[x] = vy >> 1;
        self.v[VF] = vy & 0x1;
    }

    /// 0x8XY7
    fn op_reg_sub_reversed(&mut self, x: u8, y: u8) {
        let (vx, vy) = (self.v[x], self.v[y]);
        self.v[x] = vy.wrapping_sub(vx);
        self.v[VF] = (vy > vx) as u8;
    }

    /// 0x8XYE, shifting Vy into Vx
    fn op_reg_shift_left(&mut self, x: u8, y: u8) {
        let vy = self.v[y];
        self.v[x] = vy << 1;
        self.v[VF] = (vy >> 7) & 0x1;
    }

    /// 0xDXYN
    fn op_display(&mut self, x: u8, y: u8, n: u8) -> Result<(), ExecError> {
        let (vx, vy) = (self.v[x], self.v[y]);
        self.v[VF] = 0;

        // fault before anything reaches the screen
        let rows = self.memory.slice(self.i as usize, n as usize)?;
        let mut collision = false;
        for (row, &sprite) in rows.iter().enumerate() {
            // 256 is a multiple of the screen height, so wrapping here keeps y mod 32 intact
            let y = vy.wrapping_add(row as u8);
            collision |= self.adapter.check_collision(sprite, vx, y);
            self.adapter.draw_sprite(sprite, vx, y);
        }
        self.v[VF] = collision as u8;
        Ok(())
    }

    /// 0xFX0A
    fn op_get_key(&mut self, x: u8) -> Result<(), ExecError> {
        match self.adapter.wait_for_input(&self.stop)? {
            Some(key) => self.v[x] = key & 0xF,
            // leave the PC on this instruction so it runs again if the machine resumes
            None => self.pc -= 2,
        }
        Ok(())
    }

    /// 0xFX18
    fn op_st_set(&mut self, x: u8) {
        let value = self.v[x];
        let previous = self.st.swap(value);
        if previous == 0 && value > 0 {
            debug!("tone for {} ticks", value);
            self.adapter.play_tone(value);
        }
    }

    /// 0xFX33
    fn op_convert_to_decimal(&mut self, x: u8) -> Result<(), ExecError> {
        let n = self.v[x];
        self.memory
            .store(self.i as usize, &[n / 100, n / 10 % 10, n % 10])?;
        Ok(())
    }
}

impl<A: Adapter> FmtDisplay for Chip8<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "PC={:#05x} I={:#05x} SP={} DT={} ST={}",
            self.pc,
            self.i,
            self.stack.depth(),
            self.dt.get(),
            self.st.get()
        )?;
        for (n, value) in self.v.as_array().iter().enumerate() {
            write!(f, "V{:X}={:02X} ", n, value)?;
        }
        writeln!(f)?;
        write!(f, "=== Memory ===\n{}", self.memory)
    }
}
