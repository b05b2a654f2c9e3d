//! Execution of decoded instructions.

use super::{Callback, Error, Simulator};
use crate::constants;
use crate::instr::{DecodeError, Imm, Instruction};
use crate::isa::{self, Op};

// Operand values fetched before execution. Slots the instruction does not
// carry stay zero and are never inspected by its handler.
#[derive(Default)]
struct OpVals {
    a: u16,
    b: u16,
    c: u16,
    d: u16,
}

impl<'a> Simulator<'a> {
    /// Run a single instruction: fetch the word at PC, decode, advance PC
    /// past the instruction word and execute. The PC moves past the
    /// immediate word afterwards unless the instruction redirected it;
    /// this also applies to instructions skipped by their predicate.
    pub fn tick(&mut self, cb: &mut dyn Callback) -> Result<(), Error> {
        let instr = self.fetch()?;

        if self.trace {
            println!("RUN     0x{:04x}    {}", self.pc, instr.text(self.isa));
        }

        // The PC is updated before the instruction executes due to the
        // pipeline in the RTL.
        self.pc = self.pc.wrapping_add(1);

        let redirect = if self.check_run(&instr)? {
            self.execute(&instr, cb)?
        } else {
            if self.trace {
                let pred = instr.ops.p.unwrap_or(constants::PT);
                println!("SKIP    {}", isa::preg_name(pred));
            }

            false
        };

        // A skipped or fall-through instruction still consumes its
        // immediate word.
        if !redirect {
            self.pc = self.pc.wrapping_add(instr.size() - 1);
        }

        Ok(())
    }

    // Fetch and decode the instruction at the current PC. The successor
    // word is only demanded when the encoding calls for an immediate.
    fn fetch(&self) -> Result<Instruction, Error> {
        let word = self.fetch_word(self.pc)?;
        let next_pc = self.pc.wrapping_add(1);
        let next = self.mem[next_pc as usize].map(u16::swap_bytes);

        Instruction::decode(self.isa, word, next).map_err(|err| match err {
            DecodeError::TruncatedImmediate => Error::UninitializedMem(next_pc),
            other => Error::Decode(other),
        })
    }

    fn fetch_word(&self, addr: u16) -> Result<u16, Error> {
        self.mem[addr as usize]
            .map(u16::swap_bytes)
            .ok_or(Error::UninitializedMem(addr))
    }

    // Whether the instruction should execute. Branches and jumps on a
    // false predicate negate the condition before the check.
    fn check_run(&self, instr: &Instruction) -> Result<bool, Error> {
        let pred = match instr.ops.p {
            // Non-predicated instructions always run.
            None => return Ok(true),
            Some(pred) => pred,
        };

        let mut value = self.pregs[pred as usize].ok_or(Error::UninitializedPreg(pred))?;

        if matches!(instr.op, Op::Bf | Op::Blf | Op::Jf | Op::Jlf) {
            value = !value;
        }

        Ok(value)
    }

    // Fetch the operand values an instruction reads. Slot a is only read
    // by the read-modify-write instructions, c substitutes the immediate
    // when encoded as the escape value, and d is the encoded mask itself.
    fn operand_values(&self, instr: &Instruction) -> Result<OpVals, Error> {
        let mut vals = OpVals::default();

        if matches!(instr.op, Op::Push | Op::Pop) {
            vals.d = match instr.ops.d {
                Some(mask) => u16::from(mask),
                // Classic encoding: the a..b register pair names the mask.
                None => {
                    let lo = instr.ops.a.unwrap_or(0);
                    let hi = instr.ops.b.unwrap_or(0);
                    pair_mask(lo, hi)
                }
            };

            return Ok(vals);
        }

        if let Some(a) = instr.ops.a {
            if isa::reads_a(instr.op) {
                vals.a = self.read_greg(a)?;
            }
        }

        if let Some(b) = instr.ops.b {
            vals.b = self.read_greg(b)?;
        }

        if let Some(c) = instr.ops.c {
            vals.c = if c == constants::IMM_ESCAPE {
                match &instr.ops.imm {
                    Some(Imm::Value(value)) => *value as u16,
                    Some(Imm::Ref(reference)) => {
                        return Err(Error::UnresolvedImmediate(reference.clone()))
                    }
                    None => return Err(Error::Decode(DecodeError::TruncatedImmediate)),
                }
            } else {
                self.read_greg(c)?
            };
        }

        Ok(vals)
    }

    // Execute one instruction, returning whether it redirected the PC.
    fn execute(&mut self, instr: &Instruction, cb: &mut dyn Callback) -> Result<bool, Error> {
        let vals = self.operand_values(instr)?;

        match instr.op {
            Op::Nop => Ok(false),

            Op::Beqz | Op::Bnez | Op::Bltz | Op::Blez | Op::Bgtz | Op::Bgez => {
                self.branch_reg(instr, &vals)
            }

            Op::Eq
            | Op::Ne
            | Op::Lt
            | Op::Ltu
            | Op::Ge
            | Op::Geu
            | Op::Eqz
            | Op::Nez
            | Op::Ltz
            | Op::Lez
            | Op::Gtz
            | Op::Gez => self.compare(instr, &vals, cb),

            Op::Putp | Op::Putpf | Op::Putpt => self.putp(instr, &vals, cb),

            Op::Srl | Op::Sra | Op::Ror | Op::Sll => self.shift(instr, &vals, cb),

            Op::LdPre | Op::StPre | Op::LdPost | Op::StPost | Op::Ld | Op::St => {
                self.ld_st(instr, &vals, cb)
            }

            Op::Push => self.push(instr, &vals, cb),
            Op::Pop => self.pop(instr, &vals, cb),

            Op::Extbl | Op::Extbh => self.ext(instr, &vals, cb),
            Op::Insbl | Op::Insbh => self.ins(instr, &vals, cb),

            Op::Not | Op::And | Op::Andn | Op::Or | Op::Xor => self.logic(instr, &vals, cb),

            Op::Neg | Op::Inc | Op::Dec | Op::Add | Op::Sub | Op::Mov | Op::Addpc => {
                self.add_sub(instr, &vals, cb)
            }

            Op::Urxb | Op::Urx => self.uart_rx(instr, cb),
            Op::Utxb | Op::Utx => self.uart_tx(instr, &vals, cb),

            Op::Bt | Op::Bf | Op::Blt | Op::Blf | Op::Jt | Op::Jf | Op::Jlt | Op::Jlf => {
                self.branch_pred(instr, &vals, cb)
            }
        }
    }

    // ADD/SUB are used to synthesise a number of other operations.
    fn add_sub(
        &mut self,
        instr: &Instruction,
        vals: &OpVals,
        cb: &mut dyn Callback,
    ) -> Result<bool, Error> {
        let lhs = match instr.op {
            Op::Neg | Op::Mov => 0,
            Op::Inc | Op::Dec => vals.a,
            Op::Addpc => self.pc,
            _ => vals.b,
        };

        let rhs = match instr.op {
            Op::Inc | Op::Dec => 1,
            Op::Neg => vals.b,
            _ => vals.c,
        };

        let value = if matches!(instr.op, Op::Sub | Op::Neg | Op::Dec) {
            lhs.wrapping_sub(rhs)
        } else {
            lhs.wrapping_add(rhs)
        };

        self.write_greg(cb, instr.ops.a.unwrap_or(0), value)?;

        Ok(false)
    }

    fn logic(
        &mut self,
        instr: &Instruction,
        vals: &OpVals,
        cb: &mut dyn Callback,
    ) -> Result<bool, Error> {
        // NOT is OR with zero and a complemented source.
        let (lhs, mut rhs) = if instr.op == Op::Not {
            (0, vals.b)
        } else {
            (vals.b, vals.c)
        };

        if matches!(instr.op, Op::Not | Op::Andn) {
            rhs = !rhs;
        }

        let value = match instr.op {
            Op::And | Op::Andn => lhs & rhs,
            Op::Xor => lhs ^ rhs,
            _ => lhs | rhs,
        };

        self.write_greg(cb, instr.ops.a.unwrap_or(0), value)?;

        Ok(false)
    }

    fn shift(
        &mut self,
        instr: &Instruction,
        vals: &OpVals,
        cb: &mut dyn Callback,
    ) -> Result<bool, Error> {
        let amount = vals.c & constants::SHIFT_MASK;

        let value = match instr.op {
            Op::Srl => vals.b >> amount,
            Op::Sra => ((vals.b as i16) >> amount) as u16,
            Op::Ror => vals.b.rotate_right(u32::from(amount)),
            _ => vals.b << amount,
        };

        self.write_greg(cb, instr.ops.a.unwrap_or(0), value)?;

        Ok(false)
    }

    // Compare register with another register or zero.
    fn compare(
        &mut self,
        instr: &Instruction,
        vals: &OpVals,
        cb: &mut dyn Callback,
    ) -> Result<bool, Error> {
        let lhs = vals.b;
        let rhs = match instr.op {
            Op::Eqz | Op::Nez | Op::Ltz | Op::Lez | Op::Gtz | Op::Gez => 0,
            _ => vals.c,
        };

        let value = match instr.op {
            Op::Eq | Op::Eqz => lhs == rhs,
            Op::Ne | Op::Nez => lhs != rhs,
            Op::Ltu => lhs < rhs,
            Op::Geu => lhs >= rhs,
            Op::Lt | Op::Ltz => (lhs as i16) < (rhs as i16),
            Op::Lez => (lhs as i16) <= (rhs as i16),
            Op::Gtz => (lhs as i16) > (rhs as i16),
            _ => (lhs as i16) >= (rhs as i16),
        };

        self.write_preg(cb, instr.ops.q.unwrap_or(0), value)?;

        Ok(false)
    }

    // Write a value into a predicate register.
    fn putp(
        &mut self,
        instr: &Instruction,
        vals: &OpVals,
        cb: &mut dyn Callback,
    ) -> Result<bool, Error> {
        let value = match instr.op {
            Op::Putpt => true,
            Op::Putpf => false,
            _ => vals.b >> (vals.c & constants::SHIFT_MASK) & 1 != 0,
        };

        self.write_preg(cb, instr.ops.q.unwrap_or(0), value)?;

        Ok(false)
    }

    // Extract and sign extend the high or low byte.
    fn ext(
        &mut self,
        instr: &Instruction,
        vals: &OpVals,
        cb: &mut dyn Callback,
    ) -> Result<bool, Error> {
        let byte = if instr.op == Op::Extbl {
            vals.b as u8
        } else {
            (vals.b >> 8) as u8
        };

        self.write_greg(cb, instr.ops.a.unwrap_or(0), byte as i8 as i16 as u16)?;

        Ok(false)
    }

    // Insert the low byte of B into the high or low byte of A.
    fn ins(
        &mut self,
        instr: &Instruction,
        vals: &OpVals,
        cb: &mut dyn Callback,
    ) -> Result<bool, Error> {
        let value = if instr.op == Op::Insbl {
            (vals.a & 0xff00) | (vals.b & 0x00ff)
        } else {
            (vals.a & 0x00ff) | (vals.b << 8)
        };

        self.write_greg(cb, instr.ops.a.unwrap_or(0), value)?;

        Ok(false)
    }

    // Branch based on register comparison with zero.
    fn branch_reg(&mut self, instr: &Instruction, vals: &OpVals) -> Result<bool, Error> {
        let lhs = vals.b as i16;

        let taken = match instr.op {
            Op::Beqz => lhs == 0,
            Op::Bnez => lhs != 0,
            Op::Bltz => lhs < 0,
            Op::Blez => lhs <= 0,
            Op::Bgtz => lhs > 0,
            _ => lhs >= 0,
        };

        if taken {
            self.write_pc(self.pc.wrapping_add(vals.c));
        }

        Ok(taken)
    }

    // Branch or jump to a new PC based on predicate. The predicate has
    // already been checked by this stage so the PC can just be redirected.
    fn branch_pred(
        &mut self,
        instr: &Instruction,
        vals: &OpVals,
        cb: &mut dyn Callback,
    ) -> Result<bool, Error> {
        // The linking forms save the address of the next instruction; if
        // this instruction carries an immediate the PC must step past it.
        if matches!(instr.op, Op::Blt | Op::Blf | Op::Jlt | Op::Jlf) {
            let ret = self.pc.wrapping_add(instr.ops.imm.is_some() as u16);
            self.write_greg(cb, constants::LR, ret)?;
        }

        // Branches are PC relative while jumps are absolute.
        let base = match instr.op {
            Op::Bt | Op::Bf | Op::Blt | Op::Blf => self.pc,
            _ => 0,
        };

        self.write_pc(base.wrapping_add(vals.c));

        Ok(true)
    }

    // Load/store value from/to memory, optionally with writeback.
    fn ld_st(
        &mut self,
        instr: &Instruction,
        vals: &OpVals,
        cb: &mut dyn Callback,
    ) -> Result<bool, Error> {
        let pre = matches!(instr.op, Op::LdPre | Op::StPre);
        let post = matches!(instr.op, Op::LdPost | Op::StPost);
        let load = matches!(instr.op, Op::LdPre | Op::LdPost | Op::Ld);

        let a = instr.ops.a.unwrap_or(0);
        let b = instr.ops.b.unwrap_or(0);

        // Post-writeback accesses use the base before the update.
        let updated = vals.b.wrapping_add(vals.c);
        let addr = if post { vals.b } else { updated };

        if pre {
            self.write_greg(cb, b, updated)?;
        }

        if load {
            let value = self.load_mem(addr, cb)?;
            self.write_greg(cb, a, value)?;
        } else {
            // If the writeback address is the value being stored then it
            // should be visible to the store.
            let value = if pre && a == b { updated } else { vals.a };
            self.store_mem(addr, value, cb)?;
        }

        if post {
            self.write_greg(cb, b, updated)?;
        }

        Ok(false)
    }

    // PUSH registers onto the stack and update SP.
    fn push(
        &mut self,
        _instr: &Instruction,
        vals: &OpVals,
        cb: &mut dyn Callback,
    ) -> Result<bool, Error> {
        let mut sp = self.read_greg(constants::SP)?;

        for index in 0..constants::GREG_COUNT as u8 {
            if vals.d & (1 << index) != 0 {
                sp = sp.wrapping_sub(1);
                let value = self.read_greg(index)?;
                self.store_mem(sp, value, cb)?;
            }
        }

        self.write_greg(cb, constants::SP, sp)?;

        Ok(false)
    }

    // Reverse of push: load in descending order with post-increment.
    fn pop(
        &mut self,
        _instr: &Instruction,
        vals: &OpVals,
        cb: &mut dyn Callback,
    ) -> Result<bool, Error> {
        let mut sp = self.read_greg(constants::SP)?;

        for index in (0..constants::GREG_COUNT as u8).rev() {
            if vals.d & (1 << index) != 0 {
                let value = self.load_mem(sp, cb)?;
                self.write_greg(cb, index, value)?;
                sp = sp.wrapping_add(1);
            }
        }

        self.write_greg(cb, constants::SP, sp)?;

        Ok(false)
    }

    // Read bytes from the UART. Values are treated as unsigned; programs
    // sign extend afterwards if they need to.
    fn uart_rx(&mut self, instr: &Instruction, cb: &mut dyn Callback) -> Result<bool, Error> {
        let width = if instr.op == Op::Urxb { 1 } else { 2 };

        let value = cb.read_uart(width).map_err(Error::Callback)?;
        let value = if width == 1 { value & 0xff } else { value };

        if self.trace {
            if width == 1 {
                println!("URX     0x{:02x}", value);
            } else {
                println!("URX     0x{:04x}", value);
            }
        }

        self.write_greg(cb, instr.ops.a.unwrap_or(0), value)?;

        Ok(false)
    }

    // Write bytes to the UART.
    fn uart_tx(
        &mut self,
        instr: &Instruction,
        vals: &OpVals,
        cb: &mut dyn Callback,
    ) -> Result<bool, Error> {
        let width = if instr.op == Op::Utxb { 1 } else { 2 };
        let value = if width == 1 { vals.c & 0xff } else { vals.c };

        if self.trace {
            if width == 1 {
                println!("UTX     0x{:02x}", value);
            } else {
                println!("UTX     0x{:04x}", value);
            }
        }

        cb.write_uart(value, width).map_err(Error::Callback)?;

        Ok(false)
    }

    fn read_greg(&self, reg: u8) -> Result<u16, Error> {
        self.gregs[reg as usize].ok_or(Error::UninitializedGreg(reg))
    }

    fn write_greg(&mut self, cb: &mut dyn Callback, reg: u8, value: u16) -> Result<(), Error> {
        cb.write_greg(reg, value).map_err(Error::Callback)?;

        if self.trace {
            println!("GREG    {}        0x{:04x}", isa::greg_name(reg), value);
        }

        self.gregs[reg as usize] = Some(value);

        Ok(())
    }

    fn write_preg(&mut self, cb: &mut dyn Callback, reg: u8, value: bool) -> Result<(), Error> {
        // Writes to pt are ignored.
        if reg == constants::PT {
            return Ok(());
        }

        cb.write_preg(reg, value).map_err(Error::Callback)?;

        if self.trace {
            println!("PREG    {}        0x{}", isa::preg_name(reg), value as u8);
        }

        self.pregs[reg as usize] = Some(value);

        Ok(())
    }

    fn write_pc(&mut self, value: u16) {
        if self.trace {
            println!("BRANCH  0x{:04x}", value);
        }

        self.pc = value;
    }

    // Store a word, swapping to the byte order of the medium. Callbacks
    // and the trace see the swapped bus value.
    fn store_mem(&mut self, addr: u16, value: u16, cb: &mut dyn Callback) -> Result<(), Error> {
        let swapped = value.swap_bytes();

        cb.write_mem(addr, swapped).map_err(Error::Callback)?;

        if self.trace {
            println!("STORE   0x{:04x}    0x{:04x}", addr, swapped);
        }

        self.mem[addr as usize] = Some(swapped);

        Ok(())
    }

    // Load a word, swapping back to the architectural value.
    fn load_mem(&mut self, addr: u16, cb: &mut dyn Callback) -> Result<u16, Error> {
        let stored = self.mem[addr as usize].ok_or(Error::UninitializedMem(addr))?;

        cb.read_mem(addr, stored).map_err(Error::Callback)?;

        if self.trace {
            println!("LOAD    0x{:04x}    0x{:04x}", addr, stored);
        }

        Ok(stored.swap_bytes())
    }
}

// Mask selected by a classic-encoding register pair.
fn pair_mask(lo: u8, hi: u8) -> u16 {
    if lo > hi {
        return 0;
    }

    let mut mask = 0;
    for index in lo..=hi {
        mask |= 1 << index;
    }

    mask
}
