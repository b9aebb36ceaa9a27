use super::{CompileError, REGISTER_COUNT};

const SCRATCH_COUNT: usize = REGISTER_COUNT - 1;

/// Tracks which scratch registers (`r1..`) are held by the compiler.
///
/// `r0` is the accumulator and is never handed out. Callers release registers
/// in LIFO order per subtree; the allocator itself only enforces that a
/// register is not released twice.
#[derive(Debug, Clone, Default)]
pub struct RegisterAllocator {
    in_use: [bool; SCRATCH_COUNT],
}

impl RegisterAllocator {
    pub fn new() -> Self {
        RegisterAllocator::default()
    }

    /// Claim the lowest free scratch register.
    pub fn alloc(&mut self) -> Result<u8, CompileError> {
        let slot = self.in_use.iter().position(|used| !used).ok_or(CompileError::RegistersExhausted)?;
        self.in_use[slot] = true;
        Ok(slot as u8 + 1)
    }

    pub fn free(&mut self, register: u8) -> Result<(), CompileError> {
        let held = (register as usize)
            .checked_sub(1)
            .and_then(|slot| self.in_use.get_mut(slot))
            .filter(|used| **used);
        match held {
            Some(used) => {
                *used = false;
                Ok(())
            }
            None => Err(CompileError::DoubleFree { register }),
        }
    }

    /// Registers currently held, ascending.
    pub fn in_use(&self) -> Vec<u8> {
        self.in_use
            .iter()
            .enumerate()
            .filter(|(_, used)| **used)
            .map(|(slot, _)| slot as u8 + 1)
            .collect()
    }

    pub fn is_clear(&self) -> bool {
        !self.in_use.contains(&true)
    }
}
