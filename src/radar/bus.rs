//! Trait abstraction for the radar register interface to enable testing

use std::io;

/// Register-level access to the radar module
///
/// Both operations are synchronous bus transactions on 32-bit registers.
#[cfg_attr(test, mockall::automock)]
pub trait RegisterBus {
    /// Read a 32-bit register
    fn read_register(&mut self, addr: u16) -> io::Result<u32>;

    /// Write a 32-bit register
    fn write_register(&mut self, addr: u16, value: u32) -> io::Result<()>;
}

#[cfg(test)]
pub mod fakes {
    use super::*;
    use std::collections::HashMap;

    use crate::radar::registers::*;

    /// Register-file fake of the radar module
    ///
    /// Behaves like the device for the handshake: writing a command sets the
    /// busy bit for `busy_polls` status reads, and every write is recorded.
    #[derive(Debug, Default)]
    pub struct FakeRadar {
        pub registers: HashMap<u16, u32>,
        pub writes: Vec<(u16, u32)>,
        pub reads: Vec<u16>,
        pub busy_polls: u32,
        pub busy_remaining: u32,
        pub reject_writes_to: Option<u16>,
        pub fail_reads: bool,
    }

    impl FakeRadar {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set(&mut self, addr: u16, value: u32) {
            self.registers.insert(addr, value);
        }

        pub fn commands(&self) -> Vec<u32> {
            self.writes
                .iter()
                .filter(|(addr, _)| *addr == REG_COMMAND)
                .map(|(_, value)| *value)
                .collect()
        }
    }

    impl RegisterBus for FakeRadar {
        fn read_register(&mut self, addr: u16) -> io::Result<u32> {
            if self.fail_reads {
                return Err(io::Error::new(io::ErrorKind::Other, "Fake read error"));
            }
            self.reads.push(addr);

            let mut value = self.registers.get(&addr).copied().unwrap_or(0);
            if addr == REG_DETECTOR_STATUS && self.busy_remaining > 0 {
                self.busy_remaining -= 1;
                value |= STATUS_BUSY;
            }
            Ok(value)
        }

        fn write_register(&mut self, addr: u16, value: u32) -> io::Result<()> {
            if self.reject_writes_to == Some(addr) {
                return Err(io::Error::new(io::ErrorKind::Other, "Fake write error"));
            }
            self.writes.push((addr, value));
            if addr == REG_COMMAND {
                self.busy_remaining = self.busy_polls;
            }
            Ok(())
        }
    }
}
