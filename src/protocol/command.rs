//! Commands understood by the dispenser firmware.

use std::fmt;

/// A single-character command. On the wire each one is followed by `\n`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Command {
    Dispense,
    Status,
    Reset,
}
impl Command {
    pub fn as_char(self) -> char {
        match self {
            Command::Dispense => 'D',
            Command::Status => 'S',
            Command::Reset => 'R',
        }
    }

    /// The exact bytes written to the port.
    pub fn frame(self) -> [u8; 2] {
        [self.as_char() as u8, b'\n']
    }
}
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_newline_terminated() {
        assert_eq!(&Command::Dispense.frame(), b"D\n");
        assert_eq!(&Command::Status.frame(), b"S\n");
        assert_eq!(&Command::Reset.frame(), b"R\n");
    }
}
