//! The dispenser's line protocol.
//!
//! Commands go out as a single character followed by `\n`. The firmware
//! answers with free-text status lines in Portuguese, which are interpreted
//! into a [`SystemState`] and the three [`DisplayFields`].
//!
//! **Example** - Interpreting a status line:
//! ```
//! use dispenser_panel::protocol::{interpret, SystemState};
//!
//! let result = interpret("Repouso - pronto para uso");
//! assert_eq!(result.state, Some(SystemState::Ready));
//! assert_eq!(result.dispense_enabled(), Some(true));
//! ```

mod command;
mod interpreter;
mod model;

pub use command::Command;
pub use interpreter::{interpret, Interpretation};
pub use model::{DisplayFields, Field, FieldValue, Output, Position, Stock, SystemState, Tone};
