//! Types describing bus accesses requested by the cycle-stepped components.
//!
//! Components do not own a reference to the bus. Instead they raise a request on each step
//! (an address, a data byte and a [RwMode]) which the owner of the component resolves before
//! the next step.

/// Direction of the bus access requested for the current cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
pub enum RwMode {
    /// No bus access, e.g. an internal CPU cycle.
    #[default]
    None,
    Read,
    Write,
}

impl RwMode {
    pub fn is_read(self) -> bool {
        self == RwMode::Read
    }

    pub fn is_write(self) -> bool {
        self == RwMode::Write
    }
}
