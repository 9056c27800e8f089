/// Print-queue export present on most SMB servers.
pub const RESERVED_PRINT_SHARE: &str = "print$";

/// A top-level export advertised by an endpoint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ShareDescriptor {
    name: String,
    special: bool,
}

impl ShareDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, special: bool) -> Self {
        Self {
            name: name.into(),
            special,
        }
    }

    /// Share name as advertised by the endpoint.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the endpoint flags the share as administrative.
    #[must_use]
    pub const fn is_special(&self) -> bool {
        self.special
    }

    /// Only user-data shares are mirrored: not special and not the print share.
    #[must_use]
    pub fn is_mirrorable(&self) -> bool {
        !self.special && self.name != RESERVED_PRINT_SHARE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_share_is_mirrorable() {
        assert!(ShareDescriptor::new("EMMC Images", false).is_mirrorable());
    }

    #[test]
    fn special_and_print_shares_are_excluded() {
        assert!(!ShareDescriptor::new("IPC$", true).is_mirrorable());
        assert!(!ShareDescriptor::new("print$", false).is_mirrorable());
        assert!(!ShareDescriptor::new("print$", true).is_mirrorable());
    }
}
