//! Recursion depth guard shared by all serializer and deserializer instances.

use crate::error::{Error, ErrorKind, Position, Result};

/// Factory default for `max_depth`. Constructors accept an explicit value;
/// this is only what the plain `new()` constructors use.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Tracks nesting depth for one logical operation.
///
/// `enter` is called when an array/object/map is opened, `leave` when it is
/// closed. Exceeding the configured maximum fails with
/// [`ErrorKind::DepthExceeded`]; the caller is expected to record that error
/// as sticky.
#[derive(Debug, Clone)]
pub struct Guard {
    depth: usize,
    max_depth: usize,
}

impl Guard {
    pub fn new(max_depth: usize) -> Self {
        Self {
            depth: 0,
            max_depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn enter(&mut self, position: Option<Position>) -> Result<()> {
        if self.depth >= self.max_depth {
            let message = format!("nesting deeper than {} levels", self.max_depth);
            return Err(match position {
                Some(position) => Error::at(ErrorKind::DepthExceeded, message, position),
                None => Error::new(ErrorKind::DepthExceeded, message),
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_fails_past_max_depth() {
        let mut guard = Guard::new(2);
        assert!(guard.enter(None).is_ok());
        assert!(guard.enter(None).is_ok());
        let err = guard.enter(None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DepthExceeded);
    }

    #[test]
    fn leave_frees_a_level() {
        let mut guard = Guard::new(1);
        guard.enter(None).unwrap();
        guard.leave();
        assert!(guard.enter(Some(Position::Offset(9))).is_ok());
    }
}
