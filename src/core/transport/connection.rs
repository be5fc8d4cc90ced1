//! Per-connection state tracking.
//!
//! `Idle -> Open -> Active(n) -> Draining -> Closed`. A connection returns
//! to `Open` when its last outstanding invocation completes.

use std::fmt;

use tracing::debug;

/// State of a single transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Open,
    /// Number of invocations accepted but not yet answered.
    Active(usize),
    Draining,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Open => f.write_str("open"),
            Self::Active(n) => write!(f, "active({n})"),
            Self::Draining => f.write_str("draining"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// Tracks the lifecycle of one logical connection.
#[derive(Debug)]
pub struct Connection {
    id: String,
    state: ConnectionState,
    outstanding: usize,
}

impl Connection {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: ConnectionState::Idle,
            outstanding: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether new requests may still be accepted.
    pub fn is_accepting(&self) -> bool {
        matches!(self.state, ConnectionState::Open | ConnectionState::Active(_))
    }

    pub fn open(&mut self) {
        if self.state == ConnectionState::Idle {
            self.set(ConnectionState::Open);
        }
    }

    /// An invocation was accepted.
    pub fn begin(&mut self) {
        self.outstanding += 1;
        if self.is_accepting() {
            self.set(ConnectionState::Active(self.outstanding));
        }
    }

    /// An invocation was answered.
    pub fn finish(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
        match self.state {
            ConnectionState::Active(_) if self.outstanding == 0 => self.set(ConnectionState::Open),
            ConnectionState::Active(_) => self.set(ConnectionState::Active(self.outstanding)),
            _ => {}
        }
    }

    /// Stop accepting; outstanding invocations still complete.
    pub fn drain(&mut self) {
        if self.state != ConnectionState::Closed {
            self.set(ConnectionState::Draining);
        }
    }

    pub fn close(&mut self) {
        self.set(ConnectionState::Closed);
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    fn set(&mut self, next: ConnectionState) {
        if self.state != next {
            debug!(connection = %self.id, "Connection {} -> {}", self.state, next);
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_lifecycle() {
        let mut conn = Connection::new("test");
        assert_eq!(conn.state(), ConnectionState::Idle);
        assert!(!conn.is_accepting());

        conn.open();
        assert_eq!(conn.state(), ConnectionState::Open);

        conn.begin();
        conn.begin();
        assert_eq!(conn.state(), ConnectionState::Active(2));
        conn.finish();
        assert_eq!(conn.state(), ConnectionState::Active(1));
        conn.finish();
        assert_eq!(conn.state(), ConnectionState::Open);

        conn.drain();
        assert!(!conn.is_accepting());
        conn.close();
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_draining_keeps_count() {
        let mut conn = Connection::new("test");
        conn.open();
        conn.begin();
        conn.drain();
        assert_eq!(conn.state(), ConnectionState::Draining);
        assert_eq!(conn.outstanding(), 1);
        conn.finish();
        assert_eq!(conn.outstanding(), 0);
        assert_eq!(conn.state(), ConnectionState::Draining);
    }
}
