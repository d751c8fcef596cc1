//! Sequence numbers and freshness ordering
//!
//! Every AODVv2 router owns a 16-bit sequence number that it stamps on the
//! route requests and replies it originates. Receivers compare sequence
//! numbers to decide whether routing information is newer than what they
//! already hold. The comparison is done on the signed 16-bit difference so
//! that ordering survives the counter wrapping after 65536 originations.

use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU16, Ordering};

use serde::{Deserialize, Serialize};

/// A 16-bit AODVv2 sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SeqNum(pub u16);

impl SeqNum {
    /// Sequence number 0: the destination's sequence number is not known
    pub const UNKNOWN: SeqNum = SeqNum(0);

    /// Create a sequence number from its raw value
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Get the raw value
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Check whether this is the "unknown" sequence number
    pub const fn is_unknown(&self) -> bool {
        self.0 == 0
    }

    /// Check whether `self` carries newer information than `other`
    pub fn is_fresher_than(&self, other: SeqNum) -> bool {
        is_fresher(self.0, other.0)
    }
}

impl Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for SeqNum {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

/// Wraparound-aware freshness comparison
///
/// Returns `true` iff `a` is newer than `b`, i.e. `a - b` read as a signed
/// 16-bit value is strictly positive. Equal values are never fresher than
/// each other.
///
/// When `a` and `b` are exactly half the number space apart the signed
/// difference is `i16::MIN` for both orders; the larger raw value wins so
/// that any two distinct numbers are strictly ordered.
pub fn is_fresher(a: u16, b: u16) -> bool {
    let diff = a.wrapping_sub(b) as i16;
    if diff == i16::MIN {
        return a > b;
    }
    diff > 0
}

/// The node's own sequence number counter
///
/// Only [`advance`](Self::advance) changes the value. Starts at 0, so the
/// first advertised number is 1, and never returns to 0.
#[derive(Debug, Default)]
pub struct SequenceNumber {
    value: AtomicU16,
}

impl SequenceNumber {
    /// Create a counter starting at 0
    pub fn new() -> Self {
        Self {
            value: AtomicU16::new(0),
        }
    }

    /// Read the current value
    pub fn current(&self) -> SeqNum {
        SeqNum(self.value.load(Ordering::SeqCst))
    }

    /// Increment and return the new value
    ///
    /// 65535 wraps to 1; 0 means "unknown" and is never handed out.
    pub fn advance(&self) -> SeqNum {
        let next = |value: u16| if value == u16::MAX { 1 } else { value + 1 };
        match self
            .value
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |value| Some(next(value)))
        {
            Ok(previous) | Err(previous) => SeqNum(next(previous)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_is_not_fresher() {
        for a in [0u16, 1, 13, 32768, 65535] {
            assert!(!is_fresher(a, a));
        }
    }

    #[test]
    fn test_simple_ordering() {
        assert!(is_fresher(14, 13));
        assert!(!is_fresher(13, 14));
        assert!(!is_fresher(1, 13));
    }

    #[test]
    fn test_wraparound() {
        assert!(is_fresher(1, 65535));
        assert!(!is_fresher(65535, 1));
        assert!(is_fresher(0, 65535));
    }

    #[test]
    fn test_antisymmetry_over_number_space() {
        // Every distance from a handful of anchors, including the antipode
        for b in [0u16, 1, 300, 32767, 32768, 65000, 65535] {
            for step in (0u32..=65535).step_by(97).chain([32768u32]) {
                let a = b.wrapping_add(step as u16);
                let ab = is_fresher(a, b);
                let ba = is_fresher(b, a);
                assert!(ab == !ba || a == b, "a={a} b={b}");
            }
        }
    }

    #[test]
    fn test_antipodal_tiebreak() {
        assert!(is_fresher(32768, 0));
        assert!(!is_fresher(0, 32768));
    }

    #[test]
    fn test_counter_advance() {
        let counter = SequenceNumber::new();
        assert_eq!(counter.current(), SeqNum(0));
        assert_eq!(counter.advance(), SeqNum(1));
        assert_eq!(counter.advance(), SeqNum(2));
        assert_eq!(counter.current(), SeqNum(2));
    }

    #[test]
    fn test_counter_wraps() {
        let counter = SequenceNumber::new();
        for _ in 0..65535 {
            counter.advance();
        }
        assert_eq!(counter.current(), SeqNum(65535));
        // Unknown is skipped
        assert_eq!(counter.advance(), SeqNum(1));
        assert_eq!(counter.advance(), SeqNum(2));
        assert!(is_fresher(1, 65535));
    }

    #[test]
    fn test_seqnum_helpers() {
        assert!(SeqNum::UNKNOWN.is_unknown());
        assert!(!SeqNum::new(7).is_unknown());
        assert!(SeqNum::new(7).is_fresher_than(SeqNum::new(6)));
        assert_eq!(SeqNum::from(9).value(), 9);
    }
}
