//! Per-operation sleep accounting.
//!
//! Every sleep the prober performs is attributed to the [`Operation`] that
//! was waiting. The ledger keeps one cumulative counter per kind; the total
//! sleep time of a prober is the sum of all of them.

use std::fmt;
use std::time::Duration;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::timer::saturating_micros;

/// Kind of message-passing operation a wait is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    Probe,
    Wait,
    Recv,
    Reduce,
    Allreduce,
    Alltoall,
    Alltoallv,
    Alltoallw,
    Bcast,
    Scatter,
    Scatterv,
    Gather,
    Gatherv,
    Allgather,
    Allgatherv,
    Barrier,
}

impl Operation {
    /// Number of operation kinds.
    pub const COUNT: usize = 16;

    /// Every kind, in declaration order.
    pub const ALL: [Operation; Operation::COUNT] = [
        Operation::Probe,
        Operation::Wait,
        Operation::Recv,
        Operation::Reduce,
        Operation::Allreduce,
        Operation::Alltoall,
        Operation::Alltoallv,
        Operation::Alltoallw,
        Operation::Bcast,
        Operation::Scatter,
        Operation::Scatterv,
        Operation::Gather,
        Operation::Gatherv,
        Operation::Allgather,
        Operation::Allgatherv,
        Operation::Barrier,
    ];

    /// Lowercase name used in summaries and serialized maps.
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Probe => "probe",
            Operation::Wait => "wait",
            Operation::Recv => "recv",
            Operation::Reduce => "reduce",
            Operation::Allreduce => "allreduce",
            Operation::Alltoall => "alltoall",
            Operation::Alltoallv => "alltoallv",
            Operation::Alltoallw => "alltoallw",
            Operation::Bcast => "bcast",
            Operation::Scatter => "scatter",
            Operation::Scatterv => "scatterv",
            Operation::Gather => "gather",
            Operation::Gatherv => "gatherv",
            Operation::Allgather => "allgather",
            Operation::Allgatherv => "allgatherv",
            Operation::Barrier => "barrier",
        }
    }

    #[inline(always)]
    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cumulative sleep time per [`Operation`].
///
/// Counters only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SleepLedger {
    slept: [Duration; Operation::COUNT],
}

impl SleepLedger {
    /// Creates a ledger with every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `elapsed` to the counter of `op`, saturating at [`Duration::MAX`].
    #[inline]
    pub fn record(&mut self, op: Operation, elapsed: Duration) {
        let slot = &mut self.slept[op.index()];
        *slot = slot.saturating_add(elapsed);
    }

    /// Cumulative sleep attributed to `op`.
    #[inline]
    pub fn get(&self, op: Operation) -> Duration {
        self.slept[op.index()]
    }

    /// Cumulative sleep across every operation kind.
    pub fn total(&self) -> Duration {
        self.slept
            .iter()
            .fold(Duration::ZERO, |acc, d| acc.saturating_add(*d))
    }

    /// Iterates `(operation, cumulative sleep)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Operation, Duration)> + '_ {
        Operation::ALL.iter().map(move |op| (*op, self.get(*op)))
    }
}

/// One-line summary in microseconds, e.g.
/// `sleep time (us) probe 12 wait 0 recv 3 ... total 15`.
impl fmt::Display for SleepLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("sleep time (us)")?;
        for (op, slept) in self.iter() {
            write!(f, " {} {}", op, slept.as_micros())?;
        }
        write!(f, " total {}", self.total().as_micros())
    }
}

/// Serializes as a map of operation name to cumulative microseconds.
impl Serialize for SleepLedger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Operation::COUNT))?;
        for (op, slept) in self.iter() {
            map.serialize_entry(op.as_str(), &saturating_micros(slept))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_lists_every_kind_once_in_index_order() {
        for (i, op) in Operation::ALL.iter().enumerate() {
            assert_eq!(op.index(), i);
        }
    }

    #[test]
    fn counters_are_independent_and_sum_to_total() {
        let mut ledger = SleepLedger::new();
        ledger.record(Operation::Probe, Duration::from_micros(5));
        ledger.record(Operation::Alltoallw, Duration::from_micros(7));
        ledger.record(Operation::Probe, Duration::from_micros(1));

        assert_eq!(ledger.get(Operation::Probe), Duration::from_micros(6));
        assert_eq!(ledger.get(Operation::Alltoallw), Duration::from_micros(7));
        assert_eq!(ledger.get(Operation::Alltoallv), Duration::ZERO);
        assert_eq!(ledger.total(), Duration::from_micros(13));

        let summed: Duration = ledger.iter().map(|(_, d)| d).sum();
        assert_eq!(summed, ledger.total());
    }

    #[test]
    fn record_saturates() {
        let mut ledger = SleepLedger::new();
        ledger.record(Operation::Barrier, Duration::MAX);
        ledger.record(Operation::Barrier, Duration::from_secs(1));
        assert_eq!(ledger.get(Operation::Barrier), Duration::MAX);
        ledger.record(Operation::Wait, Duration::from_secs(1));
        assert_eq!(ledger.total(), Duration::MAX);
    }

    #[test]
    fn summary_line_lists_each_kind() {
        let mut ledger = SleepLedger::new();
        ledger.record(Operation::Bcast, Duration::from_micros(42));
        let line = ledger.to_string();
        assert!(line.starts_with("sleep time (us) probe 0 wait 0"));
        assert!(line.contains(" bcast 42 "));
        assert!(line.ends_with(" total 42"));
    }

    #[test]
    fn serializes_as_named_map() {
        let mut ledger = SleepLedger::new();
        ledger.record(Operation::Recv, Duration::from_micros(9));
        let text = toml::to_string(&ledger).unwrap();
        assert!(text.contains("recv = 9"));
        assert!(text.contains("barrier = 0"));
    }
}
