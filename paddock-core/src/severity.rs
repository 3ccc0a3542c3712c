use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// How far off the racing line a checkpoint crossing happened. Comparisons go
// through `rank`, never through the declaration order of the variants.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    OnTrack,
    OffTrack,
    InCorner,
    InCornerApex,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::OnTrack,
        Severity::OffTrack,
        Severity::InCorner,
        Severity::InCornerApex,
    ];

    pub fn rank(self) -> u8 {
        match self {
            Severity::OnTrack => 0,
            Severity::OffTrack => 10,
            Severity::InCorner => 20,
            Severity::InCornerApex => 30,
        }
    }

    pub fn is_on_track(self) -> bool {
        self == Severity::OnTrack
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Severity::OnTrack => "on track",
            Severity::OffTrack => "off track",
            Severity::InCorner => "in corner",
            Severity::InCornerApex => "in corner apex",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering_is_strict() {
        for pair in Severity::ALL.windows(2) {
            assert!(pair[0] < pair[1], "{:?} should rank below {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_worst_of_many() {
        let worst = [Severity::InCorner, Severity::OffTrack, Severity::InCornerApex, Severity::OnTrack]
            .into_iter()
            .max();
        assert_eq!(worst, Some(Severity::InCornerApex));
    }
}
