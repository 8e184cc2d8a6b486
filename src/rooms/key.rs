use std::fmt;

/// Identifies a room in the registry.
///
/// Group keys and pairwise keys carry different prefixes so the two
/// schemes can never name the same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomKey(String);

impl RoomKey {
    pub fn group(group_id: i64) -> Self {
        Self(format!("g:{group_id}"))
    }

    /// Order-independent: `pairwise(a, b) == pairwise(b, a)`.
    pub fn pairwise(a: i64, b: i64) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("p:{low}-{high}"))
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
