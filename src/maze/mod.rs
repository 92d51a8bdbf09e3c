//! Room-graph connectivity for procedural mazes
//! Rooms are integer cells in an N-dimensional grid; connections are
//! adjacency edges carrying a connector payload. Persisted paths store only
//! (source, axis, direction) and are expanded on load.

use serde::{Deserialize, Serialize};

/// Cell in an N-dimensional discrete grid. The number of coordinates is
/// the maze's dimensionality (3 for plain space, more for dimension-like
/// axes).
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct MazeRoom {
    pub coordinates: Vec<i32>,
}

impl MazeRoom {
    pub fn new(coordinates: Vec<i32>) -> Self {
        Self { coordinates }
    }

    pub fn dimensions(&self) -> usize {
        self.coordinates.len()
    }

    /// The room one step away along `axis`.
    pub fn add_in_dimension(&self, axis: usize, delta: i32) -> MazeRoom {
        let mut coordinates = self.coordinates.clone();
        coordinates[axis] += delta;
        MazeRoom { coordinates }
    }
}

/// Unordered adjacency between two rooms. Equality and hashing are
/// symmetric in the two endpoints.
#[derive(Clone, Eq, Debug, Serialize, Deserialize)]
pub struct MazeRoomConnection {
    pub left: MazeRoom,
    pub right: MazeRoom,
}

impl MazeRoomConnection {
    pub fn new(left: MazeRoom, right: MazeRoom) -> Self {
        Self { left, right }
    }

    /// The axis and direction stepping from `left` to `right`, if the two
    /// rooms are grid-adjacent.
    pub fn axis_and_direction(&self) -> Option<(usize, bool)> {
        if self.left.dimensions() != self.right.dimensions() {
            return None;
        }

        let mut found = None;
        for (axis, (l, r)) in self
            .left
            .coordinates
            .iter()
            .zip(&self.right.coordinates)
            .enumerate()
        {
            match r - l {
                0 => continue,
                1 | -1 if found.is_none() => found = Some((axis, r > l)),
                _ => return None,
            }
        }
        found
    }
}

impl PartialEq for MazeRoomConnection {
    fn eq(&self, other: &Self) -> bool {
        (self.left == other.left && self.right == other.right)
            || (self.left == other.right && self.right == other.left)
    }
}

impl std::hash::Hash for MazeRoomConnection {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Order-independent: hash both endpoints in sorted order.
        let (a, b) = if self.left.coordinates <= self.right.coordinates {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };
        a.hash(state);
        b.hash(state);
    }
}

/// Persisted form of a connection: source room, axis index and direction
/// flag. The destination room is never stored; it is rederived by stepping
/// the source by one along the axis, so source and destination encodings
/// cannot drift apart.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SavedMazePath {
    pub source: MazeRoom,
    pub axis: usize,
    pub goes_up: bool,
}

impl SavedMazePath {
    pub fn new(source: MazeRoom, axis: usize, goes_up: bool) -> Self {
        Self {
            source,
            axis,
            goes_up,
        }
    }

    /// Pure expansion into a connection plus its connector payload.
    pub fn to_connection<C>(&self, connector: C) -> (MazeRoomConnection, C) {
        let destination = self
            .source
            .add_in_dimension(self.axis, if self.goes_up { 1 } else { -1 });
        (
            MazeRoomConnection::new(self.source.clone(), destination),
            connector,
        )
    }
}
