use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Integer block coordinate, in source-local or world space.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const ZERO: BlockPos = BlockPos { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl Add for BlockPos {
    type Output = BlockPos;

    fn add(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for BlockPos {
    type Output = BlockPos;

    fn sub(self, rhs: BlockPos) -> BlockPos {
        BlockPos::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Inclusive axis-aligned bounding box, used for entity admission.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl BoundingBox {
    pub fn new(min: BlockPos, max: BlockPos) -> Self {
        Self { min, max }
    }

    /// Box covering `size` blocks starting at `origin`.
    pub fn from_size(origin: BlockPos, size: BlockPos) -> Self {
        Self {
            min: origin,
            max: origin + size - BlockPos::new(1, 1, 1),
        }
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }

    pub fn contains_vec3(&self, pos: glam::Vec3) -> bool {
        self.contains(BlockPos::new(
            pos.x.floor() as i32,
            pos.y.floor() as i32,
            pos.z.floor() as i32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_contains() {
        let bb = BoundingBox::from_size(BlockPos::new(10, 0, 10), BlockPos::new(5, 3, 5));
        assert!(bb.contains(BlockPos::new(10, 0, 10)));
        assert!(bb.contains(BlockPos::new(14, 2, 14)));
        assert!(!bb.contains(BlockPos::new(15, 2, 14)));
        assert!(!bb.contains(BlockPos::new(10, 3, 10)));
    }

    #[test]
    fn test_bounding_box_contains_vec3_floors() {
        let bb = BoundingBox::from_size(BlockPos::ZERO, BlockPos::new(2, 2, 2));
        assert!(bb.contains_vec3(glam::Vec3::new(1.9, 1.9, 1.9)));
        assert!(!bb.contains_vec3(glam::Vec3::new(2.0, 1.0, 1.0)));
        assert!(!bb.contains_vec3(glam::Vec3::new(-0.1, 1.0, 1.0)));
    }
}
