use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::{BlockPos, BlockState};

/// Clockwise quarter turns around the vertical axis.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    pub fn quarter_turns(&self) -> u8 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 1,
            Rotation::Clockwise180 => 2,
            Rotation::Clockwise270 => 3,
        }
    }

    pub fn from_quarter_turns(turns: u8) -> Rotation {
        match turns % 4 {
            0 => Rotation::None,
            1 => Rotation::Clockwise90,
            2 => Rotation::Clockwise180,
            _ => Rotation::Clockwise270,
        }
    }
}

/// Geometric transform applied to a template as a whole: an optional mirror
/// along the x axis, followed by a rotation around the vertical axis.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Transform {
    pub rotation: Rotation,
    pub mirror: bool,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        rotation: Rotation::None,
        mirror: false,
    };

    pub fn new(rotation: Rotation, mirror: bool) -> Self {
        Self { rotation, mirror }
    }

    /// Maps a source-local coordinate into the transformed area. The result
    /// is still zero-based; the caller adds the world origin.
    pub fn apply(&self, pos: BlockPos, area_size: BlockPos) -> BlockPos {
        let mut x = pos.x;
        let mut z = pos.z;
        let mut size_x = area_size.x;
        let mut size_z = area_size.z;

        if self.mirror {
            x = size_x - 1 - x;
        }

        for _ in 0..self.rotation.quarter_turns() {
            let (nx, nz) = (size_z - 1 - z, x);
            x = nx;
            z = nz;
            std::mem::swap(&mut size_x, &mut size_z);
        }

        BlockPos::new(x, pos.y, z)
    }

    /// Continuous-coordinate version of [`Transform::apply`], for entities.
    pub fn apply_vec3(&self, pos: Vec3, area_size: BlockPos) -> Vec3 {
        let mut x = pos.x;
        let mut z = pos.z;
        let mut size_x = area_size.x as f32;
        let mut size_z = area_size.z as f32;

        if self.mirror {
            x = size_x - x;
        }

        for _ in 0..self.rotation.quarter_turns() {
            let (nx, nz) = (size_z - z, x);
            x = nx;
            z = nz;
            std::mem::swap(&mut size_x, &mut size_z);
        }

        Vec3::new(x, pos.y, z)
    }

    /// Size of the transformed area; odd quarter turns swap x and z.
    pub fn apply_size(&self, area_size: BlockPos) -> BlockPos {
        if self.rotation.quarter_turns() % 2 == 1 {
            BlockPos::new(area_size.z, area_size.y, area_size.x)
        } else {
            area_size
        }
    }

    /// Rewrites the horizontal facing quadrant (0 = +z, 1 = -x, 2 = -z,
    /// 3 = +x) stored in the low two metadata bits.
    pub fn apply_facing(&self, facing: u8) -> u8 {
        let mut f = facing & 0b11;
        if self.mirror {
            // Mirroring along x swaps the -x and +x quadrants.
            if f == 1 {
                f = 3;
            } else if f == 3 {
                f = 1;
            }
        }
        (f + self.rotation.quarter_turns()) % 4
    }

    /// Applies the facing rewrite to oriented blocks, leaving other
    /// metadata untouched.
    pub fn apply_state(&self, state: BlockState) -> BlockState {
        if state.block.has_facing() {
            let meta = (state.meta & !0b11) | self.apply_facing(state.meta);
            BlockState::new(state.block, meta)
        } else {
            state
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BlockType;

    #[test]
    fn test_identity_keeps_coords() {
        let t = Transform::IDENTITY;
        let pos = BlockPos::new(2, 5, 7);
        assert_eq!(t.apply(pos, BlockPos::new(4, 6, 9)), pos);
    }

    #[test]
    fn test_four_quarter_turns_are_identity() {
        let area = BlockPos::new(3, 1, 5);
        let pos = BlockPos::new(2, 0, 4);
        let mut current = pos;
        let quarter = Transform::new(Rotation::Clockwise90, false);
        let mut size = area;
        for _ in 0..4 {
            current = quarter.apply(current, size);
            size = quarter.apply_size(size);
        }
        assert_eq!(current, pos);
        assert_eq!(size, area);
    }

    #[test]
    fn test_rotate_90_corner() {
        // 2x1x3 area: (0,0,0) rotates to the far x edge.
        let t = Transform::new(Rotation::Clockwise90, false);
        let area = BlockPos::new(2, 1, 3);
        assert_eq!(t.apply(BlockPos::new(0, 0, 0), area), BlockPos::new(2, 0, 0));
        assert_eq!(t.apply(BlockPos::new(1, 0, 2), area), BlockPos::new(0, 0, 1));
        assert_eq!(t.apply_size(area), BlockPos::new(3, 1, 2));
    }

    #[test]
    fn test_mirror_flips_x() {
        let t = Transform::new(Rotation::None, true);
        let area = BlockPos::new(4, 1, 4);
        assert_eq!(t.apply(BlockPos::new(0, 0, 1), area), BlockPos::new(3, 0, 1));
        assert_eq!(t.apply(BlockPos::new(3, 0, 1), area), BlockPos::new(0, 0, 1));
    }

    #[test]
    fn test_facing_rotation_and_mirror() {
        let quarter = Transform::new(Rotation::Clockwise90, false);
        assert_eq!(quarter.apply_facing(0), 1);
        assert_eq!(quarter.apply_facing(3), 0);

        let mirror = Transform::new(Rotation::None, true);
        assert_eq!(mirror.apply_facing(1), 3);
        assert_eq!(mirror.apply_facing(3), 1);
        assert_eq!(mirror.apply_facing(0), 0);
    }

    #[test]
    fn test_apply_state_only_touches_oriented_blocks() {
        let t = Transform::new(Rotation::Clockwise90, false);
        let stone = BlockState::new(BlockType::Stone, 2);
        assert_eq!(t.apply_state(stone), stone);

        let stairs = BlockState::new(BlockType::WoodStairs, 0b0110);
        let rotated = t.apply_state(stairs);
        assert_eq!(rotated.meta & !0b11, 0b0100);
        assert_eq!(rotated.meta & 0b11, 3);
    }
}
