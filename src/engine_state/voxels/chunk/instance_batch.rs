//! # Instance Batch
//!
//! Logical render slots for one block id inside one chunk. The batch is a
//! dense list of chunk-local positions: slot `i` is the `i`-th instance that
//! will be drawn. Removal swaps the last instance into the freed slot so the
//! list never has holes and no other slot has to shift.
//!
//! The batch never talks to the GPU. The chunk turns every slot write into a
//! [`RenderCommand`](crate::engine_state::voxels::render_command::RenderCommand)
//! for the renderer to upload.

use cgmath::Point3;

/// Dense, fixed-capacity list of instance positions for a single block id.
#[derive(Clone, Debug)]
pub struct InstanceBatch {
    positions: Vec<Point3<i32>>,
    capacity: usize,
}

/// What a swap-remove did to the batch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SlotRemoval {
    /// The removed slot was the last one; nothing moved.
    Truncated,
    /// The previous last instance now lives in the freed slot.
    Moved {
        /// Position of the instance that moved.
        position: Point3<i32>,
        /// The slot that instance used to occupy.
        from: u32,
    },
}

impl InstanceBatch {
    /// Creates an empty batch able to hold `capacity` instances.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of instances, normally the chunk volume
    pub fn new(capacity: usize) -> Self {
        Self {
            positions: Vec::new(),
            capacity,
        }
    }

    /// Number of live instances, i.e. the slots `[0, count)`.
    pub fn count(&self) -> u32 {
        self.positions.len() as u32
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the position stored in `slot`, if the slot is live.
    pub fn get(&self, slot: u32) -> Option<Point3<i32>> {
        self.positions.get(slot as usize).copied()
    }

    /// All live positions, in slot order.
    pub fn positions(&self) -> &[Point3<i32>] {
        &self.positions
    }

    /// Appends an instance.
    ///
    /// # Returns
    /// The slot the instance was given, or `None` if the batch is full.
    pub fn push(&mut self, position: Point3<i32>) -> Option<u32> {
        if self.positions.len() >= self.capacity {
            return None;
        }
        self.positions.push(position);
        Some(self.count() - 1)
    }

    /// Frees `slot` by moving the last instance into it.
    ///
    /// # Returns
    /// `None` if `slot` is not live, otherwise what moved.
    pub fn swap_remove(&mut self, slot: u32) -> Option<SlotRemoval> {
        let index = slot as usize;
        if index >= self.positions.len() {
            return None;
        }

        let last = self.count() - 1;
        self.positions.swap_remove(index);

        if slot == last {
            Some(SlotRemoval::Truncated)
        } else {
            Some(SlotRemoval::Moved {
                position: self.positions[index],
                from: last,
            })
        }
    }

    /// Drops every instance.
    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_with(count: i32) -> InstanceBatch {
        let mut batch = InstanceBatch::new(16);
        for i in 0..count {
            batch.push(Point3::new(i, 0, 0));
        }
        batch
    }

    #[test]
    fn push_hands_out_consecutive_slots_until_full() {
        let mut batch = InstanceBatch::new(2);

        assert_eq!(batch.push(Point3::new(0, 0, 0)), Some(0));
        assert_eq!(batch.push(Point3::new(1, 0, 0)), Some(1));
        assert_eq!(batch.push(Point3::new(2, 0, 0)), None);
        assert_eq!(batch.count(), 2);
    }

    #[test]
    fn removing_a_middle_slot_moves_the_last_instance_into_it() {
        let mut batch = batch_with(4);

        let removal = batch.swap_remove(1);

        assert_eq!(
            removal,
            Some(SlotRemoval::Moved {
                position: Point3::new(3, 0, 0),
                from: 3,
            })
        );
        assert_eq!(batch.count(), 3);
        assert_eq!(batch.get(1), Some(Point3::new(3, 0, 0)));
        assert_eq!(batch.get(3), None);
    }

    #[test]
    fn removing_the_last_slot_only_truncates() {
        let mut batch = batch_with(3);

        assert_eq!(batch.swap_remove(2), Some(SlotRemoval::Truncated));
        assert_eq!(batch.positions(), &[Point3::new(0, 0, 0), Point3::new(1, 0, 0)]);
    }

    #[test]
    fn removing_a_dead_slot_is_rejected() {
        let mut batch = batch_with(2);

        assert_eq!(batch.swap_remove(2), None);
        assert_eq!(batch.count(), 2);
    }
}
