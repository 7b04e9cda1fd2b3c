//! Size-classed polygon arena with generational handles.
//!
//! Polygons are bucketed by padded length: every size class owns its own
//! slot vector, so two live polygons share a bucket only if they have the
//! same padded length. A [`PolygonHandle`] names `(class, slot, generation)`.
//! Freeing a slot bumps its generation, which turns any outstanding handle
//! into a stale one that resolves to `None`.
//!
//! Free slots are recycled in FIFO order so generations spread over the
//! whole class instead of concentrating on one hot slot.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::polygon::Polygon;
use crate::GeomError;

// ---------------------------------------------------------------------------
// PolygonHandle
// ---------------------------------------------------------------------------

/// A stable, generational reference to a polygon stored in a [`PolygonArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolygonHandle {
    class: u32,
    slot: u32,
    generation: u32,
}

impl PolygonHandle {
    /// Size-class index inside the owning arena.
    #[inline]
    pub fn class(self) -> u32 {
        self.class
    }

    /// Slot index inside the size class.
    #[inline]
    pub fn slot(self) -> u32 {
        self.slot
    }

    /// Generation the slot had when this handle was issued.
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for PolygonHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PolygonHandle({}:{}v{})",
            self.class, self.slot, self.generation
        )
    }
}

// ---------------------------------------------------------------------------
// SizeClass
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct SizeClass {
    padded_len: usize,
    slots: Vec<Option<Polygon>>,
    generations: Vec<u32>,
    free_slots: VecDeque<u32>,
}

impl SizeClass {
    fn new(padded_len: usize) -> Self {
        Self {
            padded_len,
            slots: Vec::new(),
            generations: Vec::new(),
            free_slots: VecDeque::new(),
        }
    }

    fn live(&self, handle: PolygonHandle) -> bool {
        let idx = handle.slot as usize;
        idx < self.slots.len()
            && self.generations[idx] == handle.generation
            && self.slots[idx].is_some()
    }
}

// ---------------------------------------------------------------------------
// PolygonArena
// ---------------------------------------------------------------------------

/// Owns every polygon the game loop hands to the collision engine.
///
/// The arena is an ordinary value: the game loop creates it, passes it by
/// reference to the engine each tick, and drops it when the simulation ends.
#[derive(Debug)]
pub struct PolygonArena {
    classes: Vec<SizeClass>,
    class_of_len: HashMap<usize, u32>,
    slots_per_class: usize,
    live: usize,
}

impl PolygonArena {
    /// Create an empty arena where every size class holds at most
    /// `slots_per_class` live polygons.
    pub fn new(slots_per_class: usize) -> Self {
        Self {
            classes: Vec::new(),
            class_of_len: HashMap::new(),
            slots_per_class,
            live: 0,
        }
    }

    /// Build a polygon from `vertices` and store it.
    pub fn alloc(&mut self, vertices: &[(f32, f32)]) -> Result<PolygonHandle, GeomError> {
        let polygon = Polygon::new(vertices)?;
        self.insert(polygon)
    }

    /// Store an already-built polygon in the size class matching its padded
    /// length.
    ///
    /// Fails with [`GeomError::ArenaExhausted`] when the class is full.
    pub fn insert(&mut self, polygon: Polygon) -> Result<PolygonHandle, GeomError> {
        let padded_len = polygon.padded_len();
        let class = match self.class_of_len.get(&padded_len) {
            Some(&class) => class,
            None => {
                let class = self.classes.len() as u32;
                self.classes.push(SizeClass::new(padded_len));
                self.class_of_len.insert(padded_len, class);
                class
            }
        };
        let bucket = &mut self.classes[class as usize];

        let slot = if let Some(slot) = bucket.free_slots.pop_front() {
            // Generation was already bumped on free.
            bucket.slots[slot as usize] = Some(polygon);
            slot
        } else if bucket.slots.len() < self.slots_per_class {
            bucket.slots.push(Some(polygon));
            bucket.generations.push(0);
            (bucket.slots.len() - 1) as u32
        } else {
            tracing::error!(
                padded_len,
                capacity = self.slots_per_class,
                "polygon arena exhausted for size class"
            );
            return Err(GeomError::ArenaExhausted {
                padded_len,
                capacity: self.slots_per_class,
            });
        };

        self.live += 1;
        Ok(PolygonHandle {
            class,
            slot,
            generation: bucket.generations[slot as usize],
        })
    }

    /// Release a polygon. Returns `true` if the handle was live.
    pub fn free(&mut self, handle: PolygonHandle) -> bool {
        let Some(bucket) = self.classes.get_mut(handle.class as usize) else {
            return false;
        };
        if !bucket.live(handle) {
            return false;
        }
        let idx = handle.slot as usize;
        bucket.slots[idx] = None;
        bucket.generations[idx] = bucket.generations[idx].wrapping_add(1);
        bucket.free_slots.push_back(handle.slot);
        self.live -= 1;
        true
    }

    /// Resolve a handle. Stale handles yield `None`.
    #[inline]
    pub fn get(&self, handle: PolygonHandle) -> Option<&Polygon> {
        let bucket = self.classes.get(handle.class as usize)?;
        if bucket.generations.get(handle.slot as usize) != Some(&handle.generation) {
            return None;
        }
        bucket.slots[handle.slot as usize].as_ref()
    }

    /// Resolve a handle mutably. Stale handles yield `None`.
    pub fn get_mut(&mut self, handle: PolygonHandle) -> Option<&mut Polygon> {
        let bucket = self.classes.get_mut(handle.class as usize)?;
        if bucket.generations.get(handle.slot as usize) != Some(&handle.generation) {
            return None;
        }
        bucket.slots[handle.slot as usize].as_mut()
    }

    /// Returns `true` if `handle` refers to a live polygon.
    pub fn contains(&self, handle: PolygonHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Copy `src`'s vertex data into `dst`.
    ///
    /// # Panics
    ///
    /// Panics if the two polygons have different vertex counts.
    pub fn overwrite(&mut self, dst: PolygonHandle, src: PolygonHandle) -> Result<(), GeomError> {
        let source = self.get(src).ok_or(GeomError::StaleHandle(src))?.clone();
        let target = self.get_mut(dst).ok_or(GeomError::StaleHandle(dst))?;
        target.overwrite(&source);
        Ok(())
    }

    /// Number of live polygons across all size classes.
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Number of size classes created so far.
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Padded length served by size class `class`, if it exists.
    pub fn class_padded_len(&self, class: u32) -> Option<usize> {
        self.classes.get(class as usize).map(|c| c.padded_len)
    }

    /// Slot capacity of each size class.
    pub fn slots_per_class(&self) -> usize {
        self.slots_per_class
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
