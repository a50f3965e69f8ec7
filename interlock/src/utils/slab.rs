/// A key into a [`Slab`].
///
/// A key pairs a slot index with the generation the slot had when the value
/// was inserted. Once the value is removed the slot's generation advances, so
/// an old key never resolves to a value inserted later into the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Key {
    index: usize,
    generation: u64,
}

/// A single storage slot.
enum Slot<T> {
    /// The slot holds a live value.
    Occupied { generation: u64, value: T },

    /// The slot is free. `generation` is the one the next value will receive.
    Vacant { generation: u64 },
}

/// A generational slab allocator.
///
/// A `Slab` stores values in a contiguous vector and hands out [`Key`]s that
/// stay valid until the value is removed. Freed slots are reused, but each
/// reuse bumps the slot's generation, which makes stale keys harmless: every
/// lookup with a stale key reports the value as absent.
///
/// This is what gives lock handles their identity: a handle is a key, and a
/// handle that has already been released can never release somebody else's
/// lock, even after the slot has been recycled.
pub(crate) struct Slab<T> {
    /// Storage for items.
    slots: Vec<Slot<T>>,

    /// Stack of vacant indices that can be reused.
    free: Vec<usize>,

    /// Number of occupied slots.
    len: usize,
}

impl<T> Slab<T> {
    /// Creates an empty slab with room for `capacity` values before growing.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Inserts a value and returns its key.
    ///
    /// A vacant slot is reused if one exists, otherwise the slab grows.
    pub(crate) fn insert(&mut self, value: T) -> Key {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            if let Slot::Vacant { generation } = self.slots[index] {
                self.slots[index] = Slot::Occupied { generation, value };

                return Key { index, generation };
            }
        }

        let index = self.slots.len();
        self.slots.push(Slot::Occupied {
            generation: 0,
            value,
        });

        Key {
            index,
            generation: 0,
        }
    }

    /// Removes and returns the value stored under `key`.
    ///
    /// Returns `None` if the key is stale or was never issued by this slab.
    pub(crate) fn remove(&mut self, key: Key) -> Option<T> {
        let slot = self.slots.get_mut(key.index)?;

        match slot {
            Slot::Occupied { generation, .. } if *generation == key.generation => {}
            _ => return None,
        }

        let next = Slot::Vacant {
            generation: key.generation.wrapping_add(1),
        };

        match std::mem::replace(slot, next) {
            Slot::Occupied { value, .. } => {
                self.free.push(key.index);
                self.len -= 1;
                Some(value)
            }
            Slot::Vacant { .. } => None,
        }
    }

    /// Returns a reference to the value stored under `key`, if it is live.
    pub(crate) fn get(&self, key: Key) -> Option<&T> {
        match self.slots.get(key.index)? {
            Slot::Occupied { generation, value } if *generation == key.generation => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value stored under `key`, if it is live.
    pub(crate) fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        match self.slots.get_mut(key.index)? {
            Slot::Occupied { generation, value } if *generation == key.generation => Some(value),
            _ => None,
        }
    }

    /// Number of live values.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T> Default for Slab<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
