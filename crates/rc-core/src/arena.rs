//! Storage for array objects.
//!
//! Arrays are addressed by a stable [`ArrayId`] and owned by exactly one
//! slot: a value or key in a parent array, the engine's value stack, or the
//! configuration root. Nothing ever stores the same id twice (variable
//! references copy), so the structure is a tree and releasing a parent
//! releases each descendant exactly once.

use crate::assoc::WordMap;
use crate::value::{Value, Word};

/// Handle of an array object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArrayId(u32);

impl ArrayId {
    pub(crate) fn from_index(index: u32) -> Self {
        ArrayId(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug)]
struct Slot {
    map: WordMap,
    /// Stored in a parent slot (or is the root).
    attached: bool,
}

/// Arena of array objects.
#[derive(Debug, Default)]
pub struct ArrayArena {
    slots: Vec<Option<Slot>>,
    live: usize,
}

impl ArrayArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty, detached array.
    pub fn alloc(&mut self) -> ArrayId {
        let id = ArrayId(self.slots.len() as u32);
        self.slots.push(Some(Slot {
            map: WordMap::new(),
            attached: false,
        }));
        self.live += 1;
        id
    }

    pub fn get(&self, id: ArrayId) -> Option<&WordMap> {
        self.slot(id).map(|slot| &slot.map)
    }

    pub fn get_mut(&mut self, id: ArrayId) -> Option<&mut WordMap> {
        self.slots
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .map(|slot| &mut slot.map)
    }

    pub fn is_live(&self, id: ArrayId) -> bool {
        self.slot(id).is_some()
    }

    /// Number of arrays not yet released.
    pub fn live(&self) -> usize {
        self.live
    }

    /// Record that `id` now has an owning slot.
    pub fn attach(&mut self, id: ArrayId) {
        if let Some(Some(slot)) = self.slots.get_mut(id.0 as usize) {
            slot.attached = true;
        }
    }

    pub fn is_attached(&self, id: ArrayId) -> bool {
        self.slot(id).is_some_and(|slot| slot.attached)
    }

    /// Release `value` if it is an array. Returns how many arrays went.
    pub fn release_value(&mut self, value: Value) -> usize {
        match value {
            Value::Array(id) => self.release(id),
            _ => 0,
        }
    }

    /// Release `id` and every array reachable from it through values or
    /// keys. Returns how many arrays were released.
    pub fn release(&mut self, id: ArrayId) -> usize {
        let mut released = 0;
        let mut pending = vec![id];

        while let Some(id) = pending.pop() {
            let Some(slot) = self.slots.get_mut(id.0 as usize).and_then(Option::take) else {
                tracing::debug!(array = id.0, "array already released");
                continue;
            };
            for (key, value) in slot.map.iter() {
                pending.extend(child(key));
                pending.extend(child(value));
            }
            self.live -= 1;
            released += 1;
        }
        released
    }

    /// Copy `id` and everything below it into fresh arrays.
    ///
    /// The copy is detached; its descendants are attached to it.
    pub fn deep_copy(&mut self, id: ArrayId) -> ArrayId {
        let entries: Vec<(Word, Word)> = match self.get(id) {
            Some(map) => map.iter().collect(),
            None => Vec::new(),
        };
        let copy = self.alloc();
        for (key, value) in entries {
            let key = self.copy_word(key);
            let value = self.copy_word(value);
            if let Some(map) = self.get_mut(copy) {
                map.set(key, value);
            }
        }
        copy
    }

    fn copy_word(&mut self, word: Word) -> Word {
        match child(word) {
            Some(id) => {
                let copy = self.deep_copy(id);
                self.attach(copy);
                Word::from(Value::Array(copy))
            }
            None => word,
        }
    }

    /// Release every live array that no slot owns, except `root`.
    ///
    /// Such arrays can only be left behind by an interrupted construction.
    pub fn sweep_detached(&mut self, root: ArrayId) -> usize {
        let stranded: Vec<ArrayId> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Some(slot) if !slot.attached => Some(ArrayId(index as u32)),
                _ => None,
            })
            .filter(|id| *id != root)
            .collect();

        stranded.into_iter().map(|id| self.release(id)).sum()
    }

    /// Ids of all live arrays, in creation order.
    pub fn live_ids(&self) -> impl Iterator<Item = ArrayId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| ArrayId(index as u32))
    }

    fn slot(&self, id: ArrayId) -> Option<&Slot> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }
}

fn child(word: Word) -> Option<ArrayId> {
    Value::from(word).as_array()
}
