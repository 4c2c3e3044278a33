//! Per-node visibility mask consulted by traversal and iteration.

use super::node::NodeId;
use crate::error::{AsgError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use std::cell::Cell;
use std::io::{Read, Write};

const FILTER_TAG: &[u8; 3] = b"FLT";

/// Filter state of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum FilterState {
    /// Visible
    #[default]
    NotFiltered = 0,
    /// Hidden together with everything only reachable through it
    Filtered = 1,
    /// Hidden itself, subtree still reachable through other paths
    FilteredThisNodeOnly = 2,
}

impl FilterState {
    fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(FilterState::NotFiltered),
            1 => Some(FilterState::Filtered),
            2 => Some(FilterState::FilteredThisNodeOnly),
            _ => None,
        }
    }
}

/// Tri-state array indexed by [`NodeId`] plus a global on/off switch.
///
/// Entries are only set through the owning [`Arena`](super::Arena), which
/// keeps the array no longer than its slot count.
///
/// The switch lives in a [`Cell`] so that read-only holders of the arena (a
/// traversal, the serializer) can suspend filtering for their duration with a
/// [`FilterOffGuard`].
#[derive(Debug)]
pub struct Filter {
    states: Vec<FilterState>,
    on: Cell<bool>,
}

impl Default for Filter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter {
    /// Empty filter, switched on.
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            on: Cell::new(true),
        }
    }

    /// Whether filtering is currently applied.
    pub fn is_on(&self) -> bool {
        self.on.get()
    }

    /// Switch filtering on.
    pub fn turn_on(&self) {
        self.on.set(true);
    }

    /// Switch filtering off. Per-node states are kept.
    pub fn turn_off(&self) {
        self.on.set(false);
    }

    /// Switch filtering off until the returned guard is dropped.
    pub fn off_guard(&self) -> FilterOffGuard<'_> {
        let previous = self.on.replace(false);
        FilterOffGuard {
            filter: self,
            previous,
        }
    }

    /// Stored state, regardless of the switch.
    pub fn state(&self, id: NodeId) -> FilterState {
        self.states
            .get(id as usize)
            .copied()
            .unwrap_or(FilterState::NotFiltered)
    }

    /// True if filtering is on and the node is not `NotFiltered`.
    pub fn get_is_filtered(&self, id: NodeId) -> bool {
        self.is_on() && self.state(id) != FilterState::NotFiltered
    }

    /// Mark one node `Filtered`.
    pub(crate) fn set_filtered(&mut self, id: NodeId) {
        self.set_state(id, FilterState::Filtered);
    }

    /// Mark one node `NotFiltered`.
    pub(crate) fn set_not_filtered(&mut self, id: NodeId) {
        self.set_state(id, FilterState::NotFiltered);
    }

    /// Mark one node `FilteredThisNodeOnly`.
    pub(crate) fn set_filtered_this_node_only(&mut self, id: NodeId) {
        self.set_state(id, FilterState::FilteredThisNodeOnly);
    }

    /// Clear the filter of one node, leaving its neighbours untouched.
    pub(crate) fn set_not_filtered_this_node_only(&mut self, id: NodeId) {
        self.set_state(id, FilterState::NotFiltered);
    }

    /// Set a state, growing the backing array if needed.
    pub(crate) fn set_state(&mut self, id: NodeId, state: FilterState) {
        let slot = id as usize;
        if self.states.len() <= slot {
            self.states.resize(slot + 1, FilterState::NotFiltered);
        }
        self.states[slot] = state;
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True if no entry was ever set.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Make room for `len` entries without growing.
    pub(crate) fn try_reserve(&mut self, len: usize) -> Result<()> {
        let missing = len.saturating_sub(self.states.len());
        self.states
            .try_reserve_exact(missing)
            .map_err(|_| AsgError::corrupt(format!("cannot allocate {missing} filter entries")))
    }

    /// Grow to at least `len` entries.
    pub(crate) fn grow(&mut self, len: usize) {
        if self.states.len() < len {
            self.states.resize(len, FilterState::NotFiltered);
        }
    }

    /// Number of nodes not in the `NotFiltered` state.
    pub fn filtered_count(&self) -> usize {
        self.states
            .iter()
            .filter(|s| **s != FilterState::NotFiltered)
            .count()
    }

    /// Reset every entry to `NotFiltered`.
    pub(crate) fn clear(&mut self) {
        self.states.iter_mut().for_each(|s| *s = FilterState::NotFiltered);
    }

    /// Write the per-node states.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::Io`] if writing fails.
    pub fn save<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(FILTER_TAG)?;
        out.write_u32::<LittleEndian>(self.states.len() as u32)?;
        let bytes: Vec<u8> = self.states.iter().map(|s| *s as u8).collect();
        out.write_all(&bytes)?;
        Ok(())
    }

    /// Read states written by [`Filter::save`] for an arena of `arena_len` slots.
    ///
    /// The switch keeps its current position.
    ///
    /// # Errors
    ///
    /// Returns [`AsgError::FilterMismatch`] if the file has more entries than
    /// the arena, [`AsgError::Corrupt`] on an unknown state byte.
    pub(crate) fn load<R: Read>(&mut self, input: &mut R, arena_len: usize) -> Result<()> {
        let mut tag = [0u8; 3];
        input
            .read_exact(&mut tag)
            .map_err(|e| AsgError::io("reading filter tag", e))?;
        if &tag != FILTER_TAG {
            return Err(AsgError::BadTag { found: tag.to_vec() });
        }

        let count = input.read_u32::<LittleEndian>()? as usize;
        if count > arena_len {
            return Err(AsgError::FilterMismatch {
                filter_len: count,
                arena_len,
            });
        }

        let mut bytes = vec![0u8; count];
        input.read_exact(&mut bytes)?;
        let mut states = bytes
            .into_iter()
            .map(|b| {
                FilterState::from_code(b)
                    .ok_or_else(|| AsgError::corrupt(format!("unknown filter state {b}")))
            })
            .collect::<Result<Vec<_>>>()?;
        states.resize(arena_len, FilterState::NotFiltered);

        debug!("Loaded filter: {count} entries for {arena_len} slots");
        self.states = states;
        Ok(())
    }
}

/// Restores the filter switch when dropped.
#[derive(Debug)]
pub struct FilterOffGuard<'a> {
    filter: &'a Filter,
    previous: bool,
}

impl Drop for FilterOffGuard<'_> {
    fn drop(&mut self) {
        self.filter.on.set(self.previous);
    }
}
