//! Undo/redo history and the diffs it records

pub mod clipboard;
mod diff;

pub use clipboard::Clipboard;
pub use diff::{CreateNpcDiff, DeleteNpcDiff, Diff, MoveNpcDiff, NpcFieldDiff, TileRegionDiff};

use gmap_core::{LevelMap, NpcRef, NpcRelocated, Result};

/// Default number of undo steps kept
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Follow a chain of relocations from an old reference to the current one
pub fn follow_relocations(relocations: &[NpcRelocated], mut npc: NpcRef) -> NpcRef {
    for relocation in relocations {
        if relocation.from == npc {
            npc = relocation.to;
        }
    }
    npc
}

/// Two opposing stacks of diffs forming a linear edit history
#[derive(Debug)]
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
pub struct EditLog {
    undo_stack: Vec<Box<dyn Diff>>,
    redo_stack: Vec<Box<dyn Diff>>,
    /// Maximum undo steps, 0 for unlimited
    max_history: usize,
    last_relocations: Vec<NpcRelocated>,
}

impl Default for EditLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl EditLog {
    pub fn new(max_history: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_history,
            last_relocations: Vec::new(),
        }
    }

    /// Apply a new edit and record its inverse. Returns false for no-op edits.
    pub fn perform(&mut self, diff: Box<dyn Diff>, map: &mut LevelMap) -> Result<bool> {
        if diff.is_noop() {
            return Ok(false);
        }
        let inverse = diff.apply(map)?;
        self.absorb_relocations(map);
        tracing::debug!("Performed {}", inverse.description());
        self.push_undo(inverse);
        Ok(true)
    }

    /// Record the inverse of an edit that was already applied
    pub fn push_undo(&mut self, inverse: Box<dyn Diff>) {
        if inverse.is_noop() {
            return;
        }
        self.undo_stack.push(inverse);
        self.redo_stack.clear();

        if self.max_history > 0 && self.undo_stack.len() > self.max_history {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the most recent edit. Returns false when there is nothing to undo.
    ///
    /// A diff that fails to apply stays on its stack.
    pub fn undo(&mut self, map: &mut LevelMap) -> Result<bool> {
        let Some(diff) = self.undo_stack.pop() else {
            return Ok(false);
        };
        match diff.apply(map) {
            Ok(inverse) => {
                tracing::debug!("Undo {}", diff.description());
                self.redo_stack.push(inverse);
                self.absorb_relocations(map);
                Ok(true)
            }
            Err(e) => {
                self.undo_stack.push(diff);
                Err(e)
            }
        }
    }

    /// Redo the most recently undone edit. Returns false when there is nothing to redo.
    pub fn redo(&mut self, map: &mut LevelMap) -> Result<bool> {
        let Some(diff) = self.redo_stack.pop() else {
            return Ok(false);
        };
        match diff.apply(map) {
            Ok(inverse) => {
                tracing::debug!("Redo {}", diff.description());
                self.undo_stack.push(inverse);
                self.absorb_relocations(map);
                Ok(true)
            }
            Err(e) => {
                self.redo_stack.push(diff);
                Err(e)
            }
        }
    }

    /// Rewrite NPC references in every stored diff after NPCs were re-homed.
    ///
    /// Called after each application; call it yourself after mutating the
    /// map outside of the log.
    pub fn absorb_relocations(&mut self, map: &mut LevelMap) {
        self.last_relocations = map.take_relocations();
        for relocation in &self.last_relocations {
            for diff in self.undo_stack.iter_mut().chain(self.redo_stack.iter_mut()) {
                diff.remap_npc(&relocation.from, &relocation.to);
            }
        }
    }

    /// Relocations caused by the last perform, undo or redo
    pub fn last_relocations(&self) -> &[NpcRelocated] {
        &self.last_relocations
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|d| d.description())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|d| d.description())
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.last_relocations.clear();
    }
}
