use std::collections::VecDeque;

use crate::{
    foundation::error::{VeneerError, VeneerResult},
    history::command::Command,
};

/// Undo stack configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HistoryOpts {
    /// Maximum commands kept on the undo stack; the oldest is evicted past this. Must be at
    /// least 1.
    pub max_size: usize,
}

impl Default for HistoryOpts {
    fn default() -> Self {
        Self { max_size: 100 }
    }
}

type BoxedCommand<C> = Box<dyn Command<C>>;

/// Bounded undo/redo stacks of [`Command`]s.
pub struct UndoManager<C: ?Sized> {
    opts: HistoryOpts,
    undo: VecDeque<BoxedCommand<C>>,
    redo: Vec<BoxedCommand<C>>,
}

impl<C: ?Sized> Default for UndoManager<C> {
    fn default() -> Self {
        Self::with_valid_opts(HistoryOpts::default())
    }
}

impl<C: ?Sized> UndoManager<C> {
    pub fn new(opts: HistoryOpts) -> VeneerResult<Self> {
        if opts.max_size == 0 {
            return Err(VeneerError::validation("history max_size must be at least 1"));
        }
        Ok(Self::with_valid_opts(opts))
    }

    fn with_valid_opts(opts: HistoryOpts) -> Self {
        Self {
            opts,
            undo: VecDeque::new(),
            redo: Vec::new(),
        }
    }

    pub fn opts(&self) -> HistoryOpts {
        self.opts
    }

    /// Record an already-applied command. Clears redo.
    pub fn push(&mut self, command: impl Command<C> + 'static) {
        self.push_boxed(Box::new(command));
    }

    pub fn push_boxed(&mut self, command: BoxedCommand<C>) {
        self.redo.clear();
        self.push_undo(command);
    }

    fn push_undo(&mut self, command: BoxedCommand<C>) {
        self.undo.push_back(command);
        while self.undo.len() > self.opts.max_size {
            if let Some(evicted) = self.undo.pop_front() {
                tracing::debug!(command = %evicted.description(), "evicted oldest undo entry");
            }
        }
    }

    /// Execute `command` and record it. Nothing is recorded if execution fails.
    pub fn apply(
        &mut self,
        mut command: impl Command<C> + 'static,
        ctx: &mut C,
    ) -> VeneerResult<()> {
        command.execute(ctx)?;
        self.push(command);
        Ok(())
    }

    /// Revert the most recent command and move it to the redo stack.
    ///
    /// `Ok(None)` when there is nothing to undo. A failing undo leaves the command on the undo
    /// stack and returns the error.
    pub fn undo(&mut self, ctx: &mut C) -> VeneerResult<Option<&dyn Command<C>>> {
        let Some(mut command) = self.undo.pop_back() else {
            return Ok(None);
        };
        if let Err(err) = command.undo(ctx) {
            self.undo.push_back(command);
            return Err(err);
        }
        tracing::debug!(command = %command.description(), "undo");
        self.redo.push(command);
        Ok(self.redo.last().map(|c| &**c))
    }

    /// Re-apply the most recently undone command and move it back to the undo stack.
    pub fn redo(&mut self, ctx: &mut C) -> VeneerResult<Option<&dyn Command<C>>> {
        let Some(mut command) = self.redo.pop() else {
            return Ok(None);
        };
        if let Err(err) = command.execute(ctx) {
            self.redo.push(command);
            return Err(err);
        }
        tracing::debug!(command = %command.description(), "redo");
        self.push_undo(command);
        Ok(self.undo.back().map(|c| &**c))
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn peek_undo(&self) -> Option<String> {
        self.undo.back().map(|c| c.description())
    }

    pub fn peek_redo(&self) -> Option<String> {
        self.redo.last().map(|c| c.description())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/history/manager.rs"]
mod tests;
