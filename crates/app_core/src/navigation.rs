//! Navigation state: current directory and history

use app_fs::VirtualPath;

/// Current directory with back/forward stacks
///
/// The state does not know which folders exist; callers pass an `exists`
/// predicate so stale history entries (deleted folders) are skipped.
#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    current: VirtualPath,

    /// Navigation history stack
    history: Vec<VirtualPath>,

    /// Forward stack (for redo)
    forward: Vec<VirtualPath>,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at `path` with empty history
    pub fn at(path: VirtualPath) -> Self {
        Self {
            current: path,
            history: Vec::new(),
            forward: Vec::new(),
        }
    }

    pub fn current(&self) -> &VirtualPath {
        &self.current
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    /// Navigate to a new directory; returns false if already there
    pub fn navigate_to(&mut self, path: VirtualPath) -> bool {
        if path == self.current {
            return false;
        }

        // Save current to history
        let old = std::mem::replace(&mut self.current, path);
        self.history.push(old);

        // Clear forward stack
        self.forward.clear();
        true
    }

    /// Go back in history, skipping directories that no longer exist
    pub fn go_back(&mut self, exists: impl Fn(&VirtualPath) -> bool) -> bool {
        while let Some(prev) = self.history.pop() {
            if exists(&prev) && prev != self.current {
                let current = std::mem::replace(&mut self.current, prev);
                self.forward.push(current);
                return true;
            }
        }
        false
    }

    /// Go forward in history, skipping directories that no longer exist
    pub fn go_forward(&mut self, exists: impl Fn(&VirtualPath) -> bool) -> bool {
        while let Some(next) = self.forward.pop() {
            if exists(&next) && next != self.current {
                let current = std::mem::replace(&mut self.current, next);
                self.history.push(current);
                return true;
            }
        }
        false
    }

    /// Go to the parent directory; false at the root
    pub fn go_up(&mut self) -> bool {
        match self.current.parent() {
            Some(parent) => self.navigate_to(parent),
            None => false,
        }
    }

    /// Follow a rename or move of the folder at `from`
    pub fn rebase(&mut self, from: &VirtualPath, to: &VirtualPath) {
        let rebase = |p: &mut VirtualPath| {
            if let Some(moved) = p.rebase(from, to) {
                *p = moved;
            }
        };

        rebase(&mut self.current);
        self.history.iter_mut().for_each(rebase);
        self.forward.iter_mut().for_each(rebase);
    }

    /// Drop history entries that no longer exist and, if the current
    /// directory is gone, fall back to its nearest existing ancestor
    ///
    /// Afterwards neither stack holds the current directory or adjacent
    /// duplicates. Returns true when the current directory changed.
    pub fn retain(&mut self, exists: impl Fn(&VirtualPath) -> bool) -> bool {
        let changed = !exists(&self.current);
        if changed {
            let mut fallback = self.current.parent().unwrap_or_default();
            while !fallback.is_root() && !exists(&fallback) {
                fallback = fallback.parent().unwrap_or_default();
            }

            tracing::debug!(from = %self.current, to = %fallback, "Current directory removed");
            self.current = fallback;
        }

        let current = &self.current;
        for stack in [&mut self.history, &mut self.forward] {
            stack.retain(|p| p != current && exists(p));
            stack.dedup();
        }
        changed
    }
}
