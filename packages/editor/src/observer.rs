//! Coalesces DOM-change notifications into a single pending rebuild.
//!
//! Only changes on builder elements count: the target's id or its class
//! attribute must start with `npb`.

/// One observed change on a rendered element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomChange {
    pub target_id: Option<String>,
    /// Raw `class` attribute
    pub class: Option<String>,
}

impl DomChange {
    pub fn is_npb(&self) -> bool {
        let npb = |s: &Option<String>| s.as_deref().map_or(false, |s| s.starts_with("npb"));
        npb(&self.target_id) || npb(&self.class)
    }
}

#[derive(Debug, Default)]
pub struct RebuildScheduler {
    pending: bool,
    coalesced: usize,
}

impl RebuildScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change. Returns whether it scheduled a rebuild.
    pub fn notify(&mut self, change: &DomChange) -> bool {
        if !change.is_npb() {
            return false;
        }
        self.pending = true;
        self.coalesced += 1;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the pending rebuild, if any. Returns how many notifications
    /// it stands for.
    pub fn flush(&mut self) -> Option<usize> {
        if !self.pending {
            return None;
        }
        let count = self.coalesced;
        self.pending = false;
        self.coalesced = 0;
        Some(count)
    }
}
