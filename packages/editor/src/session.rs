//! # Trigger Session
//!
//! Tracks which add triggers are disabled and which choice picker is open.
//!
//! A trigger is disabled while its picker or its fragment fetch is pending.
//! Every picker gets a generation number; a response whose generation is no
//! longer the live one arrived after a dismiss (or a newer picker) and must
//! be dropped.

use crate::errors::EditError;
use npb_tree::{GroupingId, NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// An add button: the kind it inserts, where, and after which sibling
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trigger {
    pub kind: NodeKind,
    pub grouping: GroupingId,
    #[serde(default)]
    pub after: Option<NodeId>,
}

impl Trigger {
    pub fn new(kind: NodeKind, grouping: GroupingId) -> Self {
        Self {
            kind,
            grouping,
            after: None,
        }
    }

    pub fn after(mut self, sibling: impl Into<NodeId>) -> Self {
        self.after = Some(sibling.into());
        self
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind, self.grouping)?;
        if let Some(after) = &self.after {
            write!(f, "+{}", after)?;
        }
        Ok(())
    }
}

/// Handle of an open picker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickerTicket {
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivePicker {
    pub trigger: Trigger,
    pub generation: u64,
    /// Picker markup, once the renderer answered
    pub html: Option<String>,
}

/// Handle of an in-flight fragment fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub trigger: Trigger,
}

#[derive(Debug, Default)]
pub struct TriggerSession {
    disabled: HashSet<Trigger>,
    picker: Option<ActivePicker>,
    generation: u64,
}

impl TriggerSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_disabled(&self, trigger: &Trigger) -> bool {
        self.disabled.contains(trigger)
    }

    pub fn disabled_count(&self) -> usize {
        self.disabled.len()
    }

    pub fn active_picker(&self) -> Option<&ActivePicker> {
        self.picker.as_ref()
    }

    /// Open the picker of a trigger. A picker already open for another
    /// trigger is superseded and its trigger re-enabled.
    pub fn open_picker(&mut self, trigger: Trigger) -> Result<PickerTicket, EditError> {
        if self.is_disabled(&trigger) {
            return Err(EditError::TriggerBusy(trigger.to_string()));
        }
        if let Some(previous) = self.picker.take() {
            self.disabled.remove(&previous.trigger);
        }

        self.generation += 1;
        self.disabled.insert(trigger.clone());
        self.picker = Some(ActivePicker {
            trigger,
            generation: self.generation,
            html: None,
        });

        Ok(PickerTicket {
            generation: self.generation,
        })
    }

    pub fn is_live(&self, ticket: PickerTicket) -> bool {
        self.picker
            .as_ref()
            .map_or(false, |p| p.generation == ticket.generation)
    }

    /// Store the picker markup. Returns false for a dead ticket.
    pub fn fill_picker(&mut self, ticket: PickerTicket, html: String) -> bool {
        match self.picker.as_mut() {
            Some(picker) if picker.generation == ticket.generation => {
                picker.html = Some(html);
                true
            }
            _ => false,
        }
    }

    /// Close the picker after a choice. The trigger is re-enabled so the
    /// insert can claim it.
    pub fn choose(&mut self) -> Result<Trigger, EditError> {
        let picker = self.picker.take().ok_or(EditError::NoActivePicker)?;
        self.generation += 1;
        self.disabled.remove(&picker.trigger);
        Ok(picker.trigger)
    }

    /// Close the picker without a choice (failed picker fetch)
    pub fn close_picker(&mut self, ticket: PickerTicket) {
        if self.is_live(ticket) {
            if let Some(picker) = self.picker.take() {
                self.disabled.remove(&picker.trigger);
            }
            self.generation += 1;
        }
    }

    /// Dismiss gesture: close any picker and re-enable every trigger
    pub fn dismiss(&mut self) {
        self.picker = None;
        self.generation += 1;
        self.disabled.clear();
    }

    pub fn begin_fetch(&mut self, trigger: Trigger) -> Result<FetchTicket, EditError> {
        if !self.disabled.insert(trigger.clone()) {
            return Err(EditError::TriggerBusy(trigger.to_string()));
        }
        Ok(FetchTicket { trigger })
    }

    /// Re-enable the trigger of a fetch, whatever its outcome
    pub fn finish_fetch(&mut self, ticket: &FetchTicket) {
        self.disabled.remove(&ticket.trigger);
    }
}
