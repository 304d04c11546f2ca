//! Suppression engine
//!
//! Keeps each editable field consistent with its suppression flag:
//!
//! ```text
//!              flag = true (capture value)
//!   Active(v) ─────────────────────────────▶ Suppressed
//!      ▲  │                                     │
//!      │  └── edit(v') ──▶ Active(v')           │ edit(_) ignored
//!      │                                        │
//!      └────────── flag = false (recall) ───────┘
//! ```
//!
//! The engine owns the [`SuppressionMemory`] and mutates a working snapshot
//! that it borrows from the editor. It holds no other state, so every
//! operation is a function of the working snapshot and the memory alone.

use tracing::debug;

use crate::model::{ContactSnapshot, Field, Flag};

/// Last value each field held while it was not suppressed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressionMemory {
    pub last_email: String,
    pub last_phone: String,
}

impl SuppressionMemory {
    /// Remembered value for a field
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Email => &self.last_email,
            Field::Phone => &self.last_phone,
        }
    }

    fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Email => self.last_email = value,
            Field::Phone => self.last_phone = value,
        }
    }
}

/// What an edit did to the working snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The field took the new value
    Applied,
    /// The field already held the (trimmed) value
    Unchanged,
    /// The field is suppressed; nothing changed
    Ignored,
}

/// What a flag toggle did to the working snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The flag was set and the field cleared
    Suppressed {
        /// Value the field held before it was cleared
        captured: String,
    },
    /// The flag was cleared and the field refilled
    Restored {
        /// Value written back into the field (may be empty)
        value: String,
    },
    /// The flag already had the requested value
    Unchanged,
}

/// Enforces the suppression rules on a working snapshot
#[derive(Debug, Clone)]
pub struct SuppressionEngine {
    preserve_suppressed_values: bool,
    memory: SuppressionMemory,
}

impl SuppressionEngine {
    /// Create an engine with empty memory
    ///
    /// With `preserve_suppressed_values == false` the memory is never written
    /// and clearing a flag leaves its field blank.
    pub fn new(preserve_suppressed_values: bool) -> Self {
        Self {
            preserve_suppressed_values,
            memory: SuppressionMemory::default(),
        }
    }

    /// Current memory contents
    pub fn memory(&self) -> &SuppressionMemory {
        &self.memory
    }

    /// Whether cleared values are restored when suppression is lifted
    pub fn preserves_values(&self) -> bool {
        self.preserve_suppressed_values
    }

    /// Re-seed memory from a baseline snapshot
    ///
    /// Values are taken even when the snapshot's flags are set, so that a
    /// later uncheck restores what the record held.
    pub fn seed(&mut self, snapshot: &ContactSnapshot) {
        if !self.preserve_suppressed_values {
            self.memory = SuppressionMemory::default();
            return;
        }

        for field in Field::ALL {
            self.memory.set(field, snapshot.value(field).to_string());
        }
    }

    /// Re-seed memory from a snapshot pushed by the record source
    ///
    /// A suppressed field that arrives empty keeps its remembered value;
    /// every other field takes the snapshot's value.
    pub fn refresh(&mut self, snapshot: &ContactSnapshot) {
        if !self.preserve_suppressed_values {
            self.memory = SuppressionMemory::default();
            return;
        }

        for field in Field::ALL {
            let value = snapshot.value(field);
            if value.is_empty() && snapshot.is_suppressed(field) {
                continue;
            }
            self.memory.set(field, value.to_string());
        }
    }

    /// Remember the non-empty values of a freshly persisted working copy
    pub fn remember_committed(&mut self, working: &ContactSnapshot) {
        if !self.preserve_suppressed_values {
            return;
        }

        for field in Field::ALL {
            let value = working.value(field);
            if !value.is_empty() {
                self.memory.set(field, value.to_string());
            }
        }
    }

    /// Apply a user edit to a field
    pub fn on_field_edit(
        &mut self,
        working: &mut ContactSnapshot,
        field: Field,
        value: &str,
    ) -> EditOutcome {
        if working.is_suppressed(field) {
            debug!("Ignoring edit to suppressed field {}", field);
            return EditOutcome::Ignored;
        }

        let value = value.trim();
        let outcome = if working.value(field) == value {
            EditOutcome::Unchanged
        } else {
            EditOutcome::Applied
        };

        *working.value_mut(field) = value.to_string();
        if self.preserve_suppressed_values {
            self.memory.set(field, value.to_string());
        }

        outcome
    }

    /// Set or clear a suppression flag
    pub fn on_flag_toggle(
        &mut self,
        working: &mut ContactSnapshot,
        flag: Flag,
        value: bool,
    ) -> ToggleOutcome {
        if working.flag(flag) == value {
            return ToggleOutcome::Unchanged;
        }

        working.set_flag(flag, value);
        let field = flag.field();

        if value {
            let captured = std::mem::take(working.value_mut(field));
            if self.preserve_suppressed_values {
                self.memory.set(field, captured.clone());
            }
            debug!("{} set, cleared {}", flag, field);
            ToggleOutcome::Suppressed { captured }
        } else {
            let restored = if self.preserve_suppressed_values {
                self.memory.get(field).to_string()
            } else {
                String::new()
            };
            *working.value_mut(field) = restored.clone();
            debug!("{} cleared, restored {}", flag, field);
            ToggleOutcome::Restored { value: restored }
        }
    }

    /// Repair the working snapshot so every suppressed field is empty
    ///
    /// Unsuppressed empty fields are refilled from memory. Calling this any
    /// number of times after the first has no further effect.
    pub fn normalize(&self, working: &mut ContactSnapshot) {
        for field in Field::ALL {
            let suppressed = working.is_suppressed(field);
            let slot = working.value_mut(field);

            if suppressed {
                slot.clear();
            } else if slot.is_empty() && self.preserve_suppressed_values {
                slot.push_str(self.memory.get(field));
            }
        }
    }
}
