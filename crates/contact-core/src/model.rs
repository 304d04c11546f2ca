//! Contact record model
//!
//! [`ContactSnapshot`] is the shape shared by the baseline, the working copy
//! and the data delivered by a record source. [`FieldMap`] is the payload
//! handed to a record sink on save.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::config::FieldSetDescriptor;

/// The four fields of a contact that the editor manages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSnapshot {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub do_not_call: bool,
    #[serde(default)]
    pub email_opt_out: bool,
}

impl ContactSnapshot {
    /// Create a snapshot from its four values
    pub fn new(
        email: impl Into<String>,
        phone: impl Into<String>,
        do_not_call: bool,
        email_opt_out: bool,
    ) -> Self {
        Self {
            email: email.into(),
            phone: phone.into(),
            do_not_call,
            email_opt_out,
        }
    }

    /// Current value of an editable field
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Email => &self.email,
            Field::Phone => &self.phone,
        }
    }

    pub(crate) fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
        }
    }

    /// Current value of a suppression flag
    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::DoNotCall => self.do_not_call,
            Flag::EmailOptOut => self.email_opt_out,
        }
    }

    pub(crate) fn set_flag(&mut self, flag: Flag, value: bool) {
        match flag {
            Flag::DoNotCall => self.do_not_call = value,
            Flag::EmailOptOut => self.email_opt_out = value,
        }
    }

    /// Whether the flag paired with `field` is set
    pub fn is_suppressed(&self, field: Field) -> bool {
        self.flag(field.flag())
    }

    /// Whether either suppression flag is set
    pub fn any_suppressed(&self) -> bool {
        self.do_not_call || self.email_opt_out
    }
}

/// An editable contact field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Email,
    Phone,
}

impl Field {
    /// Both fields, email first
    pub const ALL: [Field; 2] = [Field::Email, Field::Phone];

    /// The suppression flag that controls this field
    pub fn flag(self) -> Flag {
        match self {
            Field::Email => Flag::EmailOptOut,
            Field::Phone => Flag::DoNotCall,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Email => f.write_str("email"),
            Field::Phone => f.write_str("phone"),
        }
    }
}

/// A suppression flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    DoNotCall,
    EmailOptOut,
}

impl Flag {
    /// Both flags, do-not-call first
    pub const ALL: [Flag; 2] = [Flag::DoNotCall, Flag::EmailOptOut];

    /// The field this flag suppresses
    pub fn field(self) -> Field {
        match self {
            Flag::DoNotCall => Field::Phone,
            Flag::EmailOptOut => Field::Email,
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::DoNotCall => f.write_str("do_not_call"),
            Flag::EmailOptOut => f.write_str("email_opt_out"),
        }
    }
}

/// Save payload handed to a [`RecordSink`](crate::traits::RecordSink)
///
/// Empty email or phone values are carried as `None` so a sink can tell a
/// cleared field apart from one that was never set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    pub id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub do_not_call: bool,
    pub email_opt_out: bool,
}

impl FieldMap {
    /// Build the payload for a record from a working snapshot
    pub fn from_snapshot(id: impl Into<String>, snapshot: &ContactSnapshot) -> Self {
        Self {
            id: id.into(),
            email: non_empty(&snapshot.email),
            phone: non_empty(&snapshot.phone),
            do_not_call: snapshot.do_not_call,
            email_opt_out: snapshot.email_opt_out,
        }
    }

    /// The snapshot this payload persists
    pub fn to_snapshot(&self) -> ContactSnapshot {
        ContactSnapshot {
            email: self.email.clone().unwrap_or_default(),
            phone: self.phone.clone().unwrap_or_default(),
            do_not_call: self.do_not_call,
            email_opt_out: self.email_opt_out,
        }
    }

    /// Render the payload keyed by the platform's field API names
    pub fn to_api_fields(&self, field_set: &FieldSetDescriptor) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(field_set.id.clone(), Value::from(self.id.clone()));
        fields.insert(field_set.email.clone(), optional_string(&self.email));
        fields.insert(field_set.phone.clone(), optional_string(&self.phone));
        fields.insert(field_set.do_not_call.clone(), Value::Bool(self.do_not_call));
        fields.insert(
            field_set.email_opt_out.clone(),
            Value::Bool(self.email_opt_out),
        );
        fields
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn optional_string(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_and_flag_pairing() {
        for field in Field::ALL {
            assert_eq!(field.flag().field(), field);
        }
        assert_eq!(Flag::DoNotCall.field(), Field::Phone);
        assert_eq!(Flag::EmailOptOut.field(), Field::Email);
    }

    #[test]
    fn empty_values_become_none() {
        let snapshot = ContactSnapshot::new("a@b.com", "", true, false);
        let map = FieldMap::from_snapshot("003xx", &snapshot);

        assert_eq!(map.email.as_deref(), Some("a@b.com"));
        assert_eq!(map.phone, None);
        assert_eq!(map.to_snapshot(), snapshot);
    }

    #[test]
    fn api_fields_use_descriptor_names() {
        let snapshot = ContactSnapshot::new("", "555-1212", false, true);
        let map = FieldMap::from_snapshot("003xx", &snapshot);
        let fields = map.to_api_fields(&FieldSetDescriptor::default());

        assert_eq!(fields["Id"], Value::from("003xx"));
        assert_eq!(fields["Email"], Value::Null);
        assert_eq!(fields["Phone"], Value::from("555-1212"));
        assert_eq!(fields["DoNotCall"], Value::Bool(false));
        assert_eq!(fields["HasOptedOutOfEmail"], Value::Bool(true));
    }
}
