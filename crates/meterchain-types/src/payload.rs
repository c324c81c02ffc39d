use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::TypeError;

/// Data attached to a ledger record.
///
/// The externally visible shape is flat: a reading serializes as
/// `{"source_id": .., "quantity": ..}` and an opaque payload as `{"data": ..}`.
/// Both flatten into the surrounding record object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// A metering reading: which meter reported, and how much it measured.
    Reading { source_id: String, quantity: f64 },
    /// An arbitrary string carried as-is.
    Opaque { data: String },
}

impl Payload {
    /// Build a reading, rejecting NaN and infinities.
    pub fn reading(source_id: impl Into<String>, quantity: f64) -> Result<Self, TypeError> {
        if !quantity.is_finite() {
            return Err(TypeError::NonFiniteQuantity(quantity.to_string()));
        }
        Ok(Self::Reading {
            source_id: source_id.into(),
            quantity,
        })
    }

    /// Re-check a payload built without [`Payload::reading`], such as one
    /// decoded from a request body.
    pub fn validate(&self) -> Result<(), TypeError> {
        match self {
            Self::Reading { quantity, .. } if !quantity.is_finite() => {
                Err(TypeError::NonFiniteQuantity(quantity.to_string()))
            }
            _ => Ok(()),
        }
    }

    pub fn opaque(data: impl Into<String>) -> Self {
        Self::Opaque { data: data.into() }
    }

    /// The reporting meter, if this is a reading.
    pub fn source_id(&self) -> Option<&str> {
        match self {
            Self::Reading { source_id, .. } => Some(source_id),
            Self::Opaque { .. } => None,
        }
    }

    pub fn quantity(&self) -> Option<f64> {
        match self {
            Self::Reading { quantity, .. } => Some(*quantity),
            Self::Opaque { .. } => None,
        }
    }

    /// Canonical string form of the payload fields, appended to the
    /// proof-of-work input.
    ///
    /// Quantities use the shortest round-trip decimal and always keep a
    /// fractional part, so `100.0` renders as `"100.0"` rather than `"100"`.
    pub fn digest_fragment(&self) -> String {
        match self {
            Self::Reading {
                source_id,
                quantity,
            } => format!("{source_id}{quantity:?}"),
            Self::Opaque { data } => data.clone(),
        }
    }

    /// Insert this payload's fields into a canonical field map.
    pub(crate) fn write_fields(
        &self,
        fields: &mut BTreeMap<&'static str, Value>,
    ) -> Result<(), TypeError> {
        match self {
            Self::Reading {
                source_id,
                quantity,
            } => {
                let number = Number::from_f64(*quantity)
                    .ok_or_else(|| TypeError::NonFiniteQuantity(quantity.to_string()))?;
                fields.insert("source_id", Value::String(source_id.clone()));
                fields.insert("quantity", Value::Number(number));
            }
            Self::Opaque { data } => {
                fields.insert("data", Value::String(data.clone()));
            }
        }
        Ok(())
    }
}
