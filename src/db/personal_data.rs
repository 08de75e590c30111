//! Personal data export.
//!
//! Each entity type states which of its fields are personal data through
//! [`PersonalData::PERSONAL_DATA`]. Types that keep the default (`None`)
//! cannot be exported.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::db::error::RepositoryError;

pub trait PersonalData: Serialize {
    /// Ordered names of the serialized fields holding personal data
    const PERSONAL_DATA: Option<&'static [&'static str]> = None;
}

/// Collects the declared personal data fields of `entity`, in declaration order
pub fn collect<T: PersonalData>(entity: &T) -> Result<Map<String, Value>, RepositoryError> {
    let fields = T::PERSONAL_DATA
        .ok_or_else(|| RepositoryError::PersonalDataUnsupported(std::any::type_name::<T>()))?;

    let Value::Object(mut serialized) = serde_json::to_value(entity)? else {
        return Err(RepositoryError::PersonalDataUnsupported(
            std::any::type_name::<T>(),
        ));
    };

    Ok(fields
        .iter()
        .map(|&field| {
            let value = serialized.remove(field).unwrap_or(Value::Null);
            (field.to_string(), value)
        })
        .collect())
}
