pub mod models;
pub mod value;

use serde::{de::DeserializeOwned, Serialize};

pub use value::{ConversionError, FieldKind, FieldValue};

/// Static description of one persisted field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Name used in JSON bodies, query strings and predicate expressions
    pub name: &'static str,
    /// Database column name
    pub column: &'static str,
    pub kind: FieldKind,
    pub nullable: bool,
    /// Assigned by the store (identity column) when the caller leaves it unset
    pub generated: bool,
    /// Inclusive bounds of a narrower-than-i64 integer column
    pub range: Option<(i64, i64)>,
}

impl FieldDef {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self { name, column, kind, nullable: false, generated: false, range: None }
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    pub const fn int32(mut self) -> Self {
        self.range = Some((i32::MIN as i64, i32::MAX as i64));
        self
    }

    pub const fn int16(mut self) -> Self {
        self.range = Some((i16::MIN as i64, i16::MAX as i64));
        self
    }

    /// Convert raw request text to this field's native type, range included.
    pub fn parse(&self, raw: &str) -> Result<FieldValue, ConversionError> {
        let value = self.kind.parse(raw)?;
        match (&value, self.range) {
            (FieldValue::Integer(i), Some((min, max))) if *i < min || *i > max => Err(ConversionError {
                kind: self.kind,
                value: raw.to_string(),
            }),
            _ => Ok(value),
        }
    }
}

/// Registration record for an entity type: where it lives and which fields it exposes.
///
/// Every descriptor names exactly one key field, which must also appear in `fields`.
#[derive(Debug)]
pub struct EntityDescriptor {
    /// Route segment the entity is served under (`/api/{resource}`)
    pub resource: &'static str,
    pub table: &'static str,
    pub key: &'static FieldDef,
    pub fields: &'static [FieldDef],
}

impl EntityDescriptor {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Case-insensitive lookup, used only to suggest the right spelling in errors
    pub fn suggest(&self, name: &str) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.name)
    }

    pub fn parse_key(&self, raw: &str) -> Result<FieldValue, ConversionError> {
        self.key.parse(raw)
    }
}

/// A persisted row type served by the data services.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    fn descriptor() -> &'static EntityDescriptor;

    /// Read a field by its API name. `None` means the name is not a field of this entity.
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Overwrite the key field, e.g. with the key taken from a PUT path.
    fn set_key(&mut self, key: FieldValue) -> Result<(), ConversionError>;

    fn key(&self) -> FieldValue {
        self.field(Self::descriptor().key.name).unwrap_or(FieldValue::Null)
    }

    /// All field values in descriptor order
    fn values(&self) -> Vec<(&'static FieldDef, FieldValue)> {
        Self::descriptor()
            .fields
            .iter()
            .map(|def| (def, self.field(def.name).unwrap_or(FieldValue::Null)))
            .collect()
    }
}

/// Mismatch helper for `Entity::set_key` implementations
pub fn key_mismatch<T: Entity>(value: &FieldValue) -> ConversionError {
    ConversionError {
        kind: T::descriptor().key.kind,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::models::{ExceptionManagement, ParticipantDemographic};
    use super::*;

    #[test]
    fn keys_parse_to_the_native_width() {
        let exceptions = ExceptionManagement::descriptor();
        assert_eq!(exceptions.parse_key("2147483647"), Ok(FieldValue::Integer(i32::MAX as i64)));
        assert!(exceptions.parse_key("99999999999").is_err());
        assert!(exceptions.parse_key("-2147483649").is_err());

        let participants = ParticipantDemographic::descriptor();
        assert_eq!(participants.parse_key("99999999999"), Ok(FieldValue::Integer(99_999_999_999)));
    }

    #[test]
    fn small_integer_fields_reject_wide_values() {
        let gender = ParticipantDemographic::descriptor().field("Gender").unwrap();
        assert_eq!(gender.parse("2"), Ok(FieldValue::Integer(2)));
        assert!(gender.parse("40000").is_err());
    }
}
