//! Field type descriptor grammar.
//!
//! The remote API encodes every field's type as a short string:
//!
//! ```text
//! descriptor := scalar | "enum" | hostname
//!             | "array[" descriptor "]" | "map[" descriptor "]"
//!             | "reference[" name "]"
//!             | name                       (nested object type)
//! ```
//!
//! [`FieldType::parse`] classifies a descriptor by testing the forms below in order;
//! the first match wins. `array[reference[X]]` is tested before the generic `array[X]`,
//! which is tested before a bare `reference[X]`.

/// Classified field type descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType<'a> {
    /// `string`, `boolean`, `object` or `array`, passed through as is
    Literal(&'a str),
    Date,
    Password,
    Int,
    IntOrString,
    Float,
    Base64,
    Multiline,
    Json,
    Enum,
    /// `dnsLabel`, `hostname` or `dnsLabelRestricted`
    Hostname,
    ArrayOfStrings,
    ArrayOfInts,
    ArrayOfEnums,
    /// `array[reference[X]]`: identifiers of `X`
    ArrayOfReferences(&'a str),
    /// `reference[X]`: identifier of `X`
    Reference(&'a str),
    /// `array[X]` for any other `X`
    ArrayOf(&'a str),
    /// `map[string]` or `map[base64]`
    StringMap,
    /// `map[X]` for any other `X`
    MapOf(&'a str),
    /// Any other descriptor names a nested object type
    Object(&'a str),
}

impl<'a> FieldType<'a> {
    /// Classifies a raw descriptor
    pub fn parse(descriptor: &'a str) -> Self {
        let descriptor = descriptor.trim();

        match descriptor {
            "string" | "boolean" | "object" | "array" => return FieldType::Literal(descriptor),
            "date" => return FieldType::Date,
            "password" => return FieldType::Password,
            "int" => return FieldType::Int,
            "intOrString" => return FieldType::IntOrString,
            "float" => return FieldType::Float,
            "base64" => return FieldType::Base64,
            "multiline" => return FieldType::Multiline,
            "json" => return FieldType::Json,
            "enum" => return FieldType::Enum,
            "dnsLabel" | "hostname" | "dnsLabelRestricted" => return FieldType::Hostname,
            "array[string]" => return FieldType::ArrayOfStrings,
            "array[int]" => return FieldType::ArrayOfInts,
            "array[enum]" => return FieldType::ArrayOfEnums,
            _ => {}
        }

        if let Some(inner) = unwrap("array", descriptor) {
            if let Some(target) = unwrap("reference", inner) {
                return FieldType::ArrayOfReferences(target);
            }
        }

        if let Some(target) = unwrap("reference", descriptor) {
            return FieldType::Reference(target);
        }

        if let Some(inner) = unwrap("array", descriptor) {
            return FieldType::ArrayOf(inner);
        }

        if let Some(inner) = unwrap("map", descriptor) {
            return match inner {
                "string" | "base64" => FieldType::StringMap,
                _ => FieldType::MapOf(inner),
            };
        }

        FieldType::Object(descriptor)
    }
}

/// Returns `X` for `<wrapper>[X]`
fn unwrap<'a>(wrapper: &str, descriptor: &'a str) -> Option<&'a str> {
    descriptor
        .strip_prefix(wrapper)
        .and_then(|rest| rest.strip_prefix('['))
        .and_then(|rest| rest.strip_suffix(']'))
        .filter(|inner| !inner.is_empty())
}
