use serde::{Deserialize, Serialize};

/// Name of the field that identifies a configuration across the store.
pub const MODEL_NUMBER: &str = "Model Number";

/// How a field's value is obtained at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    #[default]
    Static,
    DerivedYear,
    DerivedMonth,
    DerivedDate,
    DerivedJulianDate,
    DerivedShift,
    DerivedSerial,
}

impl FieldKind {
    pub fn is_derived(self) -> bool {
        self != FieldKind::Static
    }
}

/// Field — one component of an identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,

    /// Literal value for static fields; ignored for derived kinds.
    #[serde(default)]
    pub value: String,

    /// Maximum length in characters, if capped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(default)]
    pub is_required: bool,

    /// Included in the composed identifier.
    #[serde(default)]
    pub is_checked: bool,

    /// Position in the composed identifier (ascending).
    #[serde(default)]
    pub order: u32,

    #[serde(default)]
    pub kind: FieldKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            max_length: None,
            is_required: false,
            is_checked: false,
            order: 0,
            kind,
        }
    }

    pub fn is_model_number(&self) -> bool {
        self.name.trim() == MODEL_NUMBER
    }
}

/// The field set offered by a blank configuration form.
pub fn default_fields() -> Vec<Field> {
    let template: [(&str, FieldKind, Option<usize>); 10] = [
        (MODEL_NUMBER, FieldKind::Static, None),
        ("Part Number", FieldKind::Static, None),
        ("Vendor Code", FieldKind::Static, None),
        ("Year", FieldKind::DerivedYear, Some(4)),
        ("Month", FieldKind::DerivedMonth, Some(2)),
        ("Date", FieldKind::DerivedDate, Some(2)),
        ("Julian Date", FieldKind::DerivedJulianDate, Some(3)),
        ("Shift", FieldKind::DerivedShift, None),
        ("Line Number", FieldKind::Static, None),
        ("Serial Number", FieldKind::DerivedSerial, Some(4)),
    ];
    template
        .into_iter()
        .map(|(name, kind, max_length)| Field {
            max_length,
            is_required: name == MODEL_NUMBER,
            ..Field::new(name, kind)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_uses_camel_case_tags() {
        let json = serde_json::to_string(&FieldKind::DerivedJulianDate).unwrap();
        assert_eq!(json, "\"derivedJulianDate\"");
        let back: FieldKind = serde_json::from_str("\"derivedSerial\"").unwrap();
        assert_eq!(back, FieldKind::DerivedSerial);
    }

    #[test]
    fn missing_attributes_take_defaults() {
        let f: Field = serde_json::from_str(r#"{"name": "Line Number", "value": "L2"}"#).unwrap();
        assert_eq!(f.kind, FieldKind::Static);
        assert!(!f.is_checked);
        assert_eq!(f.order, 0);
        assert_eq!(f.max_length, None);
    }

    #[test]
    fn template_has_one_required_model_number() {
        let fields = default_fields();
        let mn: Vec<_> = fields.iter().filter(|f| f.is_model_number()).collect();
        assert_eq!(mn.len(), 1);
        assert!(mn[0].is_required);
        assert!(fields.iter().all(|f| !f.is_checked));
    }
}
