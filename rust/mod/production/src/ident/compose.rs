use std::collections::{HashMap, HashSet};

use super::derive::{resolve_fields, DeriveContext};
use crate::error::ProductionError;
use crate::model::{Configuration, Field, MODEL_NUMBER};

pub type ValidationResult = Result<(), ProductionError>;

/// Full validation of a resolved field set.
///
/// Rules run in order and stop at the first failing rule; the error names
/// every field that violates it:
/// 1. exactly one non-empty Model Number field;
/// 2. no duplicate field names outside Model Number;
/// 3. checked fields have distinct orders, all at least 1;
/// 4. checked fields have a non-empty value;
/// 5. no value is longer than its `maxLength`.
pub fn validate(fields: &[Field]) -> ValidationResult {
    check(fields, true)
}

/// Save-time validation of a field set whose derived values are not yet known.
///
/// Same rules as [`validate`], with rules 4 and 5 applied to static fields only.
pub fn validate_definition(fields: &[Field]) -> ValidationResult {
    check(fields, false)
}

fn check(fields: &[Field], resolved: bool) -> ValidationResult {
    let model_numbers: Vec<&Field> = fields.iter().filter(|f| f.is_model_number()).collect();
    match model_numbers.as_slice() {
        [] => {
            return Err(ProductionError::validation(
                "a Model Number field is required",
                vec![MODEL_NUMBER.to_string()],
            ))
        }
        [mn] if mn.value.trim().is_empty() => {
            return Err(ProductionError::validation(
                "Model Number must not be empty",
                vec![mn.name.clone()],
            ))
        }
        [_] => {}
        many => {
            return Err(ProductionError::validation(
                "only one Model Number field is allowed",
                many.iter().map(|f| f.name.clone()).collect(),
            ))
        }
    }

    let others: Vec<&Field> = fields.iter().filter(|f| !f.is_model_number()).collect();

    let mut seen = HashSet::new();
    let duplicates: Vec<String> = others
        .iter()
        .filter(|f| !seen.insert(f.name.as_str()))
        .map(|f| f.name.clone())
        .collect();
    if !duplicates.is_empty() {
        return Err(ProductionError::validation("duplicate field name", duplicates));
    }

    let checked: Vec<&&Field> = others.iter().filter(|f| f.is_checked).collect();
    let unordered: Vec<String> = checked
        .iter()
        .filter(|f| f.order == 0)
        .map(|f| f.name.clone())
        .collect();
    if !unordered.is_empty() {
        return Err(ProductionError::validation(
            "checked fields need an order of at least 1",
            unordered,
        ));
    }
    let mut by_order: HashMap<u32, Vec<&str>> = HashMap::new();
    for f in &checked {
        by_order.entry(f.order).or_default().push(f.name.as_str());
    }
    let clashes: Vec<String> = checked
        .iter()
        .filter(|f| by_order.get(&f.order).is_some_and(|names| names.len() > 1))
        .map(|f| f.name.clone())
        .collect();
    if !clashes.is_empty() {
        return Err(ProductionError::validation(
            "checked fields must not share an order",
            clashes,
        ));
    }

    let empty: Vec<String> = checked
        .iter()
        .filter(|f| resolved || !f.kind.is_derived())
        .filter(|f| f.value.trim().is_empty())
        .map(|f| f.name.clone())
        .collect();
    if !empty.is_empty() {
        return Err(ProductionError::validation(
            "checked fields must have a value",
            empty,
        ));
    }

    let too_long: Vec<String> = fields
        .iter()
        .filter(|f| resolved || !f.kind.is_derived())
        .filter(|f| f.max_length.is_some_and(|max| f.value.chars().count() > max))
        .map(|f| f.name.clone())
        .collect();
    if !too_long.is_empty() {
        return Err(ProductionError::validation(
            "value exceeds maxLength",
            too_long,
        ));
    }

    Ok(())
}

/// Concatenate the checked fields' values in ascending order.
///
/// Model Number never takes part. Equal orders keep their input order.
pub fn compose(fields: &[Field]) -> String {
    let mut parts: Vec<&Field> = fields
        .iter()
        .filter(|f| f.is_checked && !f.is_model_number())
        .collect();
    parts.sort_by_key(|f| f.order);
    parts.iter().map(|f| f.value.as_str()).collect()
}

/// Resolve, validate and compose a configuration at the context instant.
pub fn render(config: &Configuration, ctx: &DeriveContext<'_>) -> Result<String, ProductionError> {
    render_fields(config, ctx).map(|(identifier, _)| identifier)
}

/// Like [`render`], also returning the fields with derived values filled in.
pub fn render_fields(
    config: &Configuration,
    ctx: &DeriveContext<'_>,
) -> Result<(String, Vec<Field>), ProductionError> {
    let ctx = DeriveContext {
        year_format: config.year_format,
        ..*ctx
    };
    let resolved = resolve_fields(&config.fields, &ctx);
    validate(&resolved)?;
    Ok((compose(&resolved), resolved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldKind, ShiftDefinition, YearFormat};
    use chrono::{NaiveDate, NaiveDateTime};

    fn field(name: &str, value: &str, order: u32, checked: bool) -> Field {
        Field {
            value: value.into(),
            order,
            is_checked: checked,
            ..Field::new(name, FieldKind::Static)
        }
    }

    fn model_number(value: &str) -> Field {
        Field {
            is_required: true,
            ..field(MODEL_NUMBER, value, 0, false)
        }
    }

    fn fields_of(err: ProductionError) -> Vec<String> {
        match err {
            ProductionError::Validation { fields, .. } => fields,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn instant() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(23, 50, 0)
            .unwrap()
    }

    #[test]
    fn compose_orders_checked_fields() {
        let fields = vec![
            model_number("MN-1"),
            field("C", "ccc", 3, true),
            field("A", "a", 1, true),
            field("X", "skip", 2, false),
            field("B", "bb", 2, true),
        ];
        assert!(validate(&fields).is_ok());
        assert_eq!(compose(&fields), "abbccc");
    }

    #[test]
    fn compose_ignores_model_number_and_handles_empty() {
        let mut mn = model_number("MN-1");
        mn.is_checked = true;
        mn.order = 1;
        assert_eq!(compose(&[mn.clone()]), "");
        assert_eq!(compose(&[mn, field("A", "a", 5, false)]), "");
    }

    #[test]
    fn shared_order_is_rejected() {
        let fields = vec![
            model_number("MN-1"),
            field("A", "a", 1, true),
            field("B", "b", 1, true),
            field("C", "c", 1, false),
        ];
        assert_eq!(fields_of(validate(&fields).unwrap_err()), vec!["A", "B"]);
    }

    #[test]
    fn model_number_rules() {
        assert_eq!(fields_of(validate(&[field("A", "a", 1, true)]).unwrap_err()), vec![MODEL_NUMBER]);
        assert_eq!(fields_of(validate(&[model_number("   ")]).unwrap_err()), vec![MODEL_NUMBER]);
        let err = validate(&[model_number("a"), model_number("b")]).unwrap_err();
        assert_eq!(fields_of(err).len(), 2);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let fields = vec![model_number("MN"), field("A", "a", 1, true), field("A", "b", 2, false)];
        assert_eq!(fields_of(validate(&fields).unwrap_err()), vec!["A"]);
    }

    #[test]
    fn zero_order_is_rejected_for_checked_fields() {
        let fields = vec![model_number("MN"), field("A", "a", 0, true), field("B", "b", 0, false)];
        assert_eq!(fields_of(validate(&fields).unwrap_err()), vec!["A"]);
    }

    #[test]
    fn checked_fields_need_values() {
        let fields = vec![model_number("MN"), field("A", " ", 1, true), field("B", "", 2, false)];
        assert_eq!(fields_of(validate(&fields).unwrap_err()), vec!["A"]);
    }

    #[test]
    fn max_length_counts_characters() {
        let mut a = field("A", "äöü", 1, true);
        a.max_length = Some(3);
        assert!(validate(&[model_number("MN"), a.clone()]).is_ok());
        a.max_length = Some(2);
        assert_eq!(fields_of(validate(&[model_number("MN"), a]).unwrap_err()), vec!["A"]);
    }

    #[test]
    fn definition_check_skips_unresolved_derived_values() {
        let shift = Field {
            is_checked: true,
            order: 2,
            ..Field::new("Shift", FieldKind::DerivedShift)
        };
        let fields = vec![model_number("MN"), field("A", "a", 1, true), shift];
        assert!(validate_definition(&fields).is_ok());
        assert_eq!(fields_of(validate(&fields).unwrap_err()), vec!["Shift"]);
    }

    #[test]
    fn render_is_idempotent_at_the_same_instant() {
        let shifts = vec![ShiftDefinition::new(
            "N",
            "22:00".parse().unwrap(),
            "06:00".parse().unwrap(),
        )];
        let config = Configuration {
            id: "c1".into(),
            year_format: YearFormat::Short,
            fields: vec![
                model_number("MN-1"),
                field("Part", "P", 1, true),
                Field { is_checked: true, order: 2, ..Field::new("Year", FieldKind::DerivedYear) },
                Field { is_checked: true, order: 3, ..Field::new("Julian", FieldKind::DerivedJulianDate) },
                Field { is_checked: true, order: 4, ..Field::new("Shift", FieldKind::DerivedShift) },
                Field { is_checked: true, order: 5, ..Field::new("Serial", FieldKind::DerivedSerial) },
            ],
            created_at: String::new(),
            updated_at: String::new(),
        };
        let ctx = DeriveContext {
            at: instant(),
            shifts: &shifts,
            serial: 42,
            year_format: YearFormat::Full,
        };
        let first = render(&config, &ctx).unwrap();
        assert_eq!(first, "P24061N0042");
        assert_eq!(render(&config, &ctx).unwrap(), first);

        let (identifier, resolved) = render_fields(&config, &ctx).unwrap();
        assert_eq!(identifier, first);
        let julian = resolved.iter().find(|f| f.name == "Julian").unwrap();
        assert_eq!(julian.value, "061");
    }
}
