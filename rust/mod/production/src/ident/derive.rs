use chrono::{Datelike, NaiveDateTime};

use super::shift::resolve_shift;
use crate::model::{Field, FieldKind, ShiftDefinition, YearFormat};

/// Width of a serial field without a `maxLength`.
pub const DEFAULT_SERIAL_WIDTH: usize = 4;

/// Everything a derived field may depend on.
#[derive(Debug, Clone, Copy)]
pub struct DeriveContext<'a> {
    pub at: NaiveDateTime,
    pub shifts: &'a [ShiftDefinition],
    pub serial: u64,
    pub year_format: YearFormat,
}

/// Value of `field` at the context instant. Never fails.
pub fn resolve_value(field: &Field, ctx: &DeriveContext<'_>) -> String {
    let date = ctx.at.date();
    match field.kind {
        FieldKind::Static => field.value.clone(),
        FieldKind::DerivedYear => match ctx.year_format {
            YearFormat::Short => format!("{:02}", date.year().rem_euclid(100)),
            YearFormat::Full => format!("{:04}", date.year()),
        },
        FieldKind::DerivedMonth => format!("{:02}", date.month()),
        FieldKind::DerivedDate => format!("{:02}", date.day()),
        FieldKind::DerivedJulianDate => format!("{:03}", date.ordinal()),
        FieldKind::DerivedShift => resolve_shift(ctx.at.time(), ctx.shifts).to_string(),
        FieldKind::DerivedSerial => {
            let width = field.max_length.unwrap_or(DEFAULT_SERIAL_WIDTH);
            format!("{:0width$}", ctx.serial)
        }
    }
}

/// Copy of `fields` with every derived value filled in.
pub fn resolve_fields(fields: &[Field], ctx: &DeriveContext<'_>) -> Vec<Field> {
    fields
        .iter()
        .map(|f| Field {
            value: resolve_value(f, ctx),
            ..f.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ctx_at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn value(kind: FieldKind, at: NaiveDateTime) -> String {
        let ctx = DeriveContext {
            at,
            shifts: &[],
            serial: 7,
            year_format: YearFormat::Short,
        };
        resolve_value(&Field::new("f", kind), &ctx)
    }

    #[test]
    fn julian_date_follows_leap_years() {
        assert_eq!(value(FieldKind::DerivedJulianDate, ctx_at(2024, 3, 1, 8, 0)), "061");
        assert_eq!(value(FieldKind::DerivedJulianDate, ctx_at(2023, 3, 1, 8, 0)), "060");
        assert_eq!(value(FieldKind::DerivedJulianDate, ctx_at(2023, 1, 1, 8, 0)), "001");
        assert_eq!(value(FieldKind::DerivedJulianDate, ctx_at(2024, 12, 31, 8, 0)), "366");
    }

    #[test]
    fn calendar_parts_are_zero_padded() {
        let at = ctx_at(2024, 3, 5, 8, 0);
        assert_eq!(value(FieldKind::DerivedYear, at), "24");
        assert_eq!(value(FieldKind::DerivedMonth, at), "03");
        assert_eq!(value(FieldKind::DerivedDate, at), "05");
        assert_eq!(value(FieldKind::DerivedYear, ctx_at(2005, 1, 1, 0, 0)), "05");
    }

    #[test]
    fn full_year_format() {
        let ctx = DeriveContext {
            at: ctx_at(2024, 3, 5, 8, 0),
            shifts: &[],
            serial: 0,
            year_format: YearFormat::Full,
        };
        assert_eq!(resolve_value(&Field::new("Year", FieldKind::DerivedYear), &ctx), "2024");
    }

    #[test]
    fn serial_uses_max_length_as_width() {
        let at = ctx_at(2024, 3, 5, 8, 0);
        assert_eq!(value(FieldKind::DerivedSerial, at), "0007");

        let ctx = DeriveContext {
            at,
            shifts: &[],
            serial: 123_456,
            year_format: YearFormat::Short,
        };
        let mut serial = Field::new("Serial", FieldKind::DerivedSerial);
        serial.max_length = Some(6);
        assert_eq!(resolve_value(&serial, &ctx), "123456");
        serial.max_length = Some(3);
        assert_eq!(resolve_value(&serial, &ctx), "123456");
    }

    #[test]
    fn shift_and_static_values() {
        let shifts = vec![ShiftDefinition::new(
            "N",
            "22:00".parse().unwrap(),
            "06:00".parse().unwrap(),
        )];
        let ctx = DeriveContext {
            at: ctx_at(2024, 3, 5, 23, 50),
            shifts: &shifts,
            serial: 0,
            year_format: YearFormat::Short,
        };
        let mut part = Field::new("Part", FieldKind::Static);
        part.value = "PX".into();
        let resolved = resolve_fields(&[part, Field::new("Shift", FieldKind::DerivedShift)], &ctx);
        assert_eq!(resolved[0].value, "PX");
        assert_eq!(resolved[1].value, "N");
    }
}
