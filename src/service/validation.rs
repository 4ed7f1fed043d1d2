//! Request validation for country payloads. Collects every failing field into a map.

use crate::error::{AppError, FieldErrors};
use crate::model::{CountryFields, CountryPatch, Currency, MAX_TEXT_LEN};
use serde_json::{Map, Value};

/// Constraints for one text field.
struct TextRule {
    required: bool,
    not_blank: bool,
    max_length: Option<usize>,
}

const NAME: TextRule = TextRule {
    required: true,
    not_blank: true,
    max_length: Some(MAX_TEXT_LEN),
};
const REGION: TextRule = NAME;
const OPTIONAL_SHORT: TextRule = TextRule {
    required: false,
    not_blank: false,
    max_length: Some(MAX_TEXT_LEN),
};
const FLAG: TextRule = TextRule {
    required: true,
    not_blank: true,
    max_length: None,
};

/// Whether a missing field is an error (create) or simply left alone (patch).
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Create,
    Patch,
}

pub struct CountryValidator;

impl CountryValidator {
    /// Validate a full create payload. Optional fields fall back to their defaults.
    pub fn validate_create(body: &Map<String, Value>) -> Result<CountryFields, AppError> {
        let mut errors = FieldErrors::new();
        let mode = Mode::Create;
        let name = text(body, "name", &NAME, mode, &mut errors);
        let region = text(body, "region", &REGION, mode, &mut errors);
        let sub_region = text(body, "subRegion", &OPTIONAL_SHORT, mode, &mut errors);
        let demonym = text(body, "demonym", &OPTIONAL_SHORT, mode, &mut errors);
        let population = population(body, mode, &mut errors);
        let independent = boolean(body, "independent", mode, &mut errors);
        let flag = text(body, "flag", &FLAG, mode, &mut errors);
        let currency = currencies(body, mode, &mut errors);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(CountryFields {
            name: name.unwrap_or_default(),
            region: region.unwrap_or_default(),
            sub_region: sub_region.unwrap_or_default(),
            demonym: demonym.unwrap_or_default(),
            population: population.unwrap_or_default(),
            independent: independent.unwrap_or(false),
            flag: flag.unwrap_or_default(),
            currency: currency.unwrap_or_default(),
        })
    }

    /// Validate only the fields present in body (for PATCH).
    pub fn validate_patch(body: &Map<String, Value>) -> Result<CountryPatch, AppError> {
        let mut errors = FieldErrors::new();
        let mode = Mode::Patch;
        let patch = CountryPatch {
            name: text(body, "name", &NAME, mode, &mut errors),
            region: text(body, "region", &REGION, mode, &mut errors),
            sub_region: text(body, "subRegion", &OPTIONAL_SHORT, mode, &mut errors),
            demonym: text(body, "demonym", &OPTIONAL_SHORT, mode, &mut errors),
            population: population(body, mode, &mut errors),
            independent: boolean(body, "independent", mode, &mut errors),
            flag: text(body, "flag", &FLAG, mode, &mut errors),
            currency: currencies(body, mode, &mut errors),
        };
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(patch)
    }
}

/// Look up a field, treating `null` as absent. Reports required-but-missing fields.
fn present<'a>(
    body: &'a Map<String, Value>,
    key: &str,
    required: bool,
    mode: Mode,
    errors: &mut FieldErrors,
) -> Option<&'a Value> {
    match body.get(key) {
        Some(Value::Null) if required => {
            errors.insert(key.into(), "must not be null".into());
            None
        }
        Some(Value::Null) | None => {
            if required && mode == Mode::Create {
                errors.insert(key.into(), "is required".into());
            }
            None
        }
        Some(v) => Some(v),
    }
}

fn text(
    body: &Map<String, Value>,
    key: &str,
    rule: &TextRule,
    mode: Mode,
    errors: &mut FieldErrors,
) -> Option<String> {
    let v = present(body, key, rule.required, mode, errors)?;
    let Some(s) = v.as_str() else {
        errors.insert(key.into(), "must be a string".into());
        return None;
    };
    if rule.not_blank && s.trim().is_empty() {
        errors.insert(key.into(), "must not be blank".into());
        return None;
    }
    if let Some(max) = rule.max_length {
        if s.chars().count() > max {
            errors.insert(key.into(), format!("must be at most {} characters", max));
            return None;
        }
    }
    Some(s.to_string())
}

fn population(body: &Map<String, Value>, mode: Mode, errors: &mut FieldErrors) -> Option<i64> {
    let v = present(body, "population", true, mode, errors)?;
    match v.as_i64() {
        Some(n) if n >= 0 => Some(n),
        Some(_) => {
            errors.insert("population".into(), "must be at least 0".into());
            None
        }
        None => {
            errors.insert("population".into(), "must be an integer".into());
            None
        }
    }
}

fn boolean(body: &Map<String, Value>, key: &str, mode: Mode, errors: &mut FieldErrors) -> Option<bool> {
    let v = present(body, key, false, mode, errors)?;
    match v.as_bool() {
        Some(b) => Some(b),
        None => {
            errors.insert(key.into(), "must be a boolean".into());
            None
        }
    }
}

fn currencies(body: &Map<String, Value>, mode: Mode, errors: &mut FieldErrors) -> Option<Vec<Currency>> {
    let v = present(body, "currency", false, mode, errors)?;
    let Some(items) = v.as_array() else {
        errors.insert("currency".into(), "must be an array".into());
        return None;
    };
    let before = errors.len();
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            errors.insert(format!("currency[{}]", i), "must be an object".into());
            continue;
        };
        let mut part = |field: &str| -> String {
            let key = format!("currency[{}].{}", i, field);
            match obj.get(field).and_then(Value::as_str) {
                Some(s) if !s.trim().is_empty() => s.to_string(),
                _ => {
                    errors.insert(key, "must not be blank".into());
                    String::new()
                }
            }
        };
        let name = part("name");
        let symbol = part("symbol");
        out.push(Currency { name, symbol });
    }
    (errors.len() == before).then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn field_errors(err: AppError) -> FieldErrors {
        match err {
            AppError::Validation(f) => f,
            other => panic!("expected validation error, got {}", other),
        }
    }

    #[test]
    fn valid_create_with_defaults() {
        let fields = CountryValidator::validate_create(&obj(json!({
            "name": "Testland",
            "region": "Europe",
            "population": 0,
            "flag": "https://flags.example/t.png",
            "unknownExtra": 1
        })))
        .unwrap();
        assert_eq!(fields.name, "Testland");
        assert_eq!(fields.sub_region, "");
        assert_eq!(fields.demonym, "");
        assert!(!fields.independent);
        assert!(fields.currency.is_empty());
    }

    #[test]
    fn create_reports_every_bad_field() {
        let errors = field_errors(
            CountryValidator::validate_create(&obj(json!({
                "name": "   ",
                "subRegion": "x".repeat(101),
                "population": -5,
                "independent": "yes",
                "currency": [{"name": "Euro", "symbol": ""}, 3]
            })))
            .unwrap_err(),
        );
        assert_eq!(errors["name"], "must not be blank");
        assert_eq!(errors["region"], "is required");
        assert_eq!(errors["subRegion"], "must be at most 100 characters");
        assert_eq!(errors["population"], "must be at least 0");
        assert_eq!(errors["independent"], "must be a boolean");
        assert_eq!(errors["flag"], "is required");
        assert_eq!(errors["currency[0].symbol"], "must not be blank");
        assert_eq!(errors["currency[1]"], "must be an object");
        assert!(!errors.contains_key("demonym"));
    }

    #[test]
    fn max_length_counts_characters() {
        let name = "é".repeat(100);
        let fields = CountryValidator::validate_create(&obj(json!({
            "name": name, "region": "R", "population": 1, "flag": "f"
        })))
        .unwrap();
        assert_eq!(fields.name.chars().count(), 100);
    }

    #[test]
    fn patch_accepts_partial_payloads() {
        let patch = CountryValidator::validate_patch(&obj(json!({"region": "Asia", "population": 7}))).unwrap();
        assert_eq!(patch.region.as_deref(), Some("Asia"));
        assert_eq!(patch.population, Some(7));
        assert!(patch.name.is_none());
        assert!(CountryValidator::validate_patch(&Map::new()).unwrap().is_empty());
    }

    #[test]
    fn patch_rejects_null_required_and_bad_values() {
        let errors = field_errors(
            CountryValidator::validate_patch(&obj(json!({"name": null, "population": "many", "flag": ""})))
                .unwrap_err(),
        );
        assert_eq!(errors["name"], "must not be null");
        assert_eq!(errors["population"], "must be an integer");
        assert_eq!(errors["flag"], "must not be blank");
    }
}
