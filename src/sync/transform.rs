//! Snapshot record -> country fields.

use crate::error::TransformError;
use crate::model::{CountryFields, Currency, MAX_TEXT_LEN};
use crate::source::RawCountry;

/// A snapshot record that passed validation, keyed by its external code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub code: String,
    pub fields: CountryFields,
}

/// Blank or over-long text; returns the failure reason.
fn checked_text(field: &str, value: String, not_blank: bool, max: Option<usize>) -> Result<String, String> {
    if not_blank && value.trim().is_empty() {
        return Err(format!("blank {}", field));
    }
    match max {
        Some(max) if value.chars().count() > max => Err(format!("{} exceeds {} characters", field, max)),
        _ => Ok(value),
    }
}

/// Map one raw record. `index` is its position in the snapshot, used to name records without a code.
pub fn transform(index: usize, raw: &RawCountry) -> Result<SnapshotEntry, TransformError> {
    let label = raw
        .code()
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{}", index));
    let fail = |reason: &str| TransformError {
        code: label.clone(),
        reason: reason.to_string(),
    };
    let text = |field: &str, value: String, not_blank: bool, max: Option<usize>| {
        checked_text(field, value, not_blank, max).map_err(|reason| fail(reason.as_str()))
    };

    let record = raw
        .decode()
        .map_err(|e| fail(format!("malformed record: {}", e).as_str()))?;
    let code = raw.code().ok_or_else(|| fail("missing cca3"))?;
    let code = text("cca3", code.to_string(), true, Some(MAX_TEXT_LEN))?;
    let name = record
        .name
        .and_then(|n| n.common)
        .ok_or_else(|| fail("missing name.common"))?;
    let name = text("name.common", name, true, Some(MAX_TEXT_LEN))?;
    let region = record.region.ok_or_else(|| fail("missing region"))?;
    let region = text("region", region, true, Some(MAX_TEXT_LEN))?;
    let sub_region = text("subregion", record.subregion.unwrap_or_default(), false, Some(MAX_TEXT_LEN))?;
    let population = record.population.ok_or_else(|| fail("missing population"))?;
    if population < 0 {
        return Err(fail("negative population"));
    }
    let flag = record
        .flags
        .and_then(|f| f.png)
        .ok_or_else(|| fail("missing flags.png"))?;
    let flag = text("flags.png", flag, true, None)?;
    // Only the English feminine form is used, but only when demonyms are sent at all.
    let demonym = match record.demonyms {
        None => String::new(),
        Some(mut by_lang) => by_lang
            .get_mut("eng")
            .and_then(|g| g.remove("f"))
            .ok_or_else(|| fail("demonyms without eng.f"))?,
    };
    let demonym = text("demonyms.eng.f", demonym, false, Some(MAX_TEXT_LEN))?;
    let currency = record
        .currencies
        .map(|by_code| {
            by_code
                .into_values()
                .map(|c| Currency {
                    name: c.name.unwrap_or_default(),
                    symbol: c.symbol.unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(SnapshotEntry {
        code,
        fields: CountryFields {
            name,
            region,
            sub_region,
            demonym,
            population,
            independent: record.independent.unwrap_or(false),
            flag,
            currency,
        },
    })
}
