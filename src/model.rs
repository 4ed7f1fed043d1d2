//! Country entity shared by the CRUD surface and the sync reconciler.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest value accepted for the short text columns (name, region, sub region, demonym).
pub const MAX_TEXT_LEN: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub name: String,
    pub symbol: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: Uuid,
    /// Natural key from the external dataset. `None` for countries created through the API.
    pub external_code: Option<String>,
    pub name: String,
    pub region: String,
    pub sub_region: String,
    pub demonym: String,
    pub population: i64,
    pub independent: bool,
    pub flag: String,
    pub currency: Vec<Currency>,
}

/// Every field of a country except its identity. Produced by request validation and by
/// the snapshot transform, then turned into a new [`Country`] or written over an existing one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountryFields {
    pub name: String,
    pub region: String,
    pub sub_region: String,
    pub demonym: String,
    pub population: i64,
    pub independent: bool,
    pub flag: String,
    pub currency: Vec<Currency>,
}

impl CountryFields {
    /// New country with a freshly generated id.
    pub fn into_country(self, external_code: Option<String>) -> Country {
        Country {
            id: Uuid::new_v4(),
            external_code,
            name: self.name,
            region: self.region,
            sub_region: self.sub_region,
            demonym: self.demonym,
            population: self.population,
            independent: self.independent,
            flag: self.flag,
            currency: self.currency,
        }
    }

    /// True when `country` already carries exactly these values.
    pub fn matches(&self, country: &Country) -> bool {
        self.name == country.name
            && self.region == country.region
            && self.sub_region == country.sub_region
            && self.demonym == country.demonym
            && self.population == country.population
            && self.independent == country.independent
            && self.flag == country.flag
            && self.currency == country.currency
    }

    /// Overwrite all mapped fields; `id` and `external_code` are left alone.
    pub fn apply_to(&self, country: &mut Country) {
        country.name = self.name.clone();
        country.region = self.region.clone();
        country.sub_region = self.sub_region.clone();
        country.demonym = self.demonym.clone();
        country.population = self.population;
        country.independent = self.independent;
        country.flag = self.flag.clone();
        country.currency = self.currency.clone();
    }
}

/// Partial update: only `Some` fields are written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountryPatch {
    pub name: Option<String>,
    pub region: Option<String>,
    pub sub_region: Option<String>,
    pub demonym: Option<String>,
    pub population: Option<i64>,
    pub independent: Option<bool>,
    pub flag: Option<String>,
    pub currency: Option<Vec<Currency>>,
}

impl CountryPatch {
    pub fn is_empty(&self) -> bool {
        *self == CountryPatch::default()
    }

    pub fn apply_to(self, country: &mut Country) {
        if let Some(v) = self.name {
            country.name = v;
        }
        if let Some(v) = self.region {
            country.region = v;
        }
        if let Some(v) = self.sub_region {
            country.sub_region = v;
        }
        if let Some(v) = self.demonym {
            country.demonym = v;
        }
        if let Some(v) = self.population {
            country.population = v;
        }
        if let Some(v) = self.independent {
            country.independent = v;
        }
        if let Some(v) = self.flag {
            country.flag = v;
        }
        if let Some(v) = self.currency {
            country.currency = v;
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_fields(name: &str) -> CountryFields {
    CountryFields {
        name: name.to_string(),
        region: "Europe".into(),
        sub_region: "Northern Europe".into(),
        demonym: format!("{}ian", name),
        population: 1000,
        independent: true,
        flag: format!("https://flags.example/{}.png", name.to_lowercase()),
        currency: vec![Currency {
            name: "Euro".into(),
            symbol: "€".into(),
        }],
    }
}
