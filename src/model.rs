use chrono::{DateTime, Local, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One input row: the place we are trying to find on the map provider.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SeedRecord {
    #[serde(alias = "id", alias = "identifier")]
    pub place_id: String,
    pub name: String,
    pub address: String,
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude", alias = "lng")]
    pub lon: f64,
    #[serde(rename = "type", alias = "category", default)]
    pub kind: String,
}

/// Assembled output for one seed. Everything except the seed-derived fields is optional.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaceRecord {
    pub place_id: String,
    pub name: String,
    pub original_address: String,
    pub new_address: Option<String>,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub category: Option<String>,
    pub about: Option<Vec<String>>,
    pub rating: Option<f32>,
    pub rating_count: Option<u32>,
    pub price_level: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub google_maps_url: Option<String>,
    pub opening_hours: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub comments: Vec<Review>,
    pub scraped_at: DateTime<Local>,
}

impl PlaceRecord {
    /// Empty record carrying only what the seed already knows.
    pub fn from_seed(seed: &SeedRecord, scraped_at: DateTime<Local>) -> Self {
        PlaceRecord {
            place_id: seed.place_id.clone(),
            name: seed.name.clone(),
            original_address: seed.address.clone(),
            new_address: None,
            lat: seed.lat,
            lon: seed.lon,
            kind: seed.kind.clone(),
            category: None,
            about: None,
            rating: None,
            rating_count: None,
            price_level: None,
            images: Vec::new(),
            phone: None,
            website: None,
            google_maps_url: None,
            opening_hours: None,
            comments: Vec::new(),
            scraped_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Review {
    pub author: String,
    pub rating: f32,
    pub text: String,
    /// Approximate: resolved from a relative phrase ("2 months ago") at capture time.
    #[serde(with = "day_month_year")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Affirmative,
    Negative,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Affirmative => "Có",
            Polarity::Negative => "Không",
        }
    }
}

/// `"<Có|Không>: <feature>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AmenityTag(String);

impl AmenityTag {
    pub fn new(polarity: Polarity, feature: &str) -> Self {
        AmenityTag(format!("{}: {}", polarity.as_str(), feature.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

mod day_month_year {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%d/%m/%Y";

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format(FORMAT).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| NaiveDate::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn seed() -> SeedRecord {
        SeedRecord {
            place_id: "p1".into(),
            name: "Bảo tàng Khánh Hòa".into(),
            address: "16 Trần Phú, Nha Trang".into(),
            lat: 12.24,
            lon: 109.19,
            kind: "museum".into(),
        }
    }

    #[test]
    fn seed_fields_always_populated() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let r = PlaceRecord::from_seed(&seed(), at);
        assert_eq!(r.place_id, "p1");
        assert_eq!(r.original_address, "16 Trần Phú, Nha Trang");
        assert_eq!(r.kind, "museum");
        assert!(r.new_address.is_none() && r.rating.is_none() && r.comments.is_empty());
    }

    #[test]
    fn json_keeps_vietnamese_and_field_names() {
        let at = Local.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let mut r = PlaceRecord::from_seed(&seed(), at);
        r.comments.push(Review {
            author: "Lan".into(),
            rating: 5.0,
            text: "Rất đẹp và sạch sẽ".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 2),
        });
        let json = serde_json::to_string_pretty(&vec![r.clone()]).unwrap();
        assert!(json.contains("Bảo tàng Khánh Hòa"));
        assert!(json.contains("\"type\": \"museum\""));
        assert!(json.contains("\"date\": \"02/03/2024\""));

        let back: Vec<PlaceRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0], r);
    }

    #[test]
    fn amenity_tag_format() {
        assert_eq!(AmenityTag::new(Polarity::Affirmative, " Wifi ").as_str(), "Có: Wifi");
        assert_eq!(AmenityTag::new(Polarity::Negative, "Bãi đỗ xe").as_str(), "Không: Bãi đỗ xe");
    }
}
