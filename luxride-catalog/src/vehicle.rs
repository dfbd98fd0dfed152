use serde::{Deserialize, Deserializer, Serialize};

/// Pricing tier of a vehicle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Standard,
    Executive,
    Luxury,
}

impl VehicleClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::Standard => "standard",
            VehicleClass::Executive => "executive",
            VehicleClass::Luxury => "luxury",
        }
    }

    /// Infer the tier from free-form category text such as "Luxury Sedan"
    pub fn infer(category: &str) -> Self {
        let category = category.to_ascii_lowercase();
        if category.contains("luxury") {
            VehicleClass::Luxury
        } else if category.contains("executive") || category.contains("business") {
            VehicleClass::Executive
        } else {
            VehicleClass::Standard
        }
    }
}

/// Passenger and luggage capacity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "CapacityRepr")]
pub struct Capacity {
    pub passengers: u32,
    pub luggage: u32,
}

impl Capacity {
    pub fn fits(&self, passengers: u32, luggage: u32) -> bool {
        passengers <= self.passengers && luggage <= self.luggage
    }
}

// Older fixtures only carry a bare passenger count.
#[derive(Deserialize)]
#[serde(untagged)]
enum CapacityRepr {
    Detailed {
        passengers: u32,
        #[serde(default)]
        luggage: u32,
    },
    Passengers(u32),
}

impl From<CapacityRepr> for Capacity {
    fn from(repr: CapacityRepr) -> Self {
        match repr {
            CapacityRepr::Detailed { passengers, luggage } => Capacity { passengers, luggage },
            CapacityRepr::Passengers(passengers) => Capacity { passengers, luggage: 0 },
        }
    }
}

/// A vehicle offered in the catalog. Prices are held in cents; the JSON
/// fixture uses whole currency units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category: String,
    pub capacity: Capacity,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, rename = "basePrice", with = "dollars")]
    pub base_price_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "class", skip_serializing_if = "Option::is_none")]
    pub explicit_class: Option<VehicleClass>,
}

impl Vehicle {
    pub fn class(&self) -> VehicleClass {
        self.explicit_class
            .unwrap_or_else(|| VehicleClass::infer(&self.category))
    }

    pub fn multiplier(&self) -> f64 {
        self.price_multiplier.unwrap_or(1.0)
    }

    pub fn fits_party(&self, passengers: u32, luggage: u32) -> bool {
        self.capacity.fits(passengers, luggage)
    }
}

fn id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Number(u64),
        Text(String),
    }

    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Number(n) => n.to_string(),
        IdRepr::Text(s) => s,
    })
}

mod dollars {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(cents) => serializer.serialize_f64(*cents as f64 / 100.0),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let amount = Option::<f64>::deserialize(deserializer)?;
        Ok(amount.map(|dollars| (dollars * 100.0).round() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_shape() {
        let json = r#"{
            "id": 2,
            "name": "BMW 7 Series",
            "type": "Luxury Sedan",
            "capacity": { "passengers": 4, "luggage": 3 },
            "features": ["WiFi", "Premium Audio", "Privacy Glass"],
            "basePrice": 180,
            "description": "Flagship sedan"
        }"#;

        let vehicle: Vehicle = serde_json::from_str(json).unwrap();
        assert_eq!(vehicle.id, "2");
        assert_eq!(vehicle.base_price_cents, Some(18000));
        assert_eq!(vehicle.class(), VehicleClass::Luxury);
        assert_eq!(vehicle.features[1], "Premium Audio");
        assert!(vehicle.fits_party(4, 3));
        assert!(!vehicle.fits_party(5, 0));
    }

    #[test]
    fn test_bare_capacity_and_multiplier() {
        let json = r#"{
            "id": "suv",
            "name": "Luxury SUV",
            "type": "SUV",
            "capacity": 5,
            "priceMultiplier": 1.4,
            "class": "executive"
        }"#;

        let vehicle: Vehicle = serde_json::from_str(json).unwrap();
        assert_eq!(vehicle.capacity, Capacity { passengers: 5, luggage: 0 });
        assert_eq!(vehicle.base_price_cents, None);
        assert_eq!(vehicle.multiplier(), 1.4);
        assert_eq!(vehicle.class(), VehicleClass::Executive);
    }

    #[test]
    fn test_infer_class() {
        assert_eq!(VehicleClass::infer("Executive Van"), VehicleClass::Executive);
        assert_eq!(VehicleClass::infer("Business Van"), VehicleClass::Executive);
        assert_eq!(VehicleClass::infer("Sedan"), VehicleClass::Standard);
    }
}
