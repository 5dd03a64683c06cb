use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Paginated list envelope returned by every list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Response from `/api/token/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Bath,
    Bedroom,
    DoubleRoom,
    DiningRoom,
    Entrance,
    Hallway,
    Kitchen,
    LivingRoom,
}

impl Location {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bath => "bath",
            Self::Bedroom => "bedroom",
            Self::DoubleRoom => "double_room",
            Self::DiningRoom => "dining_room",
            Self::Entrance => "entrance",
            Self::Hallway => "hallway",
            Self::Kitchen => "kitchen",
            Self::LivingRoom => "living_room",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User role. The API speaks integer codes; older payloads use the names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    BuildingOwner,
    Resident,
}

impl Role {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Admin => 0,
            Self::BuildingOwner => 10,
            Self::Resident => 20,
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Admin),
            10 => Some(Self::BuildingOwner),
            20 => Some(Self::Resident),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::BuildingOwner => "Building Owner",
            Self::Resident => "Resident",
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Code(u8),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Code(code) => Self::from_code(code)
                .ok_or_else(|| de::Error::custom(format!("unknown role code {code}"))),
            Repr::Text(text) => text.parse().map_err(de::Error::custom),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Self::from_code(code).ok_or_else(|| format!("unknown role code {code}"));
        }
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "admin" => Ok(Self::Admin),
            "building_owner" => Ok(Self::BuildingOwner),
            "resident" => Ok(Self::Resident),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: i64,
    pub number: i64,
    #[serde(default)]
    pub owner: Option<i64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub floors: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub id: i64,
    pub number: String,
    pub building: i64,
    #[serde(default)]
    pub resident: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub number: i64,
    pub house: i64,
    pub location: Location,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub last_state: String,
    #[serde(default)]
    pub owner: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: i64,
    pub device: i64,
    pub serial_number: i64,
    pub date: DateTime<Utc>,
    pub reading_value: f64,
    pub unit: String,
    pub power: f64,
    pub method: String,
    pub battery_level: f64,
    #[serde(default)]
    pub user: Option<i64>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl User {
    /// Name shown wherever a user is referenced by another record.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Payload for `POST /api/users/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserDraft {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}
