use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::api::models::{Building, Device, House, Reading, User};

/// Records shown per list page by the remote API.
pub const PAGE_SIZE: u64 = 10;

/// Number of pages for a result count. An empty result still has one page.
#[must_use]
pub fn total_pages(count: u64) -> u64 {
    count.div_ceil(PAGE_SIZE).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buildings,
    Houses,
    Devices,
    Readings,
    Users,
}

impl ResourceKind {
    pub const ALL: [Self; 5] = [
        Self::Buildings,
        Self::Houses,
        Self::Devices,
        Self::Readings,
        Self::Users,
    ];

    /// Path segment under `/api/`.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Buildings => "buildings",
            Self::Houses => "houses",
            Self::Devices => "devices",
            Self::Readings => "readings",
            Self::Users => "users",
        }
    }

    #[must_use]
    pub fn singular(self) -> &'static str {
        match self {
            Self::Buildings => "building",
            Self::Houses => "house",
            Self::Devices => "device",
            Self::Readings => "reading",
            Self::Users => "user",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.path() == s || kind.singular() == s)
            .ok_or_else(|| format!("unknown resource '{s}'"))
    }
}

/// A record kind served under `/api/{kind}/`.
///
/// Implementors describe how a row is displayed and which of its fields
/// reference users, so list screens stay declarative.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn id(&self) -> i64;

    /// `(header, value)` pairs for a list row.
    fn columns(&self) -> Vec<(&'static str, String)>;

    /// Fields holding a user id, resolved to display names for listing.
    fn user_fields(&self) -> Vec<(&'static str, Option<i64>)> {
        Vec::new()
    }
}

fn opt<T: ToString>(value: Option<&T>) -> String {
    value.map_or_else(|| "NA".to_string(), ToString::to_string)
}

impl Resource for Building {
    const KIND: ResourceKind = ResourceKind::Buildings;

    fn id(&self) -> i64 {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Building Number", self.number.to_string()),
            ("Address", opt(self.address.as_ref())),
            ("Floors", opt(self.floors.as_ref())),
        ]
    }

    fn user_fields(&self) -> Vec<(&'static str, Option<i64>)> {
        vec![("owner", self.owner)]
    }
}

impl Resource for House {
    const KIND: ResourceKind = ResourceKind::Houses;

    fn id(&self) -> i64 {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, String)> {
        vec![
            ("House Number", self.number.clone()),
            ("Building", self.building.to_string()),
        ]
    }

    fn user_fields(&self) -> Vec<(&'static str, Option<i64>)> {
        vec![("resident", self.resident)]
    }
}

impl Resource for Device {
    const KIND: ResourceKind = ResourceKind::Devices;

    fn id(&self) -> i64 {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Device Number", self.number.to_string()),
            ("House", self.house.to_string()),
            ("Location", self.location.to_string()),
            ("Type", self.device_type.clone()),
            ("Last State", self.last_state.clone()),
        ]
    }

    fn user_fields(&self) -> Vec<(&'static str, Option<i64>)> {
        vec![("owner", self.owner)]
    }
}

impl Resource for Reading {
    const KIND: ResourceKind = ResourceKind::Readings;

    fn id(&self) -> i64 {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Device", self.device.to_string()),
            ("Serial Number", self.serial_number.to_string()),
            ("Date", self.date.format("%Y-%m-%d %H:%M").to_string()),
            ("Value", format!("{} {}", self.reading_value, self.unit)),
            ("Power", self.power.to_string()),
            ("Method", self.method.clone()),
            ("Battery", self.battery_level.to_string()),
        ]
    }

    fn user_fields(&self) -> Vec<(&'static str, Option<i64>)> {
        vec![("user", self.user)]
    }
}

impl Resource for User {
    const KIND: ResourceKind = ResourceKind::Users;

    fn id(&self) -> i64 {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Username", self.username.clone()),
            ("First Name", self.first_name.clone()),
            ("Last Name", self.last_name.clone()),
            ("Email", self.email.clone()),
            ("Role", self.role.to_string()),
            ("Active", self.is_active.to_string()),
        ]
    }
}
