//! Sort orders for entry listings.

use serde::{Deserialize, Serialize};
use shared::pagination::SortDirection;
use std::fmt;
use std::str::FromStr;

/// Entry attribute a listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntrySortField {
    Key,
    ValidFrom,
    Created,
    Id,
}

impl EntrySortField {
    /// Column backing this field in the `scheduled_config_entries` table.
    pub fn column(&self) -> &'static str {
        match self {
            EntrySortField::Key => "config_key",
            EntrySortField::ValidFrom => "valid_from",
            EntrySortField::Created => "created",
            EntrySortField::Id => "id",
        }
    }
}

impl fmt::Display for EntrySortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntrySortField::Key => write!(f, "key"),
            EntrySortField::ValidFrom => write!(f, "validFrom"),
            EntrySortField::Created => write!(f, "created"),
            EntrySortField::Id => write!(f, "id"),
        }
    }
}

impl FromStr for EntrySortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "key" => Ok(EntrySortField::Key),
            "validfrom" | "valid_from" => Ok(EntrySortField::ValidFrom),
            "created" => Ok(EntrySortField::Created),
            "id" => Ok(EntrySortField::Id),
            _ => Err(format!("Unknown sort field: {}", s)),
        }
    }
}

/// Ordered list of sort keys, most significant first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySort {
    keys: Vec<(EntrySortField, SortDirection)>,
}

impl EntrySort {
    pub fn new(keys: Vec<(EntrySortField, SortDirection)>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[(EntrySortField, SortDirection)] {
        &self.keys
    }

    /// Sort keys with `id ASC` appended unless `id` is already present, so
    /// that every ordering is total.
    pub fn with_id_tiebreak(&self) -> Vec<(EntrySortField, SortDirection)> {
        let mut keys = self.keys.clone();
        if !keys.iter().any(|(field, _)| *field == EntrySortField::Id) {
            keys.push((EntrySortField::Id, SortDirection::Asc));
        }
        keys
    }

    /// `ORDER BY` body built only from whitelisted column names.
    pub fn to_sql(&self) -> String {
        self.with_id_tiebreak()
            .iter()
            .map(|(field, direction)| format!("{} {}", field.column(), direction.as_sql()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Key ascending, then `validFrom` ascending.
impl Default for EntrySort {
    fn default() -> Self {
        Self::new(vec![
            (EntrySortField::Key, SortDirection::Asc),
            (EntrySortField::ValidFrom, SortDirection::Asc),
        ])
    }
}

impl FromStr for EntrySort {
    type Err = String;

    /// Parses `field[:asc|desc]` items separated by commas.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut keys = Vec::new();
        for item in s.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            let (field, direction) = match item.split_once(':') {
                Some((field, direction)) => (field.trim(), direction.trim().parse()?),
                None => (item, SortDirection::Asc),
            };
            let field: EntrySortField = field.parse()?;
            if keys.iter().any(|(existing, _)| *existing == field) {
                return Err(format!("Duplicate sort field: {}", field));
            }
            keys.push((field, direction));
        }
        if keys.is_empty() {
            return Err("Sort order must name at least one field".to_string());
        }
        Ok(Self::new(keys))
    }
}
