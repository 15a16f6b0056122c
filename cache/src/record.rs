//! Domain records as handed over by the persistent store, and the classifier
//! that assigns each one a [`DomainType`].

use crate::time;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The kind of domain item a cache entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainType {
  Recipe,
  Ingredient,
  Technique,
  Menu,
}

impl DomainType {
  /// All domain types, in load order.
  pub const ALL: [DomainType; 4] = [
    DomainType::Recipe,
    DomainType::Ingredient,
    DomainType::Technique,
    DomainType::Menu,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      DomainType::Recipe => "recipe",
      DomainType::Ingredient => "ingredient",
      DomainType::Technique => "technique",
      DomainType::Menu => "menu",
    }
  }
}

impl fmt::Display for DomainType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for DomainType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "recipe" => Ok(DomainType::Recipe),
      "ingredient" => Ok(DomainType::Ingredient),
      "technique" => Ok(DomainType::Technique),
      "menu" => Ok(DomainType::Menu),
      other => Err(format!("unknown domain type '{other}'")),
    }
  }
}

/// A raw domain record (recipe, ingredient, technique or menu) as a JSON
/// document.
///
/// The cache only reads a handful of well-known fields; everything else is
/// carried along untouched and only contributes to the size estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainRecord(Map<String, Value>);

impl DomainRecord {
  /// Wraps a JSON value. Non-object values become an empty record.
  pub fn new(value: Value) -> Self {
    match value {
      Value::Object(map) => Self(map),
      _ => Self(Map::new()),
    }
  }

  pub fn fields(&self) -> &Map<String, Value> {
    &self.0
  }

  pub fn get(&self, field: &str) -> Option<&Value> {
    self.0.get(field)
  }

  /// The record id. Numeric ids are rendered as strings; blank ids count as
  /// missing.
  pub fn id(&self) -> Option<String> {
    match self.0.get("id")? {
      Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
      Value::Number(n) => Some(n.to_string()),
      _ => None,
    }
  }

  pub fn is_favorite(&self) -> bool {
    self.0.get("isFavorite").and_then(Value::as_bool).unwrap_or(false)
  }

  pub fn order_count(&self) -> u64 {
    self.0.get("orderCount").and_then(Value::as_u64).unwrap_or(0)
  }

  pub fn rating(&self) -> Option<f64> {
    self.0.get("rating").and_then(Value::as_f64)
  }

  /// Reads a timestamp field, ignoring values that do not parse.
  pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
    self.0.get(field).and_then(time::parse_timestamp)
  }

  /// When the record was last synchronised with the remote side.
  pub fn last_synced(&self) -> Option<DateTime<Utc>> {
    self.timestamp("lastSynced")
  }

  /// The most recent of `lastMade` and `lastUsed`.
  pub fn last_used(&self) -> Option<DateTime<Utc>> {
    match (self.timestamp("lastMade"), self.timestamp("lastUsed")) {
      (Some(a), Some(b)) => Some(a.max(b)),
      (a, b) => a.or(b),
    }
  }

  pub fn tags(&self) -> BTreeSet<String> {
    self
      .0
      .get("tags")
      .and_then(Value::as_array)
      .map(|tags| {
        tags
          .iter()
          .filter_map(Value::as_str)
          .map(str::to_owned)
          .collect()
      })
      .unwrap_or_default()
  }

  /// Names of the items this record references: a recipe's ingredients or a
  /// menu's items.
  pub fn dependencies(&self) -> BTreeSet<String> {
    ["ingredients", "items"]
      .iter()
      .filter_map(|field| self.0.get(*field).and_then(Value::as_array))
      .flatten()
      .filter_map(reference_name)
      .collect()
  }

  /// The serialized JSON form, used for size and compression estimates.
  pub fn to_json(&self) -> String {
    // Serializing a `Map<String, Value>` cannot fail.
    serde_json::to_string(&self.0).unwrap_or_default()
  }
}

impl From<Value> for DomainRecord {
  fn from(value: Value) -> Self {
    Self::new(value)
  }
}

fn reference_name(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Object(obj) => obj
      .get("name")
      .or_else(|| obj.get("id"))
      .and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
      }),
    _ => None,
  }
}

/// Infers the domain type of a record from its shape.
///
/// - an `ingredients` list means a recipe
/// - `category` together with `price` means an ingredient
/// - a `steps` field means a technique
/// - an `items` list means a menu
///
/// Records matching none of these are treated as recipes.
pub fn classify(record: &DomainRecord) -> DomainType {
  let fields = record.fields();
  let is_array = |field: &str| fields.get(field).is_some_and(Value::is_array);

  if is_array("ingredients") {
    DomainType::Recipe
  } else if fields.contains_key("category") && fields.contains_key("price") {
    DomainType::Ingredient
  } else if fields.contains_key("steps") {
    DomainType::Technique
  } else if is_array("items") {
    DomainType::Menu
  } else {
    DomainType::Recipe
  }
}
