//! Materialized result rows
//!
//! A [`ResultRow`] is an ordered list of named cells. Cell names are unique
//! within a row: a name that is already taken gets `_1`, `_2`, ... appended
//! in encounter order, so a join returning two `ID` columns yields `ID` and
//! `ID_1`.

use super::value::DatabaseValue;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One named value of a row
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub name: String,
    /// Type name reported by the driver, empty when unknown
    pub declared_type: String,
    pub value: DatabaseValue,
}

/// An ordered row of uniquely named cells
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultRow {
    cells: Vec<Cell>,
}

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
        }
    }

    /// Append a cell, renaming it if the name is already taken
    ///
    /// Returns the name the cell was stored under.
    pub fn push(
        &mut self,
        name: impl Into<String>,
        declared_type: impl Into<String>,
        value: DatabaseValue,
    ) -> &str {
        let name = self.unique_name(name.into());
        self.cells.push(Cell {
            name,
            declared_type: declared_type.into(),
            value,
        });
        &self.cells[self.cells.len() - 1].name
    }

    /// Builder-style [`push`](Self::push) with an empty declared type
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<DatabaseValue>) -> Self {
        self.push(name, "", value.into());
        self
    }

    fn unique_name(&self, name: String) -> String {
        if !self.contains(&name) {
            return name;
        }
        (1..)
            .map(|n| format!("{name}_{n}"))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or(name)
    }

    /// Value of the named cell
    pub fn get(&self, name: &str) -> Option<&DatabaseValue> {
        self.cell(name).map(|c| &c.value)
    }

    /// Value of the named cell, ignoring ASCII case when no exact match exists
    pub fn get_ignore_case(&self, name: &str) -> Option<&DatabaseValue> {
        self.get(name).or_else(|| {
            self.cells
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(name))
                .map(|c| &c.value)
        })
    }

    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cells.iter().any(|c| c.name == name)
    }

    /// Value by position
    pub fn get_index(&self, ordinal: usize) -> Option<&DatabaseValue> {
        self.cells.get(ordinal).map(|c| &c.value)
    }

    /// Replace the value of an existing cell
    pub fn set(&mut self, name: &str, value: impl Into<DatabaseValue>) -> bool {
        match self.cells.iter_mut().find(|c| c.name == name) {
            Some(cell) => {
                cell.value = value.into();
                true
            }
            None => false,
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Render as a JSON object, keys in column order
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for cell in &self.cells {
            map.serialize_entry(&cell.name, &JsonCell(&cell.value))?;
        }
        map.end()
    }
}

/// Plain JSON rendering of a cell value (no variant tags)
struct JsonCell<'a>(&'a DatabaseValue);

impl Serialize for JsonCell<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            DatabaseValue::Null => serializer.serialize_none(),
            DatabaseValue::Bool(v) => serializer.serialize_bool(*v),
            DatabaseValue::Int(v) => serializer.serialize_i32(*v),
            DatabaseValue::Long(v) => serializer.serialize_i64(*v),
            DatabaseValue::Float(v) => serializer.serialize_f32(*v),
            DatabaseValue::Double(v) => serializer.serialize_f64(*v),
            DatabaseValue::Bytes(b) => b.serialize(serializer),
            other => serializer.serialize_str(&other.as_string()),
        }
    }
}
