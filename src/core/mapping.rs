//! Column mapping for typed records
//!
//! A [`TableMap`] describes how a record type maps onto a table: its table
//! and schema names, and one [`PropertyMap`] per property with the column it
//! reads from and the flags that decide whether it takes part in a given
//! operation. Maps are built once per type, usually through
//! [`ColumnMapper`], and reused for every row.
//!
//! ```
//! use rust_data_access::core::mapping::{ColumnMapper, PropertyMap, TableMap};
//! use std::sync::OnceLock;
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl ColumnMapper for User {
//!     fn table_map() -> &'static TableMap<Self> {
//!         static MAP: OnceLock<TableMap<User>> = OnceLock::new();
//!         MAP.get_or_init(|| {
//!             TableMap::new("users")
//!                 .with(PropertyMap::new("id", |u: &User| u.id, |u, v| u.id = v).key().identity())
//!                 .with(PropertyMap::new("name", |u: &User| u.name.clone(), |u, v| u.name = v))
//!         })
//!     }
//! }
//!
//! assert_eq!(User::table_map().key_properties().count(), 1);
//! ```

use super::error::PropertyFailure;
use super::value::{DatabaseValue, SqlType};
use std::fmt;

type Getter<T> = Box<dyn Fn(&T) -> DatabaseValue + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, &DatabaseValue) -> bool + Send + Sync>;

/// Which optional properties take part in an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MappingOptions {
    /// Include properties marked read-only
    pub include_read_only: bool,
    /// Include properties whose value the database computes
    pub include_computed: bool,
}

impl MappingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every mapped property, regardless of flags
    pub fn all() -> Self {
        Self {
            include_read_only: true,
            include_computed: true,
        }
    }

    #[must_use]
    pub fn with_read_only(mut self, include: bool) -> Self {
        self.include_read_only = include;
        self
    }

    #[must_use]
    pub fn with_computed(mut self, include: bool) -> Self {
        self.include_computed = include;
        self
    }
}

/// Mapping of one property of `T` to a column
pub struct PropertyMap<T> {
    name: String,
    column: String,
    type_name: String,
    key: bool,
    identity: bool,
    computed: bool,
    read_only: bool,
    not_mapped: bool,
    getter: Getter<T>,
    setter: Setter<T>,
}

impl<T> PropertyMap<T> {
    /// Map a property through a getter and a setter
    ///
    /// The column name defaults to the property name. A null value assigned
    /// to a non-`Option` property leaves the property untouched.
    pub fn new<V, G, S>(name: impl Into<String>, get: G, set: S) -> Self
    where
        V: SqlType + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let name = name.into().trim().to_string();
        Self {
            column: name.clone(),
            name,
            type_name: V::sql_type_name(),
            key: false,
            identity: false,
            computed: false,
            read_only: false,
            not_mapped: false,
            getter: Box::new(move |instance| get(instance).to_value()),
            setter: Box::new(move |instance, value| {
                if value.is_null() && !V::NULLABLE {
                    return true;
                }
                match V::from_value(value) {
                    Some(v) => {
                        set(instance, v);
                        true
                    }
                    None => false,
                }
            }),
        }
    }

    /// Read from a differently named column
    ///
    /// Blank names are ignored.
    #[must_use]
    pub fn column(mut self, column: impl AsRef<str>) -> Self {
        let column = column.as_ref().trim();
        if !column.is_empty() {
            self.column = column.to_string();
        }
        self
    }

    #[must_use]
    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    /// Generated by the database on insert
    #[must_use]
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    #[must_use]
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    #[must_use]
    pub fn not_mapped(mut self) -> Self {
        self.not_mapped = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_name(&self) -> &str {
        &self.column
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is_key(&self) -> bool {
        self.key
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    pub fn is_computed(&self) -> bool {
        self.computed
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_not_mapped(&self) -> bool {
        self.not_mapped
    }

    /// Whether the property takes part under `options`
    pub fn is_valid(&self, options: &MappingOptions) -> bool {
        !self.not_mapped
            && (options.include_read_only || !self.read_only)
            && (options.include_computed || !self.computed)
    }

    /// Current value of the property
    pub fn read(&self, instance: &T) -> DatabaseValue {
        (self.getter)(instance)
    }

    /// Assign a cell value to the property
    ///
    /// # Errors
    ///
    /// Returns the failure details when the value does not convert to the
    /// property type.
    pub fn assign(&self, instance: &mut T, value: &DatabaseValue) -> Result<(), PropertyFailure> {
        if (self.setter)(instance, value) {
            Ok(())
        } else {
            Err(PropertyFailure {
                property: self.name.clone(),
                property_type: self.type_name.clone(),
                value: value.as_string(),
                value_type: value.type_name().to_string(),
            })
        }
    }
}

impl<T> fmt::Debug for PropertyMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMap")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("type_name", &self.type_name)
            .field("key", &self.key)
            .field("identity", &self.identity)
            .field("computed", &self.computed)
            .field("read_only", &self.read_only)
            .field("not_mapped", &self.not_mapped)
            .finish()
    }
}

/// Mapping of a record type onto a table
#[derive(Debug)]
pub struct TableMap<T> {
    target_type: String,
    table: String,
    schema: Option<String>,
    properties: Vec<PropertyMap<T>>,
}

impl<T> TableMap<T> {
    /// Map onto an explicitly named table
    ///
    /// A blank name falls back to the type name.
    pub fn new(table: impl AsRef<str>) -> Self {
        let target_type = short_type_name::<T>();
        let table = table.as_ref().trim();
        Self {
            table: if table.is_empty() {
                target_type.clone()
            } else {
                table.to_string()
            },
            target_type,
            schema: None,
            properties: Vec::new(),
        }
    }

    /// Map onto a table named after the type
    pub fn for_type() -> Self {
        Self::new("")
    }

    #[must_use]
    pub fn schema(mut self, schema: impl AsRef<str>) -> Self {
        let schema = schema.as_ref().trim();
        self.schema = (!schema.is_empty()).then(|| schema.to_string());
        self
    }

    #[must_use]
    pub fn with(mut self, property: PropertyMap<T>) -> Self {
        self.properties.push(property);
        self
    }

    /// Unqualified name of the mapped type
    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    pub fn properties(&self) -> &[PropertyMap<T>] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyMap<T>> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Properties that take part under `options`, in declaration order
    pub fn valid_properties<'a>(
        &'a self,
        options: &'a MappingOptions,
    ) -> impl Iterator<Item = &'a PropertyMap<T>> + 'a {
        self.properties.iter().filter(move |p| p.is_valid(options))
    }

    pub fn key_properties(&self) -> impl Iterator<Item = &PropertyMap<T>> {
        self.properties.iter().filter(|p| p.key && !p.not_mapped)
    }
}

/// Table metadata consumed by SQL generation and materialization
///
/// [`TableMap`] implements it; hand-written implementations can stand in for
/// any other source of metadata.
pub trait EntityMetadata {
    fn table_name(&self) -> &str;

    fn schema_name(&self) -> Option<&str>;

    /// Column of a property, `None` for unknown or unmapped properties
    fn column_name(&self, property: &str) -> Option<&str>;

    fn key_columns(&self) -> Vec<&str>;

    fn identity_columns(&self) -> Vec<&str>;

    fn computed_columns(&self) -> Vec<&str>;
}

impl<T> EntityMetadata for TableMap<T> {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn schema_name(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    fn column_name(&self, property: &str) -> Option<&str> {
        self.property(property)
            .filter(|p| !p.not_mapped)
            .map(|p| p.column.as_str())
    }

    fn key_columns(&self) -> Vec<&str> {
        self.key_properties().map(|p| p.column.as_str()).collect()
    }

    fn identity_columns(&self) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|p| p.identity && !p.not_mapped)
            .map(|p| p.column.as_str())
            .collect()
    }

    fn computed_columns(&self) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|p| p.computed && !p.not_mapped)
            .map(|p| p.column.as_str())
            .collect()
    }
}

/// A record type with a statically registered [`TableMap`]
pub trait ColumnMapper: Default + Sized + 'static {
    fn table_map() -> &'static TableMap<Self>;
}

fn short_type_name<T>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).trim().to_string()
}
