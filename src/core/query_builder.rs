//! Dialect-aware SQL generation
//!
//! [`SelectBuilder`] is a fluent SELECT builder whose output is a
//! [`CommandDescription`] with named parameters spelled for the target
//! dialect and vendor paging applied. [`EntitySql`] renders the standard
//! statements for a mapped record type.

use super::dialect::DialectSetting;
use super::error::{DatabaseError, Result};
use super::mapping::{EntityMetadata, MappingOptions, PropertyMap, TableMap};
use super::paging::PageInfo;
use super::parameter::{CommandDescription, CommandParameter};
use super::value::DatabaseValue;
use std::collections::HashSet;

/// SQL comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equal to (=)
    Eq,
    /// Not equal to (<>)
    Ne,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// LIKE pattern matching
    Like,
    /// IS NULL
    IsNull,
    /// IS NOT NULL
    IsNotNull,
}

impl Operator {
    fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Like => "LIKE",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }

    fn takes_value(&self) -> bool {
        !matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

/// WHERE clause condition
#[derive(Debug, Clone)]
pub struct Condition {
    column: String,
    operator: Operator,
    value: Option<DatabaseValue>,
}

/// JOIN types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

impl JoinType {
    fn as_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
        }
    }
}

#[derive(Debug, Clone)]
struct Join {
    join_type: JoinType,
    table: String,
    on_condition: String,
}

/// ORDER BY direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// SELECT query builder
///
/// ```
/// use rust_data_access::core::connection_kind::ConnectionKind;
/// use rust_data_access::core::dialect::DialectSetting;
/// use rust_data_access::core::query_builder::SelectBuilder;
///
/// let dialect = DialectSetting::for_kind(ConnectionKind::Postgres).unwrap();
/// let command = SelectBuilder::new("users")
///     .columns(&["id", "name"])
///     .where_eq("status", "active")
///     .build(&dialect)
///     .unwrap();
/// assert_eq!(
///     command.text(),
///     r#"SELECT "id", "name" FROM "users" WHERE "status" = @status"#
/// );
/// ```
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    table: String,
    schema: Option<String>,
    columns: Vec<String>,
    joins: Vec<Join>,
    where_conditions: Vec<Condition>,
    where_logic: &'static str,
    group_by: Vec<String>,
    order_by: Vec<(String, OrderDirection)>,
    page: PageInfo,
}

impl SelectBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            schema: None,
            columns: Vec::new(),
            joins: Vec::new(),
            where_conditions: Vec::new(),
            where_logic: "AND",
            group_by: Vec::new(),
            order_by: Vec::new(),
            page: PageInfo::default(),
        }
    }

    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Select specific columns; none selects `*`
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    fn condition(mut self, column: &str, operator: Operator, value: Option<DatabaseValue>) -> Self {
        self.where_conditions.push(Condition {
            column: column.to_string(),
            operator,
            value,
        });
        self
    }

    #[must_use]
    pub fn where_eq(self, column: &str, value: impl Into<DatabaseValue>) -> Self {
        self.condition(column, Operator::Eq, Some(value.into()))
    }

    #[must_use]
    pub fn where_ne(self, column: &str, value: impl Into<DatabaseValue>) -> Self {
        self.condition(column, Operator::Ne, Some(value.into()))
    }

    #[must_use]
    pub fn where_lt(self, column: &str, value: impl Into<DatabaseValue>) -> Self {
        self.condition(column, Operator::Lt, Some(value.into()))
    }

    #[must_use]
    pub fn where_le(self, column: &str, value: impl Into<DatabaseValue>) -> Self {
        self.condition(column, Operator::Le, Some(value.into()))
    }

    #[must_use]
    pub fn where_gt(self, column: &str, value: impl Into<DatabaseValue>) -> Self {
        self.condition(column, Operator::Gt, Some(value.into()))
    }

    #[must_use]
    pub fn where_ge(self, column: &str, value: impl Into<DatabaseValue>) -> Self {
        self.condition(column, Operator::Ge, Some(value.into()))
    }

    #[must_use]
    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.condition(column, Operator::Like, Some(DatabaseValue::from(pattern)))
    }

    #[must_use]
    pub fn where_null(self, column: &str) -> Self {
        self.condition(column, Operator::IsNull, None)
    }

    #[must_use]
    pub fn where_not_null(self, column: &str) -> Self {
        self.condition(column, Operator::IsNotNull, None)
    }

    /// Join WHERE conditions with OR instead of AND
    #[must_use]
    pub fn or_where(mut self) -> Self {
        self.where_logic = "OR";
        self
    }

    /// Add an INNER JOIN; the ON condition is used verbatim
    #[must_use]
    pub fn join(mut self, table: &str, on_condition: &str) -> Self {
        self.joins.push(Join {
            join_type: JoinType::Inner,
            table: table.to_string(),
            on_condition: on_condition.to_string(),
        });
        self
    }

    #[must_use]
    pub fn left_join(mut self, table: &str, on_condition: &str) -> Self {
        self.joins.push(Join {
            join_type: JoinType::Left,
            table: table.to_string(),
            on_condition: on_condition.to_string(),
        });
        self
    }

    #[must_use]
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.order_by.push((column.to_string(), direction));
        self
    }

    #[must_use]
    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, OrderDirection::Asc)
    }

    #[must_use]
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, OrderDirection::Desc)
    }

    /// Restrict to a page using the dialect's paging syntax
    #[must_use]
    pub fn page(mut self, page: PageInfo) -> Self {
        self.page = page;
        self
    }

    /// Render for a dialect
    ///
    /// # Errors
    ///
    /// Returns an error if the table name is blank, or if a page is requested
    /// from a dialect without paging syntax.
    pub fn build(&self, dialect: &DialectSetting) -> Result<CommandDescription> {
        self.build_with_prefix(dialect, dialect.parameter_prefix())
    }

    /// Like [`build`](Self::build), with placeholders spelled using `prefix`
    ///
    /// Use the same prefix the command builder will apply to the parameter
    /// names, e.g. a session-wide override.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn build_with_prefix(&self, dialect: &DialectSetting, prefix: &str) -> Result<CommandDescription> {
        if self.table.trim().is_empty() {
            return Err(DatabaseError::invalid_argument("table name must not be blank"));
        }

        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns
                .iter()
                .map(|c| quote_column(dialect, c))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut sql = format!(
            "SELECT {} FROM {}",
            columns,
            dialect.qualified_table(self.schema.as_deref(), &self.table)
        );

        for join in &self.joins {
            sql.push_str(&format!(
                " {} {} ON {}",
                join.join_type.as_sql(),
                quote_column(dialect, &join.table),
                join.on_condition
            ));
        }

        let mut names = ParameterNames::default();
        let mut parameters = Vec::new();
        if !self.where_conditions.is_empty() {
            let clauses: Vec<String> = self
                .where_conditions
                .iter()
                .map(|cond| {
                    let column = quote_column(dialect, &cond.column);
                    match (&cond.value, cond.operator.takes_value()) {
                        (Some(value), true) => {
                            let name = names.unique(&cond.column);
                            let clause = format!(
                                "{} {} {}",
                                column,
                                cond.operator.as_sql(),
                                dialect.placeholder_with_prefix(&name, prefix)
                            );
                            parameters.push(CommandParameter::new(name, value.clone()));
                            clause
                        }
                        _ => format!("{} {}", column, cond.operator.as_sql()),
                    }
                })
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(&format!(" {} ", self.where_logic)));
        }

        if !self.group_by.is_empty() {
            let group: Vec<String> = self.group_by.iter().map(|c| quote_column(dialect, c)).collect();
            sql.push_str(&format!(" GROUP BY {}", group.join(", ")));
        }

        if !self.order_by.is_empty() {
            let order: Vec<String> = self
                .order_by
                .iter()
                .map(|(col, dir)| format!("{} {}", quote_column(dialect, col), dir.as_sql()))
                .collect();
            sql.push_str(&format!(" ORDER BY {}", order.join(", ")));
        }

        let sql = dialect.paging_sql(&sql, self.page)?;
        let mut description = CommandDescription::new(sql);
        for parameter in parameters {
            description.add_parameter(parameter);
        }
        Ok(description)
    }
}

/// Quote plain identifiers; expressions pass through untouched
fn quote_column(dialect: &DialectSetting, column: &str) -> String {
    let column = column.trim();
    let plain = column
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '*');
    if plain {
        dialect.quote_identifier(column)
    } else {
        column.to_string()
    }
}

/// Parameter names derived from column names, unique within one statement
#[derive(Default)]
struct ParameterNames {
    used: HashSet<String>,
}

impl ParameterNames {
    fn unique(&mut self, column: &str) -> String {
        let base: String = column
            .trim()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        let base = if base.is_empty() { "p".to_string() } else { base };
        let mut name = base.clone();
        let mut n = 0;
        while !self.used.insert(name.clone()) {
            n += 1;
            name = format!("{base}_{n}");
        }
        name
    }
}

/// Standard statements for a mapped record type
///
/// Parameters are named after properties; the command builder applies the
/// prefix. Table, schema and column names come from an [`EntityMetadata`],
/// the record's own [`TableMap`] unless [`with_metadata`](Self::with_metadata)
/// supplies another source. Property values and flags always come from the
/// map.
pub struct EntitySql<'a, T, M: ?Sized = TableMap<T>> {
    map: &'a TableMap<T>,
    metadata: &'a M,
    dialect: &'a DialectSetting,
    prefix: Option<String>,
}

impl<'a, T> EntitySql<'a, T> {
    pub fn new(map: &'a TableMap<T>, dialect: &'a DialectSetting) -> Self {
        Self {
            map,
            metadata: map,
            dialect,
            prefix: None,
        }
    }
}

impl<'a, T, M: EntityMetadata + ?Sized> EntitySql<'a, T, M> {
    /// Resolve names through `metadata` instead of the map
    pub fn with_metadata<N: EntityMetadata + ?Sized>(self, metadata: &'a N) -> EntitySql<'a, T, N> {
        EntitySql {
            map: self.map,
            metadata,
            dialect: self.dialect,
            prefix: self.prefix,
        }
    }

    /// Spell placeholders with `prefix` instead of the dialect prefix
    #[must_use]
    pub fn with_parameter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    fn table(&self) -> String {
        self.dialect
            .qualified_table(self.metadata.schema_name(), self.metadata.table_name())
    }

    fn column<'p>(&'p self, property: &'p PropertyMap<T>) -> &'p str {
        self.metadata
            .column_name(property.name())
            .unwrap_or(property.column_name())
    }

    fn placeholder(&self, name: &str) -> String {
        let prefix = self
            .prefix
            .as_deref()
            .unwrap_or(self.dialect.parameter_prefix());
        self.dialect.placeholder_with_prefix(name, prefix)
    }

    fn select_list(&self) -> String {
        let options = MappingOptions::all();
        let columns: Vec<String> = self
            .map
            .valid_properties(&options)
            .map(|p| self.dialect.quote_identifier(self.column(p)))
            .collect();
        if columns.is_empty() {
            "*".to_string()
        } else {
            columns.join(", ")
        }
    }

    fn assignment(&self, property: &PropertyMap<T>) -> String {
        format!(
            "{} = {}",
            self.dialect.quote_identifier(self.column(property)),
            self.placeholder(property.name())
        )
    }

    fn key_clause(&self, record: Option<&T>, parameters: &mut Vec<CommandParameter>) -> Result<String> {
        let keys: Vec<_> = self.map.key_properties().collect();
        if keys.is_empty() {
            return Err(DatabaseError::invalid_argument(format!(
                "{} has no key properties",
                self.map.target_type()
            )));
        }
        if let Some(record) = record {
            parameters.extend(keys.iter().map(|p| CommandParameter::new(p.name(), p.read(record))));
        }
        Ok(keys
            .iter()
            .map(|p| self.assignment(p))
            .collect::<Vec<_>>()
            .join(" AND "))
    }

    /// SELECT every mapped column of every row
    pub fn select_all(&self) -> CommandDescription {
        CommandDescription::new(format!("SELECT {} FROM {}", self.select_list(), self.table()))
    }

    /// SELECT the row whose keys match `keys`, in key declaration order
    ///
    /// # Errors
    ///
    /// Fails if the type has no keys or the number of values differs.
    pub fn select_by_key(&self, keys: &[DatabaseValue]) -> Result<CommandDescription> {
        let properties: Vec<_> = self.map.key_properties().collect();
        if !properties.is_empty() && properties.len() != keys.len() {
            return Err(DatabaseError::parameter_count_mismatch(properties.len(), keys.len()));
        }
        let clause = self.key_clause(None, &mut Vec::new())?;
        let mut description = CommandDescription::new(format!(
            "SELECT {} FROM {} WHERE {}",
            self.select_list(),
            self.table(),
            clause
        ));
        for (property, value) in properties.iter().zip(keys) {
            description.add_parameter(CommandParameter::new(property.name(), value.clone()));
        }
        Ok(description)
    }

    /// INSERT a record, leaving identity and computed columns to the database
    ///
    /// # Errors
    ///
    /// Fails if no column is left to insert.
    pub fn insert(&self, record: &T) -> Result<CommandDescription> {
        let options = MappingOptions::new().with_read_only(true);
        let properties: Vec<_> = self
            .map
            .valid_properties(&options)
            .filter(|p| !p.is_identity())
            .collect();
        if properties.is_empty() {
            return Err(DatabaseError::invalid_argument(format!(
                "{} has no insertable properties",
                self.map.target_type()
            )));
        }

        let columns: Vec<String> = properties
            .iter()
            .map(|p| self.dialect.quote_identifier(self.column(p)))
            .collect();
        let values: Vec<String> = properties.iter().map(|p| self.placeholder(p.name())).collect();
        let mut description = CommandDescription::new(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table(),
            columns.join(", "),
            values.join(", ")
        ));
        for property in properties {
            description.add_parameter(CommandParameter::new(property.name(), property.read(record)));
        }
        Ok(description)
    }

    /// UPDATE the writable columns of a record, matched by its keys
    ///
    /// # Errors
    ///
    /// Fails if the type has no keys or nothing to update.
    pub fn update_by_key(&self, record: &T) -> Result<CommandDescription> {
        let options = MappingOptions::new();
        let properties: Vec<_> = self
            .map
            .valid_properties(&options)
            .filter(|p| !p.is_key() && !p.is_identity())
            .collect();
        if properties.is_empty() {
            return Err(DatabaseError::invalid_argument(format!(
                "{} has no updatable properties",
                self.map.target_type()
            )));
        }

        let mut parameters: Vec<CommandParameter> = properties
            .iter()
            .map(|p| CommandParameter::new(p.name(), p.read(record)))
            .collect();
        let assignments: Vec<String> = properties.iter().map(|p| self.assignment(p)).collect();
        let clause = self.key_clause(Some(record), &mut parameters)?;

        let mut description = CommandDescription::new(format!(
            "UPDATE {} SET {} WHERE {}",
            self.table(),
            assignments.join(", "),
            clause
        ));
        for parameter in parameters {
            description.add_parameter(parameter);
        }
        Ok(description)
    }

    /// DELETE a record by its keys
    ///
    /// # Errors
    ///
    /// Fails if the type has no keys.
    pub fn delete_by_key(&self, record: &T) -> Result<CommandDescription> {
        let mut parameters = Vec::new();
        let clause = self.key_clause(Some(record), &mut parameters)?;
        let mut description =
            CommandDescription::new(format!("DELETE FROM {} WHERE {}", self.table(), clause));
        for parameter in parameters {
            description.add_parameter(parameter);
        }
        Ok(description)
    }

    /// COUNT the rows of the table
    pub fn count(&self) -> Result<CommandDescription> {
        let sql = self
            .dialect
            .count_sql(&format!("SELECT * FROM {}", self.table()))?;
        Ok(CommandDescription::new(sql))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::connection_kind::ConnectionKind;

    fn dialect(kind: ConnectionKind) -> DialectSetting {
        DialectSetting::for_kind(kind).unwrap()
    }

    #[test]
    fn test_select_basic() {
        let cmd = SelectBuilder::new("users").build(&dialect(ConnectionKind::Sqlite)).unwrap();
        assert_eq!(cmd.text(), r#"SELECT * FROM "users""#);
        assert!(cmd.parameters().is_empty());
    }

    #[test]
    fn test_select_where_named_parameters() {
        let cmd = SelectBuilder::new("users")
            .columns(&["id", "name"])
            .where_eq("status", "active")
            .where_gt("age", 18)
            .where_lt("age", 65)
            .where_null("deleted_at")
            .build(&dialect(ConnectionKind::MsSql))
            .unwrap();

        assert_eq!(
            cmd.text(),
            "SELECT [id], [name] FROM [users] WHERE [status] = @status AND [age] > @age AND [age] < @age_1 AND [deleted_at] IS NULL"
        );
        let names: Vec<_> = cmd.parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["status", "age", "age_1"]);
    }

    #[test]
    fn test_select_positional_dialect() {
        let cmd = SelectBuilder::new("users")
            .where_eq("id", 42)
            .or_where()
            .where_like("name", "a%")
            .build(&dialect(ConnectionKind::MySqlOdbc))
            .unwrap();
        assert_eq!(cmd.text(), "SELECT * FROM `users` WHERE `id` = ? OR `name` LIKE ?");
        assert_eq!(cmd.parameters().len(), 2);
    }

    #[test]
    fn test_select_join_order_and_page() {
        let cmd = SelectBuilder::new("users")
            .columns(&["users.name", "COUNT(orders.id) AS orders"])
            .left_join("orders", "users.id = orders.user_id")
            .group_by(&["users.name"])
            .order_by_desc("users.name")
            .page(PageInfo::from_skip_take(20, 10))
            .build(&dialect(ConnectionKind::Postgres))
            .unwrap();
        assert_eq!(
            cmd.text(),
            r#"SELECT "users"."name", COUNT(orders.id) AS orders FROM "users" LEFT JOIN "orders" ON users.id = orders.user_id GROUP BY "users"."name" ORDER BY "users"."name" DESC LIMIT 10 OFFSET 20"#
        );
    }

    #[test]
    fn test_select_page_unsupported() {
        let err = SelectBuilder::new("t")
            .page(PageInfo::from_skip_take(0, 5))
            .build(&dialect(ConnectionKind::Access))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::UnsupportedOperation(_)));
    }

    #[derive(Debug, Default)]
    struct Customer {
        id: i64,
        name: String,
        created: String,
        balance: i64,
    }

    fn customer_map() -> TableMap<Customer> {
        TableMap::new("customers")
            .schema("crm")
            .with(PropertyMap::new("id", |c: &Customer| c.id, |c, v| c.id = v).key().identity())
            .with(PropertyMap::new("name", |c: &Customer| c.name.clone(), |c, v| c.name = v).column("full_name"))
            .with(PropertyMap::new("created", |c: &Customer| c.created.clone(), |c, v| c.created = v).read_only())
            .with(PropertyMap::new("balance", |c: &Customer| c.balance, |c, v| c.balance = v).computed())
    }

    fn customer() -> Customer {
        Customer {
            id: 3,
            name: "Ada".to_string(),
            created: "2024-01-01".to_string(),
            balance: 10,
        }
    }

    #[test]
    fn test_entity_select() {
        let map = customer_map();
        let d = dialect(ConnectionKind::MsSql);
        let sql = EntitySql::new(&map, &d);
        assert_eq!(
            sql.select_all().text(),
            "SELECT [id], [full_name], [created], [balance] FROM [crm].[customers]"
        );
        let by_key = sql.select_by_key(&[DatabaseValue::Long(3)]).unwrap();
        assert!(by_key.text().ends_with("WHERE [id] = @id"));
        assert_eq!(by_key.parameters()[0].value, Some(DatabaseValue::Long(3)));
        assert!(sql.select_by_key(&[]).is_err());
    }

    #[test]
    fn test_entity_insert_skips_generated_columns() {
        let map = customer_map();
        let d = dialect(ConnectionKind::Sqlite);
        let cmd = EntitySql::new(&map, &d).insert(&customer()).unwrap();
        assert_eq!(
            cmd.text(),
            r#"INSERT INTO "crm"."customers" ("full_name", "created") VALUES (@name, @created)"#
        );
        assert_eq!(cmd.parameters()[0].value, Some(DatabaseValue::from("Ada")));
    }

    #[test]
    fn test_entity_update_and_delete() {
        let map = customer_map();
        let d = dialect(ConnectionKind::Oracle);
        let sql = EntitySql::new(&map, &d);

        let update = sql.update_by_key(&customer()).unwrap();
        assert_eq!(
            update.text(),
            r#"UPDATE "crm"."customers" SET "full_name" = :name WHERE "id" = :id"#
        );
        let names: Vec<_> = update.parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["name", "id"]);

        let delete = sql.delete_by_key(&customer()).unwrap();
        assert_eq!(delete.text(), r#"DELETE FROM "crm"."customers" WHERE "id" = :id"#);
        assert_eq!(delete.parameters()[0].value, Some(DatabaseValue::Long(3)));
    }

    #[test]
    fn test_entity_without_key() {
        let map: TableMap<Customer> = TableMap::new("customers")
            .with(PropertyMap::new("name", |c: &Customer| c.name.clone(), |c, v| c.name = v));
        let d = dialect(ConnectionKind::Sqlite);
        let err = EntitySql::new(&map, &d).delete_by_key(&customer()).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidArgument(_)));
    }

    /// Names from a catalog instead of the record's map
    struct LegacyCatalog;

    impl EntityMetadata for LegacyCatalog {
        fn table_name(&self) -> &str {
            "CUST_MASTER"
        }

        fn schema_name(&self) -> Option<&str> {
            None
        }

        fn column_name(&self, property: &str) -> Option<&str> {
            match property {
                "id" => Some("CUST_ID"),
                "name" => Some("CUST_NM"),
                _ => None,
            }
        }

        fn key_columns(&self) -> Vec<&str> {
            vec!["CUST_ID"]
        }

        fn identity_columns(&self) -> Vec<&str> {
            vec!["CUST_ID"]
        }

        fn computed_columns(&self) -> Vec<&str> {
            Vec::new()
        }
    }

    #[test]
    fn test_entity_names_from_other_metadata() {
        let map = customer_map();
        let d = dialect(ConnectionKind::Oracle);
        let sql = EntitySql::new(&map, &d).with_metadata(&LegacyCatalog);

        let update = sql.update_by_key(&customer()).unwrap();
        assert_eq!(
            update.text(),
            r#"UPDATE "CUST_MASTER" SET "CUST_NM" = :name WHERE "CUST_ID" = :id"#
        );
        // columns the catalog does not know keep the mapped name
        assert_eq!(
            sql.select_all().text(),
            r#"SELECT "CUST_ID", "CUST_NM", "created", "balance" FROM "CUST_MASTER""#
        );
    }

    #[test]
    fn test_placeholders_follow_prefix_override() {
        let map = customer_map();
        let d = dialect(ConnectionKind::MsSql);
        let sql = EntitySql::new(&map, &d).with_parameter_prefix(":");

        let update = sql.update_by_key(&customer()).unwrap();
        assert_eq!(
            update.text(),
            "UPDATE [crm].[customers] SET [full_name] = :name WHERE [id] = :id"
        );
        let insert = sql.insert(&customer()).unwrap();
        assert!(insert.text().ends_with("VALUES (:name, :created)"));

        let select = SelectBuilder::new("users")
            .where_eq("id", 1)
            .build_with_prefix(&d, "$")
            .unwrap();
        assert_eq!(select.text(), "SELECT * FROM [users] WHERE [id] = $id");

        let odbc = dialect(ConnectionKind::MsSqlOdbc);
        let positional = EntitySql::new(&map, &odbc).with_parameter_prefix(":");
        assert!(positional.delete_by_key(&customer()).unwrap().text().ends_with("[id] = ?"));
    }

    #[test]
    fn test_entity_count() {
        let map = customer_map();
        let d = dialect(ConnectionKind::Sqlite);
        let cmd = EntitySql::new(&map, &d).count().unwrap();
        assert!(cmd.text().contains(r#"SELECT * FROM "crm"."customers""#));
        assert!(cmd.text().to_uppercase().starts_with("SELECT COUNT("));
    }
}
