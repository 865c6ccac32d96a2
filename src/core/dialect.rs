//! SQL dialect settings and the dialect registry
//!
//! Each vendor gets one immutable [`DialectSetting`] describing its parameter
//! spelling, identifier quoting and SQL templates. Templates use the
//! placeholders `#SQL_SCRIPT#`, `#SKIP#`, `#TAKE#`, `#ORDER_BY#`, `#TEXT#`,
//! `#START#` and `#LENGTH#`.
//!
//! [`DialectRegistry`] computes a setting the first time a kind is requested
//! and serves the cached value afterwards. Construct one registry and share it
//! (typically behind an `Arc`) with every session.

use super::connection_kind::ConnectionKind;
use super::error::{DatabaseError, Result};
use super::paging::PageInfo;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

const SQL_SCRIPT: &str = "#SQL_SCRIPT#";
const SKIP: &str = "#SKIP#";
const TAKE: &str = "#TAKE#";
const ORDER_BY: &str = "#ORDER_BY#";
const TEXT: &str = "#TEXT#";
const START: &str = "#START#";
const LENGTH: &str = "#LENGTH#";

const COUNT_WITH_ALIAS: &str = "SELECT COUNT(*) FROM (#SQL_SCRIPT#) T_COUNT";
const PAGING_OFFSET_FETCH: &str = "#SQL_SCRIPT# OFFSET #SKIP# ROWS FETCH NEXT #TAKE# ROWS ONLY";
const PAGING_LIMIT_OFFSET: &str = "#SQL_SCRIPT# LIMIT #TAKE# OFFSET #SKIP#";
const PAGING_ROW_NUMBER: &str = "SELECT * FROM (SELECT T_PAGE.*, ROW_NUMBER() OVER () AS RN_PAGE FROM (#SQL_SCRIPT#) AS T_PAGE) AS T_OUTER WHERE RN_PAGE > #SKIP# AND RN_PAGE <= #SKIP# + #TAKE#";

/// Vendor-specific SQL syntax settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectSetting {
    connection_kind: ConnectionKind,
    parameter_prefix: &'static str,
    parameter_suffix: &'static str,
    identifier_prefix: &'static str,
    identifier_suffix: &'static str,
    string_concat_operator: &'static str,
    paging_template: &'static str,
    last_row_template: &'static str,
    substring_template: &'static str,
    count_template: &'static str,
    positional: bool,
}

impl DialectSetting {
    /// Build the setting for a connection kind
    ///
    /// This is a pure function; [`DialectRegistry`] caches its result.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::UnsupportedDialect`] for `ConnectionKind::None`.
    pub fn for_kind(kind: ConnectionKind) -> Result<Self> {
        let base = match kind.base() {
            ConnectionKind::MsSql => Self::mssql(),
            ConnectionKind::SqlCe => Self::sqlce(),
            ConnectionKind::MySql => Self::mysql(),
            ConnectionKind::Postgres => Self::postgres(),
            ConnectionKind::Sqlite => Self::sqlite(),
            ConnectionKind::Oracle => Self::oracle(),
            ConnectionKind::Db2 => Self::db2(),
            ConnectionKind::Sybase => Self::sybase(),
            ConnectionKind::Firebird => Self::firebird(),
            ConnectionKind::Informix => Self::informix(),
            ConnectionKind::Access => Self::access(),
            _ => return Err(DatabaseError::unsupported_dialect(kind)),
        };

        Ok(Self {
            connection_kind: kind,
            positional: base.positional || kind.uses_positional_parameters(),
            ..base
        })
    }

    fn mssql() -> Self {
        Self {
            connection_kind: ConnectionKind::MsSql,
            parameter_prefix: "@",
            parameter_suffix: "",
            identifier_prefix: "[",
            identifier_suffix: "]",
            string_concat_operator: "+",
            paging_template: PAGING_OFFSET_FETCH,
            last_row_template: "SELECT TOP 1 * FROM (#SQL_SCRIPT#) T_LAST ORDER BY #ORDER_BY# DESC",
            substring_template: "SUBSTRING(#TEXT#, #START#, #LENGTH#)",
            count_template: COUNT_WITH_ALIAS,
            positional: false,
        }
    }

    fn sqlce() -> Self {
        Self {
            connection_kind: ConnectionKind::SqlCe,
            ..Self::mssql()
        }
    }

    fn mysql() -> Self {
        Self {
            connection_kind: ConnectionKind::MySql,
            parameter_prefix: "@",
            parameter_suffix: "",
            identifier_prefix: "`",
            identifier_suffix: "`",
            string_concat_operator: "",
            paging_template: PAGING_LIMIT_OFFSET,
            last_row_template: "SELECT * FROM (#SQL_SCRIPT#) T_LAST ORDER BY #ORDER_BY# DESC LIMIT 1",
            substring_template: "SUBSTRING(#TEXT#, #START#, #LENGTH#)",
            count_template: COUNT_WITH_ALIAS,
            positional: false,
        }
    }

    fn postgres() -> Self {
        Self {
            connection_kind: ConnectionKind::Postgres,
            parameter_prefix: "@",
            parameter_suffix: "",
            identifier_prefix: "\"",
            identifier_suffix: "\"",
            string_concat_operator: "||",
            paging_template: PAGING_LIMIT_OFFSET,
            last_row_template: "SELECT * FROM (#SQL_SCRIPT#) T_LAST ORDER BY #ORDER_BY# DESC LIMIT 1",
            substring_template: "SUBSTRING(#TEXT# FROM #START# FOR #LENGTH#)",
            count_template: COUNT_WITH_ALIAS,
            positional: false,
        }
    }

    fn sqlite() -> Self {
        Self {
            connection_kind: ConnectionKind::Sqlite,
            parameter_prefix: "@",
            parameter_suffix: "",
            identifier_prefix: "\"",
            identifier_suffix: "\"",
            string_concat_operator: "||",
            paging_template: PAGING_LIMIT_OFFSET,
            last_row_template: "SELECT * FROM (#SQL_SCRIPT#) T_LAST ORDER BY #ORDER_BY# DESC LIMIT 1",
            substring_template: "SUBSTR(#TEXT#, #START#, #LENGTH#)",
            count_template: COUNT_WITH_ALIAS,
            positional: false,
        }
    }

    fn oracle() -> Self {
        Self {
            connection_kind: ConnectionKind::Oracle,
            parameter_prefix: ":",
            parameter_suffix: "",
            identifier_prefix: "\"",
            identifier_suffix: "\"",
            string_concat_operator: "||",
            paging_template: "SELECT * FROM (SELECT T_PAGE.*, ROWNUM RN_PAGE FROM (#SQL_SCRIPT#) T_PAGE WHERE ROWNUM <= #SKIP# + #TAKE#) WHERE RN_PAGE > #SKIP#",
            last_row_template: "SELECT * FROM (SELECT T_LAST.* FROM (#SQL_SCRIPT#) T_LAST ORDER BY #ORDER_BY# DESC) WHERE ROWNUM <= 1",
            substring_template: "SUBSTR(#TEXT#, #START#, #LENGTH#)",
            count_template: COUNT_WITH_ALIAS,
            positional: false,
        }
    }

    fn db2() -> Self {
        Self {
            connection_kind: ConnectionKind::Db2,
            parameter_prefix: "@",
            parameter_suffix: "",
            identifier_prefix: "\"",
            identifier_suffix: "\"",
            string_concat_operator: "||",
            paging_template: PAGING_ROW_NUMBER,
            last_row_template: "SELECT * FROM (#SQL_SCRIPT#) AS T_LAST ORDER BY #ORDER_BY# DESC FETCH FIRST 1 ROWS ONLY",
            substring_template: "SUBSTR(#TEXT#, #START#, #LENGTH#)",
            count_template: "SELECT COUNT(*) FROM (#SQL_SCRIPT#) AS T_COUNT",
            positional: false,
        }
    }

    fn sybase() -> Self {
        Self {
            connection_kind: ConnectionKind::Sybase,
            parameter_prefix: "@",
            parameter_suffix: "",
            identifier_prefix: "[",
            identifier_suffix: "]",
            string_concat_operator: "+",
            paging_template: PAGING_ROW_NUMBER,
            last_row_template: "SELECT TOP 1 * FROM (#SQL_SCRIPT#) T_LAST ORDER BY #ORDER_BY# DESC",
            substring_template: "SUBSTRING(#TEXT#, #START#, #LENGTH#)",
            count_template: COUNT_WITH_ALIAS,
            positional: false,
        }
    }

    fn firebird() -> Self {
        Self {
            connection_kind: ConnectionKind::Firebird,
            parameter_prefix: "@",
            parameter_suffix: "",
            identifier_prefix: "\"",
            identifier_suffix: "\"",
            string_concat_operator: "||",
            paging_template: "#SQL_SCRIPT# ROWS #SKIP# + 1 TO #SKIP# + #TAKE#",
            last_row_template: "SELECT FIRST 1 * FROM (#SQL_SCRIPT#) T_LAST ORDER BY #ORDER_BY# DESC",
            substring_template: "SUBSTRING(#TEXT# FROM #START# FOR #LENGTH#)",
            count_template: COUNT_WITH_ALIAS,
            positional: false,
        }
    }

    fn informix() -> Self {
        Self {
            connection_kind: ConnectionKind::Informix,
            parameter_prefix: "@",
            parameter_suffix: "",
            identifier_prefix: "\"",
            identifier_suffix: "\"",
            string_concat_operator: "||",
            paging_template: "SELECT SKIP #SKIP# FIRST #TAKE# * FROM (#SQL_SCRIPT#)",
            last_row_template: "SELECT FIRST 1 * FROM (#SQL_SCRIPT#) ORDER BY #ORDER_BY# DESC",
            substring_template: "SUBSTR(#TEXT#, #START#, #LENGTH#)",
            count_template: "SELECT COUNT(*) FROM (#SQL_SCRIPT#)",
            positional: true,
        }
    }

    fn access() -> Self {
        Self {
            connection_kind: ConnectionKind::Access,
            parameter_prefix: "@",
            parameter_suffix: "",
            identifier_prefix: "[",
            identifier_suffix: "]",
            string_concat_operator: "&",
            // Jet has no row offset
            paging_template: "",
            last_row_template: "SELECT TOP 1 * FROM (#SQL_SCRIPT#) ORDER BY #ORDER_BY# DESC",
            substring_template: "MID(#TEXT#, #START#, #LENGTH#)",
            count_template: "SELECT COUNT(*) FROM (#SQL_SCRIPT#)",
            positional: false,
        }
    }

    pub fn connection_kind(&self) -> ConnectionKind {
        self.connection_kind
    }

    pub fn parameter_prefix(&self) -> &'static str {
        self.parameter_prefix
    }

    pub fn parameter_suffix(&self) -> &'static str {
        self.parameter_suffix
    }

    pub fn identifier_prefix(&self) -> &'static str {
        self.identifier_prefix
    }

    pub fn identifier_suffix(&self) -> &'static str {
        self.identifier_suffix
    }

    pub fn string_concat_operator(&self) -> &'static str {
        self.string_concat_operator
    }

    pub fn paging_template(&self) -> &'static str {
        self.paging_template
    }

    pub fn last_row_template(&self) -> &'static str {
        self.last_row_template
    }

    pub fn substring_template(&self) -> &'static str {
        self.substring_template
    }

    pub fn count_template(&self) -> &'static str {
        self.count_template
    }

    /// Whether the native driver binds `?` placeholders by position
    pub fn is_positional(&self) -> bool {
        self.positional
    }

    /// Spell a parameter name the way this dialect expects
    ///
    /// Names that already carry the prefix are returned unchanged.
    pub fn parameter_name(&self, name: &str) -> String {
        Self::prefixed_name(name, self.parameter_prefix, self.parameter_suffix)
    }

    pub(crate) fn prefixed_name(name: &str, prefix: &str, suffix: &str) -> String {
        let name = name.trim();
        if !prefix.is_empty() && name.starts_with(prefix) {
            name.to_string()
        } else {
            format!("{prefix}{name}{suffix}")
        }
    }

    /// The placeholder text to embed in SQL for a named parameter
    pub fn placeholder(&self, name: &str) -> String {
        self.placeholder_with_prefix(name, self.parameter_prefix)
    }

    /// Like [`placeholder`](Self::placeholder), spelled with `prefix`
    /// instead of the dialect's own prefix
    pub fn placeholder_with_prefix(&self, name: &str, prefix: &str) -> String {
        if self.positional {
            "?".to_string()
        } else {
            Self::prefixed_name(name, prefix, self.parameter_suffix)
        }
    }

    /// Quote an identifier, part by part for dotted names
    pub fn quote_identifier(&self, name: &str) -> String {
        name.split('.')
            .map(|part| {
                let part = part.trim();
                let quoted = part.starts_with(self.identifier_prefix)
                    && part.ends_with(self.identifier_suffix)
                    && part.len() >= self.identifier_prefix.len() + self.identifier_suffix.len();
                if part == "*" || quoted {
                    part.to_string()
                } else {
                    format!("{}{}{}", self.identifier_prefix, part, self.identifier_suffix)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quote a table name, qualified by its schema when one is given
    pub fn qualified_table(&self, schema: Option<&str>, table: &str) -> String {
        match schema.map(str::trim).filter(|s| !s.is_empty()) {
            Some(schema) => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(table)
            ),
            None => self.quote_identifier(table),
        }
    }

    /// Wrap a query in the vendor paging syntax
    ///
    /// Non-pageable requests return the query unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the query is blank or the vendor has no paging
    /// syntax.
    pub fn paging_sql(&self, sql: &str, page: PageInfo) -> Result<String> {
        let sql = strip_statement(sql)?;
        if !page.is_pageable() {
            return Ok(sql.to_string());
        }
        if self.paging_template.is_empty() {
            return Err(DatabaseError::unsupported(format!(
                "{} has no paging syntax",
                self.connection_kind
            )));
        }
        Ok(self
            .paging_template
            .replace(SQL_SCRIPT, sql)
            .replace(SKIP, &page.skip().to_string())
            .replace(TAKE, &page.take().to_string()))
    }

    /// Select only the last row of a query under the given ordering
    pub fn last_row_sql(&self, sql: &str, order_by: &str) -> Result<String> {
        let sql = strip_statement(sql)?;
        if order_by.trim().is_empty() {
            return Err(DatabaseError::invalid_argument(
                "last-row query needs an ORDER BY expression",
            ));
        }
        Ok(self
            .last_row_template
            .replace(SQL_SCRIPT, sql)
            .replace(ORDER_BY, order_by.trim()))
    }

    /// Count the rows a query would return
    pub fn count_sql(&self, sql: &str) -> Result<String> {
        let sql = strip_statement(sql)?;
        Ok(self.count_template.replace(SQL_SCRIPT, sql))
    }

    /// Render the vendor substring function
    pub fn substring_sql(&self, text: &str, start: &str, length: &str) -> String {
        self.substring_template
            .replace(TEXT, text)
            .replace(START, start)
            .replace(LENGTH, length)
    }

    /// Concatenate string expressions
    ///
    /// Vendors without a concatenation operator get `CONCAT(..)`.
    pub fn concat(&self, parts: &[&str]) -> String {
        if self.string_concat_operator.is_empty() {
            format!("CONCAT({})", parts.join(", "))
        } else {
            parts.join(&format!(" {} ", self.string_concat_operator))
        }
    }
}

fn strip_statement(sql: &str) -> Result<&str> {
    let sql = sql.trim().trim_end_matches(';').trim_end();
    if sql.is_empty() {
        return Err(DatabaseError::invalid_argument("SQL text must not be blank"));
    }
    Ok(sql)
}

/// Construct-once, read-many cache of dialect settings
#[derive(Debug, Default)]
pub struct DialectRegistry {
    cache: RwLock<HashMap<ConnectionKind, Arc<DialectSetting>>>,
}

impl DialectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the dialect for a connection kind, computing it on first use
    ///
    /// Concurrent first callers may each compute the setting, but only the
    /// first stored value is ever handed out.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::UnsupportedDialect`] for unknown kinds.
    pub fn get(&self, kind: ConnectionKind) -> Result<Arc<DialectSetting>> {
        if let Some(setting) = self.cache.read().get(&kind) {
            return Ok(Arc::clone(setting));
        }

        let computed = Arc::new(DialectSetting::for_kind(kind)?);
        let mut cache = self.cache.write();
        let setting = cache.entry(kind).or_insert_with(|| {
            tracing::debug!(kind = %kind, "cached dialect settings");
            computed
        });
        Ok(Arc::clone(setting))
    }

    /// Number of dialects computed so far
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_dialect() {
        for kind in ConnectionKind::ALL {
            let setting = DialectSetting::for_kind(kind).unwrap();
            assert_eq!(setting.connection_kind(), kind);
        }
    }

    #[test]
    fn test_none_is_unsupported() {
        let err = DialectSetting::for_kind(ConnectionKind::None).unwrap_err();
        assert!(matches!(err, DatabaseError::UnsupportedDialect(ref k) if k == "none"));
    }

    #[test]
    fn test_bridged_kind_shares_base_templates() {
        let native = DialectSetting::for_kind(ConnectionKind::Oracle).unwrap();
        let odbc = DialectSetting::for_kind(ConnectionKind::OracleOdbc).unwrap();
        assert_eq!(native.paging_template(), odbc.paging_template());
        assert_eq!(native.parameter_prefix(), odbc.parameter_prefix());
        assert!(!native.is_positional());
        assert!(odbc.is_positional());
    }

    #[test]
    fn test_paging_sql_by_vendor() {
        let page = PageInfo::from_skip_take(20, 10);

        let sql = DialectSetting::for_kind(ConnectionKind::MsSql)
            .unwrap()
            .paging_sql("SELECT * FROM t ORDER BY id;", page)
            .unwrap();
        assert_eq!(sql, "SELECT * FROM t ORDER BY id OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY");

        let sql = DialectSetting::for_kind(ConnectionKind::Postgres)
            .unwrap()
            .paging_sql("SELECT * FROM t", page)
            .unwrap();
        assert_eq!(sql, "SELECT * FROM t LIMIT 10 OFFSET 20");

        let sql = DialectSetting::for_kind(ConnectionKind::Oracle)
            .unwrap()
            .paging_sql("SELECT * FROM t", page)
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM (SELECT T_PAGE.*, ROWNUM RN_PAGE FROM (SELECT * FROM t) T_PAGE WHERE ROWNUM <= 20 + 10) WHERE RN_PAGE > 20"
        );
    }

    #[test]
    fn test_paging_sql_not_pageable_returns_query() {
        let dialect = DialectSetting::for_kind(ConnectionKind::Access).unwrap();
        let sql = dialect
            .paging_sql("SELECT * FROM t", PageInfo::from_skip_take(5, 0))
            .unwrap();
        assert_eq!(sql, "SELECT * FROM t");

        let err = dialect
            .paging_sql("SELECT * FROM t", PageInfo::from_skip_take(5, 5))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_last_row_and_count() {
        let dialect = DialectSetting::for_kind(ConnectionKind::Sqlite).unwrap();
        assert_eq!(
            dialect.last_row_sql("SELECT * FROM t", "id").unwrap(),
            "SELECT * FROM (SELECT * FROM t) T_LAST ORDER BY id DESC LIMIT 1"
        );
        assert_eq!(
            dialect.count_sql("SELECT * FROM t").unwrap(),
            "SELECT COUNT(*) FROM (SELECT * FROM t) T_COUNT"
        );
        assert!(dialect.last_row_sql("SELECT * FROM t", " ").is_err());
        assert!(dialect.count_sql("  ;").is_err());
    }

    #[test]
    fn test_quoting_and_names() {
        let mssql = DialectSetting::for_kind(ConnectionKind::MsSql).unwrap();
        assert_eq!(mssql.quote_identifier("dbo.Users"), "[dbo].[Users]");
        assert_eq!(mssql.quote_identifier("[Users]"), "[Users]");
        assert_eq!(mssql.qualified_table(Some("dbo"), "Users"), "[dbo].[Users]");
        assert_eq!(mssql.qualified_table(Some(" "), "Users"), "[Users]");
        assert_eq!(mssql.parameter_name("id"), "@id");
        assert_eq!(mssql.parameter_name("@id"), "@id");

        let oracle = DialectSetting::for_kind(ConnectionKind::Oracle).unwrap();
        assert_eq!(oracle.parameter_name("id"), ":id");
        assert_eq!(oracle.placeholder("id"), ":id");

        let odbc = DialectSetting::for_kind(ConnectionKind::MySqlOdbc).unwrap();
        assert_eq!(odbc.placeholder("id"), "?");
        assert_eq!(odbc.placeholder_with_prefix("id", ":"), "?");
        assert_eq!(mssql.placeholder_with_prefix("id", ":"), ":id");
        assert_eq!(mssql.placeholder_with_prefix(":id", ":"), ":id");
    }

    #[test]
    fn test_concat_and_substring() {
        let mysql = DialectSetting::for_kind(ConnectionKind::MySql).unwrap();
        assert_eq!(mysql.concat(&["a", "b"]), "CONCAT(a, b)");
        assert_eq!(mysql.substring_sql("name", "1", "3"), "SUBSTRING(name, 1, 3)");

        let oracle = DialectSetting::for_kind(ConnectionKind::Oracle).unwrap();
        assert_eq!(oracle.concat(&["a", "b", "c"]), "a || b || c");

        let access = DialectSetting::for_kind(ConnectionKind::Access).unwrap();
        assert_eq!(access.substring_sql("name", "2", "4"), "MID(name, 2, 4)");
    }

    #[test]
    fn test_registry_caches_once() {
        let registry = DialectRegistry::new();
        assert!(registry.is_empty());

        let first = registry.get(ConnectionKind::Postgres).unwrap();
        let second = registry.get(ConnectionKind::Postgres).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);

        assert!(registry.get(ConnectionKind::None).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_concurrent_readers_observe_same_setting() {
        let registry = Arc::new(DialectRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.get(ConnectionKind::Oracle).unwrap())
            })
            .collect();

        let settings: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for setting in &settings {
            assert!(Arc::ptr_eq(setting, &settings[0]));
        }
    }
}
