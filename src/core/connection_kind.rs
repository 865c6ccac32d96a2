//! Connection kind definitions
//!
//! A connection kind identifies the native driver family a connection belongs
//! to. ODBC and OLE DB sub-variants alias to their base vendor when a dialect
//! is resolved.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported connection kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Default)]
pub enum ConnectionKind {
    /// No connection kind specified
    #[default]
    None = 0,
    /// Microsoft SQL Server
    MsSql = 1,
    /// SQL Server through ODBC
    MsSqlOdbc = 2,
    /// SQL Server through OLE DB
    MsSqlOleDb = 3,
    /// SQL Server Compact Edition
    SqlCe = 4,
    /// MySQL
    MySql = 5,
    /// MySQL through ODBC
    MySqlOdbc = 6,
    /// MariaDB
    MariaDb = 7,
    /// PostgreSQL
    Postgres = 8,
    /// PostgreSQL through ODBC
    PostgresOdbc = 9,
    /// SQLite
    Sqlite = 10,
    /// SQLite through ODBC
    SqliteOdbc = 11,
    /// Oracle
    Oracle = 12,
    /// Oracle through ODBC
    OracleOdbc = 13,
    /// Oracle through OLE DB
    OracleOleDb = 14,
    /// IBM DB2
    Db2 = 15,
    /// DB2 through ODBC
    Db2Odbc = 16,
    /// DB2 through OLE DB
    Db2OleDb = 17,
    /// SAP Sybase ASE
    Sybase = 18,
    /// Sybase through ODBC
    SybaseOdbc = 19,
    /// Firebird
    Firebird = 20,
    /// Firebird through ODBC
    FirebirdOdbc = 21,
    /// IBM Informix
    Informix = 22,
    /// Informix through ODBC
    InformixOdbc = 23,
    /// Microsoft Access (Jet/ACE)
    Access = 24,
    /// Access through OLE DB
    AccessOleDb = 25,
    /// Access through ODBC
    AccessOdbc = 26,
}

impl ConnectionKind {
    /// Every kind except `None`
    pub const ALL: [ConnectionKind; 26] = [
        ConnectionKind::MsSql,
        ConnectionKind::MsSqlOdbc,
        ConnectionKind::MsSqlOleDb,
        ConnectionKind::SqlCe,
        ConnectionKind::MySql,
        ConnectionKind::MySqlOdbc,
        ConnectionKind::MariaDb,
        ConnectionKind::Postgres,
        ConnectionKind::PostgresOdbc,
        ConnectionKind::Sqlite,
        ConnectionKind::SqliteOdbc,
        ConnectionKind::Oracle,
        ConnectionKind::OracleOdbc,
        ConnectionKind::OracleOleDb,
        ConnectionKind::Db2,
        ConnectionKind::Db2Odbc,
        ConnectionKind::Db2OleDb,
        ConnectionKind::Sybase,
        ConnectionKind::SybaseOdbc,
        ConnectionKind::Firebird,
        ConnectionKind::FirebirdOdbc,
        ConnectionKind::Informix,
        ConnectionKind::InformixOdbc,
        ConnectionKind::Access,
        ConnectionKind::AccessOleDb,
        ConnectionKind::AccessOdbc,
    ];

    /// Convert connection kind to string representation
    pub fn to_str(&self) -> &'static str {
        match self {
            ConnectionKind::None => "none",
            ConnectionKind::MsSql => "mssql",
            ConnectionKind::MsSqlOdbc => "mssql-odbc",
            ConnectionKind::MsSqlOleDb => "mssql-oledb",
            ConnectionKind::SqlCe => "sqlce",
            ConnectionKind::MySql => "mysql",
            ConnectionKind::MySqlOdbc => "mysql-odbc",
            ConnectionKind::MariaDb => "mariadb",
            ConnectionKind::Postgres => "postgres",
            ConnectionKind::PostgresOdbc => "postgres-odbc",
            ConnectionKind::Sqlite => "sqlite",
            ConnectionKind::SqliteOdbc => "sqlite-odbc",
            ConnectionKind::Oracle => "oracle",
            ConnectionKind::OracleOdbc => "oracle-odbc",
            ConnectionKind::OracleOleDb => "oracle-oledb",
            ConnectionKind::Db2 => "db2",
            ConnectionKind::Db2Odbc => "db2-odbc",
            ConnectionKind::Db2OleDb => "db2-oledb",
            ConnectionKind::Sybase => "sybase",
            ConnectionKind::SybaseOdbc => "sybase-odbc",
            ConnectionKind::Firebird => "firebird",
            ConnectionKind::FirebirdOdbc => "firebird-odbc",
            ConnectionKind::Informix => "informix",
            ConnectionKind::InformixOdbc => "informix-odbc",
            ConnectionKind::Access => "access",
            ConnectionKind::AccessOleDb => "access-oledb",
            ConnectionKind::AccessOdbc => "access-odbc",
        }
    }

    /// The vendor whose SQL dialect this kind speaks
    ///
    /// ODBC and OLE DB sub-variants resolve to their native vendor; native
    /// kinds (and MariaDB, which shares MySQL's dialect) resolve to themselves
    /// or their family head.
    pub fn base(&self) -> ConnectionKind {
        match self {
            ConnectionKind::MsSqlOdbc | ConnectionKind::MsSqlOleDb => ConnectionKind::MsSql,
            ConnectionKind::MySqlOdbc | ConnectionKind::MariaDb => ConnectionKind::MySql,
            ConnectionKind::PostgresOdbc => ConnectionKind::Postgres,
            ConnectionKind::SqliteOdbc => ConnectionKind::Sqlite,
            ConnectionKind::OracleOdbc | ConnectionKind::OracleOleDb => ConnectionKind::Oracle,
            ConnectionKind::Db2Odbc | ConnectionKind::Db2OleDb => ConnectionKind::Db2,
            ConnectionKind::SybaseOdbc => ConnectionKind::Sybase,
            ConnectionKind::FirebirdOdbc => ConnectionKind::Firebird,
            ConnectionKind::InformixOdbc => ConnectionKind::Informix,
            ConnectionKind::AccessOleDb | ConnectionKind::AccessOdbc => ConnectionKind::Access,
            other => *other,
        }
    }

    /// Check if this kind goes through an ODBC bridge
    pub fn is_odbc(&self) -> bool {
        matches!(
            self,
            ConnectionKind::MsSqlOdbc
                | ConnectionKind::MySqlOdbc
                | ConnectionKind::PostgresOdbc
                | ConnectionKind::SqliteOdbc
                | ConnectionKind::OracleOdbc
                | ConnectionKind::Db2Odbc
                | ConnectionKind::SybaseOdbc
                | ConnectionKind::FirebirdOdbc
                | ConnectionKind::InformixOdbc
                | ConnectionKind::AccessOdbc
        )
    }

    /// Check if this kind goes through an OLE DB bridge
    pub fn is_oledb(&self) -> bool {
        matches!(
            self,
            ConnectionKind::MsSqlOleDb
                | ConnectionKind::OracleOleDb
                | ConnectionKind::Db2OleDb
                | ConnectionKind::AccessOleDb
        )
    }

    /// Bridged drivers bind by position and ignore parameter names
    pub fn uses_positional_parameters(&self) -> bool {
        self.is_odbc() || self.is_oledb()
    }
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for ConnectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        match normalized.as_str() {
            "none" => Ok(ConnectionKind::None),
            "mssql" | "sqlserver" => Ok(ConnectionKind::MsSql),
            "postgresql" => Ok(ConnectionKind::Postgres),
            "sqlite3" => Ok(ConnectionKind::Sqlite),
            "mongo" | "mongodb" | "redis" => Err(format!("Not a relational connection kind: '{}'", s)),
            other => ConnectionKind::ALL
                .iter()
                .find(|kind| kind.to_str() == other)
                .copied()
                .ok_or_else(|| format!("Invalid connection kind: '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_kind_to_str() {
        assert_eq!(ConnectionKind::MsSql.to_str(), "mssql");
        assert_eq!(ConnectionKind::OracleOleDb.to_str(), "oracle-oledb");
        assert_eq!(ConnectionKind::Sqlite.to_str(), "sqlite");
    }

    #[test]
    fn test_connection_kind_from_str() {
        assert_eq!("postgres".parse::<ConnectionKind>().ok(), Some(ConnectionKind::Postgres));
        assert_eq!("postgresql".parse::<ConnectionKind>().ok(), Some(ConnectionKind::Postgres));
        assert_eq!("SQLServer".parse::<ConnectionKind>().ok(), Some(ConnectionKind::MsSql));
        assert_eq!("db2_odbc".parse::<ConnectionKind>().ok(), Some(ConnectionKind::Db2Odbc));
        assert_eq!("sqlite3".parse::<ConnectionKind>().ok(), Some(ConnectionKind::Sqlite));
        assert_eq!("redis".parse::<ConnectionKind>().ok(), None);
        assert_eq!("unknown".parse::<ConnectionKind>().ok(), None);
    }

    #[test]
    fn test_every_kind_round_trips_through_its_name() {
        for kind in ConnectionKind::ALL {
            assert_eq!(kind.to_str().parse::<ConnectionKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_bridged_kinds_alias_to_base_vendor() {
        assert_eq!(ConnectionKind::MsSqlOleDb.base(), ConnectionKind::MsSql);
        assert_eq!(ConnectionKind::OracleOdbc.base(), ConnectionKind::Oracle);
        assert_eq!(ConnectionKind::MariaDb.base(), ConnectionKind::MySql);
        assert_eq!(ConnectionKind::Sqlite.base(), ConnectionKind::Sqlite);

        for kind in ConnectionKind::ALL {
            let base = kind.base();
            assert!(!base.is_odbc() && !base.is_oledb(), "{kind} aliased to bridge {base}");
        }
    }

    #[test]
    fn test_positional_parameters() {
        assert!(ConnectionKind::MySqlOdbc.uses_positional_parameters());
        assert!(ConnectionKind::AccessOleDb.uses_positional_parameters());
        assert!(!ConnectionKind::MySql.uses_positional_parameters());
        assert!(!ConnectionKind::MariaDb.uses_positional_parameters());
    }
}
