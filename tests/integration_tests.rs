//! Integration tests against a real SQLite database
//!
//! These tests verify that the data access layer works end to end:
//! - Entity statements and typed mapping
//! - Positional binding and paging
//! - Transaction lifecycle and dispose
//! - Native error pass-through

#[cfg(feature = "sqlite")]
mod sqlite_tests {
    use chrono::NaiveDate;
    use rust_data_access::core::error::DatabaseError;
    use rust_data_access::core::mapping::{ColumnMapper, MappingOptions, PropertyMap, TableMap};
    use rust_data_access::prelude::*;
    use rust_decimal::Decimal;
    use std::path::PathBuf;
    use std::sync::{Arc, OnceLock};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Account {
        id: i64,
        owner: String,
        balance: Decimal,
        active: bool,
        opened: chrono::NaiveDateTime,
        note: Option<String>,
    }

    impl ColumnMapper for Account {
        fn table_map() -> &'static TableMap<Self> {
            static MAP: OnceLock<TableMap<Account>> = OnceLock::new();
            MAP.get_or_init(|| {
                TableMap::new("accounts")
                    .with(PropertyMap::new("id", |a: &Account| a.id, |a, v| a.id = v).key().identity())
                    .with(
                        PropertyMap::new("owner", |a: &Account| a.owner.clone(), |a, v| a.owner = v)
                            .column("owner_name"),
                    )
                    .with(PropertyMap::new("balance", |a: &Account| a.balance, |a, v| a.balance = v))
                    .with(PropertyMap::new("active", |a: &Account| a.active, |a, v| a.active = v))
                    .with(PropertyMap::new("opened", |a: &Account| a.opened, |a, v| a.opened = v))
                    .with(PropertyMap::new("note", |a: &Account| a.note.clone(), |a, v| a.note = v))
            })
        }
    }

    const CREATE_ACCOUNTS: &str = "CREATE TABLE accounts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_name TEXT NOT NULL,
        balance NUMERIC NOT NULL,
        active INTEGER NOT NULL,
        opened TEXT NOT NULL,
        note TEXT
    )";

    fn registry() -> Arc<DialectRegistry> {
        Arc::new(DialectRegistry::new())
    }

    /// In-memory databases vanish on close, so the connection is opened up
    /// front and the session never closes it between commands
    fn memory_session() -> DatabaseSession<SqliteConnection> {
        let mut connection = SqliteConnection::in_memory();
        connection.open().expect("Failed to open");
        let mut session = DatabaseSession::new(connection, registry(), SessionConfig::default())
            .expect("Failed to create session");
        session
            .execute_non_query(&CommandDescription::new(CREATE_ACCOUNTS))
            .expect("Failed to create table");
        session
    }

    fn temp_db_path() -> PathBuf {
        std::env::temp_dir().join(format!("rust_data_access_{}.db", uuid::Uuid::new_v4()))
    }

    fn account(owner: &str, cents: i64) -> Account {
        Account {
            id: 0,
            owner: owner.to_string(),
            balance: Decimal::new(cents, 2),
            active: true,
            opened: NaiveDate::from_ymd_opt(2024, 3, 1)
                .and_then(|d| d.and_hms_opt(9, 30, 0))
                .expect("valid date"),
            note: None,
        }
    }

    #[test]
    fn test_entity_round_trip() {
        let mut session = memory_session();

        assert_eq!(session.insert(&account("alice", 12_50)).unwrap(), 1);
        assert_eq!(session.insert(&account("bob", 300)).unwrap(), 1);

        let mut alice: Account = session
            .find_by_key(&[DatabaseValue::Long(1)])
            .unwrap()
            .expect("alice exists");
        assert_eq!(alice.owner, "alice");
        assert_eq!(alice.balance, Decimal::new(1250, 2));
        assert!(alice.active);
        assert_eq!(alice.opened, account("x", 0).opened);
        assert_eq!(alice.note, None);

        alice.balance = Decimal::new(99, 0);
        alice.note = Some("vip".to_string());
        assert_eq!(session.update(&alice).unwrap(), 1);

        let all: Vec<Account> = session
            .query_as(&CommandDescription::new("SELECT * FROM accounts ORDER BY id"))
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], alice);
        assert_eq!(all[1].owner, "bob");

        assert_eq!(session.delete(&all[1]).unwrap(), 1);
        let missing: Option<Account> = session.find_by_key(&[DatabaseValue::Long(2)]).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_positional_binding_and_scalars() {
        let mut session = memory_session();
        for (owner, cents) in [("a", 100), ("b", 200), ("c", 300)] {
            session.insert(&account(owner, cents)).unwrap();
        }

        let query = session
            .bind(
                "SELECT owner_name FROM accounts WHERE balance >= ? AND owner_name <> ?",
                vec![2.into(), "c".into()],
            )
            .unwrap();
        assert_eq!(query.text(), "SELECT owner_name FROM accounts WHERE balance >= @p0 AND owner_name <> @p1");
        let row = session.query_single(&query).unwrap();
        assert_eq!(row.get("owner_name"), Some(&DatabaseValue::from("b")));

        let total = session
            .execute_scalar(&CommandDescription::new("SELECT SUM(balance) FROM accounts"))
            .unwrap();
        assert_eq!(total.as_double(), Some(6.0));

        let count = session
            .query_count(&CommandDescription::new("SELECT * FROM accounts WHERE active = 1;"))
            .unwrap();
        assert_eq!(count, 3);

        let mismatch = session.bind("SELECT * FROM accounts WHERE id = ?", vec![]);
        assert!(matches!(
            mismatch,
            Err(DatabaseError::ParameterCountMismatch { placeholders: 1, parameters: 0 })
        ));
    }

    #[test]
    fn test_named_parameters_from_alternate_spelling() {
        let mut session = memory_session();
        session.insert(&account("carol", 500)).unwrap();

        let parameters = vec![CommandParameter::new("owner", "carol")];
        let text = session
            .rebuild_named("SELECT id FROM accounts WHERE owner_name = :owner", &parameters, ':')
            .unwrap();
        assert_eq!(text, "SELECT id FROM accounts WHERE owner_name = @owner");

        let description = CommandDescription::new(text).param("owner", "carol");
        assert_eq!(session.execute_scalar(&description).unwrap(), DatabaseValue::Long(1));
    }

    #[test]
    fn test_paging_client_and_server_side() {
        let mut session = memory_session();
        for i in 0..10 {
            session.insert(&account(&format!("user{:02}", i), i * 100)).unwrap();
        }
        let query = CommandDescription::new("SELECT owner_name FROM accounts ORDER BY id");

        let page = PageInfo::from_page_number(2, 3);
        let server = session.query_page_sql(&query, page).unwrap();
        let client = session.query_page(&query, page).unwrap();
        assert_eq!(server, client);
        let owners: Vec<String> = server.iter().map(|r| r.get("owner_name").unwrap().as_string()).collect();
        assert_eq!(owners, vec!["user03", "user04", "user05"]);

        let tail = session.query_page(&query, PageInfo::from_skip_take(8, 0)).unwrap();
        assert_eq!(tail.len(), 2);

        let last = session.query_last(&query).unwrap();
        assert_eq!(last.get("owner_name"), Some(&DatabaseValue::from("user09")));
        let first = session.query_first(&query).unwrap();
        assert_eq!(first.get("owner_name"), Some(&DatabaseValue::from("user00")));
    }

    #[test]
    fn test_duplicate_columns_are_renamed() {
        let mut session = memory_session();
        session.insert(&account("dave", 100)).unwrap();
        let row = session
            .query_first(&CommandDescription::new(
                "SELECT a.id, b.id, a.id AS ID FROM accounts a JOIN accounts b ON a.id = b.id",
            ))
            .unwrap();
        assert_eq!(row.names().collect::<Vec<_>>(), vec!["id", "id_1", "ID"]);
    }

    #[test]
    fn test_mapping_failures_are_aggregated() {
        let mut session = memory_session();
        let err = session
            .query_as::<Account>(&CommandDescription::new(
                "SELECT 1 AS id, 'x' AS owner_name, 'lots' AS balance, 'maybe' AS active",
            ))
            .unwrap_err();
        match err {
            DatabaseError::PropertyMapping(e) => {
                assert_eq!(e.target_type, "Account");
                assert_eq!(e.properties(), vec!["balance", "active"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        // columns the query does not return keep their defaults
        let partial: Vec<Account> = session
            .query_as_with(
                &CommandDescription::new("SELECT 7 AS id, 'eve' AS owner_name"),
                &MappingOptions::all(),
            )
            .unwrap();
        assert_eq!(partial[0].id, 7);
        assert_eq!(partial[0].balance, Decimal::ZERO);
    }

    #[test]
    fn test_transaction_commit_and_explicit_rollback() {
        let mut session = memory_session();
        session.begin().unwrap();
        assert_eq!(session.state(), TransactionState::Active);
        session.insert(&account("frank", 100)).unwrap();
        session.commit().unwrap();
        assert_eq!(session.state(), TransactionState::Finished);

        // a finished session never starts another transaction
        assert!(matches!(session.begin(), Err(DatabaseError::TransactionError(_))));

        let count = session
            .execute_scalar(&CommandDescription::new("SELECT COUNT(*) FROM accounts"))
            .unwrap();
        assert_eq!(count, DatabaseValue::Long(1));
    }

    #[test]
    fn test_dispose_rolls_back_uncommitted_work() {
        let path = temp_db_path();
        let path_str = path.to_string_lossy().to_string();

        {
            let mut session =
                DatabaseSession::new(SqliteConnection::new(&path_str), registry(), SessionConfig::default()).unwrap();
            session.execute_non_query(&CommandDescription::new(CREATE_ACCOUNTS)).unwrap();
            assert!(!session.connection().is_open());

            session.begin().unwrap();
            session.insert(&account("grace", 100)).unwrap();
            // dropped without commit
        }

        let mut session =
            DatabaseSession::new(SqliteConnection::new(&path_str), registry(), SessionConfig::default()).unwrap();
        let count = session
            .execute_scalar(&CommandDescription::new("SELECT COUNT(*) FROM accounts"))
            .unwrap();
        assert_eq!(count, DatabaseValue::Long(0));
        session.close().unwrap();

        let config = SessionConfig::default().with_dispose_action(DisposeAction::Commit);
        let mut session = DatabaseSession::new(SqliteConnection::new(&path_str), registry(), config).unwrap();
        session.begin().unwrap();
        session.insert(&account("heidi", 100)).unwrap();
        session.close().unwrap();

        let mut session =
            DatabaseSession::new(SqliteConnection::new(&path_str), registry(), SessionConfig::default()).unwrap();
        let count = session
            .execute_scalar(&CommandDescription::new("SELECT COUNT(*) FROM accounts"))
            .unwrap();
        assert_eq!(count, DatabaseValue::Long(1));
        drop(session);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_native_errors_pass_through() {
        let mut session = memory_session();
        let err = session
            .execute_non_query(&CommandDescription::new("INSERT INTO missing VALUES (1)"))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Sqlite(_)));
        assert!(err.to_string().contains("no such table"));

        let err = session
            .execute_non_query(&CommandDescription::stored_procedure("usp_missing"))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::UnsupportedOperation(_)));

        let err = session.execute_non_query(&CommandDescription::new("   ")).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidArgument(_)));
    }

    #[test]
    fn test_null_and_blob_values() {
        let mut session = memory_session();
        session
            .execute_non_query(&CommandDescription::new("CREATE TABLE files (name TEXT, body BLOB, size INTEGER)"))
            .unwrap();
        let insert = session
            .bind(
                "INSERT INTO files (name, body, size) VALUES (?, ?, ?)",
                vec!["a.bin".into(), vec![0u8, 1, 2, 255].into(), DatabaseValue::Null],
            )
            .unwrap();
        session.execute_non_query(&insert).unwrap();

        let row = session
            .query_single(&CommandDescription::table_direct("files"))
            .unwrap();
        assert_eq!(row.get("body").and_then(|v| v.as_bytes()), Some(&[0u8, 1, 2, 255][..]));
        assert!(row.get("size").unwrap().is_null());
        assert_eq!(row.cell("body").unwrap().declared_type, "BLOB");
    }
}
