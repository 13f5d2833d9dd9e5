//! Statement parser tests — one grammar per statement, two-token
//! dispatch, and the error paths that enumerate reachable grammars.

#[cfg(test)]
mod tests {
    use crate::parser::ast::{SelectColumns, Statement, WhereClause};
    use crate::parser::tokenizer::Tokenizer;
    use crate::parser::{ParseError, Parser};

    fn parse(sql: &str) -> Result<Statement, ParseError> {
        let tokens = Tokenizer::new().tokenize(sql)?;
        Parser::new().parse(&tokens)
    }

    #[test]
    fn create_database() {
        assert_eq!(
            parse("CREATE DATABASE my_database;").unwrap(),
            Statement::CreateDatabase {
                name: "my_database".to_string()
            }
        );
    }

    #[test]
    fn show_databases() {
        assert_eq!(parse("SHOW DATABASES;").unwrap(), Statement::ShowDatabases);
    }

    #[test]
    fn drop_database() {
        assert_eq!(
            parse("DROP DATABASE my_database;").unwrap(),
            Statement::DropDatabase {
                name: "my_database".to_string()
            }
        );
    }

    #[test]
    fn use_database() {
        assert_eq!(
            parse("USE my_database;").unwrap(),
            Statement::UseDatabase {
                name: "my_database".to_string()
            }
        );
    }

    #[test]
    fn create_table_with_columns() {
        assert_eq!(
            parse("CREATE TABLE my_table (id, name);").unwrap(),
            Statement::CreateTable {
                table: "my_table".to_string(),
                columns: vec!["id".to_string(), "name".to_string()],
            }
        );
    }

    #[test]
    fn create_table_requires_at_least_one_column() {
        let err = parse("CREATE TABLE my_table ();").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn show_tables() {
        assert_eq!(parse("SHOW TABLES;").unwrap(), Statement::ShowTables);
    }

    #[test]
    fn drop_table() {
        assert_eq!(
            parse("DROP TABLE my_table;").unwrap(),
            Statement::DropTable {
                table: "my_table".to_string()
            }
        );
    }

    #[test]
    fn select_star() {
        assert_eq!(
            parse("SELECT * FROM users;").unwrap(),
            Statement::Select {
                columns: SelectColumns::All,
                table: "users".to_string(),
                where_clause: None,
            }
        );
    }

    #[test]
    fn select_specific_columns() {
        assert_eq!(
            parse("SELECT id, name FROM users;").unwrap(),
            Statement::Select {
                columns: SelectColumns::Columns(vec!["id".to_string(), "name".to_string()]),
                table: "users".to_string(),
                where_clause: None,
            }
        );
    }

    #[test]
    fn select_with_where() {
        assert_eq!(
            parse("SELECT * FROM users WHERE id = 1;").unwrap(),
            Statement::Select {
                columns: SelectColumns::All,
                table: "users".to_string(),
                where_clause: Some(WhereClause::equals("id", "1")),
            }
        );
    }

    #[test]
    fn select_missing_column_list_fails() {
        let err = parse("SELECT FROM users;").unwrap_err();
        match err {
            ParseError::UnexpectedToken {
                token, position, ..
            } => {
                assert_eq!(token, "FROM");
                assert_eq!(position, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn insert_with_literals() {
        assert_eq!(
            parse("INSERT INTO users (id, name) VALUES (1, 'John');").unwrap(),
            Statement::Insert {
                table: "users".to_string(),
                columns: vec!["id".to_string(), "name".to_string()],
                values: vec!["1".to_string(), "'John'".to_string()],
            }
        );
    }

    #[test]
    fn insert_values_may_be_identifiers() {
        assert_eq!(
            parse("INSERT INTO users (id) VALUES (next_id);").unwrap(),
            Statement::Insert {
                table: "users".to_string(),
                columns: vec!["id".to_string()],
                values: vec!["next_id".to_string()],
            }
        );
    }

    #[test]
    fn insert_missing_column_list_fails() {
        let err = parse("INSERT INTO users VALUES (1);").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn update_without_where() {
        assert_eq!(
            parse("UPDATE users SET name = 'John';").unwrap(),
            Statement::Update {
                table: "users".to_string(),
                set_clause: vec![("name".to_string(), "'John'".to_string())],
                where_clause: None,
            }
        );
    }

    #[test]
    fn update_with_multiple_assignments() {
        assert_eq!(
            parse("UPDATE users SET name = 'John', age = 25;").unwrap(),
            Statement::Update {
                table: "users".to_string(),
                set_clause: vec![
                    ("name".to_string(), "'John'".to_string()),
                    ("age".to_string(), "25".to_string()),
                ],
                where_clause: None,
            }
        );
    }

    #[test]
    fn update_with_where() {
        assert_eq!(
            parse("UPDATE users SET name = 'John' WHERE id = 1;").unwrap(),
            Statement::Update {
                table: "users".to_string(),
                set_clause: vec![("name".to_string(), "'John'".to_string())],
                where_clause: Some(WhereClause::equals("id", "1")),
            }
        );
    }

    #[test]
    fn update_with_dangling_where_fails() {
        let err = parse("UPDATE users SET name = 'John' WHERE;").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn delete_without_where() {
        assert_eq!(
            parse("DELETE FROM users;").unwrap(),
            Statement::Delete {
                table: "users".to_string(),
                where_clause: None,
            }
        );
    }

    #[test]
    fn delete_with_where() {
        assert_eq!(
            parse("DELETE FROM users WHERE id = 1;").unwrap(),
            Statement::Delete {
                table: "users".to_string(),
                where_clause: Some(WhereClause::equals("id", "1")),
            }
        );
    }

    #[test]
    fn delete_with_dangling_where_fails() {
        let err = parse("DELETE FROM users WHERE;").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn keywords_dispatch_case_insensitively() {
        assert_eq!(
            parse("create database d;").unwrap(),
            Statement::CreateDatabase {
                name: "d".to_string()
            }
        );
        assert_eq!(
            parse("select * from users where id = 1;").unwrap(),
            parse("SELECT * FROM users WHERE id = 1;").unwrap()
        );
    }

    #[test]
    fn unknown_first_token_lists_every_grammar() {
        let err = parse("FROM users;").unwrap_err();
        match err {
            ParseError::UnexpectedToken {
                token,
                position,
                expected,
            } => {
                assert_eq!(token, "FROM");
                assert_eq!(position, 0);
                assert!(expected.contains("CREATE DATABASE"));
                assert!(expected.contains("SELECT"));
                assert!(expected.contains("DELETE FROM"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn ambiguous_prefix_with_bad_second_token_lists_candidates() {
        let err = parse("CREATE users;").unwrap_err();
        match err {
            ParseError::UnexpectedToken {
                token,
                position,
                expected,
            } => {
                assert_eq!(token, "users");
                assert_eq!(position, 1);
                assert!(expected.contains("CREATE DATABASE"));
                assert!(expected.contains("CREATE TABLE"));
                // Unreachable statements are not offered.
                assert!(!expected.contains("SELECT"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_input_lists_every_grammar() {
        let err = parse("").unwrap_err();
        match err {
            ParseError::UnexpectedEnd { expected } => {
                assert!(expected.contains("USE <database>;"));
                assert!(expected.contains("INSERT INTO"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn truncated_statement_reports_end_of_input() {
        let err = parse("CREATE DATABASE my_db").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEnd { .. }));

        let err = parse("CREATE").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEnd { .. }));
    }
}
