//! Executor tests — statements flowing through tokenize → parse →
//! dispatch into storage.

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::engine::tests::helpers::*;
    use crate::record::Row;

    fn user(id: &str, name: &str, age: &str) -> Row {
        Row::from_pairs([("id", id), ("name", name), ("age", age)])
    }

    #[test]
    fn create_show_use_drop_database() {
        let tmp = TempDir::new().unwrap();
        let mut engine = open_engine(tmp.path());

        engine.execute("CREATE DATABASE alpha;").unwrap();
        engine.execute("CREATE DATABASE beta;").unwrap();

        let result = engine.execute("SHOW DATABASES;").unwrap();
        let names: Vec<_> = result
            .rows
            .iter()
            .map(|r| r.get("database").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["alpha", "beta"]);

        engine.execute("USE alpha;").unwrap();
        engine.execute("DROP DATABASE beta;").unwrap();

        let result = engine.execute("SHOW DATABASES;").unwrap();
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn create_and_show_tables() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine_with_users(tmp.path());

        engine.execute("CREATE TABLE orders (id, total);").unwrap();

        let result = engine.execute("SHOW TABLES;").unwrap();
        let names: Vec<_> = result
            .rows
            .iter()
            .map(|r| r.get("table").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["orders", "users"]);

        engine.execute("DROP TABLE orders;").unwrap();
        let result = engine.execute("SHOW TABLES;").unwrap();
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn insert_strips_quotes_from_literal_values() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine_with_users(tmp.path());

        engine
            .execute("INSERT INTO users (id, name, age) VALUES (1, 'John', 20);")
            .unwrap();

        let result = engine.execute("SELECT * FROM users;").unwrap();
        assert_eq!(result.rows, vec![user("1", "John", "20")]);
    }

    #[test]
    fn insert_accepts_double_quoted_values() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine_with_users(tmp.path());

        engine
            .execute("INSERT INTO users (id, name, age) VALUES (1, \"John\", 20);")
            .unwrap();

        let result = engine.execute("SELECT * FROM users;").unwrap();
        assert_eq!(result.rows[0].get("name"), Some("John"));
    }

    #[test]
    fn select_with_point_lookup() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine_with_users(tmp.path());

        engine
            .execute("INSERT INTO users (id, name, age) VALUES (1, 'John', 20);")
            .unwrap();
        engine
            .execute("INSERT INTO users (id, name, age) VALUES (2, 'Jane', 21);")
            .unwrap();

        let result = engine
            .execute("SELECT * FROM users WHERE id = 2;")
            .unwrap();
        assert_eq!(result.rows, vec![user("2", "Jane", "21")]);
    }

    #[test]
    fn select_column_list_still_returns_all_columns() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine_with_users(tmp.path());

        engine
            .execute("INSERT INTO users (id, name, age) VALUES (1, 'John', 20);")
            .unwrap();

        let result = engine.execute("SELECT id, name FROM users;").unwrap();
        assert_eq!(result.rows, vec![user("1", "John", "20")]);
    }

    #[test]
    fn update_merges_the_set_clause() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine_with_users(tmp.path());

        engine
            .execute("INSERT INTO users (id, name, age) VALUES (1, 'John', 20);")
            .unwrap();
        engine
            .execute("UPDATE users SET age = 21 WHERE id = 1;")
            .unwrap();

        let result = engine
            .execute("SELECT * FROM users WHERE id = 1;")
            .unwrap();
        assert_eq!(result.rows, vec![user("1", "John", "21")]);
    }

    #[test]
    fn update_with_multiple_assignments() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine_with_users(tmp.path());

        engine
            .execute("INSERT INTO users (id, name, age) VALUES (1, 'John', 20);")
            .unwrap();
        engine
            .execute("UPDATE users SET name = 'Johnny', age = 21 WHERE id = 1;")
            .unwrap();

        let result = engine.execute("SELECT * FROM users;").unwrap();
        assert_eq!(result.rows, vec![user("1", "Johnny", "21")]);
    }

    #[test]
    fn delete_then_select_is_empty() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine_with_users(tmp.path());

        engine
            .execute("INSERT INTO users (id, name, age) VALUES (1, 'John', 20);")
            .unwrap();
        engine.execute("DELETE FROM users WHERE id = 1;").unwrap();

        let result = engine
            .execute("SELECT * FROM users WHERE id = 1;")
            .unwrap();
        assert!(result.rows.is_empty());
    }

    #[test]
    fn conjunction_where_selects_exactly_one_row() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine_with_users(tmp.path());

        engine
            .execute("INSERT INTO users (id, name, age) VALUES (1, 'John', 20);")
            .unwrap();
        engine
            .execute("INSERT INTO users (id, name, age) VALUES (2, 'John', 21);")
            .unwrap();
        engine
            .execute("INSERT INTO users (id, name, age) VALUES (3, 'Jane', 20);")
            .unwrap();

        let result = engine
            .execute("SELECT * FROM users WHERE name = 'John' AND age = 20;")
            .unwrap();
        assert_eq!(result.rows, vec![user("1", "John", "20")]);
    }

    #[test]
    fn quoted_and_unquoted_numeric_literals_are_equivalent() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine_with_users(tmp.path());

        engine
            .execute("INSERT INTO users (id, name, age) VALUES (1, 'John', 20);")
            .unwrap();

        let unquoted = engine
            .execute("SELECT * FROM users WHERE age = 20;")
            .unwrap();
        let quoted = engine
            .execute("SELECT * FROM users WHERE age = '20';")
            .unwrap();
        assert_eq!(unquoted.rows, quoted.rows);
        assert_eq!(unquoted.rows.len(), 1);
    }

    #[test]
    fn append_only_engine_executes_the_same_statements() {
        let tmp = TempDir::new().unwrap();
        let mut engine = open_append_only_engine(tmp.path());

        engine.execute("CREATE DATABASE d;").unwrap();
        engine.execute("USE d;").unwrap();
        engine.execute("CREATE TABLE t (id, v);").unwrap();
        engine
            .execute("INSERT INTO t (id, v) VALUES (1, 'x');")
            .unwrap();

        let result = engine.execute("SELECT * FROM t WHERE id = 1;").unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].get("v"), Some("x"));
    }

    #[test]
    fn query_reports_elapsed_time() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine_with_users(tmp.path());

        engine
            .execute("INSERT INTO users (id, name, age) VALUES (1, 'John', 20);")
            .unwrap();

        let result = engine.execute("SELECT * FROM users;").unwrap();
        // Non-query statements report zero; queries measure the pass.
        assert!(result.elapsed > std::time::Duration::ZERO);
    }

    #[test]
    fn compact_table_is_reachable_through_the_engine() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine_with_users(tmp.path());

        engine
            .execute("INSERT INTO users (id, name, age) VALUES (1, 'John', 20);")
            .unwrap();
        engine
            .execute("UPDATE users SET age = 21 WHERE id = 1;")
            .unwrap();
        engine.compact_table("users").unwrap();

        let contents =
            std::fs::read_to_string(tmp.path().join("test_db/tables/users.csv")).unwrap();
        assert_eq!(contents, "id,name,age,__deleted__\n1,John,21,False\n");
    }
}
