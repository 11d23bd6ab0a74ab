//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a table config.
//! Every statement yields rows as one `json` column via `row_to_json`.

use crate::config::TableConfig;
use crate::sql::params::to_text;
use serde_json::{Map, Value};

/// Quote identifier for PostgreSQL (safe: only from config).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
fn qualified_table(table: &TableConfig) -> String {
    format!("{}.{}", quoted(&table.schema), quoted(&table.name))
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Option<String>>,
}

impl QueryBuf {
    fn new() -> Self {
        Self::default()
    }

    /// Push a value and return its placeholder, cast to `pg_type`.
    fn push_param(&mut self, v: &Value, pg_type: &str) -> String {
        self.params.push(to_text(v));
        format!("${}::{}", self.params.len(), pg_type)
    }
}

fn pg_type(table: &TableConfig, column: &str) -> String {
    table
        .column(column)
        .map(|c| c.type_.pg_type_name())
        .unwrap_or_else(|| "text".to_string())
}

fn column_list(table: &TableConfig) -> String {
    table
        .columns
        .iter()
        .map(|c| quoted(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Wrap a data-modifying statement with RETURNING so its row comes back as json.
fn returning_json(statement: String, table: &TableConfig) -> String {
    format!(
        "WITH t AS ({} RETURNING {}) SELECT row_to_json(t) FROM t",
        statement,
        column_list(table)
    )
}

/// Configured columns present in `attrs`, in column order.
fn writable<'a>(table: &'a TableConfig, attrs: &'a Map<String, Value>) -> Vec<(&'a str, &'a Value)> {
    table
        .columns
        .iter()
        .filter_map(|c| attrs.get(&c.name).map(|v| (c.name.as_str(), v)))
        .collect()
}

/// SELECT all rows ordered by primary key.
pub fn select_all(table: &TableConfig) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT row_to_json(t) FROM (SELECT {} FROM {}) t ORDER BY t.{}",
        column_list(table),
        qualified_table(table),
        quoted(&table.primary_key)
    );
    q
}

/// SELECT by primary key.
pub fn select_by_id(table: &TableConfig, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(id, &pg_type(table, &table.primary_key));
    q.sql = format!(
        "SELECT row_to_json(t) FROM (SELECT {} FROM {} WHERE {} = {}) t",
        column_list(table),
        qualified_table(table),
        quoted(&table.primary_key),
        ph
    );
    q
}

/// INSERT the configured columns present in `attrs`.
pub fn insert(table: &TableConfig, attrs: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let cols = writable(table, attrs);
    let statement = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", qualified_table(table))
    } else {
        let names: Vec<String> = cols.iter().map(|(c, _)| quoted(c)).collect();
        let placeholders: Vec<String> = cols
            .iter()
            .map(|(c, v)| q.push_param(v, &pg_type(table, c)))
            .collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            qualified_table(table),
            names.join(", "),
            placeholders.join(", ")
        )
    };
    q.sql = returning_json(statement, table);
    q
}

/// UPDATE the configured non-key columns present in `attrs`. With nothing to
/// set this is a plain select of the row.
pub fn update(table: &TableConfig, id: &Value, attrs: &Map<String, Value>) -> QueryBuf {
    let cols: Vec<_> = writable(table, attrs)
        .into_iter()
        .filter(|(c, _)| *c != table.primary_key)
        .collect();
    if cols.is_empty() {
        return select_by_id(table, id);
    }
    let mut q = QueryBuf::new();
    let sets: Vec<String> = cols
        .iter()
        .map(|(c, v)| format!("{} = {}", quoted(c), q.push_param(v, &pg_type(table, c))))
        .collect();
    let ph = q.push_param(id, &pg_type(table, &table.primary_key));
    q.sql = returning_json(
        format!(
            "UPDATE {} SET {} WHERE {} = {}",
            qualified_table(table),
            sets.join(", "),
            quoted(&table.primary_key),
            ph
        ),
        table,
    );
    q
}

/// DELETE by primary key, returning the deleted row.
pub fn delete(table: &TableConfig, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(id, &pg_type(table, &table.primary_key));
    q.sql = returning_json(
        format!(
            "DELETE FROM {} WHERE {} = {}",
            qualified_table(table),
            quoted(&table.primary_key),
            ph
        ),
        table,
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> TableConfig {
        serde_json::from_value(json!({
            "name": "users",
            "columns": [
                {"name": "id", "type": "bigint", "has_default": true},
                {"name": "email", "type": {"name": "varchar", "params": [255]}},
                {"name": "age", "type": "integer"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn select_statements() {
        let q = select_all(&users());
        assert_eq!(
            q.sql,
            r#"SELECT row_to_json(t) FROM (SELECT "id", "email", "age" FROM "public"."users") t ORDER BY t."id""#
        );
        assert!(q.params.is_empty());

        let q = select_by_id(&users(), &json!("7"));
        assert!(q.sql.ends_with(r#"WHERE "id" = $1::bigint) t"#));
        assert_eq!(q.params, vec![Some("7".to_string())]);
    }

    #[test]
    fn insert_binds_known_columns_only() {
        let attrs = json!({"email": "a@b.c", "admin": true, "age": null});
        let q = insert(&users(), attrs.as_object().unwrap());
        assert_eq!(
            q.sql,
            r#"WITH t AS (INSERT INTO "public"."users" ("email", "age") VALUES ($1::varchar(255), $2::integer) RETURNING "id", "email", "age") SELECT row_to_json(t) FROM t"#
        );
        assert_eq!(q.params, vec![Some("a@b.c".to_string()), None]);

        let q = insert(&users(), &Map::new());
        assert!(q.sql.contains("DEFAULT VALUES"));
    }

    #[test]
    fn update_skips_key_and_falls_back_to_select() {
        let attrs = json!({"id": 9, "age": 30});
        let q = update(&users(), &json!(1), attrs.as_object().unwrap());
        assert!(q.sql.contains(r#"UPDATE "public"."users" SET "age" = $1::integer WHERE "id" = $2::bigint"#));
        assert_eq!(q.params, vec![Some("30".to_string()), Some("1".to_string())]);

        let q = update(&users(), &json!(1), json!({"id": 2}).as_object().unwrap());
        assert!(q.sql.starts_with("SELECT row_to_json(t)"));
    }

    #[test]
    fn identifiers_are_quoted() {
        let mut table = users();
        table.name = "we\"ird".into();
        assert!(delete(&table, &json!(1)).sql.contains(r#""public"."we""ird""#));
    }
}
