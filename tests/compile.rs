use std::cell::Cell;

use pretty_assertions::assert_eq;
use qail_db2::prelude::*;

struct VersionProbe {
    version: &'static str,
    calls: Cell<usize>,
}

impl ServerProbe for VersionProbe {
    fn server_version(&self) -> Result<ServerVersion, ProbeError> {
        self.calls.set(self.calls.get() + 1);
        ServerVersion::parse(self.version).ok_or_else(|| ProbeError::Failed(self.version.to_string()))
    }
}

fn orders_page() -> LogicalQuery {
    LogicalQuery::from_table("orders")
        .column(Expr::col("id"))
        .column_as(Expr::aggregate(AggregateFunc::Count, Expr::Star), "n")
        .filter(Predicate::value(Expr::col("status"), Lookup::IExact, "Open"))
        .group_by(Expr::col("id"))
        .order_by(OrderBy::asc(Expr::col("id")))
        .slice(20, Some(30))
}

#[test]
fn test_probed_old_server_emulates_pagination() {
    let support = PaginationSupport::new();
    let probe = VersionProbe {
        version: "10.05.0700",
        calls: Cell::new(0),
    };
    let compiler = Db2Compiler::probed(DialectCapabilities::db2(), &support, &probe);
    assert!(!compiler.capabilities().supports_native_pagination);

    let compiled = compiler.compile(&orders_page()).unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT \"Z.__db2_1\", \"N\" FROM ( \
         SELECT \"Z.__db2_1\", \"N\", ( ROW_NUMBER() OVER() ) AS \"__ROWNUM\" FROM ( \
         SELECT \"ID\" AS \"Z.__db2_1\", COUNT(*) AS \"N\" FROM \"ORDERS\" \
         WHERE UPPER(\"STATUS\") LIKE UPPER(?) ESCAPE '\\' GROUP BY \"ID\" ORDER BY \"ID\" \
         ) AS M ) Z WHERE \"__ROWNUM\" > 20 AND \"__ROWNUM\" <= 30"
    );
    assert_eq!(compiled.params, vec![Value::String("OPEN".into())]);

    // cached after the first successful probe
    Db2Compiler::probed(DialectCapabilities::db2(), &support, &probe);
    assert_eq!(probe.calls.get(), 1);
    assert_eq!(support.cached(), Some(false));
}

#[test]
fn test_probed_new_server_uses_offset_fetch() {
    let support = PaginationSupport::new();
    let probe = VersionProbe {
        version: "11.5.8",
        calls: Cell::new(0),
    };
    let compiled = Db2Compiler::probed(DialectCapabilities::db2(), &support, &probe)
        .compile(&orders_page())
        .unwrap();
    assert!(
        compiled.sql.ends_with("ORDER BY \"ID\" OFFSET 20 ROWS FETCH FIRST 10 ROWS ONLY"),
        "{}",
        compiled.sql
    );
}

#[test]
fn test_config_overrides_feed_the_compiler() {
    let config = Config::from_toml(
        "[dialect]\nsupports_native_pagination = false\nplaceholder_style = \"numbered\"\n",
    )
    .unwrap();
    let query = LogicalQuery::from_table("t")
        .column(Expr::col("a"))
        .filter(Predicate::value(Expr::col("b"), Lookup::Exact, 1))
        .filter(Predicate::value(Expr::col("c"), Lookup::Exact, 2))
        .slice(0, Some(5));
    let compiled = qail_db2::compile(&query, config.dialect).unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT \"A\" FROM \"T\" WHERE (\"B\" = :1 AND \"C\" = :2) FETCH FIRST 5 ROWS ONLY"
    );
}

#[test]
fn test_query_from_json() {
    let json = r#"{
        "columns": [{"expr": {"Column": {"name": "id"}}}],
        "source": {"Table": {"name": "users", "schema": "app"}},
        "filter": {"Leaf": {"lhs": {"Column": {"name": "age"}}, "lookup": "Gte", "rhs": {"Value": {"Int": 18}}}},
        "low_mark": 0,
        "high_mark": 0
    }"#;
    let query: LogicalQuery = serde_json::from_str(json).unwrap();
    let compiled = query.to_db2(&Db2Compiler::default()).unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT * FROM ( SELECT \"ID\" FROM \"APP\".\"USERS\" WHERE \"AGE\" >= ? ) AS M WHERE 1=0"
    );
    assert_eq!(compiled.params, vec![Value::Int(18)]);

    let query = LogicalQuery {
        high_mark: None,
        ..query
    };
    let compiled = query.to_db2(&Db2Compiler::default()).unwrap();
    assert_eq!(compiled.sql, "SELECT \"ID\" FROM \"APP\".\"USERS\" WHERE \"AGE\" >= ?");
    assert_eq!(compiled.params, vec![Value::Int(18)]);
}

#[test]
fn test_compiled_query_serializes_notices() {
    let query = LogicalQuery::from_table("t")
        .column(Expr::Column(ColumnRef::new("doc").lob()))
        .distinct();
    let compiled = qail_db2::compile(&query, DialectCapabilities::db2()).unwrap();
    let json = serde_json::to_value(&compiled).unwrap();
    assert_eq!(json["notices"][0]["kind"], "distinct_dropped");
    assert_eq!(json["notices"][0]["lob_columns"][0], "doc");
}

#[test]
fn test_dialect_ops() {
    let compiler = Db2Compiler::default();
    let ops = compiler.ops();
    assert_eq!(
        ops.savepoint_rollback_sql("sp_1").unwrap(),
        "ROLLBACK TO SAVEPOINT \"SP_1\""
    );
    assert_eq!(
        ops.cache_key_culling_sql("cache_table").unwrap(),
        "SELECT cache_key FROM (SELECT cache_key, ( ROW_NUMBER() OVER() ) AS ROWNUM FROM \"CACHE_TABLE\" ORDER BY cache_key) WHERE ROWNUM = %s + 1"
    );
}
