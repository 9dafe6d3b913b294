//! Literal inlining and native markers.

use chrono::{FixedOffset, NaiveDate, TimeZone};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

use super::{assert_marker_count, compile, native};
use crate::ast::*;
use crate::capabilities::{DialectCapabilities, PlaceholderStyle};
use crate::transpiler::Db2Compiler;

#[test]
fn test_aggregate_arguments_inlined() {
    let query = LogicalQuery::from_table("t")
        .column_as(
            Expr::aggregate(
                AggregateFunc::Sum,
                Expr::binary(Expr::col("price"), BinaryOp::Mul, Expr::val(2)),
            ),
            "total",
        )
        .group_by(Expr::col("cat"));
    let compiled = compile(&native(), &query);
    assert_eq!(
        compiled.sql,
        "SELECT SUM((\"PRICE\" * 2)) AS \"TOTAL\" FROM \"T\" GROUP BY \"CAT\""
    );
    assert!(compiled.params.is_empty());
    assert_eq!(compiled.inlined, 1);
}

#[test]
fn test_group_by_and_matching_select_item_inlined() {
    let substr = Expr::func("substr", vec![Expr::col("name"), Expr::val(1), Expr::val(3)]);
    let query = LogicalQuery::from_table("t")
        .column(substr.clone())
        .column(Expr::aggregate(AggregateFunc::Count, Expr::col("id")))
        .group_by(substr)
        .filter(Predicate::value(Expr::col("active"), Lookup::Exact, true));
    let compiled = compile(&native(), &query);
    assert_eq!(
        compiled.sql,
        "SELECT SUBSTR(\"NAME\", 1, 3), COUNT(\"ID\") FROM \"T\" WHERE \"ACTIVE\" = ? GROUP BY SUBSTR(\"NAME\", 1, 3)"
    );
    assert_eq!(compiled.params, vec![Value::Bool(true)]);
    assert_eq!(compiled.inlined, 4);
    assert_marker_count(&compiled);
}

#[test]
fn test_select_item_with_different_values_stays_bound() {
    let query = LogicalQuery::from_table("t")
        .column(Expr::func("substr", vec![Expr::col("name"), Expr::val(2)]))
        .group_by(Expr::func("substr", vec![Expr::col("name"), Expr::val(1)]));
    let compiled = compile(&native(), &query);
    assert_eq!(
        compiled.sql,
        "SELECT SUBSTR(\"NAME\", ?) FROM \"T\" GROUP BY SUBSTR(\"NAME\", 1)"
    );
    assert_eq!(compiled.params, vec![Value::Int(2)]);
}

#[test]
fn test_decimals_inlined_in_select() {
    let query = LogicalQuery::from_table("t").filter(Predicate::value(
        Expr::col("price"),
        Lookup::Gt,
        Decimal::new(999, 2),
    ));
    let compiled = compile(&native(), &query);
    assert_eq!(compiled.sql, "SELECT * FROM \"T\" WHERE \"PRICE\" > 9.99");
    assert!(compiled.params.is_empty());
}

#[test]
fn test_case_branches_and_addition_inlined() {
    let case = Expr::Case {
        when_clauses: vec![(
            Predicate::value(Expr::col("a"), Lookup::Exact, 1).into(),
            Expr::val("x"),
        )],
        else_value: Some(Box::new(Expr::val("y"))),
    };
    let query = LogicalQuery::from_table("t").column(case).filter(Predicate::value(
        Expr::binary(Expr::col("b"), BinaryOp::Add, Expr::val(5)),
        Lookup::Gt,
        10,
    ));
    let compiled = compile(&native(), &query);
    assert_eq!(
        compiled.sql,
        "SELECT CASE WHEN \"A\" = ? THEN 'x' ELSE 'y' END FROM \"T\" WHERE (\"B\" + 5) > ?"
    );
    assert_eq!(compiled.params, vec![Value::Int(1), Value::Int(10)]);
    assert_eq!(compiled.inlined, 3);
}

#[test]
fn test_inlined_case_strings_stay_quoted() {
    let case = Expr::Case {
        when_clauses: vec![(
            Predicate::value(Expr::col("a"), Lookup::Exact, 1).into(),
            Expr::val("DATE night"),
        )],
        else_value: Some(Box::new(Expr::val("TIMESTAMPED' OR 1=1 --"))),
    };
    let compiled = compile(&native(), &LogicalQuery::from_table("t").column(case));
    assert_eq!(
        compiled.sql,
        "SELECT CASE WHEN \"A\" = ? THEN 'DATE night' ELSE 'TIMESTAMPED'' OR 1=1 --' END FROM \"T\""
    );
    assert_eq!(compiled.params, vec![Value::Int(1)]);
}

#[test]
fn test_aliased_placeholders_inlined() {
    let compiler = native();
    let bound = compiler
        .bind(
            "SELECT %s AS \"K\", (%s) AS \"L\" FROM \"T\" WHERE \"A\" = %s",
            &[Value::from("k"), Value::Int(7), Value::Int(1)],
        )
        .unwrap();
    assert_eq!(bound.sql, "SELECT 'k' AS \"K\", (7) AS \"L\" FROM \"T\" WHERE \"A\" = ?");
    assert_eq!(bound.params, vec![Value::Int(1)]);
}

#[test]
fn test_update_decimals_inlined_but_insert_decimals_bound() {
    let compiler = native();
    let params = [Value::Decimal(Decimal::new(15, 1)), Value::Int(4)];
    let update = compiler
        .bind("UPDATE \"T\" SET \"P\" = %s WHERE \"ID\" = %s", &params)
        .unwrap();
    assert_eq!(update.sql, "UPDATE \"T\" SET \"P\" = 1.5 WHERE \"ID\" = ?");

    let insert = compiler
        .bind("INSERT INTO \"T\" (\"P\", \"ID\") VALUES (%s, %s)", &params)
        .unwrap();
    assert_eq!(insert.sql, "INSERT INTO \"T\" (\"P\", \"ID\") VALUES (?, ?)");
    assert_eq!(insert.params, params.to_vec());
}

#[test]
fn test_escaped_percent_per_style() {
    let qmark = native().bind("SELECT \"A\" FROM \"T\" WHERE \"B\" LIKE 'x' || %s || '%%'", &[Value::from("y")]);
    assert_eq!(
        qmark.unwrap().sql,
        "SELECT \"A\" FROM \"T\" WHERE \"B\" LIKE 'x' || ? || '%%'"
    );

    let percent = Db2Compiler::new(DialectCapabilities {
        placeholder_style: PlaceholderStyle::PositionalPercent,
        ..DialectCapabilities::db2()
    });
    let bound = percent.bind("SELECT MOD(\"A\", 2) %% 3 FROM \"T\" WHERE \"B\" = %s", &[Value::Int(1)]).unwrap();
    assert_eq!(bound.sql, "SELECT MOD(\"A\", 2) %% 3 FROM \"T\" WHERE \"B\" = %s");

    let bound = native().bind("SELECT MOD(\"A\", 2) %% 3 FROM \"T\" WHERE \"B\" = %s", &[Value::Int(1)]).unwrap();
    assert_eq!(bound.sql, "SELECT MOD(\"A\", 2) % 3 FROM \"T\" WHERE \"B\" = ?");
}

#[test]
fn test_timezone_aware_values_sent_as_utc() {
    let offset = FixedOffset::east_opt(2 * 3600).unwrap();
    let ts = offset.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let params = vec![Value::TimestampTz(ts)];
    let bound = native().bind("SELECT * FROM \"T\" WHERE \"AT\" = %s", &params).unwrap();
    let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    assert_eq!(bound.params, vec![Value::Timestamp(expected)]);
    // caller's parameters are untouched
    assert_eq!(params, vec![Value::TimestampTz(ts)]);
}

#[test]
fn test_numbered_markers_skip_inlined_params() {
    let compiler = Db2Compiler::new(DialectCapabilities {
        placeholder_style: PlaceholderStyle::Numbered,
        ..DialectCapabilities::db2()
    });
    let bound = compiler
        .bind(
            "SELECT COUNT(%s) FROM \"T\" WHERE \"A\" = %s AND \"B\" = %s",
            &[Value::Int(1), Value::Int(2), Value::Int(3)],
        )
        .unwrap();
    assert_eq!(bound.sql, "SELECT COUNT(1) FROM \"T\" WHERE \"A\" = :1 AND \"B\" = :2");
    assert_eq!(bound.params, vec![Value::Int(2), Value::Int(3)]);
}
