//! Expression translation per kind.

use pretty_assertions::assert_eq;

use super::{compile, native};
use crate::ast::*;
use crate::capabilities::DialectCapabilities;
use crate::error::Db2Error;
use crate::transpiler::{Db2Compiler, Notice, ParamContext, Translator};

fn translator() -> Translator {
    Translator::db2(DialectCapabilities::db2())
}

fn sql(expr: Expr) -> String {
    translator().translate_fragment(&expr).unwrap().0
}

#[test]
fn test_aggregates() {
    assert_eq!(
        sql(Expr::aggregate(AggregateFunc::Avg, Expr::col("x"))),
        "AVG(DOUBLE(\"X\"))"
    );
    assert_eq!(
        sql(Expr::aggregate(AggregateFunc::StdDevPop, Expr::col("x"))),
        "STDDEV(\"X\")"
    );
    assert_eq!(
        sql(Expr::aggregate(AggregateFunc::VarPop, Expr::col("x"))),
        "VARIANCE(\"X\")"
    );
    let distinct = Expr::Aggregate {
        func: AggregateFunc::Count,
        arg: Box::new(Expr::col("x")),
        distinct: true,
    };
    assert_eq!(sql(distinct), "COUNT(DISTINCT \"X\")");

    for func in [AggregateFunc::StdDevSamp, AggregateFunc::VarSamp] {
        let err = translator()
            .translate_fragment(&Expr::aggregate(func, Expr::col("x")))
            .unwrap_err();
        assert!(matches!(err, Db2Error::UnsupportedConstruct(_)));
    }
}

#[test]
fn test_binary_operators() {
    let a = || Expr::col("a");
    let b = || Expr::col("b");
    assert_eq!(sql(Expr::binary(a(), BinaryOp::Caret, b())), "POWER(\"A\", \"B\")");
    assert_eq!(sql(Expr::binary(a(), BinaryOp::Mod, b())), "MOD(\"A\", \"B\")");
    assert_eq!(sql(Expr::binary(a(), BinaryOp::BitXor, b())), "BITXOR(\"A\", \"B\")");
    assert_eq!(sql(Expr::binary(a(), BinaryOp::Concat, b())), "(\"A\" || \"B\")");
    assert_eq!(sql(Expr::binary(a(), BinaryOp::Sub, b())), "(\"A\" - \"B\")");
}

#[test]
fn test_date_parts() {
    let extract = |part| Expr::Extract {
        part,
        expr: Box::new(Expr::col("d")),
        tzname: None,
    };
    assert_eq!(sql(extract(DatePart::WeekDay)), "DAYOFWEEK(\"D\")");
    assert_eq!(sql(extract(DatePart::IsoWeekDay)), "DAYOFWEEK_ISO(\"D\")");
    assert_eq!(sql(extract(DatePart::Week)), "WEEK_ISO(\"D\")");
    assert_eq!(sql(extract(DatePart::IsoYear)), "TO_CHAR(\"D\", 'IYYY')");
    assert_eq!(sql(extract(DatePart::Month)), "MONTH(\"D\")");
}

#[test]
fn test_timezone_conversion_binds_offset() {
    let expr = Expr::Extract {
        part: DatePart::Hour,
        expr: Box::new(Expr::col("d")),
        tzname: Some("Asia/Kolkata+05:30".into()),
    };
    let (sql_text, params) = translator().translate_fragment(&expr).unwrap();
    assert_eq!(sql_text, "HOUR(TIMEZONE_TZ(\"D\", %s))");
    assert_eq!(params, vec![Value::String("+05:30".into())]);

    let same_zone = Expr::CastDate {
        expr: Box::new(Expr::col("d")),
        tzname: Some("UTC".into()),
    };
    assert_eq!(sql(same_zone), "(\"D\")::date");
}

#[test]
fn test_truncation_and_casts() {
    let trunc = |kind| Expr::Trunc {
        unit: "month".into(),
        expr: Box::new(Expr::col("d")),
        kind,
        tzname: None,
    };
    let (sql_text, params) = translator().translate_fragment(&trunc(TruncKind::Date)).unwrap();
    assert_eq!(sql_text, "DATE_TRUNC(%s, \"D\")");
    assert_eq!(params, vec![Value::String("month".into())]);
    assert_eq!(sql(trunc(TruncKind::Time)), "DATE_TRUNC(%s, \"D\")::time");

    assert_eq!(
        sql(Expr::CastTime {
            expr: Box::new(Expr::col("d")),
            tzname: None
        }),
        "TIME(\"D\")"
    );
    assert_eq!(
        sql(Expr::Cast {
            expr: Box::new(Expr::col("n")),
            target_type: "varchar(10)".into()
        }),
        "CAST(\"N\" AS VARCHAR(10))"
    );
}

#[test]
fn test_scalar_functions() {
    assert_eq!(
        sql(Expr::JsonObject(vec![("name".into(), Expr::col("n"))])),
        "JSON_OBJECT(KEY 'name' VALUE \"N\")"
    );
    assert_eq!(
        sql(Expr::Log {
            value: Box::new(Expr::col("v")),
            base: Box::new(Expr::col("b")),
        }),
        "DOUBLE(LN(\"V\") / LN(\"B\"))"
    );
    assert_eq!(sql(Expr::Random), "SYSFUN.RAND()");
    assert_eq!(sql(Expr::Pi), "3.141592653589793");
    assert_eq!(sql(Expr::Duration(2 * 86_400_000_000)), "2 DAYS");
    assert_eq!(sql(Expr::val(Value::Null)), "NULL");
}

#[test]
fn test_window_function() {
    let expr = Expr::Window {
        func: Box::new(Expr::func("row_number", vec![])),
        partition_by: vec![Expr::col("dept")],
        order_by: vec![OrderBy::desc(Expr::col("salary"))],
    };
    assert_eq!(
        sql(expr),
        "ROW_NUMBER() OVER (PARTITION BY \"DEPT\" ORDER BY \"SALARY\" DESC)"
    );
}

#[test]
fn test_scalar_subquery_params_follow_text_order() {
    let inner = LogicalQuery::from_table("u")
        .column(Expr::col("a"))
        .filter(Predicate::value(Expr::col("b"), Lookup::Exact, 2));
    let expr = Expr::func(
        "coalesce",
        vec![Expr::Subquery(Box::new(inner)), Expr::val(5)],
    );
    let (sql_text, params) = translator().translate_fragment(&expr).unwrap();
    assert_eq!(sql_text, "COALESCE((SELECT \"A\" FROM \"U\" WHERE \"B\" = %s), %s)");
    assert_eq!(params, vec![Value::Int(2), Value::Int(5)]);
}

#[test]
fn test_md5_requires_opt_in() {
    let query = LogicalQuery::from_table("t").column(Expr::Md5(Box::new(Expr::col("name"))));
    assert!(matches!(
        native().compile(&query),
        Err(Db2Error::UnsupportedConstruct(_))
    ));

    let compiler = Db2Compiler::new(DialectCapabilities {
        allow_digest_substitution: true,
        ..DialectCapabilities::db2()
    });
    let compiled = compile(&compiler, &query);
    assert_eq!(compiled.sql, "SELECT LOWER(HEX(HASH_SHA256(\"NAME\"))) FROM \"T\"");
    assert_eq!(compiled.notices, vec![Notice::DigestSubstituted]);
}

#[test]
fn test_distinct_dropped_with_lob_columns() {
    let query = LogicalQuery::from_table("t")
        .column(Expr::Column(ColumnRef::new("body").lob()))
        .column(Expr::col("id"))
        .distinct();
    let compiled = compile(&native(), &query);
    assert_eq!(compiled.sql, "SELECT \"BODY\", \"ID\" FROM \"T\"");
    assert_eq!(
        compiled.notices,
        vec![Notice::DistinctDropped {
            lob_columns: vec!["body".into()]
        }]
    );

    let allowed = Db2Compiler::new(DialectCapabilities {
        lob_distinct: true,
        ..DialectCapabilities::db2()
    });
    assert_eq!(
        compile(&allowed, &query).sql,
        "SELECT DISTINCT \"BODY\", \"ID\" FROM \"T\""
    );
}

#[test]
fn test_distinct_on_rejected() {
    let mut query = LogicalQuery::from_table("t").column(Expr::col("a"));
    query.distinct_on = vec![Expr::col("a")];
    assert!(matches!(
        native().compile(&query),
        Err(Db2Error::UnsupportedConstruct(_))
    ));
}

#[test]
fn test_registered_override_replaces_entry() {
    fn plain_rand(_: &Translator, _: &Expr, _: &mut ParamContext) -> crate::error::Db2Result<String> {
        Ok("RAND()".to_string())
    }

    let mut compiler = native();
    let previous = compiler.translator_mut().register(ExprKind::Random, plain_rand);
    assert!(previous.is_some());
    let query = LogicalQuery::default().column(Expr::Random);
    assert_eq!(compile(&compiler, &query).sql, "SELECT RAND() FROM SYSIBM.SYSDUMMY1");
    // other compilers keep the default entry
    assert_eq!(compile(&native(), &query).sql, "SELECT SYSFUN.RAND() FROM SYSIBM.SYSDUMMY1");
}

#[test]
fn test_joins_and_subquery_sources() {
    let query = LogicalQuery {
        columns: vec![SelectColumn::new(Expr::Column(ColumnRef::qualified("o", "id")))],
        source: Source::Table {
            name: "orders".into(),
            schema: Some("app".into()),
            alias: Some("o".into()),
        },
        joins: vec![Join {
            kind: JoinKind::Left,
            source: Source::table("customers"),
            on: Predicate::new(
                Expr::Column(ColumnRef::qualified("o", "customer_id")),
                Lookup::Exact,
                Operand::Expr(Expr::Column(ColumnRef::qualified("customers", "id"))),
            )
            .into(),
        }],
        ..LogicalQuery::default()
    };
    assert_eq!(
        compile(&native(), &query).sql,
        "SELECT \"O\".\"ID\" FROM \"APP\".\"ORDERS\" AS \"O\" LEFT OUTER JOIN \"CUSTOMERS\" ON \"O\".\"CUSTOMER_ID\" = \"CUSTOMERS\".\"ID\""
    );
}
