mod common;

use common::{MockDriver, OrderItem, TestModel};
use regex::Regex;
use strata::expr::{Assignable, Selectable, assign, col, count, desc, exists};
use strata::{Db, Deleter, Inserter, MySql, Postgres, Selector, StandardSql, Statement, Updater};

fn databases() -> [(&'static str, Db); 3] {
    [
        ("standard", Db::with_dialect(MockDriver::new(), StandardSql)),
        ("mysql", Db::with_dialect(MockDriver::new(), MySql)),
        ("postgres", Db::with_dialect(MockDriver::new(), Postgres)),
    ]
}

/// Placeholders in order of appearance, as written.
fn placeholders(sql: &str) -> Vec<String> {
    Regex::new(r"\?|\$\d+")
        .unwrap()
        .find_iter(sql)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Replace identifier quotes and placeholders with one neutral form each.
fn normalise(sql: &str) -> String {
    Regex::new(r"\$\d+")
        .unwrap()
        .replace_all(sql, "?")
        .replace(['`', '"'], "'")
}

fn check(case: &str, build: fn(&Db) -> Statement) {
    let mut texts = Vec::new();
    let mut args = Vec::new();

    for (name, db) in databases() {
        let s = build(&db);
        let marks = placeholders(&s.sql);
        assert_eq!(marks.len(), s.args.len(), "{case} under {name}: {}", s.sql);

        if name == "postgres" {
            let expected: Vec<String> = (1..=marks.len()).map(|i| format!("${i}")).collect();
            assert_eq!(marks, expected, "{case} under {name}: {}", s.sql);
            assert!(!s.sql.contains('`') && !s.sql.contains('?'), "{}", s.sql);
        } else {
            assert!(marks.iter().all(|m| m == "?"), "{case} under {name}: {}", s.sql);
        }
        if name == "mysql" {
            assert!(!s.sql.contains('"'), "{}", s.sql);
        } else {
            assert!(!s.sql.contains('`'), "{}", s.sql);
        }

        texts.push(normalise(&s.sql));
        args.push(s.args);
    }

    assert!(texts.windows(2).all(|w| w[0] == w[1]), "{case}: {texts:#?}");
    assert!(args.windows(2).all(|w| w[0] == w[1]), "{case}: {args:#?}");
}

fn model() -> TestModel {
    TestModel {
        id: 3,
        first_name: "Ann".to_string(),
        age: 40,
        last_name: None,
    }
}

#[test]
fn select_differs_only_in_quotes_and_placeholders() {
    check("select", |db| {
        let adults = Selector::<TestModel>::new(db)
            .select([col("id")])
            .where_([col("age").ge(18)])
            .as_subquery();
        let big_orders = Selector::<OrderItem>::new(db)
            .where_([col("amount").gt(100.0)])
            .as_subquery();
        Selector::<TestModel>::new(db)
            .select([
                Selectable::from(col("age")),
                Selectable::from(count("id").as_("n")),
            ])
            .where_([
                col("id").in_subquery(adults),
                col("first_name").in_list(["a", "b"]).or(col("last_name").eq("c")),
                exists(big_orders),
            ])
            .group_by(["age"])
            .having([count("id").gt(1)])
            .order_by([desc("age")])
            .limit(20)
            .offset(40)
            .build()
            .unwrap()
    });
}

#[test]
fn insert_differs_only_in_quotes_and_placeholders() {
    check("insert", |db| {
        let (a, b) = (model(), model());
        Inserter::new(db)
            .values([&a, &b])
            .fields(["id", "first_name", "last_name"])
            .build()
            .unwrap()
    });
}

#[test]
fn update_differs_only_in_quotes_and_placeholders() {
    check("update", |db| {
        let m = model();
        Updater::new(db)
            .update(&m)
            .set([
                Assignable::from(col("first_name")),
                Assignable::from(assign("age", col("age"))),
                Assignable::from(assign("last_name", "x")),
            ])
            .where_([col("id").eq(m.id), col("age").lt(99).not()])
            .build()
            .unwrap()
    });
}

#[test]
fn delete_differs_only_in_quotes_and_placeholders() {
    check("delete", |db| {
        Deleter::<TestModel>::new(db)
            .where_([col("id").in_list([1, 2, 3]), col("age").le(5)])
            .build()
            .unwrap()
    });
}
