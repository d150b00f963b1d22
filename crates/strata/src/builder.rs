//! Statement compiler: walks expression trees into SQL text and arguments.

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::expr::{Aggregate, Column, Expr, Predicate, Selectable, SubQuery};
use crate::model::{Model, Registry};
use crate::query::SelectQuery;
use crate::statement::Statement;
use crate::table::{JoinCondition, Table, TableRef};
use crate::value::Value;
use std::sync::Arc;

/// Accumulates SQL text and bound arguments for one statement.
///
/// A builder is used for a single `build()` and then consumed by
/// [`Builder::finish`]; subqueries are compiled into the same builder.
pub struct Builder<'a> {
    registry: &'a Registry,
    dialect: &'a dyn Dialect,
    quote: char,
    sql: String,
    args: Vec<Value>,
    scope: Option<TableRef>,
}

impl<'a> Builder<'a> {
    pub fn new(registry: &'a Registry, dialect: &'a dyn Dialect) -> Self {
        Self {
            registry,
            dialect,
            quote: dialect.quote(),
            sql: String::with_capacity(128),
            args: Vec::new(),
            scope: None,
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn write_str(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    pub fn write_char(&mut self, c: char) {
        self.sql.push(c);
    }

    /// Write a quoted identifier; dotted names are quoted per segment.
    pub fn quote_ident(&mut self, name: &str) {
        for (i, segment) in name.split('.').enumerate() {
            if i > 0 {
                self.sql.push('.');
            }
            self.sql.push(self.quote);
            self.sql.push_str(segment);
            self.sql.push(self.quote);
        }
    }

    /// Append an argument and write its placeholder.
    pub fn bind(&mut self, value: Value) {
        self.args.push(value);
        let dialect = self.dialect;
        dialect.bind_arg(self);
    }

    /// Number of arguments appended so far
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Set the table that unqualified columns resolve against.
    pub fn set_scope(&mut self, scope: TableRef) -> Option<TableRef> {
        self.scope.replace(scope)
    }

    /// Terminate with `;` and take the statement.
    pub fn finish(mut self) -> Statement {
        self.sql.push(';');
        Statement::new(self.sql, self.args)
    }

    pub fn table_model(&self, table: &Table) -> OrmResult<Arc<Model>> {
        table.model(self.registry)
    }

    /// Compile an expression in operand position.
    ///
    /// Predicates are parenthesized, except quantified subqueries
    /// (`ANY (...)`), which already carry their own parentheses.
    pub fn compile_operand(&mut self, expr: &Expr) -> OrmResult<()> {
        match expr {
            Expr::Predicate(p) if !p.op().is_some_and(|op| op.is_quantifier()) => {
                self.write_char('(');
                self.compile_predicate(p)?;
                self.write_char(')');
                Ok(())
            }
            _ => self.compile_expr(expr),
        }
    }

    /// Compile an expression outside of a select list.
    pub fn compile_expr(&mut self, expr: &Expr) -> OrmResult<()> {
        match expr {
            Expr::Column(c) => self.compile_column(c, false),
            Expr::Value(v) => {
                self.bind(v.clone());
                Ok(())
            }
            Expr::Predicate(p) => self.compile_predicate(p),
            Expr::Aggregate(a) => self.compile_aggregate(a, false),
            Expr::Raw(r) => {
                self.write_str(&r.sql);
                self.args.extend(r.args.iter().cloned());
                Ok(())
            }
            Expr::SubQuery(s) => self.compile_subquery(s, false),
            Expr::List(items) => {
                self.write_char('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.write_str(", ");
                    }
                    self.compile_operand(item)?;
                }
                self.write_char(')');
                Ok(())
            }
        }
    }

    pub fn compile_predicate(&mut self, p: &Predicate) -> OrmResult<()> {
        if let Some(left) = p.left() {
            self.compile_operand(left)?;
        }
        let Some(op) = p.op() else {
            return Ok(());
        };
        if p.left().is_some() {
            self.write_char(' ');
        }
        self.write_str(op.as_str());
        if let Some(right) = p.right() {
            self.write_char(' ');
            self.compile_operand(right)?;
        }
        Ok(())
    }

    /// Write ` KEYWORD p1 AND p2 ...`; no-op for an empty list.
    pub fn compile_condition(&mut self, keyword: &str, predicates: &[Predicate]) -> OrmResult<()> {
        let Some(folded) = Predicate::fold_and(predicates.iter().cloned()) else {
            return Ok(());
        };
        self.write_char(' ');
        self.write_str(keyword);
        self.write_char(' ');
        self.compile_predicate(&folded)
    }

    pub fn compile_column(&mut self, column: &Column, with_alias: bool) -> OrmResult<()> {
        let (qualifier, name) = match &column.table {
            Some(table) => self.resolve(table, &column.field)?,
            None => {
                let scope = self
                    .scope
                    .clone()
                    .ok_or_else(|| OrmError::invalid_field(&column.field))?;
                self.resolve(&scope, &column.field)?
            }
        };
        if let Some(qualifier) = qualifier {
            self.quote_ident(&qualifier);
            self.write_char('.');
        }
        self.quote_ident(&name);
        if with_alias {
            self.write_alias(column.alias.as_deref());
        }
        Ok(())
    }

    fn compile_aggregate(&mut self, aggregate: &Aggregate, with_alias: bool) -> OrmResult<()> {
        self.write_str(aggregate.func);
        self.write_char('(');
        self.compile_column(&aggregate.column, false)?;
        self.write_char(')');
        if with_alias {
            self.write_alias(aggregate.alias.as_deref());
        }
        Ok(())
    }

    fn compile_subquery(&mut self, sub: &SubQuery, with_alias: bool) -> OrmResult<()> {
        self.write_char('(');
        self.compile_select(&sub.query)?;
        self.write_char(')');
        if with_alias {
            self.write_alias(sub.alias.as_deref());
        }
        Ok(())
    }

    fn write_alias(&mut self, alias: Option<&str>) {
        if let Some(alias) = alias {
            self.write_str(" AS ");
            self.quote_ident(alias);
        }
    }

    /// Map a field name to `(qualifier, column)` through a table reference.
    ///
    /// Joins resolve against the leftmost side that knows the field.
    fn resolve(&self, table: &TableRef, field: &str) -> OrmResult<(Option<String>, String)> {
        match table {
            TableRef::Table(t) => {
                let model = self.table_model(t)?;
                let column = model.require_field(field)?.column.clone();
                Ok((t.alias().map(str::to_string), column))
            }
            TableRef::Join(j) => match self.resolve(&j.left, field) {
                Err(OrmError::InvalidField(_)) => self.resolve(&j.right, field),
                resolved => resolved,
            },
            TableRef::SubQuery(s) => {
                let column = self.resolve_exposed(&s.query, field)?;
                Ok((s.alias.clone(), column))
            }
        }
    }

    /// Name under which a subquery exposes `field` to the outer query.
    fn resolve_exposed(&self, query: &SelectQuery, field: &str) -> OrmResult<String> {
        if query.columns.is_empty() {
            return self.resolve(&query.from, field).map(|(_, column)| column);
        }
        for item in &query.columns {
            let alias = match item {
                Selectable::Column(c) => c.alias.as_deref(),
                Selectable::Aggregate(a) => a.alias.as_deref(),
                Selectable::SubQuery(s) => s.alias.as_deref(),
                Selectable::Raw(_) => None,
            };
            if alias == Some(field) {
                return Ok(field.to_string());
            }
        }
        for item in &query.columns {
            if let Selectable::Column(c) = item
                && c.alias.is_none()
                && c.field == field
            {
                let table = c.table.as_ref().unwrap_or(&query.from);
                return self.resolve(table, field).map(|(_, column)| column);
            }
        }
        Err(OrmError::invalid_field(field))
    }

    pub fn compile_table_ref(&mut self, table: &TableRef) -> OrmResult<()> {
        match table {
            TableRef::Table(t) => {
                let model = self.table_model(t)?;
                self.quote_ident(model.table_name());
                self.write_alias(t.alias());
                Ok(())
            }
            TableRef::Join(j) => {
                self.compile_table_ref(&j.left)?;
                self.write_char(' ');
                self.write_str(j.kind.as_str());
                self.write_char(' ');
                self.compile_table_ref(&j.right)?;
                match &j.condition {
                    JoinCondition::On(predicates) => self.compile_condition("ON", predicates),
                    JoinCondition::Using(columns) => {
                        self.write_str(" USING (");
                        for (i, c) in columns.iter().enumerate() {
                            if i > 0 {
                                self.write_str(", ");
                            }
                            let (_, name) = self.resolve(table, &c.field)?;
                            self.quote_ident(&name);
                        }
                        self.write_char(')');
                        Ok(())
                    }
                }
            }
            TableRef::SubQuery(s) => self.compile_subquery(s, true),
        }
    }

    fn compile_selectable(&mut self, item: &Selectable) -> OrmResult<()> {
        match item {
            Selectable::Column(c) => self.compile_column(c, true),
            Selectable::Aggregate(a) => self.compile_aggregate(a, true),
            Selectable::Raw(r) => {
                self.write_str(&r.sql);
                self.args.extend(r.args.iter().cloned());
                Ok(())
            }
            Selectable::SubQuery(s) => self.compile_subquery(s, true),
        }
    }

    /// Compile a SELECT without the trailing `;`.
    pub fn compile_select(&mut self, query: &SelectQuery) -> OrmResult<()> {
        if !query.having.is_empty() && query.group_by.is_empty() {
            return Err(OrmError::HavingWithoutGroupBy);
        }

        let outer = self.set_scope(query.from.clone());
        let result = self.compile_select_body(query);
        self.scope = outer;
        result
    }

    fn compile_select_body(&mut self, query: &SelectQuery) -> OrmResult<()> {
        self.write_str("SELECT ");
        if query.distinct {
            self.write_str("DISTINCT ");
        }
        if query.columns.is_empty() {
            self.write_char('*');
        } else {
            for (i, item) in query.columns.iter().enumerate() {
                if i > 0 {
                    self.write_str(", ");
                }
                self.compile_selectable(item)?;
            }
        }

        self.write_str(" FROM ");
        self.compile_table_ref(&query.from)?;

        self.compile_condition("WHERE", &query.where_)?;

        if !query.group_by.is_empty() {
            self.write_str(" GROUP BY ");
            for (i, c) in query.group_by.iter().enumerate() {
                if i > 0 {
                    self.write_str(", ");
                }
                self.compile_column(c, false)?;
            }
        }

        self.compile_condition("HAVING", &query.having)?;

        if !query.order_by.is_empty() {
            self.write_str(" ORDER BY ");
            for (i, o) in query.order_by.iter().enumerate() {
                if i > 0 {
                    self.write_str(", ");
                }
                self.compile_column(&o.column, false)?;
                self.write_str(if o.descending { " DESC" } else { " ASC" });
            }
        }

        if let Some(limit) = query.limit {
            self.write_str(" LIMIT ");
            self.bind(Value::UInt(limit));
        }
        if let Some(offset) = query.offset {
            self.write_str(" OFFSET ");
            self.bind(Value::UInt(offset));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres};
    use crate::expr::{col, not, raw};
    use crate::reflect::{Entity, FieldInfo, FieldType, RawAccess, Reflect, StructInfo, TypeInfo};
    use std::any::TypeId;

    #[derive(Default)]
    struct Account {
        id: i64,
        owner_name: String,
    }

    // SAFETY: offsets and accessors match the fields of `Account`.
    unsafe impl Reflect for Account {
        fn type_info() -> TypeInfo {
            TypeInfo::Struct(StructInfo {
                name: "Account",
                type_id: TypeId::of::<Account>(),
                size: size_of::<Account>(),
                table_name: None,
                fields: vec![
                    FieldInfo {
                        name: "Id",
                        ty: FieldType::of::<i64>(),
                        tag: None,
                        offset: std::mem::offset_of!(Account, id),
                        raw: RawAccess::of::<i64>(),
                    },
                    FieldInfo {
                        name: "OwnerName",
                        ty: FieldType::of::<String>(),
                        tag: None,
                        offset: std::mem::offset_of!(Account, owner_name),
                        raw: RawAccess::of::<String>(),
                    },
                ],
            })
        }
    }

    impl Entity for Account {
        fn read_field(&self, field: &str) -> Option<Value> {
            match field {
                "Id" => Some(Value::Int(self.id)),
                "OwnerName" => Some(Value::Text(self.owner_name.clone())),
                _ => None,
            }
        }

        fn write_field(&mut self, _field: &str, _value: Value) -> Option<Result<(), String>> {
            None
        }
    }

    fn where_sql(dialect: &dyn Dialect, p: &Predicate) -> Statement {
        let registry = Registry::new();
        let mut b = Builder::new(&registry, dialect);
        b.set_scope(Table::of::<Account>().into());
        b.compile_condition("WHERE", std::slice::from_ref(p)).unwrap();
        b.finish()
    }

    #[test]
    fn precedence_is_explicit() {
        let a = || col("Id").eq(1);
        let b = || col("OwnerName").eq("x");
        let c = || col("Id").gt(5);

        let left = where_sql(&MySql, &a().and(b()).or(c()));
        let right = where_sql(&MySql, &a().and(b().or(c())));
        assert_eq!(
            left.sql,
            " WHERE ((`id` = ?) AND (`owner_name` = ?)) OR (`id` > ?);"
        );
        assert_eq!(
            right.sql,
            " WHERE (`id` = ?) AND ((`owner_name` = ?) OR (`id` > ?));"
        );
        assert_ne!(left.sql, right.sql);
    }

    #[test]
    fn not_and_raw_operands() {
        let s = where_sql(&MySql, &not(col("Id").eq(1)));
        assert_eq!(s.sql, " WHERE NOT (`id` = ?);");

        let s = where_sql(&Postgres, &col("Id").eq(raw("\"id\" + $1", [1])));
        assert_eq!(s.sql, " WHERE \"id\" = (\"id\" + $1);");
        assert_eq!(s.args, vec![Value::Int(1)]);
    }

    #[test]
    fn unknown_field_fails() {
        let registry = Registry::new();
        let mut b = Builder::new(&registry, &MySql);
        b.set_scope(Table::of::<Account>().into());
        let err = b
            .compile_predicate(&col("Missing").eq(1))
            .unwrap_err();
        assert!(matches!(err, OrmError::InvalidField(f) if f == "Missing"));
    }
}
