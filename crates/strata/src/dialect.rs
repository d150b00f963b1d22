//! SQL dialects: identifier quoting, placeholder style and upsert syntax.

use crate::builder::Builder;
use crate::error::{OrmError, OrmResult};
use crate::expr::Assignable;
use crate::model::Model;
use crate::query::OnConflict;

/// Syntax that varies between SQL products.
pub trait Dialect: Send + Sync {
    /// Name for diagnostics.
    fn name(&self) -> &'static str;

    /// Identifier quote character.
    fn quote(&self) -> char;

    /// Write the placeholder for the argument that was just appended.
    fn bind_arg(&self, b: &mut Builder<'_>);

    /// Write the upsert clause that follows `VALUES (...)`.
    fn on_conflict(&self, b: &mut Builder<'_>, model: &Model, oc: &OnConflict) -> OrmResult<()>;
}

/// ANSI SQL: `"ident"`, `?` placeholders, no upsert.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardSql;

impl Dialect for StandardSql {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn quote(&self) -> char {
        '"'
    }

    fn bind_arg(&self, b: &mut Builder<'_>) {
        b.write_char('?');
    }

    fn on_conflict(&self, _b: &mut Builder<'_>, _model: &Model, _oc: &OnConflict) -> OrmResult<()> {
        Err(OrmError::UnsupportedOnConflict(
            "standard SQL has no upsert syntax".to_string(),
        ))
    }
}

/// MySQL: `` `ident` ``, `?` placeholders, `ON DUPLICATE KEY UPDATE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote(&self) -> char {
        '`'
    }

    fn bind_arg(&self, b: &mut Builder<'_>) {
        b.write_char('?');
    }

    /// Conflict targets are implied by the table's unique keys and ignored.
    fn on_conflict(&self, b: &mut Builder<'_>, model: &Model, oc: &OnConflict) -> OrmResult<()> {
        if oc.assigns.is_empty() {
            return Err(OrmError::UnsupportedOnConflict(
                "ON DUPLICATE KEY UPDATE requires at least one assignment".to_string(),
            ));
        }

        b.write_str(" ON DUPLICATE KEY UPDATE ");
        for (i, assign) in oc.assigns.iter().enumerate() {
            if i > 0 {
                b.write_str(", ");
            }
            match assign {
                Assignable::Assign(a) => {
                    b.quote_ident(&model.require_field(&a.field)?.column);
                    b.write_str(" = ");
                    b.compile_operand(&a.value)?;
                }
                Assignable::Column(c) => {
                    let column = &model.require_field(c.field())?.column;
                    b.quote_ident(column);
                    b.write_str(" = VALUES(");
                    b.quote_ident(column);
                    b.write_char(')');
                }
            }
        }
        Ok(())
    }
}

/// PostgreSQL: `"ident"`, `$n` placeholders, `ON CONFLICT`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote(&self) -> char {
        '"'
    }

    fn bind_arg(&self, b: &mut Builder<'_>) {
        let n = b.arg_count();
        b.write_char('$');
        b.write_str(&n.to_string());
    }

    fn on_conflict(&self, b: &mut Builder<'_>, model: &Model, oc: &OnConflict) -> OrmResult<()> {
        if oc.targets.is_empty() {
            if oc.assigns.is_empty() {
                b.write_str(" ON CONFLICT DO NOTHING");
                return Ok(());
            }
            return Err(OrmError::UnsupportedOnConflict(
                "DO UPDATE requires a conflict target".to_string(),
            ));
        }

        b.write_str(" ON CONFLICT (");
        for (i, target) in oc.targets.iter().enumerate() {
            if i > 0 {
                b.write_str(", ");
            }
            b.quote_ident(&model.require_field(target)?.column);
        }
        b.write_char(')');

        if oc.assigns.is_empty() {
            b.write_str(" DO NOTHING");
            return Ok(());
        }

        b.write_str(" DO UPDATE SET ");
        for (i, assign) in oc.assigns.iter().enumerate() {
            if i > 0 {
                b.write_str(", ");
            }
            match assign {
                Assignable::Assign(a) => {
                    b.quote_ident(&model.require_field(&a.field)?.column);
                    b.write_str(" = ");
                    b.compile_operand(&a.value)?;
                }
                Assignable::Column(c) => {
                    let column = &model.require_field(c.field())?.column;
                    b.quote_ident(column);
                    b.write_str(" = EXCLUDED.");
                    b.quote_ident(column);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Registry;
    use crate::value::Value;

    #[test]
    fn placeholders_follow_dialect() {
        let registry = Registry::new();

        let mut b = Builder::new(&registry, &Postgres);
        b.bind(Value::Int(1));
        b.write_str(", ");
        b.bind(Value::Int(2));
        assert_eq!(b.finish().sql, "$1, $2;");

        let mut b = Builder::new(&registry, &MySql);
        b.bind(Value::Int(1));
        b.quote_ident("a.b");
        assert_eq!(b.finish().sql, "?`a`.`b`;");
    }
}
