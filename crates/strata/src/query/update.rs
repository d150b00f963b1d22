use crate::builder::Builder;
use crate::db::Orm;
use crate::error::{OrmError, OrmResult};
use crate::expr::{Assignable, Predicate};
use crate::reflect::Entity;
use crate::resolver::ValueResolver;
use crate::session::ExecResult;
use crate::statement::{Statement, StatementKind};
use crate::table::Table;

/// UPDATE executor for the table of `T`.
///
/// # Example
///
/// ```ignore
/// use strata::expr::{assign, col, raw};
///
/// Updater::<User>::new(&db)
///     .update(&user)
///     .set([col("NickName").into(), assign("Age", raw("`age` + ?", [1])).into()])
///     .where_([col("Id").eq(user.id)])
///     .exec()
///     .await?;
/// ```
pub struct Updater<'a, T> {
    orm: &'a dyn Orm,
    entity: Option<&'a T>,
    assigns: Vec<Assignable>,
    where_: Vec<Predicate>,
}

impl<'a, T: Entity> Updater<'a, T> {
    pub fn new(orm: &'a dyn Orm) -> Self {
        Self {
            orm,
            entity: None,
            assigns: Vec::new(),
            where_: Vec::new(),
        }
    }

    /// Entity that supplies values for bare-column assignments.
    pub fn update(mut self, entity: &'a T) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn set<I>(mut self, assigns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Assignable>,
    {
        self.assigns.extend(assigns.into_iter().map(Into::into));
        self
    }

    pub fn where_(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.where_.extend(predicates);
        self
    }

    pub fn build(&self) -> OrmResult<Statement> {
        if self.assigns.is_empty() {
            return Err(OrmError::EmptyUpdateAssignment);
        }

        let core = self.orm.core();
        let model = core.registry().get::<T>()?;
        let resolver = core.resolver();

        let mut b = Builder::new(core.registry(), core.dialect());
        b.set_scope(Table::of::<T>().into());
        b.write_str("UPDATE ");
        b.quote_ident(model.table_name());
        b.write_str(" SET ");
        for (i, assign) in self.assigns.iter().enumerate() {
            if i > 0 {
                b.write_str(", ");
            }
            match assign {
                Assignable::Assign(a) => {
                    b.quote_ident(&model.require_field(a.field())?.column);
                    b.write_str(" = ");
                    b.compile_operand(a.value())?;
                }
                Assignable::Column(c) => {
                    let entity = self.entity.ok_or_else(|| {
                        OrmError::InvalidAssignment(format!(
                            "column {} needs an entity to read its value from",
                            c.field()
                        ))
                    })?;
                    b.quote_ident(&model.require_field(c.field())?.column);
                    b.write_str(" = ");
                    b.bind(resolver.read_field(&model, entity, c.field())?);
                }
            }
        }

        b.compile_condition("WHERE", &self.where_)?;
        Ok(b.finish())
    }

    pub async fn exec(self) -> OrmResult<ExecResult> {
        let statement = self.build()?;
        let table = super::table_of::<T>(self.orm)?;
        super::exec(self.orm, StatementKind::Update, statement, Some(table)).await
    }
}
