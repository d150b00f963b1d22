use crate::builder::Builder;
use crate::db::Orm;
use crate::error::{OrmError, OrmResult};
use crate::expr::Assignable;
use crate::model::Field;
use crate::reflect::Entity;
use crate::resolver::ValueResolver;
use crate::session::ExecResult;
use crate::statement::{Statement, StatementKind};
use crate::table::Table;

/// Upsert clause: conflict target fields plus assignments.
///
/// With no assignments the conflict is ignored (`DO NOTHING`, where the
/// dialect supports it).
#[derive(Debug, Clone, Default)]
pub struct OnConflict {
    pub(crate) targets: Vec<String>,
    pub(crate) assigns: Vec<Assignable>,
}

impl OnConflict {
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn assigns(&self) -> &[Assignable] {
        &self.assigns
    }
}

/// INSERT executor for rows of `T`.
///
/// # Example
///
/// ```ignore
/// use strata::expr::{assign, col};
///
/// Inserter::new(&db)
///     .values([&user])
///     .on_conflict(["Id"])
///     .update([col("Age").into(), assign("Balance", 0).into()])
///     .exec()
///     .await?;
/// ```
pub struct Inserter<'a, T> {
    orm: &'a dyn Orm,
    rows: Vec<&'a T>,
    fields: Vec<String>,
    on_conflict: Option<OnConflict>,
}

impl<'a, T: Entity> Inserter<'a, T> {
    pub fn new(orm: &'a dyn Orm) -> Self {
        Self {
            orm,
            rows: Vec::new(),
            fields: Vec::new(),
            on_conflict: None,
        }
    }

    /// Rows to insert, one placeholder group each.
    pub fn values(mut self, rows: impl IntoIterator<Item = &'a T>) -> Self {
        self.rows.extend(rows);
        self
    }

    /// Insert only these fields instead of every model field.
    pub fn fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Start an upsert on the given conflict target fields.
    ///
    /// MySQL ignores the targets.
    pub fn on_conflict<I>(self, targets: I) -> OnConflictBuilder<'a, T>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        OnConflictBuilder {
            inserter: self,
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn build(&self) -> OrmResult<Statement> {
        if self.rows.is_empty() {
            return Err(OrmError::EmptyInsertRow);
        }

        let core = self.orm.core();
        let model = core.registry().get::<T>()?;
        let fields: Vec<&Field> = if self.fields.is_empty() {
            model.fields().iter().collect()
        } else {
            self.fields
                .iter()
                .map(|f| model.require_field(f))
                .collect::<OrmResult<_>>()?
        };

        let mut b = Builder::new(core.registry(), core.dialect());
        b.set_scope(Table::of::<T>().into());
        b.write_str("INSERT INTO ");
        b.quote_ident(model.table_name());
        b.write_str(" (");
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                b.write_str(", ");
            }
            b.quote_ident(&field.column);
        }
        b.write_str(") VALUES ");

        let resolver = core.resolver();
        for (r, row) in self.rows.iter().enumerate() {
            if r > 0 {
                b.write_str(", ");
            }
            b.write_char('(');
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    b.write_str(", ");
                }
                b.bind(resolver.read_field(&model, *row, field.name)?);
            }
            b.write_char(')');
        }

        if let Some(oc) = &self.on_conflict {
            core.dialect().on_conflict(&mut b, &model, oc)?;
        }
        Ok(b.finish())
    }

    pub async fn exec(self) -> OrmResult<ExecResult> {
        let statement = self.build()?;
        let table = super::table_of::<T>(self.orm)?;
        super::exec(self.orm, StatementKind::Insert, statement, Some(table)).await
    }
}

/// An upsert waiting for its assignments.
pub struct OnConflictBuilder<'a, T> {
    inserter: Inserter<'a, T>,
    targets: Vec<String>,
}

impl<'a, T: Entity> OnConflictBuilder<'a, T> {
    /// Update these assignments on conflict.
    ///
    /// A bare column copies the incoming value; an empty list means
    /// `DO NOTHING`.
    pub fn update<I>(mut self, assigns: I) -> Inserter<'a, T>
    where
        I: IntoIterator,
        I::Item: Into<Assignable>,
    {
        self.inserter.on_conflict = Some(OnConflict {
            targets: self.targets,
            assigns: assigns.into_iter().map(Into::into).collect(),
        });
        self.inserter
    }

    /// Ignore conflicting rows.
    pub fn do_nothing(self) -> Inserter<'a, T> {
        self.update(Vec::<Assignable>::new())
    }
}
