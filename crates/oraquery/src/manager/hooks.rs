//! Before/after callbacks around the manager's DML operations.

use crate::error::OrmResult;
use crate::model::Record;
use crate::session::Session;
use std::fmt;
use std::sync::Arc;

/// A record transform run inside the unit of work of a DML operation.
///
/// The session is the one the statement runs on, so a hook can issue extra
/// statements in the same transaction.
pub type Hook = Arc<dyn Fn(Record, &mut dyn Session) -> OrmResult<Record> + Send + Sync>;

/// The DML operation a hook is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmlKind {
    Insert,
    Update,
    Delete,
}

impl DmlKind {
    /// Lower-case operation name.
    pub fn name(self) -> &'static str {
        match self {
            DmlKind::Insert => "insert",
            DmlKind::Update => "update",
            DmlKind::Delete => "delete",
        }
    }
}

impl fmt::Display for DmlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional `before_*` / `after_*` hooks. Missing hooks are the identity.
///
/// ```
/// use oraquery::manager::ManagerHooks;
///
/// let hooks = ManagerHooks::new().before_insert(|record, _session| {
///     record.with("estado", "NUEVO")
/// });
/// assert!(hooks.has_hooks());
/// ```
#[derive(Clone, Default)]
pub struct ManagerHooks {
    before_insert: Option<Hook>,
    after_insert: Option<Hook>,
    before_update: Option<Hook>,
    after_update: Option<Hook>,
    before_delete: Option<Hook>,
    after_delete: Option<Hook>,
}

macro_rules! hook_setter {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            pub fn $name<F>(mut self, hook: F) -> Self
            where
                F: Fn(Record, &mut dyn Session) -> OrmResult<Record> + Send + Sync + 'static,
            {
                self.$name = Some(Arc::new(hook));
                self
            }
        )*
    };
}

impl ManagerHooks {
    /// No hooks.
    pub fn new() -> Self {
        Self::default()
    }

    hook_setter! {
        /// Transform the record before it is inserted.
        before_insert;
        /// Transform the record after a successful insert.
        after_insert;
        /// Transform the record before it is updated.
        before_update;
        /// Transform the record after a successful update.
        after_update;
        /// Transform the record before it is deleted.
        before_delete;
        /// Transform the record after a successful delete.
        after_delete;
    }

    /// Whether any hook is set.
    pub fn has_hooks(&self) -> bool {
        self.slots().into_iter().any(Option::is_some)
    }

    pub(crate) fn before(
        &self,
        kind: DmlKind,
        record: Record,
        session: &mut dyn Session,
    ) -> OrmResult<Record> {
        let hook = match kind {
            DmlKind::Insert => &self.before_insert,
            DmlKind::Update => &self.before_update,
            DmlKind::Delete => &self.before_delete,
        };
        apply(hook, record, session)
    }

    pub(crate) fn after(
        &self,
        kind: DmlKind,
        record: Record,
        session: &mut dyn Session,
    ) -> OrmResult<Record> {
        let hook = match kind {
            DmlKind::Insert => &self.after_insert,
            DmlKind::Update => &self.after_update,
            DmlKind::Delete => &self.after_delete,
        };
        apply(hook, record, session)
    }

    fn slots(&self) -> [&Option<Hook>; 6] {
        [
            &self.before_insert,
            &self.after_insert,
            &self.before_update,
            &self.after_update,
            &self.before_delete,
            &self.after_delete,
        ]
    }
}

fn apply(hook: &Option<Hook>, record: Record, session: &mut dyn Session) -> OrmResult<Record> {
    match hook {
        Some(hook) => hook(record, session),
        None => Ok(record),
    }
}

impl fmt::Debug for ManagerHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerHooks")
            .field("before_insert", &self.before_insert.is_some())
            .field("after_insert", &self.after_insert.is_some())
            .field("before_update", &self.before_update.is_some())
            .field("after_update", &self.after_update.is_some())
            .field("before_delete", &self.before_delete.is_some())
            .field("after_delete", &self.after_delete.is_some())
            .finish()
    }
}
