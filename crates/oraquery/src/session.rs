//! Session abstraction and the scoped unit of work.
//!
//! A [`Session`] is one database connection with an implicit open transaction,
//! which is how Oracle behaves: every statement after a commit or rollback
//! starts a new one. A [`SessionProvider`] hands out sessions, and a
//! [`UnitOfWork`] guarantees that an acquired session is rolled back unless
//! committed and is always closed.
//!
//! # Example
//!
//! ```
//! use oraquery::mock::MockProvider;
//! use oraquery::session::{scope, Session};
//! use oraquery::{BindParams, Row};
//!
//! let provider = MockProvider::new();
//! provider.push_rows(vec![Row::new().with("N", 1)]);
//!
//! let rows = scope(&provider, None, |s| s.query("SELECT 1 AS n FROM DUAL", &BindParams::new()))?;
//! assert_eq!(rows.len(), 1);
//! assert_eq!(provider.commits(), 1);
//! assert_eq!(provider.closes(), 1);
//! # Ok::<(), oraquery::OrmError>(())
//! ```

use crate::error::OrmResult;
use crate::row::Row;
use crate::value::BindParams;

/// One database session: statement execution plus transaction control.
///
/// All methods take `&mut self`; a session is never shared between threads
/// while a statement is running.
pub trait Session {
    /// Execute a statement and return the number of affected rows.
    fn execute(&mut self, sql: &str, params: &BindParams) -> OrmResult<u64>;

    /// Execute a query and return all rows.
    fn query(&mut self, sql: &str, params: &BindParams) -> OrmResult<Vec<Row>>;

    /// Execute a query and return the first row, if any.
    ///
    /// Extra rows are ignored. The default implementation calls
    /// [`Session::query`].
    fn query_opt(&mut self, sql: &str, params: &BindParams) -> OrmResult<Option<Row>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// Commit the current transaction.
    fn commit(&mut self) -> OrmResult<()>;

    /// Roll back the current transaction.
    fn rollback(&mut self) -> OrmResult<()>;

    /// Release the session. Called exactly once by [`UnitOfWork`].
    fn close(&mut self) -> OrmResult<()> {
        Ok(())
    }
}

impl<S: Session + ?Sized> Session for &mut S {
    fn execute(&mut self, sql: &str, params: &BindParams) -> OrmResult<u64> {
        (**self).execute(sql, params)
    }

    fn query(&mut self, sql: &str, params: &BindParams) -> OrmResult<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn query_opt(&mut self, sql: &str, params: &BindParams) -> OrmResult<Option<Row>> {
        (**self).query_opt(sql, params)
    }

    fn commit(&mut self) -> OrmResult<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> OrmResult<()> {
        (**self).rollback()
    }

    fn close(&mut self) -> OrmResult<()> {
        (**self).close()
    }
}

impl<S: Session + ?Sized> Session for Box<S> {
    fn execute(&mut self, sql: &str, params: &BindParams) -> OrmResult<u64> {
        (**self).execute(sql, params)
    }

    fn query(&mut self, sql: &str, params: &BindParams) -> OrmResult<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn query_opt(&mut self, sql: &str, params: &BindParams) -> OrmResult<Option<Row>> {
        (**self).query_opt(sql, params)
    }

    fn commit(&mut self) -> OrmResult<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> OrmResult<()> {
        (**self).rollback()
    }

    fn close(&mut self) -> OrmResult<()> {
        (**self).close()
    }
}

/// Source of new sessions.
///
/// Any `Fn() -> OrmResult<S>` closure is a provider, so connection setup
/// (credentials, pools, DSNs) stays with the caller:
///
/// ```ignore
/// let provider = || Ok(oracle::Connection::connect("scott", "tiger", "//db/XEPDB1")?);
/// let manager = Manager::new(provider, model, statements);
/// ```
pub trait SessionProvider {
    /// Session type handed out by this provider.
    type Session: Session;

    /// Acquire a new session.
    fn session(&self) -> OrmResult<Self::Session>;
}

impl<F, S> SessionProvider for F
where
    F: Fn() -> OrmResult<S>,
    S: Session,
{
    type Session = S;

    fn session(&self) -> OrmResult<S> {
        self()
    }
}

/// Scoped acquisition of one session.
///
/// Dropping an uncommitted unit of work rolls it back. The session is closed on
/// every exit path. Failures during that cleanup are logged, never raised.
pub struct UnitOfWork<S: Session> {
    session: S,
    finished: bool,
}

impl<S: Session> UnitOfWork<S> {
    /// Acquire a session from `provider`.
    pub fn begin<P>(provider: &P) -> OrmResult<Self>
    where
        P: SessionProvider<Session = S> + ?Sized,
    {
        let session = provider.session()?;
        tracing::debug!(target: "oraquery.session", "unit of work begin");
        Ok(Self {
            session,
            finished: false,
        })
    }

    /// The session owned by this unit of work.
    pub fn session(&mut self) -> &mut S {
        &mut self.session
    }

    /// Commit, then release the session.
    ///
    /// A failed commit is rolled back on drop like any other error.
    pub fn commit(mut self) -> OrmResult<()> {
        self.session.commit()?;
        self.finished = true;
        tracing::debug!(target: "oraquery.session", "unit of work commit");
        Ok(())
    }

    /// Roll back explicitly, then release the session.
    pub fn rollback(mut self) -> OrmResult<()> {
        self.finished = true;
        tracing::debug!(target: "oraquery.session", "unit of work rollback");
        self.session.rollback()
    }
}

impl<S: Session> Drop for UnitOfWork<S> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(target: "oraquery.session", "unit of work rollback");
            if let Err(err) = self.session.rollback() {
                tracing::warn!(target: "oraquery.session", error = %err, "rollback failed");
            }
        }
        if let Err(err) = self.session.close() {
            tracing::warn!(target: "oraquery.session", error = %err, "session close failed");
        }
        tracing::debug!(target: "oraquery.session", "unit of work closed");
    }
}

/// Run `f` inside a unit of work, or directly on a caller session.
///
/// - `session == None`: acquire a session from `provider`, commit when `f`
///   succeeds, roll back when it fails, always close. The error from `f` is
///   returned unchanged.
/// - `session == Some(..)`: run `f` on the caller's session with no commit,
///   rollback or close; the caller owns the transaction.
pub fn scope<P, T, F>(provider: &P, session: Option<&mut P::Session>, f: F) -> OrmResult<T>
where
    P: SessionProvider + ?Sized,
    F: FnOnce(&mut P::Session) -> OrmResult<T>,
{
    if let Some(session) = session {
        return f(session);
    }

    let mut uow = UnitOfWork::begin(provider)?;
    let value = f(uow.session())?;
    uow.commit()?;
    Ok(value)
}
