//! [`Executor`] over the MySQL protocol.
//!
//! Statements run on long-lived sessions: a call checks out an idle session,
//! or opens one, and returns it afterwards. A single-threaded caller such as
//! the benchmark engine therefore times every repetition on the same
//! connection, and a statement and the `SHOW WARNINGS` that follows it
//! always share a session.

use std::fmt;
use std::str::FromStr;

use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Value};
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::error::{ExecuteError, ExecuteResult};
use super::executor::{Executor, Explained};
use super::hints::Hints;
use super::result::{Row, Rows};
use super::warning::Warning;

/// Where to connect: `user[:password]@host[:port]/database`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MysqlTarget {
    pub user: String,
    pub password: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl FromStr for MysqlTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (credentials, address) = s
            .rsplit_once('@')
            .ok_or_else(|| format!("missing '@' in target '{}'", s))?;
        let (user, password) = match credentials.split_once(':') {
            Some((user, password)) => (user, Some(password.to_string())),
            None => (credentials, None),
        };
        let (host_port, database) = address
            .split_once('/')
            .ok_or_else(|| format!("missing '/database' in target '{}'", s))?;
        let (host, port) = match host_port.rsplit_once(':') {
            Some((host, port)) => (
                host,
                port.parse::<u16>()
                    .map_err(|e| format!("invalid port '{}': {}", port, e))?,
            ),
            None => (host_port, 4000),
        };
        if user.is_empty() || host.is_empty() || database.is_empty() {
            return Err(format!("incomplete target '{}'", s));
        }
        Ok(Self {
            user: user.to_string(),
            password,
            host: host.to_string(),
            port,
            database: database.to_string(),
        })
    }
}

impl fmt::Display for MysqlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

/// Executor holding a stack of idle sessions to one target.
pub struct MysqlClient {
    target: MysqlTarget,
    idle: Mutex<Vec<Conn>>,
}

impl MysqlClient {
    /// No connection is opened until the first statement.
    pub fn new(target: MysqlTarget) -> Self {
        Self {
            target,
            idle: Mutex::new(Vec::new()),
        }
    }

    pub fn target(&self) -> &MysqlTarget {
        &self.target
    }

    fn connect(&self) -> mysql::Result<Conn> {
        debug!(target_db = %self.target, "opening session");
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(self.target.host.clone()))
            .tcp_port(self.target.port)
            .user(Some(self.target.user.clone()))
            .pass(self.target.password.clone())
            .db_name(Some(self.target.database.clone()));
        Conn::new(opts)
    }

    /// Run `f` on an idle session. Sessions that hit anything but a
    /// statement error are dropped; the next call reconnects.
    fn with_session<T>(&self, f: impl FnOnce(&mut Conn) -> mysql::Result<T>) -> ExecuteResult<T> {
        let idle = self.idle.lock().pop();
        let mut conn = match idle {
            Some(conn) => conn,
            None => self.connect().map_err(execute_error)?,
        };
        let result = f(&mut conn);
        if matches!(result, Ok(_) | Err(mysql::Error::MySqlError(_))) {
            self.idle.lock().push(conn);
        }
        result.map_err(execute_error)
    }

    fn explain_with(&self, prefix: &str, sql: &str) -> ExecuteResult<Explained> {
        let (rows, warnings) = self.with_session(|conn| {
            let rows = result_set(conn, &format!("{} {}", prefix, statement(sql)))?;
            let warnings = result_set(conn, "SHOW WARNINGS")?;
            Ok((rows, warnings))
        })?;
        let warnings = warnings
            .iter()
            .map(Warning::from_row)
            .collect::<ExecuteResult<Vec<_>>>()?;
        Ok(Explained { rows, warnings })
    }
}

impl fmt::Debug for MysqlClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlClient")
            .field("target", &self.target)
            .field("idle", &self.idle.lock().len())
            .finish()
    }
}

impl Executor for MysqlClient {
    fn query(&self, sql: &str) -> ExecuteResult<Rows> {
        trace!(target_db = %self.target, sql, "query");
        self.with_session(|conn| result_set(conn, statement(sql)))
    }

    /// Also runs multi-statement scripts; the count is the last statement's.
    fn exec(&self, sql: &str) -> ExecuteResult<u64> {
        trace!(target_db = %self.target, sql, "exec");
        self.with_session(|conn| {
            conn.query_drop(statement(sql))?;
            Ok(conn.affected_rows())
        })
    }

    fn get_hints(&self, sql: &str) -> ExecuteResult<Hints> {
        let rows = self.query(&format!("EXPLAIN FORMAT = 'hint' {}", statement(sql)))?;
        match (rows.len(), rows.columns.len()) {
            (1, 1) => Ok(Hints::parse(rows.cell(0, 0).unwrap_or_default())),
            _ => Err(ExecuteError::MalformedOutput(format!(
                "unexpected hint explanation: {:?}",
                rows
            ))),
        }
    }

    fn explain(&self, sql: &str) -> ExecuteResult<Explained> {
        self.explain_with("EXPLAIN", sql)
    }

    fn explain_analyze(&self, sql: &str) -> ExecuteResult<Explained> {
        self.explain_with("EXPLAIN ANALYZE", sql)
    }
}

/// First result set of `sql` as text cells.
fn result_set(conn: &mut Conn, sql: &str) -> mysql::Result<Rows> {
    let mut result = conn.query_iter(sql)?;
    let columns = result
        .columns()
        .as_ref()
        .iter()
        .map(|column| column.name_str().into_owned())
        .collect();
    let mut rows = Rows::new(columns);
    for row in result.by_ref() {
        let row = row?;
        rows.push((0..row.len()).map(|i| row.as_ref(i).and_then(cell)).collect::<Row>());
    }
    Ok(rows)
}

/// The text protocol sends every non-NULL value as bytes.
fn cell(value: &Value) -> Option<String> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        other => Some(other.as_sql(true)),
    }
}

fn statement(sql: &str) -> &str {
    sql.trim().trim_end_matches(';').trim_end()
}

fn execute_error(err: mysql::Error) -> ExecuteError {
    match err {
        mysql::Error::MySqlError(e) => ExecuteError::server(e.code, e.message),
        mysql::Error::IoError(e) => ExecuteError::Io(e),
        mysql::Error::DriverError(e) => ExecuteError::Connection(e.to_string()),
        other => ExecuteError::MalformedOutput(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use mysql::MySqlError;

    use super::*;

    #[test]
    fn test_parse_target() {
        let target: MysqlTarget = "root:secret@127.0.0.1:4000/imdb".parse().unwrap();
        assert_eq!(target.user, "root");
        assert_eq!(target.password.as_deref(), Some("secret"));
        assert_eq!(target.port, 4000);
        assert_eq!(target.database, "imdb");
        assert_eq!(target.to_string(), "root@127.0.0.1:4000/imdb");

        let default_port: MysqlTarget = "root@tidb/test".parse().unwrap();
        assert_eq!(default_port.port, 4000);
        assert!(default_port.password.is_none());

        assert!("root@host:abc/db".parse::<MysqlTarget>().is_err());
        assert!("host/db".parse::<MysqlTarget>().is_err());
    }

    #[test]
    fn test_error_mapping() {
        let server = |code: u16, message: &str| {
            mysql::Error::MySqlError(MySqlError {
                state: "HY000".to_string(),
                message: message.to_string(),
                code,
            })
        };
        assert!(execute_error(server(1105, "The parameter of nth_plan() is out of range")).is_plan_out_of_range());
        assert!(execute_error(server(1146, "Table 'test.t' doesn't exist")).is_server());
        assert!(execute_error(server(2013, "Lost connection to MySQL server")).is_transient());

        let refused = mysql::Error::IoError(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"));
        let err = execute_error(refused);
        assert!(matches!(err, ExecuteError::Io(_)));
        assert!(err.is_transient());
        assert!(!err.is_server());
    }

    #[test]
    fn test_text_cells() {
        assert_eq!(cell(&Value::NULL), None);
        assert_eq!(cell(&Value::Bytes("└─IndexScan_5".as_bytes().to_vec())).as_deref(), Some("└─IndexScan_5"));
        assert_eq!(cell(&Value::Int(-3)).as_deref(), Some("-3"));
    }

    #[test]
    fn test_statement_strips_terminator() {
        assert_eq!(statement("  SELECT 1 ;; \n"), "SELECT 1");
    }

    #[test]
    fn test_new_client_is_lazy() {
        let client = MysqlClient::new("root@127.0.0.1:1/none".parse().unwrap());
        assert!(format!("{:?}", client).contains("idle: 0"));
    }
}
