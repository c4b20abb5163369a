//! Executor payloads run inside the client container.
//!
//! The payload connects to the database, executes the mounted SQL file and
//! prints a single JSON document `{"columns": [...] | null, "rows": [...]}`.
//! On failure it prints `Error: <message>` to stderr and exits with status 1.
//!
//! When a batch list is mounted at [`BATCHES_MOUNT`] instead, the payload
//! executes every batch in order on one connection and prints
//! `{"batches": [{"ok": true}, {"ok": false, "error": "..."}]}`.
//!
//! How connection parameters reach the payload is up to the
//! [`PayloadStrategy`]: either written into the script text, or forwarded as
//! environment variables so the script itself stays constant.

use crate::config::{
    Settings, DATABASE_VAR, PASSWORD_VAR, PORT_VAR, SERVER_VAR, USER_VAR,
};

/// Where the SQL file is mounted inside the container.
pub const QUERY_MOUNT: &str = "/query.sql";

/// Where a JSON list of script batches is mounted inside the container.
pub const BATCHES_MOUNT: &str = "/batches.json";

/// Where the executor payload is mounted inside the container.
pub const EXECUTOR_MOUNT: &str = "/run_query.py";

const EXECUTOR_BODY: &str = r#"

def _cell(value):
    return None if value is None else str(value)


def _run_query(cursor):
    with open("/query.sql", "r", encoding="utf-8") as f:
        sql = f.read()

    cursor.execute(sql)

    if cursor.description:
        columns = [str(desc[0]) for desc in cursor.description]
        rows = [[_cell(v) for v in row] for row in cursor.fetchall()]
    else:
        columns = None
        rows = []

    print(json.dumps({"columns": columns, "rows": rows}))


def _run_batches(cursor):
    with open("/batches.json", "r", encoding="utf-8") as f:
        batches = json.load(f)

    statuses = []
    for batch in batches:
        try:
            cursor.execute(batch)
            if cursor.description:
                cursor.fetchall()
            statuses.append({"ok": True})
        except Exception as exc:
            statuses.append({"ok": False, "error": str(exc)})

    print(json.dumps({"batches": statuses}))


try:
    conn = pymssql.connect(
        server=SERVER,
        port=PORT,
        user=USER,
        password=PASSWORD,
        database=DATABASE,
        autocommit=True,
    )
    cursor = conn.cursor()

    if os.path.exists("/batches.json"):
        _run_batches(cursor)
    else:
        _run_query(cursor)

    cursor.close()
    conn.close()

except Exception as exc:
    print(f"Error: {exc}", file=sys.stderr)
    sys.exit(1)
"#;

const IMPORTS: &str = "import json\nimport os\nimport sys\n\nimport pymssql\n\n";

/// Produces the executor script and any variables it needs at runtime.
pub trait PayloadStrategy {
    /// Returns the executor program text.
    fn script(&self, settings: &Settings) -> String;

    /// Returns variables to forward into the container.
    fn env(&self, _settings: &Settings) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Writes connection parameters into the script as literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplatedPayload;

impl PayloadStrategy for TemplatedPayload {
    fn script(&self, settings: &Settings) -> String {
        let prelude = format!(
            "SERVER = {}\nPORT = {}\nUSER = {}\nPASSWORD = {}\nDATABASE = {}\n",
            py_str(&settings.server),
            settings.port,
            py_str(&settings.user),
            py_str(&settings.password),
            py_str(&settings.database),
        );
        format!("{IMPORTS}{prelude}{EXECUTOR_BODY}")
    }
}

/// Keeps the script constant and forwards parameters as variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvPayload;

impl PayloadStrategy for EnvPayload {
    fn script(&self, _settings: &Settings) -> String {
        let prelude = format!(
            "SERVER = os.environ[\"{SERVER_VAR}\"]\n\
             PORT = int(os.environ[\"{PORT_VAR}\"])\n\
             USER = os.environ[\"{USER_VAR}\"]\n\
             PASSWORD = os.environ[\"{PASSWORD_VAR}\"]\n\
             DATABASE = os.environ[\"{DATABASE_VAR}\"]\n"
        );
        format!("{IMPORTS}{prelude}{EXECUTOR_BODY}")
    }

    fn env(&self, settings: &Settings) -> Vec<(String, String)> {
        vec![
            (SERVER_VAR.to_string(), settings.server.clone()),
            (PORT_VAR.to_string(), settings.port.to_string()),
            (USER_VAR.to_string(), settings.user.clone()),
            (PASSWORD_VAR.to_string(), settings.password.clone()),
            (DATABASE_VAR.to_string(), settings.database.clone()),
        ]
    }
}

/// Selectable payload strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PayloadKind {
    /// Parameters forwarded as container environment variables.
    #[default]
    Env,
    /// Parameters written into the script text.
    Templated,
}

impl PayloadKind {
    /// Returns the strategy implementing this kind.
    pub fn strategy(self) -> Box<dyn PayloadStrategy> {
        match self {
            Self::Env => Box::new(EnvPayload),
            Self::Templated => Box::new(TemplatedPayload),
        }
    }
}

/// Quotes `s` as a Python string literal.
///
/// JSON string escapes are a subset of Python's.
fn py_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
