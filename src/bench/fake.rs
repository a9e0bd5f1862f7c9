//! Scripted engine for benchmark tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use parking_lot::Mutex;
use regex::Regex;

use crate::executor::{
    ExecuteError, ExecuteResult, Executor, Explained, Hints, QueryOutcome, Row, Rows, Warning, ERR_UNKNOWN,
};

static NTH_PLAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)nth_plan\((\d+)\)").expect("valid regex"));

const OUT_OF_RANGE: &str = "The parameter of nth_plan() is out of range";

/// Plan `0` is the optimizer's choice; indices past the last plan are out
/// of range.
pub(crate) struct FakeEngine {
    plans: Vec<&'static str>,
    results: HashMap<usize, QueryOutcome>,
    default_result: QueryOutcome,
    failing: BTreeSet<usize>,
    out_of_range_as_error: bool,
    transient_failures: Mutex<usize>,
    executed: Mutex<Vec<usize>>,
    pub explained: Mutex<Vec<usize>>,
}

impl FakeEngine {
    pub fn new(plans: Vec<&'static str>) -> Self {
        Self {
            plans,
            results: HashMap::new(),
            default_result: QueryOutcome::Rows(Rows::from_strings(["a"], vec![vec!["1"], vec!["2"], vec!["3"]])),
            failing: BTreeSet::new(),
            out_of_range_as_error: false,
            transient_failures: Mutex::new(0),
            executed: Mutex::new(Vec::new()),
            explained: Mutex::new(Vec::new()),
        }
    }

    pub fn with_result(mut self, plan: usize, result: QueryOutcome) -> Self {
        self.results.insert(plan, result);
        self
    }

    pub fn with_default_result(mut self, result: QueryOutcome) -> Self {
        self.default_result = result;
        self
    }

    pub fn failing(mut self, plan: usize) -> Self {
        self.failing.insert(plan);
        self
    }

    pub fn out_of_range_as_error(mut self) -> Self {
        self.out_of_range_as_error = true;
        self
    }

    pub fn transient_failures(self, count: usize) -> Self {
        *self.transient_failures.lock() = count;
        self
    }

    pub fn executed(&self) -> Vec<usize> {
        self.executed.lock().clone()
    }

    fn plan_of(sql: &str) -> usize {
        NTH_PLAN
            .captures(sql)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(0)
    }

    fn in_range(&self, plan: usize) -> bool {
        plan < self.plans.len()
    }

    fn execute(&self, sql: &str) -> ExecuteResult<QueryOutcome> {
        {
            let mut transient = self.transient_failures.lock();
            if *transient > 0 {
                *transient -= 1;
                return Err(ExecuteError::server(2013, "Lost connection to MySQL server during query"));
            }
        }
        let plan = Self::plan_of(sql);
        self.executed.lock().push(plan);
        if self.failing.contains(&plan) {
            return Err(ExecuteError::server(1105, format!("plan {} hit an internal error", plan)));
        }
        Ok(self.results.get(&plan).unwrap_or(&self.default_result).clone())
    }
}

impl Executor for FakeEngine {
    fn query(&self, sql: &str) -> ExecuteResult<Rows> {
        match self.execute(sql)? {
            QueryOutcome::Rows(rows) => Ok(rows),
            QueryOutcome::Affected(_) => Ok(Rows::default()),
        }
    }

    fn exec(&self, sql: &str) -> ExecuteResult<u64> {
        match self.execute(sql)? {
            QueryOutcome::Affected(n) => Ok(n),
            QueryOutcome::Rows(rows) => Ok(rows.len() as u64),
        }
    }

    fn get_hints(&self, sql: &str) -> ExecuteResult<Hints> {
        let plan = Self::plan_of(sql);
        Ok(Hints::parse(&format!("nth_plan({}), use_plan({})", plan, self.plans[plan.min(self.plans.len() - 1)])))
    }

    fn explain(&self, sql: &str) -> ExecuteResult<Explained> {
        let plan = Self::plan_of(sql);
        self.explained.lock().push(plan);
        let shown = if self.in_range(plan) { plan } else { 0 };
        let rows = Rows::from_strings(
            ["id", "estRows", "task", "access object", "operator info"],
            vec![vec![self.plans[shown], "10.00", "root", "table:t", "keep order:false"]],
        );
        let explained = Explained::new(rows);
        if self.in_range(plan) {
            return Ok(explained);
        }
        if self.out_of_range_as_error {
            return Err(ExecuteError::server(ERR_UNKNOWN, OUT_OF_RANGE));
        }
        Ok(explained.with_warning(Warning::new("Warning", ERR_UNKNOWN, OUT_OF_RANGE)))
    }

    fn explain_analyze(&self, sql: &str) -> ExecuteResult<Explained> {
        let plan = Self::plan_of(sql);
        let mut rows = Rows::new(["id", "estRows", "actRows", "operator info"].map(String::from).to_vec());
        let cells = |cells: [String; 4]| -> Row { cells.into_iter().map(Some).collect() };
        rows.push(cells(["TableReader_7".into(), "10.00".into(), "5".into(), "data:Selection_6".into()]));
        rows.push(cells([
            "└─Selection_6".into(),
            "10.00".into(),
            "5".into(),
            format!("eq(t.a, {})", plan),
        ]));
        rows.push(cells(["  └─TableFullScan_5".into(), "100.00".into(), "100".into(), "keep order:false".into()]));
        Ok(Explained::new(rows))
    }
}
