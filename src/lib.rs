//! Horoscope - plan-space testing for SQL query optimizers
//!
//! For each workload query, horoscope forces every plan the optimizer can
//! produce through `NTH_PLAN(n)` hints, times them against the plan the
//! optimizer picks on its own and checks that all of them return the same
//! result. A companion probe measures how far the engine's row estimates
//! are from the actual counts.
//!
//! # Example
//!
//! ```no_run
//! use horoscope::bench::{run_session, BenchOptions, BenchReport, Horoscope};
//! use horoscope::executor::MysqlClient;
//! use horoscope::workload::WorkloadLoader;
//!
//! let client = MysqlClient::new("root@127.0.0.1:4000/tpch".parse().unwrap());
//! let loader = WorkloadLoader::open("workload/tpch").unwrap();
//! let mut horo = Horoscope::new(client, loader);
//! let collection = run_session(&mut horo, &BenchOptions::default().round(5)).unwrap();
//! println!("{}", BenchReport::new(&collection).to_table());
//! ```

pub mod bench;
pub mod card;
pub mod executor;
pub mod explain;
pub mod metrics;
pub mod sql;
pub mod workload;

mod table;
