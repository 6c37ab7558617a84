//! Pure functions over ledger snapshots: querying, month navigation, aggregation, and chat
//! extraction. Nothing in here performs I/O.

pub mod aggregate;
pub mod context;
pub mod extract;
pub mod months;
pub mod query;

pub use aggregate::{ledger_totals, monthly_report, monthly_totals, LedgerTotals, MonthlyReport};
pub use context::build_context;
pub use extract::{Extraction, Intent, MissingField};
pub use months::{month_index, rows_in_month, MonthKey};
pub use query::LedgerQuery;
