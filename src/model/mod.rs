//! Types that represent the core data model, such as `TransactionRow` and `Amount`.
mod amount;
pub mod date;
mod row;

pub use amount::{Amount, AmountError, RUPEE};
pub use date::LedgerDate;
pub use row::{
    TransactionRow, COLUMN_COUNT, CREDIT_IDX, DATE_IDX, DEBIT_IDX, REMARKS_IDX, TOTAL_IDX,
};
