//! The `add` command: appends a row built from structured arguments.

use crate::args::AddArgs;
use crate::commands::{open_ledger, parse_date_arg, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::TransactionRow;
use crate::{Config, Mode, Result};
use anyhow::anyhow;
use tracing::error;

/// Appends a row to the ledger. The total is computed as credit minus debit, with a missing side
/// counting as zero.
///
/// # Errors
/// - The date is not shaped `dd/mm/yyyy`, or the remarks are empty: a validation error.
/// - The sheet cannot be written: `Failed to add entry`, tagged as a store error.
pub async fn add_entry(config: Config, mode: Mode, args: AddArgs) -> Result<Out<TransactionRow>> {
    let date = parse_date_arg(&args.date)?;
    let remarks = args.remarks.trim();
    if remarks.is_empty() {
        return validation_error("Remarks are required");
    }
    let row = TransactionRow::new(
        &date,
        remarks,
        args.debit.unwrap_or_default().trim(),
        args.credit.unwrap_or_default().trim(),
    );

    let mut ledger = open_ledger(&config, mode).await?;
    if let Err(e) = ledger.append(&row).await {
        error!("Error adding entry: {e:#}");
        return Err(anyhow!("Failed to add entry")).pub_result(ErrorType::Store);
    }
    Ok(Out::new(
        format!("Added {} {} (total {})", row.date(), row.remarks(), row.total()),
        row,
    ))
}

fn validation_error<T>(message: &str) -> Result<T> {
    Err(anyhow!("{message}")).pub_result(ErrorType::Validation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SEED_TAB;
    use crate::error::error_type;
    use crate::test::TestEnv;

    fn args(date: &str, debit: Option<&str>, credit: Option<&str>) -> AddArgs {
        AddArgs {
            date: date.to_string(),
            remarks: "Groceries".to_string(),
            debit: debit.map(str::to_string),
            credit: credit.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_add_entry_appends_row() {
        let env = TestEnv::new().await;
        let out = add_entry(env.config(), Mode::Testing, args("05/03/2024", Some("500"), None))
            .await
            .unwrap();
        let row = out.structure().unwrap();
        assert_eq!(row.total(), "-500");

        let state = env.get_state();
        let written = &state.rows_from(SEED_TAB, 3)[12];
        assert_eq!(written, &vec!["05/03/2024", "Groceries", "500", "", "-500"]);
    }

    #[tokio::test]
    async fn test_add_entry_credit_and_debit() {
        let env = TestEnv::new().await;
        let out = add_entry(
            env.config(),
            Mode::Testing,
            args("01/04/2024", Some("200"), Some("1000")),
        )
        .await
        .unwrap();
        assert_eq!(out.structure().unwrap().total(), "800");
    }

    #[tokio::test]
    async fn test_add_entry_bad_date() {
        let env = TestEnv::new().await;
        let e = add_entry(env.config(), Mode::Testing, args("2024-03-05", Some("1"), None))
            .await
            .unwrap_err();
        assert_eq!(e.to_string(), "Invalid date format. Use dd/mm/yyyy");
        assert_eq!(error_type(&e), Some(ErrorType::Validation));
        assert_eq!(env.get_state().rows_from(SEED_TAB, 3).len(), 12);
    }

    #[tokio::test]
    async fn test_add_entry_empty_remarks() {
        let env = TestEnv::new().await;
        let mut a = args("05/03/2024", Some("1"), None);
        a.remarks = "  ".to_string();
        let e = add_entry(env.config(), Mode::Testing, a).await.unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Validation));
    }

    #[tokio::test]
    async fn test_add_entry_write_failure() {
        let env = TestEnv::new().await;
        let mut state = env.get_state();
        state.fail_writes = true;
        env.set_state(state);
        let e = add_entry(env.config(), Mode::Testing, args("05/03/2024", Some("1"), None))
            .await
            .unwrap_err();
        assert_eq!(e.to_string(), "Failed to add entry");
        assert_eq!(error_type(&e), Some(ErrorType::Store));
    }
}
