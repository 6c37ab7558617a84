//! The `chat` command. A message that asks to add a transaction is parsed into a ledger row; any
//! other message is answered by the completion service, given a summary of the ledger.

use crate::api::{Completion, CompletionRequest, Ledger};
use crate::args::ChatArgs;
use crate::commands::{open_ledger, read_rows, Out};
use crate::engine::context::SYSTEM_INSTRUCTION;
use crate::engine::extract::missing_fields_prompt;
use crate::engine::{build_context, Extraction, Intent, MissingField};
use crate::error::{ErrorType, IntoResult};
use crate::model::TransactionRow;
use crate::{Config, Mode, Result};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

const ADD_FAILED: &str =
    "Sorry, I couldn't add the transaction. Please try again or add it manually.";
const CHAT_FAILED: &str = "Failed to process chat message";

/// What happened to a chat message. The reply text itself is the `Out` message.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChatOutcome {
    /// The message asked to add a transaction but some fields could not be found. Nothing was
    /// written.
    MissingFields { missing: Vec<MissingField> },
    /// The row was appended to the ledger.
    Added { row: TransactionRow },
    /// The row was complete but could not be written.
    AddFailed { row: TransactionRow },
    /// The completion service answered the message.
    Answered,
}

/// Handles a chat message.
///
/// # Errors
/// - The completion service cannot be reached or fails: `Failed to process chat message`, tagged
///   as a completion error. Failing to write an extracted row is not an error; the reply says so.
pub async fn chat(config: Config, mode: Mode, args: ChatArgs) -> Result<Out<ChatOutcome>> {
    let mut ledger = open_ledger(&config, mode).await?;
    let intent = Intent::of(&args.message);
    debug!("Chat intent is {intent:?}");
    match intent {
        Intent::AddTransaction => add_from_message(ledger.as_mut(), &args.message).await,
        Intent::Query => {
            let completion = crate::api::completion(&config, mode).or_else(|e| {
                error!("Unable to create the completion client: {e:#}");
                Err(anyhow!(CHAT_FAILED)).pub_result(ErrorType::Completion)
            })?;
            answer(ledger.as_mut(), completion.as_ref(), &args.message).await
        }
    }
}

async fn add_from_message(
    ledger: &mut (dyn Ledger + Send),
    message: &str,
) -> Result<Out<ChatOutcome>> {
    let extraction = Extraction::from_message(message);
    debug!("{extraction:?}");
    let missing = extraction.missing();
    if !missing.is_empty() {
        return Ok(Out::new(
            missing_fields_prompt(&missing),
            ChatOutcome::MissingFields { missing },
        ));
    }

    let row = extraction.to_row()?;
    match ledger.append(&row).await {
        Ok(()) => Ok(Out::new(
            extraction.confirmation(),
            ChatOutcome::Added { row },
        )),
        Err(e) => {
            error!("Error adding the chat transaction: {e:#}");
            Ok(Out::new(ADD_FAILED, ChatOutcome::AddFailed { row }))
        }
    }
}

async fn answer(
    ledger: &mut (dyn Ledger + Send),
    completion: &(dyn Completion + Send + Sync),
    message: &str,
) -> Result<Out<ChatOutcome>> {
    let rows = read_rows(ledger).await;
    let request = CompletionRequest {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        context: build_context(&rows),
        message: message.to_string(),
    };
    match completion.complete(&request).await {
        Ok(reply) => Ok(Out::new(reply, ChatOutcome::Answered)),
        Err(e) => {
            error!("Chat error: {e:#}");
            Err(anyhow!(CHAT_FAILED)).pub_result(ErrorType::Completion)
        }
    }
}
