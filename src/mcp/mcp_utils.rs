use crate::commands::Out;
use crate::error::error_type;
use rmcp::model::{CallToolResult, Content};
use rmcp::ErrorData;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{error, warn};

pub(super) fn to_content<T>(out: Out<T>) -> Vec<Content>
where
    T: Debug + Clone + Serialize,
{
    let mut content = vec![Content::text(out.message())];
    if let Some(object) = out.structure() {
        match Content::json(object) {
            Ok(json) => content.push(json),
            Err(e) => error!("Unable to serialize JSON output: {e}"),
        };
    }
    content
}

/// Converts a command result into a tool result. Command errors become tool errors, prefixed with
/// their `ErrorType` when they have one, e.g. `validation: Invalid date format. Use dd/mm/yyyy`.
pub(super) fn tool_result<T>(result: crate::Result<Out<T>>) -> Result<CallToolResult, ErrorData>
where
    T: Debug + Clone + Serialize,
{
    Ok(match result {
        Ok(out) => CallToolResult::success(to_content(out)),
        Err(e) => {
            warn!("MCP tool failed: {e:#}");
            let text = match error_type(&e) {
                Some(t) => format!("{t}: {e}"),
                None => e.to_string(),
            };
            CallToolResult::error(vec![Content::text(text)])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorType, IntoResult};
    use anyhow::anyhow;

    #[test]
    fn test_tool_result_error_is_tagged() {
        let result: crate::Result<Out<()>> =
            Err(anyhow!("Failed to add entry")).pub_result(ErrorType::Store);
        let tool = tool_result(result).unwrap();
        assert_eq!(tool.is_error, Some(true));
        assert_eq!(
            tool.content[0].as_text().unwrap().text,
            "store: Failed to add entry"
        );
    }

    #[test]
    fn test_tool_result_success_has_json() {
        let tool = tool_result(Ok(Out::new("two", vec![1, 2]))).unwrap();
        assert_eq!(tool.is_error, Some(false));
        assert_eq!(tool.content.len(), 2);
    }
}
