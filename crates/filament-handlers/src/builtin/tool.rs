use futures::future::BoxFuture;

use filament_core::error::{FilamentError, Result};
use filament_core::traits::NodeHandler;
use filament_core::types::Record;

use super::str_param;

/// Tool node with `search` and `code` sub-modes.
///
/// Both sub-modes return placeholder results: no real search backend is
/// queried and no code is executed.
pub struct ToolHandler;

impl NodeHandler for ToolHandler {
    fn kind(&self) -> &str {
        "tool"
    }

    fn execute(&self, inputs: &Record, parameters: &Record) -> BoxFuture<'_, Result<Record>> {
        let inputs = inputs.clone();
        let parameters = parameters.clone();
        Box::pin(async move {
            let tool_type = str_param(&parameters, "tool_type").unwrap_or("search");
            let mut outputs = Record::new();

            match tool_type {
                "search" => {
                    let query = inputs
                        .get("query")
                        .and_then(|v| v.as_str())
                        .unwrap_or("");
                    outputs.insert(
                        "results".into(),
                        serde_json::json!([
                            {
                                "title": format!("Result 1 for '{}'", query),
                                "snippet": "Placeholder search result.",
                            },
                            {
                                "title": format!("Result 2 for '{}'", query),
                                "snippet": "Placeholder search result.",
                            },
                        ]),
                    );
                }
                "code" => {
                    let code = inputs.get("code").and_then(|v| v.as_str()).unwrap_or("");
                    outputs.insert(
                        "result".into(),
                        serde_json::json!(format!(
                            "Execution skipped ({} bytes of code); sandboxed execution is not available",
                            code.len()
                        )),
                    );
                }
                other => {
                    return Err(FilamentError::InvalidParameter {
                        parameter: "tool_type".into(),
                        message: format!("unknown tool type '{}'", other),
                    });
                }
            }
            Ok(outputs)
        })
    }
}
