use futures::future::BoxFuture;

use filament_core::error::Result;
use filament_core::traits::NodeHandler;
use filament_core::types::Record;

/// Terminal node: passes through whatever it received, unchanged.
pub struct OutputHandler;

impl NodeHandler for OutputHandler {
    fn kind(&self) -> &str {
        "output"
    }

    fn execute(&self, inputs: &Record, _parameters: &Record) -> BoxFuture<'_, Result<Record>> {
        let inputs = inputs.clone();
        Box::pin(async move { Ok(inputs) })
    }
}
