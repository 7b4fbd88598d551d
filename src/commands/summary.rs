//! Accumulated-summary commands.

use serde_json::Value;

use crate::context::PosContext;
use crate::summary;

pub async fn summary_historical(ctx: &PosContext, _arg0: Option<Value>) -> Result<Value, String> {
    let summary = summary::load_historical_summary(ctx)
        .await
        .map_err(|e| e.to_string())?;
    serde_json::to_value(summary).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::MockBackend;
    use crate::config::PosConfig;
    use crate::events::NullSink;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_no_data_marks_summary_empty() {
        let backend = MockBackend::new();
        backend.script_historical_no_data();
        let ctx = PosContext::new(
            PosConfig::default(),
            Arc::new(backend),
            Arc::new(NullSink),
        );

        let v = summary_historical(&ctx, None).await.unwrap();
        assert_eq!(v["empty"], true);
        assert_eq!(v["acumuladoTotal"], 0.0);
    }
}
