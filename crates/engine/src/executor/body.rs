use std::sync::Arc;

use async_trait::async_trait;
use courier_api::HttpRequest;
use tracing::debug;

use super::{CallContext, DispatchOutput, VerbExecutor, effective_url, send};
use crate::{DispatchError, classify::RequestAssembly, strategy::BodyStrategyRef};

/// POST, PUT, PATCH and DELETE: fields and files are encoded into a body.
///
/// The strategy comes from the call context. A call carrying files under the
/// simple JSON strategy switches to multipart for that call only.
pub struct BodyExecutor;

#[async_trait]
impl VerbExecutor for BodyExecutor {
    async fn execute(
        &self,
        call: CallContext<'_>,
        assembly: &mut RequestAssembly,
    ) -> Result<DispatchOutput, DispatchError> {
        let url = effective_url(call.method, call.url_template, assembly)?;

        let file_count = assembly.file_count();
        let strategy = if file_count > 0 && call.strategy.is_simple() {
            debug!(method = call.method, files = file_count, "files present, using multipart");
            call.strategies.strategy_for(&BodyStrategyRef::multipart())?
        } else if let Some(instance) = call.strategy_instance {
            Arc::clone(instance)
        } else {
            call.strategies.strategy_for(&call.strategy)?
        };

        let body = strategy
            .handle(&assembly.fields, &assembly.files)
            .map_err(|error| match error {
                DispatchError::EmptyBody { .. } => DispatchError::empty_body(call.method),
                other => other,
            })?
            .ok_or_else(|| DispatchError::empty_body(call.method))?;
        let body = match &assembly.sinks.progress {
            Some(listener) => body.with_progress(Arc::clone(listener)),
            None => body,
        };

        let request = HttpRequest::new(call.verb, url)
            .with_headers(std::mem::take(&mut assembly.headers))
            .with_body(body);
        send(call.client, request, assembly.sinks.callback.clone()).await
    }
}
