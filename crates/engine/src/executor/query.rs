use async_trait::async_trait;
use courier_api::HttpRequest;
use courier_util::{append_query, build_query_string};

use super::{CallContext, DispatchOutput, VerbExecutor, effective_url, send};
use crate::{DispatchError, classify::RequestAssembly};

/// GET and HEAD: fields travel in the query string, never in a body.
pub struct QueryExecutor;

#[async_trait]
impl VerbExecutor for QueryExecutor {
    async fn execute(
        &self,
        call: CallContext<'_>,
        assembly: &mut RequestAssembly,
    ) -> Result<DispatchOutput, DispatchError> {
        let url = effective_url(call.method, call.url_template, assembly)?;
        let file_count = assembly.file_count();
        if file_count > 0 {
            let message = format!("{} requests cannot upload files; {} file(s) ignored", call.verb, file_count);
            assembly.warn(call.method, message);
        }
        if assembly.sinks.progress.is_some() {
            let message = format!("{} requests have no body; progress listener ignored", call.verb);
            assembly.warn(call.method, message);
        }

        let url = append_query(&url, &build_query_string(&assembly.fields));
        let request = HttpRequest::new(call.verb, url).with_headers(std::mem::take(&mut assembly.headers));
        send(call.client, request, assembly.sinks.callback.clone()).await
    }
}
