//! End-to-end dispatch through a proxy backed by the in-memory transport.

use std::{
    any::Any,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use courier_api::{Callback, RawResponse, WebSocketListener};
use courier_types::{FilePart, ParamType, ReturnKind, ScalarKind, Verb};
use indexmap::IndexMap;

use crate::{
    Argument, DispatchError, DispatchOutput, Dispatcher, HandlerError, HttpInterface, InvocationEngine, JSON_UTF8,
    MethodDeclaration, ParamDeclaration, RequestParts, ResponseHandler, ServiceProxy, VerbMarker,
    test_support::{MockFactory, MockTransport, RecordingCallback},
};

const INT: ParamType = ParamType::Scalar(ScalarKind::Int);

struct Api {
    engine: InvocationEngine,
}

fn get(url: &str) -> VerbMarker {
    VerbMarker::get(url).client::<MockFactory>()
}

fn post(url: &str) -> VerbMarker {
    VerbMarker::post(url).client::<MockFactory>()
}

impl HttpInterface for Api {
    fn declarations() -> Vec<MethodDeclaration> {
        vec![
            MethodDeclaration::with_verb("list", get("http://h/u/{empty}")).returns(ReturnKind::Text),
            MethodDeclaration::with_verb("find", post("http://h/users"))
                .param(ParamDeclaration::new(INT).field("id"))
                .param(ParamDeclaration::new(ParamType::STRING).header("name"))
                .returns(ReturnKind::Text),
            MethodDeclaration::with_verb("fetch", get("http://h/a"))
                .param(ParamDeclaration::new(ParamType::STRING).url())
                .returns(ReturnKind::Text),
            MethodDeclaration::with_verb("nowhere", get("")).param(ParamDeclaration::new(ParamType::STRING).url()),
            MethodDeclaration::with_verb("upload", post("http://h/upload"))
                .param(ParamDeclaration::new(ParamType::STRING).field("note"))
                .param(ParamDeclaration::new(ParamType::File).field("doc"))
                .param(ParamDeclaration::new(ParamType::ProgressListener)),
            MethodDeclaration::with_verb("touch", VerbMarker::put("http://h/touch").client::<MockFactory>()),
            MethodDeclaration::with_verb("notify", post("http://h/notify"))
                .param(ParamDeclaration::new(INT).field("id"))
                .param(ParamDeclaration::new(ParamType::Callback))
                .param(ParamDeclaration::new(ParamType::Callback)),
            MethodDeclaration::with_verb("raw", get("http://h/raw")).returns(ReturnKind::RawResponse),
            MethodDeclaration::with_verb("count", get("http://h/count"))
                .param(ParamDeclaration::new(ParamType::ResponseHandler))
                .returns(ReturnKind::Custom),
            MethodDeclaration::with_verb("search", get("http://h/search?v=1"))
                .param(ParamDeclaration::new(ParamType::Map))
                .param(ParamDeclaration::new(ParamType::File).field("f")),
            MethodDeclaration::with_verb("stream", VerbMarker::websocket("").client::<MockFactory>())
                .param(ParamDeclaration::new(ParamType::STRING).url())
                .param(ParamDeclaration::new(ParamType::WebSocketListener))
                .returns(ReturnKind::WebSocket),
            MethodDeclaration::with_verb("stream_text", VerbMarker::websocket("ws://127.0.0.1:1/").client::<MockFactory>())
                .param(ParamDeclaration::new(ParamType::WebSocketListener))
                .returns(ReturnKind::Text),
            MethodDeclaration::new("hash_code").returns(ReturnKind::Text),
            MethodDeclaration::with_verb("attach", post("http://h/attach"))
                .param(ParamDeclaration::new(ParamType::STRING).field("title"))
                .param(ParamDeclaration::new(ParamType::FileList).field("docs")),
            MethodDeclaration::with_verb("peek", VerbMarker::head("http://h/peek").client::<MockFactory>())
                .param(ParamDeclaration::new(ParamType::STRING).field("id"))
                .param(ParamDeclaration::new(ParamType::ProgressListener)),
            MethodDeclaration::with_verb("amend", VerbMarker::patch("http://h/amend").client::<MockFactory>())
                .param(ParamDeclaration::new(ParamType::STRING).field("note")),
        ]
    }
}

impl ServiceProxy for Api {
    fn from_engine(engine: InvocationEngine) -> Self {
        Self { engine }
    }
}

fn setup() -> (Arc<Dispatcher>, Arc<MockTransport>, Arc<Api>) {
    let dispatcher = Dispatcher::new();
    let mock = MockTransport::new();
    assert!(dispatcher.install_client::<MockFactory>(mock.clone()));
    let api = dispatcher.get_instance::<Api>().unwrap();
    (dispatcher, mock, api)
}

struct BodyLength;

#[async_trait]
impl ResponseHandler for BodyLength {
    async fn handle(&self, response: &mut RawResponse) -> Result<Box<dyn Any + Send>, HandlerError> {
        Ok(Box::new(response.text().await?.len()))
    }
}

struct Silent;

impl WebSocketListener for Silent {}

#[tokio::test]
async fn unresolved_placeholder_becomes_empty() {
    let (_, mock, api) = setup();
    mock.respond(200, "[]");
    let text = api.engine.invoke("list", vec![]).await.unwrap().into_text();
    assert_eq!(text.as_deref(), Some("[]"));

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].verb, Verb::Get);
    assert_eq!(requests[0].url, "http://h/u/");
    assert!(requests[0].content_type.is_none());
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn field_and_header_reach_the_request() {
    let (_, mock, api) = setup();
    mock.respond(200, "found");
    let text = api.engine.invoke("find", vec![7.into(), "bob".into()]).await.unwrap();
    assert_eq!(text.into_text().as_deref(), Some("found"));

    let request = &mock.requests()[0];
    assert_eq!(request.verb, Verb::Post);
    assert_eq!(request.headers.get("name").map(String::as_str), Some("bob"));
    assert_eq!(request.content_type.as_deref(), Some(JSON_UTF8));
    assert_eq!(request.body_text(), r#"{"id":7}"#);
    assert_eq!(mock.releases(), 1);
}

#[tokio::test]
async fn url_argument_overrides_the_template() {
    let (_, mock, api) = setup();
    api.engine.invoke("fetch", vec!["http://h/b".into()]).await.unwrap();
    api.engine.invoke("fetch", vec![Argument::Null]).await.unwrap();
    let urls: Vec<_> = mock.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(urls, vec!["http://h/b", "http://h/a"]);
}

#[tokio::test]
async fn blank_url_fails_before_sending() {
    let (_, mock, api) = setup();
    let err = api.engine.invoke("nowhere", vec![Argument::Null]).await.unwrap_err();
    assert!(matches!(err, DispatchError::MissingUrl { .. }));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn files_switch_the_call_to_multipart() {
    let (_, mock, api) = setup();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let progress = Argument::progress(move |total: u64, sent: u64| sink.lock().unwrap().push((total, sent)));

    let returned = api
        .engine
        .invoke(
            "upload",
            vec!["hi".into(), FilePart::from_bytes("a.txt", "hello").into(), progress.clone()],
        )
        .await
        .unwrap();
    assert!(returned.is_nothing());

    let with_file = &mock.requests()[0];
    let content_type = with_file.content_type.clone().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    let body = with_file.body_text();
    assert!(body.contains("name=\"doc\"; filename=\"a.txt\"\r\nContent-Type: text/plain"));
    assert!(body.contains("name=\"note\"; filename=\"\""));
    assert!(with_file.has_progress);
    let total = with_file.body.len() as u64;
    assert_eq!(seen.lock().unwrap().last(), Some(&(total, total)));

    api.engine
        .invoke("upload", vec!["hi".into(), Argument::Null, progress])
        .await
        .unwrap();
    let without_file = &mock.requests()[1];
    assert_eq!(without_file.content_type.as_deref(), Some(JSON_UTF8));
    assert_eq!(without_file.body_text(), r#"{"note":"hi"}"#);
    assert_eq!(mock.releases(), 2);
}

#[tokio::test]
async fn empty_file_list_keeps_the_simple_strategy() {
    let (_, mock, api) = setup();
    api.engine
        .invoke("attach", vec!["t".into(), Argument::Files(vec![])])
        .await
        .unwrap();
    api.engine
        .invoke(
            "attach",
            vec!["t".into(), Argument::Files(vec![FilePart::from_bytes("a.txt", "a")])],
        )
        .await
        .unwrap();

    let recorded = mock.requests();
    assert_eq!(recorded[0].content_type.as_deref(), Some(JSON_UTF8));
    assert_eq!(recorded[0].body_text(), r#"{"title":"t"}"#);
    assert!(recorded[1].content_type.as_deref().unwrap().starts_with("multipart/form-data"));
}

#[tokio::test]
async fn empty_body_is_rejected_before_sending() {
    let (_, mock, api) = setup();
    let err = api.engine.invoke("touch", vec![]).await.unwrap_err();
    assert!(matches!(err, DispatchError::EmptyBody { .. }));
    assert_eq!(err.to_string(), "request body cannot be empty (touch)");
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn last_callback_wins_and_call_is_enqueued() {
    let (_, mock, api) = setup();
    mock.respond(202, "queued");
    let first = Arc::new(RecordingCallback::default());
    let second = Arc::new(RecordingCallback::default());

    let invocation = api
        .engine
        .invoke_detailed(
            "notify",
            vec![7.into(), Argument::Callback(first.clone()), Argument::Callback(second.clone())],
        )
        .await
        .unwrap();
    assert!(invocation.returned.is_nothing());
    assert_eq!(invocation.warnings.len(), 1);

    assert_eq!(second.wait_for(1).await, vec!["202 queued".to_string()]);
    assert!(first.events().is_empty());
}

#[tokio::test]
async fn text_on_failure_status_reports_the_status_message() {
    let (_, mock, api) = setup();
    mock.respond(404, "missing");
    let err = api.engine.invoke("find", vec![1.into(), "x".into()]).await.unwrap_err();
    match err {
        DispatchError::Status { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(mock.releases(), 1);
}

#[tokio::test]
async fn unit_closes_the_response() {
    let (_, mock, api) = setup();
    let returned = api.engine.invoke("search", vec![Argument::Null, Argument::Null]).await.unwrap();
    assert!(returned.is_nothing());
    assert_eq!(mock.releases(), 1);
}

#[tokio::test]
async fn raw_response_is_handed_back_open() {
    let (_, mock, api) = setup();
    mock.respond(200, "raw");
    let mut response = api.engine.invoke("raw", vec![]).await.unwrap().into_response().unwrap();
    assert!(!response.is_closed());
    assert_eq!(mock.releases(), 0);
    assert_eq!(response.text().await.unwrap(), "raw");
    drop(response);
    assert_eq!(mock.releases(), 1);
}

#[tokio::test]
async fn custom_return_goes_through_the_handler() {
    let (_, mock, api) = setup();
    mock.respond(200, "hello");
    let returned = api
        .engine
        .invoke("count", vec![Argument::response_handler(BodyLength)])
        .await
        .unwrap();
    assert_eq!(returned.downcast::<usize>(), Some(5));
    assert_eq!(mock.releases(), 1);

    let err = api.engine.invoke("count", vec![Argument::Null]).await.unwrap_err();
    assert!(matches!(err, DispatchError::MissingResponseHandler { .. }));
    assert_eq!(mock.requests().len(), 1);
}

#[tokio::test]
async fn query_verbs_warn_about_files_and_append_fields() {
    let (_, mock, api) = setup();
    let mut map = IndexMap::new();
    map.insert("q".to_string(), Argument::from("rust lang"));
    let invocation = api
        .engine
        .invoke_detailed(
            "search",
            vec![Argument::Map(map), FilePart::from_bytes("f.bin", "x").into()],
        )
        .await
        .unwrap();
    assert_eq!(invocation.warnings.len(), 1);
    assert!(invocation.warnings[0].contains("cannot upload files"));
    assert_eq!(mock.requests()[0].url, "http://h/search?v=1&q=rust%20lang");
}

#[tokio::test]
async fn head_ignores_the_progress_listener() {
    let (_, mock, api) = setup();
    let progress = Argument::progress(|_: u64, _: u64| {});
    let invocation = api
        .engine
        .invoke_detailed("peek", vec!["9".into(), progress])
        .await
        .unwrap();
    assert!(invocation.returned.is_nothing());
    assert_eq!(
        invocation.warnings,
        vec!["HEAD requests have no body; progress listener ignored".to_string()]
    );

    let request = &mock.requests()[0];
    assert_eq!(request.verb, Verb::Head);
    assert_eq!(request.url, "http://h/peek?id=9");
    assert!(request.content_type.is_none());
    assert!(request.body.is_empty());
    assert!(!request.has_progress);
}

#[tokio::test]
async fn patch_without_fields_is_rejected() {
    let (_, mock, api) = setup();
    let err = api.engine.invoke("amend", vec![Argument::Null]).await.unwrap_err();
    assert!(matches!(err, DispatchError::EmptyBody { .. }));
    assert_eq!(err.to_string(), "request body cannot be empty (amend)");
    assert!(mock.requests().is_empty());

    api.engine.invoke("amend", vec!["n".into()]).await.unwrap();
    assert_eq!(mock.requests()[0].verb, Verb::Patch);
    assert_eq!(mock.requests()[0].body_text(), r#"{"note":"n"}"#);
}

#[tokio::test]
async fn websocket_requires_url_and_listener() {
    let (_, _, api) = setup();
    let err = api
        .engine
        .invoke("stream", vec![Argument::Null, Argument::websocket_listener(Silent)])
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::MissingUrl { .. }));

    let err = api
        .engine
        .invoke("stream", vec!["ws://127.0.0.1:1/".into(), Argument::Null])
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::MissingWebSocketListener { .. }));
}

#[tokio::test]
async fn websocket_output_must_match_the_declared_type() {
    let (_, _, api) = setup();
    let handle = api
        .engine
        .invoke("stream", vec!["ws://127.0.0.1:1/".into(), Argument::websocket_listener(Silent)])
        .await
        .unwrap()
        .into_websocket()
        .unwrap();
    assert_eq!(handle.url(), "ws://127.0.0.1:1/");

    let err = api
        .engine
        .invoke("stream_text", vec![Argument::websocket_listener(Silent)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::ReturnTypeMismatch {
            declared: "text",
            actual: "websocket",
            ..
        }
    ));
}

#[tokio::test]
async fn method_without_verb_is_a_no_op() {
    let (dispatcher, mock, api) = setup();
    assert!(api.engine.invoke("hash_code", vec![]).await.unwrap().is_nothing());
    assert!(mock.requests().is_empty());
    assert_eq!(dispatcher.descriptors().len(), 1);
}

#[tokio::test]
async fn descriptors_and_proxies_are_reused() {
    let (dispatcher, _, api) = setup();
    api.engine.invoke("find", vec![1.into(), "a".into()]).await.unwrap();
    api.engine.invoke("find", vec![2.into(), "b".into()]).await.unwrap();
    assert_eq!(dispatcher.descriptors().resolution_count(), 1);
    assert_eq!(dispatcher.clients().build_count(), 0);

    let again = dispatcher.get_instance::<Api>().unwrap();
    assert!(Arc::ptr_eq(&api, &again));
}

#[tokio::test]
async fn cached_proxies_do_not_keep_the_dispatcher_alive() {
    let (dispatcher, mock, api) = setup();
    let weak = Arc::downgrade(&dispatcher);
    drop(dispatcher);
    assert!(weak.upgrade().is_none());

    mock.respond(200, "still here");
    let text = api.engine.invoke("list", vec![]).await.unwrap().into_text();
    assert_eq!(text.as_deref(), Some("still here"));
}

#[tokio::test]
async fn unknown_method_and_wrong_arity_are_errors() {
    let (_, _, api) = setup();
    assert!(matches!(
        api.engine.invoke("missing", vec![]).await,
        Err(DispatchError::UnknownMethod { .. })
    ));
    assert!(matches!(
        api.engine.invoke("find", vec![1.into()]).await,
        Err(DispatchError::ArgumentCount {
            expected: 2,
            actual: 1,
            ..
        })
    ));
}

#[test]
fn blocking_invocation_outside_a_runtime() {
    let (_, mock, api) = setup();
    mock.respond(200, "sync");
    let text = api.engine.invoke_blocking("list", vec![]).unwrap().into_text();
    assert_eq!(text.as_deref(), Some("sync"));
}

#[tokio::test]
async fn direct_requests_share_the_executors() {
    let (dispatcher, mock, _) = setup();
    let requests = dispatcher.requests();

    let output = requests
        .get("http://h/items", RequestParts::new().client::<MockFactory>().field("page", 2))
        .await
        .unwrap();
    assert!(matches!(output, DispatchOutput::Response(_)));

    let parts = RequestParts::new()
        .client::<MockFactory>()
        .header("X-Trace", "t1")
        .field("title", "notes")
        .file("doc", FilePart::from_bytes("n.txt", "body"));
    requests.post("http://h/items", parts).await.unwrap();

    let callback = Arc::new(RecordingCallback::default());
    let callback_dyn: Arc<dyn Callback> = callback.clone();
    let parts = RequestParts::new()
        .client::<MockFactory>()
        .field("id", 1)
        .field("reason", "stale")
        .callback(callback_dyn);
    assert!(matches!(
        requests.delete("http://h/items/{id}", parts).await.unwrap(),
        DispatchOutput::Enqueued
    ));
    assert_eq!(callback.wait_for(1).await.len(), 1);

    let recorded = mock.requests();
    assert_eq!(recorded[0].url, "http://h/items?page=2");
    assert!(recorded[1].content_type.as_deref().unwrap().starts_with("multipart/form-data"));
    assert_eq!(recorded[1].headers.get("X-Trace").map(String::as_str), Some("t1"));
    assert_eq!(recorded[2].verb, Verb::Delete);
    assert_eq!(recorded[2].url, "http://h/items/1");
    assert_eq!(recorded[2].body_text(), r#"{"reason":"stale"}"#);

    let err = requests.put("http://h/items", RequestParts::new().client::<MockFactory>()).await.unwrap_err();
    assert_eq!(err.to_string(), "request body cannot be empty (PUT)");
}
