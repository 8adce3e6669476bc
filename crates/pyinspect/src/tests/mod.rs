//! Handler and request loop tests.

mod support;

use std::io::Cursor;
use std::sync::Arc;

use pyinspect_config::Config;
use pyinspect_python::{IntrospectionError, RuntimeError};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use self::support::{
    BrokenVersions, FixedVersions, MockIntrospector, dispatcher_with, empty_introspector, frame,
    request_frame, serve,
};
use crate::handlers::{CANCEL_REQUEST, MODULE_EXPORTS, MODULE_MEMBER_NAMES, MODULE_VERSION};
use crate::{
    ConfigLoader, INTERNAL_ERROR, LoopState, METHOD_NOT_FOUND, Request, ServeError, Server,
    StdioTransport, TransportError, build_dispatcher,
};

#[fixture]
fn yaml_introspector() -> MockIntrospector {
    let mut introspector = MockIntrospector::new();
    introspector
        .expect_member_names()
        .returning(|module: &str| match module {
            "yaml" => Ok(Some(vec![String::from("dump"), String::from("load")])),
            _ => Ok(None),
        });
    introspector
        .expect_export_list()
        .returning(|module: &str| match module {
            "yaml" => Ok(Some(vec![String::from("load")])),
            _ => Ok(None),
        });
    introspector.expect_version_attribute().never();
    introspector
}

fn result_of(response: &Value) -> &Value {
    response.get("result").expect("result field")
}

fn nth(responses: &[Value], index: usize) -> &Value {
    responses.get(index).expect("response at index")
}

fn error_of(response: &Value) -> (i64, &str) {
    let error = response.get("error").expect("error field");
    let code = error.get("code").and_then(Value::as_i64).expect("code");
    let message = error.get("message").and_then(Value::as_str).expect("message");
    (code, message)
}

#[rstest]
fn registers_every_method() {
    let dispatcher = dispatcher_with(empty_introspector(), FixedVersions::default());

    assert_eq!(
        dispatcher.registry().methods(),
        vec![CANCEL_REQUEST, MODULE_EXPORTS, MODULE_MEMBER_NAMES, MODULE_VERSION]
    );
}

#[rstest]
#[case::no_params(vec![])]
#[case::null(vec![Value::Null])]
#[case::structured(vec![json!({"id": 3}), json!("extra")])]
fn cancel_request_accepts_anything(#[case] params: Vec<Value>) {
    let dispatcher = dispatcher_with(empty_introspector(), FixedVersions::default());

    let response = dispatcher.dispatch(&Request::new(7_i64, CANCEL_REQUEST, params));

    assert!(response.error_object().is_none());
}

#[rstest]
fn member_names_and_exports_are_reported(yaml_introspector: MockIntrospector) {
    let dispatcher = dispatcher_with(yaml_introspector, FixedVersions::default());
    let input = [
        request_frame(&json!({"id": 1, "method": MODULE_MEMBER_NAMES, "params": ["yaml"]})),
        request_frame(&json!({"id": 2, "method": MODULE_EXPORTS, "params": ["yaml"]})),
    ]
    .concat();

    let (outcome, responses) = serve(dispatcher, input);

    assert_eq!(outcome.expect("orderly close").requests, 2);
    assert_eq!(
        responses,
        vec![
            json!({"jsonrpc": "2.0", "id": 1, "result": ["dump", "load"]}),
            json!({"jsonrpc": "2.0", "id": 2, "result": ["load"]}),
        ]
    );
}

#[rstest]
#[case::members(MODULE_MEMBER_NAMES)]
#[case::exports(MODULE_EXPORTS)]
#[case::version(MODULE_VERSION)]
fn unimportable_module_answers_null(#[case] method: &str) {
    let dispatcher = dispatcher_with(empty_introspector(), FixedVersions::default());
    let input = request_frame(
        &json!({"id": 5, "method": method, "params": ["definitely_not_a_real_module_xyz"]}),
    );

    let (outcome, responses) = serve(dispatcher, input);

    outcome.expect("orderly close");
    let response = responses.first().expect("one response");
    assert_eq!(result_of(response), &Value::Null);
    assert!(response.get("error").is_none());
}

#[rstest]
fn module_version_uses_resolver() {
    let versions = FixedVersions::default().with("requests", "2.31.0");
    let dispatcher = dispatcher_with(empty_introspector(), versions);

    let response = dispatcher.dispatch(&Request::new(
        "v",
        MODULE_VERSION,
        vec![json!("requests")],
    ));

    assert_eq!(
        serde_json::to_value(&response).expect("serialise"),
        json!({"jsonrpc": "2.0", "id": "v", "result": "2.31.0"})
    );
}

#[rstest]
fn resolver_failure_is_internal_error() {
    let dispatcher = dispatcher_with(empty_introspector(), BrokenVersions);

    let response = dispatcher.dispatch(&Request::new(1_i64, MODULE_VERSION, vec![json!("x")]));

    let error = response.error_object().expect("error response");
    assert_eq!(error.code(), INTERNAL_ERROR);
    assert_eq!(
        error.message(),
        "failed to index installed distributions: python interpreter reported invalid search paths: sys.path was not a list"
    );
}

#[rstest]
fn introspection_failure_is_internal_error() {
    let mut introspector = MockIntrospector::new();
    introspector.expect_member_names().returning(|_| {
        Err(IntrospectionError::Runtime(RuntimeError::Spawn {
            interpreter: String::from("python3"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }))
    });
    let dispatcher = dispatcher_with(introspector, FixedVersions::default());

    let response = dispatcher.dispatch(&Request::new(1_i64, MODULE_MEMBER_NAMES, vec![json!("os")]));

    let error = response.error_object().expect("error response");
    assert_eq!(error.code(), INTERNAL_ERROR);
    assert!(error.message().starts_with("failed to spawn python interpreter 'python3'"));
}

#[rstest]
#[case::missing(json!([]), "moduleMemberNames expects 1 parameter(s), got 0")]
#[case::extra(json!(["a", "b"]), "moduleMemberNames expects 1 parameter(s), got 2")]
#[case::wrong_type(json!([42]), "moduleMemberNames parameter 0 must be a string")]
fn bad_params_are_internal_errors(#[case] params: Value, #[case] message: &str) {
    let dispatcher = dispatcher_with(empty_introspector(), FixedVersions::default());
    let input = request_frame(&json!({"id": "p", "method": MODULE_MEMBER_NAMES, "params": params}));

    let (outcome, responses) = serve(dispatcher, input);

    outcome.expect("orderly close");
    let response = responses.first().expect("one response");
    assert_eq!(error_of(response), (INTERNAL_ERROR, message));
}

#[rstest]
fn unknown_method_response_is_exact() {
    let dispatcher = dispatcher_with(empty_introspector(), FixedVersions::default());
    let input = frame(r#"{"id":1,"method":"noSuchMethod","params":[]}"#);
    let transport = StdioTransport::new(Cursor::new(input), Vec::new());
    let mut server = Server::new(transport, dispatcher);

    server.serve().expect("orderly close");

    let (_, output) = server.into_transport().into_parts();
    let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method noSuchMethod not found"}}"#;
    assert_eq!(output, frame(body));
}

#[rstest]
fn responses_follow_request_order() {
    let dispatcher = dispatcher_with(empty_introspector(), FixedVersions::default());
    let input = [
        request_frame(&json!({"id": 1, "method": CANCEL_REQUEST, "params": [null]})),
        request_frame(&json!({"id": "two", "method": "nope"})),
        request_frame(&json!({"id": 3, "method": MODULE_VERSION, "params": ["zzz"]})),
    ]
    .concat();

    let (outcome, responses) = serve(dispatcher, input);

    assert_eq!(outcome.expect("orderly close").requests, 3);
    let ids: Vec<&Value> = responses.iter().filter_map(|r| r.get("id")).collect();
    assert_eq!(ids, vec![&json!(1), &json!("two"), &json!(3)]);
    assert_eq!(error_of(nth(&responses, 1)).0, METHOD_NOT_FOUND);
}

#[rstest]
fn malformed_envelope_with_id_is_answered_and_loop_continues() {
    let dispatcher = dispatcher_with(empty_introspector(), FixedVersions::default());
    let input = [
        frame(r#"{"id":9,"method":"moduleVersion","params":{"name":"x"}}"#),
        frame(r#"{"id":10,"params":[]}"#),
        request_frame(&json!({"id": 11, "method": CANCEL_REQUEST})),
    ]
    .concat();

    let (outcome, responses) = serve(dispatcher, input);

    assert_eq!(outcome.expect("orderly close").requests, 3);
    assert_eq!(
        error_of(nth(&responses, 0)),
        (INTERNAL_ERROR, "moduleVersion params must be an array")
    );
    assert_eq!(error_of(nth(&responses, 1)), (INTERNAL_ERROR, "request is missing a method"));
    assert_eq!(result_of(nth(&responses, 2)), &Value::Null);
}

#[rstest]
#[case::syntax(r#"{"id":1,"method":"#)]
#[case::not_object(r#"["cancelRequest"]"#)]
#[case::no_id(r#"{"method":"cancelRequest"}"#)]
fn unanswerable_request_is_fatal(#[case] body: &str) {
    let dispatcher = dispatcher_with(empty_introspector(), FixedVersions::default());
    let input = [frame(body), request_frame(&json!({"id": 2, "method": CANCEL_REQUEST}))].concat();

    let (outcome, responses) = serve(dispatcher, input);

    let error = outcome.expect_err("fatal decode fault");
    assert!(matches!(error, ServeError::Decode(_)));
    assert_eq!(error.state(), LoopState::Dispatching);
    assert!(responses.is_empty());
}

#[rstest]
fn empty_input_closes_without_output() {
    let dispatcher = dispatcher_with(empty_introspector(), FixedVersions::default());
    let transport = StdioTransport::new(Cursor::new(Vec::new()), Vec::new());
    let mut server = Server::new(transport, dispatcher);
    assert_eq!(server.state(), LoopState::Idle);

    let summary = server.serve().expect("orderly close");

    assert_eq!(summary.requests, 0);
    assert_eq!(server.state(), LoopState::Closed);
    assert!(server.into_transport().into_parts().1.is_empty());
}

#[rstest]
#[case::missing_length(b"Content-Type: x\r\n\r\n{}".to_vec(), LoopState::AwaitingHeader)]
#[case::eof_in_headers(b"Content-Length: 2\r\n".to_vec(), LoopState::AwaitingHeader)]
#[case::truncated_body(b"Content-Length: 20\r\n\r\n{}".to_vec(), LoopState::AwaitingBody)]
fn framing_faults_report_state(#[case] input: Vec<u8>, #[case] state: LoopState) {
    let dispatcher = dispatcher_with(empty_introspector(), FixedVersions::default());

    let (outcome, _) = serve(dispatcher, input);

    let error = outcome.expect_err("fatal framing fault");
    assert!(matches!(error, ServeError::Transport { .. }));
    assert_eq!(error.state(), state);
}

#[rstest]
fn earlier_responses_survive_a_later_fault() {
    let dispatcher = dispatcher_with(empty_introspector(), FixedVersions::default());
    let mut input = request_frame(&json!({"id": 1, "method": CANCEL_REQUEST}));
    input.extend_from_slice(b"Content-Length: nope\r\n\r\n");

    let (outcome, responses) = serve(dispatcher, input);

    assert!(matches!(
        outcome,
        Err(ServeError::Transport {
            source: TransportError::InvalidContentLength { .. },
            ..
        })
    ));
    assert_eq!(responses.len(), 1);
}

struct FixedLoader(Config);

impl ConfigLoader for FixedLoader {
    fn load(&self) -> Result<Config, Arc<ortho_config::OrthoError>> {
        Ok(self.0.clone())
    }
}

#[rstest]
fn configured_dispatcher_serves_every_method() {
    let config = Config::default()
        .with_python("pyinspect-test-no-such-interpreter")
        .with_search_paths(["/nonexistent/site-packages"]);

    let dispatcher = build_dispatcher(&config).expect("dispatcher");

    assert_eq!(dispatcher.registry().len(), 4);
    let response = dispatcher.dispatch(&Request::new(1_i64, MODULE_MEMBER_NAMES, vec![json!("os")]));
    assert_eq!(
        response.error_object().map(crate::ResponseError::code),
        Some(INTERNAL_ERROR)
    );
}

#[rstest]
fn run_with_loader_serves_until_input_closes() {
    let loader = FixedLoader(Config::default().with_python("pyinspect-test-no-such-interpreter"));
    let input = request_frame(&json!({"id": 7, "method": CANCEL_REQUEST, "params": [null]}));
    let mut output = Vec::new();

    let summary =
        crate::run_with_loader(&loader, Cursor::new(input), &mut output).expect("orderly close");

    assert_eq!(summary.requests, 1);
    assert_eq!(
        support::responses(output),
        vec![json!({"jsonrpc": "2.0", "id": 7, "result": null})]
    );
}
