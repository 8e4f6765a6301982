#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Dispatcher and intent behaviour against an in-memory remote.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use math_tools::domain::validation::ValidatedArguments;
use math_tools::domain::{MathToolsLocalClient, registry};
use math_tools::infra::{RemoteClient, RemoteEnvelope, TransportError};
use math_tools_sdk::{
    ArgValue, Arguments, MathToolsClient, MathToolsError, OperationResult, OperationSpec,
    ParamType, ResultType, arguments,
};
use serde_json::{Value, json};

type Reply = dyn Fn(&OperationSpec, &Value) -> Result<RemoteEnvelope, TransportError> + Send + Sync;

/// Records every call and answers through a closure.
struct SpyRemote {
    calls: Mutex<Vec<(String, Value)>>,
    reply: Box<Reply>,
    delay: Duration,
}

impl SpyRemote {
    fn new(
        reply: impl Fn(&OperationSpec, &Value) -> Result<RemoteEnvelope, TransportError>
        + Send
        + Sync
        + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply: Box::new(reply),
            delay: Duration::ZERO,
        })
    }

    /// Answers every call with a value of the declared result shape.
    fn well_behaved() -> Arc<Self> {
        Self::new(|spec, _| Ok(RemoteEnvelope::Ok(sample_result(spec.result))))
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteClient for SpyRemote {
    async fn send(
        &self,
        operation: &'static OperationSpec,
        arguments: &ValidatedArguments,
    ) -> Result<RemoteEnvelope, TransportError> {
        let payload = serde_json::to_value(arguments).unwrap();
        self.calls
            .lock()
            .unwrap()
            .push((operation.name.to_owned(), payload.clone()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.reply)(operation, &payload)
    }
}

fn sample_result(result: ResultType) -> Value {
    match result {
        ResultType::Number => json!(1),
        ResultType::Sequence => json!([1, 2]),
        ResultType::Boolean => json!(true),
    }
}

fn sample_argument(param_type: ParamType) -> ArgValue {
    match param_type {
        ParamType::Number => ArgValue::Number(2.5),
        ParamType::Integer => ArgValue::Number(3.0),
        ParamType::Sequence => ArgValue::Sequence(vec![1.0, 2.0, 3.0]),
        ParamType::Boolean => ArgValue::Boolean(true),
    }
}

fn required_arguments(spec: &OperationSpec) -> Arguments {
    spec.parameters
        .iter()
        .filter(|p| p.required)
        .map(|p| (p.name.to_owned(), sample_argument(p.param_type)))
        .collect()
}

fn client(remote: &Arc<SpyRemote>) -> MathToolsLocalClient {
    MathToolsLocalClient::new(remote.clone())
}

#[tokio::test]
async fn every_operation_succeeds_with_required_arguments() {
    let spy = SpyRemote::well_behaved();
    let client = client(&spy);

    for spec in client.operations() {
        let result = client
            .dispatch(spec.name, required_arguments(spec))
            .await
            .unwrap_or_else(|e| panic!("{} failed: {e}", spec.name));
        assert_eq!(result.result_type(), spec.result, "{}", spec.name);
    }

    assert_eq!(spy.calls().len(), registry::all().len());
}

#[tokio::test]
async fn omitting_a_required_parameter_never_reaches_the_server() {
    let spy = SpyRemote::well_behaved();
    let client = client(&spy);

    for spec in client.operations() {
        for missing in spec.parameters.iter().filter(|p| p.required) {
            let mut args = required_arguments(spec);
            args.remove(missing.name);

            let err = client.dispatch(spec.name, args).await.unwrap_err();
            let MathToolsError::InvalidArgument { violations, .. } = &err else {
                panic!("{}: expected InvalidArgument, got {err:?}", spec.name);
            };
            assert!(
                violations.iter().any(|v| v.parameter == missing.name),
                "{}: violation for {} expected",
                spec.name,
                missing.name
            );
        }
    }

    assert!(spy.calls().is_empty());
}

#[tokio::test]
async fn division_by_zero_is_reported_by_the_server() {
    let spy = SpyRemote::new(|_, args| {
        if args["b"] == json!(0.0) {
            Ok(RemoteEnvelope::Error("Division by zero".to_owned()))
        } else {
            Ok(RemoteEnvelope::Ok(json!(5)))
        }
    });
    let client = client(&spy);

    let err = client
        .dispatch("divide", arguments([("a", 10), ("b", 0)]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MathToolsError::RemoteComputationError { ref message } if message == "Division by zero"
    ));
    assert_eq!(spy.calls().len(), 1);
}

#[tokio::test]
async fn zero_window_is_rejected_locally() {
    let spy = SpyRemote::well_behaved();
    let client = client(&spy);

    let err = client
        .dispatch(
            "moving_average",
            arguments([
                ("series", ArgValue::Sequence(vec![1.0, 2.0, 3.0])),
                ("window", ArgValue::Number(0.0)),
            ]),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "INVALID_ARGUMENT");
    assert_eq!(err.violations().len(), 1);
    assert_eq!(err.violations()[0].parameter, "window");
    assert!(spy.calls().is_empty());
}

#[tokio::test]
async fn aliases_and_text_are_normalized_before_sending() {
    let spy = SpyRemote::well_behaved();
    let client = client(&spy);

    client
        .dispatch(
            "moving_average",
            arguments([("series", "1, 2, 3"), ("window", "2")]),
        )
        .await
        .unwrap();

    let calls = spy.calls();
    assert_eq!(calls[0].0, "moving_average");
    assert_eq!(calls[0].1, json!({"values": [1.0, 2.0, 3.0], "window": 2}));
}

#[tokio::test]
async fn every_violation_is_reported_together() {
    let spy = SpyRemote::well_behaved();
    let client = client(&spy);

    let err = client
        .dispatch("gcd", arguments([("a", "twelve"), ("c", "1")]))
        .await
        .unwrap_err();

    let parameters: Vec<&str> = err
        .violations()
        .iter()
        .map(|v| v.parameter.as_str())
        .collect();
    assert_eq!(parameters, ["a", "b", "c"]);
    assert!(spy.calls().is_empty());
}

#[tokio::test]
async fn unknown_operation_is_rejected() {
    let spy = SpyRemote::well_behaved();
    let client = client(&spy);

    let err = client.dispatch("sqrt", Arguments::new()).await.unwrap_err();

    assert!(matches!(err, MathToolsError::UnknownOperation { ref name } if name == "sqrt"));
    assert!(spy.calls().is_empty());
}

#[tokio::test]
async fn wrong_result_shape_is_unavailable() {
    let spy = SpyRemote::new(|_, _| Ok(RemoteEnvelope::Ok(json!([1, 2]))));
    let client = client(&spy);

    let err = client
        .dispatch("add", arguments([("a", 1), ("b", 2)]))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "REMOTE_UNAVAILABLE");
    assert!(err.to_string().contains("add"));
}

#[tokio::test]
async fn transport_failure_is_unavailable() {
    let spy = SpyRemote::new(|_, _| Err(TransportError::Cancelled));
    let client = client(&spy);

    let err = client
        .dispatch("is_prime", arguments([("n", 7)]))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "REMOTE_UNAVAILABLE");
}

#[tokio::test]
async fn gcd_utterance_dispatches_gcd() {
    let spy = SpyRemote::new(|_, _| Ok(RemoteEnvelope::Ok(json!(6))));
    let client = client(&spy);

    let answer = client
        .ask("compute the greatest common divisor of 12 and 18")
        .await
        .unwrap();

    assert_eq!(answer.intent_type, "MathGcd");
    assert_eq!(answer.operation, "gcd");
    assert_eq!(answer.result, OperationResult::Number(6.into()));
    assert_eq!(answer.speech, "The greatest common divisor of 12 and 18 is 6.");
    assert_eq!(
        spy.calls(),
        vec![("gcd".to_owned(), json!({"a": 12, "b": 18}))]
    );
}

#[tokio::test]
async fn fractional_utterance_is_rejected_not_truncated() {
    let spy = SpyRemote::well_behaved();
    let client = client(&spy);

    for utterance in ["fibonacci of 10.5", "gcd of 12 and 18.5"] {
        let err = client.ask(utterance).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT", "{utterance}");
    }
    assert!(spy.calls().is_empty());
}

#[tokio::test]
async fn space_separated_values_are_all_used() {
    let spy = SpyRemote::new(|_, _| Ok(RemoteEnvelope::Ok(json!(2))));
    let client = client(&spy);

    client.ask("mean of 1 2 3").await.unwrap();

    assert_eq!(
        spy.calls(),
        vec![("mean".to_owned(), json!({"values": [1.0, 2.0, 3.0]}))]
    );
}

#[tokio::test]
async fn intents_resolve_before_dispatch() {
    let spy = SpyRemote::well_behaved();
    let client = client(&spy);

    let err = client
        .handle_intent("MathGcd", arguments([("a", "12")]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INTENT_RESOLUTION_ERROR");

    let err = client
        .handle_intent("MathWeather", Arguments::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INTENT_RESOLUTION_ERROR");

    let err = client.ask("tell me a joke").await.unwrap_err();
    assert_eq!(err.code(), "INTENT_RESOLUTION_ERROR");

    assert!(spy.calls().is_empty());
}

#[tokio::test]
async fn intent_slots_still_go_through_validation() {
    let spy = SpyRemote::well_behaved();
    let client = client(&spy);

    let err = client
        .handle_intent("MathIsPrime", arguments([("n", "seven")]))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "INVALID_ARGUMENT");
    assert!(spy.calls().is_empty());
}

#[tokio::test]
async fn std_intent_renders_sample_flag() {
    let spy = SpyRemote::new(|_, _| Ok(RemoteEnvelope::Ok(json!(2.5))));
    let client = client(&spy);

    let answer = client
        .handle_intent(
            "MathStd",
            arguments([("values", "1,2,3,4"), ("sample", "yes")]),
        )
        .await
        .unwrap();

    assert_eq!(answer.speech, "The sample standard deviation is 2.5.");
    assert_eq!(answer.card.title, "Std");
    assert_eq!(spy.calls()[0].1["sample"], json!(true));
}

#[tokio::test]
async fn fibonacci_terms_beyond_f64_precision_are_exact() {
    let terms = json!([23_416_728_348_467_685_u64, 37_889_062_373_143_906_u64]);
    let reply = terms.clone();
    let spy = SpyRemote::new(move |_, _| Ok(RemoteEnvelope::Ok(reply.clone())));
    let client = client(&spy);

    let result = client
        .dispatch("fibonacci", arguments([("n", 80)]))
        .await
        .unwrap();

    assert_eq!(serde_json::to_value(&result).unwrap(), terms);
    assert_eq!(result.to_string(), "[23416728348467685, 37889062373143906]");
}

#[tokio::test]
async fn concurrent_dispatches_complete_independently() {
    let spy = Arc::new(SpyRemote {
        calls: Mutex::new(Vec::new()),
        reply: Box::new(|spec: &OperationSpec, _: &Value| {
            Ok(RemoteEnvelope::Ok(match spec.name {
                "fibonacci" => json!([0, 1, 1, 2, 3, 5, 8, 13, 21, 34]),
                "is_prime" => json!(true),
                _ => Value::Null,
            }))
        }),
        delay: Duration::from_millis(20),
    });
    let client = client(&spy);

    let (fib, prime) = futures::future::join(
        client.dispatch("fibonacci", arguments([("n", 10)])),
        client.dispatch("is_prime", arguments([("n", 97)])),
    )
    .await;

    assert_eq!(fib.unwrap().to_string(), "[0, 1, 1, 2, 3, 5, 8, 13, 21, 34]");
    assert_eq!(prime.unwrap(), OperationResult::Boolean(true));
    assert_eq!(spy.calls().len(), 2);
}
