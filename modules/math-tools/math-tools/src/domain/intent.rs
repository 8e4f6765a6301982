//! Intent mapping: a fixed table binding intent types to operations, an
//! utterance matcher that stands in for a host recognizer, and the speech/card
//! rendering of a finished call.

use std::sync::LazyLock;

use math_tools_sdk::{
    ArgValue, Arguments, CallRequest, IntentCard, IntentRequest, IntentResponse, format_exact,
    format_sequence,
};
use regex::{Captures, Regex};
use serde_json::{Number, Value};
use tracing::{debug, instrument};

use super::error::DomainError;
use super::service::{Completed, Dispatcher};
use super::validation::ValidatedArguments;

/// Fibonacci answers spell out at most this many terms.
const SPOKEN_TERMS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    Add,
    Fibonacci,
    IsPrime,
    Gcd,
    Lcm,
    PrimeFactors,
    Mean,
    Median,
    Std,
}

/// Maps one slot of an intent onto an operation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotBinding {
    pub slot: &'static str,
    pub parameter: &'static str,
    pub required: bool,
}

const fn slot(name: &'static str) -> SlotBinding {
    SlotBinding {
        slot: name,
        parameter: name,
        required: true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentBinding {
    pub intent_type: &'static str,
    pub kind: IntentKind,
    pub operation: &'static str,
    pub slots: &'static [SlotBinding],
}

static PAIR: [SlotBinding; 2] = [slot("a"), slot("b")];
static SINGLE: [SlotBinding; 1] = [slot("n")];
static VALUES: [SlotBinding; 1] = [slot("values")];
static STD: [SlotBinding; 2] = [
    slot("values"),
    SlotBinding {
        slot: "sample",
        parameter: "sample",
        required: false,
    },
];

static BINDINGS: [IntentBinding; 9] = [
    IntentBinding {
        intent_type: "MathAdd",
        kind: IntentKind::Add,
        operation: "add",
        slots: &PAIR,
    },
    IntentBinding {
        intent_type: "MathFibonacci",
        kind: IntentKind::Fibonacci,
        operation: "fibonacci",
        slots: &SINGLE,
    },
    IntentBinding {
        intent_type: "MathIsPrime",
        kind: IntentKind::IsPrime,
        operation: "is_prime",
        slots: &SINGLE,
    },
    IntentBinding {
        intent_type: "MathGcd",
        kind: IntentKind::Gcd,
        operation: "gcd",
        slots: &PAIR,
    },
    IntentBinding {
        intent_type: "MathLcm",
        kind: IntentKind::Lcm,
        operation: "lcm",
        slots: &PAIR,
    },
    IntentBinding {
        intent_type: "MathPrimeFactors",
        kind: IntentKind::PrimeFactors,
        operation: "prime_factors",
        slots: &SINGLE,
    },
    IntentBinding {
        intent_type: "MathMean",
        kind: IntentKind::Mean,
        operation: "mean",
        slots: &VALUES,
    },
    IntentBinding {
        intent_type: "MathMedian",
        kind: IntentKind::Median,
        operation: "median",
        slots: &VALUES,
    },
    IntentBinding {
        intent_type: "MathStd",
        kind: IntentKind::Std,
        operation: "std",
        slots: &STD,
    },
];

/// Find the binding for an intent type.
#[must_use]
pub fn binding(intent_type: &str) -> Option<&'static IntentBinding> {
    BINDINGS.iter().find(|b| b.intent_type == intent_type)
}

/// All intent bindings.
#[must_use]
pub fn bindings() -> &'static [IntentBinding] {
    &BINDINGS
}

/// Turn an intent into an operation call.
///
/// Only structure is checked here: the intent must be known and every required
/// slot present and non-blank. Slots the binding does not name are ignored.
///
/// # Errors
/// `IntentResolution` for an unrecognized intent or a missing required slot.
pub fn resolve(intent_type: &str, slots: &Arguments) -> Result<CallRequest, DomainError> {
    resolve_binding(intent_type, slots).map(|(_, call)| call)
}

fn resolve_binding(
    intent_type: &str,
    slots: &Arguments,
) -> Result<(&'static IntentBinding, CallRequest), DomainError> {
    let binding = binding(intent_type).ok_or_else(|| {
        DomainError::intent_resolution(format!("unrecognized intent '{intent_type}'"))
    })?;

    let mut arguments = Arguments::new();
    for slot in binding.slots {
        match slots.get(slot.slot).filter(|value| !is_blank(value)) {
            Some(value) => {
                arguments.insert(slot.parameter.to_owned(), value.clone());
            }
            None if slot.required => {
                return Err(DomainError::intent_resolution(format!(
                    "intent '{}' is missing required slot '{}'",
                    binding.intent_type, slot.slot
                )));
            }
            None => {}
        }
    }

    Ok((binding, CallRequest::new(binding.operation, arguments)))
}

fn is_blank(value: &ArgValue) -> bool {
    matches!(value, ArgValue::Text(text) if text.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Utterances
// ---------------------------------------------------------------------------

// Whole numbers only: "10.5" and "10abc" are never cut down to "10".
const NUM: &str = r"-?\d+(?:\.\d+)?\b";

struct Template {
    intent_type: &'static str,
    pattern: Regex,
}

#[allow(clippy::expect_used)] // good regexes, they don't panic
static TEMPLATES: LazyLock<Vec<Template>> = LazyLock::new(|| {
    let list = format!(r"{NUM}(?:(?:\s*,\s*(?:and\s+)?|\s+and\s+|\s+){NUM})*");
    let pair = format!(r"(?:of\s+|\()?(?P<a>{NUM})\s*(?:and|,)\s*(?P<b>{NUM})");
    let fib_filler = r"(?:sequence\s+|numbers\s+)?(?:of\s+|for\s+|up to\s+|with\s+)?";
    let std_kind = r"(?:(?P<sample>sample|population)\s+)?";
    [
        (
            "MathGcd",
            format!(r"\b(?:gcd|greatest common (?:divisor|factor))\s*{pair}"),
        ),
        (
            "MathLcm",
            format!(r"\b(?:lcm|l(?:ea|owe)st common multiple)\s*{pair}"),
        ),
        (
            "MathPrimeFactors",
            format!(r"\bprime factors?\s+(?:of\s+)?(?P<n>{NUM})"),
        ),
        ("MathPrimeFactors", format!(r"\bfactori[sz]e\s+(?P<n>{NUM})")),
        (
            "MathIsPrime",
            format!(r"\bis\s+(?P<n>{NUM})\s+(?:a\s+)?prime\b"),
        ),
        ("MathFibonacci", format!(r"\bfirst\s+(?P<n>{NUM})\s+fibonacci\b")),
        (
            "MathFibonacci",
            format!(r"\bfibonacci\s+{fib_filler}(?P<n>{NUM})"),
        ),
        (
            "MathStd",
            format!(r"\b{std_kind}standard deviation\s+(?:of\s+)?(?P<values>{list})"),
        ),
        (
            "MathMean",
            format!(r"\b(?:mean|average)\s+(?:of\s+)?(?P<values>{list})"),
        ),
        (
            "MathMedian",
            format!(r"\bmedian\s+(?:of\s+)?(?P<values>{list})"),
        ),
        (
            "MathAdd",
            format!(r"\b(?:add|sum of)\s+(?P<a>{NUM})\s+(?:and|to|plus)\s+(?P<b>{NUM})"),
        ),
        ("MathAdd", format!(r"(?P<a>{NUM})\s*(?:\+|plus)\s*(?P<b>{NUM})")),
    ]
    .into_iter()
    .map(|(intent_type, pattern)| Template {
        intent_type,
        pattern: Regex::new(&pattern).expect("static regex should not panic"),
    })
    .collect()
});

#[allow(clippy::expect_used)] // good regex, it doesn't panic
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NUM).expect("static regex should not panic"));

/// Recognize an English utterance as an intent with text slots.
///
/// Templates are tried in a fixed order and the first match wins. List slots
/// come out as comma-separated text ("1,2,3"); the std `sample` slot comes out
/// as "true" or "false".
#[must_use]
pub fn match_utterance(utterance: &str) -> Option<IntentRequest> {
    let text = utterance
        .trim()
        .trim_end_matches(['?', '.', '!'])
        .to_lowercase();

    TEMPLATES.iter().find_map(|template| {
        let captures = template.pattern.captures(&text)?;
        Some(IntentRequest::new(
            template.intent_type,
            slots_from(&template.pattern, &captures),
        ))
    })
}

fn slots_from(pattern: &Regex, captures: &Captures<'_>) -> Arguments {
    pattern
        .capture_names()
        .flatten()
        .filter_map(|name| {
            let matched = captures.name(name)?.as_str();
            let value = match name {
                "values" => NUMBER
                    .find_iter(matched)
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
                "sample" => (matched == "sample").to_string(),
                _ => matched.to_owned(),
            };
            Some((name.to_owned(), ArgValue::Text(value)))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn card(title: &str, content: String) -> IntentCard {
    IntentCard {
        title: title.to_owned(),
        content,
    }
}

/// Show a normalized argument the way answers print numbers.
fn shown(arguments: &ValidatedArguments, name: &str) -> String {
    match arguments.get(name) {
        Some(Value::Number(n)) => format_exact(n),
        Some(Value::Array(_)) => format_sequence(&arguments.sequence(name).unwrap_or_default()),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn spoken_terms(terms: &[Number]) -> String {
    let listed: Vec<String> = terms.iter().take(SPOKEN_TERMS).map(format_exact).collect();
    let mut spoken = listed.join(", ");
    if terms.len() > SPOKEN_TERMS {
        spoken.push_str(", and more");
    }
    spoken
}

fn spoken_factors(factors: &[Number]) -> String {
    if factors.is_empty() {
        return "none".to_owned();
    }
    factors
        .iter()
        .map(format_exact)
        .collect::<Vec<_>>()
        .join(" \u{d7} ")
}

/// Render the speech line and card for a finished call.
#[must_use]
pub fn render(kind: IntentKind, completed: &Completed) -> (String, IntentCard) {
    let args = &completed.arguments;
    let res = completed.result.to_string();
    let terms = completed.result.as_sequence().unwrap_or(&[]);

    match kind {
        IntentKind::Add => {
            let (a, b) = (shown(args, "a"), shown(args, "b"));
            (
                format!("The sum of {a} and {b} is {res}."),
                card("Addition", format!("{a} + {b} = {res}")),
            )
        }
        IntentKind::Fibonacci => {
            let n = shown(args, "n");
            (
                format!(
                    "The Fibonacci sequence up to {n} terms is: {}.",
                    spoken_terms(terms)
                ),
                card("Fibonacci", format!("n={n}: {res}")),
            )
        }
        IntentKind::IsPrime => {
            let n = shown(args, "n");
            let speech = if completed.result.as_bool() == Some(true) {
                format!("{n} is a prime number.")
            } else {
                format!("{n} is not a prime number.")
            };
            (speech, card("Prime check", format!("{n} \u{2192} {res}")))
        }
        IntentKind::Gcd => {
            let (a, b) = (shown(args, "a"), shown(args, "b"));
            (
                format!("The greatest common divisor of {a} and {b} is {res}."),
                card("GCD", format!("gcd({a}, {b}) = {res}")),
            )
        }
        IntentKind::Lcm => {
            let (a, b) = (shown(args, "a"), shown(args, "b"));
            (
                format!("The least common multiple of {a} and {b} is {res}."),
                card("LCM", format!("lcm({a}, {b}) = {res}")),
            )
        }
        IntentKind::PrimeFactors => {
            let n = shown(args, "n");
            (
                format!("The prime factors of {n} are {}.", spoken_factors(terms)),
                card("Prime factors", format!("{n} \u{2192} {res}")),
            )
        }
        IntentKind::Mean => (
            format!("The mean is {res}."),
            card(
                "Mean",
                format!("values={} \u{2192} {res}", shown(args, "values")),
            ),
        ),
        IntentKind::Median => (
            format!("The median is {res}."),
            card(
                "Median",
                format!("values={} \u{2192} {res}", shown(args, "values")),
            ),
        ),
        IntentKind::Std => {
            let sample = args.boolean("sample").unwrap_or(false);
            let flavour = if sample { "sample" } else { "population" };
            (
                format!("The {flavour} standard deviation is {res}."),
                card(
                    "Std",
                    format!(
                        "values={}, sample={sample} \u{2192} {res}",
                        shown(args, "values")
                    ),
                ),
            )
        }
    }
}

/// Runs intents through the dispatcher and renders the answers.
#[derive(Clone)]
pub struct IntentHandler {
    dispatcher: Dispatcher,
}

impl IntentHandler {
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// # Errors
    /// `IntentResolution` before dispatch, otherwise whatever the dispatcher returns.
    #[instrument(skip_all, fields(intent = %intent_type))]
    pub async fn handle(
        &self,
        intent_type: &str,
        slots: &Arguments,
    ) -> Result<IntentResponse, DomainError> {
        let (binding, call) = resolve_binding(intent_type, slots)?;
        debug!(operation = binding.operation, "intent resolved");

        let completed = self
            .dispatcher
            .execute(&call.operation, &call.arguments)
            .await?;
        let (speech, card) = render(binding.kind, &completed);

        Ok(IntentResponse {
            intent_type: binding.intent_type.to_owned(),
            operation: completed.spec.name.to_owned(),
            result: completed.result,
            speech,
            card,
        })
    }

    /// Match a free-text utterance and handle the resulting intent.
    ///
    /// # Errors
    /// `IntentResolution` when no template matches.
    pub async fn handle_utterance(&self, utterance: &str) -> Result<IntentResponse, DomainError> {
        let request = match_utterance(utterance).ok_or_else(|| {
            DomainError::intent_resolution(format!("no intent matches '{}'", utterance.trim()))
        })?;
        self.handle(&request.intent_type, &request.slots).await
    }
}
