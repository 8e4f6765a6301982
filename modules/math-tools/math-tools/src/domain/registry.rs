//! The fixed operation catalog.

use math_tools_sdk::{
    Category, Constraint, DefaultValue, OperationSpec, ParamType, ParameterSpec, ResultType,
};

const fn required(name: &'static str, param_type: ParamType) -> ParameterSpec {
    ParameterSpec {
        name,
        param_type,
        required: true,
        default: None,
        aliases: &[],
        constraint: None,
    }
}

const fn flag(name: &'static str, default: bool) -> ParameterSpec {
    ParameterSpec {
        name,
        param_type: ParamType::Boolean,
        required: false,
        default: Some(DefaultValue::Boolean(default)),
        aliases: &[],
        constraint: None,
    }
}

static NUMBER_PAIR: [ParameterSpec; 2] = [
    required("a", ParamType::Number),
    required("b", ParamType::Number),
];

static INTEGER_PAIR: [ParameterSpec; 2] = [
    required("a", ParamType::Integer),
    required("b", ParamType::Integer),
];

static POWER: [ParameterSpec; 2] = [
    required("base", ParamType::Number),
    required("exponent", ParamType::Number),
];

static SINGLE_INTEGER: [ParameterSpec; 1] = [required("n", ParamType::Integer)];

static VALUES: [ParameterSpec; 1] = [required("values", ParamType::Sequence)];

static STD: [ParameterSpec; 2] = [required("values", ParamType::Sequence), flag("sample", false)];

static SORT: [ParameterSpec; 2] = [
    required("values", ParamType::Sequence),
    flag("reverse", false),
];

static WINDOWED: [ParameterSpec; 2] = [
    ParameterSpec {
        name: "values",
        param_type: ParamType::Sequence,
        required: true,
        default: None,
        aliases: &["series"],
        constraint: None,
    },
    ParameterSpec {
        name: "window",
        param_type: ParamType::Integer,
        required: true,
        default: None,
        aliases: &[],
        constraint: Some(Constraint::Positive),
    },
];

const fn op(
    name: &'static str,
    category: Category,
    description: &'static str,
    parameters: &'static [ParameterSpec],
    result: ResultType,
) -> OperationSpec {
    OperationSpec {
        name,
        category,
        description,
        parameters,
        result,
    }
}

static OPERATIONS: [OperationSpec; 17] = [
    op("add", Category::Math, "Add two numbers", &NUMBER_PAIR, ResultType::Number),
    op(
        "subtract",
        Category::Math,
        "Subtract b from a",
        &NUMBER_PAIR,
        ResultType::Number,
    ),
    op(
        "multiply",
        Category::Math,
        "Multiply two numbers",
        &NUMBER_PAIR,
        ResultType::Number,
    ),
    op(
        "divide",
        Category::Math,
        "Divide a by b; the server rejects division by zero",
        &NUMBER_PAIR,
        ResultType::Number,
    ),
    op(
        "power",
        Category::Math,
        "Raise base to exponent",
        &POWER,
        ResultType::Number,
    ),
    op(
        "mean",
        Category::Math,
        "Arithmetic mean of a list of numbers",
        &VALUES,
        ResultType::Number,
    ),
    op(
        "median",
        Category::Math,
        "Median of a list of numbers",
        &VALUES,
        ResultType::Number,
    ),
    op(
        "std",
        Category::Math,
        "Standard deviation (population unless sample is set)",
        &STD,
        ResultType::Number,
    ),
    op(
        "gcd",
        Category::Algorithms,
        "Greatest common divisor of two integers",
        &INTEGER_PAIR,
        ResultType::Number,
    ),
    op(
        "lcm",
        Category::Algorithms,
        "Least common multiple of two integers",
        &INTEGER_PAIR,
        ResultType::Number,
    ),
    op(
        "is_prime",
        Category::Algorithms,
        "Whether n is a prime number",
        &SINGLE_INTEGER,
        ResultType::Boolean,
    ),
    op(
        "prime_factors",
        Category::Algorithms,
        "Prime factorization of n",
        &SINGLE_INTEGER,
        ResultType::Sequence,
    ),
    op(
        "fibonacci",
        Category::Algorithms,
        "First n Fibonacci numbers",
        &SINGLE_INTEGER,
        ResultType::Sequence,
    ),
    op(
        "sort",
        Category::Algorithms,
        "Sort a list of numbers",
        &SORT,
        ResultType::Sequence,
    ),
    op(
        "moving_average",
        Category::Algorithms,
        "Moving average over a sliding window",
        &WINDOWED,
        ResultType::Sequence,
    ),
    op(
        "rolling_min",
        Category::Algorithms,
        "Minimum over a sliding window",
        &WINDOWED,
        ResultType::Sequence,
    ),
    op(
        "rolling_max",
        Category::Algorithms,
        "Maximum over a sliding window",
        &WINDOWED,
        ResultType::Sequence,
    ),
];

/// Find an operation by name.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static OperationSpec> {
    OPERATIONS.iter().find(|spec| spec.name == name)
}

/// Every registered operation, in catalog order.
#[must_use]
pub fn all() -> &'static [OperationSpec] {
    &OPERATIONS
}
