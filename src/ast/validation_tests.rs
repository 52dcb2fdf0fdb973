//! Traversal-order and end-to-end validation tests

use super::*;
use crate::validator::{ModelValidatorImpl, validate_model};
use pretty_assertions::assert_eq;

/// Records every hook call and answers with a fixed result
struct RecordingValidator {
    calls: Vec<String>,
    answer: bool,
}

impl RecordingValidator {
    fn new(answer: bool) -> Self {
        Self {
            calls: Vec::new(),
            answer,
        }
    }

    fn record(&mut self, call: String) -> bool {
        self.calls.push(call);
        self.answer
    }
}

impl ModelValidator for RecordingValidator {
    fn validate_pipeline_def(&mut self, _: &PipelineDef) -> bool {
        self.record("pipeline".to_string())
    }

    fn validate_stages(&mut self, _: &Stages) -> bool {
        self.record("stages".to_string())
    }

    fn validate_stage(&mut self, stage: &Stage) -> bool {
        self.record(format!("stage:{}", stage.name))
    }

    fn validate_agent(&mut self, agent: &Agent) -> bool {
        self.record(format!("agent:{}", agent.agent_type))
    }

    fn validate_when(&mut self, _: &When) -> bool {
        self.record("when".to_string())
    }

    fn validate_when_condition(&mut self, condition: &WhenCondition) -> bool {
        self.record(format!("when_condition:{}", condition.name))
    }

    fn validate_options(&mut self, _: &Options) -> bool {
        self.record("options".to_string())
    }

    fn validate_option(&mut self, option: &PipelineOption) -> bool {
        self.record(format!("option:{}", option.name))
    }

    fn validate_triggers(&mut self, _: &Triggers) -> bool {
        self.record("triggers".to_string())
    }

    fn validate_trigger(&mut self, trigger: &Trigger) -> bool {
        self.record(format!("trigger:{}", trigger.name))
    }

    fn validate_method_call(&mut self, call: &MethodCall) -> bool {
        self.record(format!("call:{}", call.name))
    }

    fn validate_value(&mut self, value: &Value) -> bool {
        self.record(format!("value:{value}"))
    }

    fn validate_step(&mut self, step: &Step) -> bool {
        self.record(format!("step:{}", step.name))
    }

    fn validate_branch(&mut self, _: &Branch) -> bool {
        self.record("branch".to_string())
    }

    fn validate_build_condition(&mut self, condition: &BuildCondition) -> bool {
        self.record(format!("condition:{}", condition.condition))
    }

    fn validate_build_conditions_container(
        &mut self,
        container: &dyn BuildConditionsContainer,
    ) -> bool {
        self.record(format!("container:{}", container.conditions().len()))
    }

    fn validate_post_build(&mut self, _: &PostBuild) -> bool {
        self.record("post_build".to_string())
    }

    fn validate_post_stage(&mut self, _: &PostStage) -> bool {
        self.record("post_stage".to_string())
    }
}

fn two_conditions() -> Vec<BuildCondition> {
    vec![
        BuildCondition::new("always", vec![Step::echo("a")]),
        BuildCondition::new("failure", vec![]),
    ]
}

fn expected_container_calls(own: &str) -> Vec<&str> {
    vec![
        own,
        "container:2",
        "condition:always",
        "branch",
        "step:echo",
        "value:'a'",
        "condition:failure",
        "branch",
    ]
}

#[test]
fn test_post_build_call_order() {
    for answer in [true, false] {
        let mut v = RecordingValidator::new(answer);
        let result = PostBuild::new(two_conditions()).validate(&mut v);
        assert_eq!(result, answer);
        assert_eq!(v.calls, expected_container_calls("post_build"));
    }
}

#[test]
fn test_post_stage_call_order() {
    for answer in [true, false] {
        let mut v = RecordingValidator::new(answer);
        let result = PostStage::new(two_conditions()).validate(&mut v);
        assert_eq!(result, answer);
        assert_eq!(v.calls, expected_container_calls("post_stage"));
    }
}

#[test]
fn test_trigger_call_order() {
    for answer in [true, false] {
        let mut v = RecordingValidator::new(answer);
        let trigger = Trigger::new("cron").with_arg(MethodArg::literal("@daily"));
        assert_eq!(trigger.validate(&mut v), answer);
        assert_eq!(v.calls, vec!["trigger:cron", "call:cron", "value:'@daily'"]);
    }
}

#[test]
fn test_option_call_order() {
    let mut v = RecordingValidator::new(true);
    let options = Options::new(vec![
        PipelineOption::new("timeout").with_arg(MethodArg::named_literal("time", 5)),
    ]);
    assert!(options.validate(&mut v));
    assert_eq!(
        v.calls,
        vec!["options", "option:timeout", "call:timeout", "value:5"]
    );
}

#[test]
fn test_stage_and_pipeline_call_order() {
    let stage = Stage::new("build", Branch::new(vec![Step::new("make")]))
        .agent(Agent::any())
        .when(When::new(vec![]))
        .options(Options::new(vec![PipelineOption::new("retry")]))
        .post(PostStage::new(vec![]));
    let pipeline = PipelineDef::builder()
        .agent(Agent::new("none"))
        .stage(stage)
        .post(PostBuild::new(vec![]))
        .triggers(Triggers::new(vec![Trigger::new("pollSCM")]))
        .options(Options::new(vec![]))
        .build();

    let mut v = RecordingValidator::new(true);
    assert!(pipeline.validate(&mut v));
    assert_eq!(
        v.calls,
        vec![
            "pipeline",
            "stages",
            "stage:build",
            "agent:any",
            "when",
            "options",
            "option:retry",
            "call:retry",
            "branch",
            "step:make",
            "post_stage",
            "container:0",
            "post_build",
            "container:0",
            "agent:none",
            "options",
            "triggers",
            "trigger:pollSCM",
            "call:pollSCM",
        ]
    );
}

#[test]
fn test_failure_does_not_stop_traversal() {
    let mut v = RecordingValidator::new(false);
    let stages = Stages::new(vec![
        Stage::new("a", Branch::new(vec![Step::new("x")])),
        Stage::new("b", Branch::new(vec![Step::new("y")])),
    ]);
    assert!(!stages.validate(&mut v));
    assert_eq!(v.calls.len(), 7);
    assert_eq!(v.calls.last().map(String::as_str), Some("step:y"));
}

#[test]
fn test_empty_container_is_vacuously_valid() {
    assert!(PostBuild::default().validate(&mut crate::validator::NoopValidator));
    assert!(Vec::<Stage>::new().validate(&mut crate::validator::NoopValidator));
}

#[test]
fn test_duplicate_condition_is_a_container_concern() {
    let post = PostBuild::new(vec![
        BuildCondition::new("always", vec![Step::echo("one")]).at(SourceLocation::new(10, 9)),
        BuildCondition::new("always", vec![Step::echo("two")]).at(SourceLocation::new(13, 9)),
    ]);

    let mut validator = ModelValidatorImpl::default();
    let report = validate_model(&post, &mut validator);

    assert!(!report.valid);
    let messages: Vec<_> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(messages, vec!["Duplicate build condition name: 'always'"]);
    assert_eq!(report.diagnostics[0].location, Some(SourceLocation::new(13, 9)));

    let mut validator = ModelValidatorImpl::default();
    for condition in &post.conditions {
        assert!(condition.validate(&mut validator));
    }
    assert_eq!(validator.take_diagnostics(), vec![]);
}

fn sample_pipeline() -> PipelineDef {
    PipelineDef::builder()
        .agent(Agent::new("docker").with_arg(MethodArg::literal("rust:1.92")))
        .options(Options::new(vec![
            PipelineOption::new("timeout")
                .with_arg(MethodArg::named_literal("time", 1))
                .with_arg(MethodArg::named_literal("unit", "HOURS")),
        ]))
        .triggers(Triggers::new(vec![
            Trigger::new("cron").with_arg(MethodArg::literal("H 2 * * *")),
        ]))
        .stage(
            Stage::new("build", Branch::new(vec![Step::sh("cargo build")]))
                .when(When::new(vec![WhenCondition::branch("main")])),
        )
        .stage(Stage::new("test", Branch::new(vec![Step::sh("cargo test")])))
        .post(PostBuild::new(vec![BuildCondition::new(
            "always",
            vec![Step::echo("done")],
        )]))
        .build()
}

#[test]
fn test_valid_pipeline_has_no_diagnostics() {
    let mut validator = ModelValidatorImpl::default();
    let report = validate_model(&sample_pipeline(), &mut validator);
    assert_eq!(report.diagnostics, vec![]);
    assert!(report.valid);
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn test_validation_is_idempotent() {
    let mut pipeline = sample_pipeline();
    pipeline.agent = None;
    pipeline.stages.stages.push(Stage::new("test", Branch::default()));
    let before = pipeline.clone();

    let mut validator = ModelValidatorImpl::default();
    let first = validate_model(&pipeline, &mut validator);
    let second = validate_model(&pipeline, &mut validator);

    assert_eq!(first, second);
    assert!(!first.diagnostics.is_empty());
    assert_eq!(pipeline, before);
}

#[test]
fn test_pipeline_rule_messages() {
    let pipeline = PipelineDef::builder()
        .stage(Stage::new("foo", Branch::new(vec![Step::echo("x")])))
        .stage(Stage::new("foo", Branch::new(vec![Step::echo("y")])))
        .triggers(Triggers::new(vec![]))
        .build();

    let mut validator = ModelValidatorImpl::default();
    let report = validate_model(&pipeline, &mut validator);
    let messages: Vec<_> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Missing required section 'agent'",
            "Duplicate stage name: 'foo'",
            "Cannot have empty triggers section",
        ]
    );
}

#[test]
fn test_empty_stages_and_stage_without_branches() {
    let mut validator = ModelValidatorImpl::default();
    let report = validate_model(&Stages::default(), &mut validator);
    assert_eq!(report.diagnostics[0].message, "No stages specified");

    let mut stage = Stage::new("foo", Branch::default());
    stage.branches.clear();
    let report = validate_model(&stage, &mut validator);
    assert_eq!(report.diagnostics[0].message, "Nothing to execute within stage 'foo'");
}

fn boxed<T: Validate + 'static>(node: T) -> Box<dyn Validate> {
    Box::new(node)
}

#[test]
fn test_extension_rule_messages() {
    let cases: Vec<(Box<dyn Validate>, &str)> = vec![
        (
            boxed(Trigger::new("banana")),
            "Invalid trigger type \"banana\". Valid trigger types: [cron, pollSCM, upstream]",
        ),
        (
            boxed(Trigger::new("cron")),
            "'cron' should have 1 arguments but has 0 arguments instead",
        ),
        (
            boxed(PipelineOption::new("timeout").with_arg(MethodArg::named_literal("unit", "HOURS"))),
            "Missing required parameter: 'time'",
        ),
        (
            boxed(
                PipelineOption::new("timeout")
                    .with_arg(MethodArg::named_literal("time", 5))
                    .with_arg(MethodArg::named_literal("banana", "x")),
            ),
            "Invalid parameter 'banana', did you mean 'unit'?",
        ),
        (
            boxed(PipelineOption::new("timeout").with_arg(MethodArg::named_literal("time", "someTime"))),
            "Expecting int for parameter 'time' but got 'someTime' instead",
        ),
        (
            boxed(Agent::new("kubernetes")),
            "Invalid agent type \"kubernetes\" specified. Must be one of [any, docker, dockerfile, label, none]",
        ),
        (
            boxed(When::new(vec![])),
            "Empty 'when' closure in stage",
        ),
        (
            boxed(WhenCondition::new("sometimes")),
            "Unknown conditional sometimes. Valid conditionals are: [allOf, anyOf, branch, environment, equals, expression, not, tag]",
        ),
        (
            boxed(Options::new(vec![])),
            "Cannot have empty options section",
        ),
    ];

    for (node, expected) in cases {
        let mut validator = ModelValidatorImpl::default();
        let report = validate_model(&node, &mut validator);
        let messages: Vec<_> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec![expected]);
    }
}

#[test]
fn test_stage_only_placement() {
    let stage_options = Options::for_stage(vec![
        PipelineOption::new("skipDefaultCheckout"),
        PipelineOption::new("retry").with_arg(MethodArg::literal(2)),
    ]);
    let mut validator = ModelValidatorImpl::default();
    let report = validate_model(&stage_options, &mut validator);
    let messages: Vec<_> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        vec!["Invalid option type \"skipDefaultCheckout\". Valid option types: [retry, timeout]"]
    );
}

#[test]
fn test_invalid_regexp_in_when_becomes_diagnostic() {
    let when = When::new(vec![WhenCondition::new("branch")
        .with_arg(MethodArg::named_literal("compare", "release-("))
        .with_arg(MethodArg::named_literal("comparator", "REGEXP"))]);
    let mut validator = ModelValidatorImpl::default();
    let report = validate_model(&when, &mut validator);
    assert_eq!(report.diagnostics.len(), 1);
    assert!(report.diagnostics[0]
        .message
        .starts_with("Invalid regular expression 'release-('"));
}

#[test]
fn test_nested_when_call_order() {
    let mut v = RecordingValidator::new(true);
    let condition = WhenCondition::all_of(vec![
        WhenCondition::branch("main"),
        WhenCondition::not(WhenCondition::new("tag")),
    ]);
    assert!(condition.validate(&mut v));
    assert_eq!(
        v.calls,
        vec![
            "when_condition:allOf",
            "when_condition:branch",
            "value:'main'",
            "when_condition:not",
            "when_condition:tag",
        ]
    );
}

fn when_messages(conditions: Vec<WhenCondition>) -> Vec<String> {
    let mut validator = ModelValidatorImpl::default();
    let report = validate_model(&When::new(conditions), &mut validator);
    report.diagnostics.into_iter().map(|d| d.message).collect()
}

#[test]
fn test_tag_accepts_unnamed_pattern() {
    let tag = WhenCondition::new("tag").with_arg(MethodArg::literal("release-*"));
    assert_eq!(when_messages(vec![tag]), Vec::<String>::new());
}

#[test]
fn test_unknown_comparator_is_not_a_diagnostic() {
    let tag = WhenCondition::new("tag")
        .with_arg(MethodArg::named_literal("pattern", "release-*"))
        .with_arg(MethodArg::named_literal("comparator", "FUZZY"));
    assert_eq!(when_messages(vec![tag]), Vec::<String>::new());
}

#[test]
fn test_nested_when_arity_messages() {
    assert_eq!(
        when_messages(vec![
            WhenCondition::new("not"),
            WhenCondition::new("anyOf"),
            WhenCondition::not(WhenCondition::branch("a")).with_child(WhenCondition::branch("b")),
            WhenCondition::branch("main").with_child(WhenCondition::new("tag")),
            WhenCondition::all_of(vec![WhenCondition::new("tag")])
                .with_arg(MethodArg::literal("x")),
        ]),
        vec![
            "Nested when condition \"not\" requires exactly 1 child condition(s), but has 0",
            "Nested when condition \"anyOf\" requires at least one child condition",
            "Nested when condition \"not\" requires exactly 1 child condition(s), but has 2",
            "Conditional \"branch\" does not accept nested conditions",
            "Nested when condition \"allOf\" does not take arguments",
        ]
    );
}

#[test]
fn test_nested_children_are_validated() {
    let tree = WhenCondition::any_of(vec![
        WhenCondition::branch("main"),
        WhenCondition::new("sometimes"),
    ]);
    let messages = when_messages(vec![tree]);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Unknown conditional sometimes."));
}

#[test]
fn test_expression_arguments_skip_value_checks() {
    let timeout = PipelineOption::new("timeout").with_arg(MethodArg::named(
        "time",
        MethodArg::Value(Value::expression("${env.T}")),
    ));
    let mut validator = ModelValidatorImpl::default();
    let report = validate_model(&Options::new(vec![timeout]), &mut validator);
    assert_eq!(report.diagnostics, vec![]);

    let retry = PipelineOption::new("retry").with_arg(MethodArg::named_literal("count", "lots"));
    let report = validate_model(&Options::new(vec![retry]), &mut validator);
    assert_eq!(
        report.diagnostics[0].message,
        "Expecting int for parameter 'count' but got 'lots' instead"
    );
}
