//! The rule engine: runs a workflow's phases against one case and its
//! candidate agents.
//!
//! Score phases accumulate into a running total and emit log lines. Match
//! phases pick an assignment, scanning rules outer and candidates inner; the
//! first `true` pair wins. An [`EvalError`] raised by any rule is contained:
//! it is recorded in [`ExecutionResult::logs`] and the rule counts as not
//! firing, so one bad rule never aborts a run.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use routix_parser::{
    parse, parse_expression, MatchRule, Phase, Program, ScoreRule, ScoreRuleAction, Spanned,
    Workflow,
};

use crate::config::{AssignmentMode, EngineConfig};
use crate::context::{Context, FunctionTable};
use crate::error::{EngineError, EvalError};
use crate::evaluator::Evaluator;
use crate::value::{Record, Value};

/// Outcome of one workflow run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub final_score: f64,
    /// `log` output and contained-error diagnostics, in the order they occurred.
    pub logs: Vec<String>,
    /// The winning match rule's target, if any rule matched.
    pub assignment: Option<String>,
}

/// A loaded program, ready to run any of its workflows.
///
/// The engine is immutable after construction, so one instance can serve
/// concurrent runs from many threads.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    functions: FunctionTable,
    workflows: Vec<Workflow>,
    evaluator: Evaluator,
    config: EngineConfig,
}

impl RuleEngine {
    pub fn from_program(program: &Program, config: EngineConfig) -> Self {
        Self {
            functions: FunctionTable::from_program(program),
            workflows: program.workflows().cloned().collect(),
            evaluator: Evaluator::new(&config),
            config,
        }
    }

    /// Parse `source` and load it.
    pub fn from_source(source: &str, config: EngineConfig) -> Result<Self, EngineError> {
        let program = parse(source)?;
        Ok(Self::from_program(&program, config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    pub fn workflows(&self) -> &[Workflow] {
        &self.workflows
    }

    pub fn workflow(&self, name: &str) -> Option<&Workflow> {
        self.workflows.iter().find(|w| w.name.node == name)
    }

    /// Run `workflow` for one case. Never fails: evaluation errors end up in
    /// the result's logs.
    pub fn run(&self, workflow: &Workflow, case: &Record, agents: &[Record]) -> ExecutionResult {
        info!(
            workflow = %workflow.name.node,
            phases = workflow.phases.len(),
            candidates = agents.len(),
            "running workflow"
        );

        let mut run = Run::new(self, case);
        for (index, phase) in workflow.phases.iter().enumerate() {
            let number = index + 1;
            match &phase.node {
                Phase::Score { rules } => run.score_phase(number, rules),
                Phase::Match { .. } if run.assignment.is_some() => {
                    debug!(phase = number, "assignment already made, skipping match phase");
                }
                Phase::Match { rules } => run.match_phase(number, rules, agents),
            }
        }

        let result = run.finish();
        info!(
            workflow = %workflow.name.node,
            final_score = result.final_score,
            assignment = ?result.assignment,
            diagnostics = result.logs.iter().filter(|l| l.starts_with("error: ")).count(),
            "workflow finished"
        );
        result
    }

    /// Look up a workflow by name and run it.
    pub fn run_by_name(
        &self,
        name: &str,
        case: &Record,
        agents: &[Record],
    ) -> Result<ExecutionResult, EngineError> {
        let workflow = self
            .workflow(name)
            .ok_or_else(|| EngineError::UnknownWorkflow(name.to_string()))?;
        Ok(self.run(workflow, case, agents))
    }

    /// Run `workflow` once per case, in order. Runs share nothing.
    pub fn run_batch(
        &self,
        workflow: &Workflow,
        cases: &[Record],
        agents: &[Record],
    ) -> Vec<ExecutionResult> {
        cases
            .iter()
            .map(|case| self.run(workflow, case, agents))
            .collect()
    }

    /// Parse and evaluate a standalone expression with this program's
    /// functions in scope.
    pub fn evaluate_expression(
        &self,
        source: &str,
        case: &Record,
        agent: Option<&Record>,
    ) -> Result<Value, EngineError> {
        let expr = parse_expression(source)?;
        let ctx = Context {
            case,
            agent,
            functions: &self.functions,
        };
        Ok(self.evaluator.evaluate(&expr, &ctx)?)
    }
}

/// Mutable state of a single run.
struct Run<'e> {
    engine: &'e RuleEngine,
    case: &'e Record,
    score: f64,
    logs: Vec<String>,
    assignment: Option<String>,
}

impl<'e> Run<'e> {
    fn new(engine: &'e RuleEngine, case: &'e Record) -> Self {
        let mut run = Self {
            engine,
            case,
            score: 0.0,
            logs: Vec::new(),
            assignment: None,
        };
        match case.get("score") {
            None => {}
            Some(Value::Number(n)) => run.score = *n,
            Some(other) => run.contain(
                "case.score".to_string(),
                EvalError::mismatch("score seed", "number", other.type_name()),
            ),
        }
        run
    }

    fn context(&self) -> Context<'e> {
        Context::for_case(self.case, &self.engine.functions)
    }

    /// Record a contained evaluation error.
    fn contain(&mut self, location: String, err: EvalError) {
        warn!(%location, error = %err, "rule evaluation failed");
        self.logs.push(format!("error: {}: {}", location, err));
    }

    fn score_phase(&mut self, phase: usize, rules: &[Spanned<ScoreRule>]) {
        let engine = self.engine;
        let evaluator = &engine.evaluator;
        let ctx = self.context();

        for (index, rule) in rules.iter().enumerate() {
            let location = || format!("score phase {}, rule {}", phase, index + 1);

            match evaluator.evaluate_condition(&rule.node.condition, &ctx) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    self.contain(location(), err);
                    continue;
                }
            }

            match &rule.node.action {
                ScoreRuleAction::Score { delta } => {
                    let delta = evaluator.evaluate(delta, &ctx).and_then(|value| {
                        value
                            .as_number()
                            .ok_or_else(|| EvalError::mismatch("`score +=`", "number", value.type_name()))
                    });
                    match delta {
                        Ok(delta) => {
                            self.score += delta;
                            debug!(phase, rule = index + 1, delta, total = self.score, "score rule fired");
                        }
                        Err(err) => self.contain(location(), err),
                    }
                }
                ScoreRuleAction::Log { message } => match evaluator.evaluate(message, &ctx) {
                    Ok(message) => {
                        let line = message.to_string();
                        debug!(phase, rule = index + 1, message = %line, "log rule fired");
                        self.logs.push(line);
                    }
                    Err(err) => self.contain(location(), err),
                },
            }
        }
    }

    fn match_phase(&mut self, phase: usize, rules: &[Spanned<MatchRule>], agents: &[Record]) {
        let engine = self.engine;
        let evaluator = &engine.evaluator;
        let ctx = self.context();

        for (index, rule) in rules.iter().enumerate() {
            for (candidate, agent) in agents.iter().enumerate() {
                debug!(phase, rule = index + 1, candidate = candidate + 1, "trying candidate");
                match evaluator.evaluate_condition(&rule.node.condition, &ctx.with_agent(agent)) {
                    Ok(true) => {
                        let assignment = self.assignment_for(&rule.node, agent);
                        debug!(phase, rule = index + 1, candidate = candidate + 1, %assignment, "match rule fired");
                        self.assignment = Some(assignment);
                        return;
                    }
                    Ok(false) => {}
                    Err(err) => self.contain(
                        format!("match phase {}, rule {}, agent {}", phase, index + 1, candidate + 1),
                        err,
                    ),
                }
            }
        }
    }

    fn assignment_for(&self, rule: &MatchRule, agent: &Record) -> String {
        if self.engine.config.assignment == AssignmentMode::Candidate {
            match agent.get("id") {
                Some(Value::String(id)) => return id.clone(),
                Some(id @ Value::Number(_)) => return id.to_string(),
                _ => {}
            }
        }
        rule.target_agent_id.clone()
    }

    fn finish(self) -> ExecutionResult {
        ExecutionResult {
            final_score: self.score,
            logs: self.logs,
            assignment: self.assignment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn engine(source: &str) -> RuleEngine {
        RuleEngine::from_source(source, EngineConfig::default()).unwrap()
    }

    fn run(source: &str, case: &Record, agents: &[Record]) -> ExecutionResult {
        let engine = engine(source);
        let workflow = engine.workflows()[0].clone();
        engine.run(&workflow, case, agents)
    }

    #[test]
    fn test_score_accumulates() {
        let result = run(
            "workflow w { score { when true then score += 3\n when true then score += 4 } }",
            &Record::new(),
            &[],
        );
        assert_eq!(
            result,
            ExecutionResult {
                final_score: 7.0,
                logs: vec![],
                assignment: None,
            }
        );
    }

    #[test]
    fn test_score_seeded_from_case() {
        let source = "workflow w {\n\
                      score { when case.age > 3 then score += case.age * 2 }\n\
                      score { when case.vip then score += 10 }\n\
                      }";
        let case = Record::new()
            .with("score", 1.5)
            .with("age", 4.0)
            .with("vip", true);
        assert_eq!(run(source, &case, &[]).final_score, 19.5);
    }

    #[test]
    fn test_non_numeric_seed_is_reported() {
        let case = Record::new().with("score", "high");
        let result = run("workflow w { score { when true then score += 1 } }", &case, &[]);
        assert_eq!(result.final_score, 1.0);
        assert_eq!(
            result.logs,
            vec!["error: case.score: type mismatch in score seed: expected number, found string"]
        );
    }

    #[test]
    fn test_log_messages_are_coerced() {
        let source = r#"workflow w { score {
            when true then log "checked"
            when false then log "never"
            when true then log 1 + 1
            when true then log ["a", true]
        } }"#;
        let result = run(source, &Record::new(), &[]);
        assert_eq!(result.logs, vec!["checked", "2", "[\"a\", true]"]);
    }

    #[test]
    fn test_errors_are_contained() {
        let source = "workflow w {\n\
                      score {\n\
                          when 5 / (2 - 2) > 1 then score += 100\n\
                          when 1 then score += 100\n\
                          when true then score += \"x\"\n\
                          when true then score += 2\n\
                      }\n\
                      }";
        let result = run(source, &Record::new(), &[]);
        assert_eq!(result.final_score, 2.0);
        assert_eq!(
            result.logs,
            vec![
                "error: score phase 1, rule 1: division by zero",
                "error: score phase 1, rule 2: type mismatch in condition: expected bool, found number",
                "error: score phase 1, rule 3: type mismatch in `score +=`: expected number, found string",
            ]
        );
    }

    #[test]
    fn test_agent_is_absent_in_score_phase() {
        let result = run(
            r#"workflow w { score { when "x" in agent.skills then score += 1 } }"#,
            &Record::new(),
            &[Record::new().with("skills", vec!["x"])],
        );
        assert_eq!(result.final_score, 0.0);
        assert_eq!(
            result.logs,
            vec!["error: score phase 1, rule 1: unbound name `agent`"]
        );
    }

    #[test]
    fn test_match_first_wins() {
        let source = r#"workflow w { match {
            when "billing" in agent.skills then assign to first
            when true then assign to second
        } }"#;
        let agents = [
            Record::new().with("skills", vec!["billing"]),
            // Would raise MissingField if it were ever tried
            Record::new(),
        ];
        let result = run(source, &Record::new(), &agents);
        assert_eq!(result.assignment.as_deref(), Some("first"));
        assert!(result.logs.is_empty());
    }

    #[test]
    fn test_match_scans_agents_inside_rules() {
        let source = r#"workflow w { match {
            when "legal" in agent.skills then assign to legal_desk
            when "billing" in agent.skills then assign to billing_desk
        } }"#;
        let agents = [
            Record::new().with("skills", vec!["billing"]),
            Record::new().with("skills", vec!["legal"]),
        ];
        let result = run(source, &Record::new(), &agents);
        assert_eq!(result.assignment.as_deref(), Some("legal_desk"));
    }

    #[test]
    fn test_match_errors_are_contained() {
        let source = r#"workflow w { match { when agent.tier > 2 then assign to "gold desk" } }"#;
        let agents = [Record::new(), Record::new().with("tier", 3.0)];
        let result = run(source, &Record::new(), &agents);
        assert_eq!(result.assignment.as_deref(), Some("gold desk"));
        assert_eq!(
            result.logs,
            vec!["error: match phase 1, rule 1, agent 1: missing field `tier` in `agent`"]
        );
    }

    #[test]
    fn test_no_match_and_no_agents() {
        let source = "workflow w { match { when true then assign to anyone } }";
        assert_eq!(run(source, &Record::new(), &[]).assignment, None);

        let source = "workflow w { match { when agent.online then assign to anyone } }";
        let agents = [Record::new().with("online", false)];
        assert_eq!(run(source, &Record::new(), &agents).assignment, None);
    }

    #[test]
    fn test_later_match_phases_are_skipped() {
        let source = "workflow w {\n\
                      match { when true then assign to a }\n\
                      score { when true then score += 1 }\n\
                      match { when true then assign to b }\n\
                      }";
        let result = run(source, &Record::new(), &[Record::new()]);
        assert_eq!(result.assignment.as_deref(), Some("a"));
        assert_eq!(result.final_score, 1.0);
    }

    #[test]
    fn test_candidate_assignment_mode() {
        let config = EngineConfig {
            assignment: AssignmentMode::Candidate,
            ..EngineConfig::default()
        };
        let engine = RuleEngine::from_source(
            "workflow w { match { when agent.load < 3 then assign to fallback } }",
            config,
        )
        .unwrap();
        let case = Record::new();

        let agents = [
            Record::new().with("id", "a1").with("load", 5.0),
            Record::new().with("id", "a2").with("load", 1.0),
        ];
        let result = engine.run_by_name("w", &case, &agents).unwrap();
        assert_eq!(result.assignment.as_deref(), Some("a2"));

        let agents = [Record::new().with("id", 42.0).with("load", 0.0)];
        let result = engine.run_by_name("w", &case, &agents).unwrap();
        assert_eq!(result.assignment.as_deref(), Some("42"));

        let agents = [Record::new().with("load", 0.0)];
        let result = engine.run_by_name("w", &case, &agents).unwrap();
        assert_eq!(result.assignment.as_deref(), Some("fallback"));
    }

    #[test]
    fn test_run_by_name_unknown() {
        let engine = engine("workflow w {}");
        assert!(matches!(
            engine.run_by_name("missing", &Record::new(), &[]),
            Err(EngineError::UnknownWorkflow(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_run_batch() {
        let engine = engine("workflow w { score { when case.age > 3 then score += 1 } }");
        let cases = [
            Record::new().with("age", 5.0),
            Record::new().with("age", 1.0),
            Record::new().with("age", 9.0).with("score", 10.0),
        ];
        let scores: Vec<f64> = engine
            .run_batch(&engine.workflows()[0], &cases, &[])
            .iter()
            .map(|r| r.final_score)
            .collect();
        assert_eq!(scores, vec![1.0, 0.0, 11.0]);
    }

    #[test]
    fn test_evaluate_expression() {
        let engine = engine("function double(x) = x * 2");
        let case = Record::new().with("age", 4.0);
        assert_eq!(
            engine.evaluate_expression("double(case.age) + 1", &case, None).unwrap(),
            Value::Number(9.0)
        );
        assert!(matches!(
            engine.evaluate_expression("double(", &case, None),
            Err(EngineError::Parse(_))
        ));
        assert!(matches!(
            engine.evaluate_expression("nope(1)", &case, None),
            Err(EngineError::Eval(EvalError::UnknownFunction { .. }))
        ));
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = ExecutionResult {
            final_score: 7.0,
            logs: vec!["hi".into()],
            assignment: Some("agent_42".into()),
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({"finalScore": 7.0, "logs": ["hi"], "assignment": "agent_42"})
        );
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleEngine>();

        let engine = engine(
            "function bonus(age) = max(0, age - 3)\n\
             workflow w { score { when true then score += bonus(case.age) } }",
        );
        let engine = &engine;
        let workflow = &engine.workflows()[0];
        let cases: Vec<Record> = (0..16).map(|age| Record::new().with("age", age)).collect();

        let results: Vec<f64> = std::thread::scope(|scope| {
            let handles: Vec<_> = cases
                .iter()
                .map(|case| scope.spawn(move || engine.run(workflow, case, &[]).final_score))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let expected: Vec<f64> = (0..16).map(|age| f64::max(0.0, age as f64 - 3.0)).collect();
        assert_eq!(results, expected);
    }
}
