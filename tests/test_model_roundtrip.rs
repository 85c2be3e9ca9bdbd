//! Integration test for the structured model (model → AST → model).
//!
//! Any model that follows the editor schema must survive `from_model`
//! followed by `to_model` unchanged.

use pretty_assertions::assert_eq;
use routix::{from_model, parse, serialize, to_model, Model};
use serde_json::json;

fn assert_model_round_trip(model: Model) {
    let program = from_model(&model).expect("model should import");
    assert_eq!(to_model(&program), model);
}

fn lit(ty: &str, value: serde_json::Value) -> Model {
    json!({ "kind": "literal", "type": ty, "value": value })
}

fn ident(path: &[&str]) -> Model {
    json!({ "kind": "identifier", "path": path })
}

fn binary(op: &str, left: Model, right: Model) -> Model {
    json!({ "kind": "binary", "op": op, "left": left, "right": right })
}

#[test]
fn test_empty_model() {
    assert_model_round_trip(json!({ "functions": [], "workflows": [] }));
}

#[test]
fn test_full_model() {
    assert_model_round_trip(json!({
        "functions": [
            {
                "name": "decay",
                "params": ["age"],
                "body": {
                    "kind": "call",
                    "name": "max",
                    "args": [
                        lit("number", json!(0)),
                        binary("-", lit("number", json!(10)), ident(&["age"]))
                    ]
                }
            },
            {
                "name": "noop",
                "params": [],
                "body": lit("bool", json!(true))
            }
        ],
        "workflows": [{
            "name": "triage",
            "phases": [
                {
                    "type": "score",
                    "rules": [
                        {
                            "condition": binary(">", ident(&["case", "age"]), lit("number", json!(3))),
                            "action": {
                                "kind": "score",
                                "delta": { "kind": "call", "name": "decay", "args": [ident(&["case", "age"])] }
                            }
                        },
                        {
                            "condition": {
                                "kind": "unary", "op": "!",
                                "operand": ident(&["case", "vip"])
                            },
                            "action": { "kind": "log", "message": lit("string", json!("regular")) }
                        }
                    ]
                },
                { "type": "score", "rules": [] },
                {
                    "type": "match",
                    "rules": [
                        {
                            "condition": binary(
                                "in",
                                lit("list", json!([lit("string", json!("billing")), lit("number", json!(2.5))])),
                                ident(&["agent", "skills"])
                            ),
                            "assignTo": "agent_42"
                        },
                        {
                            "condition": binary(
                                "or",
                                binary("==", ident(&["case", "tier"]), lit("string", json!("gold"))),
                                lit("bool", json!(false))
                            ),
                            "assignTo": "gold desk"
                        }
                    ]
                }
            ]
        }]
    }));
}

#[test]
fn test_model_only_shapes() {
    // Negative literals and right-nested operators have no direct source form
    assert_model_round_trip(json!({
        "functions": [{
            "name": "f",
            "params": ["a", "b"],
            "body": binary(
                "/",
                ident(&["a"]),
                binary("*", lit("number", json!(-4)), binary("+", ident(&["b"]), lit("list", json!([]))))
            )
        }],
        "workflows": []
    }));
}

#[test]
fn test_text_model_text() {
    let source = include_str!("../crates/parser/tests/fixtures/triage.rtx");
    let program = parse(source).unwrap();
    let model = to_model(&program);

    let rebuilt = from_model(&model).unwrap();
    assert_eq!(rebuilt, program);
    assert_eq!(serialize(&rebuilt), serialize(&program));
}

#[test]
fn test_model_survives_json_text() {
    let program = parse(include_str!("../crates/parser/tests/fixtures/interleaved.rtx")).unwrap();
    let model = to_model(&program);
    let text = serde_json::to_string_pretty(&model).unwrap();
    let reread: Model = serde_json::from_str(&text).unwrap();
    assert_eq!(to_model(&from_model(&reread).unwrap()), model);
}

#[test]
fn test_invalid_models_are_rejected() {
    for model in [
        json!(null),
        json!({ "functions": {}, "workflows": [] }),
        json!({ "functions": [], "workflows": [{ "name": "w" }] }),
        json!({ "functions": [], "workflows": [{ "name": "w", "phases": [{ "type": "score", "rules": [{ "condition": lit("bool", json!(true)) }] }] }] }),
        json!({ "functions": [{ "name": "f", "params": [], "body": { "kind": "unary", "op": "-", "operand": lit("number", json!(1)) } }], "workflows": [] }),
        json!({ "functions": [{ "name": "f", "params": [], "body": binary("**", lit("number", json!(1)), lit("number", json!(2))) }], "workflows": [] }),
    ] {
        assert!(from_model(&model).is_err(), "accepted {}", model);
    }
}
