//! Top-level declarations: functions, workflows, phases, and rules.

use crate::ast::{
    FunctionDef, Item, MatchRule, Phase, Program, ScoreRule, ScoreRuleAction, Spanned, Workflow,
};
use crate::lexer::Token;
use chumsky::prelude::*;
use std::collections::HashSet;

use super::expressions::expr;
use super::primitives::{agent_id, from_ast_span, spanned_name, to_ast_span, ParserInput, Span};

/// Parse `function name(params) = body`. `method` lexes to the same keyword.
pub fn function_def<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    FunctionDef,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    let params = spanned_name()
        .separated_by(just(Token::Comma))
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LParen), just(Token::RParen))
        .validate(|params: Vec<Spanned<String>>, _, emitter| {
            for (i, param) in params.iter().enumerate() {
                if params[..i].iter().any(|p| p.node == param.node) {
                    emitter.emit(Rich::custom(
                        from_ast_span(&param.span),
                        format!("duplicate parameter `{}`", param.node),
                    ));
                }
            }
            params
        });

    just(Token::Function)
        .ignore_then(spanned_name())
        .then(params)
        .then_ignore(just(Token::Equals))
        .then(expr())
        .map(|((name, params), body)| FunctionDef { name, params, body })
}

/// Parse `when <expr> then score += <expr>` or `when <expr> then log <expr>`.
fn score_rule<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    ScoreRule,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    let expression = expr();

    let action = choice((
        just(Token::Score)
            .ignore_then(just(Token::PlusEquals))
            .ignore_then(expression.clone())
            .map(|delta| ScoreRuleAction::Score { delta }),
        just(Token::Log)
            .ignore_then(expression.clone())
            .map(|message| ScoreRuleAction::Log { message }),
    ));

    just(Token::When)
        .ignore_then(expression)
        .then_ignore(just(Token::Then))
        .then(action)
        .map(|(condition, action)| ScoreRule { condition, action })
}

/// Parse `when <expr> then assign to <agent_id>`.
fn match_rule<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    MatchRule,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    just(Token::When)
        .ignore_then(expr())
        .then_ignore(just(Token::Then))
        .then_ignore(just(Token::Assign))
        .then_ignore(just(Token::To))
        .then(agent_id())
        .map(|(condition, target_agent_id)| MatchRule {
            condition,
            target_agent_id,
        })
}

/// Parse a `score { ... }` or `match { ... }` block.
fn phase<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Phase,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    let score = just(Token::Score)
        .ignore_then(
            score_rule()
                .map_with(|rule, e| Spanned::new(rule, to_ast_span(e.span())))
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBrace), just(Token::RBrace)),
        )
        .map(|rules| Phase::Score { rules });

    let matches = just(Token::Match)
        .ignore_then(
            match_rule()
                .map_with(|rule, e| Spanned::new(rule, to_ast_span(e.span())))
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBrace), just(Token::RBrace)),
        )
        .map(|rules| Phase::Match { rules });

    choice((score, matches)).boxed()
}

/// Parse `workflow name { phase* }`.
pub fn workflow<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Workflow,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    just(Token::Workflow)
        .ignore_then(spanned_name())
        .then(
            phase()
                .map_with(|phase, e| Spanned::new(phase, to_ast_span(e.span())))
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBrace), just(Token::RBrace)),
        )
        .map(|(name, phases)| Workflow { name, phases })
}

/// Parse a whole document. Function names must be unique.
pub fn program<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Program,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> {
    let item = choice((
        function_def().map(Item::Function),
        workflow().map(Item::Workflow),
    ))
    .map_with(|item, e| Spanned::new(item, to_ast_span(e.span())));

    item.repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
        .validate(|items: Vec<Spanned<Item>>, _, emitter| {
            let mut seen = HashSet::new();
            for item in &items {
                if let Item::Function(f) = &item.node {
                    if !seen.insert(f.name.node.clone()) {
                        emitter.emit(Rich::custom(
                            from_ast_span(&f.name.span),
                            format!("function `{}` is already defined", f.name.node),
                        ));
                    }
                }
            }
            Program { items }
        })
}
