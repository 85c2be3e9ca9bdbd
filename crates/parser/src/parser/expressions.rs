//! Expression parser.
//!
//! Precedence, loosest first; every binary level is left-associative:
//!
//! | Level | Operators |
//! |-------|-----------|
//! | or | `or` |
//! | and | `and` |
//! | equality | `==` `!=` |
//! | relational | `>` `<` `>=` `<=` `in` |
//! | additive | `+` `-` |
//! | multiplicative | `*` `/` |
//! | unary | `!` |
//! | primary | literal, list, call, identifier, `( expr )` |

use crate::ast::{BinOp, Expr};
use crate::lexer::Token;
use chumsky::prelude::*;

use super::primitives::{ident, ParserInput, Span};

/// Parse an expression.
pub fn expr<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Expr,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    recursive(|expr| {
        let literal = select! {
            Token::NumberLit(n) => Expr::number(n),
            Token::StringLit(s) => Expr::string(s),
            Token::Bool(b) => Expr::bool(b),
        };

        // No trailing commas in lists or argument lists
        let list = expr
            .clone()
            .separated_by(just(Token::Comma))
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(Expr::list);

        // A call is an identifier immediately followed by `(`
        let call = ident()
            .then(
                expr.clone()
                    .separated_by(just(Token::Comma))
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .map(|(name, args)| Expr::call(name, args));

        let identifier = ident().map(Expr::ident);

        let parenthesized = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let atom = choice((literal, list, call, identifier, parenthesized))
            .labelled("expression")
            .boxed();

        let unary = just(Token::Bang)
            .repeated()
            .foldr_with(atom, |_bang, operand, _| Expr::not(operand))
            .boxed();

        let product_op = choice((
            just(Token::Star).to(BinOp::Mul),
            just(Token::Slash).to(BinOp::Div),
        ));
        let product = unary
            .clone()
            .foldl_with(product_op.then(unary).repeated(), |l, (op, r), _| {
                Expr::binary(op, l, r)
            })
            .boxed();

        let sum_op = choice((
            just(Token::Plus).to(BinOp::Add),
            just(Token::Minus).to(BinOp::Sub),
        ));
        let sum = product
            .clone()
            .foldl_with(sum_op.then(product).repeated(), |l, (op, r), _| {
                Expr::binary(op, l, r)
            })
            .boxed();

        let relational_op = choice((
            just(Token::Le).to(BinOp::Le),
            just(Token::Ge).to(BinOp::Ge),
            just(Token::Lt).to(BinOp::Lt),
            just(Token::Gt).to(BinOp::Gt),
            just(Token::In).to(BinOp::In),
        ));
        let relational = sum
            .clone()
            .foldl_with(relational_op.then(sum).repeated(), |l, (op, r), _| {
                Expr::binary(op, l, r)
            })
            .boxed();

        let equality_op = choice((
            just(Token::Eq).to(BinOp::Eq),
            just(Token::Ne).to(BinOp::Ne),
        ));
        let equality = relational
            .clone()
            .foldl_with(equality_op.then(relational).repeated(), |l, (op, r), _| {
                Expr::binary(op, l, r)
            })
            .boxed();

        let and_expr = equality
            .clone()
            .foldl_with(
                just(Token::And).ignore_then(equality).repeated(),
                |l, r, _| Expr::binary(BinOp::And, l, r),
            )
            .boxed();

        // Box or_expr to break the type chain and prevent exponential compile times
        and_expr
            .clone()
            .foldl_with(
                just(Token::Or).ignore_then(and_expr).repeated(),
                |l, r, _| Expr::binary(BinOp::Or, l, r),
            )
            .boxed()
    })
}
