// Parser for Go source files.
//
// Parses a token stream (from the lexer) into an AST for the Go subset
// understood by the front end. Uses chumsky combinators.
//
// Preconditions: input is a valid token stream from `lexer::lex()`.
// Postconditions: returns an AST plus any parse errors (non-fatal).
// Failure modes: syntax errors produce `Rich` diagnostics; parsing continues.
// Side effects: none.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use chumsky::recursive::Indirect;
use chumsky::span::SimpleSpan;

use crate::ast::*;
use crate::lexer::Token;

/// Result of parsing: AST plus any errors.
#[derive(Debug)]
pub struct ParseResult {
    pub file: Option<File>,
    pub errors: Vec<Rich<'static, Token, SimpleSpan>>,
}

/// Parse a Go source string. Lexes then parses.
///
/// Returns an AST (if parsing succeeded) plus any errors.
pub fn parse(source: &str) -> ParseResult {
    let lex_result = crate::lexer::lex(source);
    let len = source.len();

    // Convert lexer output to chumsky stream.
    let token_iter = lex_result.tokens.into_iter().map(|(tok, span)| {
        let cspan: SimpleSpan = (span.start..span.end).into();
        (tok, cspan)
    });
    let eoi: SimpleSpan = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let parser = file_parser(source);
    let (file, parse_errors) = parser.parse(stream).into_output_errors();

    // Merge lex errors + parse errors.
    let mut all_errors: Vec<Rich<'static, Token, SimpleSpan>> = lex_result
        .errors
        .into_iter()
        .map(|e| {
            let span: SimpleSpan = (e.span.start..e.span.end).into();
            Rich::custom(span, e.message)
        })
        .collect();
    all_errors.extend(parse_errors.into_iter().map(|e| e.into_owned()));

    ParseResult {
        file,
        errors: all_errors,
    }
}

type Extra<'tokens> = extra::Err<Rich<'tokens, Token, SimpleSpan>>;

// ── Helpers shared by the grammar rules ──

#[derive(Debug, Clone)]
enum Postfix {
    Selector(Ident),
    Call(Vec<Expr>, bool),
    Index(Expr),
    Slice(Option<Expr>, Option<Expr>),
    Assert(Option<TypeExpr>),
}

#[derive(Debug, Clone)]
enum SimpleTail {
    Define(Vec<Expr>),
    Assign(AssignOp, Vec<Expr>),
    Inc,
    Dec,
    Send(Expr),
}

/// A const spec before implicit repetition is applied.
type RawConstSpec = (Vec<Ident>, Option<TypeExpr>, Option<Vec<Expr>>, SimpleSpan);

fn join(a: SimpleSpan, b: SimpleSpan) -> SimpleSpan {
    (a.start..b.end).into()
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr {
        span: join(lhs.span, rhs.span),
        kind: ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)),
    }
}

fn fold_binary(lhs: Expr, (op, rhs): (BinaryOp, Expr)) -> Expr {
    binary(op, lhs, rhs)
}

fn apply_unary((op, span): (UnaryOp, SimpleSpan), rhs: Expr) -> Expr {
    Expr {
        span: join(span, rhs.span),
        kind: ExprKind::Unary(op, Box::new(rhs)),
    }
}

fn apply_postfix(lhs: Expr, (p, span): (Postfix, SimpleSpan)) -> Expr {
    let span = join(lhs.span, span);
    let lhs = Box::new(lhs);
    let kind = match p {
        Postfix::Selector(sel) => ExprKind::Selector(lhs, sel),
        Postfix::Call(args, spread) => ExprKind::Call {
            callee: lhs,
            args,
            spread,
        },
        Postfix::Index(index) => ExprKind::Index(lhs, Box::new(index)),
        Postfix::Slice(lo, hi) => ExprKind::SliceExpr {
            base: lhs,
            lo: lo.map(Box::new),
            hi: hi.map(Box::new),
        },
        Postfix::Assert(ty) => ExprKind::TypeAssert(lhs, ty),
    };
    Expr { kind, span }
}

/// Parameter lists are all named (`a, b int`) or all unnamed (`int, error`).
fn check_param_list<'a>(
    fields: Vec<Field>,
    span: SimpleSpan,
) -> Result<Vec<Field>, Rich<'a, Token, SimpleSpan>> {
    let named = fields.iter().filter(|f| !f.names.is_empty()).count();
    if named != 0 && named != fields.len() {
        return Err(Rich::custom(span, "mixed named and unnamed parameters"));
    }
    let ellipsis_at = fields
        .iter()
        .position(|f| matches!(f.ty.kind, TypeExprKind::Ellipsis(_)));
    if let Some(i) = ellipsis_at {
        let last_field = i + 1 == fields.len();
        if !last_field || fields[i].names.len() > 1 {
            return Err(Rich::custom(
                span,
                "can only use ... with final parameter in list",
            ));
        }
    }
    Ok(fields)
}

/// Classify `lhs [tail]` into one of the simple statement forms.
fn build_simple<'a>(
    lhs: Vec<Expr>,
    tail: Option<SimpleTail>,
    span: SimpleSpan,
) -> Result<Stmt, Rich<'a, Token, SimpleSpan>> {
    let kind = match tail {
        None => {
            if lhs.len() != 1 {
                return Err(Rich::custom(span, "expected 1 expression"));
            }
            let mut lhs = lhs;
            StmtKind::Expr(lhs.remove(0))
        }
        Some(SimpleTail::Define(rhs)) => {
            let mut names = Vec::with_capacity(lhs.len());
            for e in lhs {
                match e.kind {
                    ExprKind::Ident(id) => names.push(id),
                    _ => return Err(Rich::custom(e.span, "non-name on left side of :=")),
                }
            }
            StmtKind::ShortVar { lhs: names, rhs }
        }
        Some(SimpleTail::Assign(op, rhs)) => {
            if op != AssignOp::Assign && (lhs.len() != 1 || rhs.len() != 1) {
                return Err(Rich::custom(
                    span,
                    "assignment operation requires single-valued expressions",
                ));
            }
            StmtKind::Assign { lhs, op, rhs }
        }
        Some(SimpleTail::Send(value)) => {
            if lhs.len() != 1 {
                return Err(Rich::custom(span, "expected 1 expression"));
            }
            let mut lhs = lhs;
            StmtKind::Send {
                chan: lhs.remove(0),
                value,
            }
        }
        Some(tail @ (SimpleTail::Inc | SimpleTail::Dec)) => {
            if lhs.len() != 1 {
                return Err(Rich::custom(span, "expected 1 expression"));
            }
            let mut lhs = lhs;
            StmtKind::IncDec {
                expr: lhs.remove(0),
                inc: matches!(tail, SimpleTail::Inc),
            }
        }
    };
    Ok(Stmt { kind, span })
}

/// Apply implicit repetition to the specs of one `const` declaration: a spec
/// without values repeats the type and values of the one before it.
fn const_group<'a>(specs: Vec<RawConstSpec>) -> Result<Vec<VarSpec>, Rich<'a, Token, SimpleSpan>> {
    let mut out: Vec<VarSpec> = Vec::with_capacity(specs.len());
    for (names, ty, values, span) in specs {
        let spec = match values {
            Some(values) => VarSpec {
                names,
                ty,
                values,
                span,
            },
            None if ty.is_some() => {
                return Err(Rich::custom(
                    span,
                    "const declaration cannot have type without expression",
                ))
            }
            None => {
                let Some(prev) = out.last() else {
                    return Err(Rich::custom(span, "missing init expr for const declaration"));
                };
                VarSpec {
                    names,
                    ty: prev.ty.clone(),
                    values: prev.values.clone(),
                    span,
                }
            }
        };
        out.push(spec);
    }
    Ok(out)
}

/// `[lhs (:= | =)] range expr body`
fn build_range<'a>(
    lhs: Option<(Vec<Expr>, bool)>,
    expr: Expr,
    body: Block,
    span: SimpleSpan,
) -> Result<RangeStmt, Rich<'a, Token, SimpleSpan>> {
    let (vars, define) = lhs.unwrap_or_default();
    if vars.len() > 2 {
        return Err(Rich::custom(
            span,
            "range clause permits at most two iteration variables",
        ));
    }
    if define {
        if let Some(e) = vars.iter().find(|e| !matches!(e.kind, ExprKind::Ident(_))) {
            return Err(Rich::custom(e.span, "non-name on left side of :="));
        }
    }
    let mut vars = vars.into_iter();
    Ok(RangeStmt {
        key: vars.next(),
        value: vars.next(),
        define,
        expr,
        body,
    })
}

/// Classify the statement after `switch [init;]` as an expression tag or a
/// type switch guard.
fn build_switch<'a>(
    init: Option<Stmt>,
    tag: Option<Stmt>,
    clauses: Vec<CaseClause>,
    span: SimpleSpan,
) -> Result<SwitchStmt, Rich<'a, Token, SimpleSpan>> {
    let kind = match tag.map(|t| t.kind) {
        None => SwitchKind::Expr(None),
        Some(StmtKind::Expr(e)) => {
            let at = e.span;
            match e.kind {
                ExprKind::TypeAssert(subject, None) => SwitchKind::Type {
                    bind: None,
                    subject: *subject,
                },
                kind => SwitchKind::Expr(Some(Expr { kind, span: at })),
            }
        }
        Some(StmtKind::ShortVar { mut lhs, mut rhs }) if lhs.len() == 1 && rhs.len() == 1 => {
            match rhs.remove(0) {
                Expr {
                    kind: ExprKind::TypeAssert(subject, None),
                    ..
                } => SwitchKind::Type {
                    bind: Some(lhs.remove(0)),
                    subject: *subject,
                },
                other => {
                    return Err(Rich::custom(
                        other.span,
                        "expected .(type) in type switch guard",
                    ))
                }
            }
        }
        Some(_) => {
            return Err(Rich::custom(
                span,
                "switch expression must be an expression or a type switch guard",
            ))
        }
    };
    Ok(SwitchStmt {
        init: init.map(Box::new),
        kind,
        clauses,
    })
}

// ── Main parser builder ──
//
// All grammar rules are built inside `file_parser` so that the `source`
// reference is captured once and shared by all combinators. Types,
// signatures, expressions, statements and blocks are mutually recursive and
// declared up front.
//
// Expressions come in two flavours. Between `if`, `for` or `switch` and the
// opening brace of the body, a composite literal whose type is a bare type
// name (`T{}`, `pkg.T{}`) is not recognised unless parenthesised, so those
// headers use the `header_*` parsers.

fn file_parser<'tokens, 'src: 'tokens, I>(
    source: &'src str,
) -> impl Parser<'tokens, I, File, Extra<'tokens>> + 'src
where
    'tokens: 'src,
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let semis = just(Token::Semi).repeated().at_least(1).ignored();

    // ── Identifier ──

    let ident = just(Token::Ident).map_with(move |_, e| {
        let span: SimpleSpan = e.span();
        Ident {
            name: source[span.start..span.end].to_string(),
            span,
        }
    });

    let ident_list = ident
        .clone()
        .separated_by(just(Token::Comma))
        .at_least(1)
        .collect::<Vec<_>>();

    let mut type_expr = Recursive::<Indirect<_, _, _>>::declare();
    let mut signature = Recursive::<Indirect<_, _, _>>::declare();
    let mut block = Recursive::<Indirect<_, _, _>>::declare();

    // ── Parameters and signatures ──

    let param_type = just(Token::Ellipsis)
        .ignore_then(type_expr.clone())
        .map_with(|ty, e| TypeExpr {
            kind: TypeExprKind::Ellipsis(Box::new(ty)),
            span: e.span(),
        })
        .or(type_expr.clone());

    let named_param = ident_list
        .clone()
        .then(param_type.clone())
        .map(|(names, ty)| Field { names, ty });
    let unnamed_param = param_type.map(|ty| Field {
        names: Vec::new(),
        ty,
    });

    let params = named_param
        .or(unnamed_param)
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LParen), just(Token::RParen))
        .try_map(check_param_list)
        .boxed();

    let results = params
        .clone()
        .or(type_expr.clone().map(|ty| {
            vec![Field {
                names: Vec::new(),
                ty,
            }]
        }))
        .or_not()
        .map(Option::unwrap_or_default);

    signature.define(
        params
            .clone()
            .then(results)
            .map_with(|(params, results), e| Signature {
                params,
                results,
                span: e.span(),
            }),
    );

    // ── Types ──

    let field_decl = ident_list
        .clone()
        .then(type_expr.clone())
        .map(|(names, ty)| Field { names, ty });

    let method_spec = ident
        .clone()
        .then(signature.clone())
        .map(|(name, sig)| MethodSpec { name, sig });

    type_expr.define({
        let named = ident
            .clone()
            .then(just(Token::Dot).ignore_then(ident.clone()).or_not())
            .map(|(first, sel)| match sel {
                Some(sel) => TypeExprKind::Qualified(first, sel),
                None => TypeExprKind::Name(first),
            });

        let pointer = just(Token::Star)
            .ignore_then(type_expr.clone())
            .map(|t| TypeExprKind::Pointer(Box::new(t)));

        let slice = just(Token::LBracket)
            .then(just(Token::RBracket))
            .ignore_then(type_expr.clone())
            .map(|t| TypeExprKind::Slice(Box::new(t)));

        let map = just(Token::Map)
            .ignore_then(
                type_expr
                    .clone()
                    .delimited_by(just(Token::LBracket), just(Token::RBracket)),
            )
            .then(type_expr.clone())
            .map(|(key, value)| TypeExprKind::Map {
                key: Box::new(key),
                value: Box::new(value),
            });

        let chan = just(Token::Chan)
            .ignore_then(type_expr.clone())
            .map(|t| TypeExprKind::Chan {
                recv_only: false,
                elem: Box::new(t),
            });

        let recv_chan = just(Token::Arrow)
            .then(just(Token::Chan))
            .ignore_then(type_expr.clone())
            .map(|t| TypeExprKind::Chan {
                recv_only: true,
                elem: Box::new(t),
            });

        let func = just(Token::Func)
            .ignore_then(signature.clone())
            .map(TypeExprKind::Func);

        let strukt = just(Token::Struct)
            .ignore_then(
                field_decl
                    .separated_by(semis.clone())
                    .allow_leading()
                    .allow_trailing()
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LBrace), just(Token::RBrace)),
            )
            .map(TypeExprKind::Struct);

        let interface = just(Token::Interface)
            .ignore_then(
                method_spec
                    .separated_by(semis.clone())
                    .allow_leading()
                    .allow_trailing()
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LBrace), just(Token::RBrace)),
            )
            .map(TypeExprKind::Interface);

        choice((pointer, slice, map, recv_chan, chan, func, strukt, interface, named))
            .map_with(|kind, e| TypeExpr {
                kind,
                span: e.span(),
            })
            .boxed()
    });

    // ── Expressions ──

    let mut expr = Recursive::<Indirect<_, _, _>>::declare();

    let literal = select! {
        Token::Int = e => Expr { kind: ExprKind::Int, span: e.span() },
        Token::Float = e => Expr { kind: ExprKind::Float, span: e.span() },
        Token::Char = e => Expr { kind: ExprKind::Char, span: e.span() },
        Token::Str(s) = e => Expr { kind: ExprKind::Str(s), span: e.span() },
    };

    let ident_expr = ident.clone().map(|id| Expr {
        span: id.span,
        kind: ExprKind::Ident(id),
    });

    let paren = expr
        .clone()
        .delimited_by(just(Token::LParen), just(Token::RParen))
        .map_with(|inner, e| Expr {
            kind: ExprKind::Paren(Box::new(inner)),
            span: e.span(),
        });

    let func_lit = just(Token::Func)
        .ignore_then(signature.clone())
        .then(block.clone())
        .map_with(|(sig, body), e| Expr {
            kind: ExprKind::FuncLit(sig, body),
            span: e.span(),
        });

    // `{ [key:] value, ... }`; a value may itself be a bare `{ ... }`.
    let lit_body = recursive(|lit_body| {
        let elided = lit_body.map_with(|elems, e| Expr {
            kind: ExprKind::CompositeLit { ty: None, elems },
            span: e.span(),
        });
        expr.clone()
            .then_ignore(just(Token::Colon))
            .or_not()
            .then(elided.or(expr.clone()))
            .map(|(key, value)| Element { key, value })
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
    })
    .boxed();

    // Type literals in operand position, optionally followed by a body.
    let type_operand = choice((
        just(Token::LBracket),
        just(Token::Map),
        just(Token::Chan),
        just(Token::Struct),
        just(Token::Interface),
        just(Token::Func),
    ))
    .rewind()
    .ignore_then(type_expr.clone())
    .then(lit_body.clone().or_not())
    .map_with(|(ty, elems), e| Expr {
        kind: match elems {
            Some(elems) => ExprKind::CompositeLit { ty: Some(ty), elems },
            None => ExprKind::Type(ty),
        },
        span: e.span(),
    });

    let named_lit = ident
        .clone()
        .then(just(Token::Dot).ignore_then(ident.clone()).or_not())
        .map_with(|(first, sel), e| TypeExpr {
            kind: match sel {
                Some(sel) => TypeExprKind::Qualified(first, sel),
                None => TypeExprKind::Name(first),
            },
            span: e.span(),
        })
        .then(lit_body.clone())
        .map_with(|(ty, elems), e| Expr {
            kind: ExprKind::CompositeLit { ty: Some(ty), elems },
            span: e.span(),
        });

    let operand = choice((
        literal.clone(),
        func_lit.clone(),
        type_operand.clone(),
        named_lit,
        ident_expr.clone(),
        paren.clone(),
    ))
    .boxed();
    let header_operand =
        choice((literal, func_lit, type_operand, ident_expr, paren)).boxed();

    let args = expr
        .clone()
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .then(
            just(Token::Ellipsis)
                .then_ignore(just(Token::Comma).or_not())
                .or_not(),
        )
        .delimited_by(just(Token::LParen), just(Token::RParen))
        .map(|(args, spread)| Postfix::Call(args, spread.is_some()));

    let index = expr
        .clone()
        .or_not()
        .then(just(Token::Colon).ignore_then(expr.clone().or_not()).or_not())
        .delimited_by(just(Token::LBracket), just(Token::RBracket))
        .try_map(|(lo, hi), span| match (lo, hi) {
            (Some(index), None) => Ok(Postfix::Index(index)),
            (lo, Some(hi)) => Ok(Postfix::Slice(lo, hi)),
            (None, None) => Err(Rich::custom(span, "expected operand")),
        });

    let assert = just(Token::Dot)
        .ignore_then(
            just(Token::Type)
                .to(None::<TypeExpr>)
                .or(type_expr.clone().map(Some))
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        )
        .map(Postfix::Assert);

    let postfix = choice((
        just(Token::Dot)
            .ignore_then(ident.clone())
            .map(Postfix::Selector),
        assert,
        args,
        index,
    ))
    .map_with(|p, e| (p, e.span()))
    .boxed();

    let unary_op = select! {
        Token::Minus => UnaryOp::Neg,
        Token::Plus => UnaryOp::Plus,
        Token::Bang => UnaryOp::Not,
        Token::Star => UnaryOp::Deref,
        Token::Amp => UnaryOp::Addr,
        Token::Arrow => UnaryOp::Recv,
    }
    .map_with(|op, e| (op, e.span()));

    // Postfix, unary and binary levels over a given operand parser.
    macro_rules! operator_chain {
        ($operand:expr) => {{
            let primary = $operand
                .foldl(postfix.clone().repeated(), apply_postfix)
                .boxed();

            let unary = unary_op
                .clone()
                .repeated()
                .foldr(primary, apply_unary)
                .boxed();

            let product = unary
                .clone()
                .foldl(
                    select! {
                        Token::Star => BinaryOp::Mul,
                        Token::Slash => BinaryOp::Div,
                        Token::Percent => BinaryOp::Rem,
                    }
                    .then(unary)
                    .repeated(),
                    fold_binary,
                )
                .boxed();

            let sum = product
                .clone()
                .foldl(
                    select! {
                        Token::Plus => BinaryOp::Add,
                        Token::Minus => BinaryOp::Sub,
                    }
                    .then(product)
                    .repeated(),
                    fold_binary,
                )
                .boxed();

            let comparison = sum
                .clone()
                .foldl(
                    select! {
                        Token::EqEq => BinaryOp::Eq,
                        Token::NotEq => BinaryOp::Ne,
                        Token::Lt => BinaryOp::Lt,
                        Token::LtEq => BinaryOp::Le,
                        Token::Gt => BinaryOp::Gt,
                        Token::GtEq => BinaryOp::Ge,
                    }
                    .then(sum)
                    .repeated(),
                    fold_binary,
                )
                .boxed();

            let and = comparison
                .clone()
                .foldl(
                    just(Token::AndAnd)
                        .to(BinaryOp::And)
                        .then(comparison)
                        .repeated(),
                    fold_binary,
                )
                .boxed();

            and.clone()
                .foldl(
                    just(Token::OrOr).to(BinaryOp::Or).then(and).repeated(),
                    fold_binary,
                )
                .boxed()
        }};
    }

    expr.define(operator_chain!(operand));
    let header_expr = operator_chain!(header_operand);

    let expr_list = expr
        .clone()
        .separated_by(just(Token::Comma))
        .at_least(1)
        .collect::<Vec<_>>()
        .boxed();

    let header_expr_list = header_expr
        .clone()
        .separated_by(just(Token::Comma))
        .at_least(1)
        .collect::<Vec<_>>()
        .boxed();

    // ── Declarations usable as statements ──

    let var_spec = ident_list
        .clone()
        .then(type_expr.clone().or_not())
        .then(just(Token::Assign).ignore_then(expr_list.clone()).or_not())
        .try_map(|((names, ty), values), span: SimpleSpan| {
            if ty.is_none() && values.is_none() {
                return Err(Rich::custom(span, "missing variable type or initialization"));
            }
            Ok(VarSpec {
                names,
                ty,
                values: values.unwrap_or_default(),
                span,
            })
        })
        .boxed();

    let var_specs = var_spec
        .clone()
        .map(|s| vec![s])
        .or(var_spec
            .separated_by(semis.clone())
            .allow_leading()
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LParen), just(Token::RParen)))
        .boxed();

    let const_spec = ident_list
        .clone()
        .then(type_expr.clone().or_not())
        .then(just(Token::Assign).ignore_then(expr_list.clone()).or_not())
        .map_with(|((names, ty), values), e| (names, ty, values, e.span()));

    let const_specs = const_spec
        .clone()
        .map(|s| vec![s])
        .or(const_spec
            .separated_by(semis.clone())
            .allow_leading()
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LParen), just(Token::RParen)))
        .try_map(|specs, _| const_group(specs))
        .boxed();

    // ── Statements ──

    let mut stmt = Recursive::<Indirect<_, _, _>>::declare();

    // `lhs [:= rhs | op= rhs | ++ | -- | <- value]` over a given expression
    // list and single-expression parser.
    macro_rules! simple_stmt {
        ($list:expr, $single:expr) => {{
            let tail = choice((
                just(Token::Define)
                    .ignore_then($list.clone())
                    .map(SimpleTail::Define),
                select! {
                    Token::Assign => AssignOp::Assign,
                    Token::PlusAssign => AssignOp::Add,
                    Token::MinusAssign => AssignOp::Sub,
                    Token::StarAssign => AssignOp::Mul,
                    Token::SlashAssign => AssignOp::Div,
                }
                .then($list.clone())
                .map(|(op, rhs)| SimpleTail::Assign(op, rhs)),
                just(Token::Inc).to(SimpleTail::Inc),
                just(Token::Dec).to(SimpleTail::Dec),
                just(Token::Arrow)
                    .ignore_then($single.clone())
                    .map(SimpleTail::Send),
            ));
            $list
                .clone()
                .then(tail.or_not())
                .try_map(|(lhs, tail), span| build_simple(lhs, tail, span))
                .boxed()
        }};
    }

    let simple_stmt = simple_stmt!(expr_list, expr);
    let header_simple = simple_stmt!(header_expr_list, header_expr);

    let if_stmt = recursive(|if_stmt| {
        let else_branch = if_stmt.or(block.clone().map_with(|b, e| Stmt {
            kind: StmtKind::Block(b),
            span: e.span(),
        }));

        just(Token::If)
            .ignore_then(
                header_simple
                    .clone()
                    .then_ignore(just(Token::Semi))
                    .or_not(),
            )
            .then(header_expr.clone())
            .then(block.clone())
            .then(just(Token::Else).ignore_then(else_branch).or_not())
            .map_with(|(((init, cond), then), els), e| Stmt {
                kind: StmtKind::If(IfStmt {
                    init: init.map(Box::new),
                    cond,
                    then,
                    els: els.map(Box::new),
                }),
                span: e.span(),
            })
    });

    let for_stmt = {
        let range_clause = header_expr_list
            .clone()
            .then(
                just(Token::Define)
                    .to(true)
                    .or(just(Token::Assign).to(false)),
            )
            .or_not()
            .then_ignore(just(Token::Range))
            .then(header_expr.clone())
            .then(block.clone())
            .try_map(|((lhs, expr), body), span| build_range(lhs, expr, body, span))
            .map(StmtKind::Range);

        let three_clause = header_simple
            .clone()
            .or_not()
            .then_ignore(just(Token::Semi))
            .then(header_expr.clone().or_not())
            .then_ignore(just(Token::Semi))
            .then(header_simple.clone().or_not())
            .then(block.clone())
            .map(|(((init, cond), post), body)| {
                StmtKind::For(ForStmt {
                    init: init.map(Box::new),
                    cond,
                    post: post.map(Box::new),
                    body,
                })
            });

        let cond_only = header_expr
            .clone()
            .then(block.clone())
            .map(|(cond, body)| {
                StmtKind::For(ForStmt {
                    init: None,
                    cond: Some(cond),
                    post: None,
                    body,
                })
            });

        let forever = block.clone().map(|body| {
            StmtKind::For(ForStmt {
                init: None,
                cond: None,
                post: None,
                body,
            })
        });

        just(Token::For)
            .ignore_then(choice((range_clause, three_clause, cond_only, forever)))
            .map_with(|kind, e| Stmt {
                kind,
                span: e.span(),
            })
    };

    // Statements of one `case` or `default` clause.
    let clause_body = stmt
        .clone()
        .separated_by(semis.clone())
        .allow_leading()
        .allow_trailing()
        .collect::<Vec<_>>()
        .boxed();

    let switch_stmt = {
        let case_clause = just(Token::Case)
            .ignore_then(expr_list.clone())
            .map(Some)
            .or(just(Token::Default).to(None))
            .then_ignore(just(Token::Colon))
            .then(clause_body.clone())
            .map_with(|(exprs, body), e| CaseClause {
                exprs,
                body,
                span: e.span(),
            });

        just(Token::Switch)
            .ignore_then(
                header_simple
                    .clone()
                    .then_ignore(just(Token::Semi))
                    .or_not(),
            )
            .then(header_simple.clone().or_not())
            .then(
                case_clause
                    .repeated()
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LBrace), just(Token::RBrace)),
            )
            .try_map(|((init, tag), clauses), span| build_switch(init, tag, clauses, span))
            .map_with(|sw, e| Stmt {
                kind: StmtKind::Switch(sw),
                span: e.span(),
            })
    };

    let select_stmt = {
        let comm_clause = just(Token::Case)
            .ignore_then(simple_stmt.clone())
            .map(Some)
            .or(just(Token::Default).to(None))
            .then_ignore(just(Token::Colon))
            .then(clause_body)
            .map_with(|(comm, body), e| CommClause {
                comm: comm.map(Box::new),
                body,
                span: e.span(),
            });

        just(Token::Select)
            .ignore_then(
                comm_clause
                    .repeated()
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LBrace), just(Token::RBrace)),
            )
            .map_with(|clauses, e| Stmt {
                kind: StmtKind::Select(clauses),
                span: e.span(),
            })
    };

    let keyword_stmt = choice((
        just(Token::Var)
            .ignore_then(var_specs.clone())
            .map(StmtKind::Var),
        just(Token::Const)
            .ignore_then(const_specs.clone())
            .map(StmtKind::Const),
        just(Token::Return)
            .ignore_then(expr_list.clone().or_not())
            .map(|values| StmtKind::Return(values.unwrap_or_default())),
        just(Token::Go).ignore_then(expr.clone()).map(StmtKind::Go),
        just(Token::Defer)
            .ignore_then(expr.clone())
            .map(StmtKind::Defer),
        just(Token::Break).to(StmtKind::Break),
        just(Token::Continue).to(StmtKind::Continue),
        just(Token::Fallthrough).to(StmtKind::Fallthrough),
        block.clone().map(StmtKind::Block),
    ))
    .map_with(|kind, e| Stmt {
        kind,
        span: e.span(),
    });

    stmt.define(
        choice((
            keyword_stmt,
            if_stmt,
            for_stmt,
            switch_stmt,
            select_stmt,
            simple_stmt,
        ))
        .boxed(),
    );

    block.define(
        stmt.clone()
            .separated_by(semis.clone())
            .allow_leading()
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map_with(|stmts, e| Block {
                stmts,
                span: e.span(),
            }),
    );

    // ── Top-level declarations ──

    let import_spec = ident
        .clone()
        .or_not()
        .then(select! { Token::Str(path) = e => (path, e.span()) })
        .map(|(name, (path, path_span))| ImportSpec {
            name,
            path,
            path_span,
        });

    let import_decl = just(Token::Import).ignore_then(
        import_spec
            .clone()
            .map(|s| vec![s])
            .or(import_spec
                .separated_by(semis.clone())
                .allow_leading()
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LParen), just(Token::RParen))),
    );

    let type_spec = ident
        .clone()
        .then(just(Token::Assign).or_not())
        .then(type_expr.clone())
        .map_with(|((name, alias), ty), e| TypeSpec {
            name,
            alias: alias.is_some(),
            ty,
            span: e.span(),
        });

    let type_decl = just(Token::Type).ignore_then(
        type_spec.clone().map(|s| vec![s]).or(type_spec
            .separated_by(semis.clone())
            .allow_leading()
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LParen), just(Token::RParen))),
    );

    let var_decl = just(Token::Var).ignore_then(var_specs);
    let const_decl = just(Token::Const).ignore_then(const_specs);

    let receiver = params.try_map(|mut fields: Vec<Field>, span| {
        if fields.len() != 1 || fields[0].names.len() > 1 {
            return Err(Rich::custom(span, "method has multiple receivers"));
        }
        Ok(fields.remove(0))
    });

    let func_decl = just(Token::Func)
        .ignore_then(receiver.or_not())
        .then(ident.clone())
        .then(signature.clone())
        .then(block.clone().or_not())
        .map_with(|(((recv, name), sig), body), e| FuncDecl {
            recv,
            name,
            sig,
            body,
            span: e.span(),
        });

    let top_decl = choice((
        func_decl.map(|f| vec![Decl::Func(f)]),
        type_decl.map(|specs| specs.into_iter().map(Decl::Type).collect()),
        var_decl.map(|specs| specs.into_iter().map(Decl::Var).collect()),
        const_decl.map(|specs| specs.into_iter().map(Decl::Const).collect()),
    ));

    // ── File ──

    just(Token::Package)
        .ignore_then(ident)
        .then_ignore(semis.clone())
        .then(
            import_decl
                .then_ignore(semis.clone())
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then(
            top_decl
                .separated_by(semis.clone())
                .allow_trailing()
                .collect::<Vec<Vec<Decl>>>(),
        )
        .map_with(|((package, imports), decls), e| File {
            package,
            imports: imports.into_iter().flatten().collect(),
            decls: decls.into_iter().flatten().collect(),
            span: e.span(),
        })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> File {
        let result = parse(source);
        assert!(
            result.errors.is_empty(),
            "unexpected errors: {:#?}",
            result.errors
        );
        result.file.expect("expected file")
    }

    fn parse_errs(source: &str) -> Vec<Rich<'static, Token, SimpleSpan>> {
        parse(source).errors
    }

    fn only_func(file: &File) -> &FuncDecl {
        let funcs: Vec<&FuncDecl> = file
            .decls
            .iter()
            .filter_map(|d| match d {
                Decl::Func(f) => Some(f),
                _ => None,
            })
            .collect();
        assert_eq!(funcs.len(), 1, "expected exactly one func");
        funcs[0]
    }

    fn body_of(source: &str) -> Vec<Stmt> {
        let file = parse_ok(source);
        only_func(&file)
            .body
            .clone()
            .expect("expected body")
            .stmts
    }

    #[test]
    fn package_only() {
        let file = parse_ok("package main\n");
        assert_eq!(file.package.name, "main");
        assert!(file.imports.is_empty());
        assert!(file.decls.is_empty());
    }

    #[test]
    fn imports_single_and_grouped() {
        let file = parse_ok("package p\n\nimport \"context\"\nimport (\n\t\"fmt\"\n\txctx \"golang.org/x/net/context\"\n)\n");
        assert_eq!(file.imports.len(), 3);
        assert_eq!(file.imports[0].path, "context");
        assert!(file.imports[0].name.is_none());
        assert_eq!(file.imports[2].path, "golang.org/x/net/context");
        assert_eq!(file.imports[2].name.as_ref().map(|n| n.name.as_str()), Some("xctx"));
    }

    #[test]
    fn func_with_named_params_and_results() {
        let file = parse_ok(
            "package p\nfunc WithCancel(parent Context) (ctx Context, cancel CancelFunc)\n",
        );
        let f = only_func(&file);
        assert!(f.body.is_none());
        assert_eq!(f.sig.params.len(), 1);
        assert_eq!(f.sig.params[0].names[0].name, "parent");
        assert_eq!(f.sig.results.len(), 2);
        assert_eq!(f.sig.results[1].names[0].name, "cancel");
    }

    #[test]
    fn unnamed_results_and_grouped_params() {
        let file =
            parse_ok("package p\nfunc WithValue(parent Context, key, val any) (Context, error)\n");
        let f = only_func(&file);
        assert_eq!(f.sig.params.len(), 2);
        assert_eq!(f.sig.params[1].names.len(), 2);
        assert!(f.sig.results.iter().all(|r| r.names.is_empty()));
    }

    #[test]
    fn qualified_param_type() {
        let file = parse_ok("package p\nfunc f(ctx context.Context) {}\n");
        let f = only_func(&file);
        assert!(matches!(
            &f.sig.params[0].ty.kind,
            TypeExprKind::Qualified(pkg, name) if pkg.name == "context" && name.name == "Context"
        ));
    }

    #[test]
    fn variadic_param() {
        let file = parse_ok("package p\nfunc Println(a ...any)\n");
        assert!(only_func(&file).sig.is_variadic());
    }

    #[test]
    fn mixed_named_and_unnamed_rejected() {
        assert!(!parse_errs("package p\nfunc f(x int, string) {}\n").is_empty());
    }

    #[test]
    fn method_with_receiver() {
        let file = parse_ok("package p\nfunc (s *Server) Serve(ctx Context) error {\n\treturn nil\n}\n");
        let f = only_func(&file);
        let recv = f.recv.as_ref().expect("receiver");
        assert_eq!(recv.names[0].name, "s");
        assert!(matches!(recv.ty.kind, TypeExprKind::Pointer(_)));
    }

    #[test]
    fn type_decls() {
        let file = parse_ok(
            "package p\ntype Context = context.Context\ntype (\n\tCancelFunc func()\n\tServer struct {\n\t\tctx Context\n\t\tname string\n\t}\n)\n",
        );
        let specs: Vec<&TypeSpec> = file
            .decls
            .iter()
            .filter_map(|d| match d {
                Decl::Type(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(specs.len(), 3);
        assert!(specs[0].alias);
        assert!(!specs[1].alias);
        assert!(matches!(&specs[2].ty.kind, TypeExprKind::Struct(fields) if fields.len() == 2));
    }

    #[test]
    fn interface_type() {
        let file = parse_ok(
            "package p\ntype Context interface {\n\tDone() <-chan struct{}\n\tErr() error\n}\n",
        );
        let Decl::Type(spec) = &file.decls[0] else {
            panic!("expected type decl")
        };
        let TypeExprKind::Interface(methods) = &spec.ty.kind else {
            panic!("expected interface")
        };
        assert_eq!(methods.len(), 2);
        assert!(matches!(
            &methods[0].sig.results[0].ty.kind,
            TypeExprKind::Chan { recv_only: true, .. }
        ));
    }

    #[test]
    fn short_var_and_assign() {
        let stmts = body_of(
            "package p\nfunc f(ctx Context) {\n\tctx, cancel := WithCancel(ctx)\n\tctx = WithValue(ctx, 1, 2)\n\tdefer cancel()\n}\n",
        );
        assert_eq!(stmts.len(), 3);
        assert!(matches!(&stmts[0].kind, StmtKind::ShortVar { lhs, rhs } if lhs.len() == 2 && rhs.len() == 1));
        assert!(matches!(
            &stmts[1].kind,
            StmtKind::Assign { op: AssignOp::Assign, lhs, .. } if lhs.len() == 1
        ));
        assert!(matches!(&stmts[2].kind, StmtKind::Defer(_)));
    }

    #[test]
    fn short_var_rejects_non_name() {
        assert!(!parse_errs("package p\nfunc f() {\n\ts.x := 1\n}\n").is_empty());
    }

    #[test]
    fn if_with_init_and_else_if() {
        let stmts = body_of(
            "package p\nfunc f() {\n\tif err := g(); err != nil {\n\t\treturn\n\t} else if x {\n\t} else {\n\t}\n}\n",
        );
        let StmtKind::If(ifs) = &stmts[0].kind else {
            panic!("expected if")
        };
        assert!(ifs.init.is_some());
        let els = ifs.els.as_ref().expect("else");
        let StmtKind::If(inner) = &els.kind else {
            panic!("expected else-if")
        };
        assert!(matches!(
            inner.els.as_deref().map(|s| &s.kind),
            Some(StmtKind::Block(_))
        ));
    }

    #[test]
    fn for_forms() {
        let stmts = body_of(
            "package p\nfunc f() {\n\tfor {\n\t}\n\tfor x < 3 {\n\t}\n\tfor i := 0; i < 10; i++ {\n\t\tcontinue\n\t}\n}\n",
        );
        assert_eq!(stmts.len(), 3);
        let kinds: Vec<(bool, bool, bool)> = stmts
            .iter()
            .map(|s| match &s.kind {
                StmtKind::For(f) => (f.init.is_some(), f.cond.is_some(), f.post.is_some()),
                other => panic!("expected for, got {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![(false, false, false), (false, true, false), (true, true, true)]
        );
    }

    #[test]
    fn binary_precedence() {
        let stmts = body_of("package p\nfunc f() {\n\tx = a + b * c == d && e\n}\n");
        let StmtKind::Assign { rhs, .. } = &stmts[0].kind else {
            panic!("expected assign")
        };
        let ExprKind::Binary(BinaryOp::And, lhs, _) = &rhs[0].kind else {
            panic!("expected && at root")
        };
        let ExprKind::Binary(BinaryOp::Eq, sum, _) = &lhs.kind else {
            panic!("expected == under &&")
        };
        assert!(matches!(&sum.kind, ExprKind::Binary(BinaryOp::Add, _, rhs) if matches!(rhs.kind, ExprKind::Binary(BinaryOp::Mul, _, _))));
    }

    #[test]
    fn selector_call_chain_and_receive() {
        let stmts = body_of("package p\nfunc f() {\n\t<-ctx.Done()\n}\n");
        let StmtKind::Expr(e) = &stmts[0].kind else {
            panic!("expected expression statement")
        };
        let ExprKind::Unary(UnaryOp::Recv, inner) = &e.kind else {
            panic!("expected receive")
        };
        assert!(matches!(&inner.kind, ExprKind::Call { callee, .. } if matches!(callee.kind, ExprKind::Selector(_, _))));
    }

    #[test]
    fn func_literal_in_go_stmt() {
        let stmts = body_of(
            "package p\nfunc f(ctx Context) {\n\tgo func() {\n\t\tctx = g(ctx)\n\t}()\n}\n",
        );
        let StmtKind::Go(call) = &stmts[0].kind else {
            panic!("expected go")
        };
        assert!(matches!(&call.kind, ExprKind::Call { callee, .. } if matches!(callee.kind, ExprKind::FuncLit(_, _))));
    }

    #[test]
    fn ident_spans_are_byte_offsets() {
        let src = "package p\nfunc f(ctx Context) {}\n";
        let file = parse_ok(src);
        let name = &only_func(&file).sig.params[0].names[0];
        assert_eq!(&src[name.span.start..name.span.end], "ctx");
    }

    #[test]
    fn syntax_error_reported() {
        assert!(!parse_errs("package p\nfunc f( {\n").is_empty());
        assert!(!parse_errs("package p\nfunc f() {\n\tgoto done\n}\n").is_empty());
    }

    #[test]
    fn const_group_repeats_previous_values() {
        let file = parse_ok(
            "package p\n\nconst (\n\tA = iota\n\tB\n\tC\n)\n\nconst D, E string = \"d\", \"e\"\n",
        );
        let specs: Vec<&VarSpec> = file
            .decls
            .iter()
            .filter_map(|d| match d {
                Decl::Const(spec) => Some(spec),
                _ => None,
            })
            .collect();
        assert_eq!(specs.len(), 4);
        assert_eq!(specs[1].names[0].name, "B");
        assert_eq!(specs[1].values, specs[0].values);
        assert_eq!(specs[2].values.len(), 1);
        assert!(specs[3].ty.is_some());
    }

    #[test]
    fn const_without_value_rejected() {
        assert!(!parse_errs("package p\nconst A\n").is_empty());
        assert!(!parse_errs("package p\nconst (\n\tA = 1\n\tB int\n)\n").is_empty());
    }

    #[test]
    fn grouped_var_and_const_in_body() {
        let stmts = body_of(
            "package p\nfunc f() {\n\tvar (\n\t\ta int\n\t\tb = 2\n\t)\n\tconst limit = 3\n}\n",
        );
        assert!(matches!(&stmts[0].kind, StmtKind::Var(specs) if specs.len() == 2));
        assert!(matches!(&stmts[1].kind, StmtKind::Const(specs) if specs.len() == 1));
    }

    #[test]
    fn range_forms() {
        let stmts = body_of(
            "package p\nfunc f() {\n\tfor range ch {\n\t}\n\tfor i := range xs {\n\t}\n\tfor k, v = range m {\n\t}\n}\n",
        );
        let ranges: Vec<&RangeStmt> = stmts
            .iter()
            .map(|s| match &s.kind {
                StmtKind::Range(r) => r,
                other => panic!("expected range, got {other:?}"),
            })
            .collect();
        assert!(ranges[0].key.is_none() && !ranges[0].define);
        assert!(ranges[1].key.is_some() && ranges[1].value.is_none() && ranges[1].define);
        assert!(ranges[2].value.is_some() && !ranges[2].define);
    }

    #[test]
    fn range_define_requires_names() {
        assert!(!parse_errs("package p\nfunc f() {\n\tfor s.x := range xs {\n\t}\n}\n").is_empty());
    }

    #[test]
    fn expression_switch_with_init_and_fallthrough() {
        let stmts = body_of(
            "package p\nfunc f() {\n\tswitch x := g(); x {\n\tcase 1, 2:\n\t\th()\n\t\tfallthrough\n\tcase 3:\n\tdefault:\n\t\treturn\n\t}\n}\n",
        );
        let StmtKind::Switch(sw) = &stmts[0].kind else {
            panic!("expected switch")
        };
        assert!(sw.init.is_some());
        assert!(matches!(&sw.kind, SwitchKind::Expr(Some(_))));
        assert_eq!(sw.clauses.len(), 3);
        assert_eq!(sw.clauses[0].exprs.as_ref().map(Vec::len), Some(2));
        assert!(matches!(sw.clauses[0].body[1].kind, StmtKind::Fallthrough));
        assert!(sw.clauses[1].body.is_empty());
        assert!(sw.clauses[2].exprs.is_none());
    }

    #[test]
    fn tagless_switch() {
        let stmts = body_of("package p\nfunc f() {\n\tswitch {\n\tcase x > 1:\n\t}\n}\n");
        assert!(matches!(&stmts[0].kind, StmtKind::Switch(sw) if sw.kind == SwitchKind::Expr(None)));
    }

    #[test]
    fn type_switch_guard() {
        let stmts = body_of(
            "package p\nfunc f(v any) {\n\tswitch t := v.(type) {\n\tcase *T, []int, nil:\n\t\t_ = t\n\t}\n}\n",
        );
        let StmtKind::Switch(sw) = &stmts[0].kind else {
            panic!("expected switch")
        };
        let SwitchKind::Type { bind, subject } = &sw.kind else {
            panic!("expected type switch")
        };
        assert_eq!(bind.as_ref().map(|b| b.name.as_str()), Some("t"));
        assert!(matches!(&subject.kind, ExprKind::Ident(id) if id.name == "v"));
        let types = sw.clauses[0].exprs.as_ref().expect("case list");
        assert!(matches!(&types[0].kind, ExprKind::Unary(UnaryOp::Deref, _)));
        assert!(matches!(&types[1].kind, ExprKind::Type(_)));
    }

    #[test]
    fn select_clauses() {
        let stmts = body_of(
            "package p\nfunc f() {\n\tselect {\n\tcase <-ctx.Done():\n\t\treturn\n\tcase v, ok := <-ch:\n\t\t_, _ = v, ok\n\tcase out <- 1:\n\tdefault:\n\t}\n}\n",
        );
        let StmtKind::Select(clauses) = &stmts[0].kind else {
            panic!("expected select")
        };
        let comms: Vec<Option<&StmtKind>> = clauses
            .iter()
            .map(|c| c.comm.as_deref().map(|s| &s.kind))
            .collect();
        assert!(matches!(comms[0], Some(StmtKind::Expr(_))));
        assert!(matches!(comms[1], Some(StmtKind::ShortVar { lhs, .. }) if lhs.len() == 2));
        assert!(matches!(comms[2], Some(StmtKind::Send { .. })));
        assert!(comms[3].is_none());
    }

    #[test]
    fn composite_literals() {
        let stmts = body_of(
            "package p\nfunc f() {\n\ts := &Server{name: \"a\", ctx: ctx}\n\tm := map[string][]int{\"a\": {1, 2}}\n\tps := []pkg.Point{{1, 2}, {X: 3}}\n}\n",
        );
        let rhs = |i: usize| match &stmts[i].kind {
            StmtKind::ShortVar { rhs, .. } => rhs[0].clone(),
            other => panic!("expected :=, got {other:?}"),
        };
        let ExprKind::Unary(UnaryOp::Addr, lit) = rhs(0).kind else {
            panic!("expected &T{{}}")
        };
        let ExprKind::CompositeLit { ty: Some(ty), elems } = &lit.kind else {
            panic!("expected literal")
        };
        assert!(matches!(&ty.kind, TypeExprKind::Name(n) if n.name == "Server"));
        assert!(elems.iter().all(|e| e.key.is_some()));

        let ExprKind::CompositeLit { ty: Some(ty), elems } = rhs(1).kind else {
            panic!("expected map literal")
        };
        assert!(matches!(ty.kind, TypeExprKind::Map { .. }));
        assert!(matches!(&elems[0].value.kind, ExprKind::CompositeLit { ty: None, elems } if elems.len() == 2));

        let ExprKind::CompositeLit { ty: Some(ty), elems } = rhs(2).kind else {
            panic!("expected slice literal")
        };
        assert!(matches!(&ty.kind, TypeExprKind::Slice(elem) if matches!(elem.kind, TypeExprKind::Qualified(..))));
        assert_eq!(elems.len(), 2);
    }

    #[test]
    fn bare_type_literal_not_taken_in_if_header() {
        // `ok {` opens the body, not a literal of type `ok`.
        let stmts = body_of("package p\nfunc f() {\n\tif ok {\n\t}\n\tfor done {\n\t}\n}\n");
        assert!(matches!(&stmts[0].kind, StmtKind::If(ifs) if matches!(ifs.cond.kind, ExprKind::Ident(_))));
        assert!(matches!(&stmts[1].kind, StmtKind::For(f) if f.cond.is_some()));
        // Parenthesised, the literal is allowed.
        let stmts = body_of("package p\nfunc f() {\n\tif p == (T{}) {\n\t}\n}\n");
        assert!(matches!(&stmts[0].kind, StmtKind::If(_)));
    }

    #[test]
    fn conversions_assertions_slices_and_spread() {
        let stmts = body_of(
            "package p\nfunc f() {\n\tb := []byte(s)[1:]\n\tn, ok := v.(int)\n\tg(xs...)\n}\n",
        );
        let StmtKind::ShortVar { rhs, .. } = &stmts[0].kind else {
            panic!("expected :=")
        };
        let ExprKind::SliceExpr { base, lo, hi } = &rhs[0].kind else {
            panic!("expected slice expression")
        };
        assert!(lo.is_some() && hi.is_none());
        assert!(matches!(&base.kind, ExprKind::Call { callee, .. } if matches!(callee.kind, ExprKind::Type(_))));
        let StmtKind::ShortVar { lhs, rhs } = &stmts[1].kind else {
            panic!("expected :=")
        };
        assert_eq!(lhs.len(), 2);
        assert!(matches!(&rhs[0].kind, ExprKind::TypeAssert(_, Some(_))));
        let StmtKind::Expr(call) = &stmts[2].kind else {
            panic!("expected call")
        };
        assert!(matches!(&call.kind, ExprKind::Call { spread: true, .. }));
    }

    #[test]
    fn unicode_identifiers_parse() {
        let src = "package p\nfunc f(contexte Context) {\n\tgröße := 1\n\t_ = größe\n}\n";
        let stmts = body_of(src);
        let StmtKind::ShortVar { lhs, .. } = &stmts[0].kind else {
            panic!("expected :=")
        };
        assert_eq!(lhs[0].name, "größe");
        assert_eq!(&src[lhs[0].span.start..lhs[0].span.end], "größe");
    }
}
