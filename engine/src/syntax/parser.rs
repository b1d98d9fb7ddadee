//! Recursive-descent parser from [`super::lexer::Token`] to [`super::ast`].
//!
//! Expression parsing is precedence-climbing over a fixed operator table;
//! statement parsing is a straightforward dispatch on the leading keyword.

use super::ast::*;
use super::lexer::Token;
use std::rc::Rc;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

type PResult<T> = Result<T, String>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn is_punct(&self, p: &str) -> bool {
        matches!(self.peek(), Token::Punct(x) if *x == p)
    }

    fn is_keyword(&self, k: &str) -> bool {
        matches!(self.peek(), Token::Keyword(x) if *x == k)
    }

    fn eat_punct(&mut self, p: &str) -> PResult<()> {
        if self.is_punct(p) {
            self.advance();
            Ok(())
        } else {
            Err(format!("expected '{p}', found {:?}", self.peek()))
        }
    }

    fn eat_keyword(&mut self, k: &str) -> PResult<()> {
        if self.is_keyword(k) {
            self.advance();
            Ok(())
        } else {
            Err(format!("expected keyword '{k}', found {:?}", self.peek()))
        }
    }

    fn eat_semi(&mut self) {
        if self.is_punct(";") {
            self.advance();
        }
    }

    fn ident_name(&mut self) -> PResult<String> {
        match self.advance() {
            Token::Ident(s) => Ok(s),
            Token::Keyword(k) if matches!(k, "get" | "set" | "of" | "static" | "async") => Ok(k.to_string()),
            other => Err(format!("expected identifier, found {other:?}")),
        }
    }

    pub fn parse_program(mut self) -> PResult<Program> {
        let mut stmts = Vec::new();
        while !matches!(self.peek(), Token::Eof) {
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> PResult<Stmt> {
        match self.peek().clone() {
            Token::Punct("{") => self.parse_block().map(Stmt::Block),
            Token::Punct(";") => {
                self.advance();
                Ok(Stmt::Empty)
            }
            Token::Keyword("var") | Token::Keyword("let") | Token::Keyword("const") => {
                let stmt = self.parse_var_decl()?;
                self.eat_semi();
                Ok(stmt)
            }
            Token::Keyword("function") => self.parse_function_decl(),
            Token::Keyword("if") => self.parse_if(),
            Token::Keyword("while") => self.parse_while(),
            Token::Keyword("do") => self.parse_do_while(),
            Token::Keyword("for") => self.parse_for(),
            Token::Keyword("return") => {
                self.advance();
                let value = if self.is_punct(";") || self.is_punct("}") || matches!(self.peek(), Token::Eof) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.eat_semi();
                Ok(Stmt::Return(value))
            }
            Token::Keyword("break") => {
                self.advance();
                let label = if let Token::Ident(name) = self.peek().clone() {
                    self.advance();
                    Some(name)
                } else {
                    None
                };
                self.eat_semi();
                Ok(Stmt::Break(label))
            }
            Token::Keyword("continue") => {
                self.advance();
                let label = if let Token::Ident(name) = self.peek().clone() {
                    self.advance();
                    Some(name)
                } else {
                    None
                };
                self.eat_semi();
                Ok(Stmt::Continue(label))
            }
            Token::Keyword("throw") => {
                self.advance();
                let expr = self.parse_expr()?;
                self.eat_semi();
                Ok(Stmt::Throw(expr))
            }
            Token::Keyword("try") => self.parse_try(),
            Token::Ident(name) if matches!(self.tokens.get(self.pos + 1), Some(Token::Punct(":"))) => {
                self.advance();
                self.advance();
                let body = self.parse_stmt()?;
                Ok(Stmt::Labeled { label: name, body: Box::new(body) })
            }
            _ => {
                let expr = self.parse_expr()?;
                self.eat_semi();
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_block(&mut self) -> PResult<Vec<Stmt>> {
        self.eat_punct("{")?;
        let mut stmts = Vec::new();
        while !self.is_punct("}") && !matches!(self.peek(), Token::Eof) {
            stmts.push(self.parse_stmt()?);
        }
        self.eat_punct("}")?;
        Ok(stmts)
    }

    fn decl_kind(&mut self) -> PResult<DeclKind> {
        match self.advance() {
            Token::Keyword("var") => Ok(DeclKind::Var),
            Token::Keyword("let") => Ok(DeclKind::Let),
            Token::Keyword("const") => Ok(DeclKind::Const),
            other => Err(format!("expected var/let/const, found {other:?}")),
        }
    }

    fn parse_var_decl(&mut self) -> PResult<Stmt> {
        let kind = self.decl_kind()?;
        let mut declarations = Vec::new();
        loop {
            let name = self.ident_name()?;
            let init = if self.is_punct("=") {
                self.advance();
                Some(self.parse_assign_expr()?)
            } else {
                None
            };
            declarations.push((name, init));
            if self.is_punct(",") {
                self.advance();
                continue;
            }
            break;
        }
        Ok(Stmt::VarDecl { kind, declarations })
    }

    fn parse_function_decl(&mut self) -> PResult<Stmt> {
        let def = self.parse_function_common(false, false)?;
        Ok(Stmt::FunctionDecl(Rc::new(def)))
    }

    fn parse_function_common(&mut self, is_async: bool, is_arrow: bool) -> PResult<FunctionDef> {
        self.eat_keyword("function")?;
        let is_generator = if self.is_punct("*") {
            self.advance();
            true
        } else {
            false
        };
        let name = if let Token::Ident(n) = self.peek().clone() {
            self.advance();
            Some(n)
        } else {
            None
        };
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(FunctionDef { name, params, body: Rc::new(body), is_arrow, is_generator, is_async })
    }

    fn parse_params(&mut self) -> PResult<Vec<Param>> {
        self.eat_punct("(")?;
        let mut params = Vec::new();
        while !self.is_punct(")") {
            let rest = if self.is_punct("...") {
                self.advance();
                true
            } else {
                false
            };
            let name = self.ident_name()?;
            let default = if self.is_punct("=") {
                self.advance();
                Some(self.parse_assign_expr()?)
            } else {
                None
            };
            params.push(Param { name, default, rest });
            if self.is_punct(",") {
                self.advance();
            } else {
                break;
            }
        }
        self.eat_punct(")")?;
        Ok(params)
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        self.eat_keyword("if")?;
        self.eat_punct("(")?;
        let cond = self.parse_expr()?;
        self.eat_punct(")")?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.is_keyword("else") {
            self.advance();
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(Stmt::If { cond, then_branch, else_branch })
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        self.eat_keyword("while")?;
        self.eat_punct("(")?;
        let cond = self.parse_expr()?;
        self.eat_punct(")")?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::While { cond, body })
    }

    fn parse_do_while(&mut self) -> PResult<Stmt> {
        self.eat_keyword("do")?;
        let body = Box::new(self.parse_stmt()?);
        self.eat_keyword("while")?;
        self.eat_punct("(")?;
        let cond = self.parse_expr()?;
        self.eat_punct(")")?;
        self.eat_semi();
        Ok(Stmt::DoWhile { cond, body })
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        self.eat_keyword("for")?;
        self.eat_punct("(")?;

        // for-of / for-in: `for (let x of iterable)` / `for (let x in obj)`
        if matches!(self.peek(), Token::Keyword("var") | Token::Keyword("let") | Token::Keyword("const")) {
            let checkpoint = self.pos;
            let kind = self.decl_kind()?;
            if let Token::Ident(name) = self.peek().clone() {
                self.advance();
                if self.is_keyword("of") {
                    self.advance();
                    let iterable = self.parse_assign_expr()?;
                    self.eat_punct(")")?;
                    let body = Box::new(self.parse_stmt()?);
                    return Ok(Stmt::ForOf { kind, binding: name, iterable, body });
                }
                if self.is_keyword("in") {
                    self.advance();
                    let object = self.parse_assign_expr()?;
                    self.eat_punct(")")?;
                    let body = Box::new(self.parse_stmt()?);
                    return Ok(Stmt::ForIn { kind, binding: name, object, body });
                }
            }
            self.pos = checkpoint;
        }

        let init = if self.is_punct(";") {
            None
        } else if matches!(self.peek(), Token::Keyword("var") | Token::Keyword("let") | Token::Keyword("const")) {
            Some(Box::new(self.parse_var_decl()?))
        } else {
            Some(Box::new(Stmt::Expr(self.parse_expr()?)))
        };
        self.eat_punct(";")?;
        let cond = if self.is_punct(";") { None } else { Some(self.parse_expr()?) };
        self.eat_punct(";")?;
        let update = if self.is_punct(")") { None } else { Some(self.parse_expr()?) };
        self.eat_punct(")")?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::For { init, cond, update, body })
    }

    fn parse_try(&mut self) -> PResult<Stmt> {
        self.eat_keyword("try")?;
        let block = self.parse_block()?;
        let mut catch_param = None;
        let mut catch_block = None;
        if self.is_keyword("catch") {
            self.advance();
            if self.is_punct("(") {
                self.advance();
                catch_param = Some(self.ident_name()?);
                self.eat_punct(")")?;
            }
            catch_block = Some(self.parse_block()?);
        }
        let finally_block = if self.is_keyword("finally") {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Stmt::Try { block, catch_param, catch_block, finally_block })
    }

    // --- expressions, lowest to highest precedence ---

    fn parse_expr(&mut self) -> PResult<Expr> {
        let first = self.parse_assign_expr()?;
        if self.is_punct(",") {
            let mut exprs = vec![first];
            while self.is_punct(",") {
                self.advance();
                exprs.push(self.parse_assign_expr()?);
            }
            return Ok(Expr::Sequence(exprs));
        }
        Ok(first)
    }

    fn parse_assign_expr(&mut self) -> PResult<Expr> {
        if self.is_keyword("async") && matches!(self.tokens.get(self.pos + 1), Some(Token::Keyword("function"))) {
            self.advance();
            let def = self.parse_function_common(true, false)?;
            return Ok(Expr::FunctionExpr(Rc::new(def)));
        }
        if self.is_keyword("function") {
            let def = self.parse_function_common(false, false)?;
            return Ok(Expr::FunctionExpr(Rc::new(def)));
        }
        if let Some(arrow) = self.try_parse_arrow()? {
            return Ok(arrow);
        }

        let left = self.parse_conditional()?;

        const ASSIGN_OPS: &[(&str, Option<BinOp>)] = &[
            ("=", None),
            ("+=", Some(BinOp::Add)),
            ("-=", Some(BinOp::Sub)),
            ("*=", Some(BinOp::Mul)),
            ("/=", Some(BinOp::Div)),
            ("%=", Some(BinOp::Mod)),
            ("**=", Some(BinOp::Exp)),
        ];
        if let Token::Punct(p) = self.peek() {
            if let Some((_, op)) = ASSIGN_OPS.iter().find(|(sym, _)| sym == p) {
                let op = *op;
                self.advance();
                let value = self.parse_assign_expr()?;
                return Ok(Expr::Assign { op, target: Box::new(left), value: Box::new(value) });
            }
        }
        Ok(left)
    }

    /// Tries to parse `(params) => body` or `ident => body`, backtracking on
    /// failure since `(` also starts a parenthesized expression.
    fn try_parse_arrow(&mut self) -> PResult<Option<Expr>> {
        let checkpoint = self.pos;
        let params = if let Token::Ident(name) = self.peek().clone() {
            if matches!(self.tokens.get(self.pos + 1), Some(Token::Punct("=>"))) {
                self.advance();
                vec![Param { name, default: None, rest: false }]
            } else {
                return Ok(None);
            }
        } else if self.is_punct("(") {
            match self.parse_params() {
                Ok(p) if self.is_punct("=>") => p,
                _ => {
                    self.pos = checkpoint;
                    return Ok(None);
                }
            }
        } else {
            return Ok(None);
        };
        self.eat_punct("=>")?;
        let body = if self.is_punct("{") {
            self.parse_block()?
        } else {
            vec![Stmt::Return(Some(self.parse_assign_expr()?))]
        };
        Ok(Some(Expr::FunctionExpr(Rc::new(FunctionDef {
            name: None,
            params,
            body: Rc::new(body),
            is_arrow: true,
            is_generator: false,
            is_async: false,
        }))))
    }

    fn parse_conditional(&mut self) -> PResult<Expr> {
        let cond = self.parse_nullish_coalesce()?;
        if self.is_punct("?") {
            self.advance();
            let then_expr = self.parse_assign_expr()?;
            self.eat_punct(":")?;
            let else_expr = self.parse_assign_expr()?;
            return Ok(Expr::Conditional { cond: Box::new(cond), then_expr: Box::new(then_expr), else_expr: Box::new(else_expr) });
        }
        Ok(cond)
    }

    fn parse_nullish_coalesce(&mut self) -> PResult<Expr> {
        let mut left = self.parse_logical_or()?;
        while self.is_punct("??") {
            self.advance();
            let right = self.parse_logical_or()?;
            left = Expr::Logical { op: LogicalOp::NullishCoalesce, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_logical_or(&mut self) -> PResult<Expr> {
        let mut left = self.parse_logical_and()?;
        while self.is_punct("||") {
            self.advance();
            let right = self.parse_logical_and()?;
            left = Expr::Logical { op: LogicalOp::Or, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> PResult<Expr> {
        let mut left = self.parse_bitwise_or()?;
        while self.is_punct("&&") {
            self.advance();
            let right = self.parse_bitwise_or()?;
            left = Expr::Logical { op: LogicalOp::And, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn binop_level(&mut self, ops: &[(&str, BinOp)], next: fn(&mut Self) -> PResult<Expr>) -> PResult<Expr> {
        let mut left = next(self)?;
        loop {
            let matched = if let Token::Punct(p) = self.peek() {
                ops.iter().find(|(sym, _)| sym == p).map(|(_, op)| *op)
            } else {
                None
            };
            match matched {
                Some(op) => {
                    self.advance();
                    let right = next(self)?;
                    left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
                }
                None => break,
            }
        }
        Ok(left)
    }

    fn parse_bitwise_or(&mut self) -> PResult<Expr> {
        self.binop_level(&[("|", BinOp::BitOr)], Self::parse_bitwise_xor)
    }
    fn parse_bitwise_xor(&mut self) -> PResult<Expr> {
        self.binop_level(&[("^", BinOp::BitXor)], Self::parse_bitwise_and)
    }
    fn parse_bitwise_and(&mut self) -> PResult<Expr> {
        self.binop_level(&[("&", BinOp::BitAnd)], Self::parse_equality)
    }
    fn parse_equality(&mut self) -> PResult<Expr> {
        self.binop_level(
            &[("===", BinOp::StrictEq), ("!==", BinOp::StrictNotEq), ("==", BinOp::Eq), ("!=", BinOp::NotEq)],
            Self::parse_relational,
        )
    }
    fn parse_relational(&mut self) -> PResult<Expr> {
        let mut left = self.parse_shift()?;
        loop {
            let op = match self.peek() {
                Token::Punct("<") => Some(BinOp::Lt),
                Token::Punct(">") => Some(BinOp::Gt),
                Token::Punct("<=") => Some(BinOp::LtEq),
                Token::Punct(">=") => Some(BinOp::GtEq),
                Token::Keyword("instanceof") => Some(BinOp::InstanceOf),
                Token::Keyword("in") => Some(BinOp::In),
                _ => None,
            };
            match op {
                Some(op) => {
                    self.advance();
                    let right = self.parse_shift()?;
                    left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
                }
                None => break,
            }
        }
        Ok(left)
    }
    fn parse_shift(&mut self) -> PResult<Expr> {
        self.binop_level(&[("<<", BinOp::Shl), (">>>", BinOp::UShr), (">>", BinOp::Shr)], Self::parse_additive)
    }
    fn parse_additive(&mut self) -> PResult<Expr> {
        self.binop_level(&[("+", BinOp::Add), ("-", BinOp::Sub)], Self::parse_multiplicative)
    }
    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        self.binop_level(&[("*", BinOp::Mul), ("/", BinOp::Div), ("%", BinOp::Mod)], Self::parse_exponent)
    }
    fn parse_exponent(&mut self) -> PResult<Expr> {
        let left = self.parse_unary()?;
        if self.is_punct("**") {
            self.advance();
            let right = self.parse_exponent()?;
            return Ok(Expr::Binary { op: BinOp::Exp, left: Box::new(left), right: Box::new(right) });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let op = match self.peek() {
            Token::Punct("-") => Some(UnaryOp::Neg),
            Token::Punct("+") => Some(UnaryOp::Plus),
            Token::Punct("!") => Some(UnaryOp::Not),
            Token::Punct("~") => Some(UnaryOp::BitNot),
            Token::Keyword("typeof") => Some(UnaryOp::TypeOf),
            Token::Keyword("void") => Some(UnaryOp::Void),
            Token::Keyword("delete") => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary { op, expr: Box::new(expr) });
        }
        if self.is_punct("++") || self.is_punct("--") {
            let op = if self.is_punct("++") { UpdateOp::Increment } else { UpdateOp::Decrement };
            self.advance();
            let target = self.parse_unary()?;
            return Ok(Expr::Update { op, prefix: true, target: Box::new(target) });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let expr = self.parse_call_or_member()?;
        if self.is_punct("++") || self.is_punct("--") {
            let op = if self.is_punct("++") { UpdateOp::Increment } else { UpdateOp::Decrement };
            self.advance();
            return Ok(Expr::Update { op, prefix: false, target: Box::new(expr) });
        }
        Ok(expr)
    }

    fn parse_call_or_member(&mut self) -> PResult<Expr> {
        let mut expr = if self.is_keyword("new") {
            self.advance();
            let callee = self.parse_member_only()?;
            let args = if self.is_punct("(") { self.parse_args()? } else { Vec::new() };
            Expr::New { callee: Box::new(callee), args }
        } else {
            self.parse_primary()?
        };

        loop {
            if self.is_punct(".") {
                self.advance();
                let name = self.ident_name()?;
                expr = Expr::Member { object: Box::new(expr), property: Box::new(Expr::StringLit(name)), computed: false, optional: false };
            } else if self.is_punct("?.") {
                self.advance();
                if self.is_punct("(") {
                    let args = self.parse_args()?;
                    expr = Expr::Call { callee: Box::new(expr), args, optional: true };
                } else {
                    let name = self.ident_name()?;
                    expr = Expr::Member { object: Box::new(expr), property: Box::new(Expr::StringLit(name)), computed: false, optional: true };
                }
            } else if self.is_punct("[") {
                self.advance();
                let prop = self.parse_expr()?;
                self.eat_punct("]")?;
                expr = Expr::Member { object: Box::new(expr), property: Box::new(prop), computed: true, optional: false };
            } else if self.is_punct("(") {
                let args = self.parse_args()?;
                expr = Expr::Call { callee: Box::new(expr), args, optional: false };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// `new` binds tighter than call: `new Foo.Bar(x)` parses `Foo.Bar` as
    /// the callee before consuming the one argument list.
    fn parse_member_only(&mut self) -> PResult<Expr> {
        let mut expr = if self.is_keyword("new") {
            self.advance();
            let callee = self.parse_member_only()?;
            let args = if self.is_punct("(") { self.parse_args()? } else { Vec::new() };
            Expr::New { callee: Box::new(callee), args }
        } else {
            self.parse_primary()?
        };
        loop {
            if self.is_punct(".") {
                self.advance();
                let name = self.ident_name()?;
                expr = Expr::Member { object: Box::new(expr), property: Box::new(Expr::StringLit(name)), computed: false, optional: false };
            } else if self.is_punct("[") {
                self.advance();
                let prop = self.parse_expr()?;
                self.eat_punct("]")?;
                expr = Expr::Member { object: Box::new(expr), property: Box::new(prop), computed: true, optional: false };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_args(&mut self) -> PResult<Vec<Expr>> {
        self.eat_punct("(")?;
        let mut args = Vec::new();
        while !self.is_punct(")") {
            if self.is_punct("...") {
                self.advance();
                args.push(Expr::SpreadElement(Box::new(self.parse_assign_expr()?)));
            } else {
                args.push(self.parse_assign_expr()?);
            }
            if self.is_punct(",") {
                self.advance();
            } else {
                break;
            }
        }
        self.eat_punct(")")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        match self.advance() {
            Token::Number(n) => Ok(Expr::NumberLit(n)),
            Token::String(s) => Ok(Expr::StringLit(s)),
            Token::TemplateString(quasis, expr_toks) => {
                let mut exprs = Vec::new();
                for toks in expr_toks {
                    exprs.push(Parser::new(toks).parse_expr_only()?);
                }
                Ok(Expr::TemplateLiteral { quasis, exprs })
            }
            Token::Ident(name) => Ok(Expr::Ident(name)),
            Token::Keyword("true") => Ok(Expr::BoolLit(true)),
            Token::Keyword("false") => Ok(Expr::BoolLit(false)),
            Token::Keyword("null") => Ok(Expr::NullLit),
            Token::Keyword("undefined") => Ok(Expr::UndefinedLit),
            Token::Keyword("this") => Ok(Expr::This),
            Token::Keyword(k @ ("get" | "set" | "of" | "static" | "async")) => Ok(Expr::Ident(k.to_string())),
            Token::Punct("(") => {
                let expr = self.parse_expr()?;
                self.eat_punct(")")?;
                Ok(expr)
            }
            Token::Punct("[") => {
                let mut elements = Vec::new();
                while !self.is_punct("]") {
                    if self.is_punct(",") {
                        elements.push(None);
                        self.advance();
                        continue;
                    }
                    if self.is_punct("...") {
                        self.advance();
                        elements.push(Some(Expr::SpreadElement(Box::new(self.parse_assign_expr()?))));
                    } else {
                        elements.push(Some(self.parse_assign_expr()?));
                    }
                    if self.is_punct(",") {
                        self.advance();
                    } else {
                        break;
                    }
                }
                self.eat_punct("]")?;
                Ok(Expr::ArrayLit(elements))
            }
            Token::Punct("{") => self.parse_object_lit(),
            other => Err(format!("unexpected token in expression: {other:?}")),
        }
    }

    fn parse_expr_only(mut self) -> PResult<Expr> {
        self.parse_expr()
    }

    fn parse_object_lit(&mut self) -> PResult<Expr> {
        let mut props = Vec::new();
        while !self.is_punct("}") {
            if self.is_punct("...") {
                self.advance();
                let expr = self.parse_assign_expr()?;
                props.push(PropertyDef { key: PropKey::Ident(String::new()), value: expr, is_getter: false, is_setter: false, is_method: false, is_spread: true });
                if self.is_punct(",") {
                    self.advance();
                }
                continue;
            }

            let is_getter = self.is_keyword("get") && !matches!(self.tokens.get(self.pos + 1), Some(Token::Punct(":")) | Some(Token::Punct("(")));
            let is_setter = self.is_keyword("set") && !matches!(self.tokens.get(self.pos + 1), Some(Token::Punct(":")) | Some(Token::Punct("(")));
            if is_getter || is_setter {
                self.advance();
            }

            let key = if self.is_punct("[") {
                self.advance();
                let e = self.parse_assign_expr()?;
                self.eat_punct("]")?;
                PropKey::Computed(Box::new(e))
            } else {
                match self.advance() {
                    Token::Ident(s) => PropKey::Ident(s),
                    Token::String(s) => PropKey::Ident(s),
                    Token::Number(n) => PropKey::Ident(crate::value::display_number(n)),
                    Token::Keyword(k) => PropKey::Ident(k.to_string()),
                    other => return Err(format!("unexpected object key: {other:?}")),
                }
            };

            if self.is_punct("(") {
                let params = self.parse_params()?;
                let body = self.parse_block()?;
                let def = FunctionDef { name: None, params, body: Rc::new(body), is_arrow: false, is_generator: false, is_async: false };
                props.push(PropertyDef { key, value: Expr::FunctionExpr(Rc::new(def)), is_getter, is_setter, is_method: true, is_spread: false });
            } else if is_getter || is_setter {
                return Err("expected '(' after get/set accessor name".into());
            } else if self.is_punct(":") {
                self.advance();
                let value = self.parse_assign_expr()?;
                props.push(PropertyDef { key, value, is_getter: false, is_setter: false, is_method: false, is_spread: false });
            } else if let PropKey::Ident(name) = &key {
                props.push(PropertyDef { key: key.clone(), value: Expr::Ident(name.clone()), is_getter: false, is_setter: false, is_method: false, is_spread: false });
            } else {
                return Err("expected ':' after computed property key".into());
            }

            if self.is_punct(",") {
                self.advance();
            } else {
                break;
            }
        }
        self.eat_punct("}")?;
        Ok(Expr::ObjectLit(props))
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::lex;
    use super::*;

    fn parse(src: &str) -> Program {
        Parser::new(lex(src).unwrap()).parse_program().unwrap()
    }

    #[test]
    fn parses_var_decl_and_binary_expr() {
        let prog = parse("let x = 1 + 2 * 3;");
        assert!(matches!(&prog[0], Stmt::VarDecl { kind: DeclKind::Let, .. }));
    }

    #[test]
    fn parses_if_else() {
        let prog = parse("if (a) { b; } else { c; }");
        assert!(matches!(&prog[0], Stmt::If { else_branch: Some(_), .. }));
    }

    #[test]
    fn parses_arrow_function() {
        let prog = parse("const f = (a, b) => a + b;");
        if let Stmt::VarDecl { declarations, .. } = &prog[0] {
            assert!(matches!(declarations[0].1, Some(Expr::FunctionExpr(_))));
        } else {
            panic!("expected var decl");
        }
    }

    #[test]
    fn parses_for_of() {
        let prog = parse("for (const x of arr) { sum = sum + x; }");
        assert!(matches!(&prog[0], Stmt::ForOf { .. }));
    }

    #[test]
    fn parses_member_and_call_chain() {
        let prog = parse("a.b[0](1, 2);");
        assert!(matches!(&prog[0], Stmt::Expr(Expr::Call { .. })));
    }
}
