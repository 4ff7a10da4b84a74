//! Tokens to AST: a standard recursive-descent parser over the small
//! surface grammar. Precedence climbing for binary expressions, one
//! function per grammar production otherwise.

use crate::ast::*;
use crate::error::{Error, Position, Result};
use crate::lexer::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    idx: usize,
}

pub fn parse(tokens: Vec<Token>) -> Result<Program> {
    Parser::new(tokens).parse_program()
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, idx: 0 }
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.idx].kind
    }

    fn pos(&self) -> Position {
        self.tokens[self.idx].pos
    }

    fn advance(&mut self) -> TokenKind {
        let tok = self.tokens[self.idx].kind.clone();
        if self.idx + 1 < self.tokens.len() {
            self.idx += 1;
        }
        tok
    }

    fn expect(&mut self, want: &TokenKind, what: &str) -> Result<()> {
        if self.peek() == want {
            self.advance();
            Ok(())
        } else {
            Err(Error::syntax(
                self.pos(),
                format!("expected {what}, found {:?}", self.peek()),
            ))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String> {
        match self.advance() {
            TokenKind::Ident(name) => Ok(name),
            other => Err(Error::syntax(
                self.pos(),
                format!("expected {what}, found {other:?}"),
            )),
        }
    }

    fn eat(&mut self, want: &TokenKind) -> bool {
        if self.peek() == want {
            self.advance();
            true
        } else {
            false
        }
    }

    // ---- declarations ----

    pub fn parse_program(&mut self) -> Result<Program> {
        let mut decls = Vec::new();
        while *self.peek() != TokenKind::Eof {
            decls.push(self.parse_decl()?);
        }
        Ok(Program { decls })
    }

    fn parse_type(&mut self) -> Result<Type> {
        let pos = self.pos();
        let ty = match self.advance() {
            TokenKind::Int => Type::Int,
            TokenKind::Bool => Type::Bool,
            TokenKind::Char => Type::Char,
            TokenKind::Void => Type::Void,
            other => return Err(Error::syntax(pos, format!("expected a type, found {other:?}"))),
        };
        Ok(ty)
    }

    fn elem_type(ty: Type, pos: Position) -> Result<ElemType> {
        match ty {
            Type::Int => Ok(ElemType::Int),
            Type::Bool => Ok(ElemType::Bool),
            Type::Char => Ok(ElemType::Char),
            Type::Void | Type::Array(..) => {
                Err(Error::semantic(pos, "arrays of void or arrays are not supported"))
            }
        }
    }

    fn parse_decl(&mut self) -> Result<Decl> {
        let pos = self.pos();
        let ty = self.parse_type()?;
        let name = self.expect_ident("a declaration name")?;

        if self.eat(&TokenKind::LParen) {
            return self.parse_function(name, ty, pos);
        }

        if self.eat(&TokenKind::LBracket) {
            let len_pos = self.pos();
            let len = match self.advance() {
                TokenKind::IntLit(n) if n > 0 => n as usize,
                _ => return Err(Error::syntax(len_pos, "expected a positive array length")),
            };
            self.expect(&TokenKind::RBracket, "']'")?;
            let elem = Self::elem_type(ty, pos)?;
            let init = if self.eat(&TokenKind::Assign) {
                self.expect(&TokenKind::LBrace, "'{' to start an array initializer")?;
                let mut values = Vec::new();
                if *self.peek() != TokenKind::RBrace {
                    values.push(self.parse_expr()?);
                    while self.eat(&TokenKind::Comma) {
                        values.push(self.parse_expr()?);
                    }
                }
                self.expect(&TokenKind::RBrace, "'}'")?;
                values
            } else {
                Vec::new()
            };
            self.expect(&TokenKind::Semicolon, "';'")?;
            return Ok(Decl::GlobalArray {
                name,
                elem,
                len,
                init,
                pos,
            });
        }

        let init = if self.eat(&TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(Decl::GlobalVar { name, ty, init, pos })
    }

    fn parse_function(&mut self, name: String, ret_type: Type, pos: Position) -> Result<Decl> {
        let mut params = Vec::new();
        if *self.peek() != TokenKind::RParen {
            loop {
                let ty = self.parse_type()?;
                let pname = self.expect_ident("a parameter name")?;
                params.push(Param { name: pname, ty });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;
        self.expect(&TokenKind::LBrace, "'{'")?;
        let body = self.parse_stmts_until_rbrace()?;
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(Decl::Function {
            name,
            ret_type,
            params,
            body,
            pos,
        })
    }

    // ---- statements ----

    fn parse_stmts_until_rbrace(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while *self.peek() != TokenKind::RBrace {
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Int | TokenKind::Bool | TokenKind::Char | TokenKind::Void
        )
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        let pos = self.pos();
        match self.peek() {
            TokenKind::LBrace => {
                self.advance();
                let body = self.parse_stmts_until_rbrace()?;
                self.expect(&TokenKind::RBrace, "'}'")?;
                Ok(Stmt::Block(body))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Break => {
                self.advance();
                self.expect(&TokenKind::Semicolon, "';'")?;
                Ok(Stmt::Break(pos))
            }
            TokenKind::Return => {
                self.advance();
                let value = if *self.peek() == TokenKind::Semicolon {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(&TokenKind::Semicolon, "';'")?;
                Ok(Stmt::Return(value, pos))
            }
            _ if self.starts_type() => self.parse_var_decl(),
            _ => self.parse_assign_or_expr_stmt(),
        }
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        let pos = self.pos();
        self.advance();
        self.expect(&TokenKind::LParen, "'('")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "')'")?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            pos,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt> {
        let pos = self.pos();
        self.advance();
        self.expect(&TokenKind::LParen, "'('")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "')'")?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::While { cond, body, pos })
    }

    fn parse_for(&mut self) -> Result<Stmt> {
        let pos = self.pos();
        self.advance();
        self.expect(&TokenKind::LParen, "'('")?;
        let init = if *self.peek() == TokenKind::Semicolon {
            None
        } else if self.starts_type() {
            Some(Box::new(self.parse_var_decl()?))
        } else {
            Some(Box::new(self.parse_assign_or_expr_stmt()?))
        };
        if init.is_none() {
            self.expect(&TokenKind::Semicolon, "';'")?;
        }
        let cond = if *self.peek() == TokenKind::Semicolon {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::Semicolon, "';'")?;
        let step = if *self.peek() == TokenKind::RParen {
            None
        } else {
            Some(Box::new(self.parse_bare_assign_or_expr()?))
        };
        self.expect(&TokenKind::RParen, "')'")?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::For {
            init,
            cond,
            step,
            body,
            pos,
        })
    }

    fn parse_switch(&mut self) -> Result<Stmt> {
        let pos = self.pos();
        self.advance();
        self.expect(&TokenKind::LParen, "'('")?;
        let scrutinee = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "')'")?;
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut cases = Vec::new();
        while *self.peek() != TokenKind::RBrace {
            let value = if self.eat(&TokenKind::Case) {
                let value_pos = self.pos();
                let v = match self.advance() {
                    TokenKind::IntLit(n) => n,
                    other => {
                        return Err(Error::syntax(
                            value_pos,
                            format!("expected an integer case label, found {other:?}"),
                        ))
                    }
                };
                Some(v)
            } else {
                self.expect(&TokenKind::Default, "'case' or 'default'")?;
                None
            };
            self.expect(&TokenKind::Colon, "':'")?;
            let mut body = Vec::new();
            while !matches!(self.peek(), TokenKind::Case | TokenKind::Default | TokenKind::RBrace) {
                body.push(self.parse_stmt()?);
            }
            cases.push(SwitchCase { value, body });
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(Stmt::Switch {
            scrutinee,
            cases,
            pos,
        })
    }

    fn parse_var_decl(&mut self) -> Result<Stmt> {
        let pos = self.pos();
        let ty = self.parse_type()?;
        let name = self.expect_ident("a variable name")?;
        let init = if self.eat(&TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(Stmt::VarDecl {
            name,
            ty,
            init,
            pos,
        })
    }

    /// `x = e;` or `f(args);` as a statement, consuming the trailing `;`.
    fn parse_assign_or_expr_stmt(&mut self) -> Result<Stmt> {
        let stmt = self.parse_bare_assign_or_expr()?;
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(stmt)
    }

    /// Same as above but without consuming a trailing `;` — used for the
    /// `for (...; ...; step)` clause, where `step` has no terminator.
    fn parse_bare_assign_or_expr(&mut self) -> Result<Stmt> {
        let pos = self.pos();
        let expr = self.parse_expr()?;
        if self.eat(&TokenKind::Assign) {
            let value = self.parse_expr()?;
            Ok(Stmt::Assign {
                target: expr,
                value,
                pos,
            })
        } else {
            Ok(Stmt::ExprStmt(expr))
        }
    }

    // ---- expressions (precedence climbing) ----

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_and()?;
        while *self.peek() == TokenKind::OrOr {
            let pos = self.pos();
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs), pos);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_equality()?;
        while *self.peek() == TokenKind::AndAnd {
            let pos = self.pos();
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs), pos);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::Ne,
                _ => break,
            };
            let pos = self.pos();
            self.advance();
            let rhs = self.parse_relational()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), pos);
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::Ge,
                _ => break,
            };
            let pos = self.pos();
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), pos);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let pos = self.pos();
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), pos);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            let pos = self.pos();
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), pos);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let pos = self.pos();
        match self.peek() {
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(operand), pos))
            }
            TokenKind::Bang => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary(UnaryOp::Not, Box::new(operand), pos))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if *self.peek() == TokenKind::LBracket {
                let pos = self.pos();
                self.advance();
                let index = self.parse_expr()?;
                self.expect(&TokenKind::RBracket, "']'")?;
                expr = Expr::Index(Box::new(expr), Box::new(index), pos);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let pos = self.pos();
        match self.advance() {
            TokenKind::IntLit(n) => Ok(Expr::IntLit(n, pos)),
            TokenKind::CharLit(c) => Ok(Expr::CharLit(c, pos)),
            TokenKind::StringLit(s) => Ok(Expr::StringLit(s, pos)),
            TokenKind::True => Ok(Expr::BoolLit(true, pos)),
            TokenKind::False => Ok(Expr::BoolLit(false, pos)),
            TokenKind::Ident(name) => {
                if self.eat(&TokenKind::LParen) {
                    let mut args = Vec::new();
                    if *self.peek() != TokenKind::RParen {
                        args.push(self.parse_expr()?);
                        while self.eat(&TokenKind::Comma) {
                            args.push(self.parse_expr()?);
                        }
                    }
                    self.expect(&TokenKind::RParen, "')'")?;
                    Ok(Expr::Call(name, args, pos))
                } else {
                    Ok(Expr::Ident(name, pos))
                }
            }
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(Error::syntax(pos, format!("expected an expression, found {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse_src(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize().unwrap();
        parse(tokens).unwrap()
    }

    #[test]
    fn parses_smallest_program() {
        let program = parse_src("int main(){ return 0; }");
        assert_eq!(program.decls.len(), 1);
        let Decl::Function { name, body, .. } = &program.decls[0] else {
            panic!("expected a function");
        };
        assert_eq!(name, "main");
        assert!(matches!(body[0], Stmt::Return(Some(_), _)));
    }

    #[test]
    fn parses_if_else_and_while() {
        let program = parse_src(
            "int main(){ int i=0; while(i<5){ i=i+1; } if(i==5) i=0; else i=1; return 0; }",
        );
        let Decl::Function { body, .. } = &program.decls[0] else {
            unreachable!()
        };
        assert!(matches!(body[1], Stmt::While { .. }));
        assert!(matches!(body[2], Stmt::If { .. }));
    }

    #[test]
    fn parses_array_declaration_and_index() {
        let program = parse_src("int a[3] = {1,2,3}; int main(){ return a[0]; }");
        assert!(matches!(program.decls[0], Decl::GlobalArray { .. }));
    }

    #[test]
    fn rejects_missing_semicolon() {
        let tokens = Lexer::new("int main(){ int x = 1 return 0; }")
            .tokenize()
            .unwrap();
        assert!(parse(tokens).is_err());
    }
}
