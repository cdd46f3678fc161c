//! k0 semantic analyzer
//!
//! Two logical passes over the AST: declaration collection (classes and
//! function signatures become visible file-wide), then type inference and rule
//! enforcement statement by statement. The analyzer only attaches types to
//! expression nodes, it never reshapes the tree. Every finding becomes a
//! [`Diagnostic`]; after a mismatch the offending expression is given
//! [`Type::Unknown`] so one mistake does not cascade.

use std::collections::HashMap;

use crate::common::{Diagnostic, Span};
use crate::frontend::ast::*;
use crate::types::{FnSignature, Type};

use super::scope::{Mutability, ScopeArena, SymbolKind};
use super::suggest::did_you_mean;
use super::types::TypeChecker;

/// A user-declared class, collected before any body is checked
#[derive(Debug, Clone)]
struct ClassInfo {
    sealed: bool,
    supertype: Option<String>,
    /// (name, type, mutable)
    fields: Vec<(String, Type, bool)>,
    decl_span: Span,
}

/// A callable function, user-declared or built-in
#[derive(Debug, Clone)]
struct FnInfo {
    sig: FnSignature,
    decl_span: Option<Span>,
}

pub struct Analyzer {
    scopes: ScopeArena,
    diagnostics: Vec<Diagnostic>,
    classes: HashMap<String, ClassInfo>,
    functions: HashMap<String, FnInfo>,
    /// Declared (or inferred) return type of the enclosing function
    current_return: Type,
    loop_depth: usize,
}

impl Analyzer {
    /// Create an analyzer with the given pre-resolved global signatures.
    ///
    /// Built-ins may carry dotted names (`java.lang.Math.abs`); they resolve
    /// through call paths, never through the scope chain.
    pub fn new(builtins: &[FnSignature]) -> Self {
        let functions = builtins
            .iter()
            .map(|sig| {
                (
                    sig.name.clone(),
                    FnInfo {
                        sig: sig.clone(),
                        decl_span: None,
                    },
                )
            })
            .collect();
        Self {
            scopes: ScopeArena::new(),
            diagnostics: Vec::new(),
            classes: HashMap::new(),
            functions,
            current_return: Type::Unit,
            loop_depth: 0,
        }
    }

    /// Analyze a program, annotating expression types in place, and return
    /// every diagnostic in emission order.
    pub fn analyze(mut self, program: &mut Program) -> Vec<Diagnostic> {
        self.collect_classes(program);
        self.collect_functions(program);

        for decl in &mut program.decls {
            match &mut decl.kind {
                DeclKind::Var(var) => self.check_var_decl(var),
                DeclKind::Fun(fun) => self.check_fun_decl(fun),
                DeclKind::Class(_) => {}
            }
        }

        self.diagnostics
    }

    // ==================== Declaration collection ====================

    fn collect_classes(&mut self, program: &Program) {
        // Names first so field types and supertypes can refer to any class
        // regardless of declaration order.
        for decl in &program.decls {
            if let DeclKind::Class(class) = &decl.kind {
                if let Some(existing) = self.classes.get(&class.name) {
                    let note_span = existing.decl_span;
                    self.diagnostics.push(
                        Diagnostic::semantic(
                            format!("class '{}' is declared more than once", class.name),
                            class.name_span,
                        )
                        .with_note("first declared here", note_span),
                    );
                    continue;
                }
                self.classes.insert(
                    class.name.clone(),
                    ClassInfo {
                        sealed: class.sealed,
                        supertype: class.supertype.clone(),
                        fields: Vec::new(),
                        decl_span: class.name_span,
                    },
                );
            }
        }

        for decl in &program.decls {
            let DeclKind::Class(class) = &decl.kind else {
                continue;
            };
            let fields: Vec<(String, Type, bool)> = class
                .fields
                .iter()
                .map(|f| (f.name.clone(), self.resolve_type(&f.ty), f.mutable))
                .collect();
            if let Some(info) = self.classes.get_mut(&class.name) {
                info.fields = fields;
            }

            if let Some(super_name) = &class.supertype {
                match self.classes.get(super_name) {
                    None => self.diagnostics.push(Diagnostic::semantic(
                        format!("unknown supertype '{super_name}'"),
                        class.name_span,
                    )),
                    Some(parent) if !parent.sealed => {
                        let note_span = parent.decl_span;
                        self.diagnostics.push(
                            Diagnostic::semantic(
                                format!("cannot inherit from non-sealed class '{super_name}'"),
                                class.name_span,
                            )
                            .with_note("declared here", note_span),
                        );
                    }
                    Some(_) => {}
                }
            }
        }
    }

    fn collect_functions(&mut self, program: &Program) {
        for decl in &program.decls {
            let DeclKind::Fun(fun) = &decl.kind else {
                continue;
            };
            if let Some(existing) = self.functions.get(&fun.name) {
                let mut diag = Diagnostic::semantic(
                    format!("function '{}' is declared more than once", fun.name),
                    fun.name_span,
                );
                if let Some(span) = existing.decl_span {
                    diag = diag.with_note("first declared here", span);
                }
                self.diagnostics.push(diag);
                continue;
            }
            let params: Vec<Type> = fun.params.iter().map(|p| self.resolve_type(&p.ty)).collect();
            let ret = match (&fun.return_type, &fun.body) {
                (Some(ty), _) => self.resolve_type(ty),
                // Inferred once the body is checked
                (None, FunBody::Expr(_)) => Type::Unknown,
                (None, FunBody::Block(_)) => Type::Unit,
            };
            self.functions.insert(
                fun.name.clone(),
                FnInfo {
                    sig: FnSignature::new(fun.name.clone(), params, ret),
                    decl_span: Some(fun.name_span),
                },
            );
        }
    }

    // ==================== Declarations ====================

    fn check_fun_decl(&mut self, fun: &mut FunDecl) {
        self.current_return = self
            .functions
            .get(&fun.name)
            .map(|f| f.sig.ret.clone())
            .unwrap_or(Type::Unit);

        self.scopes.push_scope();
        for param in &fun.params {
            let ty = self.resolve_type(&param.ty);
            if let Err(previous) = self.scopes.define(
                &param.name,
                ty,
                Mutability::Val,
                SymbolKind::Parameter,
                param.span,
                true,
            ) {
                self.diagnostics.push(
                    Diagnostic::semantic(
                        format!("duplicate parameter '{}'", param.name),
                        param.span,
                    )
                    .with_note("first declared here", previous),
                );
            }
        }

        match &mut fun.body {
            FunBody::Block(block) => {
                for stmt in &mut block.stmts {
                    self.check_stmt(stmt);
                }
            }
            FunBody::Expr(expr) => {
                let body_ty = self.check_expr(expr);
                if fun.return_type.is_some() {
                    if !self.assignable(&self.current_return, &body_ty) {
                        self.diagnostics.push(Diagnostic::semantic(
                            format!(
                                "function body has type '{body_ty}' but '{}' was declared",
                                self.current_return
                            ),
                            expr.span,
                        ));
                    }
                } else if let Some(info) = self.functions.get_mut(&fun.name) {
                    info.sig.ret = body_ty;
                }
            }
        }
        self.scopes.pop_scope();
        self.current_return = Type::Unit;
    }

    fn check_var_decl(&mut self, var: &mut VarDecl) {
        let declared_ty = match &var.declared_type {
            Some(ty) => Some(self.resolve_type(ty)),
            None => None,
        };

        let init_ty = var.init.as_mut().map(|init| self.check_expr(init));

        if var.is_const {
            match &var.init {
                Some(init) if !self.is_const_expr(init) => {
                    self.diagnostics.push(Diagnostic::semantic(
                        format!(
                            "initializer of 'const val {}' must be a compile-time constant",
                            var.name
                        ),
                        init.span,
                    ));
                }
                Some(_) => {}
                None => self.diagnostics.push(Diagnostic::semantic(
                    format!("'const val {}' requires an initializer", var.name),
                    var.span,
                )),
            }
        }

        let ty = match (declared_ty, init_ty) {
            (Some(decl_ty), Some(init_ty)) => {
                let fits = self.assignable(&decl_ty, &init_ty)
                    || var
                        .init
                        .as_ref()
                        .is_some_and(|e| literal_fits(&decl_ty, e));
                if !fits {
                    let span = var.init.as_ref().map(|e| e.span).unwrap_or(var.span);
                    self.diagnostics.push(Diagnostic::semantic(
                        format!("type mismatch: expected '{decl_ty}', found '{init_ty}'"),
                        span,
                    ));
                }
                decl_ty
            }
            (Some(decl_ty), None) => decl_ty,
            (None, Some(Type::Null)) => {
                self.diagnostics.push(Diagnostic::semantic(
                    format!(
                        "cannot infer a type for '{}' from a null initializer; add an annotation",
                        var.name
                    ),
                    var.span,
                ));
                Type::Unknown
            }
            (None, Some(init_ty)) => init_ty,
            (None, None) => {
                self.diagnostics.push(Diagnostic::semantic(
                    format!(
                        "declaration of '{}' needs a type annotation or an initializer",
                        var.name
                    ),
                    var.span,
                ));
                Type::Unknown
            }
        };

        let mutability = if var.is_const {
            Mutability::Const
        } else if var.mutable {
            Mutability::Var
        } else {
            Mutability::Val
        };

        if let Err(previous) = self.scopes.define(
            &var.name,
            ty,
            mutability,
            SymbolKind::Variable,
            var.name_span,
            var.init.is_some(),
        ) {
            self.diagnostics.push(
                Diagnostic::semantic(
                    format!("'{}' is already declared in this scope", var.name),
                    var.name_span,
                )
                .with_note("previously declared here", previous),
            );
        }
    }

    // ==================== Statements ====================

    fn check_stmt(&mut self, stmt: &mut Stmt) {
        match &mut stmt.kind {
            StmtKind::Var(var) => self.check_var_decl(var),
            StmtKind::If {
                condition,
                then_block,
                else_block,
            } => {
                self.check_condition(condition);
                self.check_block(then_block);
                if let Some(else_stmt) = else_block {
                    self.check_stmt(else_stmt);
                }
            }
            StmtKind::While { condition, body } => {
                self.check_condition(condition);
                self.check_loop_body(body);
            }
            StmtKind::DoWhile { body, condition } => {
                self.check_loop_body(body);
                self.check_condition(condition);
            }
            StmtKind::For {
                binding,
                binding_span,
                iterable,
                body,
            } => {
                let iter_ty = self.check_expr(iterable);
                let element = match iter_ty {
                    Type::Range(element) => *element,
                    Type::Array(element) => *element,
                    Type::String => Type::Char,
                    Type::Unknown => Type::Unknown,
                    other => {
                        self.diagnostics.push(Diagnostic::semantic(
                            format!("cannot iterate over a value of type '{other}'"),
                            iterable.span,
                        ));
                        Type::Unknown
                    }
                };
                self.scopes.push_scope();
                // The loop binding is immutable for the body's lifetime
                let _ = self.scopes.define(
                    binding,
                    element,
                    Mutability::Val,
                    SymbolKind::Variable,
                    *binding_span,
                    true,
                );
                self.loop_depth += 1;
                for inner in &mut body.stmts {
                    self.check_stmt(inner);
                }
                self.loop_depth -= 1;
                self.scopes.pop_scope();
            }
            StmtKind::When(when) => self.check_when(when),
            StmtKind::Return(value) => {
                let expected = self.current_return.clone();
                match value {
                    Some(expr) => {
                        let actual = self.check_expr(expr);
                        if !self.assignable(&expected, &actual) {
                            self.diagnostics.push(Diagnostic::semantic(
                                format!(
                                    "return type mismatch: expected '{expected}', found '{actual}'"
                                ),
                                expr.span,
                            ));
                        }
                    }
                    None => {
                        if expected != Type::Unit && !expected.is_unknown() {
                            self.diagnostics.push(Diagnostic::semantic(
                                format!("this function must return a value of type '{expected}'"),
                                stmt.span,
                            ));
                        }
                    }
                }
            }
            StmtKind::Break | StmtKind::Continue => {
                if self.loop_depth == 0 {
                    let keyword = if matches!(stmt.kind, StmtKind::Break) {
                        "break"
                    } else {
                        "continue"
                    };
                    self.diagnostics.push(Diagnostic::semantic(
                        format!("'{keyword}' outside of a loop"),
                        stmt.span,
                    ));
                }
            }
            StmtKind::Block(block) => self.check_block(block),
            StmtKind::Expr(expr) => {
                self.check_expr(expr);
            }
        }
    }

    fn check_block(&mut self, block: &mut Block) {
        self.scopes.push_scope();
        for stmt in &mut block.stmts {
            self.check_stmt(stmt);
        }
        self.scopes.pop_scope();
    }

    fn check_loop_body(&mut self, body: &mut Block) {
        self.loop_depth += 1;
        self.check_block(body);
        self.loop_depth -= 1;
    }

    fn check_condition(&mut self, condition: &mut Expr) {
        let ty = self.check_expr(condition);
        if ty != Type::Boolean && !ty.is_unknown() {
            self.diagnostics.push(Diagnostic::semantic(
                format!("condition must be 'Boolean', found '{ty}'"),
                condition.span,
            ));
        }
    }

    fn check_when(&mut self, when: &mut WhenStmt) {
        let subject_ty = when.subject.as_mut().map(|s| self.check_expr(s));
        let subject_name = when.subject.as_ref().and_then(|s| match &s.kind {
            ExprKind::Identifier(name) => Some(name.clone()),
            _ => None,
        });

        let mut has_else = false;
        let mut covered: Vec<String> = Vec::new();

        for arm in &mut when.arms {
            self.scopes.push_scope();
            match (&mut arm.pattern, &subject_ty) {
                (WhenPattern::Else, _) => has_else = true,
                (WhenPattern::Expr(expr), Some(subject)) => {
                    let arm_ty = self.check_expr(expr);
                    let comparable = self.assignable(subject, &arm_ty)
                        || self.assignable(&arm_ty, subject)
                        || (subject.is_numeric() && arm_ty.is_numeric());
                    if !comparable {
                        self.diagnostics.push(Diagnostic::semantic(
                            format!(
                                "when arm of type '{arm_ty}' cannot match a subject of type '{subject}'"
                            ),
                            expr.span,
                        ));
                    }
                }
                (WhenPattern::Expr(guard), None) => {
                    let ty = self.check_expr(guard);
                    if ty != Type::Boolean && !ty.is_unknown() {
                        self.diagnostics.push(Diagnostic::semantic(
                            format!("subjectless when arm must be 'Boolean', found '{ty}'"),
                            guard.span,
                        ));
                    }
                }
                (WhenPattern::In(range), Some(subject)) => {
                    let range_ty = self.check_expr(range);
                    if !matches!(range_ty, Type::Range(_) | Type::Unknown) {
                        self.diagnostics.push(Diagnostic::semantic(
                            format!("'in' arm requires a range, found '{range_ty}'"),
                            range.span,
                        ));
                    } else if !subject.is_numeric()
                        && *subject != Type::Char
                        && !subject.is_unknown()
                    {
                        self.diagnostics.push(Diagnostic::semantic(
                            format!("subject of type '{subject}' cannot be tested for membership"),
                            range.span,
                        ));
                    }
                }
                (WhenPattern::In(range), None) => {
                    self.diagnostics.push(Diagnostic::semantic(
                        "'in' arms require a when subject",
                        range.span,
                    ));
                }
                (WhenPattern::Is { name, span }, subject) => {
                    if !self.classes.contains_key(name.as_str()) {
                        self.diagnostics.push(Diagnostic::semantic(
                            format!("unknown class '{name}'"),
                            *span,
                        ));
                    } else {
                        covered.push(name.clone());
                        if subject.is_none() {
                            self.diagnostics.push(Diagnostic::semantic(
                                "'is' arms require a when subject",
                                *span,
                            ));
                        } else if let Some(subject_name) = &subject_name {
                            // Smart cast: inside this arm the subject is known
                            // to be the matched subclass.
                            let _ = self.scopes.define(
                                subject_name,
                                Type::Class(name.clone()),
                                Mutability::Val,
                                SymbolKind::Variable,
                                *span,
                                true,
                            );
                        }
                    }
                }
            }

            for stmt in &mut arm.body.stmts {
                self.check_stmt(stmt);
            }
            self.scopes.pop_scope();
        }

        self.check_when_coverage(when, subject_ty.as_ref(), &covered, has_else);
    }

    fn check_when_coverage(
        &mut self,
        when: &WhenStmt,
        subject_ty: Option<&Type>,
        covered: &[String],
        has_else: bool,
    ) {
        if has_else {
            return;
        }

        let sealed_name = subject_ty.and_then(|ty| match ty {
            Type::Class(name) => self
                .classes
                .get(name)
                .filter(|c| c.sealed)
                .map(|_| name.clone()),
            _ => None,
        });

        match sealed_name {
            Some(name) => {
                // Set subtraction over the declared subclass tags
                let mut missing: Vec<&str> = self
                    .classes
                    .iter()
                    .filter(|(_, info)| info.supertype.as_deref() == Some(name.as_str()))
                    .map(|(sub, _)| sub.as_str())
                    .filter(|sub| !covered.iter().any(|c| c == sub))
                    .collect();
                if !missing.is_empty() {
                    missing.sort_unstable();
                    let listed = missing
                        .iter()
                        .map(|m| format!("'{m}'"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    self.diagnostics.push(Diagnostic::semantic(
                        format!("non-exhaustive when over sealed class '{name}': missing {listed}"),
                        when.span,
                    ));
                }
            }
            None => {
                self.diagnostics.push(Diagnostic::warning(
                    "when may not cover all cases; consider adding an 'else' arm",
                    when.span,
                ));
            }
        }
    }

    // ==================== Expressions ====================

    fn check_expr(&mut self, expr: &mut Expr) -> Type {
        let span = expr.span;
        let ty = match &mut expr.kind {
            ExprKind::IntLiteral(value) => {
                if *value > i64::from(i32::MAX) || *value < i64::from(i32::MIN) {
                    Type::Long
                } else {
                    Type::Int
                }
            }
            ExprKind::FloatLiteral { is_single, .. } => {
                if *is_single {
                    Type::Float
                } else {
                    Type::Double
                }
            }
            ExprKind::BoolLiteral(_) => Type::Boolean,
            ExprKind::CharLiteral(_) => Type::Char,
            ExprKind::StringLiteral(_) => Type::String,
            ExprKind::NullLiteral => Type::Null,
            ExprKind::StringTemplate(segments) => {
                // Embedded expressions of any type render to text
                for segment in segments {
                    if let TemplateSegment::Expr(inner) = segment {
                        self.check_expr(inner);
                    }
                }
                Type::String
            }
            ExprKind::Identifier(name) => self.check_identifier(name, span),
            ExprKind::Binary { op, left, right } => {
                let op = *op;
                let left_ty = self.check_expr(left);
                let right_ty = self.check_expr(right);
                match TypeChecker::binary_result(op, &left_ty, &right_ty) {
                    Ok(ty) => ty,
                    Err(message) => {
                        self.diagnostics.push(Diagnostic::semantic(message, span));
                        Type::Unknown
                    }
                }
            }
            ExprKind::Unary { op, operand } => {
                let op = *op;
                let operand_ty = self.check_expr(operand);
                match TypeChecker::unary_result(op, &operand_ty) {
                    Ok(ty) => ty,
                    Err(message) => {
                        self.diagnostics.push(Diagnostic::semantic(message, span));
                        Type::Unknown
                    }
                }
            }
            ExprKind::IncDec { target, .. } => {
                let target_ty = self.check_assign_target(target, true);
                if !target_ty.is_numeric() && !target_ty.is_unknown() {
                    self.diagnostics.push(Diagnostic::semantic(
                        format!("'++'/'--' require a numeric target, found '{target_ty}'"),
                        span,
                    ));
                    Type::Unknown
                } else {
                    target_ty
                }
            }
            ExprKind::Assign { target, op, value } => {
                let op = *op;
                let target_ty = self.check_assign_target(target, op.is_some());
                let value_ty = self.check_expr(value);
                let effective = match op {
                    Some(op) => match TypeChecker::binary_result(op, &target_ty, &value_ty) {
                        Ok(ty) => ty,
                        Err(message) => {
                            self.diagnostics.push(Diagnostic::semantic(message, span));
                            Type::Unknown
                        }
                    },
                    None => value_ty,
                };
                let fits = self.assignable(&target_ty, &effective)
                    || literal_fits(&target_ty, value);
                if !fits {
                    self.diagnostics.push(Diagnostic::semantic(
                        format!("type mismatch: expected '{target_ty}', found '{effective}'"),
                        value.span,
                    ));
                }
                // An assignment chain propagates the target's type
                target_ty
            }
            ExprKind::Call { callee, args } => self.check_call(callee, args, span),
            ExprKind::Index { base, index } => {
                let base_ty = self.check_expr(base);
                let index_ty = self.check_expr(index);
                if !index_ty.is_integer() && !index_ty.is_unknown() {
                    self.diagnostics.push(Diagnostic::semantic(
                        format!("index must be an integer, found '{index_ty}'"),
                        index.span,
                    ));
                }
                if base_ty.is_nullable() {
                    self.diagnostics.push(Diagnostic::semantic(
                        "possible null dereference",
                        base.span,
                    ));
                }
                match base_ty.strip_nullable() {
                    Type::Array(element) => (**element).clone(),
                    Type::String => Type::Char,
                    Type::Unknown | Type::Null => Type::Unknown,
                    other => {
                        self.diagnostics.push(Diagnostic::semantic(
                            format!("value of type '{other}' cannot be indexed"),
                            base.span,
                        ));
                        Type::Unknown
                    }
                }
            }
            ExprKind::Member { base, name, safe } => {
                let name = name.clone();
                let safe = *safe;
                let base_ty = self.check_expr(base);
                self.check_member(&base_ty, &name, safe, base.span, span)
            }
            ExprKind::Lambda { .. } => {
                self.diagnostics.push(Diagnostic::semantic(
                    "lambda expressions are only supported as array initializers",
                    span,
                ));
                Type::Unknown
            }
            ExprKind::ArrayLiteral {
                element,
                size,
                init,
            } => {
                let element_ty = self.resolve_type(element);
                let size_ty = self.check_expr(size);
                if !size_ty.is_integer() && !size_ty.is_unknown() {
                    self.diagnostics.push(Diagnostic::semantic(
                        format!("array size must be an integer, found '{size_ty}'"),
                        size.span,
                    ));
                }
                self.check_array_init(init, &element_ty);
                Type::array(element_ty)
            }
            ExprKind::Range {
                start,
                end,
                ..
            } => {
                let start_ty = self.check_expr(start);
                let end_ty = self.check_expr(end);
                if start_ty.is_unknown() || end_ty.is_unknown() {
                    Type::Range(Box::new(Type::Unknown))
                } else if start_ty.is_integer() && end_ty.is_integer() {
                    let element = TypeChecker::promote(&start_ty, &end_ty).unwrap_or(Type::Int);
                    Type::Range(Box::new(element))
                } else if start_ty == Type::Char && end_ty == Type::Char {
                    Type::Range(Box::new(Type::Char))
                } else {
                    self.diagnostics.push(Diagnostic::semantic(
                        format!(
                            "range bounds must both be integers or chars, found '{start_ty}' and '{end_ty}'"
                        ),
                        span,
                    ));
                    Type::Range(Box::new(Type::Unknown))
                }
            }
            ExprKind::Is { value, ty_name } => {
                let ty_name = ty_name.clone();
                self.check_expr(value);
                if !self.classes.contains_key(&ty_name) {
                    self.diagnostics.push(Diagnostic::semantic(
                        format!("unknown class '{ty_name}'"),
                        span,
                    ));
                }
                Type::Boolean
            }
            ExprKind::InRange { value, range } => {
                let value_ty = self.check_expr(value);
                let range_ty = self.check_expr(range);
                if !matches!(range_ty, Type::Range(_) | Type::Unknown) {
                    self.diagnostics.push(Diagnostic::semantic(
                        format!("right side of 'in' must be a range, found '{range_ty}'"),
                        range.span,
                    ));
                } else if !value_ty.is_numeric()
                    && value_ty != Type::Char
                    && !value_ty.is_unknown()
                {
                    self.diagnostics.push(Diagnostic::semantic(
                        format!("value of type '{value_ty}' cannot be tested for membership"),
                        value.span,
                    ));
                }
                Type::Boolean
            }
            ExprKind::Elvis { value, fallback } => {
                let value_ty = self.check_expr(value);
                let fallback_ty = self.check_expr(fallback);
                if !value_ty.is_nullable() && !value_ty.is_unknown() {
                    self.diagnostics.push(Diagnostic::warning(
                        "left operand of '?:' is never null",
                        value.span,
                    ));
                }
                let unwrapped = value_ty.strip_nullable().clone();
                if self.assignable(&unwrapped, &fallback_ty) {
                    unwrapped
                } else if self.assignable(&fallback_ty, &unwrapped) {
                    fallback_ty
                } else {
                    match TypeChecker::promote(&unwrapped, &fallback_ty) {
                        Some(ty) => ty,
                        None => {
                            self.diagnostics.push(Diagnostic::semantic(
                                format!(
                                    "incompatible '?:' operands: '{value_ty}' and '{fallback_ty}'"
                                ),
                                span,
                            ));
                            Type::Unknown
                        }
                    }
                }
            }
            ExprKind::Paren(inner) => self.check_expr(inner),
        };

        expr.ty = Some(ty.clone());
        ty
    }

    fn check_identifier(&mut self, name: &str, span: Span) -> Type {
        if let Some(symbol) = self.scopes.lookup(name) {
            let ty = symbol.ty.clone();
            let initialized = symbol.initialized;
            if !initialized {
                self.diagnostics.push(Diagnostic::semantic(
                    format!("variable '{name}' is used before it has been initialized"),
                    span,
                ));
            }
            return ty;
        }

        if self.functions.contains_key(name) {
            self.diagnostics.push(Diagnostic::semantic(
                format!("'{name}' is a function and must be called"),
                span,
            ));
            return Type::Unknown;
        }

        let mut diag =
            Diagnostic::semantic(format!("unresolved name '{name}'"), span);
        let visible = self.scopes.visible_names();
        if let Some(suggestion) = did_you_mean(name, visible.iter().map(|s| s.as_str())) {
            diag.message.push_str(&format!("; did you mean '{suggestion}'?"));
        }
        self.diagnostics.push(diag);
        Type::Unknown
    }

    /// Check an assignment/increment target: it must be a mutable place, and
    /// the result is the type of the slot being written.
    fn check_assign_target(&mut self, target: &mut Expr, requires_value: bool) -> Type {
        let span = target.span;
        let ty = match &mut target.kind {
            ExprKind::Identifier(name) => {
                let name = name.clone();
                match self.scopes.lookup_mut(&name) {
                    Some(symbol) => {
                        let ty = symbol.ty.clone();
                        let decl_span = symbol.decl_span;
                        let mutability = symbol.mutability;
                        let initialized = symbol.initialized;

                        // A val declared without an initializer takes its one
                        // permitted assignment here.
                        let deferred_init =
                            mutability == Mutability::Val && !initialized && !requires_value;
                        if requires_value && !initialized {
                            self.diagnostics.push(Diagnostic::semantic(
                                format!(
                                    "variable '{name}' is used before it has been initialized"
                                ),
                                span,
                            ));
                        }
                        match mutability {
                            Mutability::Var => {}
                            Mutability::Val if deferred_init => {}
                            Mutability::Val if !initialized && requires_value => {}
                            Mutability::Val => {
                                self.diagnostics.push(
                                    Diagnostic::semantic(
                                        format!("cannot reassign immutable value '{name}'"),
                                        span,
                                    )
                                    .with_note("declared with 'val' here", decl_span),
                                );
                            }
                            Mutability::Const => {
                                self.diagnostics.push(
                                    Diagnostic::semantic(
                                        format!("cannot reassign constant '{name}'"),
                                        span,
                                    )
                                    .with_note("declared with 'const val' here", decl_span),
                                );
                            }
                        }
                        if let Some(symbol) = self.scopes.lookup_mut(&name) {
                            symbol.initialized = true;
                        }
                        ty
                    }
                    None => self.check_identifier(&name, span),
                }
            }
            ExprKind::Index { base, index } => {
                let base_ty = self.check_expr(base);
                let index_ty = self.check_expr(index);
                if !index_ty.is_integer() && !index_ty.is_unknown() {
                    self.diagnostics.push(Diagnostic::semantic(
                        format!("index must be an integer, found '{index_ty}'"),
                        index.span,
                    ));
                }
                if base_ty.is_nullable() {
                    self.diagnostics.push(Diagnostic::semantic(
                        "possible null dereference",
                        base.span,
                    ));
                }
                match base_ty.strip_nullable() {
                    Type::Array(element) => (**element).clone(),
                    Type::Unknown | Type::Null => Type::Unknown,
                    other => {
                        self.diagnostics.push(Diagnostic::semantic(
                            format!("value of type '{other}' cannot be index-assigned"),
                            base.span,
                        ));
                        Type::Unknown
                    }
                }
            }
            ExprKind::Member { base, name, safe } => {
                let name = name.clone();
                let safe = *safe;
                let base_ty = self.check_expr(base);
                if safe {
                    self.diagnostics.push(Diagnostic::semantic(
                        "a safe call is not an assignable place",
                        span,
                    ));
                }
                if base_ty.is_nullable() {
                    self.diagnostics.push(Diagnostic::semantic(
                        "possible null dereference",
                        base.span,
                    ));
                }
                match base_ty.strip_nullable() {
                    Type::Class(class_name) => {
                        match self.lookup_field(class_name, &name) {
                            Some((field_ty, mutable)) => {
                                if !mutable {
                                    self.diagnostics.push(Diagnostic::semantic(
                                        format!(
                                            "cannot reassign immutable field '{name}' of '{class_name}'"
                                        ),
                                        span,
                                    ));
                                }
                                field_ty
                            }
                            None => {
                                self.diagnostics.push(Diagnostic::semantic(
                                    format!("unknown member '{name}' on '{class_name}'"),
                                    span,
                                ));
                                Type::Unknown
                            }
                        }
                    }
                    Type::Unknown | Type::Null => Type::Unknown,
                    other => {
                        self.diagnostics.push(Diagnostic::semantic(
                            format!("members of '{other}' cannot be assigned"),
                            span,
                        ));
                        Type::Unknown
                    }
                }
            }
            _ => {
                self.diagnostics
                    .push(Diagnostic::semantic("invalid assignment target", span));
                Type::Unknown
            }
        };

        target.ty = Some(ty.clone());
        ty
    }

    fn check_member(
        &mut self,
        base_ty: &Type,
        name: &str,
        safe: bool,
        base_span: Span,
        span: Span,
    ) -> Type {
        if base_ty.is_nullable() && !safe {
            self.diagnostics.push(Diagnostic::semantic(
                "possible null dereference",
                base_span,
            ));
        }
        if !base_ty.is_nullable() && safe && !base_ty.is_unknown() {
            self.diagnostics.push(Diagnostic::warning(
                format!("unnecessary safe call on non-nullable receiver of type '{base_ty}'"),
                span,
            ));
        }

        let member_ty = match base_ty.strip_nullable() {
            Type::String => match name {
                "length" => Some(Type::Int),
                _ => None,
            },
            Type::Array(_) => match name {
                "size" => Some(Type::Int),
                _ => None,
            },
            Type::Class(class_name) => {
                self.lookup_field(class_name, name).map(|(ty, _)| ty)
            }
            Type::Unknown | Type::Null => Some(Type::Unknown),
            _ => None,
        };

        let member_ty = match member_ty {
            Some(ty) => ty,
            None => {
                self.diagnostics.push(Diagnostic::semantic(
                    format!("unknown member '{name}' on '{}'", base_ty.strip_nullable()),
                    span,
                ));
                Type::Unknown
            }
        };

        // A safe call over a nullable receiver stays nullable
        if safe && base_ty.is_nullable() && !member_ty.is_unknown() {
            Type::nullable(member_ty)
        } else {
            member_ty
        }
    }

    fn lookup_field(&self, class_name: &str, field: &str) -> Option<(Type, bool)> {
        let info = self.classes.get(class_name)?;
        info.fields
            .iter()
            .find(|(name, _, _)| name == field)
            .map(|(_, ty, mutable)| (ty.clone(), *mutable))
    }

    fn check_call(&mut self, callee: &mut Expr, args: &mut [Expr], span: Span) -> Type {
        let Some(path) = flatten_path(callee) else {
            // The callee is a real expression; nothing in k0 is callable that
            // way, but checking it localizes the error.
            let callee_ty = self.check_expr(callee);
            for arg in args.iter_mut() {
                self.check_expr(arg);
            }
            if !callee_ty.is_unknown() {
                self.diagnostics.push(Diagnostic::semantic(
                    format!("value of type '{callee_ty}' is not callable"),
                    span,
                ));
            }
            return Type::Unknown;
        };

        // A plain identifier naming a variable is never callable
        if !path.contains('.')
            && let Some(symbol) = self.scopes.lookup(&path)
        {
            let ty = symbol.ty.clone();
            for arg in args.iter_mut() {
                self.check_expr(arg);
            }
            self.diagnostics.push(Diagnostic::semantic(
                format!("'{path}' is a value of type '{ty}', not a function"),
                callee.span,
            ));
            annotate_path(callee, &Type::Unknown);
            return Type::Unknown;
        }

        if let Some(info) = self.functions.get(&path) {
            let sig = info.sig.clone();
            let ret = if self.check_call_args(&path, &sig.params, args, span) {
                sig.ret
            } else {
                Type::Unknown
            };
            annotate_path(callee, &ret);
            return ret;
        }

        if !path.contains('.')
            && let Some(info) = self.classes.get(&path)
        {
            let params: Vec<Type> = info.fields.iter().map(|(_, ty, _)| ty.clone()).collect();
            let ret = Type::Class(path.clone());
            self.check_call_args(&path, &params, args, span);
            annotate_path(callee, &ret);
            return ret;
        }

        for arg in args.iter_mut() {
            self.check_expr(arg);
        }
        let mut diag = Diagnostic::semantic(format!("unknown function '{path}'"), span);
        let candidates: Vec<&str> = self.functions.keys().map(|k| k.as_str()).collect();
        if let Some(suggestion) = did_you_mean(&path, candidates) {
            diag.message.push_str(&format!("; did you mean '{suggestion}'?"));
        }
        self.diagnostics.push(diag);
        annotate_path(callee, &Type::Unknown);
        Type::Unknown
    }

    /// Arity and per-argument compatibility; false means the arity was wrong
    /// and the call's type must not pretend to be resolved.
    fn check_call_args(
        &mut self,
        name: &str,
        params: &[Type],
        args: &mut [Expr],
        span: Span,
    ) -> bool {
        if args.len() != params.len() {
            for arg in args.iter_mut() {
                self.check_expr(arg);
            }
            self.diagnostics.push(Diagnostic::semantic(
                format!(
                    "'{name}' expects {} argument{}, found {}",
                    params.len(),
                    if params.len() == 1 { "" } else { "s" },
                    args.len()
                ),
                span,
            ));
            return false;
        }

        for (arg, param) in args.iter_mut().zip(params) {
            let arg_ty = self.check_expr(arg);
            let fits = self.assignable(param, &arg_ty) || literal_fits(param, arg);
            if !fits {
                self.diagnostics.push(Diagnostic::semantic(
                    format!("argument type mismatch: expected '{param}', found '{arg_ty}'"),
                    arg.span,
                ));
            }
        }
        true
    }

    fn check_array_init(&mut self, init: &mut Expr, element_ty: &Type) {
        let ExprKind::Lambda { params, body } = &mut init.kind else {
            // The grammar only builds lambdas here
            self.check_expr(init);
            return;
        };

        self.scopes.push_scope();
        match params.as_slice() {
            [] => {
                // The implicit index parameter
                let _ = self.scopes.define(
                    "it",
                    Type::Int,
                    Mutability::Val,
                    SymbolKind::Parameter,
                    init.span,
                    true,
                );
            }
            [(name, span)] => {
                let _ = self.scopes.define(
                    name,
                    Type::Int,
                    Mutability::Val,
                    SymbolKind::Parameter,
                    *span,
                    true,
                );
            }
            more => {
                self.diagnostics.push(Diagnostic::semantic(
                    format!(
                        "array initializer takes one index parameter, found {}",
                        more.len()
                    ),
                    init.span,
                ));
            }
        }

        let body_ty = self.check_expr(body);
        if !self.assignable(element_ty, &body_ty) && !literal_fits(element_ty, body) {
            self.diagnostics.push(Diagnostic::semantic(
                format!("array initializer has type '{body_ty}', expected '{element_ty}'"),
                body.span,
            ));
        }
        self.scopes.pop_scope();
        // The lambda node itself is opaque; give it the element type
        init.ty = Some(element_ty.clone());
    }

    // ==================== Helpers ====================

    /// [`TypeChecker::is_assignable`] extended with the class table: a sealed
    /// hierarchy member flows into any of its ancestors.
    fn assignable(&self, to: &Type, from: &Type) -> bool {
        if TypeChecker::is_assignable(to, from) {
            return true;
        }
        if from.is_nullable() && !to.is_nullable() {
            return false;
        }
        if let (Type::Class(parent), Type::Class(sub)) =
            (to.strip_nullable(), from.strip_nullable())
        {
            return self.is_subclass(sub, parent);
        }
        false
    }

    fn is_subclass(&self, sub: &str, parent: &str) -> bool {
        let mut current = sub;
        while let Some(info) = self.classes.get(current) {
            match info.supertype.as_deref() {
                Some(name) if name == parent => return true,
                Some(name) => current = name,
                None => return false,
            }
        }
        false
    }

    fn resolve_type(&mut self, ty: &TypeExpr) -> Type {
        match &ty.kind {
            TypeExprKind::Named(name) => match name.as_str() {
                "Byte" => Type::Byte,
                "Short" => Type::Short,
                "Int" => Type::Int,
                "Long" => Type::Long,
                "Float" => Type::Float,
                "Double" => Type::Double,
                "Boolean" => Type::Boolean,
                "Char" => Type::Char,
                "String" => Type::String,
                "Unit" => Type::Unit,
                "Any" => Type::Any,
                other => {
                    if self.classes.contains_key(other) {
                        Type::Class(other.to_string())
                    } else {
                        self.diagnostics.push(Diagnostic::semantic(
                            format!("unknown type '{other}'"),
                            ty.span,
                        ));
                        Type::Unknown
                    }
                }
            },
            TypeExprKind::Array(element) => Type::array(self.resolve_type(element)),
            TypeExprKind::Nullable(inner) => Type::nullable(self.resolve_type(inner)),
        }
    }

    /// Whether an expression reduces to a literal or closed arithmetic over
    /// literals and other constants, making it a legal `const val` initializer.
    fn is_const_expr(&mut self, expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::IntLiteral(_)
            | ExprKind::FloatLiteral { .. }
            | ExprKind::BoolLiteral(_)
            | ExprKind::CharLiteral(_)
            | ExprKind::StringLiteral(_) => true,
            ExprKind::Identifier(name) => self
                .scopes
                .lookup(name)
                .is_some_and(|s| s.mutability == Mutability::Const),
            ExprKind::Unary { operand, .. } => self.is_const_expr(operand),
            ExprKind::Binary { left, right, .. } => {
                self.is_const_expr(left) && self.is_const_expr(right)
            }
            ExprKind::Paren(inner) => self.is_const_expr(inner),
            _ => false,
        }
    }
}

/// Flatten `java.lang.Math.abs` style callee chains into a dotted path.
/// Safe-call links disqualify the chain; those are real expressions.
fn flatten_path(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Identifier(name) => Some(name.clone()),
        ExprKind::Member {
            base,
            name,
            safe: false,
        } => Some(format!("{}.{name}", flatten_path(base)?)),
        _ => None,
    }
}

/// Give every node of a resolved callee path a type, keeping the annotation
/// invariant for namespace-like segments that are not values themselves.
fn annotate_path(expr: &mut Expr, ty: &Type) {
    expr.ty = Some(ty.clone());
    if let ExprKind::Member { base, .. } = &mut expr.kind {
        annotate_path(base, ty);
    }
}

/// An integer literal may initialize a narrower slot when its value fits.
fn literal_fits(target: &Type, expr: &Expr) -> bool {
    let value = match &expr.kind {
        ExprKind::IntLiteral(value) => *value,
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match &operand.kind {
            ExprKind::IntLiteral(value) => -*value,
            _ => return false,
        },
        _ => return false,
    };
    match target.strip_nullable() {
        Type::Byte => i8::try_from(value).is_ok(),
        Type::Short => i16::try_from(value).is_ok(),
        Type::Int => i32::try_from(value).is_ok(),
        Type::Long => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::Parser;
    use crate::stdlib::default_signatures;

    fn analyze(source: &str) -> Vec<Diagnostic> {
        let (mut program, diags) = Parser::new(source).parse_program();
        assert!(diags.is_empty(), "parse diagnostics: {diags:?}");
        Analyzer::new(&default_signatures()).analyze(&mut program)
    }

    fn errors(source: &str) -> Vec<Diagnostic> {
        analyze(source)
            .into_iter()
            .filter(|d| d.is_error())
            .collect()
    }

    fn assert_clean(source: &str) {
        let diags = errors(source);
        assert!(diags.is_empty(), "unexpected errors: {diags:?}");
    }

    #[test]
    fn test_val_reassignment_rejected() {
        let diags = errors("fun main() { val x: Int = 5\n x = 6 }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("immutable"));
        // The note points back at the declaration
        let (_, note_span) = diags[0].note.clone().unwrap();
        assert_eq!(note_span.start, "fun main() { val ".len());
    }

    #[test]
    fn test_var_reassignment_allowed() {
        assert_clean("fun main() { var x = 5\n x = 6\n x += 1\n x++ }");
    }

    #[test]
    fn test_const_reassignment_rejected() {
        let diags = errors("const val LIMIT = 10\nfun main() { LIMIT = 20 }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("constant"));
    }

    #[test]
    fn test_const_requires_constant_initializer() {
        assert_clean("const val TWO = 1 + 1");
        let diags = errors("fun f(): Int { return 1 }\nconst val BAD = f()");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("compile-time constant"));
    }

    #[test]
    fn test_widening_rules() {
        assert_clean("fun main() { val r: Double = 10 / 2.0 }");
        assert_clean("fun main() { val r: Int = 10 / 3 }");
        let diags = errors("fun main() { val bad: Int = 10 / 2.0 }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("expected 'Int', found 'Double'"));
    }

    #[test]
    fn test_literal_fits_narrow_annotation() {
        assert_clean("fun main() { val b: Byte = 127 }");
        let diags = errors("fun main() { val b: Byte = 128 }");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_large_literal_is_long() {
        assert_clean("fun main() { val big: Long = 10000000000 }");
        let diags = errors("fun main() { val bad: Int = 10000000000 }");
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_null_dereference_reported() {
        let diags = errors("fun main() { val s: String? = null\n println(s.length) }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("possible null dereference"));
    }

    #[test]
    fn test_safe_call_with_elvis_is_clean() {
        assert_clean("fun main() { val s: String? = null\n println(s?.length ?: 0) }");
    }

    #[test]
    fn test_nullable_into_non_nullable_rejected() {
        let diags = errors("fun main() { val s: String? = null\n val t: String = s }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("expected 'String'"));
    }

    #[test]
    fn test_sealed_exhaustiveness() {
        let classes = "sealed class R\nclass A : R()\nclass B : R()\n";
        let diags = errors(&format!(
            "{classes}fun f(r: R) {{ when (r) {{ is A -> println(1) }} }}"
        ));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("'B'"), "got: {}", diags[0].message);

        assert_clean(&format!(
            "{classes}fun f(r: R) {{ when (r) {{ is A -> println(1)\n else -> println(2) }} }}"
        ));
        assert_clean(&format!(
            "{classes}fun f(r: R) {{ when (r) {{ is A -> println(1)\n is B -> println(2) }} }}"
        ));
    }

    #[test]
    fn test_non_sealed_when_warns_without_else() {
        let diags = analyze("fun main() { val x = 1\n when (x) { 1 -> println(1) } }");
        assert_eq!(diags.len(), 1);
        assert!(!diags[0].is_error());
        assert!(diags[0].message.contains("else"));
    }

    #[test]
    fn test_smart_cast_in_is_arm() {
        assert_clean(
            "sealed class Result\n\
             class Success(val value: String) : Result()\n\
             class Failure(val reason: String) : Result()\n\
             fun report(r: Result) {\n\
                 when (r) {\n\
                     is Success -> println(r.value)\n\
                     is Failure -> println(r.reason)\n\
                 }\n\
             }",
        );
    }

    #[test]
    fn test_unresolved_name_with_suggestion() {
        let diags = errors("fun main() { val counter = 1\n println(countr) }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("did you mean 'counter'"));
    }

    #[test]
    fn test_use_before_declaration() {
        let diags = errors("fun main() { println(x)\n val x = 1 }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unresolved name 'x'"));
    }

    #[test]
    fn test_unknown_function_with_suggestion() {
        let diags = errors("fun main() { printn(1) }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unknown function"));
        assert!(diags[0].message.contains("println"));
    }

    #[test]
    fn test_arity_mismatch() {
        let diags = errors("fun add(x: Int, y: Int): Int { return x + y }\nfun main() { add(1) }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("expects 2 arguments, found 1"));
    }

    #[test]
    fn test_argument_type_checked() {
        let diags = errors(
            "fun add(x: Int, y: Int): Int { return x + y }\nfun main() { add(1, \"two\") }",
        );
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("expected 'Int', found 'String'"));
    }

    #[test]
    fn test_dotted_builtin_call() {
        assert_clean("fun main() { println(java.lang.Math.abs(-10)) }");
    }

    #[test]
    fn test_deferred_val_initialization() {
        // The one permitted assignment of an uninitialized val
        assert_clean("fun main() { val x: Int\n x = 5\n println(x) }");
        let diags = errors("fun main() { val x: Int\n x = 5\n x = 6 }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("immutable"));
    }

    #[test]
    fn test_uninitialized_read_rejected() {
        let diags = errors("fun main() { var c: Int\n println(c) }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("before it has been initialized"));
    }

    #[test]
    fn test_assignment_chain_types() {
        assert_clean("fun main() { var a = 0\n var b = 0\n a = b = 3\n println(a + b) }");
    }

    #[test]
    fn test_array_construction_and_indexing() {
        assert_clean(
            "fun main() {\n\
                var data: Array<Int>(8) { 0 }\n\
                data[0] = 42\n\
                println(data.size)\n\
                println(data[0])\n\
                for (v in data) { println(v) }\n\
            }",
        );
        let diags = errors("fun main() { val a: Array<Int>(2) { \"x\" } }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("expected 'Int'"));
    }

    #[test]
    fn test_string_concatenation_and_templates() {
        assert_clean(
            "fun main() {\n\
                val a = 10\n\
                val b = 20\n\
                var c: Int\n\
                c = a + b\n\
                println(\"Sum: $c\")\n\
                println(\"total \" + c)\n\
            }",
        );
    }

    #[test]
    fn test_string_iteration_yields_char() {
        assert_clean("fun main() { for (ch in \"text\") { val c: Char = ch } }");
    }

    #[test]
    fn test_break_outside_loop() {
        let diags = errors("fun main() { break }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("'break' outside of a loop"));
    }

    #[test]
    fn test_shadowing_in_inner_scope() {
        assert_clean(
            "fun main() {\n\
                val x = 1\n\
                if (x == 1) { val x = \"inner\"\n println(x.length) }\n\
                println(x + 1)\n\
            }",
        );
    }

    #[test]
    fn test_scope_does_not_leak() {
        let diags = errors("fun main() { if (true) { val y = 1 }\n println(y) }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unresolved name 'y'"));
    }

    #[test]
    fn test_expression_body_return_inferred() {
        assert_clean("fun double(x: Int) = x * 2\nfun main() { val r: Int = double(21) }");
    }

    #[test]
    fn test_expression_types_annotated() {
        let source = "fun main() { val x = 1 + 2 }";
        let (mut program, _) = Parser::new(source).parse_program();
        let diags = Analyzer::new(&default_signatures()).analyze(&mut program);
        assert!(diags.is_empty());

        let DeclKind::Fun(fun) = &program.decls[0].kind else {
            panic!()
        };
        let FunBody::Block(block) = &fun.body else {
            panic!()
        };
        let StmtKind::Var(decl) = &block.stmts[0].kind else {
            panic!()
        };
        let init = decl.init.as_ref().unwrap();
        assert_eq!(init.ty, Some(Type::Int));
        let ExprKind::Binary { left, right, .. } = &init.kind else {
            panic!()
        };
        assert_eq!(left.ty, Some(Type::Int));
        assert_eq!(right.ty, Some(Type::Int));
    }
}
