//! Tree Traversal
//!
//! A borrowed, kind-tagged view over syntax nodes: uniform access to
//! `kind`, `span`, named fields, and children, plus a lazy depth-first
//! walk and an s-expression dump for structural comparison.

use serde::Serialize;

use crate::ast::printer::format_number;
use crate::ast::types::{
    Args, Block, Expr, ExprKind, FuncDef, Ident, Item, ParamList, Pattern, PatternKind, Program,
    Rule, Stmt, StmtKind, SwitchCase,
};
use crate::parser::types::Span;

// ─── Node Kinds ───────────────────────────────────────────

/// The discriminant of every node the tree can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    Program,
    Rule,
    Pattern,
    Block,
    IfStatement,
    WhileStatement,
    DoWhileStatement,
    ForStatement,
    ForInStatement,
    BreakStatement,
    ContinueStatement,
    NextStatement,
    NextFileStatement,
    ReturnStatement,
    DeleteStatement,
    ExitStatement,
    SwitchStatement,
    SwitchCase,
    PrintStatement,
    PrintfStatement,
    FuncDef,
    ParamList,
    Args,
    TernaryExp,
    BinaryExp,
    UnaryExp,
    UpdateExp,
    AssignmentExp,
    FieldRef,
    FuncCall,
    Identifier,
    Number,
    String,
    Regex,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Program => "program",
            NodeKind::Rule => "rule",
            NodeKind::Pattern => "pattern",
            NodeKind::Block => "block",
            NodeKind::IfStatement => "if_statement",
            NodeKind::WhileStatement => "while_statement",
            NodeKind::DoWhileStatement => "do_while_statement",
            NodeKind::ForStatement => "for_statement",
            NodeKind::ForInStatement => "for_in_statement",
            NodeKind::BreakStatement => "break_statement",
            NodeKind::ContinueStatement => "continue_statement",
            NodeKind::NextStatement => "next_statement",
            NodeKind::NextFileStatement => "nextfile_statement",
            NodeKind::ReturnStatement => "return_statement",
            NodeKind::DeleteStatement => "delete_statement",
            NodeKind::ExitStatement => "exit_statement",
            NodeKind::SwitchStatement => "switch_statement",
            NodeKind::SwitchCase => "switch_case",
            NodeKind::PrintStatement => "print_statement",
            NodeKind::PrintfStatement => "printf_statement",
            NodeKind::FuncDef => "func_def",
            NodeKind::ParamList => "param_list",
            NodeKind::Args => "args",
            NodeKind::TernaryExp => "ternary_exp",
            NodeKind::BinaryExp => "binary_exp",
            NodeKind::UnaryExp => "unary_exp",
            NodeKind::UpdateExp => "update_exp",
            NodeKind::AssignmentExp => "assignment_exp",
            NodeKind::FieldRef => "field_ref",
            NodeKind::FuncCall => "func_call",
            NodeKind::Identifier => "identifier",
            NodeKind::Number => "number",
            NodeKind::String => "string",
            NodeKind::Regex => "regex",
        }
    }
}

// ─── Node References ──────────────────────────────────────

/// A borrowed view of any node in the tree.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Program(&'a Program),
    Rule(&'a Rule),
    FuncDef(&'a FuncDef),
    ParamList(&'a ParamList),
    Pattern(&'a Pattern),
    Block(&'a Block),
    Stmt(&'a Stmt),
    SwitchCase(&'a SwitchCase),
    Expr(&'a Expr),
    Args(&'a Args),
    Ident(&'a Ident),
}

/// Expression statements and block statements are wrappers; as children
/// they appear as the expression or block node itself.
fn stmt_ref(stmt: &Stmt) -> NodeRef<'_> {
    match &stmt.kind {
        StmtKind::Expr(expr) => NodeRef::Expr(expr),
        StmtKind::Block(block) => NodeRef::Block(block),
        _ => NodeRef::Stmt(stmt),
    }
}

fn expr_kind(expr: &Expr) -> NodeKind {
    match &expr.kind {
        ExprKind::Number(_) => NodeKind::Number,
        ExprKind::Str(_) => NodeKind::String,
        ExprKind::Regex(_) => NodeKind::Regex,
        ExprKind::Ident(_) => NodeKind::Identifier,
        ExprKind::FieldRef { .. } => NodeKind::FieldRef,
        ExprKind::Unary { .. } => NodeKind::UnaryExp,
        ExprKind::Update { .. } => NodeKind::UpdateExp,
        ExprKind::Binary { .. } => NodeKind::BinaryExp,
        ExprKind::Ternary { .. } => NodeKind::TernaryExp,
        ExprKind::Assignment { .. } => NodeKind::AssignmentExp,
        ExprKind::Call { .. } => NodeKind::FuncCall,
    }
}

fn stmt_kind(stmt: &Stmt) -> NodeKind {
    match &stmt.kind {
        StmtKind::Expr(expr) => expr_kind(expr),
        StmtKind::Block(_) => NodeKind::Block,
        StmtKind::If { .. } => NodeKind::IfStatement,
        StmtKind::While { .. } => NodeKind::WhileStatement,
        StmtKind::DoWhile { .. } => NodeKind::DoWhileStatement,
        StmtKind::For { .. } => NodeKind::ForStatement,
        StmtKind::ForIn { .. } => NodeKind::ForInStatement,
        StmtKind::Break => NodeKind::BreakStatement,
        StmtKind::Continue => NodeKind::ContinueStatement,
        StmtKind::Next => NodeKind::NextStatement,
        StmtKind::NextFile => NodeKind::NextFileStatement,
        StmtKind::Return { .. } => NodeKind::ReturnStatement,
        StmtKind::Delete { .. } => NodeKind::DeleteStatement,
        StmtKind::Exit { .. } => NodeKind::ExitStatement,
        StmtKind::Switch { .. } => NodeKind::SwitchStatement,
        StmtKind::Print { .. } => NodeKind::PrintStatement,
        StmtKind::Printf { .. } => NodeKind::PrintfStatement,
    }
}

fn expr_children(expr: &Expr) -> Vec<NodeRef<'_>> {
    match &expr.kind {
        ExprKind::Number(_) | ExprKind::Str(_) | ExprKind::Regex(_) | ExprKind::Ident(_) => {
            Vec::new()
        }
        ExprKind::FieldRef { argument }
        | ExprKind::Unary { argument, .. }
        | ExprKind::Update { argument, .. } => vec![NodeRef::Expr(argument)],
        ExprKind::Binary { left, right, .. } => {
            vec![NodeRef::Expr(left), NodeRef::Expr(right)]
        }
        ExprKind::Ternary {
            condition,
            consequence,
            alternative,
        } => vec![
            NodeRef::Expr(condition),
            NodeRef::Expr(consequence),
            NodeRef::Expr(alternative),
        ],
        ExprKind::Assignment { left, right, .. } => {
            vec![NodeRef::Ident(left), NodeRef::Expr(right)]
        }
        ExprKind::Call { func_name, args } => {
            let mut children = vec![NodeRef::Ident(func_name)];
            if let Some(args) = args {
                children.push(NodeRef::Args(args));
            }
            children
        }
    }
}

fn stmt_children(stmt: &Stmt) -> Vec<NodeRef<'_>> {
    match &stmt.kind {
        StmtKind::Expr(expr) => expr_children(expr),
        StmtKind::Block(block) => block.statements.iter().map(stmt_ref).collect(),
        StmtKind::If {
            condition,
            consequence,
            alternative,
        } => {
            let mut children = vec![NodeRef::Expr(condition), stmt_ref(consequence)];
            if let Some(alternative) = alternative {
                children.push(stmt_ref(alternative));
            }
            children
        }
        StmtKind::While { condition, body } => {
            vec![NodeRef::Expr(condition), NodeRef::Block(body)]
        }
        StmtKind::DoWhile { body, condition } => {
            vec![NodeRef::Block(body), NodeRef::Expr(condition)]
        }
        StmtKind::For {
            initializer,
            condition,
            advancement,
            body,
        } => {
            let mut children = Vec::new();
            if let Some(initializer) = initializer {
                children.push(stmt_ref(initializer));
            }
            if let Some(condition) = condition {
                children.push(NodeRef::Expr(condition));
            }
            if let Some(advancement) = advancement {
                children.push(stmt_ref(advancement));
            }
            children.push(NodeRef::Block(body));
            children
        }
        StmtKind::ForIn { name, array, body } => vec![
            NodeRef::Ident(name),
            NodeRef::Ident(array),
            NodeRef::Block(body),
        ],
        StmtKind::Break | StmtKind::Continue | StmtKind::Next | StmtKind::NextFile => Vec::new(),
        StmtKind::Return { argument } | StmtKind::Exit { argument } => {
            argument.iter().map(NodeRef::Expr).collect()
        }
        StmtKind::Delete { name, subscript } => {
            let mut children = vec![NodeRef::Ident(name)];
            children.extend(subscript.iter().map(NodeRef::Expr));
            children
        }
        StmtKind::Switch { condition, cases } => {
            let mut children = vec![NodeRef::Expr(condition)];
            children.extend(cases.iter().map(NodeRef::SwitchCase));
            children
        }
        StmtKind::Print { args, redirect } => {
            let mut children: Vec<_> = args.iter().map(NodeRef::Expr).collect();
            if let Some(redirect) = redirect {
                children.push(NodeRef::Expr(&redirect.target));
            }
            children
        }
        StmtKind::Printf {
            format,
            args,
            redirect,
        } => {
            let mut children = vec![NodeRef::Expr(format)];
            children.extend(args.iter().map(NodeRef::Expr));
            if let Some(redirect) = redirect {
                children.push(NodeRef::Expr(&redirect.target));
            }
            children
        }
    }
}

fn expr_field<'a>(expr: &'a Expr, name: &str) -> Option<NodeRef<'a>> {
    match (&expr.kind, name) {
        (ExprKind::Ternary { condition, .. }, "condition") => Some(NodeRef::Expr(condition)),
        (ExprKind::Ternary { consequence, .. }, "consequence") => Some(NodeRef::Expr(consequence)),
        (ExprKind::Ternary { alternative, .. }, "alternative") => Some(NodeRef::Expr(alternative)),
        (ExprKind::Binary { left, .. }, "left") => Some(NodeRef::Expr(left)),
        (ExprKind::Binary { right, .. }, "right") => Some(NodeRef::Expr(right)),
        (ExprKind::FieldRef { argument }, "argument")
        | (ExprKind::Unary { argument, .. }, "argument")
        | (ExprKind::Update { argument, .. }, "argument") => Some(NodeRef::Expr(argument)),
        (ExprKind::Assignment { left, .. }, "left") => Some(NodeRef::Ident(left)),
        (ExprKind::Assignment { right, .. }, "right") => Some(NodeRef::Expr(right)),
        (ExprKind::Call { func_name, .. }, "func_name") => Some(NodeRef::Ident(func_name)),
        (ExprKind::Call { args, .. }, "args") => args.as_ref().map(NodeRef::Args),
        _ => None,
    }
}

fn stmt_field<'a>(stmt: &'a Stmt, name: &str) -> Option<NodeRef<'a>> {
    match (&stmt.kind, name) {
        (StmtKind::Expr(expr), _) => expr_field(expr, name),
        (StmtKind::If { condition, .. }, "condition") => Some(NodeRef::Expr(condition)),
        (StmtKind::If { consequence, .. }, "consequence") => Some(stmt_ref(consequence)),
        (StmtKind::If { alternative, .. }, "alternative") => alternative.as_deref().map(stmt_ref),
        (StmtKind::While { condition, .. }, "condition")
        | (StmtKind::DoWhile { condition, .. }, "condition")
        | (StmtKind::Switch { condition, .. }, "condition") => Some(NodeRef::Expr(condition)),
        (StmtKind::While { body, .. }, "body")
        | (StmtKind::DoWhile { body, .. }, "body")
        | (StmtKind::For { body, .. }, "body")
        | (StmtKind::ForIn { body, .. }, "body") => Some(NodeRef::Block(body)),
        (StmtKind::For { initializer, .. }, "initializer") => {
            initializer.as_deref().map(stmt_ref)
        }
        (StmtKind::For { condition, .. }, "condition") => condition.as_ref().map(NodeRef::Expr),
        (StmtKind::For { advancement, .. }, "advancement") => {
            advancement.as_deref().map(stmt_ref)
        }
        (StmtKind::ForIn { name: var, .. }, "name") => Some(NodeRef::Ident(var)),
        (StmtKind::ForIn { array, .. }, "array") => Some(NodeRef::Ident(array)),
        (StmtKind::Return { argument }, "argument") | (StmtKind::Exit { argument }, "argument") => {
            argument.as_ref().map(NodeRef::Expr)
        }
        (StmtKind::Delete { name: target, .. }, "name") => Some(NodeRef::Ident(target)),
        (StmtKind::Printf { format, .. }, "format") => Some(NodeRef::Expr(format)),
        (StmtKind::Print { redirect, .. }, "target")
        | (StmtKind::Printf { redirect, .. }, "target") => {
            redirect.as_ref().map(|r| NodeRef::Expr(&r.target))
        }
        _ => None,
    }
}

impl<'a> NodeRef<'a> {
    pub fn kind(&self) -> NodeKind {
        match *self {
            NodeRef::Program(_) => NodeKind::Program,
            NodeRef::Rule(_) => NodeKind::Rule,
            NodeRef::FuncDef(_) => NodeKind::FuncDef,
            NodeRef::ParamList(_) => NodeKind::ParamList,
            NodeRef::Pattern(_) => NodeKind::Pattern,
            NodeRef::Block(_) => NodeKind::Block,
            NodeRef::SwitchCase(_) => NodeKind::SwitchCase,
            NodeRef::Args(_) => NodeKind::Args,
            NodeRef::Ident(_) => NodeKind::Identifier,
            NodeRef::Stmt(stmt) => stmt_kind(stmt),
            NodeRef::Expr(expr) => expr_kind(expr),
        }
    }

    pub fn span(&self) -> Span {
        match *self {
            NodeRef::Program(program) => program.span,
            NodeRef::Rule(rule) => rule.span,
            NodeRef::FuncDef(def) => def.span,
            NodeRef::ParamList(params) => params.span,
            NodeRef::Pattern(pattern) => pattern.span,
            NodeRef::Block(block) => block.span,
            NodeRef::Stmt(stmt) => stmt.span,
            NodeRef::SwitchCase(case) => case.span,
            NodeRef::Expr(expr) => expr.span,
            NodeRef::Args(args) => args.span,
            NodeRef::Ident(ident) => ident.span,
        }
    }

    /// All children in source order, anonymous and named alike.
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        match *self {
            NodeRef::Program(program) => program
                .items
                .iter()
                .map(|item| match item {
                    Item::Rule(rule) => NodeRef::Rule(rule),
                    Item::FuncDef(def) => NodeRef::FuncDef(def),
                })
                .collect(),
            NodeRef::Rule(rule) => {
                let mut children = Vec::new();
                if let Some(pattern) = &rule.pattern {
                    children.push(NodeRef::Pattern(pattern));
                }
                if let Some(action) = &rule.action {
                    children.push(NodeRef::Block(action));
                }
                children
            }
            NodeRef::FuncDef(def) => {
                let mut children = vec![NodeRef::Ident(&def.name)];
                if let Some(params) = &def.params {
                    children.push(NodeRef::ParamList(params));
                }
                children.push(NodeRef::Block(&def.body));
                children
            }
            NodeRef::ParamList(params) => params.names.iter().map(NodeRef::Ident).collect(),
            NodeRef::Pattern(pattern) => match &pattern.kind {
                PatternKind::Expr(expr) => vec![NodeRef::Expr(expr)],
                PatternKind::Range { start, end } => {
                    vec![NodeRef::Expr(start), NodeRef::Expr(end)]
                }
                _ => Vec::new(),
            },
            NodeRef::Block(block) => block.statements.iter().map(stmt_ref).collect(),
            NodeRef::Stmt(stmt) => stmt_children(stmt),
            NodeRef::SwitchCase(case) => {
                let mut children = Vec::new();
                if let Some(value) = &case.value {
                    children.push(NodeRef::Expr(value));
                }
                children.extend(case.body.iter().map(stmt_ref));
                children
            }
            NodeRef::Expr(expr) => expr_children(expr),
            NodeRef::Args(args) => args.items.iter().map(NodeRef::Expr).collect(),
            NodeRef::Ident(_) => Vec::new(),
        }
    }

    /// Look up a named field, e.g. `condition`, `left`, `consequence`,
    /// `func_name`. Operator spellings are not nodes; they are exposed on
    /// the typed kinds instead.
    pub fn field(&self, name: &str) -> Option<NodeRef<'a>> {
        match *self {
            NodeRef::Rule(rule) => match name {
                "pattern" => rule.pattern.as_ref().map(NodeRef::Pattern),
                "action" => rule.action.as_ref().map(NodeRef::Block),
                _ => None,
            },
            NodeRef::FuncDef(def) => match name {
                "name" => Some(NodeRef::Ident(&def.name)),
                "params" => def.params.as_ref().map(NodeRef::ParamList),
                "body" => Some(NodeRef::Block(&def.body)),
                _ => None,
            },
            NodeRef::Pattern(pattern) => match (&pattern.kind, name) {
                (PatternKind::Range { start, .. }, "start") => Some(NodeRef::Expr(start)),
                (PatternKind::Range { end, .. }, "end") => Some(NodeRef::Expr(end)),
                _ => None,
            },
            NodeRef::SwitchCase(case) => match name {
                "value" => case.value.as_ref().map(NodeRef::Expr),
                _ => None,
            },
            NodeRef::Stmt(stmt) => stmt_field(stmt, name),
            NodeRef::Expr(expr) => expr_field(expr, name),
            _ => None,
        }
    }

    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        write_sexp(*self, &mut out);
        out
    }
}

// ─── Depth-First Walk ─────────────────────────────────────

/// A lazy preorder traversal over every node of a tree. Finite, and
/// restartable by calling `walk()` again.
pub struct Walk<'a> {
    stack: Vec<NodeRef<'a>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<NodeRef<'a>> {
        let node = self.stack.pop()?;
        let mut children = node.children();
        children.reverse();
        self.stack.extend(children);
        Some(node)
    }
}

impl Program {
    /// Depth-first preorder traversal of the whole tree.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![NodeRef::Program(self)],
        }
    }

    /// A compact structural dump: node kinds, operators, and literal
    /// values, without spans. Two structurally identical trees produce
    /// identical dumps.
    pub fn to_sexp(&self) -> String {
        NodeRef::Program(self).to_sexp()
    }
}

fn write_sexp(node: NodeRef, out: &mut String) {
    out.push('(');
    out.push_str(node.kind().name());

    // Kind-specific payload that children alone do not capture.
    match node {
        NodeRef::Expr(expr) => match &expr.kind {
            ExprKind::Number(n) => {
                out.push(' ');
                out.push_str(&format_number(*n));
            }
            ExprKind::Str(s) => {
                out.push(' ');
                out.push_str(&format!("{:?}", s));
            }
            ExprKind::Regex(pattern) => {
                out.push(' ');
                out.push('/');
                out.push_str(pattern);
                out.push('/');
            }
            ExprKind::Ident(name) => {
                out.push(' ');
                out.push_str(name);
            }
            ExprKind::Binary { operator, .. } => {
                out.push(' ');
                out.push_str(operator.symbol());
            }
            ExprKind::Unary { operator, .. } => {
                out.push(' ');
                out.push_str(operator.symbol());
            }
            ExprKind::Update {
                operator, prefix, ..
            } => {
                out.push(' ');
                out.push_str(operator.symbol());
                out.push(' ');
                out.push_str(if *prefix { "prefix" } else { "postfix" });
            }
            ExprKind::Assignment { operator, .. } => {
                out.push(' ');
                out.push_str(operator.symbol());
            }
            _ => {}
        },
        NodeRef::Stmt(stmt) => match &stmt.kind {
            StmtKind::For {
                initializer,
                condition,
                advancement,
                ..
            } => {
                out.push(' ');
                out.push(if initializer.is_some() { 'i' } else { '_' });
                out.push(if condition.is_some() { 'c' } else { '_' });
                out.push(if advancement.is_some() { 'a' } else { '_' });
            }
            StmtKind::Print {
                redirect: Some(redirect),
                ..
            }
            | StmtKind::Printf {
                redirect: Some(redirect),
                ..
            } => {
                out.push(' ');
                out.push_str(redirect.redirect_type.symbol());
            }
            _ => {}
        },
        NodeRef::Pattern(pattern) => match &pattern.kind {
            PatternKind::Regex(p) => {
                out.push(' ');
                out.push('/');
                out.push_str(p);
                out.push('/');
            }
            PatternKind::Begin => out.push_str(" BEGIN"),
            PatternKind::End => out.push_str(" END"),
            PatternKind::BeginFile => out.push_str(" BEGINFILE"),
            PatternKind::EndFile => out.push_str(" ENDFILE"),
            _ => {}
        },
        NodeRef::SwitchCase(case) if case.value.is_none() => out.push_str(" default"),
        NodeRef::Ident(ident) => {
            out.push(' ');
            out.push_str(&ident.name);
        }
        _ => {}
    }

    for child in node.children() {
        out.push(' ');
        write_sexp(child, out);
    }
    out.push(')');
}

// ─── Tests ───────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn parse_ok(input: &str) -> Program {
        let result = parse(input);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        result.program
    }

    #[test]
    fn test_sexp_shape() {
        let program = parse_ok("BEGIN { x = 1 }");
        assert_eq!(
            program.to_sexp(),
            "(program (rule (pattern BEGIN) (block (assignment_exp = (identifier x) (number 1)))))"
        );
    }

    #[test]
    fn test_walk_preorder() {
        let program = parse_ok("BEGIN { x = 1 }");
        let kinds: Vec<NodeKind> = program.walk().map(|node| node.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Program,
                NodeKind::Rule,
                NodeKind::Pattern,
                NodeKind::Block,
                NodeKind::AssignmentExp,
                NodeKind::Identifier,
                NodeKind::Number,
            ]
        );
    }

    #[test]
    fn test_walk_is_restartable_and_finite() {
        let program = parse_ok("{ print $1 }\nfunction f(a) { return a }");
        let first: usize = program.walk().count();
        let second: usize = program.walk().count();
        assert_eq!(first, second);
        assert!(first > 0);
    }

    #[test]
    fn test_field_lookup_on_if() {
        let program = parse_ok("{ if (a) b; else c }");
        let rule = match &program.items[0] {
            Item::Rule(rule) => rule,
            other => panic!("expected Rule, got {:?}", other),
        };
        let stmt = &rule.action.as_ref().unwrap().statements[0];
        let node = NodeRef::Stmt(stmt);
        assert_eq!(node.kind(), NodeKind::IfStatement);
        assert_eq!(
            node.field("condition").map(|n| n.kind()),
            Some(NodeKind::Identifier)
        );
        assert!(node.field("consequence").is_some());
        assert!(node.field("alternative").is_some());
        assert!(node.field("nonesuch").is_none());
    }

    #[test]
    fn test_field_lookup_on_func_def() {
        let program = parse_ok("function add(a, b) { return a + b }");
        let def = match &program.items[0] {
            Item::FuncDef(def) => def,
            other => panic!("expected FuncDef, got {:?}", other),
        };
        let node = NodeRef::FuncDef(def);
        assert_eq!(
            node.field("name").map(|n| n.kind()),
            Some(NodeKind::Identifier)
        );
        assert_eq!(
            node.field("params").map(|n| n.children().len()),
            Some(2)
        );
        assert_eq!(node.field("body").map(|n| n.kind()), Some(NodeKind::Block));
    }

    #[test]
    fn test_expression_statement_is_transparent() {
        // A bare expression statement appears as the expression node, the
        // way the block grammar nests it.
        let program = parse_ok("{ x + y }");
        let kinds: Vec<NodeKind> = program.walk().map(|node| node.kind()).collect();
        assert!(kinds.contains(&NodeKind::BinaryExp));
    }

    #[test]
    fn test_spans_on_walk() {
        let source = "{ print $1 }";
        let program = parse_ok(source);
        for node in program.walk() {
            let span = node.span();
            assert!(span.start <= span.end);
            assert!(span.end <= source.len());
        }
    }

    #[test]
    fn test_trivia_does_not_change_structure() {
        let bare = parse_ok("{x=1\ny=2}");
        let commented = parse_ok("{ x = 1   # set x\n  y = 2 }");
        assert_eq!(bare.to_sexp(), commented.to_sexp());
    }
}
