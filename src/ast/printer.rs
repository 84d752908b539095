//! Source Reconstruction
//!
//! Prints a syntax tree back to parseable AWK text. The output is
//! canonical rather than the original spelling: compound expressions are
//! parenthesized and separators normalized, so re-parsing it yields a
//! structurally identical tree.

use crate::ast::types::{
    Block, Expr, ExprKind, FuncDef, Item, Pattern, PatternKind, Program, Redirect, Rule, Stmt,
    StmtKind, UnaryOp,
};

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

impl Program {
    /// Reconstruct source text for the whole tree.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            match item {
                Item::Rule(rule) => write_rule(&mut out, rule),
                Item::FuncDef(def) => write_func_def(&mut out, def),
            }
        }
        out
    }
}

fn write_rule(out: &mut String, rule: &Rule) {
    if let Some(pattern) = &rule.pattern {
        write_pattern(out, pattern);
        if rule.action.is_some() {
            out.push(' ');
        }
    }
    if let Some(action) = &rule.action {
        write_block(out, action);
    }
}

fn write_func_def(out: &mut String, def: &FuncDef) {
    out.push_str("function ");
    out.push_str(&def.name.name);
    out.push('(');
    if let Some(params) = &def.params {
        for (i, param) in params.names.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&param.name);
        }
    }
    out.push_str(") ");
    write_block(out, &def.body);
}

fn write_pattern(out: &mut String, pattern: &Pattern) {
    match &pattern.kind {
        PatternKind::Expr(expr) => write_expr(out, expr),
        PatternKind::Range { start, end } => {
            write_expr(out, start);
            out.push_str(", ");
            write_expr(out, end);
        }
        PatternKind::Regex(p) => write_regex(out, p),
        PatternKind::Begin => out.push_str("BEGIN"),
        PatternKind::End => out.push_str("END"),
        PatternKind::BeginFile => out.push_str("BEGINFILE"),
        PatternKind::EndFile => out.push_str("ENDFILE"),
    }
}

fn write_block(out: &mut String, block: &Block) {
    if block.statements.is_empty() {
        out.push_str("{ }");
        return;
    }
    out.push_str("{ ");
    for (i, stmt) in block.statements.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        write_stmt(out, stmt);
    }
    out.push_str(" }");
}

fn write_stmt(out: &mut String, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Expr(expr) => write_expr(out, expr),
        StmtKind::Block(block) => write_block(out, block),
        StmtKind::If {
            condition,
            consequence,
            alternative,
        } => {
            out.push_str("if (");
            write_expr(out, condition);
            out.push_str(") ");
            write_stmt(out, consequence);
            if let Some(alternative) = alternative {
                out.push_str("; else ");
                write_stmt(out, alternative);
            }
        }
        StmtKind::While { condition, body } => {
            out.push_str("while (");
            write_expr(out, condition);
            out.push_str(") ");
            write_block(out, body);
        }
        StmtKind::DoWhile { body, condition } => {
            out.push_str("do ");
            write_block(out, body);
            out.push_str(" while (");
            write_expr(out, condition);
            out.push(')');
        }
        StmtKind::For {
            initializer,
            condition,
            advancement,
            body,
        } => {
            out.push_str("for (");
            if let Some(initializer) = initializer {
                write_stmt(out, initializer);
            }
            out.push_str("; ");
            if let Some(condition) = condition {
                write_expr(out, condition);
            }
            out.push_str("; ");
            if let Some(advancement) = advancement {
                write_stmt(out, advancement);
            }
            out.push_str(") ");
            write_block(out, body);
        }
        StmtKind::ForIn { name, array, body } => {
            out.push_str("for (");
            out.push_str(&name.name);
            out.push_str(" in ");
            out.push_str(&array.name);
            out.push_str(") ");
            write_block(out, body);
        }
        StmtKind::Break => out.push_str("break"),
        StmtKind::Continue => out.push_str("continue"),
        StmtKind::Next => out.push_str("next"),
        StmtKind::NextFile => out.push_str("nextfile"),
        StmtKind::Return { argument } => {
            out.push_str("return");
            if let Some(argument) = argument {
                out.push(' ');
                write_expr(out, argument);
            }
        }
        StmtKind::Exit { argument } => {
            out.push_str("exit");
            if let Some(argument) = argument {
                out.push(' ');
                write_expr(out, argument);
            }
        }
        StmtKind::Delete { name, subscript } => {
            out.push_str("delete ");
            out.push_str(&name.name);
            if !subscript.is_empty() {
                out.push('[');
                for (i, expr) in subscript.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_expr(out, expr);
                }
                out.push(']');
            }
        }
        StmtKind::Switch { condition, cases } => {
            out.push_str("switch (");
            write_expr(out, condition);
            out.push_str(") { ");
            for (i, case) in cases.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                match &case.value {
                    Some(value) => {
                        out.push_str("case ");
                        write_case_value(out, value);
                        out.push(':');
                    }
                    None => out.push_str("default:"),
                }
                for (j, stmt) in case.body.iter().enumerate() {
                    out.push_str(if j == 0 { " " } else { "; " });
                    write_stmt(out, stmt);
                }
            }
            out.push_str(" }");
        }
        StmtKind::Print { args, redirect } => {
            out.push_str("print");
            for (i, arg) in args.iter().enumerate() {
                out.push_str(if i == 0 { " " } else { ", " });
                write_expr(out, arg);
            }
            write_redirect(out, redirect);
        }
        StmtKind::Printf {
            format,
            args,
            redirect,
        } => {
            out.push_str("printf(");
            write_expr(out, format);
            for arg in args {
                out.push_str(", ");
                write_expr(out, arg);
            }
            out.push(')');
            write_redirect(out, redirect);
        }
    }
}

/// Case labels are bare literals; a parenthesized form would not re-parse
/// as a label.
fn write_case_value(out: &mut String, value: &Expr) {
    match &value.kind {
        ExprKind::Unary {
            operator: UnaryOp::Neg,
            argument,
        } => {
            out.push('-');
            write_expr(out, argument);
        }
        _ => write_expr(out, value),
    }
}

fn write_redirect(out: &mut String, redirect: &Option<Redirect>) {
    if let Some(redirect) = redirect {
        out.push(' ');
        out.push_str(redirect.redirect_type.symbol());
        out.push(' ');
        write_expr(out, &redirect.target);
    }
}

fn write_expr(out: &mut String, expr: &Expr) {
    match &expr.kind {
        ExprKind::Number(n) => out.push_str(&format_number(*n)),
        ExprKind::Str(s) => write_string_literal(out, s),
        ExprKind::Regex(p) => write_regex(out, p),
        ExprKind::Ident(name) => out.push_str(name),
        ExprKind::FieldRef { argument } => {
            out.push_str("($");
            write_expr(out, argument);
            out.push(')');
        }
        ExprKind::Unary { operator, argument } => {
            out.push('(');
            out.push_str(operator.symbol());
            write_expr(out, argument);
            out.push(')');
        }
        ExprKind::Update {
            operator,
            argument,
            prefix,
        } => {
            out.push('(');
            if *prefix {
                out.push_str(operator.symbol());
                write_expr(out, argument);
            } else {
                write_expr(out, argument);
                out.push_str(operator.symbol());
            }
            out.push(')');
        }
        ExprKind::Binary {
            operator,
            left,
            right,
        } => {
            out.push('(');
            write_expr(out, left);
            out.push(' ');
            out.push_str(operator.symbol());
            out.push(' ');
            write_expr(out, right);
            out.push(')');
        }
        ExprKind::Ternary {
            condition,
            consequence,
            alternative,
        } => {
            out.push('(');
            write_expr(out, condition);
            out.push_str(" ? ");
            write_expr(out, consequence);
            out.push_str(" : ");
            write_expr(out, alternative);
            out.push(')');
        }
        ExprKind::Assignment {
            operator,
            left,
            right,
        } => {
            out.push('(');
            out.push_str(&left.name);
            out.push(' ');
            out.push_str(operator.symbol());
            out.push(' ');
            write_expr(out, right);
            out.push(')');
        }
        ExprKind::Call { func_name, args } => {
            out.push_str(&func_name.name);
            out.push('(');
            if let Some(args) = args {
                for (i, arg) in args.items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_expr(out, arg);
                }
            }
            out.push(')');
        }
    }
}

fn write_regex(out: &mut String, pattern: &str) {
    out.push('/');
    out.push_str(pattern);
    out.push('/');
}

/// Re-encode a decoded string value using only the escape forms the
/// lexer accepts. A double quote has no single-character escape in this
/// grammar, so it is emitted as the two-digit hex form.
fn write_string_literal(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\x22"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0B' => out.push_str("\\v"),
            '\x0C' => out.push_str("\\f"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
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
    fn test_to_source_canonical_form() {
        let program = parse_ok("BEGIN { x = 1 }");
        assert_eq!(program.to_source(), "BEGIN { (x = 1) }");
    }

    #[test]
    fn test_string_reencoding() {
        let program = parse_ok(r#"{ s = "tab\t quote\x22 nl\n" }"#);
        let printed = program.to_source();
        assert!(printed.contains(r"\t"));
        assert!(printed.contains(r"\x22"));
        assert!(printed.contains(r"\n"));
    }

    #[test]
    fn test_print_parse_print_is_idempotent() {
        // parse ∘ print ∘ parse must preserve structure exactly.
        let sources = [
            "BEGIN { x = 1 }",
            "{ print $1, $2 > \"out\" }",
            "{ print }",
            "/re/ { n++ }",
            "NR > 1, NR < 10 { print }",
            "NR % 2",
            "function f(a, b) { return a + b ^ 2 }",
            "function noop() { }",
            "{ if (a) if (b) x; else y }",
            "{ if (a > 1) { x = 2 } else { x = 3 } }",
            "{ for (i = 0; i < 10; i++) { print i } }",
            "{ for (; i < 10; ) { i += 2 } }",
            "{ for (;;) { break } }",
            "{ for (k in arr) { delete arr[k] } }",
            "{ delete arr[i, j] }",
            "{ switch (x) { case 1: next; case \"s\": exit 1; case /re/: continue; default: print } }",
            "{ do { i-- } while (i > 0) }",
            "{ x = a ? b : c ? d : e }",
            "{ y = -a++ + 2 ^ 3 ^ 2 }",
            "{ z = $0 ~ /x\\/y/ }",
            "{ printf \"%s-%d\\n\", name, n | \"sort -u\" }",
            "{ printf(\"%s\", x) >> \"log\" }",
            "{ s = \"tab\\t quote\\x22 octal\\101\" }",
            "{ x = k in arr && !(j in arr) }",
            "{ v = f(g(1), $2) / 2 }",
            "{ x = a |& b; nextfile }",
            "BEGINFILE { n = 0 }\nENDFILE { print n }",
            "{ $(i + 1); $NF }",
        ];
        for source in sources {
            let first = parse(source);
            assert!(
                first.diagnostics.is_empty(),
                "diagnostics for {:?}: {:?}",
                source,
                first.diagnostics
            );
            let printed = first.program.to_source();
            let second = parse(&printed);
            assert!(
                second.diagnostics.is_empty(),
                "reparse diagnostics for {:?} -> {:?}: {:?}",
                source,
                printed,
                second.diagnostics
            );
            assert_eq!(
                first.program.to_sexp(),
                second.program.to_sexp(),
                "round trip changed structure for {:?} -> {:?}",
                source,
                printed
            );
        }
    }
}
