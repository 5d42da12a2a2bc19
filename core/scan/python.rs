use log;
use rustpython_parser::{Parse, ast};
use serde_json::{Map, Number, Value};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeclarationSummary {
    pub classes: Vec<String>,
    pub functions: Vec<String>,
}

impl DeclarationSummary {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.functions.is_empty()
    }
}

/// A queued syntax node. Except handlers and match cases sit one level
/// above their bodies, so those bodies come after the enclosing level.
enum Node<'a> {
    Stmt(&'a ast::Stmt),
    Handler(&'a [ast::Stmt]),
    Case(&'a [ast::Stmt]),
}

/// Collects class and function names, methods and nested definitions
/// included, in breadth-first order. `async def` names are not collected. Returns `None` when the source does not
/// parse.
pub fn scan_declarations(source: &str, source_path: &str) -> Option<DeclarationSummary> {
    let suite = match ast::Suite::parse(source, source_path) {
        Ok(suite) => suite,
        Err(e) => {
            log::debug!("Declaration scan skipped for {}: {}", source_path, e);
            return None;
        }
    };

    let mut summary = DeclarationSummary::default();
    let mut queue: VecDeque<Node> = suite.iter().map(Node::Stmt).collect();

    while let Some(node) = queue.pop_front() {
        let stmt = match node {
            Node::Stmt(stmt) => stmt,
            Node::Handler(body) | Node::Case(body) => {
                queue.extend(body.iter().map(Node::Stmt));
                continue;
            }
        };
        match stmt {
            ast::Stmt::ClassDef(def) => {
                summary.classes.push(def.name.as_str().to_string());
                queue.extend(def.body.iter().map(Node::Stmt));
            }
            ast::Stmt::FunctionDef(def) => {
                summary.functions.push(def.name.as_str().to_string());
                queue.extend(def.body.iter().map(Node::Stmt));
            }
            // Coroutines are not listed; only their bodies are searched.
            ast::Stmt::AsyncFunctionDef(def) => queue.extend(def.body.iter().map(Node::Stmt)),
            ast::Stmt::If(node) => {
                queue.extend(node.body.iter().chain(node.orelse.iter()).map(Node::Stmt));
            }
            ast::Stmt::For(node) => {
                queue.extend(node.body.iter().chain(node.orelse.iter()).map(Node::Stmt));
            }
            ast::Stmt::AsyncFor(node) => {
                queue.extend(node.body.iter().chain(node.orelse.iter()).map(Node::Stmt));
            }
            ast::Stmt::While(node) => {
                queue.extend(node.body.iter().chain(node.orelse.iter()).map(Node::Stmt));
            }
            ast::Stmt::With(node) => queue.extend(node.body.iter().map(Node::Stmt)),
            ast::Stmt::AsyncWith(node) => queue.extend(node.body.iter().map(Node::Stmt)),
            ast::Stmt::Try(node) => {
                queue.extend(node.body.iter().map(Node::Stmt));
                for handler in &node.handlers {
                    #[allow(irrefutable_let_patterns)]
                    if let ast::ExceptHandler::ExceptHandler(h) = handler {
                        queue.push_back(Node::Handler(&h.body));
                    }
                }
                queue.extend(
                    node.orelse
                        .iter()
                        .chain(node.finalbody.iter())
                        .map(Node::Stmt),
                );
            }
            ast::Stmt::Match(node) => {
                queue.extend(node.cases.iter().map(|case| Node::Case(&case.body)));
            }
            _ => {}
        }
    }

    log::trace!(
        "Scanned {}: {} classes, {} functions",
        source_path,
        summary.classes.len(),
        summary.functions.len()
    );
    Some(summary)
}

/// Evaluates a source file holding a single literal expression (dicts,
/// lists, tuples, sets, strings, numbers, booleans, `None`) into JSON.
/// Names, calls and operators other than unary sign are refused.
pub fn literal_eval(source: &str, source_path: &str) -> Result<Value, String> {
    let suite = ast::Suite::parse(source, source_path).map_err(|e| e.to_string())?;
    match suite.as_slice() {
        [ast::Stmt::Expr(stmt)] => expr_to_json(&stmt.value),
        [] => Err("file holds no expression".to_string()),
        _ => Err("file must hold exactly one literal expression".to_string()),
    }
}

fn expr_to_json(expr: &ast::Expr) -> Result<Value, String> {
    match expr {
        ast::Expr::Constant(c) => constant_to_json(&c.value),
        ast::Expr::Dict(dict) => {
            let mut map = Map::new();
            for (key, value) in dict.keys.iter().zip(dict.values.iter()) {
                let key = key
                    .as_ref()
                    .ok_or_else(|| "dict unpacking is not a literal".to_string())?;
                map.insert(json_key(expr_to_json(key)?)?, expr_to_json(value)?);
            }
            Ok(Value::Object(map))
        }
        ast::Expr::List(list) => elements_to_json(&list.elts),
        ast::Expr::Tuple(tuple) => elements_to_json(&tuple.elts),
        ast::Expr::Set(set) => elements_to_json(&set.elts),
        ast::Expr::UnaryOp(op) => {
            let operand = expr_to_json(&op.operand)?;
            match (&op.op, operand) {
                (ast::UnaryOp::UAdd, Value::Number(n)) => Ok(Value::Number(n)),
                (ast::UnaryOp::USub, Value::Number(n)) => negate(&n),
                _ => Err("only numeric sign operators are allowed".to_string()),
            }
        }
        _ => Err("malformed node or string".to_string()),
    }
}

fn elements_to_json(elts: &[ast::Expr]) -> Result<Value, String> {
    elts.iter()
        .map(expr_to_json)
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn constant_to_json(constant: &ast::Constant) -> Result<Value, String> {
    match constant {
        ast::Constant::None => Ok(Value::Null),
        ast::Constant::Bool(b) => Ok(Value::Bool(*b)),
        ast::Constant::Str(s) => Ok(Value::String(s.clone())),
        ast::Constant::Bytes(bytes) => Ok(Value::String(String::from_utf8_lossy(bytes).into_owned())),
        ast::Constant::Int(i) => Ok(integer_to_json(&i.to_string())),
        ast::Constant::Float(f) => Ok(Number::from_f64(*f).map_or(Value::Null, Value::Number)),
        ast::Constant::Tuple(items) => items
            .iter()
            .map(constant_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        _ => Err("unsupported constant".to_string()),
    }
}

fn integer_to_json(digits: &str) -> Value {
    if let Ok(n) = digits.parse::<i64>() {
        Value::from(n)
    } else if let Ok(n) = digits.parse::<u64>() {
        Value::from(n)
    } else {
        Value::String(digits.to_string())
    }
}

fn negate(n: &Number) -> Result<Value, String> {
    if let Some(i) = n.as_i64() {
        return Ok(i.checked_neg().map_or_else(
            || integer_to_json(&format!("-{}", n)),
            Value::from,
        ));
    }
    if let Some(u) = n.as_u64() {
        return Ok(integer_to_json(&format!("-{}", u)));
    }
    n.as_f64()
        .and_then(|f| Number::from_f64(-f))
        .map(Value::Number)
        .ok_or_else(|| "cannot negate number".to_string())
}

/// JSON object keys must be strings; scalars are spelled the way a JSON
/// encoder would spell them.
fn json_key(key: Value) -> Result<String, String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        _ => Err("dict keys must be scalar".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collects_classes_and_methods() {
        let source = r#"
from odoo import models

class SaleOrder(models.Model):
    _inherit = "sale.order"

    def action_confirm(self):
        return super().action_confirm()

def helper():
    pass
"#;
        let summary = scan_declarations(source, "models/sale.py").unwrap();
        assert_eq!(summary.classes, vec!["SaleOrder"]);
        assert_eq!(summary.functions, vec!["helper", "action_confirm"]);
    }

    #[test]
    fn nested_blocks_are_visited() {
        let source = r#"
try:
    import lxml
except ImportError:
    def fallback():
        pass
if True:
    class Inner:
        async def run(self):
            pass
"#;
        let summary = scan_declarations(source, "x.py").unwrap();
        assert_eq!(summary.classes, vec!["Inner"]);
        assert_eq!(summary.functions, vec!["fallback"]);
    }

    #[test]
    fn coroutines_are_not_listed_but_their_bodies_are_searched() {
        let summary = scan_declarations("async def handler():\n    pass\n", "c.py").unwrap();
        assert!(summary.functions.is_empty());

        let source = "async def outer():\n    def inner():\n        pass\n";
        let summary = scan_declarations(source, "c.py").unwrap();
        assert_eq!(summary.functions, vec!["inner"]);
    }

    #[test]
    fn handler_and_case_bodies_come_after_their_level() {
        let source = r#"
try:
    pass
except Exception:
    def a():
        pass
else:
    def b():
        pass
"#;
        let summary = scan_declarations(source, "t.py").unwrap();
        assert_eq!(summary.functions, vec!["b", "a"]);

        let source = r#"
match x:
    case 1:
        def c():
            pass
def d():
    pass
"#;
        let summary = scan_declarations(source, "m.py").unwrap();
        assert_eq!(summary.functions, vec!["d", "c"]);
    }

    #[test]
    fn syntax_errors_yield_none() {
        assert!(scan_declarations("def broken(:\n    pass\n", "bad.py").is_none());
    }

    #[test]
    fn empty_module_scans_to_empty_summary() {
        let summary = scan_declarations("", "__init__.py").unwrap();
        assert!(summary.is_empty());
    }

    #[test]
    fn evaluates_a_manifest_dict() {
        let source = r#"
# -*- coding: utf-8 -*-
{
    'name': "Sale Extra",
    'version': '16.0.1.0.0',
    'depends': ['sale', 'stock'],
    'installable': True,
    'sequence': -5,
    'price': 9.5,
    'images': ('a.png',),
    'external_dependencies': {'python': []},
    'license': None,
}
"#;
        let value = literal_eval(source, "__manifest__.py").unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Sale Extra",
                "version": "16.0.1.0.0",
                "depends": ["sale", "stock"],
                "installable": true,
                "sequence": -5,
                "price": 9.5,
                "images": ["a.png"],
                "external_dependencies": {"python": []},
                "license": null,
            })
        );
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.first().map(|k| k.as_str()), Some("name"));
    }

    #[test]
    fn refuses_non_literals() {
        assert!(literal_eval("{'a': open('x')}", "m.py").is_err());
        assert!(literal_eval("x = {}", "m.py").is_err());
        assert!(literal_eval("{**base}", "m.py").is_err());
        assert!(literal_eval("", "m.py").is_err());
    }

    #[test]
    fn scalar_keys_become_strings() {
        let value = literal_eval("{1: 'a', None: 'b'}", "m.py").unwrap();
        assert_eq!(value, json!({"1": "a", "null": "b"}));
    }
}
