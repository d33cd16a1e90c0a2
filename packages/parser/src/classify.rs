//! Static-value classifier
//!
//! Reduces an expression to the shape the extractor can hoist ahead of time.
//! `||`, `&&` and `??` with a literal left operand short-circuit at compile
//! time; with a non-literal left operand they become a [`Classified::Conditional`]
//! keyed on that operand.

use crate::ast::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
}

impl Literal {
    pub fn is_truthy(&self) -> bool {
        match self {
            Literal::Str(s) => !s.is_empty(),
            Literal::Num(n) => *n != 0.0 && !n.is_nan(),
            Literal::Bool(b) => *b,
            Literal::Null => false,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Literal::Null)
    }
}

/// How a runtime condition is tested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    Truthy,
    NotNullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub span: Span,
    pub kind: ConditionKind,
}

impl Condition {
    /// JS source that evaluates the condition
    pub fn to_js(&self, source: &str) -> String {
        let text = self.span.text(source);
        match self.kind {
            ConditionKind::Truthy => format!("({})", text),
            ConditionKind::NotNullish => format!("({}) != null", text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Literal(Literal, Span),
    Array(Vec<Classified>, Span),
    Object(Vec<(String, Classified)>, Span),
    Conditional {
        condition: Condition,
        consequent: Box<Classified>,
        alternate: Box<Classified>,
        span: Span,
    },
    Dynamic(Span),
}

impl Classified {
    pub fn span(&self) -> Span {
        match self {
            Classified::Literal(_, span)
            | Classified::Array(_, span)
            | Classified::Object(_, span)
            | Classified::Conditional { span, .. }
            | Classified::Dynamic(span) => *span,
        }
    }

    /// First runtime-only value anywhere in the tree
    pub fn first_dynamic(&self) -> Option<Span> {
        match self {
            Classified::Literal(..) => None,
            Classified::Dynamic(span) => Some(*span),
            Classified::Array(items, _) => items.iter().find_map(Classified::first_dynamic),
            Classified::Object(entries, _) => entries.iter().find_map(|(_, v)| v.first_dynamic()),
            Classified::Conditional {
                consequent,
                alternate,
                ..
            } => consequent.first_dynamic().or_else(|| alternate.first_dynamic()),
        }
    }

    pub fn is_static(&self) -> bool {
        self.first_dynamic().is_none()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Classified::Literal(Literal::Str(s), _) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Classified::Literal(Literal::Num(n), _) => Some(*n),
            _ => None,
        }
    }
}

/// Classify an expression tree
pub fn classify(expr: &Expr) -> Classified {
    let span = expr.span();
    match expr {
        Expr::Str { value, .. } => Classified::Literal(Literal::Str(value.clone()), span),
        Expr::Template {
            cooked: Some(value),
            ..
        } => Classified::Literal(Literal::Str(value.clone()), span),
        Expr::Num { value, .. } => Classified::Literal(Literal::Num(*value), span),
        Expr::Bool { value, .. } => Classified::Literal(Literal::Bool(*value), span),
        Expr::Null { .. } | Expr::Undefined { .. } => Classified::Literal(Literal::Null, span),
        Expr::Paren { expression, .. } => classify(expression),
        Expr::Unary { op, argument, .. } => classify_unary(*op, argument, span),
        Expr::Binary {
            op: BinaryOp::Add,
            left,
            right,
            ..
        } => match (classify(left), classify(right)) {
            (Classified::Literal(l, _), Classified::Literal(r, _)) => match (l, r) {
                (Literal::Num(a), Literal::Num(b)) => Classified::Literal(Literal::Num(a + b), span),
                (Literal::Str(a), Literal::Str(b)) => {
                    Classified::Literal(Literal::Str(a + &b), span)
                }
                (Literal::Str(a), Literal::Num(b)) => {
                    Classified::Literal(Literal::Str(a + &format_number(b)), span)
                }
                (Literal::Num(a), Literal::Str(b)) => {
                    Classified::Literal(Literal::Str(format_number(a) + &b), span)
                }
                _ => Classified::Dynamic(span),
            },
            _ => Classified::Dynamic(span),
        },
        Expr::Array { elements, .. } => {
            let mut items = Vec::with_capacity(elements.len());
            for element in elements {
                match element {
                    ArrayElement::Expr(expr) => items.push(classify(expr)),
                    ArrayElement::Hole(hole) => items.push(Classified::Literal(Literal::Null, *hole)),
                    ArrayElement::Spread(_) => return Classified::Dynamic(span),
                }
            }
            Classified::Array(items, span)
        }
        Expr::Object { properties, .. } => {
            let mut entries = Vec::with_capacity(properties.len());
            for property in properties {
                match property {
                    Property::KeyValue { key, value, .. } => match key.as_static() {
                        Some(key) => entries.push((key, classify(value))),
                        None => return Classified::Dynamic(span),
                    },
                    Property::Shorthand { name, span } => {
                        entries.push((name.clone(), Classified::Dynamic(*span)))
                    }
                    Property::Spread { .. } | Property::Opaque { .. } => {
                        return Classified::Dynamic(span)
                    }
                }
            }
            Classified::Object(entries, span)
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
            ..
        } => match classify(test) {
            Classified::Literal(lit, _) => {
                if lit.is_truthy() {
                    classify(consequent)
                } else {
                    classify(alternate)
                }
            }
            _ => Classified::Conditional {
                condition: Condition {
                    span: test.span(),
                    kind: ConditionKind::Truthy,
                },
                consequent: Box::new(classify(consequent)),
                alternate: Box::new(classify(alternate)),
                span,
            },
        },
        Expr::Logical {
            op, left, right, ..
        } => classify_logical(*op, left, right, span),
        _ => Classified::Dynamic(span),
    }
}

fn classify_unary(op: UnaryOp, argument: &Expr, span: Span) -> Classified {
    match (op, classify(argument)) {
        (UnaryOp::Minus, Classified::Literal(Literal::Num(n), _)) => {
            Classified::Literal(Literal::Num(-n), span)
        }
        (UnaryOp::Plus, Classified::Literal(Literal::Num(n), _)) => {
            Classified::Literal(Literal::Num(n), span)
        }
        (UnaryOp::Not, Classified::Literal(lit, _)) => {
            Classified::Literal(Literal::Bool(!lit.is_truthy()), span)
        }
        _ => Classified::Dynamic(span),
    }
}

fn classify_logical(op: LogicalOp, left: &Expr, right: &Expr, span: Span) -> Classified {
    let left_class = classify(left);

    if let Classified::Literal(lit, _) = &left_class {
        let take_left = match op {
            LogicalOp::Or => lit.is_truthy(),
            LogicalOp::And => !lit.is_truthy(),
            LogicalOp::Nullish => !lit.is_nullish(),
        };
        return if take_left { left_class } else { classify(right) };
    }

    let test = left.span();
    let (kind, consequent, alternate) = match op {
        // `cond && value`: a falsy `cond` styles nothing
        LogicalOp::And => (
            ConditionKind::Truthy,
            classify(right),
            Classified::Literal(Literal::Null, test),
        ),
        LogicalOp::Or => (ConditionKind::Truthy, left_class, classify(right)),
        LogicalOp::Nullish => (ConditionKind::NotNullish, left_class, classify(right)),
    };

    Classified::Conditional {
        condition: Condition { span: test, kind },
        consequent: Box::new(consequent),
        alternate: Box::new(alternate),
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn c(source: &str) -> Classified {
        classify(&parse(source).unwrap())
    }

    #[test]
    fn test_literals() {
        assert!(matches!(c(r#""red""#), Classified::Literal(Literal::Str(ref s), _) if s == "red"));
        assert!(matches!(c("-4"), Classified::Literal(Literal::Num(n), _) if n == -4.0));
        assert!(matches!(c("undefined"), Classified::Literal(Literal::Null, _)));
        assert!(matches!(c("`10px`"), Classified::Literal(Literal::Str(ref s), _) if s == "10px"));
    }

    #[test]
    fn test_identifier_is_dynamic() {
        assert!(matches!(c("someVariable"), Classified::Dynamic(_)));
        assert!(matches!(c("`${a}px`"), Classified::Dynamic(_)));
    }

    #[test]
    fn test_object_with_literal_ternary_is_static() {
        let classified = c(r#"{ color: condition ? "red" : "blue" }"#);
        assert!(classified.is_static());
        let Classified::Object(entries, _) = classified else {
            panic!("expected object");
        };
        assert!(matches!(entries[0].1, Classified::Conditional { .. }));
    }

    #[test]
    fn test_object_with_variable_is_dynamic() {
        let source = "{ color: someVariable }";
        let classified = c(source);
        let span = classified.first_dynamic().unwrap();
        assert_eq!(span.text(source), "someVariable");
    }

    #[test]
    fn test_shorthand_property_is_dynamic() {
        assert!(!c("{ color }").is_static());
    }

    #[test]
    fn test_spread_object_is_dynamic() {
        assert!(matches!(c("{ ...base, color: 'red' }"), Classified::Dynamic(_)));
    }

    #[test]
    fn test_literal_short_circuit() {
        assert!(matches!(c(r#""" || "red""#), Classified::Literal(Literal::Str(ref s), _) if s == "red"));
        assert!(matches!(c(r#"null ?? 12"#), Classified::Literal(Literal::Num(n), _) if n == 12.0));
        assert!(matches!(c(r#"false && "red""#), Classified::Literal(Literal::Bool(false), _)));
    }

    #[test]
    fn test_dynamic_and_becomes_conditional() {
        let source = r#"active && { color: "red" }"#;
        let Classified::Conditional {
            condition,
            consequent,
            alternate,
            ..
        } = c(source)
        else {
            panic!("expected conditional");
        };
        assert_eq!(condition.to_js(source), "(active)");
        assert!(matches!(*consequent, Classified::Object(..)));
        assert!(matches!(*alternate, Classified::Literal(Literal::Null, _)));
    }

    #[test]
    fn test_dynamic_or_keeps_left_value() {
        let classified = c(r#"color || "red""#);
        assert!(!classified.is_static());
        assert!(matches!(classified, Classified::Conditional { .. }));
    }

    #[test]
    fn test_nullish_condition_js() {
        let source = r#"size ?? 12"#;
        let Classified::Conditional { condition, .. } = c(source) else {
            panic!("expected conditional");
        };
        assert_eq!(condition.to_js(source), "(size) != null");
    }

    #[test]
    fn test_static_test_picks_branch() {
        assert!(matches!(c(r#"true ? "a" : "b""#), Classified::Literal(Literal::Str(ref s), _) if s == "a"));
    }

    #[test]
    fn test_string_concatenation_folds() {
        assert!(matches!(c(r#""1px solid " + "red""#), Classified::Literal(Literal::Str(ref s), _) if s == "1px solid red"));
    }

    #[test]
    fn test_responsive_array() {
        let Classified::Array(items, _) = c("[12, null, 32]") else {
            panic!("expected array");
        };
        assert_eq!(items.len(), 3);
        assert!(matches!(items[1], Classified::Literal(Literal::Null, _)));
    }
}
