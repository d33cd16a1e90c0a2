use serde::{Deserialize, Serialize};

/// Byte range in the scanned source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn text(self, source: &str) -> &str {
        &source[self.start..self.end]
    }

    pub fn contains(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Expression subset the scanner understands.
///
/// Anything the parser cannot model becomes [`Expr::Opaque`], which keeps its
/// extent so the rewriter can still copy it verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str {
        value: String,
        span: Span,
    },
    Num {
        value: f64,
        span: Span,
    },
    Bool {
        value: bool,
        span: Span,
    },
    Null {
        span: Span,
    },
    Undefined {
        span: Span,
    },
    /// Template literal; `cooked` is set only when it has no substitutions
    Template {
        cooked: Option<String>,
        span: Span,
    },
    Ident {
        name: String,
        span: Span,
    },
    Array {
        elements: Vec<ArrayElement>,
        span: Span,
    },
    Object {
        properties: Vec<Property>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        argument: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
        span: Span,
    },
    Member {
        object: Box<Expr>,
        property: MemberProperty,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<ArrayElement>,
        span: Span,
    },
    Paren {
        expression: Box<Expr>,
        span: Span,
    },
    Opaque {
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Str { span, .. }
            | Expr::Num { span, .. }
            | Expr::Bool { span, .. }
            | Expr::Null { span }
            | Expr::Undefined { span }
            | Expr::Template { span, .. }
            | Expr::Ident { span, .. }
            | Expr::Array { span, .. }
            | Expr::Object { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Logical { span, .. }
            | Expr::Conditional { span, .. }
            | Expr::Member { span, .. }
            | Expr::Call { span, .. }
            | Expr::Paren { span, .. }
            | Expr::Opaque { span } => *span,
        }
    }

    /// Strip redundant parentheses
    pub fn unparen(&self) -> &Expr {
        match self {
            Expr::Paren { expression, .. } => expression.unparen(),
            other => other,
        }
    }

    /// `Foo` or `Foo.Bar`: usable as a JSX tag
    pub fn is_tag_reference(&self) -> bool {
        match self.unparen() {
            Expr::Ident { .. } => true,
            Expr::Member {
                object,
                property: MemberProperty::Name(_),
                ..
            } => object.is_tag_reference(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElement {
    Expr(Expr),
    Spread(Expr),
    Hole(Span),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    KeyValue {
        key: PropertyKey,
        value: Expr,
        span: Span,
    },
    Shorthand {
        name: String,
        span: Span,
    },
    Spread {
        argument: Expr,
        span: Span,
    },
    /// Methods, getters and anything else the parser skips
    Opaque {
        span: Span,
    },
}

impl Property {
    pub fn span(&self) -> Span {
        match self {
            Property::KeyValue { span, .. }
            | Property::Shorthand { span, .. }
            | Property::Spread { span, .. }
            | Property::Opaque { span } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Name(String),
    Str(String),
    Num(f64),
    Computed(Box<Expr>),
}

impl PropertyKey {
    /// Statically known key text
    pub fn as_static(&self) -> Option<String> {
        match self {
            PropertyKey::Name(name) | PropertyKey::Str(name) => Some(name.clone()),
            PropertyKey::Num(n) => Some(format_number(*n)),
            PropertyKey::Computed(expr) => match expr.unparen() {
                Expr::Str { value, .. } => Some(value.clone()),
                Expr::Template {
                    cooked: Some(value),
                    ..
                } => Some(value.clone()),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    Name(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
    Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    Lte,
    Gte,
    BitAnd,
    BitOr,
    BitXor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    Or,
    And,
    Nullish,
}

/// Render a JS number the way `String(n)` does for the common cases
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
