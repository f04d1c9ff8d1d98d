//! Expression tree a statement is compiled from.
//!
//! Only the shape matters here: enough to find parameters and the names the
//! caller gave them. SQL generation happens elsewhere.

use serde::{Deserialize, Serialize};

use wharf_core::schema::{DataType, Schema};
use wharf_core::types::Value;

/// A value supplied at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScalarParameter {
    pub id: u64,
    pub data_type: DataType,
}

impl ScalarParameter {
    pub fn new(id: u64, data_type: DataType) -> Self {
        Self { id, data_type }
    }

    /// Name used when the parameter was never aliased.
    pub fn default_name(&self) -> String {
        format!("param_{}", self.id)
    }

    pub fn to_expr(&self) -> Expr {
        Expr::Parameter(self.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Column {
        name: String,
        data_type: DataType,
    },
    Literal {
        value: Value,
        data_type: DataType,
    },
    Parameter(ScalarParameter),
    Alias {
        expr: Box<Expr>,
        name: String,
    },
    Call {
        function: String,
        args: Vec<Expr>,
        data_type: DataType,
    },
    Table {
        name: String,
        schema: Schema,
    },
}

impl Expr {
    pub fn column(name: impl Into<String>, data_type: DataType) -> Self {
        Expr::Column {
            name: name.into(),
            data_type,
        }
    }

    pub fn literal(value: Value, data_type: DataType) -> Self {
        Expr::Literal { value, data_type }
    }

    pub fn call(function: impl Into<String>, args: Vec<Expr>, data_type: DataType) -> Self {
        Expr::Call {
            function: function.into(),
            args,
            data_type,
        }
    }

    pub fn alias(self, name: impl Into<String>) -> Self {
        Expr::Alias {
            expr: Box::new(self),
            name: name.into(),
        }
    }

    /// Direct subexpressions, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Alias { expr, .. } => vec![expr.as_ref()],
            Expr::Call { args, .. } => args.iter().collect(),
            Expr::Column { .. } | Expr::Literal { .. } | Expr::Parameter(_) | Expr::Table { .. } => {
                Vec::new()
            }
        }
    }

    /// Output type; `None` for table expressions.
    pub fn data_type(&self) -> Option<&DataType> {
        match self {
            Expr::Column { data_type, .. }
            | Expr::Literal { data_type, .. }
            | Expr::Call { data_type, .. } => Some(data_type),
            Expr::Parameter(p) => Some(&p.data_type),
            Expr::Alias { expr, .. } => expr.data_type(),
            Expr::Table { .. } => None,
        }
    }

    /// Output name, when the expression has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Expr::Column { name, .. } | Expr::Alias { name, .. } | Expr::Table { name, .. } => {
                Some(name)
            }
            Expr::Literal { .. } | Expr::Call { .. } | Expr::Parameter(_) => None,
        }
    }
}
