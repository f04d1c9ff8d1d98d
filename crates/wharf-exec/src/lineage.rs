//! Depth-first traversal over expression trees.

use crate::expr::{Expr, ScalarParameter};

/// Whether to descend into the visited expression's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Proceed,
    Prune,
}

/// Visit every expression reachable from `root` in pre-order, left to right,
/// collecting whatever the visitor yields.
pub fn traverse<'a, T, F>(root: &'a Expr, mut visit: F) -> Vec<T>
where
    F: FnMut(&'a Expr) -> (Visit, Option<T>),
{
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(expr) = stack.pop() {
        let (next, found) = visit(expr);
        out.extend(found);
        if next == Visit::Proceed {
            stack.extend(expr.children().into_iter().rev());
        }
    }
    out
}

/// Every scalar parameter under `root` with the name it resolves to: the
/// alias wrapped directly around it, else its default name. Matches are not
/// descended into.
pub fn find_scalar_parameters(root: &Expr) -> Vec<(&ScalarParameter, String)> {
    traverse(root, |expr| match expr {
        Expr::Alias { expr: inner, name } => match inner.as_ref() {
            Expr::Parameter(p) => (Visit::Prune, Some((p, name.clone()))),
            _ => (Visit::Proceed, None),
        },
        Expr::Parameter(p) => (Visit::Prune, Some((p, p.default_name()))),
        _ => (Visit::Proceed, None),
    })
}

#[cfg(test)]
mod tests {
    use wharf_core::schema::DataType;
    use wharf_core::types::Value;

    use super::*;

    fn nested() -> (ScalarParameter, ScalarParameter, Expr) {
        let start = ScalarParameter::new(1, DataType::DATE);
        let limit = ScalarParameter::new(2, DataType::INT64);
        let expr = Expr::call(
            "and",
            vec![
                Expr::call(
                    "ge",
                    vec![
                        Expr::column("day", DataType::DATE),
                        start.to_expr().alias("start_day"),
                    ],
                    DataType::BOOLEAN,
                ),
                Expr::call(
                    "lt",
                    vec![
                        Expr::column("n", DataType::INT64),
                        Expr::call(
                            "add",
                            vec![limit.to_expr(), Expr::literal(Value::Int(1), DataType::INT64)],
                            DataType::INT64,
                        ),
                    ],
                    DataType::BOOLEAN,
                ),
            ],
            DataType::BOOLEAN,
        );
        (start, limit, expr)
    }

    #[test]
    fn test_finds_deeply_nested_parameters() {
        let (start, limit, expr) = nested();
        let found = find_scalar_parameters(&expr);
        assert_eq!(
            found,
            vec![(&start, "start_day".to_string()), (&limit, "param_2".to_string())]
        );
    }

    #[test]
    fn test_prune_stops_descent() {
        let (_, _, expr) = nested();
        let columns = traverse(&expr, |e| match e {
            Expr::Call { function, .. } if function == "lt" => (Visit::Prune, None),
            Expr::Column { name, .. } => (Visit::Proceed, Some(name.as_str())),
            _ => (Visit::Proceed, None),
        });
        assert_eq!(columns, vec!["day"]);

        let all = traverse(&expr, |_| (Visit::Proceed, Some(())));
        assert_eq!(all.len(), 10);
    }
}
