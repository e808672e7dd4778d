//! Small text builders for the Cypher fragments shared by the translators.

use graph_schema::{NodeType, RelationDirection};
use itertools::Itertools;
use std::{borrow::Cow, fmt};

const INDENT: &str = "    ";

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();

    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quotes a label, property or parameter name with backticks when it is not a plain identifier.
pub fn escape_name(name: &str) -> Cow<'_, str> {
    if is_plain_identifier(name) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("`{}`", name.replace('`', "``")))
    }
}

/// `$name`, escaped when the parameter name is a dotted path.
pub fn param_ref(name: &str) -> String {
    format!("${}", escape_name(name))
}

pub fn property(variable: &str, name: &str) -> String {
    format!("{variable}.{}", escape_name(name))
}

/// `:Movie:Film`
pub fn label_string(node: &NodeType) -> String {
    node.labels().map(|label| format!(":{}", escape_name(label))).collect()
}

/// `:Person&Human|Studio`, matching any of the given node types.
pub fn label_disjunction(nodes: &[&NodeType]) -> String {
    let alternatives = nodes
        .iter()
        .map(|node| node.labels().map(escape_name).join("&"))
        .join("|");

    format!(":{alternatives}")
}

/// The left and right arrow halves of a relationship pattern, seen from the declaring node.
pub fn arrows(direction: RelationDirection) -> (&'static str, &'static str) {
    match direction {
        RelationDirection::In => ("<-", "-"),
        RelationDirection::Out => ("-", "->"),
    }
}

/// Indents every non-empty line of a block.
pub fn indent(block: &str) -> String {
    block
        .lines()
        .map(|line| if line.is_empty() { String::new() } else { format!("{INDENT}{line}") })
        .join("\n")
}

/// Wraps a body into `CALL { ... }`.
pub fn call_block(body: &str) -> String {
    format!("CALL {{\n{}\n}}", indent(body))
}

/// Conjoins predicates, parenthesizing them when there is more than one.
pub fn conjunction<'a>(predicates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let predicates: Vec<_> = predicates.into_iter().filter(|p| !p.is_empty()).collect();

    match predicates.as_slice() {
        [] => None,
        [single] => Some((*single).to_owned()),
        many => Some(many.iter().map(|p| format!("({p})")).join(" AND ")),
    }
}

/// Conditional-aggregation rewrite of a filter that follows precomputed subqueries: instead of
/// dropping the row, the matched relationship and node are nulled out when the predicate fails.
pub fn case_where(predicate: &str, relationship: &str, node: &str, with_vars: &WithVars) -> String {
    let filter = format!("{node}_aggregateWhereFilter");

    format!(
        "WITH *, CASE {predicate} WHEN true THEN [{relationship}, {node}] ELSE [NULL, NULL] END AS {filter}\n\
         WITH {with_vars}, {filter}[0] AS {relationship}, {filter}[1] AS {node}"
    )
}

/// The ordered set of variables visible in the current scope. Nested scopes extend a copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WithVars(Vec<String>);

impl WithVars {
    pub fn new(variable: impl Into<String>) -> Self {
        Self(vec![variable.into()])
    }

    pub fn with(&self, variable: impl Into<String>) -> Self {
        let variable = variable.into();

        if self.0.contains(&variable) {
            return self.clone();
        }

        let mut vars = self.0.clone();
        vars.push(variable);
        Self(vars)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for WithVars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    #[test]
    fn escapes_dotted_parameter_names() {
        assert_eq!(param_ref("name"), "$name");
        assert_eq!(param_ref("this.update.title_SET"), "$`this.update.title_SET`");
        assert_eq!(param_ref("this.create[0].node.title"), "$`this.create[0].node.title`");
        assert_eq!(escape_name("odd`name"), "`odd``name`");
        assert_eq!(property("this", "first name"), "this.`first name`");
    }

    #[test]
    fn label_disjunction_joins_all_labels() {
        let person = NodeType::new("Person");
        let studio = NodeType::new("Studio");

        assert_eq!(label_disjunction(&[&person, &studio]), ":Person|Studio");
        assert_eq!(label_string(&person), ":Person");
    }

    #[test]
    fn with_vars_extend_without_mutating_parent() {
        let root = WithVars::new("this");
        let nested = root.with("this_actors0").with("this");

        assert_eq!(root.to_string(), "this");
        assert_eq!(nested.to_string(), "this, this_actors0");
    }

    #[test]
    fn case_where_rebinds_filtered_variables() {
        let rewritten = case_where("size(x) > 1", "r", "n", &WithVars::new("this"));

        expect![[r#"
            WITH *, CASE size(x) > 1 WHEN true THEN [r, n] ELSE [NULL, NULL] END AS n_aggregateWhereFilter
            WITH this, n_aggregateWhereFilter[0] AS r, n_aggregateWhereFilter[1] AS n"#]]
        .assert_eq(&rewritten);
    }

    #[test]
    fn call_block_indents_body() {
        expect![[r#"
            CALL {
                WITH this
                RETURN count(*) AS c
            }"#]]
        .assert_eq(&call_block("WITH this\nRETURN count(*) AS c"));
    }
}
