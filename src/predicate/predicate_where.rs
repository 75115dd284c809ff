use crate::entity::{FieldDef, FieldValue};

use super::types::{CompareOp, Predicate, SqlResult};

/// Renders a compiled [`Predicate`] as a parameterized WHERE clause.
///
/// Columns come from entity descriptors and every value is a `$n` placeholder, so no
/// request text ever reaches the SQL string.
pub struct PredicateWhere {
    param_values: Vec<FieldValue>,
    param_index: usize,
}

impl PredicateWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self { param_values: vec![], param_index: starting_param_index }
    }

    pub fn generate(predicate: &Predicate, starting_param_index: usize) -> SqlResult {
        let mut generator = Self::new(starting_param_index);
        let query = generator.build(predicate);
        SqlResult { query, params: generator.param_values }
    }

    fn build(&mut self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::Const(true) => "1=1".to_string(),
            Predicate::Const(false) => "1=0".to_string(),
            Predicate::Compare { field, op, value } => {
                let column = quote_column(field);
                let param = self.param(value.clone());
                match op {
                    // Null columns count as different, matching in-memory evaluation
                    CompareOp::Ne => format!("({} IS NULL OR {} <> {})", column, column, param),
                    other => format!("({} IS NOT NULL AND {} {} {})", column, column, other.to_sql(), param),
                }
            }
            Predicate::IsNull { field, negated: false } => format!("{} IS NULL", quote_column(field)),
            Predicate::IsNull { field, negated: true } => format!("{} IS NOT NULL", quote_column(field)),
            Predicate::Text { field, op, value } => {
                let column = quote_column(field);
                let param = self.param(FieldValue::Text(op.like_pattern(value)));
                format!("({} IS NOT NULL AND {} LIKE {} ESCAPE '\\')", column, column, param)
            }
            Predicate::And(a, b) => format!("({} AND {})", self.build(a), self.build(b)),
            Predicate::Or(a, b) => format!("({} OR {})", self.build(a), self.build(b)),
            Predicate::Not(inner) => format!("NOT ({})", self.build(inner)),
        }
    }

    fn param(&mut self, value: FieldValue) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

/// Quote a descriptor column name as a Postgres identifier
pub fn quote_column(field: &FieldDef) -> String {
    quote_identifier(field.column)
}

pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::models::ExceptionManagement;
    use crate::entity::Entity;
    use crate::predicate::PredicateCompiler;

    fn sql(text: &str) -> SqlResult {
        let predicate = PredicateCompiler::new(ExceptionManagement::descriptor())
            .with_limits(512, 16)
            .compile(text)
            .unwrap();
        PredicateWhere::generate(&predicate, 0)
    }

    #[test]
    fn renders_parameterized_comparisons() {
        let result = sql(r#"x => x.NhsNumber == "9000000009" && x.RuleId > 3"#);
        assert_eq!(
            result.query,
            r#"(("NHS_NUMBER" IS NOT NULL AND "NHS_NUMBER" = $1) AND ("RULE_ID" IS NOT NULL AND "RULE_ID" > $2))"#
        );
        assert_eq!(
            result.params,
            vec![FieldValue::Text("9000000009".into()), FieldValue::Integer(3)]
        );
    }

    #[test]
    fn not_equal_includes_null_rows() {
        let result = sql("x => x.RuleId != 7");
        assert_eq!(result.query, r#"("RULE_ID" IS NULL OR "RULE_ID" <> $1)"#);
    }

    #[test]
    fn literal_text_never_reaches_the_query() {
        let result = sql(r#"x => x.FileName == "'; DROP TABLE users; --""#);
        assert!(!result.query.contains("DROP"));
        assert_eq!(result.params, vec![FieldValue::Text("'; DROP TABLE users; --".into())]);
    }

    #[test]
    fn text_methods_escape_wildcards() {
        let result = sql(r#"x => !x.FileName.StartsWith("50%_")"#);
        assert_eq!(
            result.query,
            r#"NOT (("FILE_NAME" IS NOT NULL AND "FILE_NAME" LIKE $1 ESCAPE '\'))"#
        );
        assert_eq!(result.params, vec![FieldValue::Text(r"50\%\_%".into())]);
    }

    #[test]
    fn null_checks_and_constants() {
        assert_eq!(sql("x => x.DateResolved == null").query, r#""DATE_RESOLVED" IS NULL"#);
        assert_eq!(sql("x => true").query, "1=1");
        let result = PredicateWhere::generate(&sql_predicate("x => x.RuleId == 1"), 4);
        assert_eq!(result.query, r#"("RULE_ID" IS NOT NULL AND "RULE_ID" = $5)"#);
    }

    fn sql_predicate(text: &str) -> Predicate {
        PredicateCompiler::new(ExceptionManagement::descriptor())
            .with_limits(512, 16)
            .compile(text)
            .unwrap()
    }
}
