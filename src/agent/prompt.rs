//! Prompt construction for agent requests.

/// System prompt template for the SQL agent.
const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a helpful assistant that answers questions about a {dialect} database.

You have tools to inspect the database and run queries:
- list_tables: see which tables exist
- describe_tables: see the columns of specific tables
- run_sql_query: execute a SQL query and get the results

INSTRUCTIONS:
- Always look at the available tables and their schemas before writing a query.
- Generate only valid {dialect} SQL.
- Limit results to 100 rows unless the user asks otherwise.
- Never run destructive statements (DROP, DELETE, UPDATE, INSERT).
- If a query fails, read the error and correct your SQL.
- When you have the information you need, answer the user's question in plain language. Do not show raw SQL unless asked."#;

/// Builds the system prompt for the given SQL dialect.
pub fn system_prompt(dialect: &str) -> String {
    SYSTEM_PROMPT_TEMPLATE.replace("{dialect}", dialect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_names_dialect() {
        let prompt = system_prompt("sqlite");
        assert!(prompt.contains("sqlite database"));
        assert!(prompt.contains("valid sqlite SQL"));
    }

    #[test]
    fn test_system_prompt_lists_tools() {
        let prompt = system_prompt("postgresql");
        assert!(prompt.contains("list_tables"));
        assert!(prompt.contains("describe_tables"));
        assert!(prompt.contains("run_sql_query"));
    }
}
