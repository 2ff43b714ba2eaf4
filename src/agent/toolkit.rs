//! SQL toolkit exposed to the LLM.
//!
//! Three read-oriented tools over a database handle: list tables, describe
//! their schemas, and run a query. Execution errors are reported back to the
//! LLM as JSON error payloads so it can correct its SQL instead of aborting
//! the turn.

use crate::db::DatabaseHandle;
use crate::llm::ToolDefinition;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Input parameters for the describe_tables tool.
#[derive(Debug, Deserialize)]
struct DescribeTablesInput {
    tables: Vec<String>,
}

/// Input parameters for the run_sql_query tool.
#[derive(Debug, Deserialize)]
struct RunSqlQueryInput {
    sql: String,
}

/// The toolkit binding tools to one database handle.
pub struct SqlToolkit {
    handle: Arc<dyn DatabaseHandle>,
}

impl SqlToolkit {
    pub fn new(handle: Arc<dyn DatabaseHandle>) -> Self {
        Self { handle }
    }

    /// Returns the tool definitions advertised to the LLM.
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "list_tables".to_string(),
                description: "List the names of all tables in the database.".to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            },
            ToolDefinition {
                name: "describe_tables".to_string(),
                description: "Get the columns and types of the given tables. Use after \
                              list_tables to learn the schema before writing SQL."
                    .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "tables": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Names of the tables to describe"
                        }
                    },
                    "required": ["tables"]
                }),
            },
            ToolDefinition {
                name: "run_sql_query".to_string(),
                description: "Execute a SQL query against the database and return the \
                              resulting rows as JSON."
                    .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "sql": {
                            "type": "string",
                            "description": "The SQL query to execute"
                        }
                    },
                    "required": ["sql"]
                }),
            },
        ]
    }

    /// Executes a tool and returns the result as a JSON string.
    pub async fn execute(&self, name: &str, arguments: &str) -> String {
        debug!("Executing tool '{}' with arguments: {}", name, arguments);

        match name {
            "list_tables" => self.execute_list_tables().await,
            "describe_tables" => self.execute_describe_tables(arguments).await,
            "run_sql_query" => self.execute_run_sql_query(arguments).await,
            _ => error_payload(format!("Unknown tool: {name}")),
        }
    }

    /// Produces a one-line human summary of a tool call for the activity
    /// stream.
    pub fn call_summary(name: &str, arguments: &str) -> String {
        match name {
            "list_tables" => "listing tables".to_string(),
            "describe_tables" => match serde_json::from_str::<DescribeTablesInput>(arguments) {
                Ok(input) => format!("describing {}", input.tables.join(", ")),
                Err(_) => "describing tables".to_string(),
            },
            "run_sql_query" => match serde_json::from_str::<RunSqlQueryInput>(arguments) {
                Ok(input) => input.sql,
                Err(_) => "running query".to_string(),
            },
            other => other.to_string(),
        }
    }

    async fn execute_list_tables(&self) -> String {
        match self.handle.list_tables().await {
            Ok(tables) => serde_json::json!({ "tables": tables }).to_string(),
            Err(e) => error_payload(e.to_string()),
        }
    }

    async fn execute_describe_tables(&self, arguments: &str) -> String {
        let input: DescribeTablesInput = match serde_json::from_str(arguments) {
            Ok(input) => input,
            Err(e) => return error_payload(format!("Invalid arguments: {e}")),
        };

        match self.handle.describe_tables(&input.tables).await {
            Ok(schemas) => {
                serde_json::to_string(&schemas).unwrap_or_else(|_| "[]".to_string())
            }
            Err(e) => error_payload(e.to_string()),
        }
    }

    async fn execute_run_sql_query(&self, arguments: &str) -> String {
        let input: RunSqlQueryInput = match serde_json::from_str(arguments) {
            Ok(input) => input,
            Err(e) => return error_payload(format!("Invalid arguments: {e}")),
        };

        match self.handle.run_query(&input.sql).await {
            Ok(result) => result.to_tool_payload().to_string(),
            Err(e) => error_payload(e.to_string()),
        }
    }
}

fn error_payload(message: String) -> String {
    serde_json::json!({ "error": message }).to_string()
}
