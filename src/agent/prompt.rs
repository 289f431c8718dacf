//! Instruction text for the SQL agent.
//!
//! The prefix becomes the system message; the suffix wraps the caller's
//! question in the user message.

use crate::llm::Message;

/// System instructions. `{dialect}` and `{top_k}` are substituted.
pub const SQL_PREFIX: &str = r#"You are an agent designed to interact with a SQL database.
Given an input question, create a syntactically correct {dialect} query to run, then look at the results of the query and return the answer.
Unless the user specifies a specific number of examples they wish to obtain, always limit your query to at most {top_k} results using the LIMIT clause.
You can order the results by a relevant column to return the most interesting examples in the database.
Never query for all the columns of a table, only ask for the columns relevant to the question.
Only use the information returned by the tools below to construct your final answer.
Before writing a query, look at the schema of every table you intend to use with info-sql. Never guess table or column names.
Check your query with query-checker before executing it. If executing a query fails, rewrite the query and try again.
Pass the final query to query-sql exactly once it is correct; its result is shown to the user.

DO NOT make any DML statements (INSERT, UPDATE, DELETE, DROP etc.) to the database.

If the question does not seem related to the database, just return "I don't know" as the answer."#;

/// User message template. `{input}` is substituted.
pub const SQL_SUFFIX: &str = r#"Question: {input}

Start by listing the tables with list-tables-sql, then inspect the relevant ones with info-sql.
Answer in one or two sentences once query-sql has returned the data you need."#;

/// Prompt text with its substitution values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub prefix: String,
    pub suffix: String,
    pub dialect: String,
    pub top_k: usize,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            prefix: SQL_PREFIX.to_string(),
            suffix: SQL_SUFFIX.to_string(),
            dialect: "MySQL".to_string(),
            top_k: 10,
        }
    }
}

impl PromptTemplate {
    /// Sets the row limit mentioned in the prefix.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Renders the system message.
    pub fn system_prompt(&self) -> String {
        self.prefix
            .replace("{dialect}", &self.dialect)
            .replace("{top_k}", &self.top_k.to_string())
    }

    /// Renders the user message for `input`.
    pub fn user_prompt(&self, input: &str) -> String {
        self.suffix.replace("{input}", input)
    }

    /// Builds the opening messages of an agent run.
    pub fn build_messages(&self, input: &str) -> Vec<Message> {
        vec![
            Message::system(self.system_prompt()),
            Message::user(self.user_prompt(input)),
        ]
    }
}

/// Prompt for the `query-checker` tool.
pub fn query_checker_prompt(dialect: &str, query: &str) -> String {
    format!(
        r#"```sql
{query}
```
Double check the {dialect} query above for common mistakes, including:
- Using NOT IN with NULL values
- Using UNION when UNION ALL should have been used
- Using BETWEEN for exclusive ranges
- Data type mismatch in predicates
- Properly quoting identifiers
- Using the correct number of arguments for functions
- Casting to the correct data type
- Using the proper columns for joins

If there are any of the above mistakes, rewrite the query. If there are no mistakes, just reproduce the original query.
Reply with the query only, in a ```sql code block."#
    )
}
