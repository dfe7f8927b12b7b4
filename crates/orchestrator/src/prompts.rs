//! System contexts and per-turn request builders for the agent roles.
//!
//! The schema text is injected context only; this crate owns no schema.

use datadrill_core::AgentRole;
use llm::AgentContext;

/// Default schema description for the demo access-log data set.
pub const DEFAULT_SCHEMA: &str = r#"Following are the tables available:
create table geoip2_network (
    network cidr not null,
    geoname_id int,
    registered_country_geoname_id int,
    represented_country_geoname_id int,
    is_anonymous_proxy bool,
    is_satellite_provider bool,
    postal_code text,
    latitude numeric,
    longitude numeric,
    accuracy_radius int,
    is_anycast bool
);

create table geoip2_location (
    geoname_id int not null,
    locale_code text not null,
    continent_code text,
    continent_name text,
    country_iso_code text,
    country_name text,
    subdivision_1_iso_code text,
    subdivision_1_name text,
    subdivision_2_iso_code text,
    subdivision_2_name text,
    city_name text,
    metro_code int,
    time_zone text,
    is_in_european_union bool not null,
    primary key (geoname_id, locale_code)
);

create table server_log (
    client cidr,
    datetime timestamptz,
    method text,
    path text,
    status_code integer,
    size integer,
    referer text,
    user_agent text
);
create index on geoip2_network using gist (network inet_ops);"#;

/// Docs for the helper module available inside the sandbox.
pub const EXECUTE_SQL_DOCS: &str = r#"## Available Functions

You have access to the following function inside the sandbox. Import it
from the `helpers` module:

def execute_sql(query: str) -> list:
    """Execute SQL statement and return a list of result rows.""""#;

const QUERY_CONTEXT_TEMPLATE: &str = r#"## Table Schema

{schema}
----------

## Guidelines

You are a helpful AI assistant who is an expert at writing SQL.
Solve the task step by step. If a plan is not provided, explain your plan first. Be clear which step uses code, and which step uses your language skill.
The user cannot provide any other feedback or perform any other action beyond executing the code you suggest. The user can't modify your code. So do not suggest incomplete code which requires users to modify. Don't use a code block if it's not intended to be executed by the user.
Carefully analyze the user's request, perform joins, CTEs, and other relevant operations, if necessary, and give the CORRECT SQL query. Limit the query results to a reasonable number depending on the task.
You need not make any connections to the database. Make use of the function provided to you and put the SQL query in that python function to execute it and PRINT the results. Do NOT give SQL queries separately.
Remember to use `print` in the code to print the results.
When the task is fully answered, reply with the final summary and end your message with TERMINATE.

## Output Instructions

Always base the SQL commands on the time of the last request in the logs, like so:
WITH last_request AS (
    SELECT MAX(datetime) AS last_time
    FROM server_log
), ... continues

Make sure to put the python code inside blocks like so:
```python
```"#;

const ANALYST_CONTEXT: &str = r#"You are a highly capable and experienced data analyst. Your role is to assist the user in analyzing data, interpreting results, and generating insights.
Look at the initial prompt to determine the task. Analyze the response to the prompt received from the SQL agent and provide the analysis and the summary of the results.
Always prioritize clarity and correctness in your responses."#;

const INSTRUCTOR_CONTEXT_TEMPLATE: &str = r#"## Table Schema

{schema}
----------

## Guidelines

You are a highly capable and experienced data analyst. Your role is to assist the user in analyzing data, interpreting results and deciding what query to run next.
Carefully go through the output from the SQL agent's response and the Analyst agent's analysis of the results.

You must then think out loud about the inputs you are given in the "thinking" key of the JSON output. And provide further instructions to be sent to the SQL agent to explore any anomalies or patterns you have found in the "instructions" key.
Provide precise and practical instructions (and NOT SQL queries) for further querying that is implementable with the information and tables available. The instructions should be relevant to the analysis provided. Limit to no more than {branching_factor} instructions.
Your instructions will be used AS IS by an SQL agent who is an expert at writing SQL queries given clear and accurate instructions. The SQL agent cannot provide any other feedback or perform any other action beyond strictly following your instructions. So, do not include any vague pointers based on the previous results, but instead put them out explicitly in EACH of the instructions.
Again, note that your instructions will be provided to the SQL agent without any context. So, you must include explicit information WITHOUT any assumptions in EACH of the instructions you give.
Follow this JSON format:
{
    "thinking": "<your thinking>",
    "instructions": [
        "<instruction 1>",
        "<instruction 2>"
    ]
}
Always prioritize clarity and correctness in your responses."#;

pub struct RolePrompts;

impl RolePrompts {
    /// System context for the query agent: schema plus sandbox helper docs.
    pub fn query_context(schema: &str, helper_docs: &str) -> AgentContext {
        AgentContext::new(AgentRole::Query, QUERY_CONTEXT_TEMPLATE)
            .with_var("schema", schema)
            .with_appendix(helper_docs)
    }

    /// System context for the single-turn analysis stage.
    pub fn analyst_context() -> AgentContext {
        AgentContext::new(AgentRole::Analyze, ANALYST_CONTEXT)
    }

    /// System context for the instruct stage with the branching factor
    /// substituted in.
    pub fn instructor_context(schema: &str, branching_factor: u32) -> AgentContext {
        AgentContext::new(AgentRole::Instruct, INSTRUCTOR_CONTEXT_TEMPLATE)
            .with_var("schema", schema)
            .with_var("branching_factor", branching_factor)
    }

    /// The analyze turn's input: the fixed question plus the tail of the
    /// conversation transcript as carry-over context.
    pub fn analysis_request(carryover: &str) -> String {
        format!(
            "What do you think of the results? Do you find any peculiarity or anything that require further querying?\nContext: \n{carryover}"
        )
    }

    /// The instruct turn's input: seed prompt, execution result and the
    /// analyst's reading of it.
    pub fn instruction_request(seed_prompt: &str, executed_result: &str, analysis: &str) -> String {
        format!(
            r#"## Initial Prompt
{seed_prompt}

## SQL Agent Result
{executed_result}

## Analysis
{analysis}"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_context_substitutes_schema() {
        let ctx = RolePrompts::query_context("create table t (a int);", EXECUTE_SQL_DOCS);
        assert!(ctx.system_prompt().contains("create table t (a int);"));
        assert!(ctx.system_prompt().contains("execute_sql"));
        assert!(!ctx.system_prompt().contains("{schema}"));
    }

    #[test]
    fn test_instructor_context_substitutes_limit() {
        let ctx = RolePrompts::instructor_context(DEFAULT_SCHEMA, 3);
        assert!(ctx.system_prompt().contains("no more than 3 instructions"));
        assert!(!ctx.system_prompt().contains("{branching_factor}"));
    }

    #[test]
    fn test_instruction_request_layout() {
        let request = RolePrompts::instruction_request("seed", "rows", "insight");
        assert!(request.contains("## Initial Prompt\nseed"));
        assert!(request.contains("## SQL Agent Result\nrows"));
        assert!(request.contains("## Analysis\ninsight"));
    }
}
