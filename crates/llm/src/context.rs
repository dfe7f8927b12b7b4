use datadrill_core::AgentRole;

/// Immutable system context for one agent role.
///
/// Built once per run from a template plus any numeric limits the role
/// needs substituted (e.g. `{branching_factor}`), then passed down by
/// reference; it is never mutated in place afterwards.
#[derive(Debug, Clone)]
pub struct AgentContext {
    role: AgentRole,
    system_prompt: String,
}

impl AgentContext {
    pub fn new(role: AgentRole, template: impl Into<String>) -> Self {
        Self {
            role,
            system_prompt: template.into(),
        }
    }

    /// Substitute a `{key}` placeholder in the system prompt.
    pub fn with_var(mut self, key: &str, value: impl ToString) -> Self {
        let placeholder = format!("{{{key}}}");
        self.system_prompt = self
            .system_prompt
            .replace(&placeholder, &value.to_string());
        self
    }

    /// Append extra context (e.g. sandbox helper docs) to the prompt.
    pub fn with_appendix(mut self, appendix: &str) -> Self {
        self.system_prompt.push_str("\n\n");
        self.system_prompt.push_str(appendix);
        self
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}
