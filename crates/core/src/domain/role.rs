use serde::{Deserialize, Serialize};

/// The four conversational participants in a task pipeline.
///
/// Each role is bound to exactly one agent (or, for `Execute`, the
/// sandbox) with its own system context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Query,
    Execute,
    Analyze,
    Instruct,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Execute => "execute",
            Self::Analyze => "analyze",
            Self::Instruct => "instruct",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "query" => Some(Self::Query),
            "execute" => Some(Self::Execute),
            "analyze" => Some(Self::Analyze),
            "instruct" => Some(Self::Instruct),
            _ => None,
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [
            AgentRole::Query,
            AgentRole::Execute,
            AgentRole::Analyze,
            AgentRole::Instruct,
        ] {
            assert_eq!(AgentRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(AgentRole::parse("reviewer"), None);
    }
}
