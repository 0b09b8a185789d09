use std::fmt;

/// Machine-readable error codes surfaced by the CLI and by library errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    GraphParseError,
    GraphReadFailed,
    SelfLoopNotAllowed,
    ParallelEdgeNotAllowed,
    InvalidWeight,
    QuotaReadFailed,
    QuotaMismatch,
    InvalidQuota,
    InvalidCardinality,
    InvalidWorkers,
    VertexNotFound,
    ScoreKeyMismatch,
    EmptyGraph,
    WorkerPoolFailed,
    VertexTaskFailed,
    Cancelled,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::GraphParseError => "E1101",
            Self::GraphReadFailed => "E1102",
            Self::SelfLoopNotAllowed => "E1103",
            Self::ParallelEdgeNotAllowed => "E1104",
            Self::InvalidWeight => "E1105",
            Self::QuotaReadFailed => "E1201",
            Self::QuotaMismatch => "E2001",
            Self::InvalidQuota => "E2002",
            Self::InvalidCardinality => "E2003",
            Self::InvalidWorkers => "E2004",
            Self::VertexNotFound => "E2005",
            Self::ScoreKeyMismatch => "E2006",
            Self::EmptyGraph => "E2007",
            Self::WorkerPoolFailed => "E3001",
            Self::VertexTaskFailed => "E3002",
            Self::Cancelled => "E3003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::GraphParseError => "Graph file parse error",
            Self::GraphReadFailed => "Graph file could not be read",
            Self::SelfLoopNotAllowed => "Self-loop not allowed",
            Self::ParallelEdgeNotAllowed => "Parallel edge not allowed",
            Self::InvalidWeight => "Invalid edge weight",
            Self::QuotaReadFailed => "Quota file could not be read",
            Self::QuotaMismatch => "Quota table does not match vertex set",
            Self::InvalidQuota => "Invalid quota value",
            Self::InvalidCardinality => "Invalid critical set cardinality",
            Self::InvalidWorkers => "Invalid worker count",
            Self::VertexNotFound => "Vertex not found",
            Self::ScoreKeyMismatch => "Score map does not match vertex set",
            Self::EmptyGraph => "Graph has no vertices",
            Self::WorkerPoolFailed => "Worker pool could not be started",
            Self::VertexTaskFailed => "Vertex scoring task failed",
            Self::Cancelled => "Computation cancelled",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .bundle/config.toml and retry."),
            Self::GraphParseError => {
                Some("Use `from to [weight]` lines or the documented JSON graph layout.")
            }
            Self::GraphReadFailed => Some("Check the graph path and read permissions."),
            Self::SelfLoopNotAllowed => Some("Set \"self_loops\": true or drop the loop edge."),
            Self::ParallelEdgeNotAllowed => {
                Some("Set \"multi_edges\": true or merge the duplicate edges.")
            }
            Self::InvalidWeight => Some("Edge weights must be finite numbers."),
            Self::QuotaReadFailed => Some("Quota files are JSON objects mapping vertex to quota."),
            Self::QuotaMismatch => Some("Provide exactly one quota per vertex."),
            Self::InvalidQuota => Some("Quotas must be finite and non-negative."),
            Self::InvalidCardinality => Some("Pass --k with a value of at least 1."),
            Self::InvalidWorkers => Some("Pass --workers with a value of at least 1."),
            Self::VertexNotFound => Some("Run `bundle inspect` to list the graph's vertices."),
            Self::ScoreKeyMismatch | Self::VertexTaskFailed | Self::InternalUnexpected => {
                Some("Retry once. If persistent, report a bug with logs.")
            }
            Self::EmptyGraph => Some("Add at least one vertex, or disable normalization."),
            Self::WorkerPoolFailed => Some("Lower --workers and retry."),
            Self::Cancelled => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 18] = [
        ErrorCode::ConfigParseError,
        ErrorCode::GraphParseError,
        ErrorCode::GraphReadFailed,
        ErrorCode::SelfLoopNotAllowed,
        ErrorCode::ParallelEdgeNotAllowed,
        ErrorCode::InvalidWeight,
        ErrorCode::QuotaReadFailed,
        ErrorCode::QuotaMismatch,
        ErrorCode::InvalidQuota,
        ErrorCode::InvalidCardinality,
        ErrorCode::InvalidWorkers,
        ErrorCode::VertexNotFound,
        ErrorCode::ScoreKeyMismatch,
        ErrorCode::EmptyGraph,
        ErrorCode::WorkerPoolFailed,
        ErrorCode::VertexTaskFailed,
        ErrorCode::Cancelled,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let raw = code.code();
            assert_eq!(raw.len(), 5);
            assert!(raw.starts_with('E'));
            assert!(raw.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn display_matches_code() {
        assert_eq!(ErrorCode::QuotaMismatch.to_string(), "E2001");
    }
}
