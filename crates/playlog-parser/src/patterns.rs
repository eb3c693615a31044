use regex::Regex;

use crate::Error;

/// Which category an operator-supplied pattern extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Death,
    Chat,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Death => "death",
            PatternKind::Chat => "chat",
        }
    }
}

/// Result of validating one operator pattern.
#[derive(Debug)]
pub enum PatternOutcome {
    Compiled(Regex),
    Rejected { pattern: String, error: Error },
}

/// Immutable, validated list of operator patterns for one category.
///
/// Built once at load time. A pattern that fails to compile, or lacks the
/// `name` capture group every category needs, is rejected on its own and
/// the rest of the list stays usable.
#[derive(Debug)]
pub struct PatternSet {
    kind: PatternKind,
    outcomes: Vec<PatternOutcome>,
}

impl PatternSet {
    pub fn build<S: AsRef<str>>(kind: PatternKind, sources: &[S]) -> Self {
        let outcomes = sources
            .iter()
            .map(|source| validate(source.as_ref()))
            .collect::<Vec<_>>();

        for outcome in &outcomes {
            if let PatternOutcome::Rejected { pattern, error } = outcome {
                tracing::warn!(
                    kind = kind.as_str(),
                    pattern = %pattern,
                    "Skipping custom pattern: {}",
                    error
                );
            }
        }

        Self { kind, outcomes }
    }

    pub fn empty(kind: PatternKind) -> Self {
        Self {
            kind,
            outcomes: Vec::new(),
        }
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn compiled(&self) -> impl Iterator<Item = &Regex> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            PatternOutcome::Compiled(regex) => Some(regex),
            PatternOutcome::Rejected { .. } => None,
        })
    }

    pub fn rejected(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            PatternOutcome::Rejected { pattern, error } => Some((pattern.as_str(), error)),
            PatternOutcome::Compiled(_) => None,
        })
    }
}

fn validate(source: &str) -> PatternOutcome {
    let regex = match Regex::new(source) {
        Ok(regex) => regex,
        Err(err) => {
            return PatternOutcome::Rejected {
                pattern: source.to_string(),
                error: Error::Pattern {
                    pattern: source.to_string(),
                    message: err.to_string(),
                },
            };
        }
    };

    if !regex.capture_names().flatten().any(|name| name == "name") {
        return PatternOutcome::Rejected {
            pattern: source.to_string(),
            error: Error::Pattern {
                pattern: source.to_string(),
                message: "missing (?P<name>...) capture group".to_string(),
            },
        };
    }

    PatternOutcome::Compiled(regex)
}
