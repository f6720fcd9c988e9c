use std::fmt;

/// What kind of thing a lookup was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Component,
    Field,
    Tag,
    Entity,
    Child,
    Scene,
    Script,
    System,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subject::Component => "component",
            Subject::Field => "field",
            Subject::Tag => "tag",
            Subject::Entity => "entity",
            Subject::Child => "child",
            Subject::Scene => "scene",
            Subject::Script => "script",
            Subject::System => "system",
        };
        f.write_str(name)
    }
}

/// Coarse classification of every [`EcsError`].
///
/// None of these are retried anywhere in the engine; they all signal a
/// programming or composition mistake to the immediate caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An argument was empty, malformed or of the wrong type.
    Usage,
    /// Something was missing, or present when it had to be absent.
    Lookup,
    /// The operation is not valid for the current tree/scene state.
    State,
}

/// Errors raised by the entity/component/scene core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EcsError {
    #[error("invalid argument: {0}")]
    Usage(String),

    #[error("{subject} not found: {name}")]
    NotFound { subject: Subject, name: String },

    #[error("duplicate {subject}: {name}")]
    Duplicate { subject: Subject, name: String },

    #[error("component '{component}' has no field '{identifier}'")]
    UnknownField {
        component: String,
        identifier: String,
    },

    #[error("field '{identifier}' expects {expected}, got {found}")]
    FieldType {
        identifier: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("illegal state: {0}")]
    State(String),

    #[error("script failed: {0}")]
    Script(String),

    #[error("system '{system}' failed: {message}")]
    System { system: String, message: String },
}

impl EcsError {
    /// A usage error: an invalid argument.
    pub fn usage(message: impl Into<String>) -> Self {
        EcsError::Usage(message.into())
    }

    /// A state error: the operation does not fit the current state.
    pub fn state(message: impl Into<String>) -> Self {
        EcsError::State(message.into())
    }

    /// A lookup error for something missing.
    pub fn not_found(subject: Subject, name: impl Into<String>) -> Self {
        EcsError::NotFound {
            subject,
            name: name.into(),
        }
    }

    /// A lookup error for something already present.
    pub fn duplicate(subject: Subject, name: impl Into<String>) -> Self {
        EcsError::Duplicate {
            subject,
            name: name.into(),
        }
    }

    /// A component asked for an identifier it does not own.
    pub fn unknown_field(component: impl Into<String>, identifier: impl Into<String>) -> Self {
        EcsError::UnknownField {
            component: component.into(),
            identifier: identifier.into(),
        }
    }

    /// Error for a failing system hook, tagged with the system's name.
    pub fn system(system: impl Into<String>, message: impl Into<String>) -> Self {
        EcsError::System {
            system: system.into(),
            message: message.into(),
        }
    }

    /// Which taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EcsError::Usage(_) | EcsError::FieldType { .. } => ErrorKind::Usage,
            EcsError::NotFound { .. }
            | EcsError::Duplicate { .. }
            | EcsError::UnknownField { .. } => ErrorKind::Lookup,
            EcsError::State(_) | EcsError::Script(_) | EcsError::System { .. } => ErrorKind::State,
        }
    }
}

pub type Result<T, E = EcsError> = std::result::Result<T, E>;

/// Reject empty names and identifiers, which stand in for "null" arguments.
pub(crate) fn require_name(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(EcsError::usage(format!("{what} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(EcsError::usage("x").kind(), ErrorKind::Usage);
        assert_eq!(
            EcsError::not_found(Subject::Field, "hp").kind(),
            ErrorKind::Lookup
        );
        assert_eq!(
            EcsError::duplicate(Subject::Component, "render").kind(),
            ErrorKind::Lookup
        );
        assert_eq!(EcsError::state("busy").kind(), ErrorKind::State);
    }

    #[test]
    fn messages() {
        let err = EcsError::not_found(Subject::Component, "render");
        assert_eq!(err.to_string(), "component not found: render");
        let err = EcsError::unknown_field("transform", "colour");
        assert_eq!(
            err.to_string(),
            "component 'transform' has no field 'colour'"
        );
    }

    #[test]
    fn empty_names_are_usage_errors() {
        assert!(require_name("a", "name").is_ok());
        assert_eq!(
            require_name("", "identifier").unwrap_err().kind(),
            ErrorKind::Usage
        );
    }
}
