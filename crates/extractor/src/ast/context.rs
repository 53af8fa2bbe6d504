/// Syntactic position of an expression, threaded down the traversal so
/// anonymous functions and classes can borrow a name from where they sit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingContext {
    /// `const name = <expr>`
    VariableDeclarator(String),
    /// `{ name: <expr> }` or a class field initializer
    ObjectProperty(String),
    /// `target.name = <expr>`
    AssignmentTarget(String),
    None,
}

impl NamingContext {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::VariableDeclarator(name)
            | Self::ObjectProperty(name)
            | Self::AssignmentTarget(name) => Some(name),
            Self::None => None,
        }
    }

    /// Name for an anonymous definition at this position
    #[must_use]
    pub fn name_or_anonymous(&self) -> String {
        self.name().unwrap_or(ANONYMOUS).to_string()
    }
}

pub const ANONYMOUS: &str = "anonymous";

#[cfg(test)]
mod tests {
    use super::NamingContext;

    #[test]
    fn only_none_is_anonymous() {
        assert_eq!(
            NamingContext::VariableDeclarator("a".into()).name_or_anonymous(),
            "a"
        );
        assert_eq!(NamingContext::ObjectProperty("b".into()).name(), Some("b"));
        assert_eq!(NamingContext::None.name_or_anonymous(), "anonymous");
    }
}
