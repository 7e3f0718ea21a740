use std::fmt::{self, Display, Formatter};

/// Updates which are applicable but not yet installed.
pub const NOT_INSTALLED: &str = "IsInstalled=0";
/// Updates which are installed on this machine.
pub const INSTALLED: &str = "IsInstalled=1";
/// Updates which the user or an administrator has hidden.
pub const HIDDEN: &str = "IsHidden=1";

/// A search criteria expression understood by the update service, e.g. `IsInstalled=0`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Shrinkwrap)]
pub struct Criteria(pub(crate) Box<str>);

impl Criteria {
    pub fn new<S: Into<Box<str>>>(expression: S) -> Self { Criteria(expression.into()) }
}

impl From<&str> for Criteria {
    fn from(expression: &str) -> Self { Criteria::new(expression) }
}

impl Display for Criteria {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(self) }
}

/// A titled search which makes up one section of the report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Query {
    pub title:    Box<str>,
    pub criteria: Criteria,
}

impl Query {
    pub fn new<T: Into<Box<str>>, C: Into<Criteria>>(title: T, criteria: C) -> Self {
        Self { title: title.into(), criteria: criteria.into() }
    }

    pub fn available() -> Self { Self::new("Available Updates", NOT_INSTALLED) }

    pub fn installed() -> Self { Self::new("Installed Updates", INSTALLED) }

    pub fn hidden() -> Self { Self::new("Hidden Updates", HIDDEN) }

    /// The searches the report runs, in the order they are printed.
    pub fn defaults() -> Vec<Query> {
        cascade! {
            Vec::with_capacity(3);
            ..push(Query::available());
            ..push(Query::installed());
            ..push(Query::hidden());
        }
    }
}
