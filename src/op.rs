// Operator argument and option binding, validated at construction time.

use thiserror::Error;

use crate::term::BoxTerm;

/// Binding errors
///
/// All of these surface while building a term from the decoded tree,
/// at query-compile time. A term that binds successfully can no longer
/// fail on argument shape.
#[derive(Error, Debug)]
pub enum BindError {
    #[error("`{term}` expects {expected} argument(s) but found {found}")]
    ArgCount {
        term: &'static str,
        expected: String,
        found: usize,
    },

    #[error("`{term}` accepts no named option `{key}`")]
    UnknownOptArg { term: &'static str, key: String },

    #[error("`{term}` is missing its literal datum payload")]
    MissingDatum { term: &'static str },
}

/// Positional-argument count constraint for an operator term.
#[derive(Clone, Copy, Debug)]
pub struct ArgSpec {
    min: usize,
    /// `None` means unbounded.
    max: Option<usize>,
}

impl ArgSpec {
    pub const fn exactly(n: usize) -> Self {
        ArgSpec { min: n, max: Some(n) }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        ArgSpec { min, max: Some(max) }
    }

    pub const fn at_least(min: usize) -> Self {
        ArgSpec { min, max: None }
    }

    pub fn contains(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }

    fn describe(&self) -> String {
        match self.max {
            Some(max) if max == self.min => format!("exactly {}", self.min),
            Some(max) => format!("between {} and {}", self.min, max),
            None if self.min == 0 => "any number of".to_string(),
            None => format!("{} or more", self.min),
        }
    }
}

/// Which named options an operator accepts.
#[derive(Clone, Copy, Debug)]
pub enum OptArgSpec {
    /// No named options accepted.
    None,
    /// An arbitrary string-keyed option map (object-shaped terms).
    Object,
}

/// The bound children of an operator term.
///
/// Holds the positional arguments, the option pairs in declared order,
/// and the determinism flag folded over every child. All of it is fixed
/// before the first evaluation, so the planner can consult determinism
/// without evaluating anything.
#[derive(Debug)]
pub struct OpArgs {
    args: Vec<BoxTerm>,
    optargs: Vec<(String, BoxTerm)>,
    deterministic: bool,
}

impl OpArgs {
    /// Validate counts and option shape, then bind.
    ///
    /// Option keys are not deduplicated here: uniqueness before
    /// evaluation is the decoder's contract, and the object term
    /// re-validates at insertion into its result.
    pub fn bind(
        term: &'static str,
        spec: ArgSpec,
        optspec: OptArgSpec,
        args: Vec<BoxTerm>,
        optargs: Vec<(String, BoxTerm)>,
    ) -> Result<Self, BindError> {
        if !spec.contains(args.len()) {
            return Err(BindError::ArgCount {
                term,
                expected: spec.describe(),
                found: args.len(),
            });
        }
        if let OptArgSpec::None = optspec {
            if let Some((key, _)) = optargs.first() {
                return Err(BindError::UnknownOptArg {
                    term,
                    key: key.clone(),
                });
            }
        }
        let deterministic = args.iter().all(|t| t.is_deterministic())
            && optargs.iter().all(|(_, t)| t.is_deterministic());
        Ok(OpArgs {
            args,
            optargs,
            deterministic,
        })
    }

    #[inline]
    pub fn args(&self) -> &[BoxTerm] {
        &self.args
    }

    #[inline]
    pub fn optargs(&self) -> &[(String, BoxTerm)] {
        &self.optargs
    }

    /// Structural determinism: true iff every bound child is deterministic.
    #[inline]
    pub fn deterministic(&self) -> bool {
        self.deterministic
    }
}
