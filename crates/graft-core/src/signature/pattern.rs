use serde::{Deserialize, Serialize};
use std::fmt;

use crate::metadata::{ParamType, RoutineKind, RoutineMetadata};

/// Parameter-count constraint of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }

    pub fn floor(&self) -> usize {
        match *self {
            Arity::Exact(n) | Arity::AtLeast(n) => n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "={}", n),
            Arity::AtLeast(n) => write!(f, ">={}", n),
        }
    }
}

/// Per-position parameter predicate, loosest variant last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamPredicate {
    /// Exactly this type, primitive or named.
    Exact(ParamType),
    /// Any primitive. Covers OEM builds that swap e.g. bool for int in an
    /// otherwise-stable position.
    Scalar,
    /// Any named (non-primitive) type.
    Object,
    Any,
}

impl ParamPredicate {
    pub fn matches(&self, ty: &ParamType) -> bool {
        match self {
            ParamPredicate::Exact(expected) => expected == ty,
            ParamPredicate::Scalar => ty.is_primitive(),
            ParamPredicate::Object => !ty.is_primitive(),
            ParamPredicate::Any => true,
        }
    }

    /// Whether `self` accepts every type `other` accepts.
    pub fn is_no_stricter_than(&self, other: &ParamPredicate) -> bool {
        match (self, other) {
            (ParamPredicate::Any, _) => true,
            (a, b) if a == b => true,
            (ParamPredicate::Scalar, ParamPredicate::Exact(t)) => t.is_primitive(),
            (ParamPredicate::Object, ParamPredicate::Exact(t)) => !t.is_primitive(),
            _ => false,
        }
    }
}

impl fmt::Display for ParamPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamPredicate::Exact(ty) => write!(f, "{}", ty),
            ParamPredicate::Scalar => write!(f, "<scalar>"),
            ParamPredicate::Object => write!(f, "<object>"),
            ParamPredicate::Any => write!(f, "*"),
        }
    }
}

/// One acceptable routine shape: optional name and kind, an arity
/// constraint, and predicates for a prefix of the parameter positions.
/// Positions past the predicate list are unconstrained.
///
/// Immutable once constructed; build with the `method`/`constructor`
/// starters and the `arity`/`param` combinators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignaturePattern {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RoutineKind>,
    pub arity: Arity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<ParamPredicate>,
}

impl SignaturePattern {
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind: Some(RoutineKind::Method),
            arity: Arity::AtLeast(0),
            positions: Vec::new(),
        }
    }

    pub fn constructor() -> Self {
        Self {
            name: None,
            kind: Some(RoutineKind::Constructor),
            arity: Arity::AtLeast(0),
            positions: Vec::new(),
        }
    }

    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    /// Constrain one parameter position. Unset positions in between default
    /// to [`ParamPredicate::Any`].
    pub fn param(mut self, index: usize, predicate: ParamPredicate) -> Self {
        if self.positions.len() <= index {
            self.positions.resize(index + 1, ParamPredicate::Any);
        }
        self.positions[index] = predicate;
        self
    }

    /// Constrain positions 0..n to the given types in order.
    pub fn params(mut self, types: &[ParamType]) -> Self {
        for (i, ty) in types.iter().enumerate() {
            self = self.param(i, ParamPredicate::Exact(ty.clone()));
        }
        self
    }

    pub fn matches(&self, routine: &RoutineMetadata) -> bool {
        if let Some(kind) = self.kind {
            if routine.kind != kind {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if routine.name.as_deref() != Some(name.as_str()) {
                return false;
            }
        }
        if !self.arity.accepts(routine.arity()) {
            return false;
        }
        self.positions.iter().enumerate().all(|(i, predicate)| {
            routine
                .params
                .get(i)
                .is_some_and(|ty| predicate.matches(ty))
        })
    }

    /// Rough description for logs, e.g. `powerPress/=3(long, int, *)`.
    pub fn describe(&self) -> String {
        let positions = self
            .positions
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let name = match (&self.kind, &self.name) {
            (Some(RoutineKind::Constructor), _) => "new",
            (_, Some(name)) => name.as_str(),
            _ => "?",
        };
        format!("{}/{}({})", name, self.arity, positions)
    }
}
