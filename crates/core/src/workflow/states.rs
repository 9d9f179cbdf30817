use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RequestState {
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
    A8,
}

impl RequestState {
    pub const ALL: [RequestState; 8] = [
        RequestState::A1,
        RequestState::A2,
        RequestState::A3,
        RequestState::A4,
        RequestState::A5,
        RequestState::A6,
        RequestState::A7,
        RequestState::A8,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::A3 => "A3",
            Self::A4 => "A4",
            Self::A5 => "A5",
            Self::A6 => "A6",
            Self::A7 => "A7",
            Self::A8 => "A8",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::A8)
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown request state `{0}` (expected A1..A8)")]
pub struct UnknownState(pub String);

impl FromStr for RequestState {
    type Err = UnknownState;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == normalized)
            .ok_or_else(|| UnknownState(value.to_owned()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Forward,
    Return,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => f.write_str("forward"),
            Self::Return => f.write_str("return"),
        }
    }
}

/// A user action on a request. At branch points the forward target must be named.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionAction {
    Forward(Option<RequestState>),
    Return,
}

impl TransitionAction {
    pub fn forward() -> Self {
        Self::Forward(None)
    }

    pub fn forward_to(target: RequestState) -> Self {
        Self::Forward(Some(target))
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Forward(_) => ActionKind::Forward,
            Self::Return => ActionKind::Return,
        }
    }

    pub fn target(&self) -> Option<RequestState> {
        match self {
            Self::Forward(target) => *target,
            Self::Return => None,
        }
    }
}

impl fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward(Some(target)) => write!(f, "forward to {target}"),
            Self::Forward(None) => f.write_str("forward"),
            Self::Return => f.write_str("return"),
        }
    }
}

/// Department track a request can be routed through after A2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    Technical,
    Planning,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Technical => f.write_str("Technical"),
            Self::Planning => f.write_str("Planning"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Director,
    DeputyDirector,
    DepartmentHead,
    Staff,
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Director => f.write_str("Director"),
            Self::DeputyDirector => f.write_str("Deputy Director"),
            Self::DepartmentHead => f.write_str("Department Head"),
            Self::Staff => f.write_str("Staff"),
        }
    }
}
