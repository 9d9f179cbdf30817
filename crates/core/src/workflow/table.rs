use serde::{Deserialize, Serialize};

use crate::workflow::engine::WorkflowError;
use crate::workflow::states::{ActionKind, RequestState, RoleKind, TransitionAction, Track};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "term", rename_all = "snake_case")]
pub enum GuardTerm {
    /// Holder of the role in any department that has it.
    RoleAnywhere { role: RoleKind },
    /// Holder of the role in the department assigned to the track.
    RoleInTrack { role: RoleKind, track: Track },
    /// The employee who created the request.
    Requester,
}

impl GuardTerm {
    pub fn describe(&self) -> String {
        match self {
            Self::RoleAnywhere { role } => format!("{role} in any department"),
            Self::RoleInTrack { role, track } => format!("{role} of the {track} department"),
            Self::Requester => "the requester".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GuardSpec {
    /// Canonical condition text used as-is.
    Literal(String),
    /// Terms OR'd together after substituting departments and role codes.
    Template(Vec<GuardTerm>),
}

impl GuardSpec {
    pub fn describe(&self) -> String {
        match self {
            Self::Literal(text) if text.trim().is_empty() => "requires nobody".to_owned(),
            Self::Literal(text) => format!("requires a match for `{text}`"),
            Self::Template(terms) => {
                let terms = terms.iter().map(GuardTerm::describe).collect::<Vec<_>>();
                format!("requires {}", terms.join(" or "))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: RequestState,
    pub kind: ActionKind,
    pub to: RequestState,
    pub guard: GuardSpec,
}

impl Transition {
    /// The action that selects exactly this edge.
    pub fn action(&self) -> TransitionAction {
        match self.kind {
            ActionKind::Forward => TransitionAction::forward_to(self.to),
            ActionKind::Return => TransitionAction::Return,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionTable {
    transitions: Vec<Transition>,
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TransitionTable {
    pub fn new(transitions: Vec<Transition>) -> Self {
        Self { transitions }
    }

    /// The purchase-request approval chain.
    pub fn standard() -> Self {
        use ActionKind::{Forward, Return};
        use RequestState::{A1, A2, A3, A4, A5, A6, A7};
        use RoleKind::{DepartmentHead, DeputyDirector, Director, Staff};
        use Track::{Planning, Technical};

        let anywhere = |role| GuardTerm::RoleAnywhere { role };
        let in_track = |role, track| GuardTerm::RoleInTrack { role, track };
        let edge = |from, kind, to, terms: Vec<GuardTerm>| Transition {
            from,
            kind,
            to,
            guard: GuardSpec::Template(terms),
        };

        Self::new(vec![
            edge(A1, Forward, A2, vec![anywhere(DeputyDirector)]),
            edge(A2, Forward, A3, vec![in_track(DepartmentHead, Technical)]),
            edge(A2, Forward, A5, vec![in_track(DepartmentHead, Planning)]),
            edge(A2, Return, A1, vec![GuardTerm::Requester]),
            edge(A3, Forward, A4, vec![in_track(Staff, Technical)]),
            edge(A3, Return, A2, vec![in_track(DepartmentHead, Technical)]),
            edge(A4, Return, A3, vec![in_track(Staff, Technical)]),
            edge(A5, Forward, A6, vec![in_track(Staff, Planning)]),
            edge(A5, Return, A2, vec![in_track(DepartmentHead, Planning)]),
            edge(A6, Forward, A2, vec![in_track(DepartmentHead, Planning), anywhere(Director)]),
            edge(A6, Return, A5, vec![in_track(Staff, Planning)]),
            edge(A7, Forward, A3, vec![in_track(DepartmentHead, Planning), anywhere(Director)]),
            edge(A7, Forward, A5, vec![in_track(DepartmentHead, Planning), anywhere(Director)]),
        ])
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn edges_from(&self, state: RequestState) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(move |transition| transition.from == state)
    }

    /// Picks the edge an action names. A bare forward is only accepted where
    /// exactly one forward edge leaves the state.
    pub fn select(
        &self,
        state: RequestState,
        action: &TransitionAction,
    ) -> Result<&Transition, WorkflowError> {
        let invalid = || WorkflowError::InvalidTransition { state, action: *action };
        let mut candidates =
            self.edges_from(state).filter(|transition| transition.kind == action.kind());

        match action.target() {
            Some(target) => {
                candidates.find(|transition| transition.to == target).ok_or_else(invalid)
            }
            None => match (candidates.next(), candidates.next()) {
                (Some(only), None) => Ok(only),
                _ => Err(invalid()),
            },
        }
    }

    /// Replaces one edge's guard with fixed condition text.
    pub fn with_literal_guard(
        mut self,
        state: RequestState,
        action: &TransitionAction,
        condition: impl Into<String>,
    ) -> Result<Self, WorkflowError> {
        let (kind, to) = {
            let transition = self.select(state, action)?;
            (transition.kind, transition.to)
        };
        let condition = condition.into();
        if let Some(transition) = self.transitions.iter_mut().find(|transition| {
            transition.from == state && transition.kind == kind && transition.to == to
        }) {
            transition.guard = GuardSpec::Literal(condition);
        }
        Ok(self)
    }
}
