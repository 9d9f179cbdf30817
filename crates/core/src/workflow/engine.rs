use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::condition::{evaluate, parse, Clause, Condition, ParseError};
use crate::domain::Actor;
use crate::workflow::lookup::{DepartmentLookup, LookupError};
use crate::workflow::settings::WorkflowSettings;
use crate::workflow::states::{RequestState, TransitionAction};
use crate::workflow::table::{GuardSpec, GuardTerm, Transition, TransitionTable};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("actor `{actor_id}` may not {action} from {state}: {requirement}")]
    Unauthorized {
        state: RequestState,
        action: TransitionAction,
        actor_id: String,
        requirement: String,
    },
    #[error("no `{action}` transition is defined from {state}")]
    InvalidTransition { state: RequestState, action: TransitionAction },
    #[error("cannot determine eligible actor: {0}")]
    LookupFailed(#[from] LookupError),
    #[error("guard for `{action}` from {state} is malformed: {source}")]
    MalformedGuard { state: RequestState, action: TransitionAction, source: ParseError },
}

/// Per-call inputs the guards are resolved against.
#[derive(Clone, Copy)]
pub struct WorkflowContext<'a> {
    pub departments: &'a dyn DepartmentLookup,
    pub requester_id: Option<&'a str>,
}

impl<'a> WorkflowContext<'a> {
    pub fn new(departments: &'a dyn DepartmentLookup) -> Self {
        Self { departments, requester_id: None }
    }

    pub fn with_requester(mut self, requester_id: &'a str) -> Self {
        self.requester_id = Some(requester_id);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct WorkflowEngine {
    table: TransitionTable,
    settings: WorkflowSettings,
}

impl WorkflowEngine {
    pub fn new(table: TransitionTable, settings: WorkflowSettings) -> Self {
        Self { table, settings }
    }

    pub fn with_settings(settings: WorkflowSettings) -> Self {
        Self::new(TransitionTable::standard(), settings)
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Substitutes live departments and role codes into an edge's guard.
    pub fn resolve_guard(
        &self,
        transition: &Transition,
        context: &WorkflowContext<'_>,
    ) -> Result<Condition, WorkflowError> {
        let condition = match &transition.guard {
            GuardSpec::Literal(text) => {
                parse(text).map_err(|source| WorkflowError::MalformedGuard {
                    state: transition.from,
                    action: transition.action(),
                    source,
                })?
            }
            GuardSpec::Template(terms) => {
                let mut condition = Condition::empty();
                for term in terms {
                    condition = condition.or(self.resolve_term(term, context)?);
                }
                condition
            }
        };

        debug!(
            event_name = "workflow.guard_resolved",
            state = %transition.from,
            to = %transition.to,
            clauses = condition.len(),
            "resolved transition guard"
        );
        Ok(condition)
    }

    fn resolve_term(
        &self,
        term: &GuardTerm,
        context: &WorkflowContext<'_>,
    ) -> Result<Condition, LookupError> {
        match term {
            GuardTerm::RoleAnywhere { role } => {
                let role_id = self.settings.role_code(*role);
                context
                    .departments
                    .list_departments()?
                    .into_iter()
                    .filter(|department| department.has_role(role_id))
                    .map(|department| department_clause(&department.id, role_id))
                    .collect()
            }
            GuardTerm::RoleInTrack { role, track } => {
                let department_id = self.settings.department_for(*track);
                let role_id = self.settings.role_code(*role);
                let department = context
                    .departments
                    .find_department(department_id)?
                    .ok_or_else(|| LookupError::DepartmentNotFound(department_id.to_owned()))?;
                if !department.has_role(role_id) {
                    return Err(LookupError::RoleNotInDepartment {
                        department_id: department_id.to_owned(),
                        role_id: role_id.to_owned(),
                    });
                }
                Ok(Condition::new(vec![department_clause(department_id, role_id)?]))
            }
            GuardTerm::Requester => {
                let requester_id = context
                    .requester_id
                    .filter(|id| !id.trim().is_empty())
                    .ok_or(LookupError::MissingRequester)?;
                let clause = Clause::employees([requester_id])
                    .map_err(|error| LookupError::InvalidRecord(error.to_string()))?;
                Ok(Condition::new(vec![clause]))
            }
        }
    }

    /// Selects the edge and checks the actor against its guard.
    pub fn authorize(
        &self,
        current: RequestState,
        action: &TransitionAction,
        actor: &Actor,
        context: &WorkflowContext<'_>,
    ) -> Result<&Transition, WorkflowError> {
        let transition = self.table.select(current, action)?;
        let guard = self.resolve_guard(transition, context)?;
        if !evaluate(&guard, actor) {
            return Err(WorkflowError::Unauthorized {
                state: current,
                action: *action,
                actor_id: actor.id.clone(),
                requirement: transition.guard.describe(),
            });
        }
        Ok(transition)
    }

    pub fn can_advance(
        &self,
        current: RequestState,
        action: &TransitionAction,
        actor: &Actor,
        context: &WorkflowContext<'_>,
    ) -> bool {
        self.authorize(current, action, actor, context).is_ok()
    }

    /// One hop along the chain. Nothing is persisted here.
    pub fn advance(
        &self,
        current: RequestState,
        action: &TransitionAction,
        actor: &Actor,
        context: &WorkflowContext<'_>,
    ) -> Result<RequestState, WorkflowError> {
        match self.authorize(current, action, actor, context) {
            Ok(transition) => {
                info!(
                    event_name = "workflow.transition_authorized",
                    from = %current,
                    to = %transition.to,
                    action = %action,
                    actor_id = actor.id.as_str(),
                    "request transition authorized"
                );
                Ok(transition.to)
            }
            Err(rejection) => {
                match &rejection {
                    WorkflowError::InvalidTransition { .. }
                    | WorkflowError::MalformedGuard { .. } => {
                        error!(
                            event_name = "workflow.transition_rejected",
                            from = %current,
                            action = %action,
                            actor_id = actor.id.as_str(),
                            error = %rejection,
                            "request transition is not defined"
                        );
                    }
                    WorkflowError::Unauthorized { .. } | WorkflowError::LookupFailed(_) => {
                        warn!(
                            event_name = "workflow.transition_rejected",
                            from = %current,
                            action = %action,
                            actor_id = actor.id.as_str(),
                            error = %rejection,
                            "request transition rejected"
                        );
                    }
                }
                Err(rejection)
            }
        }
    }

    /// `advance` plus one audit event for the hop. For callers that do not
    /// persist the transition; persisting callers audit after their write.
    pub fn advance_with_audit<S>(
        &self,
        current: RequestState,
        action: &TransitionAction,
        actor: &Actor,
        context: &WorkflowContext<'_>,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<RequestState, WorkflowError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.advance(current, action, actor, context);
        let event = match &result {
            Ok(next) => AuditEvent::new(
                audit.request_id.clone(),
                audit.correlation_id.clone(),
                "workflow.transition_applied",
                AuditCategory::Workflow,
                actor.id.clone(),
                AuditOutcome::Success,
            )
            .with_metadata("to", next.to_string()),
            Err(rejection) => AuditEvent::new(
                audit.request_id.clone(),
                audit.correlation_id.clone(),
                "workflow.transition_rejected",
                AuditCategory::Workflow,
                actor.id.clone(),
                AuditOutcome::Rejected,
            )
            .with_metadata("error", rejection.to_string()),
        };
        sink.emit(
            event
                .with_metadata("from", current.to_string())
                .with_metadata("action", action.to_string())
                .with_metadata("channel", audit.channel.clone()),
        );
        result
    }

    /// Actions the actor could take right now; edges whose guard cannot be
    /// resolved are left out.
    pub fn available_actions(
        &self,
        current: RequestState,
        actor: &Actor,
        context: &WorkflowContext<'_>,
    ) -> Vec<TransitionAction> {
        self.table
            .edges_from(current)
            .filter(|transition| {
                self.resolve_guard(transition, context)
                    .map(|guard| evaluate(&guard, actor))
                    .unwrap_or(false)
            })
            .map(Transition::action)
            .collect()
    }

    /// Everyone who may act on a request sitting in `state`, as one condition.
    pub fn next_condition(
        &self,
        state: RequestState,
        context: &WorkflowContext<'_>,
    ) -> Result<Condition, WorkflowError> {
        let mut condition = Condition::empty();
        for transition in self.table.edges_from(state) {
            for clause in self.resolve_guard(transition, context)?.clauses() {
                if !condition.clauses().contains(clause) {
                    condition.push(clause.clone());
                }
            }
        }
        Ok(condition)
    }
}

fn department_clause(department_id: &str, role_id: &str) -> Result<Clause, LookupError> {
    Clause::department_role(department_id, role_id)
        .map_err(|error| LookupError::InvalidRecord(error.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::audit::{AuditContext, AuditOutcome, InMemoryAuditSink};
    use crate::condition::{serialize, Clause};
    use crate::domain::{Actor, Department, RequestId, Role};
    use crate::workflow::engine::{WorkflowContext, WorkflowEngine, WorkflowError};
    use crate::workflow::lookup::{DepartmentDirectory, LookupError};
    use crate::workflow::settings::WorkflowSettings;
    use crate::workflow::states::{RequestState, TransitionAction};
    use crate::workflow::table::TransitionTable;

    fn role(id: &str, name: &str) -> Role {
        Role { id: id.to_owned(), name: name.to_owned() }
    }

    fn directory() -> DepartmentDirectory {
        DepartmentDirectory::new(
            vec![
                Department {
                    id: "BGD".to_owned(),
                    name: "Board of Directors".to_owned(),
                    roles: vec![role("1", "Director"), role("2", "Deputy Director")],
                },
                Department {
                    id: "KTh".to_owned(),
                    name: "Technical".to_owned(),
                    roles: vec![role("3", "Department Head"), role("4", "Staff")],
                },
                Department {
                    id: "KH".to_owned(),
                    name: "Planning".to_owned(),
                    roles: vec![role("3", "Department Head"), role("4", "Staff")],
                },
            ],
            Vec::new(),
        )
    }

    fn actor(id: &str, department: &str, role: &str) -> Actor {
        Actor::new(id, department, role)
    }

    #[test]
    fn deputy_director_forwards_a1() {
        let engine = WorkflowEngine::default();
        let directory = directory();
        let context = WorkflowContext::new(&directory);

        let next = engine
            .advance(RequestState::A1, &TransitionAction::forward(), &actor("e2", "BGD", "2"), &context)
            .expect("deputy director may forward");
        assert_eq!(next, RequestState::A2);
    }

    #[test]
    fn staff_cannot_forward_a1() {
        let engine = WorkflowEngine::default();
        let directory = directory();
        let context = WorkflowContext::new(&directory);

        let error = engine
            .advance(RequestState::A1, &TransitionAction::forward(), &actor("e4", "KTh", "4"), &context)
            .expect_err("staff may not forward A1");
        assert!(matches!(
            error,
            WorkflowError::Unauthorized { ref requirement, .. }
                if requirement == "requires Deputy Director in any department"
        ));
    }

    #[test]
    fn a2_branch_requires_head_of_the_selected_track() {
        let engine = WorkflowEngine::default();
        let directory = directory();
        let context = WorkflowContext::new(&directory);
        let to_technical = TransitionAction::forward_to(RequestState::A3);

        let next = engine
            .advance(RequestState::A2, &to_technical, &actor("h1", "KTh", "3"), &context)
            .expect("technical head may route to A3");
        assert_eq!(next, RequestState::A3);

        let error = engine
            .advance(RequestState::A2, &to_technical, &actor("h2", "KH", "3"), &context)
            .expect_err("planning head may not route to A3");
        assert!(matches!(error, WorkflowError::Unauthorized { .. }));

        let next = engine
            .advance(
                RequestState::A2,
                &TransitionAction::forward_to(RequestState::A5),
                &actor("h2", "KH", "3"),
                &context,
            )
            .expect("planning head may route to A5");
        assert_eq!(next, RequestState::A5);
    }

    #[test]
    fn technical_staff_returns_a4() {
        let engine = WorkflowEngine::default();
        let directory = directory();
        let context = WorkflowContext::new(&directory);

        let next = engine
            .advance(RequestState::A4, &TransitionAction::Return, &actor("s1", "KTh", "4"), &context)
            .expect("technical staff may return A4");
        assert_eq!(next, RequestState::A3);
    }

    #[test]
    fn a2_return_needs_the_requester() {
        let engine = WorkflowEngine::default();
        let directory = directory();
        let bare = WorkflowContext::new(&directory);

        let error = engine
            .advance(RequestState::A2, &TransitionAction::Return, &actor("r1", "KH", "4"), &bare)
            .expect_err("requester unknown");
        assert_eq!(error, WorkflowError::LookupFailed(LookupError::MissingRequester));

        let context = bare.with_requester("r1");
        assert_eq!(
            engine.advance(RequestState::A2, &TransitionAction::Return, &actor("r1", "KH", "4"), &context),
            Ok(RequestState::A1)
        );
        assert!(!engine.can_advance(
            RequestState::A2,
            &TransitionAction::Return,
            &actor("r2", "KH", "4"),
            &context
        ));
    }

    #[test]
    fn a6_merges_back_for_planning_head_or_director() {
        let engine = WorkflowEngine::default();
        let directory = directory();
        let context = WorkflowContext::new(&directory);
        let forward = TransitionAction::forward();

        assert!(engine.can_advance(RequestState::A6, &forward, &actor("h2", "KH", "3"), &context));
        assert!(engine.can_advance(RequestState::A6, &forward, &actor("d1", "BGD", "1"), &context));
        assert!(!engine.can_advance(RequestState::A6, &forward, &actor("h1", "KTh", "3"), &context));
        assert!(!engine.can_advance(RequestState::A6, &forward, &actor("d2", "BGD", "2"), &context));
    }

    #[test]
    fn a7_forwards_to_the_pending_branch() {
        let engine = WorkflowEngine::default();
        let directory = directory();
        let context = WorkflowContext::new(&directory);
        let director = actor("d1", "BGD", "1");

        assert_eq!(
            engine.advance(
                RequestState::A7,
                &TransitionAction::forward_to(RequestState::A5),
                &director,
                &context
            ),
            Ok(RequestState::A5)
        );
        assert!(matches!(
            engine.advance(RequestState::A7, &TransitionAction::forward(), &director, &context),
            Err(WorkflowError::InvalidTransition { state: RequestState::A7, .. })
        ));
    }

    #[test]
    fn terminal_state_rejects_every_action() {
        let engine = WorkflowEngine::default();
        let directory = directory();
        let context = WorkflowContext::new(&directory);
        let director = actor("d1", "BGD", "1");

        for action in [TransitionAction::forward(), TransitionAction::Return] {
            assert!(matches!(
                engine.advance(RequestState::A8, &action, &director, &context),
                Err(WorkflowError::InvalidTransition { state: RequestState::A8, .. })
            ));
        }
    }

    #[test]
    fn missing_track_department_is_a_lookup_failure() {
        let engine = WorkflowEngine::with_settings(WorkflowSettings {
            technical_department: "KTX".to_owned(),
            ..WorkflowSettings::default()
        });
        let directory = directory();
        let context = WorkflowContext::new(&directory);

        let error = engine
            .advance(RequestState::A3, &TransitionAction::forward(), &actor("s1", "KTh", "4"), &context)
            .expect_err("track department is missing");
        assert_eq!(
            error,
            WorkflowError::LookupFailed(LookupError::DepartmentNotFound("KTX".to_owned()))
        );
    }

    #[test]
    fn role_anywhere_without_holders_admits_nobody() {
        let engine = WorkflowEngine::default();
        let directory = DepartmentDirectory::new(Vec::new(), Vec::new());
        let context = WorkflowContext::new(&directory);

        assert!(matches!(
            engine.advance(RequestState::A1, &TransitionAction::forward(), &actor("e2", "BGD", "2"), &context),
            Err(WorkflowError::Unauthorized { .. })
        ));
    }

    #[test]
    fn literal_guards_override_templates() {
        let table = TransitionTable::standard()
            .with_literal_guard(RequestState::A1, &TransitionAction::forward(), r#"(id = "e9")"#)
            .expect("edge exists");
        let engine = WorkflowEngine::new(table, WorkflowSettings::default());
        let directory = directory();
        let context = WorkflowContext::new(&directory);

        assert!(engine.can_advance(RequestState::A1, &TransitionAction::forward(), &actor("e9", "KH", "4"), &context));
        assert!(!engine.can_advance(RequestState::A1, &TransitionAction::forward(), &actor("e2", "BGD", "2"), &context));
    }

    #[test]
    fn malformed_literal_guard_is_reported() {
        let table = TransitionTable::standard()
            .with_literal_guard(RequestState::A1, &TransitionAction::forward(), "(id = \"e9\"")
            .expect("edge exists");
        let engine = WorkflowEngine::new(table, WorkflowSettings::default());
        let directory = directory();
        let context = WorkflowContext::new(&directory);

        assert!(matches!(
            engine.advance(RequestState::A1, &TransitionAction::forward(), &actor("e9", "KH", "4"), &context),
            Err(WorkflowError::MalformedGuard { .. })
        ));
    }

    #[test]
    fn available_actions_list_only_permitted_edges() {
        let engine = WorkflowEngine::default();
        let directory = directory();
        let context = WorkflowContext::new(&directory).with_requester("h1");

        let actions = engine.available_actions(RequestState::A2, &actor("h1", "KTh", "3"), &context);
        assert_eq!(
            actions,
            vec![TransitionAction::forward_to(RequestState::A3), TransitionAction::Return]
        );
    }

    #[test]
    fn next_condition_unions_outgoing_guards() {
        let engine = WorkflowEngine::default();
        let directory = directory();
        let context = WorkflowContext::new(&directory);

        let a6 = engine.next_condition(RequestState::A6, &context).expect("resolvable");
        assert_eq!(
            serialize(&a6),
            r#"(department = "KH" && role = "3") || (department = "BGD" && role = "1") || (department = "KH" && role = "4")"#
        );

        let a7 = engine.next_condition(RequestState::A7, &context).expect("resolvable");
        assert_eq!(a7.len(), 2);
        assert_eq!(a7.clauses()[0], Clause::department_role("KH", "3").expect("clause"));

        assert!(engine.next_condition(RequestState::A8, &context).expect("terminal").is_empty());
    }

    #[test]
    fn audited_advance_records_outcomes() {
        let engine = WorkflowEngine::default();
        let directory = directory();
        let context = WorkflowContext::new(&directory);
        let sink = InMemoryAuditSink::default();
        let audit = AuditContext::new(Some(RequestId("PR-7".to_owned())), "req-1", "web");

        let _ = engine.advance_with_audit(
            RequestState::A1,
            &TransitionAction::forward(),
            &actor("e2", "BGD", "2"),
            &context,
            &sink,
            &audit,
        );
        let _ = engine.advance_with_audit(
            RequestState::A1,
            &TransitionAction::forward(),
            &actor("e4", "KTh", "4"),
            &context,
            &sink,
            &audit,
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "workflow.transition_applied");
        assert_eq!(events[0].metadata.get("to").map(String::as_str), Some("A2"));
        assert_eq!(events[1].outcome, AuditOutcome::Rejected);
        assert_eq!(events[1].actor, "e4");
        assert_eq!(events[1].request_id, Some(RequestId("PR-7".to_owned())));
    }
}
