use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use procura_core::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use procura_core::condition::serialize;
use procura_core::domain::{Actor, PurchaseRequest, RequestId, TransitionRecord};
use procura_core::errors::{ApplicationError, DomainError};
use procura_core::workflow::{
    DepartmentDirectory, LookupError, RequestState, TransitionAction, WorkflowContext,
    WorkflowEngine, WorkflowError,
};

use crate::repositories::{
    DepartmentRepository, EmployeeRepository, RepositoryError, RequestStateStore,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request `{0}` not found")]
    RequestNotFound(String),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ServiceError> for ApplicationError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::RequestNotFound(id) => ApplicationError::Domain(
                DomainError::InvariantViolation(format!("request `{id}` not found")),
            ),
            ServiceError::Workflow(error) => ApplicationError::Domain(DomainError::Workflow(error)),
            ServiceError::Repository(error) => ApplicationError::Persistence(error.to_string()),
        }
    }
}

/// Drives requests through the approval chain against the stored directory.
#[derive(Clone)]
pub struct WorkflowService {
    engine: WorkflowEngine,
    departments: Arc<dyn DepartmentRepository>,
    employees: Arc<dyn EmployeeRepository>,
    requests: Arc<dyn RequestStateStore>,
    audit: Arc<dyn AuditSink>,
}

impl WorkflowService {
    pub fn new(
        engine: WorkflowEngine,
        departments: Arc<dyn DepartmentRepository>,
        employees: Arc<dyn EmployeeRepository>,
        requests: Arc<dyn RequestStateStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { engine, departments, employees, requests, audit }
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    async fn snapshot(&self) -> Result<DepartmentDirectory, ServiceError> {
        let departments = self.departments.list_departments().await?;
        Ok(DepartmentDirectory::new(departments, Vec::new()))
    }

    async fn find_actor(&self, actor_id: &str) -> Result<Actor, ServiceError> {
        let found = self.employees.find_employees_by_ids(&[actor_id.to_string()]).await?;
        found
            .iter()
            .find(|employee| employee.id == actor_id)
            .map(Actor::from)
            .ok_or_else(|| {
                WorkflowError::LookupFailed(LookupError::EmployeeNotFound(actor_id.to_string()))
                    .into()
            })
    }

    async fn find_request(&self, request_id: &RequestId) -> Result<PurchaseRequest, ServiceError> {
        self.requests
            .find_request(request_id)
            .await?
            .ok_or_else(|| ServiceError::RequestNotFound(request_id.0.clone()))
    }

    /// Registers a new request at A1 with its first eligibility condition.
    pub async fn open_request(
        &self,
        id: RequestId,
        title: impl Into<String>,
        requester_id: &str,
    ) -> Result<PurchaseRequest, ServiceError> {
        let requester = self.find_actor(requester_id).await?;
        let directory = self.snapshot().await?;
        let context = WorkflowContext::new(&directory).with_requester(&requester.id);
        let next_condition = self.engine.next_condition(RequestState::A1, &context)?;

        let request = PurchaseRequest {
            id,
            title: title.into(),
            requester_id: requester.id.clone(),
            status: RequestState::A1,
            next_condition: serialize(&next_condition),
            created_at: Utc::now(),
        };
        self.requests.save_request(request.clone()).await?;

        info!(
            event_name = "workflow.request_opened",
            request_id = request.id.0.as_str(),
            requester_id = request.requester_id.as_str(),
            "purchase request opened"
        );
        Ok(request)
    }

    /// Applies one action and persists the resulting transition.
    ///
    /// Exactly one audit event is emitted per call, after the outcome is known.
    pub async fn advance(
        &self,
        request_id: &RequestId,
        action: TransitionAction,
        actor_id: &str,
        note: Option<String>,
    ) -> Result<TransitionRecord, ServiceError> {
        let audit = AuditContext::new(
            Some(request_id.clone()),
            Uuid::new_v4().to_string(),
            "workflow_service",
        );
        let result = self.apply(request_id, &action, actor_id, note).await;
        self.audit.emit(transition_audit_event(&audit, &action, actor_id, &result));

        match &result {
            Ok(record) => info!(
                event_name = "workflow.request_advanced",
                request_id = request_id.0.as_str(),
                from = %record.from,
                to = %record.to,
                correlation_id = audit.correlation_id.as_str(),
                "purchase request advanced"
            ),
            Err(error) => warn!(
                event_name = "workflow.request_advance_failed",
                request_id = request_id.0.as_str(),
                action = %action,
                actor_id,
                correlation_id = audit.correlation_id.as_str(),
                error = %error,
                "purchase request was not advanced"
            ),
        }
        result
    }

    async fn apply(
        &self,
        request_id: &RequestId,
        action: &TransitionAction,
        actor_id: &str,
        note: Option<String>,
    ) -> Result<TransitionRecord, ServiceError> {
        let request = self.find_request(request_id).await?;
        let actor = self.find_actor(actor_id).await?;
        let directory = self.snapshot().await?;
        let context = WorkflowContext::new(&directory).with_requester(&request.requester_id);

        let to = self.engine.advance(request.status, action, &actor, &context)?;
        let next_condition = self.engine.next_condition(to, &context)?;

        let record = TransitionRecord {
            request_id: request_id.clone(),
            from: request.status,
            to,
            actor_id: actor.id.clone(),
            note: note.filter(|note| !note.trim().is_empty()),
            next_condition: serialize(&next_condition),
            recorded_at: Utc::now(),
        };
        self.requests.write_transition(record.clone()).await?;
        Ok(record)
    }

    /// What the actor may do on the request right now.
    pub async fn available_actions(
        &self,
        request_id: &RequestId,
        actor_id: &str,
    ) -> Result<Vec<TransitionAction>, ServiceError> {
        let request = self.find_request(request_id).await?;
        let actor = self.find_actor(actor_id).await?;
        let directory = self.snapshot().await?;
        let context = WorkflowContext::new(&directory).with_requester(&request.requester_id);
        Ok(self.engine.available_actions(request.status, &actor, &context))
    }
}

fn transition_audit_event(
    audit: &AuditContext,
    action: &TransitionAction,
    actor_id: &str,
    result: &Result<TransitionRecord, ServiceError>,
) -> AuditEvent {
    let event = match result {
        Ok(record) => AuditEvent::new(
            audit.request_id.clone(),
            audit.correlation_id.clone(),
            "workflow.transition_applied",
            AuditCategory::Workflow,
            actor_id,
            AuditOutcome::Success,
        )
        .with_metadata("from", record.from.to_string())
        .with_metadata("to", record.to.to_string()),
        Err(error) => {
            let (category, outcome) = classify(error);
            let event_type = match outcome {
                AuditOutcome::Rejected => "workflow.transition_rejected",
                _ => "workflow.transition_failed",
            };
            AuditEvent::new(
                audit.request_id.clone(),
                audit.correlation_id.clone(),
                event_type,
                category,
                actor_id,
                outcome,
            )
            .with_metadata("error", error.to_string())
        }
    };
    event
        .with_metadata("action", action.to_string())
        .with_metadata("channel", audit.channel.clone())
}

/// Rejections are the caller's doing; failures are the system's.
fn classify(error: &ServiceError) -> (AuditCategory, AuditOutcome) {
    match error {
        ServiceError::RequestNotFound(_)
        | ServiceError::Workflow(
            WorkflowError::Unauthorized { .. } | WorkflowError::InvalidTransition { .. },
        )
        | ServiceError::Repository(RepositoryError::StaleStatus { .. }) => {
            (AuditCategory::Workflow, AuditOutcome::Rejected)
        }
        ServiceError::Workflow(WorkflowError::MalformedGuard { .. }) => {
            (AuditCategory::Workflow, AuditOutcome::Failed)
        }
        ServiceError::Workflow(WorkflowError::LookupFailed(_)) => {
            (AuditCategory::Directory, AuditOutcome::Failed)
        }
        ServiceError::Repository(_) => (AuditCategory::System, AuditOutcome::Failed),
    }
}
