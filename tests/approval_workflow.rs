//! Integration specifications for the multi-level award approval workflow,
//! driven through the public service facade and HTTP router.

mod common {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use tender_ops::workflows::approval::{
        approval_router, ActorId, ApprovalService, InMemoryDecisionNotifier,
        InMemoryWorkflowRepository,
    };
    use tender_ops::workflows::evaluation::TenderId;

    pub(super) fn tender_id() -> TenderId {
        TenderId("tender-riverside-depot".to_string())
    }

    pub(super) fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    pub(super) fn approvers() -> Vec<ActorId> {
        vec![
            ActorId("eng-manager".to_string()),
            ActorId("procurement-head".to_string()),
            ActorId("managing-director".to_string()),
        ]
    }

    pub(super) fn deadlines() -> Vec<DateTime<Utc>> {
        (1..=3).map(|days| now() + Duration::days(days)).collect()
    }

    pub(super) fn build_service() -> (
        Arc<ApprovalService<InMemoryWorkflowRepository, InMemoryDecisionNotifier>>,
        Arc<InMemoryDecisionNotifier>,
    ) {
        let repository = Arc::new(InMemoryWorkflowRepository::default());
        let notifier = Arc::new(InMemoryDecisionNotifier::default());
        let service = Arc::new(ApprovalService::new(repository, notifier.clone()));
        (service, notifier)
    }

    pub(super) fn build_router() -> (axum::Router, Arc<InMemoryDecisionNotifier>) {
        let (service, notifier) = build_service();
        (approval_router(service), notifier)
    }
}

mod service_facade {
    use chrono::Duration;

    use super::common::*;
    use tender_ops::workflows::approval::{ApprovalDecision, ApprovalServiceError, ApprovalStatus};

    #[test]
    fn chain_completes_after_every_level_approves() {
        let (service, notifier) = build_service();
        service
            .initiate(&tender_id(), approvers(), deadlines())
            .expect("initiation");

        let mut status = ApprovalStatus::InProgress;
        for (index, approver) in approvers().iter().enumerate() {
            let workflow = service
                .decide(
                    &tender_id(),
                    index,
                    approver,
                    ApprovalDecision::Approve,
                    None,
                    now(),
                )
                .expect("approval lands");
            status = workflow.status;
        }

        assert_eq!(status, ApprovalStatus::Completed);
        assert_eq!(notifier.events().len(), 1);
        assert_eq!(notifier.events()[0].template, "award_approved");
    }

    #[test]
    fn return_for_revision_requires_a_fresh_workflow() {
        let (service, _) = build_service();
        service
            .initiate(&tender_id(), approvers(), deadlines())
            .expect("initiation");

        let workflow = service
            .decide(
                &tender_id(),
                0,
                &approvers()[0],
                ApprovalDecision::ReturnForRevision,
                Some("resubmit with updated BOQ".to_string()),
                now(),
            )
            .expect("return lands");
        assert_eq!(workflow.status, ApprovalStatus::ReturnedForRevision);

        // the terminal instance stays in place; a later decision cannot revive it
        let result = service.decide(
            &tender_id(),
            1,
            &approvers()[1],
            ApprovalDecision::Approve,
            None,
            now(),
        );
        assert!(matches!(result, Err(ApprovalServiceError::Approval(_))));
    }

    #[test]
    fn status_reports_overdue_only_for_the_pending_level() {
        let (service, _) = build_service();
        service
            .initiate(&tender_id(), approvers(), deadlines())
            .expect("initiation");

        let view = service
            .status(&tender_id(), now() + Duration::days(1) + Duration::hours(1))
            .expect("status reads");

        assert!(view.levels[0].overdue);
        assert!(!view.levels[1].overdue);
        assert!(!view.levels[2].overdue);
    }
}

mod routing {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::common::*;

    fn initiate_request() -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/tenders/tender-riverside-depot/approval")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({
                    "approvers": ["eng-manager", "procurement-head", "managing-director"],
                    "deadlines": deadlines(),
                })
                .to_string(),
            ))
            .expect("request")
    }

    fn decision_request(level: usize, actor: &str, decision: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!(
                "/api/v1/tenders/tender-riverside-depot/approval/levels/{level}/decision"
            ))
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "actor": actor, "decision": decision }).to_string(),
            ))
            .expect("request")
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&body).expect("json")
    }

    #[tokio::test]
    async fn rejection_short_circuits_the_chain() {
        let (router, notifier) = build_router();

        let created = router
            .clone()
            .oneshot(initiate_request())
            .await
            .expect("router dispatch");
        assert_eq!(created.status(), StatusCode::CREATED);

        let approve = router
            .clone()
            .oneshot(decision_request(0, "eng-manager", "approve"))
            .await
            .expect("router dispatch");
        assert_eq!(approve.status(), StatusCode::OK);

        let reject = router
            .clone()
            .oneshot(decision_request(1, "procurement-head", "reject"))
            .await
            .expect("router dispatch");
        assert_eq!(reject.status(), StatusCode::OK);
        let payload = read_json(reject).await;
        assert_eq!(
            payload.get("status").and_then(Value::as_str),
            Some("rejected")
        );

        let follow_up = router
            .oneshot(decision_request(2, "managing-director", "approve"))
            .await
            .expect("router dispatch");
        assert_eq!(follow_up.status(), StatusCode::CONFLICT);

        assert_eq!(notifier.events().len(), 1);
        assert_eq!(notifier.events()[0].template, "award_rejected");
    }

    #[tokio::test]
    async fn decisions_record_actor_and_comment() {
        let (router, _) = build_router();

        router
            .clone()
            .oneshot(initiate_request())
            .await
            .expect("router dispatch");

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/tenders/tender-riverside-depot/approval/levels/0/decision")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({
                            "actor": "eng-manager",
                            "decision": "approve",
                            "comment": "scope verified",
                        })
                        .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        let levels = payload
            .get("levels")
            .and_then(Value::as_array)
            .expect("levels");
        let record = levels[0].get("decision").expect("decision record");
        assert_eq!(
            record.get("decision").and_then(Value::as_str),
            Some("approve")
        );
        assert_eq!(
            record.get("comment").and_then(Value::as_str),
            Some("scope verified")
        );
    }
}
