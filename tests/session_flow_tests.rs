//! Connect/submit/result flows driven against a scripted gateway.

mod fixtures;

use std::sync::Arc;

use serde_json::json;

use crm_relay::{
    ConnectionState, FormField, Outcome, ProviderId, RawFormFields, Session, SessionError,
    SubmissionState, CREATE_CONTACT_FLOW,
};

use fixtures::mock_gateway::{AuthorizeScript, MockGateway, RunScript};

fn jane() -> RawFormFields {
    RawFormFields {
        name: "Jane Doe".into(),
        email: "jane@acme.com".into(),
        phone: None,
        company: "Acme".into(),
        pronouns: None,
    }
}

fn session_with(gateway: MockGateway) -> (Session, Arc<MockGateway>) {
    let gateway = Arc::new(gateway);
    (Session::new(gateway.clone()), gateway)
}

mod connection {
    use super::*;

    #[tokio::test]
    async fn new_session_starts_disconnected_and_idle() {
        let (session, _) = session_with(MockGateway::new());
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
        assert_eq!(session.submission_state(), SubmissionState::Idle);
        assert!(session.form().is_empty());
        assert!(session.outcome().is_none());
    }

    #[tokio::test]
    async fn authorized_connection_becomes_connected() {
        let (session, gateway) = session_with(MockGateway::new().authorize(AuthorizeScript::Authorize));

        let provider = session.connect(ProviderId::HubSpot).await.unwrap();

        assert_eq!(provider, ProviderId::HubSpot);
        assert_eq!(session.connection_state(), ConnectionState::Connected(ProviderId::HubSpot));
        assert_eq!(gateway.authorize_count(), 1);
    }

    #[tokio::test]
    async fn dismissed_connection_clears_selection_and_blocks_submit() {
        let (session, gateway) = session_with(MockGateway::new().authorize(AuthorizeScript::Dismiss));

        let err = session.connect(ProviderId::Pipedrive).await.unwrap_err();
        assert_eq!(err, SessionError::ConnectionCancelled(ProviderId::Pipedrive));
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);

        let err = session.submit(jane()).await.unwrap_err();
        assert_eq!(err, SessionError::NotConnected);
        assert_eq!(gateway.run_count(), 0);
    }

    #[tokio::test]
    async fn failed_connection_reverts_to_disconnected() {
        let (session, _) = session_with(
            MockGateway::new().authorize(AuthorizeScript::Fail("popup blocked".into())),
        );

        let err = session.connect(ProviderId::HubSpot).await.unwrap_err();
        assert_eq!(
            err,
            SessionError::ConnectionFailed {
                provider: ProviderId::HubSpot,
                message: "popup blocked".into(),
            }
        );
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn failed_attempt_is_not_retried() {
        let (session, gateway) = session_with(MockGateway::new().authorize(AuthorizeScript::Dismiss));
        let _ = session.connect(ProviderId::HubSpot).await;
        assert_eq!(gateway.authorize_count(), 1);

        session.connect(ProviderId::HubSpot).await.unwrap();
        assert_eq!(gateway.authorize_count(), 2);
        assert_eq!(session.connection_state(), ConnectionState::Connected(ProviderId::HubSpot));
    }

    #[tokio::test]
    async fn switching_provider_replaces_connection() {
        let (session, _) = session_with(
            MockGateway::new()
                .authorize(AuthorizeScript::Authorize)
                .authorize(AuthorizeScript::Dismiss),
        );

        session.connect(ProviderId::HubSpot).await.unwrap();
        let _ = session.connect(ProviderId::Pipedrive).await;

        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn concurrent_connect_is_rejected() {
        let (gateway, gate) = MockGateway::new().gated();
        let (session, gateway) = session_with(gateway);

        let (first, second, _) = futures::join!(
            session.connect(ProviderId::HubSpot),
            async {
                tokio::task::yield_now().await;
                session.connect(ProviderId::Pipedrive).await
            },
            async {
                tokio::task::yield_now().await;
                tokio::task::yield_now().await;
                gate.notify_one();
            }
        );

        assert_eq!(first, Ok(ProviderId::HubSpot));
        assert_eq!(second, Err(SessionError::ConnectionInProgress(ProviderId::HubSpot)));
        assert_eq!(gateway.authorize_count(), 1);
        assert_eq!(session.connection_state(), ConnectionState::Connected(ProviderId::HubSpot));
    }

    #[tokio::test]
    async fn disconnect_forgets_provider() {
        let (session, _) = session_with(MockGateway::new());
        session.connect(ProviderId::HubSpot).await.unwrap();

        assert_eq!(session.disconnect(), ConnectionState::Disconnected);
        assert_eq!(session.submit(jane()).await, Err(SessionError::NotConnected));
    }
}

mod submission {
    use super::*;

    #[tokio::test]
    async fn successful_run_records_result_and_clears_form() {
        let (session, gateway) =
            session_with(MockGateway::new().run(RunScript::Return(json!({ "runId": "run_123" }))));
        session.connect(ProviderId::HubSpot).await.unwrap();

        let result = session.submit(jane()).await.unwrap();

        assert_eq!(gateway.run_count(), 1);
        let call = &gateway.run_calls()[0];
        assert_eq!(call.provider, ProviderId::HubSpot);
        assert_eq!(call.flow_name, CREATE_CONTACT_FLOW);
        assert_eq!(call.input.name, "Jane Doe");
        assert_eq!(call.input.email, "jane@acme.com");
        assert_eq!(call.input.company, "Acme");
        assert_eq!(call.input.phone, None);

        assert_eq!(result.get("runId"), Some(&json!("run_123")));
        assert_eq!(session.submission_state(), SubmissionState::Succeeded(result));
        assert!(session.form().is_empty());
    }

    #[tokio::test]
    async fn remote_failure_keeps_form_for_retry() {
        let (session, gateway) = session_with(
            MockGateway::new()
                .run(RunScript::Fail("CRM rate limit".into()))
                .run(RunScript::Return(json!({ "runId": "run_456" }))),
        );
        session.connect(ProviderId::HubSpot).await.unwrap();

        let err = session.submit(jane()).await.unwrap_err();
        assert_eq!(err, SessionError::RemoteFlowError("CRM rate limit".into()));
        assert_eq!(session.submission_state(), SubmissionState::Failed("CRM rate limit".into()));
        assert_eq!(session.form(), jane());

        session.submit(session.form()).await.unwrap();
        assert_eq!(gateway.run_count(), 2);
        assert!(matches!(session.submission_state(), SubmissionState::Succeeded(_)));
    }

    #[tokio::test]
    async fn disconnected_submit_makes_no_gateway_call() {
        let (session, gateway) = session_with(MockGateway::new());

        let err = session.submit(jane()).await.unwrap_err();

        assert_eq!(err, SessionError::NotConnected);
        assert_eq!(gateway.run_count(), 0);
        assert_eq!(session.submission_state(), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn not_connected_is_checked_before_validation() {
        let (session, _) = session_with(MockGateway::new());
        let raw = RawFormFields {
            email: "nope".into(),
            ..jane()
        };
        assert_eq!(session.submit(raw).await, Err(SessionError::NotConnected));
    }

    #[tokio::test]
    async fn invalid_form_makes_no_gateway_call() {
        let (session, gateway) = session_with(MockGateway::new());
        session.connect(ProviderId::Pipedrive).await.unwrap();
        let raw = RawFormFields {
            name: "Jo".into(),
            ..jane()
        };

        let err = session.submit(raw.clone()).await.unwrap_err();

        match err {
            SessionError::ValidationFailed(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors.message(FormField::Name), Some("Name is required"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
        assert_eq!(gateway.run_count(), 0);
        assert_eq!(session.form(), raw);
        assert_eq!(session.submission_state(), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn rejected_submit_leaves_previous_outcome() {
        let (session, _) =
            session_with(MockGateway::new().run(RunScript::Return(json!({ "id": "r2" }))));
        session.connect(ProviderId::HubSpot).await.unwrap();
        session.submit(jane()).await.unwrap();

        let raw = RawFormFields {
            company: String::new(),
            ..jane()
        };
        assert!(session.submit(raw).await.is_err());
        assert!(matches!(session.submission_state(), SubmissionState::Succeeded(_)));
    }

    #[tokio::test]
    async fn next_submission_supersedes_previous_result() {
        let (session, _) = session_with(
            MockGateway::new()
                .run(RunScript::Return(json!({ "runId": "first" })))
                .run(RunScript::Fail("CRM API error".into())),
        );
        session.connect(ProviderId::HubSpot).await.unwrap();

        session.submit(jane()).await.unwrap();
        let _ = session.submit(jane()).await;

        assert_eq!(session.submission_state(), SubmissionState::Failed("CRM API error".into()));
    }

    #[tokio::test]
    async fn double_submit_is_rejected_while_in_flight() {
        let (gateway, gate) = MockGateway::new().gated();
        let (session, gateway) = session_with(gateway);
        gate.notify_one();
        session.connect(ProviderId::HubSpot).await.unwrap();

        let (first, second, _) = futures::join!(
            session.submit(jane()),
            async {
                tokio::task::yield_now().await;
                assert_eq!(session.submission_state(), SubmissionState::InFlight);
                session.submit(jane()).await
            },
            async {
                tokio::task::yield_now().await;
                tokio::task::yield_now().await;
                gate.notify_one();
            }
        );

        assert!(first.is_ok());
        assert_eq!(second, Err(SessionError::SubmissionInProgress));
        assert_eq!(gateway.run_count(), 1);
    }

    #[tokio::test]
    async fn draft_can_be_edited_before_submitting() {
        let (session, gateway) = session_with(MockGateway::new());
        let draft = RawFormFields {
            phone: Some("+1 555 0100".into()),
            ..jane()
        };

        session.update_form(draft.clone());
        assert_eq!(session.form(), draft);

        session.connect(ProviderId::HubSpot).await.unwrap();
        session.submit(session.form()).await.unwrap();
        assert_eq!(gateway.run_calls()[0].input.phone.as_deref(), Some("+1 555 0100"));
        assert!(session.form().is_empty());
    }

    #[tokio::test]
    async fn reset_returns_to_idle_and_keeps_connection() {
        let (session, _) = session_with(MockGateway::new());
        session.connect(ProviderId::HubSpot).await.unwrap();
        session.submit(jane()).await.unwrap();

        session.reset_submission();

        assert_eq!(session.submission_state(), SubmissionState::Idle);
        assert_eq!(session.connection_state(), ConnectionState::Connected(ProviderId::HubSpot));
    }
}

mod outcome {
    use super::*;

    #[tokio::test]
    async fn success_renders_run_id_and_link() {
        let (session, _) = session_with(MockGateway::new().run(RunScript::Return(json!({
            "runId": "r1",
            "output": { "contactUrl": "https://x/c/1" }
        }))));
        session.connect(ProviderId::HubSpot).await.unwrap();
        session.submit(jane()).await.unwrap();

        match session.outcome() {
            Some(Outcome::Created(facts)) => {
                assert_eq!(facts.run_id, "r1");
                assert_eq!(facts.follow_up_url.as_deref(), Some("https://x/c/1"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn result_without_identifier_still_counts_as_success() {
        let (session, _) =
            session_with(MockGateway::new().run(RunScript::Return(json!({ "status": "completed" }))));
        session.connect(ProviderId::Pipedrive).await.unwrap();
        session.submit(jane()).await.unwrap();

        assert!(matches!(session.outcome(), Some(Outcome::CreatedWithoutId { .. })));
    }

    #[tokio::test]
    async fn failure_renders_reason() {
        let (session, _) =
            session_with(MockGateway::new().run(RunScript::Fail("CRM rate limit".into())));
        session.connect(ProviderId::HubSpot).await.unwrap();
        let _ = session.submit(jane()).await;

        let outcome = session.outcome().unwrap();
        assert_eq!(outcome.render(), "✗ Could not create contact: CRM rate limit");
    }
}
