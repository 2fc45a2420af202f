//! Session lifecycle: end-of-session flushing, cost absorption, and the
//! process-wide teardown sweep.

mod common;

use common::{mount_collection_api, test_client, test_config};
use traceline_client::{ActionEvent, Client, ClientError, EndState, SessionState};
use traceline_core::Error;
use wiremock::MockServer;

#[tokio::test]
async fn test_end_session_flushes_pending_events() {
    let mock_server = MockServer::start().await;
    mount_collection_api(&mock_server).await;

    // Interval long enough that nothing flushes until the session ends
    let config = test_config(&mock_server).with_batch_interval_ms(60_000);
    let client = Client::new(config).unwrap();
    let session = client.start_session().await.unwrap();

    for _ in 0..3 {
        session.record(ActionEvent::new()).unwrap();
    }

    client
        .end_session(&session, EndState::Success, None)
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let flushed: usize = requests
        .iter()
        .filter(|r| r.url.path() == "/v2/create_events")
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["events"].as_array().map(Vec::len).unwrap_or(0)
        })
        .sum();
    assert_eq!(flushed, 3);

    // The final snapshot went out after the flush
    assert!(requests
        .iter()
        .any(|r| r.url.path() == "/v2/update_session"));
}

#[tokio::test]
async fn test_token_cost_absorbed_from_update_session() {
    let mock_server = MockServer::start().await;
    mount_collection_api(&mock_server).await;

    let client = test_client(&mock_server);
    let session = client.start_session().await.unwrap();

    assert_eq!(session.token_cost(), None);

    let cost = client
        .end_session(&session, EndState::Success, None)
        .await
        .unwrap();
    assert_eq!(cost, Some(5.0));
    assert_eq!(session.token_cost(), Some(5.0));
}

#[tokio::test]
async fn test_end_all_sessions_clears_registry() {
    let mock_server = MockServer::start().await;
    mount_collection_api(&mock_server).await;

    let client = test_client(&mock_server);
    let first = client.start_session().await.unwrap();
    let second = client.start_session().await.unwrap();
    assert_eq!(client.session_count(), 2);

    client.end_all_sessions().await;

    assert_eq!(client.session_count(), 0);
    assert_eq!(first.state(), SessionState::Ended);
    assert_eq!(second.state(), SessionState::Ended);

    // The sweep is idempotent
    client.end_all_sessions().await;
    assert_eq!(client.session_count(), 0);

    // No state leaks into a fresh session
    let fresh = client.start_session().await.unwrap();
    assert_eq!(fresh.state(), SessionState::Running);
    assert_eq!(fresh.event_counts().total(), 0);
    fresh.record(ActionEvent::new()).unwrap();
    client.end_all_sessions().await;
}

#[tokio::test]
async fn test_record_after_end_is_rejected() {
    let mock_server = MockServer::start().await;
    mount_collection_api(&mock_server).await;

    let client = test_client(&mock_server);
    let session = client.start_session().await.unwrap();
    client
        .end_session(&session, EndState::Success, None)
        .await
        .unwrap();

    let result = session.record(ActionEvent::new());
    assert!(matches!(
        result,
        Err(ClientError::Core(Error::SessionEnded(_)))
    ));
}

#[tokio::test]
async fn test_ending_twice_is_rejected() {
    let mock_server = MockServer::start().await;
    mount_collection_api(&mock_server).await;

    let client = test_client(&mock_server);
    let session = client.start_session().await.unwrap();

    session.end(EndState::Fail, Some("boom".to_string())).await.unwrap();

    let result = session.end(EndState::Success, None).await;
    assert!(matches!(
        result,
        Err(ClientError::Core(Error::SessionEnded(_)))
    ));
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let mock_server = MockServer::start().await;
    mount_collection_api(&mock_server).await;

    let client = test_client(&mock_server);
    let first = client.start_session().await.unwrap();
    let second = client.start_session().await.unwrap();

    first.record(ActionEvent::new()).unwrap();
    first.record(ActionEvent::new()).unwrap();
    second.record(ActionEvent::new()).unwrap();

    assert_eq!(first.event_counts().actions, 2);
    assert_eq!(second.event_counts().actions, 1);
    assert_ne!(first.id(), second.id());

    client.end_all_sessions().await;
}
