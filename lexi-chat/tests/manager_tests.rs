//! Session isolation through the session manager.

use std::sync::Arc;

use lexi_chat::{ChatConfig, ChatError, SessionManager};
use lexi_core::MockModel;
use lexi_rag::{HashingEmbedder, UploadedDocument};

fn manager(model: MockModel) -> SessionManager {
    SessionManager::new(ChatConfig::default(), Arc::new(HashingEmbedder::default()), Arc::new(model))
        .unwrap()
}

#[tokio::test]
async fn sessions_do_not_share_documents_or_history() {
    let manager = manager(MockModel::new());
    let alice = manager.create_session().await.unwrap();
    let bob = manager.create_session().await.unwrap();
    assert_ne!(alice, bob);
    assert_eq!(manager.session_count().await, 2);

    {
        let session = manager.get(&alice).await.unwrap();
        let mut session = session.lock().await;
        session.upload(&[UploadedDocument::new("lease.txt", b"Rent is due monthly".to_vec())]).await.unwrap();
        session.submit("When is rent due?").await.unwrap().finish(&mut |_: &str| {}).await.unwrap();
    }

    let session = manager.get(&bob).await.unwrap();
    let session = session.lock().await;
    assert!(session.document_set().is_none());
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn sessions_run_turns_concurrently() {
    let manager = manager(MockModel::new());
    let ids = [manager.create_session().await.unwrap(), manager.create_session().await.unwrap()];

    let turns = ids.iter().map(|id| {
        let manager = manager.clone();
        let id = id.clone();
        tokio::spawn(async move {
            let session = manager.get(&id).await?;
            let mut session = session.lock().await;
            let outcome = session.submit("Anything?").await?.finish(&mut |_: &str| {}).await?;
            Ok::<_, ChatError>(outcome.text)
        })
    });

    for result in futures::future::join_all(turns).await {
        assert_eq!(result.unwrap().unwrap(), "I could not find an answer.");
    }
}

#[tokio::test]
async fn removed_session_is_gone() {
    let manager = manager(MockModel::new());
    let id = manager.create_session().await.unwrap();
    let held = manager.get(&id).await.unwrap();

    manager.remove(&id).await.unwrap();

    assert!(!manager.has_session(&id).await);
    assert_eq!(manager.get(&id).await.unwrap_err(), ChatError::SessionNotFound(id.clone()));
    assert!(matches!(manager.remove(&id).await, Err(ChatError::SessionNotFound(_))));
    assert!(held.lock().await.history().is_empty());
}

#[test]
fn invalid_config_is_rejected() {
    let config = ChatConfig { temperature: -1.0, ..ChatConfig::default() };
    let result =
        SessionManager::new(config, Arc::new(HashingEmbedder::default()), Arc::new(MockModel::new()));
    assert!(matches!(result, Err(ChatError::Config(_))));
}
