use std::time::Duration;

/// Polls the condition until it holds, or panics after a bounded wait.
/// Used to observe the side effects of tasks spawned by the actor.
pub(crate) async fn eventually(description: &str, mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition was not met within the wait budget: {description}");
}

/// Gives spawned tasks a chance to run before asserting that something did
/// not happen.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
