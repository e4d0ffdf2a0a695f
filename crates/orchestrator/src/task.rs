//! Detached task launch with a panic boundary.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::error;

/// Spawn `fut` on the current runtime, logging a panic instead of
/// propagating it.
///
/// The handle resolves to `true` when the future ran to completion.
pub fn spawn_supervised<F>(name: &'static str, fut: F) -> JoinHandle<bool>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(()) => true,
            Err(panic) => {
                error!(task = name, "Task panicked: {}", panic_message(panic.as_ref()));
                false
            }
        }
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completed_task() {
        assert!(spawn_supervised("ok", async {}).await.unwrap());
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let handle = spawn_supervised("boom", async {
            panic!("batch exploded");
        });
        assert!(!handle.await.unwrap());

        // Other tasks keep running.
        assert!(spawn_supervised("after", async {}).await.unwrap());
    }

    #[test]
    fn test_panic_message_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let fixed: Box<dyn Any + Send> = Box::new("fixed");
        assert_eq!(panic_message(fixed.as_ref()), "fixed");
        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
    }
}
