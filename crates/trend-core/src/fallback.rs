use std::future::Future;

use crate::error::Error;

/// Awaits `fut`, logging and replacing any error with `fallback`.
///
/// Every scraper variant and the draft summarizer route their remote calls
/// through here so that a failing source or model call degrades the run
/// instead of aborting it.
pub async fn attempt_or<T, F>(label: &str, fallback: T, fut: F) -> T
where
    F: Future<Output = anyhow::Result<T>>,
{
    match fut.await {
        Ok(value) => value,
        Err(e) => {
            if let Some(Error::RateLimited { service }) = e.downcast_ref::<Error>() {
                tracing::warn!(label, service, "Rate limit exceeded, skipping");
            } else {
                tracing::error!(label, error = %format!("{:#}", e), "Call failed, using fallback");
            }
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[tokio::test]
    async fn passes_through_success() {
        let v = attempt_or("ok", 0, async { Ok::<_, anyhow::Error>(7) }).await;
        assert_eq!(v, 7);
    }

    #[tokio::test]
    async fn swallows_errors() {
        let v: Vec<u8> = attempt_or("boom", Vec::new(), async { Err::<Vec<u8>, _>(anyhow!("down")) }).await;
        assert!(v.is_empty());
    }

    #[tokio::test]
    async fn swallows_rate_limits() {
        let v = attempt_or("limited", 1, async {
            Err::<i32, anyhow::Error>(Error::RateLimited { service: "firecrawl" }.into())
        })
        .await;
        assert_eq!(v, 1);
    }
}
