// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Demonstrates two callers sharing one slow fetch through a `Coordinator`.
//!
//! The service sleeps, then returns a random number modulo its argument. Both requests are
//! issued before the first one completes, so the service runs once and both callers observe
//! the same value with different request ids. A third request is served from the cache.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use fetchlon::{CacheRegistry, Coordinator, FetchService, Response, decorators::AesGcmCipher};
use ohno::AppError;
use tick::Clock;

struct IntFetcher {
    executions: AtomicUsize,
}

impl FetchService<u32, u32> for IntFetcher {
    async fn request(&self, arguments: &u32) -> Result<Option<u32>, AppError> {
        let count = self.executions.fetch_add(1, Ordering::SeqCst) + 1;
        println!("  [service] fetching {arguments} (execution #{count})");
        tokio::time::sleep(Duration::from_millis(2000)).await;

        let mut bytes = [0_u8; 4];
        getrandom::getrandom(&mut bytes).map_err(AppError::new)?;
        Ok(Some(u32::from_le_bytes(bytes) % (*arguments).max(1)))
    }

    fn name(&self) -> &str {
        "int_fetcher"
    }
}

fn describe(response: &Response<u32, u32>) -> String {
    match response {
        Response::Loading { .. } => "loading".to_string(),
        Response::Data { value, .. } => format!("data {value}"),
        Response::NoNewData { .. } => "no new data".to_string(),
        Response::Error(error) => format!("error: {}", error.message()),
        Response::Cancelled { .. } => "cancelled".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let root = std::env::temp_dir().join("fetchlon-int-fetcher");
    let registry = CacheRegistry::builder(Clock::new_tokio())
        .disk_root(&root)
        .cipher(AesGcmCipher::new(&[42; 32])?)
        .build()?;

    let service = Arc::new(IntFetcher {
        executions: AtomicUsize::new(0),
    });
    let coordinator = Coordinator::builder(Arc::clone(&service))
        .cache(registry.get::<u32>("CACHE_10_SEC"))
        .build();
    registry.clean("CACHE_10_SEC").await?;

    coordinator.observe(|response| {
        println!(
            "  [observer] request #{} from {:?}: {}",
            response.request_id(),
            response.origin(),
            describe(response)
        );
    });

    println!("Issuing two requests for 100, 50ms apart...\n");

    let first = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.request(100).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.request(100).await }
    });

    let first = first.await?;
    let second = second.await?;
    println!("\nfirst:  #{} {}", first.request_id(), describe(&first));
    println!("second: #{} {}", second.request_id(), describe(&second));

    let third = coordinator.request(100).await;
    println!("third:  #{} {} (from {:?})", third.request_id(), describe(&third), third.origin());

    println!("\nService executions: {}", service.executions.load(Ordering::SeqCst));
    Ok(())
}
