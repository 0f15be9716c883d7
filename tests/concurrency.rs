#![allow(clippy::unwrap_used)]

use packet_buffer::utils::buffer_pool::BufferPool;
use packet_buffer::utils::cache::{pull_or_create, MemoryCache, Part, PartCache};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_pooled_assembly() {
    use tokio::task::JoinSet;

    let pool = BufferPool::new(8);
    let iterations = 5_000u32;

    let mut tasks = JoinSet::new();
    for worker in 0..8u32 {
        let pool = pool.clone();
        tasks.spawn(async move {
            for i in 0..iterations {
                let mut packet = pool.acquire();
                assert!(packet.is_empty());
                packet.write_u32_be(worker, 0).unwrap();
                packet.write_u64_le(u64::from(i), 4).unwrap();
                assert_eq!(packet.read_u32_be(0).unwrap(), worker);
                assert_eq!(packet.read_u64_le(4).unwrap(), u64::from(i));
            }
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    assert!(pool.available() >= 8);
}

#[derive(Debug, Clone)]
struct Session {
    ssrc: u32,
}

impl Part for Session {
    type Raw = u32;

    fn create(raw: &u32) -> packet_buffer::Result<Self> {
        Ok(Session { ssrc: *raw })
    }

    fn fill(&mut self, raw: &u32) {
        self.ssrc = *raw;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_pulls_hit_once() {
    let cache: Arc<MemoryCache<u64, Session>> =
        Arc::new(MemoryCache::with_settings(Duration::from_secs(60), 100));
    cache.set(1, Session { ssrc: 0 }).await;

    let mut handles = Vec::new();
    for raw in 0..16u32 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            let fetched = pull_or_create::<u64, Session, _>(cache.as_ref(), &1, &raw)
                .await
                .unwrap();
            let cached = fetched.was_cached();
            // Cached or created, the part reflects this caller's raw data
            assert_eq!(fetched.into_inner().ssrc, raw);
            cached
        }));
    }

    let mut hits = 0;
    for handle in handles {
        if handle.await.unwrap() {
            hits += 1;
        }
    }

    // Pull removes the entry, so exactly one caller sees it
    assert_eq!(hits, 1);
    assert!(cache.is_empty().await);
}
