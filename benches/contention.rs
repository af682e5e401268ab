use std::sync::Arc;
use std::time::{Duration, Instant};

use roomlock::clock::{Clock, SystemClock};
use roomlock::engine::{Engine, EngineError};
use roomlock::model::{HOUR_MS, MINUTE_MS, Ms, Span};
use roomlock::store::LocalStore;
use ulid::Ulid;

const SPACES: usize = 10;
const REQUESTERS: usize = 200;
const ATTEMPTS_PER_REQUESTER: usize = 50;

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        println!("  {label}: n=0");
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.3}ms, p50={:.3}ms, p95={:.3}ms, p99={:.3}ms, max={:.3}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies[latencies.len() - 1].as_secs_f64() * 1000.0,
    );
}

/// Cheap xorshift so every requester picks a different slot sequence.
fn next(seed: &mut u64) -> u64 {
    *seed ^= *seed << 13;
    *seed ^= *seed >> 7;
    *seed ^= *seed << 17;
    *seed
}

struct Outcome {
    admitted: Vec<Duration>,
    rejected: Vec<Duration>,
}

async fn run(label: &str, store: LocalStore) {
    let engine = Arc::new(Engine::new(Arc::new(store), Arc::new(SystemClock)));
    let mut spaces = Vec::with_capacity(SPACES);
    for i in 0..SPACES {
        spaces.push(engine.create_space(&format!("room {i}"), "").await.unwrap().id);
    }
    let spaces = Arc::new(spaces);

    // Tomorrow, on a half-hour grid, so everything is in the future.
    let base: Ms = SystemClock.now() + 24 * HOUR_MS;
    let base = base - base % (30 * MINUTE_MS);

    let started = Instant::now();
    let handles: Vec<_> = (0..REQUESTERS)
        .map(|r| {
            let engine = engine.clone();
            let spaces = spaces.clone();
            tokio::spawn(async move {
                let requester = format!("req-{r}");
                let mut seed = (r as u64 + 1) * 0x9E37_79B9_7F4A_7C15;
                let mut outcome = Outcome {
                    admitted: Vec::new(),
                    rejected: Vec::new(),
                };
                for _ in 0..ATTEMPTS_PER_REQUESTER {
                    let space = spaces[(next(&mut seed) % SPACES as u64) as usize];
                    let slot = (next(&mut seed) % 48) as Ms;
                    let len = (1 + next(&mut seed) % 4) as Ms * 30 * MINUTE_MS;
                    let start = base + slot * 30 * MINUTE_MS;

                    let t = Instant::now();
                    match engine
                        .create_reservation(space, &requester, Span::new(start, start + len), None)
                        .await
                    {
                        Ok(_) => outcome.admitted.push(t.elapsed()),
                        Err(EngineError::SpaceConflict(_) | EngineError::RequesterConflict(_)) => {
                            outcome.rejected.push(t.elapsed())
                        }
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
                outcome
            })
        })
        .collect();

    let mut admitted = Vec::new();
    let mut rejected = Vec::new();
    for h in handles {
        let outcome = h.await.unwrap();
        admitted.extend(outcome.admitted);
        rejected.extend(outcome.rejected);
    }
    let elapsed = started.elapsed();
    let total = admitted.len() + rejected.len();

    println!("{label}");
    println!(
        "  {total} attempts in {:.2}s ({:.0}/s), {} admitted",
        elapsed.as_secs_f64(),
        total as f64 / elapsed.as_secs_f64(),
        admitted.len()
    );
    print_latency("admitted", &mut admitted);
    print_latency("rejected", &mut rejected);
}

#[tokio::main]
async fn main() {
    run("in-memory", LocalStore::in_memory()).await;

    let dir = std::env::temp_dir().join(format!("roomlock_bench_{}", Ulid::new()));
    std::fs::create_dir_all(&dir).unwrap();
    run("wal (group commit)", LocalStore::open(&dir.join("reservations.wal")).unwrap()).await;
    let _ = std::fs::remove_dir_all(&dir);
}
