use criterion::{black_box, criterion_group, criterion_main, Criterion};

use corotick::{wait_seconds, CoroutineManager, Resume, Runnable, StepResult};

/// Re-arms a 1ms timer on every resume, so every update pass resumes it.
struct Spin;

impl Runnable for Spin {
    fn step(&mut self, _mgr: &mut CoroutineManager, _resume: Resume) -> StepResult {
        StepResult::Suspend(wait_seconds(0.001))
    }
}

fn bench_update(c: &mut Criterion) {
    c.bench_function("update_1000_spinning_timers", |b| {
        let mut mgr = CoroutineManager::new(0);
        for _ in 0..1000 {
            mgr.create(Box::new(Spin)).unwrap();
        }
        let mut tick = 0u64;
        b.iter(|| {
            tick += 1;
            mgr.update(black_box(tick));
        });
    });

    c.bench_function("create_destroy_cycle", |b| {
        let mut mgr = CoroutineManager::new(0);
        b.iter(|| {
            let id = mgr.create(Box::new(Spin)).unwrap();
            mgr.destroy(black_box(id));
        });
    });
}

criterion_group!(benches, bench_update);
criterion_main!(benches);
