use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pitwall::analysis::{compute_delta, detect_corners, sample_fastest_lap, segment_stints};
use pitwall::session::{Lap, Session, SessionKey, SessionType, TelemetrySample};
use std::time::Duration;

const SAMPLES_PER_LAP: usize = 700;

fn create_lap_telemetry(speed_scale: f64) -> Vec<TelemetrySample> {
    let mut time = 0.;
    (0..SAMPLES_PER_LAP)
        .map(|i| {
            // a corner every 70 samples
            let phase = (i % 70) as f64 / 70. * std::f64::consts::TAU;
            let speed = (200. + 110. * phase.cos()) * speed_scale;
            let distance = i as f64 * 7.5;
            time += 7.5 / (speed / 3.6);
            TelemetrySample {
                time,
                distance,
                speed,
                throttle: if phase.cos() > 0. { 100. } else { 0. },
                brake: if phase.cos() < -0.5 { 100. } else { 0. },
                rpm: 8_000. + speed * 15.,
                gear: (speed / 45.).clamp(1., 8.) as u8,
                x: distance.cos() * 1_000.,
                y: distance.sin() * 1_000.,
            }
        })
        .collect()
}

fn create_session() -> Session {
    let mut session = Session::new(SessionKey::new(2024, 12, SessionType::Race));
    for (driver, scale) in [("VER", 1.0), ("NOR", 0.99)] {
        for lap_number in 1..=60u32 {
            session.laps.push(Lap {
                driver: driver.to_string(),
                lap_number,
                lap_time: Some(Duration::from_millis(90_000 + lap_number as u64 * 17)),
                compound: Some(if lap_number < 25 { "MEDIUM" } else { "HARD" }.to_string()),
                stint: Some(if lap_number < 25 { 1 } else { 2 }),
                telemetry: (lap_number == 1).then(|| create_lap_telemetry(scale)),
                ..Lap::default()
            });
        }
    }
    session
}

fn bench_lap_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("lap_analysis");
    let session = create_session();
    let telemetry = create_lap_telemetry(1.0);

    group.bench_function("detect_corners", |b| {
        b.iter(|| black_box(detect_corners(black_box(&telemetry))));
    });

    group.bench_function("sample_fastest_lap", |b| {
        b.iter(|| black_box(sample_fastest_lap(black_box(&session), "VER", 4)));
    });

    group.bench_function("compute_delta", |b| {
        b.iter(|| black_box(compute_delta(black_box(&session), "VER", "NOR", 4)));
    });

    group.bench_function("segment_stints", |b| {
        b.iter(|| black_box(segment_stints(black_box(&session), "VER")));
    });

    group.finish();
}

criterion_group!(benches, bench_lap_analysis);
criterion_main!(benches);
