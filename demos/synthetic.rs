//! Synthetic heating feed.
//!
//! Generates a boiler temperature every 500ms, occasionally reporting a missed
//! sample or a garbled frame, and keeps a sampled history until Ctrl+C.
//!
//! ```text
//! RUST_LOG=debug cargo run --example synthetic
//! ```

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use feedvisor::{
    Config, FetchError, HistoryConfig, HistoryRecorder, Reading, SetupError, SourceFn, Supervisor,
};

#[derive(Debug, Clone, Copy)]
struct HeatingSample {
    boiler_c: f32,
    outdoor_c: f32,
}

async fn next_sample(ctx: CancellationToken) -> Result<Reading<HeatingSample>, FetchError> {
    tokio::select! {
        _ = ctx.cancelled() => return Err(FetchError::Canceled),
        _ = tokio::time::sleep(Duration::from_millis(500)) => {}
    }

    let mut rng = rand::rng();
    match rng.random_range(0..20u8) {
        0 => Err(FetchError::no_data("serial read timed out")),
        1 => Err(FetchError::malformed_bytes(b"B=6\xff.2;O=", "truncated frame")),
        _ => {
            let secs = chrono::Local::now().timestamp() as f32;
            Ok(Reading::now(HeatingSample {
                boiler_c: 62.0 + 6.0 * (secs / 60.0).sin() + rng.random_range(-0.3..0.3),
                outdoor_c: 4.5 + rng.random_range(-0.2..0.2),
            }))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let source = Arc::new(
        SourceFn::new("heating", next_sample)
            .with_setup(|| async {
                log::info!("opening synthetic port");
                Ok::<_, SetupError>(())
            })
            .with_cleanup(|| async { log::info!("closing synthetic port") }),
    );

    let sup = Supervisor::builder(source)
        .with_config(Config::default().with_grace(Duration::from_secs(2)))
        .build();

    let history = HistoryRecorder::attach(
        sup.store(),
        HistoryConfig {
            min_interval: Duration::from_secs(5),
            capacity: 120,
        },
    );

    let store = Arc::downgrade(sup.store());
    sup.store().subscribe(move || {
        if let Some(r) = store.upgrade().and_then(|s| s.current()) {
            let s = r.payload();
            log::info!(
                "{} boiler {:.1}°C, outdoor {:.1}°C",
                r.at().format("%H:%M:%S"),
                s.boiler_c,
                s.outdoor_c
            );
        }
    });

    let res = sup.run_until_shutdown().await;

    let kept = history.detach();
    log::info!("history: {} samples kept", kept.len());
    res.map_err(Into::into)
}
