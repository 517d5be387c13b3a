//! Sea Typer entry point
//!
//! Native demo: the autopilot plays one stage headless and prints the summary.
//!
//! Usage: `sea-typer [stage] [seed] [words-dir]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use sea_typer::progress::ProgressBook;
    use sea_typer::sim::{AutoAction, Autopilot, GameEvent, WeatherEvent};
    use sea_typer::{BuiltinWords, JsonWordSource, Session, Settings, WordSource};

    /// Host frame length (ms)
    const FRAME_MS: u64 = 16;
    /// Hard stop for the demo loop
    const MAX_FRAMES: u64 = 200_000;

    env_logger::init();
    log::info!("Sea Typer (native) starting...");

    let mut args = std::env::args().skip(1);
    let stage = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(12345);
    let source: Box<dyn WordSource> = match args.next() {
        Some(dir) => Box::new(JsonWordSource::new(dir)),
        None => Box::new(BuiltinWords),
    };

    let settings = Settings::load_or_default("sea_typer_settings.json");
    let progress = ProgressBook::at("sea_typer_progress.json");
    println!(
        "Stage {} of {} unlocked",
        progress.unlocked_stage(),
        sea_typer::consts::MAX_STAGE
    );

    let mut session = match Session::start(source.as_ref(), stage, settings, seed, Box::new(progress)) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("Cannot start stage {stage}: {err}");
            std::process::exit(1);
        }
    };

    let mut pilot = Autopilot::new(seed.wrapping_add(1), 120, 0.04);
    for _ in 0..MAX_FRAMES {
        if session.is_finished() {
            break;
        }
        session.advance(FRAME_MS);
        let result = match pilot.step(session.round(), FRAME_MS) {
            Some(AutoAction::Type(buffer)) => Some(session.type_text(&buffer)),
            Some(AutoAction::Submit(buffer)) => Some(session.submit(&buffer)),
            None => None,
        };
        if let Some(result) = result {
            pilot.observe(&result);
        }

        for event in session.drain_events() {
            match event {
                GameEvent::WordCompleted { id, points } => println!("  {id} +{points}"),
                GameEvent::WordMissed { id, missed } => println!("  {id} fell into the sea ({missed})"),
                GameEvent::Weather(WeatherEvent::ModeChanged { to, .. }) => {
                    println!("  weather: {to:?}")
                }
                GameEvent::Weather(WeatherEvent::Hazard(hazard)) => println!("  {hazard:?}!"),
                _ => {}
            }
        }
    }

    match session.result() {
        Some(result) => println!(
            "Stage {} {:?}: score {}, accuracy {:.1}%, {} completed, {} missed",
            result.stage,
            result.outcome,
            result.score,
            result.accuracy,
            result.completed,
            result.missed
        ),
        None => println!("Round did not finish"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on the web
}
