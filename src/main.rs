//! Sprint Squad entry point
//!
//! The playable build is the wasm library (`trunk serve`); the native
//! binary runs a headless autopilot demo of the simulation.
//!
//! Usage: `sprint-squad [character] [seed] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use sprint_squad::assets::AssetError;
    use sprint_squad::audio::CueLog;
    use sprint_squad::persistence::{FileStore, KeyValueStore, MemoryStore};
    use sprint_squad::platform::{SceneMirror, ScriptedInput};
    use sprint_squad::sim::{CharacterKind, Cue, LifecyclePhase};
    use sprint_squad::{Session, Tuning};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Sprint Squad (native) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let character = args
        .first()
        .and_then(|name| CharacterKind::from_name(name))
        .unwrap_or(CharacterKind::Dax);
    let seed = args
        .get(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(42);
    let tuning = match args.get(2) {
        Some(path) => match std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => tuning,
            Err(e) => {
                log::warn!("Tuning file {} rejected ({}), using defaults", path, e);
                Tuning::default()
            }
        },
        None => Tuning::default(),
    };

    let save_path = std::env::temp_dir().join("sprint-squad.json");
    let store: Box<dyn KeyValueStore> = match FileStore::open(&save_path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::warn!("Save file unavailable ({}), scores will not persist", e);
            Box::new(MemoryStore::new())
        }
    };

    let mut session = Session::new(
        character,
        tuning,
        seed,
        store,
        CueLog::default(),
        SceneMirror::new(),
    );
    // Headless: there is no model to load, take the fallback box
    if let Some(model) = session.pending_model() {
        session.asset_loaded(model, Err(AssetError::NotFound(model.to_string())));
    }
    session.start();

    let mut input = ScriptedInput::autopilot();
    let frame_dt = 1.0 / 60.0;
    let max_frames = 60 * 180;
    for _ in 0..max_frames {
        session.frame(frame_dt, &mut input);
        if session.run().phase() == LifecyclePhase::GameOver {
            break;
        }
    }

    let hud = session.hud();
    println!("\nRun summary ({}, seed {})", hud.character, seed);
    println!("  outcome:   {}", hud.phase);
    println!("  distance:  {:.1}", hud.distance);
    println!("  speed:     {:.2}", hud.speed);
    println!("  score:     {} (best {})", hud.score, session.high_score());
    println!("  coins:     {}", session.audio().count(Cue::Coin));
    println!("  abilities: {}", session.audio().count(Cue::Ability));
    println!("  entities:  {} live", session.scene().len());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point lives in the library (`wasm::start`)
}
