//! Ten-ball entry point
//!
//! Native builds run a headless practice game: rack, break, then keep
//! shooting at the lowest ball until the rack is decided or the shot budget
//! runs out. The browser build starts from `ten_ball::web`.

#[cfg(not(target_arch = "wasm32"))]
mod practice {
    use std::path::PathBuf;

    use anyhow::{Result, bail};
    use clap::Parser;

    use ten_ball::angle_between;
    use ten_ball::sim::{
        BallId, CalledShot, GamePhase, PocketId, Session, Shot, ShotIntent, ShotResult, TableSim,
    };
    use ten_ball::{Settings, Tuning};

    /// Frames a single shot may take before the run is abandoned
    const MAX_SHOT_FRAMES: u32 = 20_000;

    #[derive(Parser, Debug)]
    #[command(about = "Headless ten-ball practice run", version)]
    struct Args {
        /// Rack seed
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Physics tuning JSON
        #[arg(long)]
        tuning: Option<PathBuf>,
        /// Player settings JSON
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Maximum shots to play
        #[arg(long, default_value_t = 40)]
        shots: u32,
        /// Shot power after the break (0-1)
        #[arg(long, default_value_t = 0.6)]
        power: f32,
        /// Print each shot result as JSON
        #[arg(long)]
        json: bool,
    }

    pub fn run() -> Result<()> {
        let args = Args::parse();
        let tuning = match &args.tuning {
            Some(path) => Tuning::load(path)?,
            None => Tuning::default(),
        };
        let settings = match &args.settings {
            Some(path) => Settings::load(path),
            None => Settings::default(),
        };
        let mut session = Session::with_config(args.seed, tuning, settings)?;
        log::info!("Racked with seed {}", args.seed);

        for _ in 0..args.shots {
            if session.state().phase == GamePhase::End {
                break;
            }
            if session.state().phase == GamePhase::PushOut {
                session.resolve_push_out(true)?;
            }
            if session.state().ball_in_hand {
                take_ball_in_hand(&mut session);
            }

            let shot = plan_shot(&session, args.power)?;
            session.apply_shot(shot)?;
            let Some(result) = session.settle(MAX_SHOT_FRAMES) else {
                bail!("shot did not settle within {} frames", MAX_SHOT_FRAMES);
            };
            report(&result, args.json)?;
        }

        let state = session.state();
        match state.winner {
            Some(winner) => println!("{} wins after {} shots", winner, state.shots_taken),
            None => println!("No winner after {} shots", state.shots_taken),
        }
        Ok(())
    }

    /// Put the cue ball back near the head spot
    fn take_ball_in_hand(session: &mut Session) {
        let table = session.table().clone();
        let spot = session
            .state()
            .free_spot_near(&table, table.head_spot(), BallId::Cue);
        if let Err(e) = session.place_cue(spot) {
            log::warn!("Could not place cue ball: {}", e);
        }
    }

    /// Aim straight at the lowest ball and call the pocket nearest to it
    fn plan_shot(session: &Session, power: f32) -> Result<Shot> {
        let state = session.state();
        let Some(cue) = state.cue() else {
            bail!("cue ball missing");
        };
        let Some(target) = state.lowest_ball().and_then(|n| state.ball(BallId::Object(n))) else {
            bail!("no object balls left");
        };
        let angle = angle_between(cue.pos, target.pos);

        if state.phase == GamePhase::Break {
            return Ok(Shot::new(ShotIntent::plain(angle, 1.0)));
        }

        let table = session.table();
        let pocket = PocketId::ALL
            .into_iter()
            .min_by(|a, b| {
                let da = table.pocket(*a).center.distance_squared(target.pos);
                let db = table.pocket(*b).center.distance_squared(target.pos);
                da.total_cmp(&db)
            })
            .unwrap_or(PocketId::TopLeft);
        let mut shot = Shot::new(ShotIntent::plain(angle, power));
        if let Some(ball) = target.id.number() {
            shot = shot.calling(CalledShot { ball, pocket });
        }

        if let Some(prediction) = session.predict(&shot.intent) {
            log::debug!("Predicted first ball: {:?}", prediction.first_ball());
        }
        Ok(shot)
    }

    fn report(result: &ShotResult, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string(result)?);
            return Ok(());
        }
        let fouls = result.foul_messages();
        println!(
            "{}: {} hit={:?} pocketed={:?}{}",
            result.shooter,
            if result.legal { "legal" } else { "FOUL" },
            result.first_ball_hit,
            result.balls_pocketed,
            if fouls.is_empty() {
                String::new()
            } else {
                format!(" ({})", fouls.join(", "))
            }
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    practice::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is ten_ball::web::start, this is just to satisfy the compiler
}
