/// Jump and turn example: Calibrate a lopsided stance, lean into turns, hop
use balance_walk::{Action, BalanceEngine, Edge, EngineConfig, ManualClock};
use balance_walk::{Clock, CornerWeights};

fn main() {
    println!("=== Balance Walk Engine: Jump & Turn Example ===\n");

    let mut engine = BalanceEngine::new(EngineConfig::default()).expect("default config is valid");
    let clock = ManualClock::new(0);

    // The user stands with more weight on the right side. Capture that as
    // the neutral stance.
    let stance = CornerWeights::new(12.0, 18.0, 13.0, 17.0);
    engine.request_center_capture();
    engine.submit_now(stance, &clock).expect("valid frame");
    println!("Center offsets: {:?}\n", engine.calibration().center_offset());

    // Phase 1: Lean right, then left. Turn rates ramp in as the smoothing
    // window fills.
    println!("Leaning:");
    for (label, corners) in [
        ("right", CornerWeights::new(4.0, 26.0, 4.0, 26.0)),
        ("left", CornerWeights::new(26.0, 4.0, 26.0, 4.0)),
    ] {
        for i in 0..20 {
            clock.advance(18);
            let out = engine.submit_now(corners, &clock).expect("valid frame");
            if i % 5 == 4 {
                if let Some(turn) = out.turn {
                    println!(
                        "  {:>5} @ {:>5}ms: balance_x={:.1}% horizontal={}",
                        label,
                        clock.now_ms(),
                        out.ratios.balance_x,
                        turn.horizontal
                    );
                }
            }
        }
    }

    // Phase 2: Back to neutral, then hop.
    for _ in 0..20 {
        clock.advance(18);
        engine.submit_now(stance, &clock).expect("valid frame");
    }

    println!("\nHopping:");
    for _ in 0..15 {
        clock.advance(18);
        let out = engine
            .submit_now(CornerWeights::zero(), &clock)
            .expect("valid frame");
        report(&out.events);
    }
    clock.advance(18);
    let out = engine.submit_now(stance, &clock).expect("valid frame");
    report(&out.events);

    // Phase 3: Step off and stay off. The jump is forced to end.
    println!("\nStepping off:");
    for _ in 0..50 {
        clock.advance(18);
        let out = engine
            .submit_now(CornerWeights::zero(), &clock)
            .expect("valid frame");
        report(&out.events);
    }

    let (jumps, timeouts) = engine.state().jump().stats();
    println!("\n=== Summary ===");
    println!("Jumps: {} ({} timed out)", jumps, timeouts);
}

fn report(events: &[balance_walk::ActionEvent]) {
    for event in events {
        let note = match (event.action, event.edge) {
            (Action::Jump, Edge::Start) => "take-off",
            (Action::Jump, Edge::Stop) => "landing",
            _ => "",
        };
        println!("  [{:>5}ms] {:?} {:?} {}", event.timestamp_ms, event.action, event.edge, note);
    }
}
