/// Basic usage example: Feed corner weights, get action edges
use balance_walk::{ActionEvent, BalanceEngine, EngineConfig, TickOutput};

fn main() {
    println!("=== Balance Walk Engine: Basic Example ===\n");

    // Create engine with default config (5 kg in-use threshold, 18 ms ticks)
    let config = EngineConfig::default();
    let mut engine = BalanceEngine::new(config).expect("default config is valid");

    // Simulate a session: stand, walk a few steps, stand still again
    let mut frames: Vec<(u64, [f32; 4])> = Vec::new();

    // Standing phase (0-0.5 seconds)
    for i in 0..28 {
        frames.push((i * 18, [15.0, 15.0, 15.0, 15.0]));
    }

    // Walking phase: weight shifts foot to foot every 300 ms
    let mut t = 600;
    for step in 0..8 {
        let corners = if step % 2 == 0 {
            [25.0, 5.0, 25.0, 5.0]
        } else {
            [5.0, 25.0, 5.0, 25.0]
        };
        for _ in 0..16 {
            frames.push((t, corners));
            t += 18;
        }
        t += 12;
    }

    // Still phase (1 second)
    for _ in 0..56 {
        frames.push((t, [15.0, 15.0, 15.0, 15.0]));
        t += 18;
    }

    println!("Processing {} frames...\n", frames.len());

    let mut event_count = 0;
    let mut last = None;

    for (timestamp, [tl, tr, bl, br]) in frames {
        match engine.submit(tl, tr, bl, br, timestamp) {
            Ok(output) => {
                for event in &output.events {
                    event_count += 1;
                    print_event(event);
                }
                last = Some(output);
            }
            Err(e) => println!("Rejected frame at {}ms: {}", timestamp, e),
        }
    }

    // Release anything still held
    for event in engine.release_all(t) {
        event_count += 1;
        print_event(&event);
    }

    println!("\n=== Summary ===");
    println!("Total events emitted: {}", event_count);
    if let Some(output) = last {
        print_tick(&output);
    }
}

fn print_event(event: &ActionEvent) {
    println!("[{:>6}ms] {:?} {:?}", event.timestamp_ms, event.action, event.edge);
}

fn print_tick(output: &TickOutput) {
    println!("\n--- Last tick ---");
    println!("Total weight: {:.1}kg (in use: {})", output.calibrated.total_kg, output.calibrated.in_use);
    println!(
        "Balance: x={:.1}% y={:.1}%",
        output.ratios.balance_x, output.ratios.balance_y
    );
    println!("Gait: {:?}", output.motion.gait);
    if let Some(turn) = output.turn {
        println!("Turn: horizontal={} vertical={}", turn.horizontal, turn.vertical);
    }
}
