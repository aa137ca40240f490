//! Squishdrop entry point
//!
//! Native builds run a short headless drop session and log the events.
//! The browser build drives the engine through `worker::step_json` instead.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use squishdrop::PhysicsConfig;
    use squishdrop::sim::{Container, DropCommand, SimEvent, TickInput, World};

    env_logger::init();
    log::info!("Squishdrop (native) starting...");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(12_345u64);
    let container = Container::default();
    let mut world = World::new(PhysicsConfig::default(), container, seed);

    let dt = 1.0 / 60.0;
    let lanes = [0.3, 0.5, 0.7, 0.4, 0.6];
    let mut score = 0u32;

    for frame in 0..3600u32 {
        let mut input = TickInput::default();
        // One drop a second, cycling across the container
        if frame % 60 == 0 {
            let lane = lanes[(frame / 60) as usize % lanes.len()];
            input.drops.push(DropCommand {
                x: container.x + container.width * lane,
                tier: None,
            });
        }

        for event in world.tick(&input, dt) {
            match event {
                SimEvent::Merge { id_a, id_b, new_tier, .. } => {
                    score += squishdrop::sim::tier::spec(new_tier).score;
                    log::info!("frame {}: {} + {} merged into tier {}", frame, id_a, id_b, new_tier);
                }
                SimEvent::MergeCompleted { id, tier, .. } => {
                    log::debug!("frame {}: body {} appeared (tier {})", frame, id, tier);
                }
                SimEvent::Landed { id, impact_speed } => {
                    log::debug!("frame {}: body {} landed ({:.0} px/s)", frame, id, impact_speed);
                }
                SimEvent::FloorImpact { .. } => {}
                SimEvent::RoundOver => {
                    log::info!("frame {}: round over", frame);
                }
            }
        }
        if world.is_round_over() {
            break;
        }
    }

    let sleeping = world.bodies.iter().filter(|b| b.is_sleeping()).count();
    println!(
        "seed {}: {} bodies ({} asleep), score {}",
        seed,
        world.bodies.len(),
        sleeping,
        score
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry points are in worker.rs, this is just to satisfy the compiler
}
