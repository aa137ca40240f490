//! The isolated-context path must match the in-process path exactly

use squishdrop::PhysicsConfig;
use squishdrop::sim::{Container, DropCommand, SimEvent, TickInput, World};
use squishdrop::transport::{self, TickRequest, TickResponse};

const FRAME: f32 = 1.0 / 60.0;

fn input_for(frame: u32) -> TickInput {
    let mut input = TickInput::default();
    if frame % 30 == 0 && frame < 600 {
        input.drops.push(DropCommand {
            x: 60.0 + (frame % 11) as f32 * 28.0,
            tier: None,
        });
    }
    input
}

#[test]
fn test_in_process_and_isolated_paths_are_bit_identical() {
    let mut local = World::new(PhysicsConfig::default(), Container::default(), 99);
    let mut remote = World::new(PhysicsConfig::default(), Container::default(), 99);
    let mut saw_merge = false;

    for frame in 0..900u32 {
        if local.is_round_over() {
            break;
        }
        let input = input_for(frame);
        let local_events = local.tick(&input, FRAME);

        let request = remote.begin_tick(&input, FRAME).expect("nothing in flight");
        let response = transport::run_request(&request).expect("valid request");
        let remote_events = remote.complete_tick(response).expect("fresh response");

        assert_eq!(local_events, remote_events, "frame {frame}");
        assert_eq!(local.bodies, remote.bodies, "frame {frame}");
        assert_eq!(local.next_id(), remote.next_id());
        saw_merge |= local_events.iter().any(|e| matches!(e, SimEvent::Merge { .. }));
    }
    assert!(saw_merge, "scenario should exercise merges");
}

#[test]
fn test_out_of_range_config_runs_the_same_on_both_paths() {
    let wild = PhysicsConfig {
        gravity: 90_000.0,
        wall_bounce: 3.0,
        damping: f32::NAN,
        friction: -2.0,
        max_substeps: 0,
        ..Default::default()
    };
    let mut local = World::new(PhysicsConfig::default(), Container::default(), 31);
    let mut remote = World::new(PhysicsConfig::default(), Container::default(), 31);
    local.set_config(wild.clone());
    remote.set_config(wild);
    assert_eq!(local.config().wall_bounce, 1.0);
    assert_eq!(local.config().max_substeps, 1);
    assert!(local.config().damping.is_finite());

    for frame in 0..300u32 {
        if local.is_round_over() {
            break;
        }
        let input = input_for(frame);
        let local_events = local.tick(&input, FRAME);

        let request = remote.begin_tick(&input, FRAME).expect("nothing in flight");
        assert_eq!(request.config, *remote.config());
        let response = transport::run_request(&request).expect("valid request");
        let remote_events = remote.complete_tick(response).expect("fresh response");

        assert_eq!(local_events, remote_events, "frame {frame}");
        assert_eq!(local.bodies, remote.bodies, "frame {frame}");
    }
}

#[test]
fn test_json_path_tracks_in_process_path() {
    let mut local = World::new(PhysicsConfig::default(), Container::default(), 4);
    let mut remote = World::new(PhysicsConfig::default(), Container::default(), 4);

    for frame in 0..240u32 {
        let input = input_for(frame);
        local.tick(&input, FRAME);

        let request: TickRequest = remote.begin_tick(&input, FRAME).expect("nothing in flight");
        let json = serde_json::to_string(&request).expect("encode request");
        let reply = transport::run_request_json(&json).expect("worker step");
        let response: TickResponse = serde_json::from_str(&reply).expect("decode response");
        remote.complete_tick(response).expect("fresh response");
    }

    assert_eq!(local.bodies.len(), remote.bodies.len());
    for (a, b) in local.bodies.iter().zip(&remote.bodies) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.phase, b.phase);
        for (pa, pb) in a.positions.iter().zip(&b.positions) {
            assert!((*pa - *pb).length() < 1e-3, "body {}: {pa} vs {pb}", a.id);
        }
    }
}
