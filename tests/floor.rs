//! Floor response properties

use glam::Vec2;
use proptest::prelude::*;
use squishdrop::consts::BOUNCE_VELOCITY_THRESHOLD;
use squishdrop::sim::Container;
use squishdrop::sim::container::floor_response;

proptest! {
    #[test]
    fn fast_hits_lose_at_least_the_restitution_share(
        vy in BOUNCE_VELOCITY_THRESHOLD..5000.0f32,
        vx in -300.0f32..300.0,
        wall_bounce in 0.0f32..1.0,
        friction in 0.0f32..1.0,
    ) {
        let v = floor_response(Vec2::new(vx, vy), wall_bounce, friction);
        prop_assert!(v.y <= 0.0);
        prop_assert!(v.y.abs() <= vy * wall_bounce + 1e-3);
        prop_assert!(v.x.abs() <= vx.abs() + 1e-3);
    }

    #[test]
    fn vertices_never_end_below_the_floor(
        depth in 0.0f32..2000.0,
        vy in -2000.0f32..20000.0,
        x in 0.0f32..420.0,
    ) {
        let container = Container::default();
        let mut positions = vec![Vec2::new(x, container.floor() + depth)];
        let mut velocities = vec![Vec2::new(0.0, vy)];
        container.collide(&mut positions, &mut velocities, 0.2, 0.3);
        prop_assert!(positions[0].y <= container.floor());
        prop_assert!(positions[0].x >= container.left() && positions[0].x <= container.right());
    }
}

#[test]
fn slow_contact_does_not_micro_bounce() {
    let v = floor_response(Vec2::new(5.0, BOUNCE_VELOCITY_THRESHOLD - 1.0), 0.9, 0.3);
    assert_eq!(v.y, 0.0);
}
