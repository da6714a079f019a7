use std::time::Duration;

use crawler_core::{
    AgentSnapshot, AgentView, Collider, Command, DamageTarget, EnemyId, EnemyState, EnemyTier,
    Event, RayHit, TargetSnapshot, WorldQuery,
};
use crawler_system_enemy_ai::{Config, EnemyAi, PatrolMode};
use glam::Vec3;

const STEP: Duration = Duration::from_millis(500);

/// Open arena whose only obstacle is an optional wall between enemy and target.
struct Arena {
    target: Vec3,
    wall_between: bool,
}

impl WorldQuery for Arena {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let torso = self.target + Vec3::Y;
        let distance = origin.distance(torso);
        if self.wall_between {
            return Some(RayHit {
                collider: Collider::Wall,
                point: origin + direction.normalize() * distance / 2.0,
                distance: distance / 2.0,
            });
        }
        (distance <= max_distance).then_some(RayHit {
            collider: Collider::Player,
            point: torso,
            distance,
        })
    }

    fn sample_navigable(&self, point: Vec3, _radius: f32) -> Option<Vec3> {
        Some(Vec3::new(point.x, 0.0, point.z))
    }
}

fn agent(enemy: EnemyId, on_navigable: bool, remaining_distance: f32) -> AgentSnapshot {
    AgentSnapshot {
        enemy,
        position: Vec3::ZERO,
        forward: Vec3::Z,
        on_navigable,
        has_path: remaining_distance > 0.0,
        remaining_distance,
        halted: false,
    }
}

fn spawned(ai: &mut EnemyAi, tier: EnemyTier) -> EnemyId {
    let enemy = EnemyId::new(ai.tracked() as u32);
    let arena = Arena {
        target: Vec3::ZERO,
        wall_between: true,
    };
    let mut out = Vec::new();
    ai.handle(
        &[Event::EnemySpawned {
            enemy,
            tier,
            position: Vec3::ZERO,
        }],
        &AgentView::default(),
        None,
        &arena,
        &mut out,
    );
    assert!(out.is_empty());
    enemy
}

fn tick(ai: &mut EnemyAi, view: &AgentView, target: Vec3, arena: &Arena) -> Vec<Command> {
    let mut out = Vec::new();
    ai.handle(
        &[Event::TimeAdvanced { dt: STEP }],
        view,
        Some(TargetSnapshot { position: target }),
        arena,
        &mut out,
    );
    out
}

#[test]
fn sighting_triggers_attack_and_losing_sight_returns_to_wander() {
    let mut ai = EnemyAi::new(Config::default(), 7);
    let enemy = spawned(&mut ai, EnemyTier::Regular);
    assert_eq!(ai.state_of(enemy), Some(EnemyState::Wander));

    let view = AgentView::from_snapshots(vec![agent(enemy, true, 0.0)]);
    let target = Vec3::new(0.0, 0.0, 10.0);
    let visible = Arena {
        target,
        wall_between: false,
    };

    let first = tick(&mut ai, &view, target, &visible);
    assert_eq!(ai.state_of(enemy), Some(EnemyState::Attack));
    assert_eq!(
        first,
        vec![Command::HaltAgent {
            enemy,
            halted: true,
        }]
    );

    let mut shots = Vec::new();
    for _ in 0..3 {
        let commands = tick(&mut ai, &view, target, &visible);
        assert!(commands
            .iter()
            .any(|command| matches!(command, Command::TurnAgent { .. })));
        shots.extend(
            commands
                .into_iter()
                .filter(|command| matches!(command, Command::ApplyDamage { .. })),
        );
        assert_eq!(ai.state_of(enemy), Some(EnemyState::Attack));
    }
    assert_eq!(
        shots,
        vec![Command::ApplyDamage {
            target: DamageTarget::Player,
            amount: 10.0,
        }]
    );

    let hidden = Arena {
        target,
        wall_between: true,
    };
    for _ in 0..4 {
        let commands = tick(&mut ai, &view, target, &hidden);
        assert!(commands.is_empty());
        assert_eq!(ai.state_of(enemy), Some(EnemyState::Attack));
    }
    let resumed = tick(&mut ai, &view, target, &hidden);
    assert_eq!(ai.state_of(enemy), Some(EnemyState::Wander));
    assert_eq!(
        resumed,
        vec![Command::HaltAgent {
            enemy,
            halted: false,
        }]
    );
}

#[test]
fn boss_launches_projectiles() {
    let mut ai = EnemyAi::new(Config::default(), 3);
    let enemy = spawned(&mut ai, EnemyTier::Boss);
    let view = AgentView::from_snapshots(vec![agent(enemy, true, 0.0)]);
    let target = Vec3::new(0.0, 0.0, 8.0);
    let arena = Arena {
        target,
        wall_between: false,
    };

    let launched: Vec<Command> = (0..4)
        .flat_map(|_| tick(&mut ai, &view, target, &arena))
        .filter(|command| matches!(command, Command::SpawnProjectile { .. }))
        .collect();

    assert_eq!(launched.len(), 1);
    let Command::SpawnProjectile {
        velocity,
        damage,
        lifetime,
        ..
    } = launched[0]
    else {
        unreachable!("filtered above");
    };
    assert!((velocity.length() - 15.0).abs() < 1e-3);
    assert!(velocity.z > 0.0);
    assert!((10.0..20.0).contains(&damage));
    assert_eq!(lifetime, Duration::from_secs(3));
}

#[test]
fn wander_waits_for_navigable_surface_then_picks_destination() {
    let mut ai = EnemyAi::new(Config::default(), 11);
    let enemy = spawned(&mut ai, EnemyTier::Regular);
    let far = Vec3::new(0.0, 0.0, -50.0);
    let arena = Arena {
        target: far,
        wall_between: true,
    };

    let off_mesh = AgentView::from_snapshots(vec![agent(enemy, false, 0.0)]);
    for _ in 0..6 {
        assert!(tick(&mut ai, &off_mesh, far, &arena).is_empty());
    }

    let on_mesh = AgentView::from_snapshots(vec![agent(enemy, true, 0.0)]);
    assert!(tick(&mut ai, &on_mesh, far, &arena).is_empty());
    assert!(tick(&mut ai, &on_mesh, far, &arena).is_empty());
    let commands = tick(&mut ai, &on_mesh, far, &arena);
    match commands.as_slice() {
        [Command::MoveAgent {
            enemy: moved,
            destination,
        }] => {
            assert_eq!(*moved, enemy);
            assert!(destination.length() <= 10.0 + 1e-3);
            assert_eq!(destination.y, 0.0);
        }
        other => panic!("expected one move, got {other:?}"),
    }

    let walking = AgentView::from_snapshots(vec![agent(enemy, true, 4.0)]);
    for _ in 0..6 {
        assert!(tick(&mut ai, &walking, far, &arena).is_empty());
    }
}

#[test]
fn patrol_dwells_then_advances_and_bounces() {
    let mut config = Config::default();
    config.regular.initial_state = EnemyState::Patrol;
    let mut ai = EnemyAi::new(config, 5);
    let enemy = spawned(&mut ai, EnemyTier::Regular);
    assert_eq!(ai.state_of(enemy), Some(EnemyState::Wander));

    let waypoints = vec![
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(4.0, 0.0, 0.0),
        Vec3::new(6.0, 0.0, 0.0),
    ];
    ai.assign_patrol(enemy, waypoints.clone(), PatrolMode::Bounce);
    assert_eq!(ai.state_of(enemy), Some(EnemyState::Patrol));

    let far = Vec3::new(0.0, 0.0, -50.0);
    let arena = Arena {
        target: far,
        wall_between: true,
    };
    let arrived = AgentView::from_snapshots(vec![agent(enemy, true, 0.1)]);

    let mut destinations = Vec::new();
    for _ in 0..24 {
        for command in tick(&mut ai, &arrived, far, &arena) {
            if let Command::MoveAgent { destination, .. } = command {
                destinations.push(destination);
            }
        }
    }

    assert_eq!(
        destinations,
        vec![waypoints[1], waypoints[2], waypoints[1], waypoints[0]]
    );
}

#[test]
fn losing_sight_returns_a_patroller_to_its_patrol() {
    let mut config = Config::default();
    config.regular.initial_state = EnemyState::Patrol;
    let mut ai = EnemyAi::new(config, 13);
    let enemy = spawned(&mut ai, EnemyTier::Regular);
    ai.assign_patrol(
        enemy,
        vec![Vec3::new(2.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0)],
        PatrolMode::Loop,
    );
    assert_eq!(ai.state_of(enemy), Some(EnemyState::Patrol));

    let view = AgentView::from_snapshots(vec![agent(enemy, true, 0.0)]);
    let target = Vec3::new(0.0, 0.0, 10.0);
    let visible = Arena {
        target,
        wall_between: false,
    };
    let sighted = tick(&mut ai, &view, target, &visible);
    assert_eq!(ai.state_of(enemy), Some(EnemyState::Attack));
    assert!(sighted.contains(&Command::HaltAgent {
        enemy,
        halted: true,
    }));

    let hidden = Arena {
        target,
        wall_between: true,
    };
    for _ in 0..4 {
        let _ = tick(&mut ai, &view, target, &hidden);
        assert_eq!(ai.state_of(enemy), Some(EnemyState::Attack));
    }
    let resumed = tick(&mut ai, &view, target, &hidden);
    assert_eq!(ai.state_of(enemy), Some(EnemyState::Patrol));
    assert_eq!(
        resumed,
        vec![Command::HaltAgent {
            enemy,
            halted: false,
        }]
    );
}

#[test]
fn empty_patrol_path_keeps_enemy_wandering() {
    let mut config = Config::default();
    config.regular.initial_state = EnemyState::Patrol;
    let mut ai = EnemyAi::new(config, 5);
    let enemy = spawned(&mut ai, EnemyTier::Regular);
    ai.assign_patrol(enemy, Vec::new(), PatrolMode::Loop);
    assert_eq!(ai.state_of(enemy), Some(EnemyState::Wander));
}

#[test]
fn death_retires_the_brain() {
    let mut ai = EnemyAi::new(Config::default(), 5);
    let enemy = spawned(&mut ai, EnemyTier::Regular);
    let mut out = Vec::new();
    ai.handle(
        &[Event::EnemyDied {
            enemy,
            tier: EnemyTier::Regular,
            position: Vec3::ZERO,
        }],
        &AgentView::default(),
        None,
        &Arena {
            target: Vec3::ZERO,
            wall_between: true,
        },
        &mut out,
    );
    assert_eq!(ai.state_of(enemy), None);
    assert_eq!(ai.tracked(), 0);
}

#[test]
fn identical_seeds_replay_identical_commands() {
    let run = || {
        let mut ai = EnemyAi::new(Config::default(), 99);
        let enemy = spawned(&mut ai, EnemyTier::Regular);
        let view = AgentView::from_snapshots(vec![agent(enemy, true, 0.0)]);
        let far = Vec3::new(0.0, 0.0, -50.0);
        let arena = Arena {
            target: far,
            wall_between: true,
        };
        (0..40)
            .flat_map(|_| tick(&mut ai, &view, far, &arena))
            .collect::<Vec<_>>()
    };
    let first = run();
    assert!(!first.is_empty());
    assert_eq!(first, run());
}
