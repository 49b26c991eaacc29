use std::sync::Arc;

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::plugins::combat::Team;

use super::behaviours::{BehaviourManager, ProjectileBehaviour, ProjectileMotion};

/// Marker for entities owned by the projectile pool.
#[derive(Component)]
pub struct PooledProjectile;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectileState {
    #[default]
    Inactive,
    Active,
    PendingReturn,
}

/// Shared, read-only projectile configuration.
#[derive(Debug, Clone)]
pub struct ProjectileInfo {
    /// Distance from the spawn point after which the projectile disables itself.
    pub range: f32,
    pub piercing: bool,
    pub rotate: bool,
    /// Degrees per second, applied while `rotate` is set.
    pub rotation_speed: f32,
    pub face_at_target: bool,
    /// Degrees added to the facing angle when `face_at_target` is set.
    pub sprite_rotation: f32,
    pub damage: i32,
    pub behaviours: Vec<Arc<dyn ProjectileBehaviour>>,
    /// Audio cue forwarded to the host with `ProjectileFired`.
    pub fire_audio: Option<String>,
}

impl Default for ProjectileInfo {
    fn default() -> Self {
        Self {
            range: 1000.0,
            piercing: false,
            rotate: false,
            rotation_speed: 0.0,
            face_at_target: false,
            sprite_rotation: 0.0,
            damage: 1,
            behaviours: Vec::new(),
            fire_audio: None,
        }
    }
}

/// Box collider shape copied from a template into a pooled projectile.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ProjectileHitbox {
    pub size: Vec2,
    pub offset: Vec2,
}

impl Default for ProjectileHitbox {
    fn default() -> Self {
        Self { size: Vec2::splat(8.0), offset: Vec2::ZERO }
    }
}

impl ProjectileHitbox {
    pub fn collider(&self) -> Collider {
        let rect = Collider::rectangle(self.size.x, self.size.y);
        if self.offset == Vec2::ZERO {
            return rect;
        }
        Collider::compound(vec![(Position::new(self.offset), Rotation::default(), rect)])
    }
}

/// The projectile a pattern shoots: visual, collider shape and spawn rotation.
#[derive(Debug, Clone)]
pub struct ProjectileTemplate {
    pub name: String,
    pub sprite: Sprite,
    pub hitbox: ProjectileHitbox,
    pub rotation: Quat,
}

impl ProjectileTemplate {
    pub fn new(name: impl Into<String>, sprite: Sprite, hitbox: ProjectileHitbox) -> Self {
        Self { name: name.into(), sprite, hitbox, rotation: Quat::IDENTITY }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// The template's facing ("up") vector once its rotation is applied.
    pub fn up(&self) -> Vec2 {
        (self.rotation * Vec3::Y).truncate()
    }

    pub fn apply_shape(
        &self,
        sprite: &mut Sprite,
        hitbox: &mut ProjectileHitbox,
        collider: &mut Collider,
    ) {
        *sprite = self.sprite.clone();
        *hitbox = self.hitbox;
        *collider = self.hitbox.collider();
    }
}

/// Runtime state of one pooled projectile.
///
/// Idle (in the pool): not shot, zero start/target, no shooter, nothing ignored.
/// Active: every field populated and the shooter in `ignored`.
#[derive(Component, Debug, Clone, Default)]
pub struct Projectile {
    pub state: ProjectileState,
    pub start: Vec2,
    pub target: Vec2,
    pub direction: Vec2,
    /// Seconds since `shoot`.
    pub age: f32,
    pub shooter: Option<Entity>,
    pub shooter_team: Option<Team>,
    pub info: Option<Arc<ProjectileInfo>>,
    pub original: Option<Arc<ProjectileTemplate>>,
    ignored: Vec<Entity>,
}

impl Projectile {
    #[inline]
    pub fn is_shot(&self) -> bool {
        self.state == ProjectileState::Active
    }

    #[inline]
    pub fn ignores(&self, collider: Entity) -> bool {
        self.ignored.contains(&collider)
    }

    /// Stop reporting contacts with `collider` for the rest of this shot.
    pub fn ignore(&mut self, collider: Entity) {
        if !self.ignores(collider) {
            self.ignored.push(collider);
        }
    }

    pub fn motion<'a>(&'a mut self, transform: &'a mut Transform, dt: f32) -> ProjectileMotion<'a> {
        ProjectileMotion {
            transform,
            direction: &mut self.direction,
            start: self.start,
            target: self.target,
            age: self.age,
            dt,
        }
    }

    /// Re-initialize this pooled slot from a template.
    ///
    /// The behaviour set becomes `info.behaviours ∪ extra`, all not started.
    /// Sprite and collider shape are applied separately with
    /// [`ProjectileTemplate::apply_shape`].
    pub fn clone_from_template(
        &mut self,
        manager: &mut BehaviourManager,
        template: &Arc<ProjectileTemplate>,
        info: Arc<ProjectileInfo>,
        extra: &[Arc<dyn ProjectileBehaviour>],
    ) {
        manager.rebuild(&info.behaviours, extra);
        self.info = Some(info);
        self.original = Some(Arc::clone(template));
    }

    /// Fire from the current transform position.
    ///
    /// Returns `false` without touching anything when the projectile is already shot
    /// or was never cloned from a template.
    pub fn shoot(
        &mut self,
        manager: &mut BehaviourManager,
        transform: &mut Transform,
        shooter: Entity,
        shooter_team: Option<Team>,
        target: Vec2,
        direction: Vec2,
    ) -> bool {
        debug_assert!(!self.is_shot(), "projectile shot twice without being disabled");
        if self.is_shot() {
            return false;
        }
        let Some(info) = self.info.clone() else {
            return false;
        };

        self.state = ProjectileState::Active;
        self.start = transform.translation.truncate();
        self.target = target;
        self.direction = direction;
        self.shooter = Some(shooter);
        self.shooter_team = shooter_team;
        self.age = 0.0;

        if info.face_at_target {
            let angle = direction.y.atan2(direction.x) + info.sprite_rotation.to_radians();
            transform.rotation = Quat::from_rotation_z(angle);
        }

        self.ignored.clear();
        self.ignore(shooter);

        manager.init(&mut self.motion(transform, 0.0));
        true
    }

    /// One fixed tick. Returns `false` if the projectile left its range and disabled itself.
    pub fn tick(
        &mut self,
        manager: &mut BehaviourManager,
        transform: &mut Transform,
        dt: f32,
    ) -> bool {
        let Some(info) = self.info.clone() else {
            return true;
        };

        if transform.translation.truncate().distance(self.start) >= info.range {
            self.disable(manager, transform, true);
            return false;
        }

        if info.rotate {
            transform.rotate_z((info.rotation_speed * dt).to_radians());
        }

        self.age += dt;
        manager.movement(&mut self.motion(transform, dt));
        true
    }

    /// Back to idle. `remove_from_pool` hands the slot to the return commit;
    /// otherwise the caller keeps it.
    pub fn disable(
        &mut self,
        manager: &mut BehaviourManager,
        transform: &mut Transform,
        remove_from_pool: bool,
    ) {
        manager.die(&mut self.motion(transform, 0.0));

        self.state = if remove_from_pool {
            ProjectileState::PendingReturn
        } else {
            ProjectileState::Inactive
        };
        self.start = Vec2::ZERO;
        self.target = Vec2::ZERO;
        self.shooter = None;
        self.shooter_team = None;
        self.age = 0.0;
        self.ignored.clear();
    }
}
