//! Scene objects layered over the rigid-body engine.
//!
//! An [`Object`] owns the engine handles for one named scene element and
//! exposes kinematics, containment and contact queries in plain geometry.
//! Objects with zero density are world-fixed; everything else gets a
//! dynamic rigid body recentered on the shape centroid.

use nalgebra::{Isometry2, Point2, Vector2};
use rapier2d::parry::bounding_volume::{Aabb, BoundingVolume};
use rapier2d::prelude::*;

use super::geometry::{area_of_poly, centroid_of_poly, recenter_poly, segs_to_poly};
use crate::engine::{CollisionCategory, Space};
use crate::error::Error;
use crate::Result;

/// RGBA color, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    pub const RED: Color = Color([255, 0, 0, 255]);
    pub const GREEN: Color = Color([0, 255, 0, 255]);
    pub const BLUE: Color = Color([0, 0, 255, 255]);
    pub const GREY: Color = Color([127, 127, 127, 255]);
    pub const LIGHT_GREY: Color = Color([191, 191, 191, 255]);
    pub const NONE: Color = Color([0, 0, 0, 0]);

    /// Maps a color word to its RGBA value.
    pub fn from_name(name: &str) -> Option<Color> {
        match name.to_ascii_lowercase().as_str() {
            "blue" => Some(Color::BLUE),
            "red" => Some(Color::RED),
            "green" => Some(Color::GREEN),
            "black" => Some(Color::BLACK),
            "white" => Some(Color::WHITE),
            "grey" | "gray" => Some(Color::GREY),
            "lightgrey" => Some(Color::LIGHT_GREY),
            "none" => Some(Color::NONE),
            _ => None,
        }
    }
}

/// Surface and mass parameters shared by all shapes of one object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Mass per unit area; zero makes the object world-fixed
    pub density: f32,
    pub friction: f32,
    pub elasticity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            density: 1.0,
            friction: 0.5,
            elasticity: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Ball,
    Poly,
    Segment,
    Container,
    Compound,
    Goal,
    Blocker,
}

/// Geometry retained alongside the engine colliders.
///
/// Coordinates are local to the rigid body for dynamic objects and
/// world-space for static ones.
#[derive(Debug, Clone)]
pub enum ObjectShape {
    Ball {
        radius: f32,
        /// Placement center; for dynamic balls the body is the truth
        center: Point2<f32>,
    },
    Poly {
        verts: Vec<Point2<f32>>,
    },
    Segment {
        a: Point2<f32>,
        b: Point2<f32>,
        width: f32,
    },
    Container {
        /// Wall midline, open polyline
        points: Vec<Point2<f32>>,
        width: f32,
        /// Expanded wall quads derived from `points`
        polys: Vec<Vec<Point2<f32>>>,
        inner_color: Color,
    },
    Compound {
        polys: Vec<Vec<Point2<f32>>>,
    },
    Goal {
        verts: Vec<Point2<f32>>,
    },
    Blocker {
        verts: Vec<Point2<f32>>,
    },
}

/// One named scene element and its engine handles.
pub struct Object {
    pub name: String,
    pub kind: ObjectKind,
    pub category: CollisionCategory,
    pub color: Color,
    pub material: Material,
    pub shape: ObjectShape,
    pub(crate) body: Option<RigidBodyHandle>,
    /// Physical colliders (walls for containers)
    pub(crate) colliders: Vec<ColliderHandle>,
    /// Non-physical region collider for containers, goals and blockers
    pub(crate) sensor: Option<ColliderHandle>,
}

fn convex_hull(points: &[Point2<f32>]) -> Result<SharedShape> {
    SharedShape::convex_hull(points)
        .ok_or_else(|| Error::InvalidSpec("degenerate polygon has no convex hull".into()))
}

fn solid_collider(shape: SharedShape, material: Material, category: CollisionCategory) -> Collider {
    ColliderBuilder::new(shape)
        .density(material.density)
        .friction(material.friction)
        .restitution(material.elasticity)
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS)
        .user_data(category.tag())
        .build()
}

fn sensor_collider(shape: SharedShape) -> Collider {
    ColliderBuilder::new(shape)
        .sensor(true)
        .density(0.0)
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .user_data(CollisionCategory::Sensor.tag())
        .build()
}

impl Object {
    fn shell(
        name: &str,
        kind: ObjectKind,
        category: CollisionCategory,
        color: Color,
        material: Material,
        shape: ObjectShape,
    ) -> Object {
        Object {
            name: name.to_owned(),
            kind,
            category,
            color,
            material,
            shape,
            body: None,
            colliders: Vec::new(),
            sensor: None,
        }
    }

    fn new_body(space: &mut Space, position: Point2<f32>, velocity: Vector2<f32>) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(position.coords)
            .linvel(velocity)
            .build();
        space.insert_body(body)
    }

    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    pub(crate) fn ball(
        space: &mut Space,
        name: &str,
        position: Point2<f32>,
        radius: f32,
        material: Material,
        color: Color,
        category: CollisionCategory,
    ) -> Result<Object> {
        if radius <= 0.0 {
            return Err(Error::InvalidSpec(format!(
                "ball '{name}' needs a positive radius"
            )));
        }
        let mut obj = Self::shell(
            name,
            ObjectKind::Ball,
            category,
            color,
            material,
            ObjectShape::Ball {
                radius,
                center: position,
            },
        );
        let shape = SharedShape::ball(radius);
        if material.density == 0.0 {
            let mut collider = solid_collider(shape, material, category);
            collider.set_translation(position.coords);
            obj.colliders.push(space.insert_static(collider));
        } else {
            let body = Self::new_body(space, position, Vector2::zeros());
            obj.colliders
                .push(space.attach(solid_collider(shape, material, category), body));
            obj.body = Some(body);
        }
        Ok(obj)
    }

    pub(crate) fn poly(
        space: &mut Space,
        name: &str,
        vertices: Vec<Point2<f32>>,
        material: Material,
        color: Color,
        category: CollisionCategory,
    ) -> Result<Object> {
        if vertices.len() < 3 {
            return Err(Error::InvalidSpec(format!(
                "polygon '{name}' needs at least 3 vertices"
            )));
        }
        if material.density == 0.0 {
            let mut obj = Self::shell(
                name,
                ObjectKind::Poly,
                category,
                color,
                material,
                ObjectShape::Poly { verts: vertices },
            );
            obj.build_static_colliders(space)?;
            Ok(obj)
        } else {
            let mut local = vertices;
            let center = recenter_poly(&mut local);
            let mut obj = Self::shell(
                name,
                ObjectKind::Poly,
                category,
                color,
                material,
                ObjectShape::Poly { verts: local },
            );
            let ObjectShape::Poly { verts } = &obj.shape else {
                unreachable!()
            };
            let shape = convex_hull(verts)?;
            let body = Self::new_body(space, center, Vector2::zeros());
            obj.colliders
                .push(space.attach(solid_collider(shape, material, category), body));
            obj.body = Some(body);
            Ok(obj)
        }
    }

    pub(crate) fn segment(
        space: &mut Space,
        name: &str,
        p1: Point2<f32>,
        p2: Point2<f32>,
        width: f32,
        material: Material,
        color: Color,
        category: CollisionCategory,
    ) -> Result<Object> {
        if width <= 0.0 {
            return Err(Error::InvalidSpec(format!(
                "segment '{name}' needs a positive width"
            )));
        }
        let r = width / 2.0;
        if material.density == 0.0 {
            let mut obj = Self::shell(
                name,
                ObjectKind::Segment,
                category,
                color,
                material,
                ObjectShape::Segment { a: p1, b: p2, width },
            );
            obj.build_static_colliders(space)?;
            Ok(obj)
        } else {
            let mid = nalgebra::center(&p1, &p2);
            let a = Point2::from(p1 - mid);
            let b = Point2::from(p2 - mid);
            let mut obj = Self::shell(
                name,
                ObjectKind::Segment,
                category,
                color,
                material,
                ObjectShape::Segment { a, b, width },
            );
            let body = Self::new_body(space, mid, Vector2::zeros());
            obj.colliders.push(space.attach(
                solid_collider(SharedShape::capsule(a, b, r), material, category),
                body,
            ));
            obj.body = Some(body);
            Ok(obj)
        }
    }

    pub(crate) fn container(
        space: &mut Space,
        name: &str,
        points: Vec<Point2<f32>>,
        width: f32,
        material: Material,
        outer_color: Color,
        inner_color: Color,
        category: CollisionCategory,
    ) -> Result<Object> {
        if points.len() < 2 {
            return Err(Error::InvalidSpec(format!(
                "container '{name}' needs at least 2 midline points"
            )));
        }
        if width <= 0.0 {
            return Err(Error::InvalidSpec(format!(
                "container '{name}' needs a positive width"
            )));
        }
        if material.density == 0.0 {
            let polys = segs_to_poly(&points, width / 2.0);
            let mut obj = Self::shell(
                name,
                ObjectKind::Container,
                category,
                outer_color,
                material,
                ObjectShape::Container {
                    points,
                    width,
                    polys,
                    inner_color,
                },
            );
            obj.build_static_colliders(space)?;
            Ok(obj)
        } else {
            let mut local = points;
            let center = recenter_poly(&mut local);
            let polys = segs_to_poly(&local, width / 2.0);
            let mut obj = Self::shell(
                name,
                ObjectKind::Container,
                category,
                outer_color,
                material,
                ObjectShape::Container {
                    points: local,
                    width,
                    polys,
                    inner_color,
                },
            );
            let body = Self::new_body(space, center, Vector2::zeros());
            let ObjectShape::Container { points, polys, .. } = &obj.shape else {
                unreachable!()
            };
            let mut colliders = Vec::new();
            for quad in polys {
                colliders.push(space.attach(
                    solid_collider(convex_hull(quad)?, material, category),
                    body,
                ));
            }
            let sensor = space.attach(sensor_collider(convex_hull(points)?), body);
            obj.colliders = colliders;
            obj.sensor = Some(sensor);
            obj.body = Some(body);
            Ok(obj)
        }
    }

    pub(crate) fn compound(
        space: &mut Space,
        name: &str,
        polys: Vec<Vec<Point2<f32>>>,
        material: Material,
        color: Color,
        category: CollisionCategory,
    ) -> Result<Object> {
        if polys.is_empty() || polys.iter().any(|p| p.len() < 3) {
            return Err(Error::InvalidSpec(format!(
                "compound '{name}' needs polygons of at least 3 vertices"
            )));
        }
        if material.density == 0.0 {
            let mut obj = Self::shell(
                name,
                ObjectKind::Compound,
                category,
                color,
                material,
                ObjectShape::Compound { polys },
            );
            obj.build_static_colliders(space)?;
            Ok(obj)
        } else {
            let mut total = 0.0;
            let mut weighted = Vector2::zeros();
            for poly in &polys {
                let area = area_of_poly(poly);
                total += area;
                weighted += centroid_of_poly(poly).coords * area;
            }
            if total <= 0.0 {
                return Err(Error::InvalidSpec(format!(
                    "compound '{name}' has no area"
                )));
            }
            let center = Point2::from(weighted / total);
            let local: Vec<Vec<Point2<f32>>> = polys
                .into_iter()
                .map(|poly| {
                    poly.into_iter()
                        .map(|v| Point2::from(v - center))
                        .collect()
                })
                .collect();
            let mut obj = Self::shell(
                name,
                ObjectKind::Compound,
                category,
                color,
                material,
                ObjectShape::Compound { polys: local },
            );
            let body = Self::new_body(space, center, Vector2::zeros());
            let ObjectShape::Compound { polys } = &obj.shape else {
                unreachable!()
            };
            let mut colliders = Vec::new();
            for poly in polys {
                colliders.push(space.attach(
                    solid_collider(convex_hull(poly)?, material, category),
                    body,
                ));
            }
            obj.colliders = colliders;
            obj.body = Some(body);
            Ok(obj)
        }
    }

    pub(crate) fn goal(
        space: &mut Space,
        name: &str,
        vertices: Vec<Point2<f32>>,
        color: Color,
    ) -> Result<Object> {
        if vertices.len() < 3 {
            return Err(Error::InvalidSpec(format!(
                "goal '{name}' needs at least 3 vertices"
            )));
        }
        let mut obj = Self::shell(
            name,
            ObjectKind::Goal,
            CollisionCategory::Sensor,
            color,
            Material {
                density: 0.0,
                ..Material::default()
            },
            ObjectShape::Goal { verts: vertices },
        );
        obj.build_static_colliders(space)?;
        Ok(obj)
    }

    pub(crate) fn blocker(
        space: &mut Space,
        name: &str,
        vertices: Vec<Point2<f32>>,
        color: Color,
    ) -> Result<Object> {
        if vertices.len() < 3 {
            return Err(Error::InvalidSpec(format!(
                "blocker '{name}' needs at least 3 vertices"
            )));
        }
        let mut obj = Self::shell(
            name,
            ObjectKind::Blocker,
            CollisionCategory::Sensor,
            color,
            Material {
                density: 0.0,
                ..Material::default()
            },
            ObjectShape::Blocker { verts: vertices },
        );
        obj.build_static_colliders(space)?;
        Ok(obj)
    }

    /// (Re)creates the colliders of a world-fixed object from the world
    /// coordinates held in its shape.
    fn build_static_colliders(&mut self, space: &mut Space) -> Result<()> {
        self.colliders.clear();
        self.sensor = None;
        match &self.shape {
            ObjectShape::Ball { radius, center } => {
                let mut collider =
                    solid_collider(SharedShape::ball(*radius), self.material, self.category);
                collider.set_translation(center.coords);
                self.colliders.push(space.insert_static(collider));
            }
            ObjectShape::Poly { verts } => {
                let collider = solid_collider(convex_hull(verts)?, self.material, self.category);
                self.colliders.push(space.insert_static(collider));
            }
            ObjectShape::Segment { a, b, width } => {
                let collider = solid_collider(
                    SharedShape::capsule(*a, *b, width / 2.0),
                    self.material,
                    self.category,
                );
                self.colliders.push(space.insert_static(collider));
            }
            ObjectShape::Container { points, polys, .. } => {
                for quad in polys {
                    let collider =
                        solid_collider(convex_hull(quad)?, self.material, self.category);
                    self.colliders.push(space.insert_static(collider));
                }
                self.sensor = Some(space.insert_static(sensor_collider(convex_hull(points)?)));
            }
            ObjectShape::Compound { polys } => {
                for poly in polys {
                    let collider =
                        solid_collider(convex_hull(poly)?, self.material, self.category);
                    self.colliders.push(space.insert_static(collider));
                }
            }
            ObjectShape::Goal { verts } | ObjectShape::Blocker { verts } => {
                self.sensor = Some(space.insert_static(sensor_collider(convex_hull(verts)?)));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Kinematics
    // ------------------------------------------------------------------

    pub fn is_static(&self) -> bool {
        self.body.is_none()
    }

    fn dynamic_body(&self) -> Result<RigidBodyHandle> {
        self.body.ok_or_else(|| {
            Error::StaticState(format!("object '{}' is world-fixed", self.name))
        })
    }

    pub fn position(&self, space: &Space) -> Result<Point2<f32>> {
        let body = self.dynamic_body()?;
        let t = space.body(body).translation();
        Ok(Point2::new(t.x, t.y))
    }

    pub fn set_position(&self, space: &mut Space, position: Point2<f32>) -> Result<()> {
        let body = self.dynamic_body()?;
        space.body_mut(body).set_translation(position.coords, true);
        Ok(())
    }

    pub fn velocity(&self, space: &Space) -> Result<Vector2<f32>> {
        let body = self.dynamic_body()?;
        Ok(*space.body(body).linvel())
    }

    pub fn set_velocity(&self, space: &mut Space, velocity: Vector2<f32>) -> Result<()> {
        let body = self.dynamic_body()?;
        space.body_mut(body).set_linvel(velocity, true);
        Ok(())
    }

    /// Body rotation in radians.
    pub fn rotation(&self, space: &Space) -> Result<f32> {
        let body = self.dynamic_body()?;
        Ok(space.body(body).rotation().angle())
    }

    /// Engine-computed mass; zero for world-fixed objects.
    pub fn mass(&self, space: &Space) -> f32 {
        self.body.map(|h| space.body(h).mass()).unwrap_or(0.0)
    }

    /// Applies an impulse at a world point that must lie on the object.
    pub fn kick(
        &self,
        space: &mut Space,
        impulse: Vector2<f32>,
        point: Point2<f32>,
    ) -> Result<()> {
        if !self.point_in(space, point) {
            return Err(Error::InvalidSpec(format!(
                "kick point ({}, {}) is not on object '{}'",
                point.x, point.y, self.name
            )));
        }
        self.kick_unchecked(space, impulse, point)
    }

    /// Applies an impulse without checking that the point lies on the
    /// object.
    pub fn kick_unchecked(
        &self,
        space: &mut Space,
        impulse: Vector2<f32>,
        point: Point2<f32>,
    ) -> Result<()> {
        let body = self.dynamic_body()?;
        space
            .body_mut(body)
            .apply_impulse_at_point(impulse, point, true);
        Ok(())
    }

    pub(crate) fn sleep(&self, space: &mut Space) {
        if let Some(body) = self.body {
            space.body_mut(body).sleep();
        }
    }

    pub(crate) fn wake(&self, space: &mut Space) {
        if let Some(body) = self.body {
            space.body_mut(body).wake_up(true);
        }
    }

    // ------------------------------------------------------------------
    // Geometry queries
    // ------------------------------------------------------------------

    /// World transform of the stored shape coordinates.
    pub fn frame(&self, space: &Space) -> Isometry2<f32> {
        match self.body {
            Some(body) => *space.body(body).position(),
            None => Isometry2::identity(),
        }
    }

    /// Whether a world point lies inside the object. Containers, goals
    /// and blockers test their region; everything else tests the solid
    /// shape.
    pub fn point_in(&self, space: &Space, point: Point2<f32>) -> bool {
        match self.sensor {
            Some(handle) => space.contains_point(handle, point),
            None => self
                .colliders
                .iter()
                .any(|&h| space.contains_point(h, point)),
        }
    }

    /// Signed distance from a world point: negative inside. Region
    /// objects measure against the region shape.
    pub fn distance_from_point(&self, space: &Space, point: Point2<f32>) -> f32 {
        if let Some(handle) = self.sensor {
            return space.signed_distance(handle, point);
        }
        self.colliders
            .iter()
            .map(|&h| space.signed_distance(h, point))
            .fold(f32::INFINITY, f32::min)
    }

    /// Whether the two objects' shapes currently overlap. Region shapes
    /// count, so a ball inside a container basin touches the container.
    pub fn check_contact(&self, other: &Object, space: &Space) -> bool {
        let mine = self.all_handles();
        let theirs = other.all_handles();
        mine.iter()
            .any(|&a| theirs.iter().any(|&b| space.pair_intersects(a, b)))
    }

    /// Union AABB of every collider belonging to the object.
    pub fn bounding_box(&self, space: &Space) -> Aabb {
        let handles = self.all_handles();
        let mut aabb = space.collider_aabb(handles[0]);
        for &h in &handles[1..] {
            aabb = aabb.merged(&space.collider_aabb(h));
        }
        aabb
    }

    pub(crate) fn all_handles(&self) -> Vec<ColliderHandle> {
        let mut handles = self.colliders.clone();
        if let Some(sensor) = self.sensor {
            handles.push(sensor);
        }
        handles
    }

    /// Moves a world-fixed object by rebuilding its colliders at the
    /// offset location.
    pub(crate) fn translate_static(&mut self, space: &mut Space, offset: Vector2<f32>) -> Result<()> {
        if self.body.is_some() {
            return Err(Error::StaticState(format!(
                "object '{}' is dynamic; set its position instead",
                self.name
            )));
        }
        match &mut self.shape {
            ObjectShape::Ball { center, .. } => *center += offset,
            ObjectShape::Poly { verts }
            | ObjectShape::Goal { verts }
            | ObjectShape::Blocker { verts } => {
                for v in verts.iter_mut() {
                    *v += offset;
                }
            }
            ObjectShape::Segment { a, b, .. } => {
                *a += offset;
                *b += offset;
            }
            ObjectShape::Container { points, polys, .. } => {
                for p in points.iter_mut() {
                    *p += offset;
                }
                for quad in polys.iter_mut() {
                    for v in quad.iter_mut() {
                        *v += offset;
                    }
                }
            }
            ObjectShape::Compound { polys } => {
                for poly in polys.iter_mut() {
                    for v in poly.iter_mut() {
                        *v += offset;
                    }
                }
            }
        }
        let old: Vec<ColliderHandle> = self.all_handles();
        for handle in old {
            space.remove_collider(handle);
        }
        self.build_static_colliders(space)
    }
}
