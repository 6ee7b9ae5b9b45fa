use std::sync::Mutex;

use rapier2d::geometry::ContactPair;
use rapier2d::prelude::*;

use crate::events::{ContactInfo, ContactPoint};

/// A low-level contact transition reported by the engine during a step.
#[derive(Debug, Clone)]
pub struct RawContact {
    pub first: ColliderHandle,
    pub second: ColliderHandle,
    /// `true` for a begin transition, `false` for a separation
    pub started: bool,
    /// At least one of the shapes is a sensor
    pub sensor: bool,
    pub info: ContactInfo,
}

/// Accumulates engine collision events during a step so they can be
/// routed afterwards. rapier invokes the handler through `&self`, hence
/// the interior mutability.
#[derive(Default)]
pub(crate) struct ContactCollector {
    contacts: Mutex<Vec<RawContact>>,
}

impl ContactCollector {
    /// Takes every contact recorded since the last drain.
    pub fn drain(&self) -> Vec<RawContact> {
        match self.contacts.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => Vec::new(),
        }
    }
}

/// Snapshots the contact manifold of a pair at event time: world-space
/// normal, combined restitution, and the contact point set.
fn snapshot(
    colliders: &ColliderSet,
    h1: ColliderHandle,
    h2: ColliderHandle,
    pair: Option<&ContactPair>,
) -> ContactInfo {
    let mut info = ContactInfo::default();

    if let (Some(c1), Some(c2)) = (colliders.get(h1), colliders.get(h2)) {
        info.restitution = (c1.restitution() + c2.restitution()) / 2.0;

        if let Some(pair) = pair {
            for manifold in &pair.manifolds {
                if info.points.is_empty() {
                    info.normal = [manifold.data.normal.x, manifold.data.normal.y];
                }
                for pt in &manifold.points {
                    let wa = c1.position() * pt.local_p1;
                    let wb = c2.position() * pt.local_p2;
                    info.points.push(ContactPoint {
                        point_a: [wa.x, wa.y],
                        point_b: [wb.x, wb.y],
                        distance: pt.dist,
                    });
                }
            }
        }
    }

    info
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        contact_pair: Option<&ContactPair>,
    ) {
        let info = snapshot(colliders, event.collider1(), event.collider2(), contact_pair);
        if let Ok(mut guard) = self.contacts.lock() {
            guard.push(RawContact {
                first: event.collider1(),
                second: event.collider2(),
                started: event.started(),
                sensor: event.sensor(),
                info,
            });
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}
