//! Dictionary-style world serialization.
//!
//! A [`WorldSpec`] captures a world as plain data: dimensions, gravity,
//! per-object geometry and materials, blockers, and the goal condition.
//! Worlds built from a spec get no implicit boundary walls, because the
//! walls of a serialized world already appear as ordinary objects.

use std::collections::BTreeMap;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use super::{World, WorldDefaults};
use crate::conditions::GoalCondition;
use crate::error::Error;
use crate::objects::{Color, ObjectShape};
use crate::Result;

/// A color as specs write it: a word, an RGBA list, or an RGB list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Name(String),
    Rgba([u8; 4]),
    Rgb([u8; 3]),
}

impl ColorSpec {
    pub fn to_color(&self) -> Result<Color> {
        match self {
            ColorSpec::Name(name) => Color::from_name(name)
                .ok_or_else(|| Error::InvalidSpec(format!("unknown color name '{name}'"))),
            ColorSpec::Rgba(c) => Ok(Color(*c)),
            ColorSpec::Rgb([r, g, b]) => Ok(Color([*r, *g, *b, 255])),
        }
    }

    pub fn from_color(color: Color) -> ColorSpec {
        ColorSpec::Rgba(color.0)
    }
}

fn resolve_color(spec: &Option<ColorSpec>, fallback: Color) -> Result<Color> {
    match spec {
        Some(c) => c.to_color(),
        None => Ok(fallback),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsSpec {
    pub density: f32,
    pub friction: f32,
    pub elasticity: f32,
    pub color: ColorSpec,
    pub bk_color: ColorSpec,
}

/// One object entry, tagged by shape type. Coordinates are world-space
/// snapshots; body velocities are not carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectSpec {
    Ball {
        position: [f32; 2],
        radius: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<ColorSpec>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        density: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        elasticity: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        friction: Option<f32>,
    },
    Poly {
        vertices: Vec<[f32; 2]>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<ColorSpec>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        density: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        elasticity: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        friction: Option<f32>,
    },
    Segment {
        p1: [f32; 2],
        p2: [f32; 2],
        width: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<ColorSpec>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        density: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        elasticity: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        friction: Option<f32>,
    },
    Container {
        points: Vec<[f32; 2]>,
        width: f32,
        #[serde(
            rename = "innerColor",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        inner_color: Option<ColorSpec>,
        #[serde(
            rename = "outerColor",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        outer_color: Option<ColorSpec>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<ColorSpec>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        density: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        elasticity: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        friction: Option<f32>,
    },
    Compound {
        polys: Vec<Vec<[f32; 2]>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<ColorSpec>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        density: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        elasticity: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        friction: Option<f32>,
    },
    Goal {
        vertices: Vec<[f32; 2]>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<ColorSpec>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSpec {
    pub color: ColorSpec,
    pub vertices: Vec<[f32; 2]>,
}

/// Goal condition entry; `obj` holds `"-"` where the condition has no
/// single target object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objlist: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusions: Option<Vec<String>>,
    pub duration: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSpec {
    pub dims: (f32, f32),
    pub bts: f32,
    pub gravity: f32,
    pub defaults: DefaultsSpec,
    pub objects: BTreeMap<String, ObjectSpec>,
    /// Reserved section carried through serialization; always empty.
    #[serde(default)]
    pub constraints: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub blocks: BTreeMap<String, BlockSpec>,
    #[serde(default)]
    pub gcond: Option<GoalSpec>,
}

impl WorldSpec {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<WorldSpec> {
        Ok(serde_json::from_str(json)?)
    }
}

fn pt(p: Point2<f32>) -> [f32; 2] {
    [p.x, p.y]
}

fn to_point(p: [f32; 2]) -> Point2<f32> {
    Point2::new(p[0], p[1])
}

fn require<'a>(field: &'a Option<String>, what: &str) -> Result<&'a str> {
    field
        .as_deref()
        .ok_or_else(|| Error::InvalidSpec(format!("goal condition missing '{what}'")))
}

impl World {
    /// Snapshots the world as plain data. Dynamic objects are captured
    /// at their current pose; velocities are dropped.
    pub fn to_spec(&self) -> WorldSpec {
        let defaults = DefaultsSpec {
            density: self.defaults.density,
            friction: self.defaults.friction,
            elasticity: self.defaults.elasticity,
            color: ColorSpec::from_color(self.defaults.color),
            bk_color: ColorSpec::from_color(self.defaults.bk_color),
        };

        let mut objects = BTreeMap::new();
        for (name, obj) in &self.objects {
            let frame = obj.frame(&self.space);
            let color = Some(ColorSpec::from_color(obj.color));
            let density = Some(obj.material.density);
            let elasticity = Some(obj.material.elasticity);
            let friction = Some(obj.material.friction);
            let entry = match &obj.shape {
                ObjectShape::Ball { radius, center } => ObjectSpec::Ball {
                    position: if obj.is_static() {
                        pt(*center)
                    } else {
                        pt(frame * Point2::origin())
                    },
                    radius: *radius,
                    color,
                    density,
                    elasticity,
                    friction,
                },
                ObjectShape::Poly { verts } => ObjectSpec::Poly {
                    vertices: verts.iter().map(|v| pt(frame * *v)).collect(),
                    color,
                    density,
                    elasticity,
                    friction,
                },
                ObjectShape::Segment { a, b, width } => ObjectSpec::Segment {
                    p1: pt(frame * *a),
                    p2: pt(frame * *b),
                    width: *width,
                    color,
                    density,
                    elasticity,
                    friction,
                },
                ObjectShape::Container {
                    points,
                    width,
                    inner_color,
                    ..
                } => ObjectSpec::Container {
                    points: points.iter().map(|p| pt(frame * *p)).collect(),
                    width: *width,
                    inner_color: Some(ColorSpec::from_color(*inner_color)),
                    outer_color: Some(ColorSpec::from_color(obj.color)),
                    color,
                    density,
                    elasticity,
                    friction,
                },
                ObjectShape::Compound { polys } => ObjectSpec::Compound {
                    polys: polys
                        .iter()
                        .map(|poly| poly.iter().map(|v| pt(frame * *v)).collect())
                        .collect(),
                    color,
                    density,
                    elasticity,
                    friction,
                },
                ObjectShape::Goal { verts } => ObjectSpec::Goal {
                    vertices: verts.iter().map(|v| pt(*v)).collect(),
                    color,
                },
                // Blockers live in their own registry.
                ObjectShape::Blocker { .. } => continue,
            };
            objects.insert(name.clone(), entry);
        }

        let mut blocks = BTreeMap::new();
        for (name, blocker) in &self.blockers {
            if let ObjectShape::Blocker { verts } = &blocker.shape {
                blocks.insert(
                    name.clone(),
                    BlockSpec {
                        color: ColorSpec::from_color(blocker.color),
                        vertices: verts.iter().map(|v| pt(*v)).collect(),
                    },
                );
            }
        }

        let gcond = self.goal_cond.as_ref().map(|cond| match cond {
            GoalCondition::AnyInGoal {
                goal,
                duration,
                exclusions,
                ..
            } => GoalSpec {
                kind: "AnyInGoal".into(),
                goal: Some(goal.clone()),
                obj: Some("-".into()),
                objlist: None,
                exclusions: Some(exclusions.clone()),
                duration: *duration,
            },
            GoalCondition::SpecificInGoal {
                goal,
                object,
                duration,
                ..
            } => GoalSpec {
                kind: "SpecificInGoal".into(),
                goal: Some(goal.clone()),
                obj: Some(object.clone()),
                objlist: None,
                exclusions: None,
                duration: *duration,
            },
            GoalCondition::ManyInGoal {
                goal,
                objects,
                duration,
                ..
            } => GoalSpec {
                kind: "ManyInGoal".into(),
                goal: Some(goal.clone()),
                obj: None,
                objlist: Some(objects.clone()),
                exclusions: None,
                duration: *duration,
            },
            GoalCondition::AnyTouch {
                object, duration, ..
            } => GoalSpec {
                kind: "AnyTouch".into(),
                goal: Some(object.clone()),
                obj: Some("-".into()),
                objlist: None,
                exclusions: None,
                duration: *duration,
            },
            GoalCondition::SpecificTouch {
                first,
                second,
                duration,
                ..
            } => GoalSpec {
                kind: "SpecificTouch".into(),
                goal: Some(first.clone()),
                obj: Some(second.clone()),
                objlist: None,
                exclusions: None,
                duration: *duration,
            },
        });

        WorldSpec {
            dims: self.dims,
            bts: self.bts,
            gravity: self.gravity(),
            defaults,
            objects,
            constraints: BTreeMap::new(),
            blocks,
            gcond,
        }
    }

    /// Rebuilds a world from its spec. No boundary walls are added; any
    /// walls the spec carries are restored as regular objects.
    pub fn from_spec(spec: &WorldSpec) -> Result<World> {
        let defaults = WorldDefaults {
            density: spec.defaults.density,
            elasticity: spec.defaults.elasticity,
            friction: spec.defaults.friction,
            color: spec.defaults.color.to_color()?,
            bk_color: spec.defaults.bk_color.to_color()?,
        };
        let mut world =
            World::with_config(spec.dims, spec.gravity, [false; 4], spec.bts, defaults)?;

        for (name, entry) in &spec.objects {
            match entry {
                ObjectSpec::Ball {
                    position,
                    radius,
                    color,
                    density,
                    elasticity,
                    friction,
                } => {
                    world.add_ball(
                        name,
                        to_point(*position),
                        *radius,
                        resolve_color(color, defaults.color)?,
                        *density,
                        *elasticity,
                        *friction,
                    )?;
                }
                ObjectSpec::Poly {
                    vertices,
                    color,
                    density,
                    elasticity,
                    friction,
                } => {
                    world.add_poly(
                        name,
                        vertices.iter().copied().map(to_point).collect(),
                        resolve_color(color, defaults.color)?,
                        *density,
                        *elasticity,
                        *friction,
                    )?;
                }
                ObjectSpec::Segment {
                    p1,
                    p2,
                    width,
                    color,
                    density,
                    elasticity,
                    friction,
                } => {
                    world.add_segment(
                        name,
                        to_point(*p1),
                        to_point(*p2),
                        *width,
                        resolve_color(color, defaults.color)?,
                        *density,
                        *elasticity,
                        *friction,
                    )?;
                }
                ObjectSpec::Container {
                    points,
                    width,
                    inner_color,
                    outer_color,
                    color,
                    density,
                    elasticity,
                    friction,
                } => {
                    let inner = match (inner_color, color) {
                        (Some(c), _) => c.to_color()?,
                        (None, Some(c)) => c.to_color()?,
                        (None, None) => Color::GREEN,
                    };
                    let outer = resolve_color(outer_color, defaults.color)?;
                    world.add_container(
                        name,
                        points.iter().copied().map(to_point).collect(),
                        *width,
                        inner,
                        outer,
                        *density,
                        *elasticity,
                        *friction,
                    )?;
                }
                ObjectSpec::Compound {
                    polys,
                    color,
                    density,
                    elasticity,
                    friction,
                } => {
                    world.add_compound(
                        name,
                        polys
                            .iter()
                            .map(|poly| poly.iter().copied().map(to_point).collect())
                            .collect(),
                        resolve_color(color, defaults.color)?,
                        *density,
                        *elasticity,
                        *friction,
                    )?;
                }
                ObjectSpec::Goal { vertices, color } => {
                    world.add_poly_goal(
                        name,
                        vertices.iter().copied().map(to_point).collect(),
                        resolve_color(color, defaults.color)?,
                    )?;
                }
            }
        }

        for (name, block) in &spec.blocks {
            world.add_poly_block(
                name,
                block.vertices.iter().copied().map(to_point).collect(),
                block.color.to_color()?,
            )?;
        }

        if let Some(gcond) = &spec.gcond {
            match gcond.kind.as_str() {
                "AnyInGoal" => {
                    world.attach_any_in_goal(
                        require(&gcond.goal, "goal")?,
                        gcond.duration,
                        gcond.exclusions.clone().unwrap_or_default(),
                    )?;
                }
                "SpecificInGoal" => {
                    world.attach_specific_in_goal(
                        require(&gcond.goal, "goal")?,
                        require(&gcond.obj, "obj")?,
                        gcond.duration,
                    )?;
                }
                "ManyInGoal" => {
                    world.attach_many_in_goal(
                        require(&gcond.goal, "goal")?,
                        gcond.objlist.clone().unwrap_or_default(),
                        gcond.duration,
                    )?;
                }
                "AnyTouch" => {
                    world.attach_any_touch(require(&gcond.goal, "goal")?, gcond.duration)?;
                }
                "SpecificTouch" => {
                    world.attach_specific_touch(
                        require(&gcond.goal, "goal")?,
                        require(&gcond.obj, "obj")?,
                        gcond.duration,
                    )?;
                }
                other => {
                    return Err(Error::InvalidSpec(format!(
                        "unknown goal condition type '{other}'"
                    )));
                }
            }
        }

        Ok(world)
    }

    pub fn to_json(&self) -> Result<String> {
        self.to_spec().to_json()
    }

    pub fn from_json(json: &str) -> Result<World> {
        World::from_spec(&WorldSpec::from_json(json)?)
    }

    /// A fresh world rebuilt from this one's spec: same scene, zeroed
    /// time, velocities, and collision log.
    pub fn copy(&self) -> Result<World> {
        World::from_spec(&self.to_spec())
    }
}
