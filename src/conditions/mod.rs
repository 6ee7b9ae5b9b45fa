//! Win conditions evaluated against the routed collision stream.
//!
//! Each condition is a small state machine fed begin/end transitions by
//! the world's collision router. A condition is won once its tracked
//! contact has persisted for `duration` seconds of simulated time.

use std::collections::HashMap;

/// Sentinel for "nothing currently satisfies the condition".
const IDLE: f32 = -1.0;

#[derive(Debug, Clone)]
pub enum GoalCondition {
    /// Won when any non-excluded object stays in the goal region.
    AnyInGoal {
        goal: String,
        duration: f32,
        exclusions: Vec<String>,
        /// Entry time per object currently inside
        ins: HashMap<String, f32>,
    },
    /// Won when at least one of the listed objects stays in the goal
    /// region; the clock starts when the region first becomes occupied.
    ManyInGoal {
        goal: String,
        objects: Vec<String>,
        duration: f32,
        ins: Vec<String>,
        time_in: f32,
    },
    /// Won when one specific object stays in the goal region.
    SpecificInGoal {
        goal: String,
        object: String,
        duration: f32,
        time_in: f32,
    },
    /// Won when the named object stays in contact with anything solid.
    AnyTouch {
        object: String,
        duration: f32,
        time_in: f32,
    },
    /// Won when two specific objects stay in contact.
    SpecificTouch {
        first: String,
        second: String,
        duration: f32,
        time_in: f32,
    },
}

impl GoalCondition {
    pub fn any_in_goal(goal: impl Into<String>, duration: f32, exclusions: Vec<String>) -> Self {
        GoalCondition::AnyInGoal {
            goal: goal.into(),
            duration,
            exclusions,
            ins: HashMap::new(),
        }
    }

    pub fn many_in_goal(goal: impl Into<String>, objects: Vec<String>, duration: f32) -> Self {
        GoalCondition::ManyInGoal {
            goal: goal.into(),
            objects,
            duration,
            ins: Vec::new(),
            time_in: IDLE,
        }
    }

    pub fn specific_in_goal(
        goal: impl Into<String>,
        object: impl Into<String>,
        duration: f32,
    ) -> Self {
        GoalCondition::SpecificInGoal {
            goal: goal.into(),
            object: object.into(),
            duration,
            time_in: IDLE,
        }
    }

    pub fn any_touch(object: impl Into<String>, duration: f32) -> Self {
        GoalCondition::AnyTouch {
            object: object.into(),
            duration,
            time_in: IDLE,
        }
    }

    pub fn specific_touch(
        first: impl Into<String>,
        second: impl Into<String>,
        duration: f32,
    ) -> Self {
        GoalCondition::SpecificTouch {
            first: first.into(),
            second: second.into(),
            duration,
            time_in: IDLE,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            GoalCondition::AnyInGoal { .. } => "AnyInGoal",
            GoalCondition::ManyInGoal { .. } => "ManyInGoal",
            GoalCondition::SpecificInGoal { .. } => "SpecificInGoal",
            GoalCondition::AnyTouch { .. } => "AnyTouch",
            GoalCondition::SpecificTouch { .. } => "SpecificTouch",
        }
    }

    /// Name of the goal region this condition watches, if any.
    pub fn goal_name(&self) -> Option<&str> {
        match self {
            GoalCondition::AnyInGoal { goal, .. }
            | GoalCondition::ManyInGoal { goal, .. }
            | GoalCondition::SpecificInGoal { goal, .. } => Some(goal),
            _ => None,
        }
    }

    pub fn duration(&self) -> f32 {
        match self {
            GoalCondition::AnyInGoal { duration, .. }
            | GoalCondition::ManyInGoal { duration, .. }
            | GoalCondition::SpecificInGoal { duration, .. }
            | GoalCondition::AnyTouch { duration, .. }
            | GoalCondition::SpecificTouch { duration, .. } => *duration,
        }
    }

    // ------------------------------------------------------------------
    // Routed transitions
    // ------------------------------------------------------------------

    /// An object began overlapping a goal region.
    pub(crate) fn on_sensor_begin(&mut self, obj: &str, goal: &str, now: f32) {
        match self {
            GoalCondition::AnyInGoal {
                goal: watched,
                exclusions,
                ins,
                ..
            } => {
                if goal == watched
                    && !ins.contains_key(obj)
                    && !exclusions.iter().any(|e| e == obj)
                {
                    ins.insert(obj.to_owned(), now);
                }
            }
            GoalCondition::ManyInGoal {
                goal: watched,
                objects,
                ins,
                time_in,
                ..
            } => {
                if goal == watched
                    && objects.iter().any(|o| o == obj)
                    && !ins.iter().any(|o| o == obj)
                {
                    ins.push(obj.to_owned());
                    if ins.len() == 1 {
                        *time_in = now;
                    }
                }
            }
            GoalCondition::SpecificInGoal {
                goal: watched,
                object,
                time_in,
                ..
            } => {
                if goal == watched && obj == object {
                    *time_in = now;
                }
            }
            _ => {}
        }
    }

    /// An object stopped overlapping a goal region. `still_inside` guards
    /// against shallow-crossing artifacts: an object whose center is
    /// still within the region has not actually left.
    pub(crate) fn on_sensor_end(&mut self, obj: &str, goal: &str, still_inside: bool) {
        match self {
            GoalCondition::AnyInGoal {
                goal: watched, ins, ..
            } => {
                if goal == watched && !still_inside {
                    ins.remove(obj);
                }
            }
            GoalCondition::ManyInGoal {
                goal: watched,
                ins,
                time_in,
                ..
            } => {
                if goal == watched {
                    ins.retain(|o| o != obj);
                    if ins.is_empty() {
                        *time_in = IDLE;
                    }
                }
            }
            GoalCondition::SpecificInGoal {
                goal: watched,
                object,
                time_in,
                ..
            } => {
                if goal == watched && obj == object && !still_inside {
                    *time_in = IDLE;
                }
            }
            _ => {}
        }
    }

    /// Two solid objects came into contact.
    pub(crate) fn on_solid_begin(&mut self, a: &str, b: &str, now: f32) {
        match self {
            GoalCondition::AnyTouch {
                object, time_in, ..
            } => {
                if a == object || b == object {
                    *time_in = now;
                }
            }
            GoalCondition::SpecificTouch {
                first,
                second,
                time_in,
                ..
            } => {
                if (a == first && b == second) || (a == second && b == first) {
                    *time_in = now;
                }
            }
            _ => {}
        }
    }

    /// Two solid objects separated.
    pub(crate) fn on_solid_end(&mut self, a: &str, b: &str) {
        match self {
            GoalCondition::AnyTouch {
                object, time_in, ..
            } => {
                if a == object || b == object {
                    *time_in = IDLE;
                }
            }
            GoalCondition::SpecificTouch {
                first,
                second,
                time_in,
                ..
            } => {
                if (a == first && b == second) || (a == second && b == first) {
                    *time_in = IDLE;
                }
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    fn time_in(&self, now: f32) -> f32 {
        match self {
            GoalCondition::AnyInGoal { ins, .. } => {
                if ins.is_empty() {
                    IDLE
                } else {
                    ins.values()
                        .fold(f32::INFINITY, |acc, &t| acc.min(t))
                        .min(now)
                }
            }
            GoalCondition::ManyInGoal { time_in, .. }
            | GoalCondition::SpecificInGoal { time_in, .. }
            | GoalCondition::AnyTouch { time_in, .. }
            | GoalCondition::SpecificTouch { time_in, .. } => *time_in,
        }
    }

    /// Seconds of tracked contact still needed before the condition is
    /// won; `None` while nothing satisfies it.
    pub fn remaining_time(&self, now: f32) -> Option<f32> {
        let entered = self.time_in(now);
        if entered == IDLE {
            return None;
        }
        Some((self.duration() - (now - entered)).max(0.0))
    }

    pub fn is_won(&self, now: f32) -> bool {
        self.remaining_time(now) == Some(0.0)
    }
}
