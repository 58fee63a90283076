//! Find-while-scrolling
//!
//! Content below the fold is not in the tree until something scrolls it in.
//! [`ScrollSearch`] escalates from cheap native scrolling to synthetic drags,
//! searching after every step. The phase order and per-phase budgets make up
//! the [`ScrollPlan`]; the standard plan is part of the engine's contract.

use crate::element::Node;
use crate::interaction::Interactor;
use crate::query;
use crate::selector::TextQuery;
use std::fmt;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPhase {
    /// Native forward scroll of the first scrollable node
    NativeForward,
    /// Native backward scroll of the first scrollable node
    NativeBackward,
    /// Drag from screen center upward by half the screen height
    SyntheticUp,
    /// Drag from screen center downward by half the screen height
    SyntheticDown,
}

impl fmt::Display for ScrollPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScrollPhase::NativeForward => "native-forward",
            ScrollPhase::NativeBackward => "native-backward",
            ScrollPhase::SyntheticUp => "synthetic-up",
            ScrollPhase::SyntheticDown => "synthetic-down",
        };
        f.write_str(name)
    }
}

/// Ordered phases, each with the number of scroll+search cycles it may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollPlan {
    pub phases: Vec<(ScrollPhase, usize)>,
}

impl ScrollPlan {
    /// `max_retry` forward, `2×` backward, `2×` synthetic up, `3×` synthetic
    /// down.
    pub fn standard(max_retry: usize) -> Self {
        Self {
            phases: vec![
                (ScrollPhase::NativeForward, max_retry),
                (ScrollPhase::NativeBackward, max_retry * 2),
                (ScrollPhase::SyntheticUp, max_retry * 2),
                (ScrollPhase::SyntheticDown, max_retry * 3),
            ],
        }
    }

    pub fn total_cycles(&self) -> usize {
        self.phases.iter().map(|(_, budget)| budget).sum()
    }
}

/// Where a [`ScrollSearch`] found its node.
#[derive(Debug, Clone)]
pub struct ScrollHit {
    pub node: Node,
    pub phase: ScrollPhase,
    /// 1-based cycle within the phase
    pub attempt: usize,
}

pub struct ScrollSearch {
    interactor: Interactor,
    settle: Duration,
}

impl ScrollSearch {
    pub fn new(interactor: Interactor, settle: Duration) -> Self {
        Self { interactor, settle }
    }

    /// Scroll and search with the standard plan. `None` once every phase is
    /// exhausted.
    pub fn scroll_and_find(
        &self,
        node: &Node,
        query: &TextQuery,
        max_retry: usize,
    ) -> Option<Node> {
        self.run(node, query, &ScrollPlan::standard(max_retry))
            .map(|hit| hit.node)
    }

    /// Scroll and search following `plan`, reporting which phase succeeded.
    pub fn run(&self, node: &Node, query: &TextQuery, plan: &ScrollPlan) -> Option<ScrollHit> {
        for &(phase, budget) in &plan.phases {
            if phase == ScrollPhase::SyntheticUp {
                debug!("no scrollable list surfaced the target, using gesture scrolling");
            }
            for attempt in 1..=budget {
                self.step(node, phase);
                if let Some(found) = query::find_by_text(node, query) {
                    info!(
                        "scroll_and_find: {} found in {} phase, cycle {}",
                        query.texts.join(", "),
                        phase,
                        attempt
                    );
                    return Some(ScrollHit {
                        node: found,
                        phase,
                        attempt,
                    });
                }
            }
        }
        debug!(
            "scroll_and_find: {} not found after {} cycles",
            query.texts.join(", "),
            plan.total_cycles()
        );
        None
    }

    fn step(&self, node: &Node, phase: ScrollPhase) {
        let gestures = self.interactor.gestures();
        let half_height = (gestures.host().screen_height() / 2) as f32;
        match phase {
            ScrollPhase::NativeForward => {
                self.interactor.scroll_down_indexed(node, 0);
            }
            ScrollPhase::NativeBackward => {
                self.interactor.scroll_up_indexed(node, 0);
            }
            ScrollPhase::SyntheticUp => {
                gestures.drag_by(
                    gestures.screen_center(),
                    0.0,
                    -half_height,
                    gestures.drag_duration(),
                );
                thread::sleep(self.settle);
            }
            ScrollPhase::SyntheticDown => {
                gestures.drag_by(
                    gestures.screen_center(),
                    0.0,
                    half_height,
                    gestures.drag_duration(),
                );
                thread::sleep(self.settle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_plan_order_and_budgets() {
        let plan = ScrollPlan::standard(3);
        assert_eq!(
            plan.phases,
            vec![
                (ScrollPhase::NativeForward, 3),
                (ScrollPhase::NativeBackward, 6),
                (ScrollPhase::SyntheticUp, 6),
                (ScrollPhase::SyntheticDown, 9),
            ]
        );
        assert_eq!(plan.total_cycles(), 24);
    }

    #[test]
    fn zero_retry_plan_is_empty() {
        assert_eq!(ScrollPlan::standard(0).total_cycles(), 0);
    }
}
