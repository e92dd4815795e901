//! Plan node construction and the router feature switch
//!
//! The router plan node wraps a single child subplan. It scans no
//! relation of its own: cost estimates and the output column list are
//! copied straight from the child, and the node carries the parameter id
//! the EPQ machinery identifies it by. Whether the planner generates the
//! node at all is governed by `RouterConfig`.

use serde::{Deserialize, Serialize};

/// Cost estimates carried by a plan node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanCost {
    pub startup: f64,
    pub total: f64,
    pub rows: f64,
    pub width: u32,
}

/// The UPDATE's child subplan as the planner describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubplanDesc {
    pub cost: PlanCost,
    pub output_columns: Vec<String>,
}

/// The router plan node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterPlan {
    /// Copied from the child
    pub cost: PlanCost,
    /// Output list compatible with the enclosing modification node
    pub output_columns: Vec<String>,
    /// Restart-identification parameter for EPQ
    pub epq_param: u32,
    /// The wrapped child
    pub subplan: SubplanDesc,
}

/// A node of the modification plan tree. Sealed: the driver resolves
/// router capability by matching the variant at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum PlanNode {
    Subplan(SubplanDesc),
    Router(RouterPlan),
}

impl PlanNode {
    /// The router plan, if this node is one.
    pub fn as_router(&self) -> Option<&RouterPlan> {
        match self {
            PlanNode::Router(plan) => Some(plan),
            PlanNode::Subplan(_) => None,
        }
    }

    /// Cost estimates of the node.
    pub fn cost(&self) -> &PlanCost {
        match self {
            PlanNode::Subplan(subplan) => &subplan.cost,
            PlanNode::Router(plan) => &plan.cost,
        }
    }
}

/// Planner-facing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Whether UPDATEs on partitioned tables get a router node
    pub enable_partition_router: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            enable_partition_router: true,
        }
    }
}

/// Splices a router node above `subplan`, or returns the subplan
/// unchanged when the feature is disabled.
pub fn router_plan(subplan: SubplanDesc, epq_param: u32, config: &RouterConfig) -> PlanNode {
    if !config.enable_partition_router {
        return PlanNode::Subplan(subplan);
    }

    PlanNode::Router(RouterPlan {
        cost: subplan.cost,
        output_columns: subplan.output_columns.clone(),
        epq_param,
        subplan,
    })
}
