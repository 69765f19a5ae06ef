//! Column box inspector

use serde_json::{Value, json};

use crate::geometry::Rect;
use crate::multicol::{ColumnBox, FlowThread};

/// Produces JSON snapshots of a flow thread's column boxes
#[derive(Debug, Clone)]
pub struct ColumnInspector {
    include_rects: bool,
}

impl ColumnInspector {
    /// Create a new inspector
    pub fn new() -> Self {
        Self {
            include_rects: true,
        }
    }

    /// Include physical column boxes in snapshots
    pub fn set_include_rects(&mut self, include_rects: bool) {
        self.include_rects = include_rects;
    }

    /// Snapshot of the column boxes and their balancing state
    pub fn snapshot(&self, flow_thread: &FlowThread) -> Value {
        let rects = if self.include_rects {
            flow_thread.column_rects()
        } else {
            Vec::new()
        };

        let boxes: Vec<Value> = flow_thread
            .column_boxes()
            .iter()
            .map(|column_box| match column_box {
                ColumnBox::Set(set) => {
                    let groups: Vec<Value> = set
                        .fragmentainer_groups()
                        .iter()
                        .map(|group| {
                            json!({
                                "logicalTop": group.logical_top(),
                                "columnHeight": group.column_height(),
                                "flowThreadTop": group.logical_top_in_flow_thread(),
                                "flowThreadBottom": group.logical_bottom_in_flow_thread(),
                                "columns": group.actual_column_count(),
                            })
                        })
                        .collect();
                    let mut value = json!({
                        "id": set.id().0,
                        "kind": "columnSet",
                        "logicalTop": set.logical_top(),
                        "logicalHeight": set.logical_height(),
                        "columns": set.actual_column_count(),
                        "groups": groups,
                    });
                    if self.include_rects {
                        value["rects"] = rects
                            .iter()
                            .filter(|(id, _)| *id == set.id())
                            .map(|(_, rect)| rect_to_json(rect))
                            .collect();
                    }
                    value
                }
                ColumnBox::Spanner(placeholder) => json!({
                    "id": placeholder.id().0,
                    "kind": "spannerPlaceholder",
                    "spanner": placeholder.spanner().to_string(),
                    "logicalTop": placeholder.logical_top(),
                    "logicalHeight": placeholder.logical_height(),
                }),
            })
            .collect();

        json!({
            "root": flow_thread.root().to_string(),
            "paged": flow_thread.is_paged(),
            "columnCount": flow_thread.column_count(),
            "columnWidth": flow_thread.column_logical_width(),
            "columnGap": flow_thread.column_gap(),
            "flowHeight": flow_thread.logical_height(),
            "contentHeight": flow_thread.container_logical_height(),
            "boxes": boxes,
            "pendingInvalidations": flow_thread.invalidations().pending().len(),
        })
    }

    /// Pretty-printed snapshot
    pub fn to_pretty_string(&self, flow_thread: &FlowThread) -> String {
        format!("{:#}", self.snapshot(flow_thread))
    }
}

impl Default for ColumnInspector {
    fn default() -> Self {
        Self::new()
    }
}

fn rect_to_json(rect: &Rect) -> Value {
    json!({
        "x": rect.x,
        "y": rect.y,
        "width": rect.width,
        "height": rect.height,
    })
}
