use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pickwire_frame::Pose;
use pickwire_session::{ActionRequest, Response, ResponseBody};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ResponseOutput<'a> {
    action_id: u32,
    label: &'static str,
    #[serde(flatten)]
    response: &'a Response,
}

pub fn print_response(response: &Response, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ResponseOutput {
                action_id: response.action.id(),
                label: response.action.label(),
                response,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (field, value) in response_rows(response) {
                table.add_row(vec![field, value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let rows: Vec<String> = response_rows(response)
                .into_iter()
                .map(|(field, value)| format!("{field}={value}"))
                .collect();
            println!("{}", rows.join(" "));
        }
    }
}

fn response_rows(response: &Response) -> Vec<(String, String)> {
    let mut rows = vec![(
        "action".to_string(),
        format!("{} ({})", response.action.label(), response.action.id()),
    )];
    if let Some(code) = response.error_code {
        rows.push(("error_code".to_string(), code.to_string()));
    }
    if !response.gripper_commands.is_empty() {
        rows.push((
            "gripper_commands".to_string(),
            format!("{:?}", response.gripper_commands),
        ));
    }
    for (i, pose) in response.object_poses.iter().enumerate() {
        rows.push((format!("object_pose[{i}]"), format_pose(pose)));
    }

    match &response.body {
        ResponseBody::Ack => {}
        ResponseBody::Trajectory {
            trajectory,
            gripping_info,
        } => {
            for (i, segment) in trajectory.segments.iter().enumerate() {
                rows.push((
                    format!("segment[{i}]"),
                    format!(
                        "{:?}, {} waypoints",
                        segment.precision,
                        segment.waypoints.len()
                    ),
                ));
            }
            for (i, info) in gripping_info.iter().enumerate() {
                rows.push((format!("gripping_info[{i}]"), format!("{info:?}")));
            }
        }
        ResponseBody::ObjectPose {
            dimensions,
            z_height_angle,
        } => {
            push_optional(&mut rows, "dimensions", dimensions);
            push_optional(&mut rows, "z_height_angle", z_height_angle);
        }
        ResponseBody::Objects {
            dimensions,
            z_height_angle,
        } => {
            push_list(&mut rows, "dimensions", dimensions);
            push_list(&mut rows, "z_height_angle", z_height_angle);
        }
        ResponseBody::VisionSystemStatus { status } => {
            push_optional(&mut rows, "status", status);
        }
        ResponseBody::Calibration {
            result,
            camera_pose,
        } => {
            push_optional(&mut rows, "calibration_result", result);
            if let Some(pose) = camera_pose {
                rows.push(("camera_pose".to_string(), format_pose(pose)));
            }
        }
        ResponseBody::RunningSolution { solution } => {
            push_optional(&mut rows, "running_solution", solution);
        }
        ResponseBody::AvailableSolutions { solutions } => {
            push_list(&mut rows, "available_solution", solutions);
        }
    }
    rows
}

fn push_optional(rows: &mut Vec<(String, String)>, field: &str, values: &Option<Vec<i32>>) {
    if let Some(values) = values {
        rows.push((field.to_string(), format!("{values:?}")));
    }
}

fn push_list(rows: &mut Vec<(String, String)>, field: &str, values: &[Vec<i32>]) {
    for (i, value) in values.iter().enumerate() {
        rows.push((format!("{field}[{i}]"), format!("{value:?}")));
    }
}

fn format_pose(pose: &Pose) -> String {
    let values: Vec<String> = pose.iter().map(|v| format!("{v:.3}")).collect();
    format!("[{}]", values.join(", "))
}

#[derive(Serialize)]
struct ActionOutput {
    id: u32,
    name: &'static str,
    family: &'static str,
    label: &'static str,
    shapes: Vec<&'static str>,
    two_phase: bool,
}

impl ActionOutput {
    fn new(action: ActionRequest) -> Self {
        Self {
            id: action.id(),
            name: action.cli_name(),
            family: action.family().name(),
            label: action.label(),
            shapes: action
                .payload_shapes()
                .iter()
                .map(|shape| shape.describe())
                .collect(),
            two_phase: action.is_two_phase(),
        }
    }
}

pub fn print_actions(actions: &[ActionRequest], format: OutputFormat) {
    let actions: Vec<ActionOutput> = actions.iter().copied().map(ActionOutput::new).collect();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&actions).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "NAME", "FAMILY", "LABEL", "PAYLOAD"]);
            for action in &actions {
                table.add_row(vec![
                    action.id.to_string(),
                    action.name.to_string(),
                    action.family.to_string(),
                    action.label.to_string(),
                    action.shapes.join(" | "),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for action in &actions {
                println!(
                    "{:>2} {:<32} {}",
                    action.id,
                    action.name,
                    action.shapes.join(" | ")
                );
            }
        }
    }
}
