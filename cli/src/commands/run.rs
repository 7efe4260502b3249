use std::io::Read;

use serde::Serialize;
use serde_json::{json, Value};

use fleetscope_core::api::{
    dispatch, run_diagnosis, AppConfig, CliError, EnrollTarget, OverviewArgs, ToolCall,
    ToolExecutor, ToolName,
};

use super::cli::{DiagnoseArgs, EnrollArgs, OverviewArgs as OverviewCmd, ToolArgs};

/// Exit code when the diagnosis could not gather any evidence.
pub const EXIT_DIAGNOSIS_FAILED: i32 = 2;
/// Exit code when a single tool call returned `{error}`.
pub const EXIT_TOOL_FAILED: i32 = 3;

pub struct Output {
    pub compact: bool,
}

impl Output {
    pub fn print<T: Serialize>(&self, value: &T) -> Result<(), CliError> {
        let text = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        println!("{text}");
        Ok(())
    }
}

pub fn read_problem(args: &DiagnoseArgs) -> Result<String, CliError> {
    let text = if let Some(p) = &args.prompt {
        p.clone()
    } else if let Some(path) = &args.prompt_file {
        std::fs::read_to_string(path)?
    } else if args.stdin {
        let mut s = String::new();
        std::io::stdin().read_to_string(&mut s)?;
        s
    } else {
        return Err(CliError::ToolCall(
            "diagnose needs --prompt, --prompt-file or --stdin".into(),
        ));
    };
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(CliError::ToolCall("problem statement is empty".into()));
    }
    Ok(text)
}

pub async fn diagnose(
    args: &DiagnoseArgs,
    cfg: &AppConfig,
    executor: &dyn ToolExecutor,
    out: &Output,
) -> Result<i32, CliError> {
    let problem = read_problem(args)?;
    let outcome = run_diagnosis(&problem, executor, &cfg.diagnosis).await;
    out.print(&outcome)?;
    Ok(if outcome.is_error() {
        EXIT_DIAGNOSIS_FAILED
    } else {
        0
    })
}

pub fn parse_tool_call(args: &ToolArgs) -> Result<ToolCall, CliError> {
    let name = ToolName::parse(&args.name).ok_or_else(|| {
        let known: Vec<&str> = ToolName::ALL.iter().map(|t| t.as_str()).collect();
        CliError::ToolCall(format!(
            "unknown tool '{}' (available: {})",
            args.name,
            known.join(", ")
        ))
    })?;
    let call_args = match &args.args {
        Some(raw) => serde_json::from_str::<Value>(raw)
            .map_err(|e| CliError::ToolCall(format!("--args is not valid json: {e}")))?,
        None => Value::Null,
    };
    Ok(ToolCall {
        name,
        args: call_args,
    })
}

pub async fn tool(
    args: &ToolArgs,
    executor: &dyn ToolExecutor,
    out: &Output,
) -> Result<i32, CliError> {
    let call = parse_tool_call(args)?;
    let result = dispatch(executor, call).await;
    out.print(&result)?;
    Ok(exit_for(&result))
}

pub fn tools(out: &Output) -> Result<i32, CliError> {
    let list: Vec<Value> = ToolName::ALL
        .iter()
        .map(|t| json!({ "name": t.as_str(), "description": t.description() }))
        .collect();
    out.print(&list)?;
    Ok(0)
}

pub async fn overview(
    args: &OverviewCmd,
    executor: &dyn ToolExecutor,
    out: &Output,
) -> Result<i32, CliError> {
    let result = executor
        .get_fleet_overview(&OverviewArgs {
            max_events: args.max_events,
        })
        .await;
    out.print(&result)?;
    Ok(if result.is_success() { 0 } else { EXIT_TOOL_FAILED })
}

pub async fn enroll(
    args: &EnrollArgs,
    executor: &dyn ToolExecutor,
    out: &Output,
) -> Result<i32, CliError> {
    let result = executor
        .enroll(&EnrollTarget {
            org_unit_path: args.org_unit.clone(),
        })
        .await;
    out.print(&result)?;
    Ok(if result.is_success() { 0 } else { EXIT_TOOL_FAILED })
}

fn exit_for(result: &Value) -> i32 {
    let failed = result
        .as_object()
        .map(|o| o.len() == 1 && o.contains_key("error"))
        .unwrap_or(false);
    if failed {
        EXIT_TOOL_FAILED
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tool_lists_the_catalog() {
        let err = parse_tool_call(&ToolArgs {
            name: "drop_tables".into(),
            args: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("get_events"));
    }

    #[test]
    fn tool_args_must_be_json() {
        let err = parse_tool_call(&ToolArgs {
            name: "get_events".into(),
            args: Some("{not json".into()),
        })
        .unwrap_err();
        assert!(err.to_string().contains("--args is not valid json"));
    }

    #[test]
    fn bare_error_object_is_a_tool_failure() {
        assert_eq!(exit_for(&json!({ "error": "PERMISSION_DENIED" })), EXIT_TOOL_FAILED);
        assert_eq!(exit_for(&json!({ "events": [] })), 0);
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let args = DiagnoseArgs {
            prompt: Some("   ".into()),
            prompt_file: None,
            stdin: false,
        };
        assert!(read_problem(&args).is_err());
    }
}
