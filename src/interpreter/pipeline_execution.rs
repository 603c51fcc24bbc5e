//! Pipeline Execution
//!
//! Handles execution of command pipelines (cmd1 | cmd2 | cmd3).

use std::collections::HashMap;
use crate::ast::types::CommandNode;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::types::ExecResult;

/// Result of executing a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// Exit codes of all commands in the pipeline (for PIPESTATUS)
    pub pipestatus: Vec<i32>,
}

impl PipelineResult {
    /// Create a new pipeline result.
    pub fn new(stdout: String, stderr: String, exit_code: i32) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            pipestatus: vec![exit_code],
        }
    }

    /// Create from an ExecResult.
    pub fn from_exec_result(result: &ExecResult) -> Self {
        Self {
            stdout: result.stdout.clone(),
            stderr: result.stderr.clone(),
            exit_code: result.exit_code,
            pipestatus: vec![result.exit_code],
        }
    }

    /// Convert to an ExecResult.
    pub fn to_exec_result(&self) -> ExecResult {
        ExecResult {
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
            exit_code: self.exit_code,
            env: None,
        }
    }

    /// Apply negation (! prefix).
    pub fn negate(&mut self) {
        self.exit_code = if self.exit_code == 0 { 1 } else { 0 };
    }
}

/// Pipeline execution state.
#[derive(Debug)]
pub struct PipelineState {
    /// Current stdin for the next command
    pub stdin: String,
    /// Last result from a command
    pub last_result: ExecResult,
    /// Exit codes of all commands (for PIPESTATUS)
    pub pipestatus: Vec<i32>,
    /// Rightmost failing exit code (for pipefail)
    pub pipefail_exit_code: i32,
    /// Saved last argument ($_ before pipeline)
    pub saved_last_arg: Option<String>,
    /// Saved environment (for subshell commands)
    pub saved_env: Option<HashMap<String, String>>,
}

impl PipelineState {
    /// Create a new pipeline state.
    pub fn new() -> Self {
        Self {
            stdin: String::new(),
            last_result: ExecResult::ok(),
            pipestatus: Vec::new(),
            pipefail_exit_code: 0,
            saved_last_arg: None,
            saved_env: None,
        }
    }

    /// Record a command result.
    pub fn record_result(&mut self, result: &ExecResult, is_last: bool, pipe_stderr: bool) {
        self.pipestatus.push(result.exit_code);

        if result.exit_code != 0 {
            self.pipefail_exit_code = result.exit_code;
        }

        if !is_last {
            if pipe_stderr {
                // |& pipes both stdout and stderr to next command's stdin
                self.stdin = format!("{}{}", result.stderr, result.stdout);
                self.last_result = ExecResult {
                    stdout: String::new(),
                    stderr: String::new(),
                    exit_code: result.exit_code,
                    env: None,
                };
            } else {
                // Regular | only pipes stdout
                self.stdin = result.stdout.clone();
                self.last_result = ExecResult {
                    stdout: String::new(),
                    stderr: result.stderr.clone(),
                    exit_code: result.exit_code,
                    env: None,
                };
            }
        } else {
            self.last_result = result.clone();
        }
    }

    /// Get the final exit code, considering pipefail option.
    pub fn final_exit_code(&self, pipefail: bool) -> i32 {
        if pipefail && self.pipefail_exit_code != 0 {
            self.pipefail_exit_code
        } else {
            self.last_result.exit_code
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Set PIPESTATUS array in the environment.
pub fn set_pipestatus(env: &mut HashMap<String, String>, pipestatus: &[i32]) {
    // Clear any previous PIPESTATUS entries
    let keys_to_remove: Vec<String> = env
        .keys()
        .filter(|k| k.starts_with("PIPESTATUS_"))
        .cloned()
        .collect();
    for key in keys_to_remove {
        env.remove(&key);
    }

    // Set new PIPESTATUS entries
    for (i, &code) in pipestatus.iter().enumerate() {
        env.insert(format!("PIPESTATUS_{}", i), code.to_string());
    }
    env.insert("PIPESTATUS__length".to_string(), pipestatus.len().to_string());
}

/// Get PIPESTATUS array from the environment.
pub fn get_pipestatus(env: &HashMap<String, String>) -> Vec<i32> {
    let length = env
        .get("PIPESTATUS__length")
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(0);

    let mut result = Vec::with_capacity(length);
    for i in 0..length {
        let code = env
            .get(&format!("PIPESTATUS_{}", i))
            .and_then(|s| s.parse::<i32>().ok())
            .unwrap_or(0);
        result.push(code);
    }
    result
}

/// Options controlling pipeline execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// set -o pipefail: use the rightmost non-zero exit code
    pub pipefail: bool,
    /// shopt -s lastpipe: run the last command in the current shell, not a subshell
    pub lastpipe: bool,
    /// True when this pipeline is already running inside a subshell fork
    pub runs_in_subshell: bool,
    /// `time` keyword was used on this pipeline
    pub time_pipeline: bool,
    /// `time -p` (POSIX format)
    pub time_posix_format: bool,
}

/// Run every command in a pipeline, feeding each command's stdout to the next
/// command's stdin, and return the aggregated result.
///
/// `run_command` executes a single pipeline stage given its stdin; it is an
/// `FnMut` so the caller can thread a single mutable interpreter state/engine
/// through every stage without interior mutability.
pub fn execute_pipeline<F>(
    pipe_state: &mut PipelineState,
    commands: &[CommandNode],
    pipe_stderr: &[bool],
    options: &PipelineOptions,
    mut run_command: F,
) -> Result<PipelineResult, InterpreterError>
where
    F: FnMut(&CommandNode, &str) -> Result<ExecResult, InterpreterError>,
{
    let mut stdout = String::new();
    let mut stderr = String::new();

    let last_index = commands.len().saturating_sub(1);
    for (i, cmd) in commands.iter().enumerate() {
        let is_last = i == last_index;
        let result = run_command(cmd, &pipe_state.stdin)?;

        if is_last {
            stdout.push_str(&result.stdout);
        }
        stderr.push_str(&result.stderr);

        let stage_pipe_stderr = pipe_stderr.get(i).copied().unwrap_or(false);
        pipe_state.record_result(&result, is_last, stage_pipe_stderr);
    }

    let exit_code = pipe_state.final_exit_code(options.pipefail);

    if options.time_pipeline {
        stderr.push_str(&format_timing_output(0.0, options.time_posix_format));
    }

    let mut result = PipelineResult::new(stdout, stderr, exit_code);
    result.pipestatus = pipe_state.pipestatus.clone();
    Ok(result)
}

/// Format timing output for timed pipelines.
pub fn format_timing_output(elapsed_seconds: f64, posix_format: bool) -> String {
    if posix_format {
        // POSIX format (-p): decimal format without leading zeros
        format!("real {:.2}\nuser 0.00\nsys 0.00\n", elapsed_seconds)
    } else {
        // Default bash format: real/user/sys with XmY.YYYs
        let minutes = (elapsed_seconds / 60.0).floor() as u32;
        let seconds = elapsed_seconds % 60.0;
        let real_str = format!("{}m{:.3}s", minutes, seconds);
        format!("\nreal\t{}\nuser\t0m0.000s\nsys\t0m0.000s\n", real_str)
    }
}
