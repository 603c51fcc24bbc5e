// src/commands/types.rs
use std::collections::HashMap;
use std::sync::Arc;
use crate::fs::Vfs;

/// Callback for executing shell commands (used by xargs).
/// Parameters: command_string, stdin, cwd, env, fs (mutated in place).
pub type ExecFn = Arc<dyn Fn(String, String, String, HashMap<String, String>, &mut Vfs) -> CommandResult + Send + Sync>;

/// HTTP response for fetch callback
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub url: String,
}

/// Callback for HTTP requests (used by curl). Synchronous per the sandbox's
/// no-async execution model; the embedder's transport does its own blocking.
/// Parameters: url, method, headers, body
pub type FetchFn = Arc<dyn Fn(String, String, HashMap<String, String>, Option<String>) -> Result<FetchResponse, String> + Send + Sync>;

/// Result of running a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(stdout: String) -> Self {
        Self { stdout, stderr: String::new(), exit_code: 0 }
    }

    pub fn error(stderr: String) -> Self {
        Self { stdout: String::new(), stderr, exit_code: 1 }
    }

    pub fn with_exit_code(stdout: String, stderr: String, exit_code: i32) -> Self {
        Self { stdout, stderr, exit_code }
    }
}

/// Command execution context. `fs` is owned (cloned from the sandbox before
/// the command runs) and mutated in place by commands that write/create/remove.
pub struct CommandContext {
    pub args: Vec<String>,
    pub stdin: String,
    pub cwd: String,
    pub env: HashMap<String, String>,
    pub fs: Vfs,
    pub exec_fn: Option<ExecFn>,
    pub fetch_fn: Option<FetchFn>,
}

pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(&self, ctx: &mut CommandContext) -> CommandResult;
}
