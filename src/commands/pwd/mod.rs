// src/commands/pwd/mod.rs
use crate::commands::{Command, CommandContext, CommandResult};

pub struct PwdCommand;

impl Command for PwdCommand {
    fn name(&self) -> &'static str {
        "pwd"
    }

    fn execute(&self, ctx: &mut CommandContext) -> CommandResult {
        let args = &ctx.args;

        // Parse options
        let mut use_physical = false;

        for arg in args {
            match arg.as_str() {
                "-P" => use_physical = true,
                "-L" => use_physical = false,
                "--" => break,
                _ if arg.starts_with('-') => {
                    // Ignore unknown options (bash behavior)
                }
                _ => {}
            }
        }

        let mut pwd = ctx.cwd.clone();

        if use_physical {
            // -P: resolve all symlinks to get physical path
            if let Ok(real) = ctx.fs.realpath(&ctx.cwd) {
                pwd = real;
            }
            // If realpath fails, fall back to current cwd (bash behavior)
        }

        CommandResult::success(format!("{}\n", pwd))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::Vfs;
    use std::collections::HashMap;

    fn make_ctx(args: Vec<&str>, cwd: &str) -> CommandContext {
        CommandContext {
            args: args.into_iter().map(String::from).collect(),
            stdin: String::new(),
            cwd: cwd.to_string(),
            env: HashMap::new(),
            fs: Vfs::new(),
            exec_fn: None,
            fetch_fn: None,
        }
    }

    #[test]
    fn test_pwd_default() {
        let mut ctx = make_ctx(vec![], "/home/user");
        let result = PwdCommand.execute(&mut ctx);
        assert_eq!(result.stdout, "/home/user\n");
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn test_pwd_root() {
        let mut ctx = make_ctx(vec![], "/");
        let result = PwdCommand.execute(&mut ctx);
        assert_eq!(result.stdout, "/\n");
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn test_pwd_ignore_args() {
        let mut ctx = make_ctx(vec!["ignored", "args"], "/test");
        let result = PwdCommand.execute(&mut ctx);
        assert_eq!(result.stdout, "/test\n");
    }
}
