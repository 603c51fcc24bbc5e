use crate::commands::{Command, CommandContext, CommandResult};

pub struct TrueCommand;

impl Command for TrueCommand {
    fn name(&self) -> &'static str {
        "true"
    }

    fn execute(&self, _ctx: &mut CommandContext) -> CommandResult {
        CommandResult::success(String::new())
    }
}

pub struct FalseCommand;

impl Command for FalseCommand {
    fn name(&self) -> &'static str {
        "false"
    }

    fn execute(&self, _ctx: &mut CommandContext) -> CommandResult {
        CommandResult::with_exit_code(String::new(), String::new(), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::Vfs;
    use std::collections::HashMap;

    fn create_ctx() -> CommandContext {
        CommandContext {
            args: vec![],
            stdin: String::new(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs: Vfs::new(),
            exec_fn: None,
            fetch_fn: None,
        }
    }

    #[test]
    fn test_true_returns_zero() {
        let mut ctx = create_ctx();
        let result = TrueCommand.execute(&mut ctx);
        assert_eq!(result.exit_code, 0);
        assert!(result.stdout.is_empty());
        assert!(result.stderr.is_empty());
    }

    #[test]
    fn test_false_returns_one() {
        let mut ctx = create_ctx();
        let result = FalseCommand.execute(&mut ctx);
        assert_eq!(result.exit_code, 1);
        assert!(result.stdout.is_empty());
        assert!(result.stderr.is_empty());
    }
}
