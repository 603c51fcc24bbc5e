// src/commands/mkdir/mod.rs
use crate::commands::{Command, CommandContext, CommandResult};
use crate::fs::MkdirOptions;

pub struct MkdirCommand;

impl Command for MkdirCommand {
    fn name(&self) -> &'static str {
        "mkdir"
    }

    fn execute(&self, ctx: &mut CommandContext) -> CommandResult {
        if ctx.args.iter().any(|a| a == "--help") {
            return CommandResult::success(
                "Usage: mkdir [OPTION]... DIRECTORY...\n\n\
                 Create the DIRECTORY(ies), if they do not already exist.\n\n\
                 Options:\n\
                   -p, --parents    no error if existing, make parent directories as needed\n\
                   -v, --verbose    print a message for each created directory\n\
                       --help       display this help and exit\n".to_string()
            );
        }

        let mut recursive = false;
        let mut verbose = false;
        let mut dirs: Vec<String> = Vec::new();

        for arg in &ctx.args {
            match arg.as_str() {
                "-p" | "--parents" => recursive = true,
                "-v" | "--verbose" => verbose = true,
                _ if !arg.starts_with('-') => dirs.push(arg.clone()),
                _ => {}
            }
        }

        if dirs.is_empty() {
            return CommandResult::error("mkdir: missing operand\n".to_string());
        }

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;

        for dir in &dirs {
            let path = ctx.fs.resolve_path(&ctx.cwd, dir);
            let opts = MkdirOptions { recursive };

            match ctx.fs.mkdir(&path, &opts) {
                Ok(()) => {
                    if verbose {
                        stdout.push_str(&format!("mkdir: created directory '{}'\n", dir));
                    }
                }
                Err(e) => {
                    let msg = format!("{:?}", e);
                    if msg.contains("NotFound") {
                        stderr.push_str(&format!(
                            "mkdir: cannot create directory '{}': No such file or directory\n",
                            dir
                        ));
                    } else if msg.contains("AlreadyExists") {
                        stderr.push_str(&format!(
                            "mkdir: cannot create directory '{}': File exists\n",
                            dir
                        ));
                    } else {
                        stderr.push_str(&format!("mkdir: cannot create directory '{}': {}\n", dir, msg));
                    }
                    exit_code = 1;
                }
            }
        }

        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}
