// src/commands/rm/mod.rs
use crate::commands::{Command, CommandContext, CommandResult};
use crate::fs::RmOptions;

pub struct RmCommand;

impl Command for RmCommand {
    fn name(&self) -> &'static str {
        "rm"
    }

    fn execute(&self, ctx: &mut CommandContext) -> CommandResult {
        if ctx.args.iter().any(|a| a == "--help") {
            return CommandResult::success(
                "Usage: rm [OPTION]... [FILE]...\n\n\
                 Remove (unlink) the FILE(s).\n\n\
                 Options:\n\
                   -f, --force      ignore nonexistent files and arguments\n\
                   -r, -R, --recursive  remove directories and their contents recursively\n\
                   -v, --verbose    explain what is being done\n\
                       --help       display this help and exit\n".to_string()
            );
        }

        let mut recursive = false;
        let mut force = false;
        let mut verbose = false;
        let mut paths: Vec<String> = Vec::new();

        for arg in &ctx.args {
            match arg.as_str() {
                "-r" | "-R" | "--recursive" => recursive = true,
                "-f" | "--force" => force = true,
                "-v" | "--verbose" => verbose = true,
                "-rf" | "-fr" | "-Rf" | "-fR" => {
                    recursive = true;
                    force = true;
                }
                _ if !arg.starts_with('-') => paths.push(arg.clone()),
                _ => {}
            }
        }

        if paths.is_empty() {
            if force {
                return CommandResult::success(String::new());
            }
            return CommandResult::error("rm: missing operand\n".to_string());
        }

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;

        for path in &paths {
            let full_path = ctx.fs.resolve_path(&ctx.cwd, path);

            match ctx.fs.stat(&full_path) {
                Ok(stat) => {
                    if stat.is_directory && !recursive {
                        stderr.push_str(&format!("rm: cannot remove '{}': Is a directory\n", path));
                        exit_code = 1;
                        continue;
                    }
                }
                Err(_) => {
                    if !force {
                        stderr.push_str(&format!("rm: cannot remove '{}': No such file or directory\n", path));
                        exit_code = 1;
                    }
                    continue;
                }
            }

            let opts = RmOptions { recursive, force };
            match ctx.fs.rm(&full_path, &opts) {
                Ok(()) => {
                    if verbose {
                        stdout.push_str(&format!("removed '{}'\n", path));
                    }
                }
                Err(e) => {
                    if !force {
                        let msg = format!("{:?}", e);
                        if msg.contains("NotEmpty") {
                            stderr.push_str(&format!("rm: cannot remove '{}': Directory not empty\n", path));
                        } else {
                            stderr.push_str(&format!("rm: cannot remove '{}': {}\n", path, msg));
                        }
                        exit_code = 1;
                    }
                }
            }
        }

        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}
