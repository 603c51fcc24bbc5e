// src/commands/tee/mod.rs
use crate::commands::{Command, CommandContext, CommandResult};

pub struct TeeCommand;

const HELP: &str = "Usage: tee [OPTION]... [FILE]...\n\n\
read from stdin and write to stdout and files\n\n\
Options:\n  -a, --append     append to the given FILEs, do not overwrite\n      --help       display this help and exit\n";

fn resolve_path(cwd: &str, path: &str) -> String {
    if path.starts_with('/') { path.to_string() }
    else { format!("{}/{}", cwd.trim_end_matches('/'), path) }
}

impl Command for TeeCommand {
    fn name(&self) -> &'static str { "tee" }

    fn execute(&self, ctx: &mut CommandContext) -> CommandResult {
        let args = &ctx.args;
        if args.iter().any(|a| a == "--help") {
            return CommandResult::success(HELP.into());
        }

        let mut append = false;
        let mut files: Vec<String> = Vec::new();

        for arg in args {
            match arg.as_str() {
                "-a" | "--append" => append = true,
                _ => files.push(arg.clone()),
            }
        }

        let content = ctx.stdin.clone();
        let mut stderr = String::new();
        let mut exit_code = 0;

        for file in &files {
            let file_path = resolve_path(&ctx.cwd, file);
            let result = if append {
                ctx.fs.append_file(&file_path, content.as_bytes())
            } else {
                ctx.fs.write_file(&file_path, content.as_bytes())
            };
            if result.is_err() {
                stderr.push_str(&format!("tee: {}: No such file or directory\n", file));
                exit_code = 1;
            }
        }

        // Pass through to stdout
        CommandResult::with_exit_code(content, stderr, exit_code)
    }
}
