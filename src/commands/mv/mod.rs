// src/commands/mv/mod.rs
use crate::commands::{Command, CommandContext, CommandResult};

pub struct MvCommand;

impl Command for MvCommand {
    fn name(&self) -> &'static str {
        "mv"
    }

    fn execute(&self, ctx: &mut CommandContext) -> CommandResult {
        if ctx.args.iter().any(|a| a == "--help") {
            return CommandResult::success(
                "Usage: mv [OPTION]... SOURCE... DEST\n\n\
                 Rename SOURCE to DEST, or move SOURCE(s) to DIRECTORY.\n\n\
                 Options:\n\
                   -f, --force        do not prompt before overwriting\n\
                   -n, --no-clobber   do not overwrite an existing file\n\
                   -v, --verbose      explain what is being done\n\
                       --help         display this help and exit\n".to_string()
            );
        }

        let mut no_clobber = false;
        let mut verbose = false;
        let mut paths: Vec<String> = Vec::new();

        for arg in &ctx.args {
            match arg.as_str() {
                "-f" | "--force" => {} // accepted, default behavior already overwrites
                "-n" | "--no-clobber" => no_clobber = true,
                "-v" | "--verbose" => verbose = true,
                _ if !arg.starts_with('-') => paths.push(arg.clone()),
                _ => {}
            }
        }

        if paths.len() < 2 {
            return CommandResult::error("mv: missing destination file operand\n".to_string());
        }

        let dest = paths.pop().unwrap();
        let sources = paths;
        let dest_path = ctx.fs.resolve_path(&ctx.cwd, &dest);

        let dest_is_dir = match ctx.fs.stat(&dest_path) {
            Ok(stat) => stat.is_directory,
            Err(_) => false,
        };

        if sources.len() > 1 && !dest_is_dir {
            return CommandResult::error(format!(
                "mv: target '{}' is not a directory\n",
                dest
            ));
        }

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;

        for src in &sources {
            let src_path = ctx.fs.resolve_path(&ctx.cwd, src);

            if !ctx.fs.exists(&src_path) {
                stderr.push_str(&format!("mv: cannot stat '{}': No such file or directory\n", src));
                exit_code = 1;
                continue;
            }

            let target_path = if dest_is_dir {
                let basename = src.rsplit('/').next().unwrap_or(src);
                ctx.fs.resolve_path(&dest_path, basename)
            } else {
                dest_path.clone()
            };

            if no_clobber && ctx.fs.exists(&target_path) {
                continue;
            }

            match ctx.fs.mv(&src_path, &target_path) {
                Ok(()) => {
                    if verbose {
                        stdout.push_str(&format!("renamed '{}' -> '{}'\n", src, target_path));
                    }
                }
                Err(e) => {
                    stderr.push_str(&format!("mv: cannot move '{}': {:?}\n", src, e));
                    exit_code = 1;
                }
            }
        }

        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}
