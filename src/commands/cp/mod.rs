// src/commands/cp/mod.rs
use crate::commands::{Command, CommandContext, CommandResult};
use crate::fs::CpOptions;

pub struct CpCommand;

impl Command for CpCommand {
    fn name(&self) -> &'static str {
        "cp"
    }

    fn execute(&self, ctx: &mut CommandContext) -> CommandResult {
        if ctx.args.iter().any(|a| a == "--help") {
            return CommandResult::success(
                "Usage: cp [OPTION]... SOURCE... DEST\n\n\
                 Copy SOURCE to DEST, or multiple SOURCE(s) to DIRECTORY.\n\n\
                 Options:\n\
                   -r, -R, --recursive  copy directories recursively\n\
                   -n, --no-clobber     do not overwrite an existing file\n\
                   -v, --verbose        explain what is being done\n\
                       --help           display this help and exit\n".to_string()
            );
        }

        let mut recursive = false;
        let mut no_clobber = false;
        let mut verbose = false;
        let mut paths: Vec<String> = Vec::new();

        for arg in &ctx.args {
            match arg.as_str() {
                "-r" | "-R" | "--recursive" => recursive = true,
                "-n" | "--no-clobber" => no_clobber = true,
                "-v" | "--verbose" => verbose = true,
                "-p" | "--preserve" => {} // accepted, ignored
                _ if !arg.starts_with('-') => paths.push(arg.clone()),
                _ => {}
            }
        }

        if paths.len() < 2 {
            return CommandResult::error("cp: missing destination file operand\n".to_string());
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
                "cp: target '{}' is not a directory\n",
                dest
            ));
        }

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;

        for src in &sources {
            let src_path = ctx.fs.resolve_path(&ctx.cwd, src);

            let src_stat = match ctx.fs.stat(&src_path) {
                Ok(s) => s,
                Err(_) => {
                    stderr.push_str(&format!("cp: cannot stat '{}': No such file or directory\n", src));
                    exit_code = 1;
                    continue;
                }
            };

            if src_stat.is_directory && !recursive {
                stderr.push_str(&format!("cp: -r not specified; omitting directory '{}'\n", src));
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

            let opts = CpOptions { recursive };
            match ctx.fs.cp(&src_path, &target_path, &opts) {
                Ok(()) => {
                    if verbose {
                        stdout.push_str(&format!("'{}' -> '{}'\n", src, target_path));
                    }
                }
                Err(e) => {
                    stderr.push_str(&format!("cp: cannot copy '{}': {:?}\n", src, e));
                    exit_code = 1;
                }
            }
        }

        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::Vfs;
    use std::collections::HashMap;

    fn make_ctx_with_files(args: Vec<&str>, files: Vec<(&str, &str)>) -> CommandContext {
        let mut fs = Vfs::new();
        for (path, content) in files {
            fs.write_file(path, content.as_bytes()).unwrap();
        }
        CommandContext {
            args: args.into_iter().map(String::from).collect(),
            stdin: String::new(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs,
            exec_fn: None,
            fetch_fn: None,
        }
    }

    #[test]
    fn test_cp_file() {
        let mut ctx = make_ctx_with_files(
            vec!["/src.txt", "/dest.txt"],
            vec![("/src.txt", "content")],
        );
        let result = CpCommand.execute(&mut ctx);
        assert_eq!(result.exit_code, 0);
        assert_eq!(ctx.fs.read_file("/dest.txt").unwrap(), "content");
    }

    #[test]
    fn test_cp_to_directory() {
        let mut fs = Vfs::new();
        fs.write_file("/src.txt", b"content").unwrap();
        fs.mkdir("/destdir", &crate::fs::MkdirOptions { recursive: false }).unwrap();
        let mut ctx = CommandContext {
            args: vec!["/src.txt".to_string(), "/destdir".to_string()],
            stdin: String::new(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs,
            exec_fn: None,
            fetch_fn: None,
        };
        let result = CpCommand.execute(&mut ctx);
        assert_eq!(result.exit_code, 0);
        assert!(ctx.fs.exists("/destdir/src.txt"));
    }

    #[test]
    fn test_cp_directory_without_r() {
        let mut fs = Vfs::new();
        fs.mkdir("/srcdir", &crate::fs::MkdirOptions { recursive: false }).unwrap();
        let mut ctx = CommandContext {
            args: vec!["/srcdir".to_string(), "/destdir".to_string()],
            stdin: String::new(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs,
            exec_fn: None,
            fetch_fn: None,
        };
        let result = CpCommand.execute(&mut ctx);
        assert!(result.stderr.contains("omitting directory"));
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn test_cp_no_clobber() {
        let mut ctx = make_ctx_with_files(
            vec!["-n", "/src.txt", "/dest.txt"],
            vec![("/src.txt", "new"), ("/dest.txt", "old")],
        );
        let result = CpCommand.execute(&mut ctx);
        assert_eq!(result.exit_code, 0);
        assert_eq!(ctx.fs.read_file("/dest.txt").unwrap(), "old");
    }

    #[test]
    fn test_cp_multiple_files_to_directory() {
        let mut fs = Vfs::new();
        fs.write_file("/a.txt", b"aaa").unwrap();
        fs.write_file("/b.txt", b"bbb").unwrap();
        fs.mkdir("/dir", &crate::fs::MkdirOptions { recursive: false }).unwrap();
        let mut ctx = CommandContext {
            args: vec!["/a.txt".to_string(), "/b.txt".to_string(), "/dir".to_string()],
            stdin: String::new(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs,
            exec_fn: None,
            fetch_fn: None,
        };
        let result = CpCommand.execute(&mut ctx);
        assert_eq!(result.exit_code, 0);
        assert_eq!(ctx.fs.read_file("/dir/a.txt").unwrap(), "aaa");
        assert_eq!(ctx.fs.read_file("/dir/b.txt").unwrap(), "bbb");
    }

    #[test]
    fn test_cp_directory_with_recursive() {
        let mut fs = Vfs::new();
        fs.mkdir("/srcdir", &crate::fs::MkdirOptions { recursive: false }).unwrap();
        fs.write_file("/srcdir/file.txt", b"content").unwrap();
        let mut ctx = CommandContext {
            args: vec!["-r".to_string(), "/srcdir".to_string(), "/dstdir".to_string()],
            stdin: String::new(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs,
            exec_fn: None,
            fetch_fn: None,
        };
        let result = CpCommand.execute(&mut ctx);
        assert_eq!(result.exit_code, 0);
        assert_eq!(ctx.fs.read_file("/dstdir/file.txt").unwrap(), "content");
    }

    #[test]
    fn test_cp_nested_directories() {
        let mut fs = Vfs::new();
        fs.mkdir("/src/a/b", &crate::fs::MkdirOptions { recursive: true }).unwrap();
        fs.write_file("/src/a/b/c.txt", b"deep").unwrap();
        fs.write_file("/src/root.txt", b"root").unwrap();
        let mut ctx = CommandContext {
            args: vec!["-r".to_string(), "/src".to_string(), "/dst".to_string()],
            stdin: String::new(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs,
            exec_fn: None,
            fetch_fn: None,
        };
        let result = CpCommand.execute(&mut ctx);
        assert_eq!(result.exit_code, 0);
        assert_eq!(ctx.fs.read_file("/dst/a/b/c.txt").unwrap(), "deep");
        assert_eq!(ctx.fs.read_file("/dst/root.txt").unwrap(), "root");
    }

    #[test]
    fn test_cp_missing_source() {
        let mut ctx = make_ctx_with_files(vec!["/missing.txt", "/dst.txt"], vec![]);
        let result = CpCommand.execute(&mut ctx);
        assert_eq!(result.exit_code, 1);
        assert!(result.stderr.contains("No such file or directory"));
    }

    #[test]
    fn test_cp_missing_destination() {
        let mut ctx = make_ctx_with_files(vec!["/src.txt"], vec![("/src.txt", "")]);
        let result = CpCommand.execute(&mut ctx);
        assert_eq!(result.exit_code, 1);
        assert!(result.stderr.contains("missing destination"));
    }

    #[test]
    fn test_cp_relative_paths() {
        let mut fs = Vfs::new();
        fs.mkdir("/home/user", &crate::fs::MkdirOptions { recursive: true }).unwrap();
        fs.write_file("/home/user/src.txt", b"content").unwrap();
        let mut ctx = CommandContext {
            args: vec!["src.txt".to_string(), "dst.txt".to_string()],
            stdin: String::new(),
            cwd: "/home/user".to_string(),
            env: HashMap::new(),
            fs,
            exec_fn: None,
            fetch_fn: None,
        };
        let result = CpCommand.execute(&mut ctx);
        assert_eq!(result.exit_code, 0);
        assert_eq!(ctx.fs.read_file("/home/user/dst.txt").unwrap(), "content");
    }
}
