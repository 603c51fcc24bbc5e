// src/commands/head/mod.rs
use crate::commands::{Command, CommandContext, CommandResult};
use crate::commands::utils::{parse_head_tail_args, process_head_tail_files, get_head, HeadTailParseResult};

pub struct HeadCommand;

impl Command for HeadCommand {
    fn name(&self) -> &'static str {
        "head"
    }

    fn execute(&self, ctx: &mut CommandContext) -> CommandResult {
        if ctx.args.iter().any(|a| a == "--help") {
            return CommandResult::success(
                "Usage: head [OPTION]... [FILE]...\n\n\
                 Print the first 10 lines of each FILE to standard output.\n\n\
                 Options:\n\
                   -c, --bytes=NUM    print the first NUM bytes\n\
                   -n, --lines=NUM    print the first NUM lines (default 10)\n\
                   -q, --quiet        never print headers giving file names\n\
                   -v, --verbose      always print headers giving file names\n\
                       --help         display this help and exit\n".to_string()
            );
        }

        let opts = match parse_head_tail_args(&ctx.args, "head") {
            HeadTailParseResult::Ok(o) => o,
            HeadTailParseResult::Err(e) => return e,
        };

        let lines = opts.lines;
        let bytes = opts.bytes;

        process_head_tail_files(ctx, &opts, "head", |content| {
            get_head(content, lines, bytes)
        })
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
    fn test_head_default() {
        let content = (1..=15).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n") + "\n";
        let mut ctx = make_ctx_with_files(vec!["/test.txt"], vec![("/test.txt", &content)]);
        let result = HeadCommand.execute(&mut ctx);
        let expected = (1..=10).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n") + "\n";
        assert_eq!(result.stdout, expected);
    }

    #[test]
    fn test_head_n5() {
        let content = (1..=10).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n") + "\n";
        let mut ctx = make_ctx_with_files(vec!["-n", "5", "/test.txt"], vec![("/test.txt", &content)]);
        let result = HeadCommand.execute(&mut ctx);
        let expected = (1..=5).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n") + "\n";
        assert_eq!(result.stdout, expected);
    }

    #[test]
    fn test_head_bytes() {
        let mut ctx = make_ctx_with_files(vec!["-c", "5", "/test.txt"], vec![("/test.txt", "hello world\n")]);
        let result = HeadCommand.execute(&mut ctx);
        assert_eq!(result.stdout, "hello");
    }

    #[test]
    fn test_head_multiple_files() {
        let mut ctx = make_ctx_with_files(
            vec!["/a.txt", "/b.txt"],
            vec![("/a.txt", "aaa\n"), ("/b.txt", "bbb\n")],
        );
        let result = HeadCommand.execute(&mut ctx);
        assert!(result.stdout.contains("==> /a.txt <=="));
        assert!(result.stdout.contains("==> /b.txt <=="));
        assert!(result.stdout.contains("aaa"));
        assert!(result.stdout.contains("bbb"));
    }

    #[test]
    fn test_head_n_attached() {
        let content = "a\nb\nc\nd\ne\n";
        let mut ctx = make_ctx_with_files(vec!["-n3", "/test.txt"], vec![("/test.txt", content)]);
        let result = HeadCommand.execute(&mut ctx);
        assert_eq!(result.stdout, "a\nb\nc\n");
    }

    #[test]
    fn test_head_dash_num() {
        let content = "a\nb\nc\nd\ne\n";
        let mut ctx = make_ctx_with_files(vec!["-2", "/test.txt"], vec![("/test.txt", content)]);
        let result = HeadCommand.execute(&mut ctx);
        assert_eq!(result.stdout, "a\nb\n");
    }

    #[test]
    fn test_head_missing_file() {
        let mut ctx = make_ctx_with_files(vec!["/missing.txt"], vec![]);
        let result = HeadCommand.execute(&mut ctx);
        assert_eq!(result.exit_code, 1);
        assert!(result.stderr.contains("No such file or directory"));
    }

    #[test]
    fn test_head_from_stdin() {
        let mut ctx = CommandContext {
            args: vec!["-n".to_string(), "2".to_string()],
            stdin: "a\nb\nc\nd\ne\n".to_string(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs: Vfs::new(),
            exec_fn: None,
            fetch_fn: None,
        };
        let result = HeadCommand.execute(&mut ctx);
        assert_eq!(result.stdout, "a\nb\n");
    }

    #[test]
    fn test_head_empty_file() {
        let mut ctx = make_ctx_with_files(vec!["/empty.txt"], vec![("/empty.txt", "")]);
        let result = HeadCommand.execute(&mut ctx);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "");
    }

    #[test]
    fn test_head_n1() {
        let content = "first\nsecond\n";
        let mut ctx = make_ctx_with_files(vec!["-n", "1", "/test.txt"], vec![("/test.txt", content)]);
        let result = HeadCommand.execute(&mut ctx);
        assert_eq!(result.stdout, "first\n");
    }

    #[test]
    fn test_head_file_without_trailing_newline() {
        let content = "no newline";
        let mut ctx = make_ctx_with_files(vec!["-n", "1", "/test.txt"], vec![("/test.txt", content)]);
        let result = HeadCommand.execute(&mut ctx);
        assert_eq!(result.stdout, "no newline");
    }
}
