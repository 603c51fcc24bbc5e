// src/commands/tail/mod.rs
use crate::commands::{Command, CommandContext, CommandResult};
use crate::commands::utils::{parse_head_tail_args, process_head_tail_files, get_tail, HeadTailParseResult};

pub struct TailCommand;

impl Command for TailCommand {
    fn name(&self) -> &'static str {
        "tail"
    }

    fn execute(&self, ctx: &mut CommandContext) -> CommandResult {
        if ctx.args.iter().any(|a| a == "--help") {
            return CommandResult::success(
                "Usage: tail [OPTION]... [FILE]...\n\n\
                 Print the last 10 lines of each FILE to standard output.\n\n\
                 Options:\n\
                   -c, --bytes=NUM    print the last NUM bytes\n\
                   -n, --lines=NUM    print the last NUM lines (default 10)\n\
                   -n +NUM            print starting from line NUM\n\
                   -q, --quiet        never print headers giving file names\n\
                   -v, --verbose      always print headers giving file names\n\
                       --help         display this help and exit\n".to_string()
            );
        }

        let opts = match parse_head_tail_args(&ctx.args, "tail") {
            HeadTailParseResult::Ok(o) => o,
            HeadTailParseResult::Err(e) => return e,
        };

        let lines = opts.lines;
        let bytes = opts.bytes;
        let from_line = opts.from_line;

        process_head_tail_files(ctx, &opts, "tail", |content| {
            get_tail(content, lines, bytes, from_line)
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
    fn test_tail_default() {
        let content = (1..=15).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n") + "\n";
        let mut ctx = make_ctx_with_files(vec!["/test.txt"], vec![("/test.txt", &content)]);
        let result = TailCommand.execute(&mut ctx);
        let expected = (6..=15).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n") + "\n";
        assert_eq!(result.stdout, expected);
    }

    #[test]
    fn test_tail_n3() {
        let content = (1..=10).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n") + "\n";
        let mut ctx = make_ctx_with_files(vec!["-n", "3", "/test.txt"], vec![("/test.txt", &content)]);
        let result = TailCommand.execute(&mut ctx);
        let expected = (8..=10).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n") + "\n";
        assert_eq!(result.stdout, expected);
    }

    #[test]
    fn test_tail_from_line() {
        let content = (1..=5).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n") + "\n";
        let mut ctx = make_ctx_with_files(vec!["-n", "+3", "/test.txt"], vec![("/test.txt", &content)]);
        let result = TailCommand.execute(&mut ctx);
        let expected = (3..=5).map(|i| format!("line{}", i)).collect::<Vec<_>>().join("\n") + "\n";
        assert_eq!(result.stdout, expected);
    }

    #[test]
    fn test_tail_bytes() {
        let mut ctx = make_ctx_with_files(vec!["-c", "5", "/test.txt"], vec![("/test.txt", "hello world\n")]);
        let result = TailCommand.execute(&mut ctx);
        assert_eq!(result.stdout, "orld\n");
    }

    #[test]
    fn test_tail_n_attached() {
        let content = "a\nb\nc\nd\ne\n";
        let mut ctx = make_ctx_with_files(vec!["-n2", "/test.txt"], vec![("/test.txt", content)]);
        let result = TailCommand.execute(&mut ctx);
        assert_eq!(result.stdout, "d\ne\n");
    }

    #[test]
    fn test_tail_dash_num() {
        let content = "a\nb\nc\nd\ne\n";
        let mut ctx = make_ctx_with_files(vec!["-3", "/test.txt"], vec![("/test.txt", content)]);
        let result = TailCommand.execute(&mut ctx);
        assert_eq!(result.stdout, "c\nd\ne\n");
    }

    #[test]
    fn test_tail_multiple_files() {
        let mut ctx = make_ctx_with_files(
            vec!["/a.txt", "/b.txt"],
            vec![("/a.txt", "aaa\n"), ("/b.txt", "bbb\n")],
        );
        let result = TailCommand.execute(&mut ctx);
        assert!(result.stdout.contains("==> /a.txt <=="));
        assert!(result.stdout.contains("==> /b.txt <=="));
        assert!(result.stdout.contains("aaa"));
        assert!(result.stdout.contains("bbb"));
    }

    #[test]
    fn test_tail_missing_file() {
        let mut ctx = make_ctx_with_files(vec!["/missing.txt"], vec![]);
        let result = TailCommand.execute(&mut ctx);
        assert_eq!(result.exit_code, 1);
        assert!(result.stderr.contains("No such file or directory"));
    }

    #[test]
    fn test_tail_from_stdin() {
        let mut ctx = CommandContext {
            args: vec!["-n".to_string(), "2".to_string()],
            stdin: "a\nb\nc\nd\ne\n".to_string(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs: Vfs::new(),
            exec_fn: None,
            fetch_fn: None,
        };
        let result = TailCommand.execute(&mut ctx);
        assert_eq!(result.stdout, "d\ne\n");
    }

    #[test]
    fn test_tail_empty_file() {
        let mut ctx = make_ctx_with_files(vec!["/empty.txt"], vec![("/empty.txt", "")]);
        let result = TailCommand.execute(&mut ctx);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "");
    }

    #[test]
    fn test_tail_n1_single_line() {
        let content = "only line\n";
        let mut ctx = make_ctx_with_files(vec!["-n", "1", "/test.txt"], vec![("/test.txt", content)]);
        let result = TailCommand.execute(&mut ctx);
        assert_eq!(result.stdout, "only line\n");
    }

    #[test]
    fn test_tail_from_line_plus2() {
        let content = "line1\nline2\nline3\n";
        let mut ctx = make_ctx_with_files(vec!["-n", "+2", "/test.txt"], vec![("/test.txt", content)]);
        let result = TailCommand.execute(&mut ctx);
        assert_eq!(result.stdout, "line2\nline3\n");
    }

    #[test]
    fn test_tail_from_line_beyond_file() {
        let content = "line1\nline2\n";
        let mut ctx = make_ctx_with_files(vec!["-n", "+10", "/test.txt"], vec![("/test.txt", content)]);
        let result = TailCommand.execute(&mut ctx);
        assert_eq!(result.stdout, "\n");
        assert_eq!(result.exit_code, 0);
    }
}
