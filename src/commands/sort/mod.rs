// src/commands/sort/mod.rs
pub mod comparator;

use crate::commands::{Command, CommandContext, CommandResult};
use comparator::{SortOptions, parse_key_spec, create_comparator};

pub struct SortCommand;

impl Command for SortCommand {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn execute(&self, ctx: &mut CommandContext) -> CommandResult {
        if ctx.args.iter().any(|a| a == "--help") {
            return CommandResult::success(
                "Usage: sort [OPTION]... [FILE]...\n\n\
                 Write sorted concatenation of all FILE(s) to standard output.\n\n\
                 Options:\n\
                   -r, --reverse              reverse the result of comparisons\n\
                   -n, --numeric-sort         compare according to string numerical value\n\
                   -u, --unique               output only unique lines\n\
                   -f, --ignore-case          fold lower case to upper case characters\n\
                   -h, --human-numeric-sort   compare human readable numbers (e.g., 2K 1G)\n\
                   -V, --version-sort         natural sort of (version) numbers within text\n\
                   -d, --dictionary-order     consider only blanks and alphanumeric characters\n\
                   -M, --month-sort           compare (unknown) < 'JAN' < ... < 'DEC'\n\
                   -b, --ignore-leading-blanks ignore leading blanks\n\
                   -s, --stable               stabilize sort by disabling last-resort comparison\n\
                   -c, --check                check for sorted input; do not sort\n\
                   -o FILE, --output=FILE     write result to FILE instead of standard output\n\
                   -k KEYDEF, --key=KEYDEF    sort via a key; KEYDEF gives location and type\n\
                   -t SEP, --field-separator=SEP  use SEP instead of non-blank to blank transition\n\
                       --help                 display this help and exit\n"
                    .to_string(),
            );
        }

        // Parse arguments
        let mut opts = SortOptions::default();
        let mut files: Vec<String> = Vec::new();
        let mut i = 0;
        let args = &ctx.args;

        while i < args.len() {
            let arg = &args[i];

            if arg == "--" {
                i += 1;
                while i < args.len() {
                    files.push(args[i].clone());
                    i += 1;
                }
                break;
            }

            if arg.starts_with("--") {
                match arg.as_str() {
                    "--reverse" => opts.reverse = true,
                    "--numeric-sort" => opts.numeric = true,
                    "--unique" => opts.unique = true,
                    "--ignore-case" => opts.ignore_case = true,
                    "--human-numeric-sort" => opts.human_numeric = true,
                    "--version-sort" => opts.version_sort = true,
                    "--dictionary-order" => opts.dictionary_order = true,
                    "--month-sort" => opts.month_sort = true,
                    "--ignore-leading-blanks" => opts.ignore_leading_blanks = true,
                    "--stable" => opts.stable = true,
                    "--check" => opts.check = true,
                    _ if arg.starts_with("--output=") => {
                        opts.output_file = Some(arg[9..].to_string());
                    }
                    _ if arg.starts_with("--key=") => {
                        opts.keys.push(parse_key_spec(&arg[6..]));
                    }
                    _ if arg.starts_with("--field-separator=") => {
                        let sep = &arg[18..];
                        if let Some(c) = sep.chars().next() {
                            opts.field_separator = Some(c);
                        }
                    }
                    _ => {
                        // Unknown long option, ignore
                    }
                }
                i += 1;
                continue;
            }

            if arg.starts_with('-') && arg.len() > 1 {
                // Could be combined short flags or flags with values
                let chars: Vec<char> = arg[1..].chars().collect();
                let mut j = 0;
                let mut consumed_next = false;

                while j < chars.len() {
                    match chars[j] {
                        'r' => opts.reverse = true,
                        'n' => opts.numeric = true,
                        'u' => opts.unique = true,
                        'f' => opts.ignore_case = true,
                        'h' => opts.human_numeric = true,
                        'V' => opts.version_sort = true,
                        'd' => opts.dictionary_order = true,
                        'M' => opts.month_sort = true,
                        'b' => opts.ignore_leading_blanks = true,
                        's' => opts.stable = true,
                        'c' => opts.check = true,
                        'o' => {
                            // -o FILE or -oFILE
                            let rest: String = chars[j + 1..].iter().collect();
                            if !rest.is_empty() {
                                opts.output_file = Some(rest);
                            } else if i + 1 < args.len() {
                                i += 1;
                                opts.output_file = Some(args[i].clone());
                                consumed_next = true;
                            }
                            j = chars.len(); // done with this arg
                            continue;
                        }
                        'k' => {
                            // -k KEYDEF or -kKEYDEF
                            let rest: String = chars[j + 1..].iter().collect();
                            if !rest.is_empty() {
                                opts.keys.push(parse_key_spec(&rest));
                            } else if i + 1 < args.len() {
                                i += 1;
                                opts.keys.push(parse_key_spec(&args[i]));
                                consumed_next = true;
                            }
                            j = chars.len(); // done with this arg
                            continue;
                        }
                        't' => {
                            // -t SEP or -tSEP
                            let rest: String = chars[j + 1..].iter().collect();
                            if !rest.is_empty() {
                                opts.field_separator = rest.chars().next();
                            } else if i + 1 < args.len() {
                                i += 1;
                                opts.field_separator = args[i].chars().next();
                                consumed_next = true;
                            }
                            j = chars.len(); // done with this arg
                            continue;
                        }
                        _ => {} // unknown flag, ignore
                    }
                    j += 1;
                }

                if consumed_next {
                    // already incremented i
                }
                i += 1;
                continue;
            }

            // Not a flag: it's a file argument
            files.push(arg.clone());
            i += 1;
        }

        // Read input
        let input = if files.is_empty() || (files.len() == 1 && files[0] == "-") {
            ctx.stdin.clone()
        } else {
            let path = ctx.fs.resolve_path(&ctx.cwd, &files[0]);
            match ctx.fs.read_file(&path) {
                Ok(c) => c,
                Err(_) => {
                    return CommandResult::error(format!(
                        "sort: {}: No such file or directory\n",
                        files[0]
                    ));
                }
            }
        };

        if input.is_empty() {
            return CommandResult::success(String::new());
        }

        let mut lines: Vec<&str> = input.lines().collect();
        if lines.is_empty() {
            return CommandResult::success(String::new());
        }

        let output = {
            let comparator = create_comparator(&opts);

            // Check mode
            if opts.check {
                for idx in 1..lines.len() {
                    if comparator(lines[idx - 1], lines[idx]) == std::cmp::Ordering::Greater {
                        return CommandResult::with_exit_code(
                            String::new(),
                            format!(
                                "sort: -:{}:disorder: {}\n",
                                idx + 1,
                                lines[idx]
                            ),
                            1,
                        );
                    }
                }
                return CommandResult::success(String::new());
            }

            // Sort
            lines.sort_by(|a, b| comparator(a, b));

            // Unique
            if opts.unique {
                lines.dedup_by(|a, b| comparator(a, b) == std::cmp::Ordering::Equal);
            }

            // Build output
            let mut out = String::new();
            for line in &lines {
                out.push_str(line);
                out.push('\n');
            }
            out
        };

        // Write to output file if specified
        if let Some(ref out_path) = opts.output_file {
            let resolved = ctx.fs.resolve_path(&ctx.cwd, out_path);
            match ctx.fs.write_file(&resolved, output.as_bytes()) {
                Ok(_) => return CommandResult::success(String::new()),
                Err(e) => {
                    return CommandResult::error(format!(
                        "sort: {}: {}\n",
                        out_path, e
                    ));
                }
            }
        }

        CommandResult::success(output)
    }
}
