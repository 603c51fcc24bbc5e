//! Execution Engine
//!
//! The core execution engine that ties all interpreter components together.
//! Implements the full AST execution chain:
//!
//! execute_script -> execute_statement -> execute_pipeline -> execute_command

use crate::ast::types::{
    CaseTerminator, CommandNode, CompoundCommandNode, PipelineNode, RedirectionOperator,
    RedirectionTarget, ScriptNode, SimpleCommandNode, StatementNode, StatementOperator,
};
use crate::interpreter::builtins::{
    handle_break, handle_continue, handle_declare, handle_exit, handle_export, handle_let,
    handle_local, handle_read, handle_readonly, handle_return, handle_set, handle_shift,
    handle_unset,
};
use crate::interpreter::conditionals::{evaluate_conditional_expression, match_pattern};
use crate::interpreter::errors::{ErrexitError, ExecutionLimitError, InterpreterError, LimitType};
use crate::interpreter::functions::{call_function, get_function, is_function_defined};
use crate::interpreter::helpers::shell_constants::is_posix_special_builtin;
use crate::fs::Vfs;
use crate::interpreter::interpreter::{
    build_exported_env, check_command_limit, should_trigger_errexit, update_exit_code,
};
use crate::interpreter::pipeline_execution::{
    execute_pipeline, PipelineOptions, PipelineState, set_pipestatus,
};
use crate::interpreter::redirections::apply_redirections;
use crate::interpreter::simple_command_assignments::process_assignments;
use crate::interpreter::subshell_group::{execute_group, execute_subshell};
use crate::interpreter::types::{ExecResult, ExecutionLimits, InterpreterContext, InterpreterState};
use crate::interpreter::word_expansion::{expand_word, expand_word_with_glob};
use crate::commands::registry::CommandRegistry;
use crate::commands::types::CommandContext;

/// The execution engine that ties all interpreter components together.
pub struct ExecutionEngine<'a> {
    /// Execution limits (max commands, recursion depth, iterations)
    pub limits: &'a ExecutionLimits,
    /// Filesystem view shared by the shell and its commands
    pub fs: &'a mut Vfs,
}

impl<'a> ExecutionEngine<'a> {
    /// Create a new execution engine.
    pub fn new(limits: &'a ExecutionLimits, fs: &'a mut Vfs) -> Self {
        Self { limits, fs }
    }

    /// Execute a complete script (list of statements).
    pub fn execute_script(
        &mut self,
        state: &mut InterpreterState,
        ast: &ScriptNode,
    ) -> Result<ExecResult, InterpreterError> {
        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;

        for statement in &ast.statements {
            match self.execute_statement(state, statement) {
                Ok(result) => {
                    stdout.push_str(&result.stdout);
                    stderr.push_str(&result.stderr);
                    exit_code = result.exit_code;
                    update_exit_code(state, exit_code);
                }
                Err(InterpreterError::Exit(e)) => {
                    // ExitError propagates up to terminate the script
                    let mut err = e;
                    err.prepend_output(&stdout, &stderr);
                    return Err(InterpreterError::Exit(err));
                }
                Err(InterpreterError::ExecutionLimit(e)) => {
                    // ExecutionLimitError must always propagate
                    return Err(InterpreterError::ExecutionLimit(e));
                }
                Err(InterpreterError::Errexit(e)) => {
                    // Errexit terminates the script
                    stdout.push_str(&e.stdout);
                    stderr.push_str(&e.stderr);
                    exit_code = e.exit_code;
                    return Ok(ExecResult::new(stdout, stderr, exit_code));
                }
                Err(InterpreterError::Break(mut e)) => {
                    // Break/continue outside loops - silently continue
                    e.prepend_output(&stdout, &stderr);
                    stdout = e.stdout.clone();
                    stderr = e.stderr.clone();
                    continue;
                }
                Err(InterpreterError::Continue(mut e)) => {
                    e.prepend_output(&stdout, &stderr);
                    stdout = e.stdout.clone();
                    stderr = e.stderr.clone();
                    continue;
                }
                Err(InterpreterError::Return(mut e)) => {
                    // Return outside function - propagate
                    e.prepend_output(&stdout, &stderr);
                    return Err(InterpreterError::Return(e));
                }
                Err(e) => {
                    // Other errors - convert to result
                    stderr.push_str(&format!("{}\n", e));
                    exit_code = 1;
                }
            }
        }

        Ok(ExecResult::new(stdout, stderr, exit_code))
    }

    /// Execute a single statement (list of pipelines with && || operators).
    pub fn execute_statement(
        &mut self,
        state: &mut InterpreterState,
        stmt: &StatementNode,
    ) -> Result<ExecResult, InterpreterError> {
        // Handle deferred syntax errors
        if let Some(ref err) = stmt.deferred_error {
            return Ok(ExecResult::new(
                String::new(),
                format!("bash: syntax error near unexpected token `{}'\n", err.token),
                2,
            ));
        }

        // noexec mode (set -n): parse but don't execute
        if state.options.noexec {
            return Ok(ExecResult::ok());
        }

        // Reset errexit_safe at start of each statement
        state.errexit_safe = Some(false);

        let mut stdout = String::new();
        let mut stderr = String::new();

        // verbose mode (set -v): print source before execution
        if state.options.verbose {
            if let Some(ref source) = stmt.source_text {
                stderr.push_str(source);
                stderr.push('\n');
            }
        }

        let mut exit_code = 0;
        let mut last_executed_index: i32 = -1;
        let mut last_pipeline_negated = false;

        for (i, pipeline) in stmt.pipelines.iter().enumerate() {
            // Check && / || short-circuit
            if i > 0 {
                let op = &stmt.operators[i - 1];
                match op {
                    StatementOperator::And => {
                        if exit_code != 0 {
                            continue;
                        }
                    }
                    StatementOperator::Or => {
                        if exit_code == 0 {
                            continue;
                        }
                    }
                    StatementOperator::Semi => {
                        // Always execute
                    }
                }
            }

            let result = self.execute_pipeline_node(state, pipeline)?;
            stdout.push_str(&result.stdout);
            stderr.push_str(&result.stderr);
            exit_code = result.exit_code;
            last_executed_index = i as i32;
            last_pipeline_negated = pipeline.negated;

            update_exit_code(state, exit_code);
        }

        // Check errexit
        let was_short_circuited = last_executed_index < (stmt.pipelines.len() as i32 - 1);
        let inner_was_safe = state.errexit_safe.unwrap_or(false);

        if should_trigger_errexit(state, exit_code, was_short_circuited, last_pipeline_negated)
            && !inner_was_safe
        {
            return Err(InterpreterError::Errexit(ErrexitError::new(
                exit_code, stdout, stderr,
            )));
        }

        Ok(ExecResult::new(stdout, stderr, exit_code))
    }

    /// Execute a pipeline (list of commands connected by |).
    pub fn execute_pipeline_node(
        &mut self,
        state: &mut InterpreterState,
        pipeline: &PipelineNode,
    ) -> Result<ExecResult, InterpreterError> {
        let mut pipe_state = PipelineState::new();
        let pipe_stderr = pipeline.pipe_stderr.clone().unwrap_or_default();

        let options = PipelineOptions {
            pipefail: state.options.pipefail,
            lastpipe: state.shopt_options.lastpipe,
            runs_in_subshell: false,
            time_pipeline: pipeline.timed,
            time_posix_format: pipeline.time_posix,
        };

        let engine = &mut *self;
        let result = execute_pipeline(
            &mut pipe_state,
            &pipeline.commands,
            &pipe_stderr,
            &options,
            |cmd, stdin| engine.execute_command(state, cmd, stdin),
        )?;

        // Set PIPESTATUS
        set_pipestatus(&mut state.env, &result.pipestatus);

        let mut exec_result = result.to_exec_result();

        // Handle negation
        if pipeline.negated {
            exec_result.exit_code = if exec_result.exit_code == 0 { 1 } else { 0 };
        }

        Ok(exec_result)
    }

    /// Execute a single command.
    pub fn execute_command(
        &mut self,
        state: &mut InterpreterState,
        cmd: &CommandNode,
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        // Check command limit
        if let Some(msg) = check_command_limit(state, self.limits) {
            return Err(InterpreterError::ExecutionLimit(ExecutionLimitError::simple(
                msg,
                LimitType::Commands,
            )));
        }

        match cmd {
            CommandNode::Simple(simple) => self.execute_simple_command(state, simple, stdin),
            CommandNode::Compound(compound) => {
                self.execute_compound_command(state, compound, stdin)
            }
            CommandNode::FunctionDef(func_def) => {
                let current_source = state.current_source.clone();
                crate::interpreter::functions::execute_function_def(
                    state,
                    func_def,
                    current_source.as_deref(),
                )
                .map_err(InterpreterError::Exit)
            }
        }
    }

    /// Compute the effective stdin for a command, honoring `<`, `<<<` and
    /// heredoc redirections. Plain output redirections are left for
    /// `apply_redirections` to handle after the command has run.
    fn resolve_stdin(
        &self,
        state: &mut InterpreterState,
        redirections: &[crate::ast::types::RedirectionNode],
        stdin: &str,
    ) -> String {
        let mut effective = stdin.to_string();
        for redir in redirections {
            if redir.fd_variable.is_some() {
                continue;
            }
            match &redir.target {
                RedirectionTarget::HereDoc(heredoc) => {
                    if matches!(
                        redir.operator,
                        RedirectionOperator::DLess | RedirectionOperator::DLessDash
                    ) {
                        let mut content = expand_word(state, &heredoc.content, None).value;
                        if redir.operator == RedirectionOperator::DLessDash {
                            content = content
                                .lines()
                                .map(|l| l.trim_start_matches('\t'))
                                .collect::<Vec<_>>()
                                .join("\n");
                        }
                        if !content.is_empty() && !content.ends_with('\n') {
                            content.push('\n');
                        }
                        effective = content;
                    }
                }
                RedirectionTarget::Word(word) => match redir.operator {
                    RedirectionOperator::Less => {
                        let target = expand_word(state, word, None).value;
                        let path = self.fs.resolve_path(&state.cwd, &target);
                        effective = self
                            .fs
                            .read_file(&path)
                            .unwrap_or_default();
                    }
                    RedirectionOperator::TLess => {
                        let mut target = expand_word(state, word, None).value;
                        target.push('\n');
                        effective = target;
                    }
                    _ => {}
                },
            }
        }
        effective
    }

    /// Execute a simple command (name + args + redirections).
    pub fn execute_simple_command(
        &mut self,
        state: &mut InterpreterState,
        cmd: &SimpleCommandNode,
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        // Set line number for $LINENO
        if let Some(line) = cmd.line {
            state.current_line = line as u32;
        }

        let assignment_result =
            process_assignments(state, cmd, |s, w| expand_word(s, w, None).value);
        if let Some(error) = assignment_result.error {
            return Ok(error);
        }

        if cmd.name.is_none() {
            // Assignment-only command: the env mutation already happened above.
            return Ok(ExecResult::new(
                String::new(),
                assignment_result.xtrace_output,
                0,
            ));
        }

        // Expand command name
        let cmd_name = expand_word(state, cmd.name.as_ref().unwrap(), None).value;

        // Expand arguments
        let mut args: Vec<String> = Vec::new();
        for arg in &cmd.args {
            let result = expand_word_with_glob(state, arg, self.fs, None);
            if let Some(words) = result.split_words {
                args.extend(words);
            } else if !result.value.is_empty() {
                args.push(result.value);
            }
        }

        let effective_stdin = self.resolve_stdin(state, &cmd.redirections, stdin);

        let result = self.dispatch_command(state, &cmd_name, &args, &effective_stdin)?;

        // Restore temp (prefix) assignments now that the command has run.
        for (name, value) in assignment_result.temp_assignments {
            match value {
                Some(v) => {
                    state.env.insert(name, v);
                }
                None => {
                    state.env.remove(&name);
                }
            }
        }

        let mut result = result;
        result.stdout = format!("{}{}", assignment_result.xtrace_output, result.stdout);

        Ok(apply_redirections(
            state,
            self.fs,
            result,
            &cmd.redirections,
            None,
            |s, w| expand_word(s, w, None).value,
        ))
    }

    /// Resolve and run `cmd_name` through the builtin/function/registry chain.
    fn dispatch_command(
        &mut self,
        state: &mut InterpreterState,
        cmd_name: &str,
        args: &[String],
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        // POSIX special builtins always win over a same-named user function.
        if is_posix_special_builtin(cmd_name) {
            if let Some(result) = self.dispatch_special_builtin(state, cmd_name, args)? {
                return Ok(result);
            }
        }

        if is_function_defined(state, cmd_name) {
            let func = get_function(state, cmd_name).cloned().unwrap();
            let args = args.to_vec();
            let stdin = stdin.to_string();
            let call_line = Some(state.current_line);
            let max_depth = self.limits.max_recursion_depth;
            let engine = &mut *self;
            return call_function(
                state,
                &func,
                &args,
                &stdin,
                call_line,
                max_depth,
                |state, stdin| engine.execute_compound_command(state, &func.body, stdin),
            );
        }

        match cmd_name {
            ":" => return Ok(ExecResult::ok()),
            "cd" => return Ok(self.execute_cd(state, args)),
            "pwd" => {
                return Ok(ExecResult::new(format!("{}\n", state.cwd), String::new(), 0));
            }
            "read" => {
                let r = handle_read(state, args, stdin, 0);
                return Ok(ExecResult::new(r.stdout, r.stderr, r.exit_code));
            }
            "local" => {
                return Ok(handle_local(state, args));
            }
            "declare" | "typeset" => {
                let r = handle_declare(state, args);
                return Ok(ExecResult::new(r.stdout, r.stderr, r.exit_code));
            }
            "let" => {
                let (stdout, stderr, exit_code) = handle_let(state, args);
                return Ok(ExecResult::new(stdout, stderr, exit_code));
            }
            _ => {}
        }

        self.dispatch_registry(state, cmd_name, args, stdin)
    }

    /// Dispatch the subset of POSIX special builtins this engine implements.
    /// Returns `None` when `cmd_name` isn't one of them, so the caller falls
    /// through to function/registry dispatch.
    fn dispatch_special_builtin(
        &mut self,
        state: &mut InterpreterState,
        cmd_name: &str,
        args: &[String],
    ) -> Result<Option<ExecResult>, InterpreterError> {
        let result = match cmd_name {
            "break" => {
                let r = handle_break(state, args)?;
                ExecResult::new(r.stdout, r.stderr, r.exit_code)
            }
            "continue" => {
                let r = handle_continue(state, args)?;
                ExecResult::new(r.stdout, r.stderr, r.exit_code)
            }
            "return" => {
                let r = handle_return(state, args)?;
                ExecResult::new(r.stdout, r.stderr, r.exit_code)
            }
            "exit" => match handle_exit(state, args) {
                Ok(_) => unreachable!("handle_exit never returns Ok"),
                Err(e) => return Err(e),
            },
            "export" => {
                let r = handle_export(state, args);
                ExecResult::new(r.stdout, r.stderr, r.exit_code)
            }
            "readonly" => {
                let r = handle_readonly(state, args);
                ExecResult::new(r.stdout, r.stderr, r.exit_code)
            }
            "set" => {
                let r = handle_set(state, args)?;
                ExecResult::new(r.stdout, r.stderr, r.exit_code)
            }
            "shift" => {
                let r = handle_shift(state, args)?;
                ExecResult::new(r.stdout, r.stderr, r.exit_code)
            }
            "unset" => handle_unset(state, args),
            _ => return Ok(None),
        };
        Ok(Some(result))
    }

    fn execute_cd(&mut self, state: &mut InterpreterState, args: &[String]) -> ExecResult {
        let target = args
            .first()
            .map(|s| s.as_str())
            .or_else(|| state.env.get("HOME").map(|s| s.as_str()))
            .unwrap_or("/");

        let new_cwd = if target.starts_with('/') {
            target.to_string()
        } else {
            self.fs.resolve_path(&state.cwd, target)
        };

        let is_dir = self.fs.stat(&new_cwd).map(|s| s.is_directory).unwrap_or(false);
        if is_dir {
            state.cwd = new_cwd.clone();
            state.env.insert("PWD".to_string(), new_cwd);
            ExecResult::ok()
        } else {
            ExecResult::new(
                String::new(),
                format!("bash: cd: {}: No such file or directory\n", target),
                1,
            )
        }
    }

    /// Run `cmd_name` through the coreutils-style command registry.
    fn dispatch_registry(
        &mut self,
        state: &mut InterpreterState,
        cmd_name: &str,
        args: &[String],
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        let registry = CommandRegistry::with_defaults();
        let Some(command) = registry.get(cmd_name) else {
            return Ok(ExecResult::new(
                String::new(),
                format!("bash: {}: command not found\n", cmd_name),
                127,
            ));
        };

        let mut ctx = CommandContext {
            args: args.to_vec(),
            stdin: stdin.to_string(),
            cwd: state.cwd.clone(),
            env: build_exported_env(state),
            fs: self.fs.clone(),
            exec_fn: None,
            fetch_fn: None,
        };

        let result = command.execute(&mut ctx);
        *self.fs = ctx.fs;

        Ok(ExecResult::new(result.stdout, result.stderr, result.exit_code))
    }

    /// Execute a compound command (if, for, while, etc.).
    pub fn execute_compound_command(
        &mut self,
        state: &mut InterpreterState,
        compound: &CompoundCommandNode,
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        match compound {
            CompoundCommandNode::If(if_node) => {
                for clause in &if_node.clauses {
                    let mut cond_exit = 0;
                    for stmt in &clause.condition {
                        let res = self.execute_statement(state, stmt)?;
                        cond_exit = res.exit_code;
                    }
                    if cond_exit == 0 {
                        let mut stdout = String::new();
                        let mut stderr = String::new();
                        let mut exit_code = 0;
                        for stmt in &clause.body {
                            let res = self.execute_statement(state, stmt)?;
                            stdout.push_str(&res.stdout);
                            stderr.push_str(&res.stderr);
                            exit_code = res.exit_code;
                        }
                        return Ok(ExecResult::new(stdout, stderr, exit_code));
                    }
                }

                if let Some(ref else_body) = if_node.else_body {
                    let mut stdout = String::new();
                    let mut stderr = String::new();
                    let mut exit_code = 0;
                    for stmt in else_body {
                        let res = self.execute_statement(state, stmt)?;
                        stdout.push_str(&res.stdout);
                        stderr.push_str(&res.stderr);
                        exit_code = res.exit_code;
                    }
                    return Ok(ExecResult::new(stdout, stderr, exit_code));
                }

                Ok(ExecResult::ok())
            }

            CompoundCommandNode::For(for_node) => {
                // Expand words
                let mut words: Vec<String> = Vec::new();
                if let Some(ref word_list) = for_node.words {
                    for word in word_list {
                        let result = expand_word_with_glob(state, word, self.fs, None);
                        if let Some(split) = result.split_words {
                            words.extend(split);
                        } else if !result.value.is_empty() {
                            words.push(result.value);
                        }
                    }
                } else {
                    // Default to positional parameters
                    let argc: usize = state
                        .env
                        .get("#")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0);
                    for i in 1..=argc {
                        if let Some(val) = state.env.get(&i.to_string()) {
                            words.push(val.clone());
                        }
                    }
                }

                let mut stdout = String::new();
                let mut stderr = String::new();
                let mut exit_code = 0;
                let mut iterations: u64 = 0;
                state.loop_depth += 1;

                for word in &words {
                    if let Some(msg) = self.check_iteration_limit(&mut iterations) {
                        state.loop_depth -= 1;
                        return Err(InterpreterError::ExecutionLimit(ExecutionLimitError::simple(
                            msg,
                            LimitType::Iterations,
                        )));
                    }
                    state.env.insert(for_node.variable.clone(), word.clone());

                    match self.run_loop_body(state, &for_node.body, &mut stdout, &mut stderr, &mut exit_code) {
                        LoopSignal::Continue => continue,
                        LoopSignal::Break => break,
                        LoopSignal::Propagate(e) => {
                            state.loop_depth -= 1;
                            return Err(e);
                        }
                    }
                }

                state.loop_depth -= 1;
                Ok(ExecResult::new(stdout, stderr, exit_code))
            }

            CompoundCommandNode::While(while_node) => self.run_conditional_loop(
                state,
                &while_node.condition,
                &while_node.body,
                true,
            ),

            CompoundCommandNode::Until(until_node) => self.run_conditional_loop(
                state,
                &until_node.condition,
                &until_node.body,
                false,
            ),

            CompoundCommandNode::CStyleFor(cfor) => {
                use crate::interpreter::arithmetic::evaluate_arithmetic;

                if let Some(ref init) = cfor.init {
                    let mut ctx = InterpreterContext::new(state, self.limits);
                    let _ = evaluate_arithmetic(&mut ctx, &init.expression, false, None);
                }

                let mut stdout = String::new();
                let mut stderr = String::new();
                let mut exit_code = 0;
                let mut iterations: u64 = 0;
                state.loop_depth += 1;

                loop {
                    if let Some(ref cond) = cfor.condition {
                        let mut ctx = InterpreterContext::new(state, self.limits);
                        let cond_val =
                            evaluate_arithmetic(&mut ctx, &cond.expression, false, None).unwrap_or(0);
                        if cond_val == 0 {
                            break;
                        }
                    }

                    if let Some(msg) = self.check_iteration_limit(&mut iterations) {
                        state.loop_depth -= 1;
                        return Err(InterpreterError::ExecutionLimit(ExecutionLimitError::simple(
                            msg,
                            LimitType::Iterations,
                        )));
                    }

                    match self.run_loop_body(state, &cfor.body, &mut stdout, &mut stderr, &mut exit_code) {
                        LoopSignal::Continue => {}
                        LoopSignal::Break => break,
                        LoopSignal::Propagate(e) => {
                            state.loop_depth -= 1;
                            return Err(e);
                        }
                    }

                    if let Some(ref update) = cfor.update {
                        let mut ctx = InterpreterContext::new(state, self.limits);
                        let _ = evaluate_arithmetic(&mut ctx, &update.expression, false, None);
                    }
                }

                state.loop_depth -= 1;
                Ok(ExecResult::new(stdout, stderr, exit_code))
            }

            CompoundCommandNode::Case(case_node) => {
                let word = expand_word(state, &case_node.word, None).value;

                let mut stdout = String::new();
                let mut stderr = String::new();
                let mut exit_code = 0;
                let nocasematch = state.shopt_options.nocasematch;
                let extglob = state.shopt_options.extglob;

                let mut i = 0;
                while i < case_node.items.len() {
                    let item = &case_node.items[i];
                    let matched = item.patterns.iter().any(|p| {
                        let pattern = expand_word(state, p, None).value;
                        match_pattern(&word, &pattern, nocasematch, extglob)
                    });

                    if matched {
                        for stmt in &item.body {
                            let res = self.execute_statement(state, stmt)?;
                            stdout.push_str(&res.stdout);
                            stderr.push_str(&res.stderr);
                            exit_code = res.exit_code;
                        }

                        let mut terminator = item.terminator;
                        let mut next = i + 1;
                        // ";&" keeps falling into following bodies unconditionally;
                        // ";;&" resumes normal pattern testing from the next item.
                        while terminator == CaseTerminator::SemiAnd && next < case_node.items.len() {
                            let item = &case_node.items[next];
                            for stmt in &item.body {
                                let res = self.execute_statement(state, stmt)?;
                                stdout.push_str(&res.stdout);
                                stderr.push_str(&res.stderr);
                                exit_code = res.exit_code;
                            }
                            terminator = item.terminator;
                            next += 1;
                        }

                        if terminator == CaseTerminator::SemiSemiAnd {
                            i = next;
                            continue;
                        }
                        break;
                    }

                    i += 1;
                }

                Ok(ExecResult::new(stdout, stderr, exit_code))
            }

            CompoundCommandNode::Subshell(subshell_node) => {
                let engine = &mut *self;
                execute_subshell(state, &subshell_node.body, Some(stdin), |state, stmt| {
                    engine.execute_statement(state, stmt)
                })
            }

            CompoundCommandNode::Group(group_node) => {
                let engine = &mut *self;
                execute_group(state, &group_node.body, Some(stdin), |state, stmt| {
                    engine.execute_statement(state, stmt)
                })
            }

            CompoundCommandNode::ArithmeticCommand(arith) => {
                use crate::interpreter::arithmetic::evaluate_arithmetic;

                let mut ctx = InterpreterContext::new(state, self.limits);
                match evaluate_arithmetic(&mut ctx, &arith.expression.expression, false, None) {
                    Ok(value) => {
                        // Arithmetic command: exit 0 if non-zero, exit 1 if zero
                        let exit_code = if value != 0 { 0 } else { 1 };
                        Ok(ExecResult::new(String::new(), String::new(), exit_code))
                    }
                    Err(e) => Ok(ExecResult::new(String::new(), format!("bash: {}\n", e), 1)),
                }
            }

            CompoundCommandNode::ConditionalCommand(cond) => {
                let matched = evaluate_conditional_expression(
                    state,
                    self.fs,
                    &cond.expression,
                    &|s, w| expand_word(s, w, None).value,
                );
                Ok(ExecResult::new(
                    String::new(),
                    String::new(),
                    if matched { 0 } else { 1 },
                ))
            }
        }
    }

    fn check_iteration_limit(&self, iterations: &mut u64) -> Option<String> {
        *iterations += 1;
        if *iterations > self.limits.max_iterations {
            Some(format!(
                "too many loop iterations (>{}), increase executionLimits.maxIterations",
                self.limits.max_iterations
            ))
        } else {
            None
        }
    }

    /// Run a `while`/`until` loop: re-evaluate `condition` every iteration and
    /// stop when its exit code no longer matches `run_while_true`.
    fn run_conditional_loop(
        &mut self,
        state: &mut InterpreterState,
        condition: &[StatementNode],
        body: &[StatementNode],
        run_while_true: bool,
    ) -> Result<ExecResult, InterpreterError> {
        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        let mut iterations: u64 = 0;
        state.loop_depth += 1;

        loop {
            let mut cond_exit = 0;
            for stmt in condition {
                let res = self.execute_statement(state, stmt)?;
                cond_exit = res.exit_code;
            }

            let keep_going = if run_while_true { cond_exit == 0 } else { cond_exit != 0 };
            if !keep_going {
                break;
            }

            if let Some(msg) = self.check_iteration_limit(&mut iterations) {
                state.loop_depth -= 1;
                return Err(InterpreterError::ExecutionLimit(ExecutionLimitError::simple(
                    msg,
                    LimitType::Iterations,
                )));
            }

            match self.run_loop_body(state, body, &mut stdout, &mut stderr, &mut exit_code) {
                LoopSignal::Continue => continue,
                LoopSignal::Break => break,
                LoopSignal::Propagate(e) => {
                    state.loop_depth -= 1;
                    return Err(e);
                }
            }
        }

        state.loop_depth -= 1;
        Ok(ExecResult::new(stdout, stderr, exit_code))
    }

    /// Run one iteration of a loop body, translating `break`/`continue`
    /// signals targeted at this loop level into control flow, and
    /// decrementing outer-loop signals so they keep propagating.
    fn run_loop_body(
        &mut self,
        state: &mut InterpreterState,
        body: &[StatementNode],
        stdout: &mut String,
        stderr: &mut String,
        exit_code: &mut i32,
    ) -> LoopSignal {
        for stmt in body {
            match self.execute_statement(state, stmt) {
                Ok(res) => {
                    stdout.push_str(&res.stdout);
                    stderr.push_str(&res.stderr);
                    *exit_code = res.exit_code;
                }
                Err(InterpreterError::Break(mut e)) => {
                    stdout.push_str(&e.stdout);
                    stderr.push_str(&e.stderr);
                    e.stdout.clear();
                    e.stderr.clear();
                    if e.levels > 1 {
                        e.levels -= 1;
                        return LoopSignal::Propagate(InterpreterError::Break(e));
                    }
                    return LoopSignal::Break;
                }
                Err(InterpreterError::Continue(mut e)) => {
                    stdout.push_str(&e.stdout);
                    stderr.push_str(&e.stderr);
                    e.stdout.clear();
                    e.stderr.clear();
                    if e.levels > 1 {
                        e.levels -= 1;
                        return LoopSignal::Propagate(InterpreterError::Continue(e));
                    }
                    return LoopSignal::Continue;
                }
                Err(e) => return LoopSignal::Propagate(e),
            }
        }
        LoopSignal::Continue
    }
}

/// Outcome of running one loop-body iteration.
enum LoopSignal {
    Continue,
    Break,
    Propagate(InterpreterError),
}

// ============================================================================
// Tests
// ============================================================================
