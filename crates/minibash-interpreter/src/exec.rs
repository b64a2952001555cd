//! Process composition: fork/exec, pipelines, redirected statements.
//!
//! Descriptor discipline follows the shell contract: every pipe endpoint
//! is closed in each child after duping and in the parent after the last
//! fork. Pipe endpoints are `OwnedFd`, so the parent-side close is a
//! drop. Foreground waits run with SIGCHLD blocked and retry on EINTR.

use std::ffi::CString;
use std::io::Write;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use minibash_syntax::{Node, NodeKind};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{close, dup2, execv, execvp, fork, ForkResult, Pid};

use crate::builtins;
use crate::redirect;
use crate::signals;
use crate::Interpreter;

/// Map a wait status onto a shell exit code: the exit code itself, or
/// 128 plus the signal number for a signal death.
fn status_code(status: WaitStatus) -> i32 {
    match status {
        WaitStatus::Exited(_, code) => code,
        WaitStatus::Signaled(_, signal, _) => 128 + signal as i32,
        _ => 1,
    }
}

/// Synchronous wait for one foreground child.
///
/// SIGCHLD is blocked here, so the handler cannot have reaped the child;
/// any error other than EINTR means the engine lost track of a process.
fn wait_foreground(pid: Pid) -> i32 {
    debug_assert!(signals::sigchld_is_blocked());
    loop {
        match waitpid(pid, None) {
            Ok(status) => return status_code(status),
            Err(Errno::EINTR) => continue,
            Err(err) => panic!("waitpid on foreground child {pid} failed: {err}"),
        }
    }
}

/// Best-effort reap of a child whose status we do not need.
pub(crate) fn reap(pid: Pid) {
    loop {
        match waitpid(pid, None) {
            Err(Errno::EINTR) => continue,
            _ => return,
        }
    }
}

/// Exec `argv` in the current (forked) process. PATH resolution applies
/// only when the program name has no slash. Exits 127 when exec fails.
fn exec_program(argv: &[String]) -> ! {
    let args: Vec<CString> = argv
        .iter()
        .map(|arg| CString::new(arg.as_str()).unwrap_or_default())
        .collect();
    if argv[0].contains('/') {
        let _ = execv(&args[0], &args);
    } else {
        let _ = execvp(&args[0], &args);
    }
    std::process::exit(127);
}

/// dup `fd` onto `target` and close the original.
fn wire_fd(fd: Option<RawFd>, target: RawFd) {
    if let Some(fd) = fd {
        if fd != target {
            let _ = dup2(fd, target);
            let _ = close(fd);
        }
    }
}

impl Interpreter {
    /// A command statement with no enclosing pipeline or statement-level
    /// redirect. `echo` runs in-process here; everything else forks.
    pub(crate) fn run_simple_command(&mut self, input: &str, command: Node) -> i32 {
        let argv = match self.expand_to_argv(input, command) {
            Ok(argv) => argv,
            Err(err) => {
                eprintln!("minibash: {err}");
                return 1;
            }
        };
        if argv.is_empty() {
            return 1;
        }
        if argv[0] == builtins::ECHO {
            let _ = builtins::echo(&argv[1..], &mut std::io::stdout());
            return 0;
        }

        let plan = self.redirect_plan(input, command);
        let _ = std::io::stdout().flush();
        match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                if redirect::apply_in_child(&plan).is_err() {
                    std::process::exit(1);
                }
                exec_program(&argv)
            }
            Ok(ForkResult::Parent { child }) => wait_foreground(child),
            Err(err) => {
                eprintln!("minibash: fork failed: {err}");
                1
            }
        }
    }

    /// Run a single command with externally supplied stdin/stdout, as the
    /// body of a redirected statement. Always forks; the child applies
    /// the command's own redirect plan after the dup, so command-level
    /// clauses land on top of the statement-level descriptors.
    pub(crate) fn run_command_with_io(
        &mut self,
        input: &str,
        command: Node,
        stdin_fd: Option<RawFd>,
        stdout_fd: Option<RawFd>,
    ) -> i32 {
        let _ = std::io::stdout().flush();
        match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                wire_fd(stdin_fd, 0);
                wire_fd(stdout_fd, 1);
                self.exec_command_in_child(input, command)
            }
            Ok(ForkResult::Parent { child }) => wait_foreground(child),
            Err(err) => {
                eprintln!("minibash: fork failed: {err}");
                1
            }
        }
    }

    /// Run a pipeline, optionally with externally supplied descriptors
    /// for stage 0's stdin and the last stage's stdout. The status is the
    /// last stage's; earlier stages are waited for but their codes are
    /// observable only through side effects.
    pub(crate) fn run_pipeline_with_io(
        &mut self,
        input: &str,
        pipeline: Node,
        stdin_fd: Option<RawFd>,
        stdout_fd: Option<RawFd>,
    ) -> i32 {
        let stages = self.pipeline_stages(pipeline);
        let count = stages.len();
        if count == 0 {
            return 0;
        }
        log::debug!("pipeline with {count} stages");

        let mut pipes: Vec<(OwnedFd, OwnedFd)> = Vec::with_capacity(count - 1);
        for _ in 1..count {
            match nix::unistd::pipe() {
                Ok(ends) => pipes.push(ends),
                Err(err) => {
                    eprintln!("minibash: pipe failed: {err}");
                    return 1;
                }
            }
        }

        let _ = std::io::stdout().flush();
        let mut pids: Vec<Pid> = Vec::with_capacity(count);
        for (i, stage) in stages.iter().enumerate() {
            match unsafe { fork() } {
                Ok(ForkResult::Child) => {
                    if i == 0 {
                        wire_fd(stdin_fd, 0);
                    } else {
                        let _ = dup2(pipes[i - 1].0.as_raw_fd(), 0);
                    }
                    if i == count - 1 {
                        wire_fd(stdout_fd, 1);
                    } else {
                        let _ = dup2(pipes[i].1.as_raw_fd(), 1);
                    }
                    for (reader, writer) in &pipes {
                        let _ = close(reader.as_raw_fd());
                        let _ = close(writer.as_raw_fd());
                    }
                    self.exec_command_in_child(input, *stage)
                }
                Ok(ForkResult::Parent { child }) => pids.push(child),
                Err(err) => {
                    eprintln!("minibash: fork failed: {err}");
                    drop(pipes);
                    for pid in &pids {
                        reap(*pid);
                    }
                    return 1;
                }
            }
        }

        // The parent holds no pipe endpoints past this point; a reader
        // stage would otherwise never see EOF.
        drop(pipes);

        let mut status = 1;
        for (i, pid) in pids.iter().enumerate() {
            let code = wait_foreground(*pid);
            if i == count - 1 {
                status = code;
            }
        }
        status
    }

    /// A `redirected_statement`: open the plan in the parent, run the
    /// body with those descriptors, close our copies after the wait.
    pub(crate) fn run_redirected_statement(&mut self, input: &str, statement: Node) -> i32 {
        let plan = self.redirect_plan(input, statement);
        let Ok((stdin_file, stdout_file)) = redirect::open_in_parent(&plan) else {
            return 1;
        };
        let stdin_fd = stdin_file.as_ref().map(|file| file.as_raw_fd());
        let stdout_fd = stdout_file.as_ref().map(|file| file.as_raw_fd());

        let Some(body) = statement.child_by_field_id(self.registry.fields.body) else {
            return 1;
        };
        match self.registry.kind_of(body) {
            NodeKind::Command => self.run_command_with_io(input, body, stdin_fd, stdout_fd),
            NodeKind::Pipeline => self.run_pipeline_with_io(input, body, stdin_fd, stdout_fd),
            other => {
                log::warn!("redirected statement with unexpected body {other:?}");
                1
            }
        }
    }

    /// Runs in a forked child whose stdin/stdout are already wired: apply
    /// the command's own redirects, then a builtin or exec. Never returns.
    fn exec_command_in_child(&mut self, input: &str, command: Node) -> ! {
        let plan = self.redirect_plan(input, command);
        if redirect::apply_in_child(&plan).is_err() {
            std::process::exit(1);
        }
        let argv = match self.expand_to_argv(input, command) {
            Ok(argv) if !argv.is_empty() => argv,
            Ok(_) => std::process::exit(127),
            Err(err) => {
                eprintln!("minibash: {err}");
                std::process::exit(1);
            }
        };
        if argv[0] == builtins::ECHO {
            let _ = builtins::echo(&argv[1..], &mut std::io::stdout());
            std::process::exit(0);
        }
        exec_program(&argv)
    }

    /// Collect the pipeline's `command` stages in source order,
    /// flattening the grammar's left-nested pipeline nodes.
    fn pipeline_stages<'tree>(&self, pipeline: Node<'tree>) -> Vec<Node<'tree>> {
        let mut stages = Vec::new();
        self.collect_stages(pipeline, &mut stages);
        stages
    }

    fn collect_stages<'tree>(&self, node: Node<'tree>, stages: &mut Vec<Node<'tree>>) {
        for i in 0..node.named_child_count() {
            let Some(child) = node.named_child(i) else { continue };
            match self.registry.kind_of(child) {
                NodeKind::Command => stages.push(child),
                NodeKind::Pipeline => self.collect_stages(child, stages),
                _ => {}
            }
        }
    }
}
