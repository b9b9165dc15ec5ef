//! End-to-end runs over substitute probes
//!
//! The host running these tests is not a sandbox, so each scenario swaps in
//! probes that replay what a given sandbox would answer and drives them
//! through the real run loop and text reporter.

use nix::errno::Errno;
use sandprobe_core::probes::{REFUSED, REMOVED, expect_denied, expect_errno};
use sandprobe_core::report::TextReporter;
use sandprobe_core::{Failure, JailConfig, Registry, RunSummary, Verdict, run};
use std::cell::Cell;
use std::rc::Rc;

/// Answers of a sandbox, one per reference probe
#[derive(Clone, Copy)]
struct Sandbox {
    layout_ok: bool,
    fork: nix::Result<()>,
    kill: nix::Result<()>,
    waitpid: nix::Result<()>,
    wait4: nix::Result<()>,
    umount: nix::Result<()>,
    pipe: nix::Result<()>,
    dlopen_path: bool,
    dlopen_name: bool,
    chmod: nix::Result<()>,
}

impl Sandbox {
    const COMPLIANT: Self = Self {
        layout_ok: true,
        fork: Err(Errno::ENOSYS),
        kill: Err(Errno::ENOSYS),
        waitpid: Err(Errno::ENOSYS),
        wait4: Err(Errno::ENOSYS),
        umount: Err(Errno::ENOSYS),
        pipe: Err(Errno::ENOSYS),
        dlopen_path: true,
        dlopen_name: true,
        chmod: Err(Errno::EACCES),
    };

    /// Same names and order as `Registry::reference`
    fn registry(self, config: &JailConfig) -> Registry {
        let names: Vec<String> = Registry::reference(config).names().map(String::from).collect();
        let mut registry = Registry::new();
        registry
            .register(names[0].clone(), move |config| {
                Ok(if self.layout_ok {
                    Verdict::Pass
                } else {
                    Verdict::Fail(Failure::layout(format!(
                        "missing directory: {}",
                        config.virtual_root.join("lib").display()
                    )))
                })
            })
            .register(names[1].clone(), move |_| {
                Ok(expect_denied("fork", self.fork, REMOVED).into())
            })
            .register(names[2].clone(), move |_| {
                Ok(expect_errno("kill", self.kill, REMOVED).into())
            })
            .register(names[3].clone(), move |_| {
                Ok(expect_errno("waitpid", self.waitpid, REMOVED)
                    .and_then(|()| expect_errno("wait4", self.wait4, REMOVED))
                    .into())
            })
            .register(names[4].clone(), move |_| {
                Ok(expect_errno("umount", self.umount, REMOVED).into())
            })
            .register(names[5].clone(), move |_| {
                Ok(expect_errno("pipe", self.pipe, REMOVED).into())
            })
            .register(names[6].clone(), move |_| Ok(load(self.dlopen_path)))
            .register(names[7].clone(), move |_| Ok(load(self.dlopen_name)))
            .register(names[8].clone(), move |_| {
                Ok(expect_errno("chmod", self.chmod, REFUSED).into())
            });
        registry
    }
}

fn load(ok: bool) -> Verdict {
    if ok {
        Verdict::Pass
    } else {
        Verdict::Fail(Failure::operation_failed(
            "dlopen failed with: libz.so.1: cannot open shared object file: No such file or directory",
        ))
    }
}

fn run_text(registry: &Registry) -> (RunSummary, Vec<String>) {
    let mut reporter = TextReporter::new(Vec::new());
    let summary = run(registry, &JailConfig::default(), &mut reporter).unwrap();
    let out = String::from_utf8(reporter.into_inner()).unwrap();
    (summary, out.lines().map(String::from).collect())
}

fn failing_lines(lines: &[String]) -> Vec<&str> {
    lines
        .iter()
        .map(String::as_str)
        .filter(|l| l.starts_with("ERR"))
        .collect()
}

#[test]
fn compliant_sandbox_passes_everything() {
    let registry = Sandbox::COMPLIANT.registry(&JailConfig::default());
    let (summary, lines) = run_text(&registry);

    assert_eq!(summary.exit_code(), 0);
    assert_eq!(lines.len(), 10);
    assert!(lines[..9].iter().all(|l| l.starts_with("ok   ")));
    assert_eq!(lines[9], "9 succeeded, 0 skipped, 0 failed");
}

#[test]
fn fork_breach_is_reported() {
    let sandbox = Sandbox {
        fork: Ok(()),
        ..Sandbox::COMPLIANT
    };
    let (summary, lines) = run_text(&sandbox.registry(&JailConfig::default()));

    assert_eq!(summary.exit_code(), 1);
    assert_eq!(
        failing_lines(&lines),
        ["ERR  no_fork(): fork succeeded when expected ENOSYS"]
    );
    assert_eq!(lines.last().unwrap(), "8 succeeded, 0 skipped, 1 failed");
}

#[test]
fn fork_refused_for_other_reasons_still_passes() {
    let sandbox = Sandbox {
        fork: Err(Errno::EAGAIN),
        ..Sandbox::COMPLIANT
    };
    let (summary, _) = run_text(&sandbox.registry(&JailConfig::default()));
    assert_eq!(summary.failed, 0);
}

#[test]
fn chmod_success_is_reported() {
    let sandbox = Sandbox {
        chmod: Ok(()),
        ..Sandbox::COMPLIANT
    };
    let (summary, lines) = run_text(&sandbox.registry(&JailConfig::default()));

    assert_eq!(summary.exit_code(), 1);
    assert_eq!(
        failing_lines(&lines),
        ["ERR  no_chmod(/python/bin, 0777): chmod succeeded when expected EACCES"]
    );
}

#[test]
fn chmod_missing_instead_of_refused_is_reported() {
    let sandbox = Sandbox {
        chmod: Err(Errno::ENOSYS),
        ..Sandbox::COMPLIANT
    };
    let (summary, lines) = run_text(&sandbox.registry(&JailConfig::default()));

    assert_eq!(summary.failed, 1);
    let line = failing_lines(&lines)[0];
    assert!(line.contains(Errno::ENOSYS.desc()));
    assert!(line.ends_with("when expected EACCES"));
}

#[test]
fn missing_directory_does_not_stop_later_probes() {
    let sandbox = Sandbox {
        layout_ok: false,
        ..Sandbox::COMPLIANT
    };
    let (summary, lines) = run_text(&sandbox.registry(&JailConfig::default()));

    assert_eq!(
        lines[0],
        "ERR  filesystem_jail(/python): missing directory: /python/lib"
    );
    assert_eq!(summary.total(), 9);
    assert_eq!(summary.ok, 8);
    assert_eq!(summary.skipped, 0);
}

#[test]
fn search_path_misconfiguration_isolated() {
    let sandbox = Sandbox {
        dlopen_name: false,
        ..Sandbox::COMPLIANT
    };
    let (summary, lines) = run_text(&sandbox.registry(&JailConfig::default()));

    assert!(lines.contains(&"ok   dlopen(/slib/libz.so.1)".to_string()));
    let failed = failing_lines(&lines);
    assert_eq!(failed.len(), 1);
    assert!(failed[0].starts_with("ERR  dlopen(libz.so.1): dlopen failed with: "));
    assert_eq!(summary.exit_code(), 1);
}

#[test]
fn wait4_checked_after_waitpid() {
    let sandbox = Sandbox {
        wait4: Err(Errno::ECHILD),
        ..Sandbox::COMPLIANT
    };
    let (_, lines) = run_text(&sandbox.registry(&JailConfig::default()));
    let failed = failing_lines(&lines);
    assert_eq!(failed.len(), 1);
    assert!(failed[0].contains("wait4 failed with"));
}

#[test]
fn every_probe_runs_even_when_all_fail() {
    let calls = Rc::new(Cell::new(0));
    let mut registry = Registry::new();
    for i in 0..5 {
        let calls = Rc::clone(&calls);
        registry.register(format!("broken_{i}()"), move |_| {
            calls.set(calls.get() + 1);
            if i % 2 == 0 {
                panic!("probe {i} blew up");
            }
            Ok(Verdict::Fail(Failure::internal("nope")))
        });
    }

    let (summary, lines) = run_text(&registry);
    assert_eq!(calls.get(), 5);
    assert_eq!(summary.failed, 5);
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "ERR  broken_0(): probe panicked: probe 0 blew up");
}

#[test]
fn skips_are_counted_but_never_fail_the_run() {
    let mut registry = Registry::new();
    registry
        .register("pass()", |_| Ok(Verdict::Pass))
        .register("skip()", |_| Ok(Verdict::Skip(String::new())))
        .register("skip_why()", |_| Ok(Verdict::Skip("not in this build".into())));

    let (summary, lines) = run_text(&registry);
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(summary.total(), registry.len());
    assert_eq!(lines[1], "SKIP skip()");
    assert_eq!(lines[2], "SKIP skip_why(): not in this build");
    assert_eq!(lines[3], "1 succeeded, 2 skipped, 0 failed");
}

#[test]
fn repeated_runs_are_identical() {
    let sandbox = Sandbox {
        umount: Err(Errno::EPERM),
        ..Sandbox::COMPLIANT
    };
    let registry = sandbox.registry(&JailConfig::default());

    let first = run_text(&registry);
    let second = run_text(&registry);
    assert_eq!(first, second);
}
