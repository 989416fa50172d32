#![cfg(test)] // workaround for https://github.com/rust-lang/rust-clippy/issues/11024

mod helpers;

use helpers::printed_optval;
use helpers::run_solver;
use helpers::run_solver_with_options;
use helpers::temporary_path;
use regex::Regex;

const LOG_MODEL: &str = "\
# max x s.t. log(1 + x) <= 2
dimensions 1 0 1
precision 1e-3
bound nc 0 0 10
objective numer nc=1
constraint 0 le 2 nc=0
logterm 0 plus nc=1 const=1
";

const INFEASIBLE_MODEL: &str = "\
dimensions 1 0 1
bound nc 0 0 10
objective numer nc=1
constraint 0 ge 100 nc=1
";

#[test]
fn optimal_result_is_printed() {
    let run = run_solver("cli-optimal", LOG_MODEL);
    assert!(run.status.success(), "{}", run.stderr);

    assert!(run.stdout.contains("status: Optimal\n"));
    let optval = printed_optval(&run.stdout);
    let ceiling = 2.0_f64.exp() - 1.0;
    assert!(optval <= ceiling + 1e-6);
    assert!(optval >= ceiling - 1.1e-3);

    let precision = Regex::new(r"precision: eta = 0\.001, epsilon = \S+").expect("valid regex");
    assert!(precision.is_match(&run.stdout));
    let iterations =
        Regex::new(r"iterations: \d+ \(solution found in iteration \d+\)").expect("valid regex");
    assert!(iterations.is_match(&run.stdout));

    run.files.cleanup().expect("files are removed");
}

#[test]
fn infeasible_result_is_printed() {
    let run = run_solver("cli-infeasible", INFEASIBLE_MODEL);
    assert!(run.status.success(), "{}", run.stderr);

    assert!(run.stdout.contains("status: Infeasible\n"));
    assert!(!run.stdout.contains("optval"));
    assert!(run.stdout.contains("iterations: 1 "));

    run.files.cleanup().expect("files are removed");
}

#[test]
fn arguments_override_the_model_precision() {
    let run = run_solver_with_options("cli-precision", LOG_MODEL, ["--eta", "0.01"]);
    assert!(run.status.success(), "{}", run.stderr);

    assert!(run.stdout.contains("precision: eta = 0.01, epsilon = 0.00001"));
    let optval = printed_optval(&run.stdout);
    assert!(optval >= 2.0_f64.exp() - 1.0 - 1.1e-2);

    run.files.cleanup().expect("files are removed");
}

#[test]
fn statistics_are_logged_with_a_prefix() {
    let run = run_solver_with_options("cli-statistics", LOG_MODEL, ["-s"]);
    assert!(run.status.success(), "{}", run.stderr);

    let statistic = Regex::new(r"(?m)^%%%sit-stat: engineRegionsBounded=\d+$").expect("valid regex");
    assert!(statistic.is_match(&run.stdout), "{}", run.stdout);
    assert!(run.stdout.contains("%%%sit-stat-end"));

    run.files.cleanup().expect("files are removed");
}

#[test]
fn invalid_model_fails_with_the_line_number() {
    let model = "dimensions 1 0 1\nbound nc 0 0 10\nconstraint 0 lt 2 nc=1\n";
    let run = run_solver("cli-invalid", model);
    assert!(!run.status.success());
    assert!(run.stdout.contains("line 3"), "{}", run.stdout);

    run.files.cleanup().expect("files are removed");
}

#[test]
fn checkpoint_is_removed_unless_kept() {
    let checkpoint = temporary_path("cli-checkpoint", "ckpt");
    let checkpoint_arg = checkpoint.display().to_string();

    let run = run_solver_with_options(
        "cli-checkpoint",
        LOG_MODEL,
        [
            "--checkpoint",
            checkpoint_arg.as_str(),
            "--checkpoint-interval",
            "0",
            "--keep-checkpoint",
        ],
    );
    assert!(run.status.success(), "{}", run.stderr);
    assert!(checkpoint.exists());
    run.files.cleanup().expect("files are removed");

    let run = run_solver_with_options(
        "cli-checkpoint",
        LOG_MODEL,
        ["--checkpoint", checkpoint_arg.as_str(), "--checkpoint-interval", "0"],
    );
    assert!(run.status.success(), "{}", run.stderr);
    assert!(run.stdout.contains("status: Optimal\n"));
    assert!(!checkpoint.exists());
    run.files.cleanup().expect("files are removed");
}
