//! Integration tests for Kiln

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn kiln() -> Command {
        cargo_bin_cmd!("kiln")
    }

    /// Kiln isolated from the user's config, rooted at `project`
    fn kiln_in(project: &Path) -> Command {
        let mut cmd = kiln();
        cmd.current_dir(project)
            .env_remove("RUST_LOG")
            .env("KILN_CONFIG", project.join("global-config.toml"))
            .arg("--no-local")
            .arg("--project")
            .arg(project);
        cmd
    }

    fn with_cache(project: &Path, build: &str) {
        let dir = project.join("build/conan").join(build);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("conan_toolchain.cmake"), "").unwrap();
    }

    #[test]
    fn help_displays() {
        kiln()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build configuration"));
    }

    #[test]
    fn version_displays() {
        kiln()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("kiln"));
    }

    #[test]
    fn incompatible_options_rejected() {
        let temp = TempDir::new().unwrap();
        with_cache(temp.path(), "release");

        kiln_in(temp.path())
            .args(["--dry-run", "configure", "--build", "Release"])
            .args(["--isolation", "Hardware", "--sanitiser", "Thread"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("incompatible"));

        assert!(!temp.path().join("build/release-sgx-hw").exists());
    }

    #[test]
    fn unknown_build_type_rejected() {
        kiln()
            .args(["configure", "--build", "Fast"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unrecognised build type: Fast"));
    }

    #[test]
    fn unknown_isolation_mode_rejected() {
        kiln()
            .args(["tools", "--isolation", "Partial"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unrecognised isolation mode: Partial"));
    }

    #[test]
    fn configure_without_cache_points_at_deps() {
        let temp = TempDir::new().unwrap();

        kiln_in(temp.path())
            .args(["--dry-run", "configure"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Expected dependency cache"))
            .stderr(predicate::str::contains("kiln deps"));
    }

    #[test]
    fn configure_after_interrupted_install_points_at_deps() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("build/conan/debug")).unwrap();

        kiln_in(temp.path())
            .args(["--dry-run", "configure"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("kiln deps"));
    }

    #[test]
    fn dry_run_configure_prints_cmake_command() {
        let temp = TempDir::new().unwrap();
        with_cache(temp.path(), "debug");

        kiln_in(temp.path())
            .args(["--dry-run", "configure", "--isolation", "Simulation", "--perf"])
            .assert()
            .success()
            .stdout(predicate::str::contains("-GNinja"))
            .stdout(predicate::str::contains("-DCMAKE_BUILD_TYPE=Debug"))
            .stdout(predicate::str::contains("-DFAASM_PERF_PROFILING=ON"))
            .stdout(predicate::str::contains("-DFAASM_SGX_MODE=Simulation"))
            .stdout(predicate::str::contains("USE_SANITISER").not())
            .stdout(predicate::str::contains("USE_SPINLOCK").not())
            .stdout(predicate::str::contains("Would link"));

        // Directories are still created; the link is not
        assert!(temp.path().join("build/debug-sgx-sim").is_dir());
        assert!(!temp.path().join("build/bin").exists());
    }

    #[test]
    fn dry_run_tools_runs_whole_pipeline() {
        let temp = TempDir::new().unwrap();

        kiln_in(temp.path())
            .args(["--dry-run", "tools", "--parallel", "8"])
            .assert()
            .success()
            .stdout(predicate::str::contains("conan remote list"))
            .stdout(predicate::str::contains("conan lock create"))
            .stdout(predicate::str::contains("--build=missing"))
            .stdout(predicate::str::contains("--target codegen_func"))
            .stdout(predicate::str::contains("--parallel 8"));
    }

    #[test]
    fn dry_run_clean_keeps_lockfile() {
        let temp = TempDir::new().unwrap();
        let lockfile = temp.path().join("conan-debug.lock");
        std::fs::write(&lockfile, "{}").unwrap();

        kiln_in(temp.path())
            .args(["--dry-run", "deps", "--clean"])
            .assert()
            .success()
            .stdout(predicate::str::contains("'--build=*'"));

        assert!(lockfile.exists());
    }

    #[test]
    fn cc_without_build_directory_fails() {
        let temp = TempDir::new().unwrap();

        kiln_in(temp.path())
            .args(["--dry-run", "cc", "tests"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("No build directory found"))
            .stderr(predicate::str::contains("kiln configure"));
    }

    #[test]
    fn dry_run_cc_all_has_no_target_flag() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("build/release")).unwrap();

        kiln_in(temp.path())
            .args(["--dry-run", "cc", "all"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cmake --build ."))
            .stdout(predicate::str::contains("--target").not());
    }

    #[test]
    fn dry_run_coverage_prints_both_steps() {
        let temp = TempDir::new().unwrap();

        kiln_in(temp.path())
            .args(["--dry-run", "coverage", "raw.profraw", "report.txt"])
            .assert()
            .success()
            .stdout(predicate::str::contains("llvm-profdata-17 merge -sparse"))
            .stdout(predicate::str::contains("llvm-cov-17 show"));
    }

    #[test]
    fn status_on_fresh_project() {
        let temp = TempDir::new().unwrap();

        kiln_in(temp.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Dependency caches"));
    }

    #[test]
    fn relative_project_resolves_from_cwd() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        let work = root.join("work");
        std::fs::create_dir_all(work.join("faasm")).unwrap();
        std::fs::write(root.join(".kiln.toml"), "").unwrap();

        kiln()
            .current_dir(&work)
            .env_remove("RUST_LOG")
            .env("KILN_CONFIG", temp.path().join("global-config.toml"))
            .args(["--project", "faasm", "status"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                work.join("faasm").display().to_string(),
            ));
    }

    #[test]
    fn config_path_honours_env() {
        let temp = TempDir::new().unwrap();

        kiln_in(temp.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("global-config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();

        kiln_in(temp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[toolchain]"));
    }

    #[test]
    fn config_set_local_is_picked_up() {
        let temp = TempDir::new().unwrap();

        kiln()
            .current_dir(temp.path())
            .env("KILN_CONFIG", temp.path().join("global-config.toml"))
            .args(["config", "set", "toolchain.llvm_major_version", "18", "--local"])
            .assert()
            .success();
        assert!(temp.path().join(".kiln.toml").is_file());

        kiln()
            .current_dir(temp.path())
            .env("KILN_CONFIG", temp.path().join("global-config.toml"))
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("llvm_major_version = 18"));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let temp = TempDir::new().unwrap();

        kiln_in(temp.path())
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown configuration key"));
    }

    #[test]
    fn completions_generate() {
        kiln()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("kiln"));
    }
}
