use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn vcpu() -> Command {
    Command::cargo_bin("vcpu").unwrap()
}

#[test]
fn runs_without_arguments() {
    vcpu().assert().success().stdout(contains("vcpu"));
}

#[test]
fn runs_multiplication() {
    vcpu()
        .arg("run")
        .arg("tests/files/mul.asm")
        .arg("--minimal")
        .assert()
        .success()
        .stdout(contains("R0 30\n"))
        .stdout(contains("IP 4\n"))
        .stdout(contains("FLAGS 0x0\n"));
}

#[test]
fn path_shorthand_runs() {
    vcpu()
        .arg("tests/files/mul.asm")
        .assert()
        .success()
        .stdout(contains("R0 = 30.0000"));
}

#[test]
fn runs_division_from_data() {
    vcpu()
        .arg("run")
        .arg("tests/files/div.asm")
        .arg("--minimal")
        .assert()
        .success()
        .stdout(contains("R0 2.5\n"))
        .stdout(contains("[000] = 5.0000\n"))
        .stdout(contains("[001] = 2.0000\n"));
}

#[test]
fn runs_subroutines() {
    vcpu()
        .arg("run")
        .arg("tests/files/subroutine.asm")
        .arg("--minimal")
        .assert()
        .success()
        .stdout(contains("R1 25\n"))
        .stdout(contains("R2 16\n"))
        .stdout(contains("SP 255\n"))
        .stdout(contains("[002] = 25.0000\n"))
        .stderr(contains("ERROR").not());
}

#[test]
fn shows_all_memory() {
    let output = vcpu()
        .arg("run")
        .arg("tests/files/mul.asm")
        .arg("--minimal")
        .arg("--memory")
        .output()
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().filter(|l| l.starts_with('[')).count(), 256);
}

#[test]
fn traces_instructions() {
    vcpu()
        .arg("run")
        .arg("tests/files/mul.asm")
        .arg("--minimal")
        .arg("--trace")
        .assert()
        .success()
        .stderr(contains("[TRACE] MUL => R0=30.0000"))
        .stderr(contains("[INFO] HLT"));
}

#[test]
fn stops_runaway_loop() {
    vcpu()
        .arg("run")
        .arg("tests/files/forever.asm")
        .arg("--minimal")
        .assert()
        .success()
        .stderr(contains("Too many instructions executed (> 2000)"));
}

#[test]
fn reports_fault() {
    vcpu()
        .arg("run")
        .arg("tests/files/fault.asm")
        .arg("--minimal")
        .assert()
        .success()
        .stderr(contains("[ERROR] Unknown instruction `FROB` (at IP 1)"))
        .stdout(contains("R0 1\n"))
        .stdout(contains("IP 2\n"));
}

#[test]
fn reports_overflow_flag() {
    vcpu()
        .arg("run")
        .arg("tests/files/overflow.asm")
        .arg("--minimal")
        .assert()
        .success()
        .stderr(contains("[WARN] Overflow/NaN in R0 => set to 0"))
        .stdout(contains("R0 0\n"))
        .stdout(contains("R2 7\n"))
        .stdout(contains("FLAGS 0x1\n"));
}

#[test]
fn rejects_bad_data() {
    vcpu()
        .arg("run")
        .arg("tests/files/bad_data.asm")
        .arg("--minimal")
        .assert()
        .failure()
        .stderr(contains("Y = oops"));
}

#[test]
fn checks_source() {
    vcpu()
        .arg("check")
        .arg("tests/files/subroutine.asm")
        .assert()
        .success()
        .stdout(contains("no errors found!"));

    vcpu()
        .arg("check")
        .arg("tests/files/bad_data.asm")
        .assert()
        .failure()
        .stderr(contains("load::data_literal"));
}

#[test]
fn steps_from_piped_input() {
    let output = vcpu()
        .arg("step")
        .arg("tests/files/mul.asm")
        .arg("--minimal")
        .write_stdin("s\ns\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    // Registers printed once per step
    assert_eq!(stdout.matches("IP ").count(), 2);
    assert!(stdout.contains("R0 10\nR1 3\n"));
    assert!(!stdout.contains("R0 30"));
}

#[test]
fn step_continue_runs_to_halt() {
    vcpu()
        .arg("step")
        .arg("tests/files/mul.asm")
        .arg("--minimal")
        .write_stdin("c\n")
        .assert()
        .success()
        .stdout(contains("R0 30\n"));
}

#[test]
fn step_shows_labels_and_next_line() {
    vcpu()
        .arg("step")
        .arg("tests/files/subroutine.asm")
        .arg("--minimal")
        .write_stdin("s\n")
        .assert()
        .success()
        .stdout(contains("START -> 0\n"))
        .stdout(contains("SQUARE -> 12\n"))
        .stdout(contains("END -> 20\n"))
        .stdout(contains("NEXT NOP\n"))
        .stdout(contains("NEXT MOVI R0, 3\n"));
}
