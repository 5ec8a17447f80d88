use std::process::Command;
use tempfile::tempdir;

fn bin() -> String {
    env!("CARGO_BIN_EXE_unmarker").to_string()
}

#[test]
fn cli_decode_to_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    std::fs::write(&input, b"X(8x2)(3x3)ABCY\n").unwrap();

    let st = Command::new(bin())
        .arg("decode")
        .arg(&input)
        .arg(&output)
        .status()
        .unwrap();
    assert!(st.success());
    assert_eq!(std::fs::read(&output).unwrap(), b"X(3x3)ABC(3x3)ABCY");
}

#[test]
fn cli_refuses_to_overwrite_without_force() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.txt");
    std::fs::write(&input, b"(3x3)XYZ").unwrap();
    std::fs::write(&output, b"keep me").unwrap();

    let st = Command::new(bin())
        .arg("decode")
        .arg(&input)
        .arg(&output)
        .status()
        .unwrap();
    assert!(!st.success());
    assert_eq!(std::fs::read(&output).unwrap(), b"keep me");

    let st = Command::new(bin())
        .arg("--force")
        .arg("decode")
        .arg(&input)
        .arg(&output)
        .status()
        .unwrap();
    assert!(st.success());
    assert_eq!(std::fs::read(&output).unwrap(), b"XYZXYZXYZ");
}

#[test]
fn cli_decode_to_stdout() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.txt");
    std::fs::write(&input, b"A(1x5)BC\n").unwrap();

    let out = Command::new(bin())
        .args(["decode", "--stdout"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(out.stdout, b"ABBBBBC");
}

#[test]
fn cli_length_prints_answer() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.txt");
    std::fs::write(&input, b"A(2x2)BCD(2x2)EFG\n").unwrap();

    let out = Command::new(bin())
        .arg("length")
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "11");

    let out = Command::new(bin())
        .args(["length", "--raw"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "12");
}

#[test]
fn cli_output_limit_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.txt");
    std::fs::write(&input, b"(1x100000)A").unwrap();

    let out = Command::new(bin())
        .args(["decode", "--check-only", "--max-output", "1K"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("output limit"));
}

#[test]
fn cli_failed_decode_removes_output_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.txt");
    let output = dir.path().join("out.txt");
    std::fs::write(&input, b"HEAD(1x100000)A").unwrap();

    let out = Command::new(bin())
        .args(["decode", "--max-output", "1K"])
        .arg(&input)
        .arg(&output)
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("output limit"));
    assert!(!output.exists());
}

#[test]
fn cli_missing_input_fails() {
    let dir = tempdir().unwrap();
    let out = Command::new(bin())
        .arg("length")
        .arg(dir.path().join("missing.txt"))
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(!out.stderr.is_empty());
}

#[test]
fn cli_samples_print_expected_lines() {
    let out = Command::new(bin()).arg("samples").output().unwrap();
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(
        lines,
        [
            "ADVENT",
            "ABBBBBC",
            "XYZXYZXYZ",
            "ABCBCDEFEFG",
            "(1x3)A",
            "X(3x3)ABC(3x3)ABCY",
        ]
    );
}

#[test]
fn cli_config_works() {
    let out = Command::new(bin()).arg("config").output().unwrap();
    assert!(out.status.success());
}
