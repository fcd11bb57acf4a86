use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn ancc() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("ancc"))
}

#[test]
fn lexer_subcommand_prints_tokens() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("main.anc");
    fs::write(&file, "const x = 1\n").unwrap();

    ancc()
        .arg("lexer")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Const"))
        .stdout(predicate::str::contains("IntegerLiteral"));
}

#[test]
fn ast_subcommand_prints_tree() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("main.anc");
    fs::write(&file, "func add(a: int, b: int): int return a + b end\n").unwrap();

    ancc()
        .arg("ast")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Program"))
        .stdout(predicate::str::contains("Func add(a, b)"));
}

#[test]
fn build_requires_manifest() {
    let dir = TempDir::new().unwrap();
    ancc().arg("build").arg(dir.path()).assert().failure();
}

#[test]
fn build_dump_symbols_lists_top_level_declarations() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("anchor"), "name demo\nentry main\n").unwrap();
    fs::write(
        dir.path().join("main.anc"),
        "export func main(): int return 0 end\nconst unused = 1\n",
    )
    .unwrap();

    // This will also try to invoke `gcc`; a missing compiler still lets
    // us observe the symbol dump, which happens before the backend runs.
    let output = ancc()
        .arg("build")
        .arg(dir.path())
        .arg("--dump-symbols")
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("package: demo"));
    assert!(stdout.contains("func"));
    assert!(stdout.contains("main"));
}

#[test]
fn compile_subcommand_emits_c_without_running() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("main.anc");
    fs::write(&file, "export func main(): int return 0 end\n").unwrap();
    let out_dir = dir.path().join("out");

    ancc()
        .arg("compile")
        .arg(&file)
        .arg("-o")
        .arg(&out_dir)
        .assert()
        .success();

    let entries: Vec<_> = fs::read_dir(&out_dir).unwrap().collect();
    assert!(!entries.is_empty());
    assert!(entries.iter().any(|e| e.as_ref().unwrap().path().extension().unwrap() == "c"));
}

#[test]
fn compile_reports_type_errors_and_emits_nothing() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("main.anc");
    fs::write(&file, "func main(): int var x: int = null return x end\n").unwrap();
    let out_dir = dir.path().join("out");

    ancc()
        .arg("compile")
        .arg(&file)
        .arg("-o")
        .arg(&out_dir)
        .assert()
        .failure();

    assert!(!out_dir.exists());
}
